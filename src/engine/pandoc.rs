use super::{
    process::{ensure_success, expand_tilde, probe_version, run_with_timeout},
    Strategy, StrategyDiag,
};
use crate::config::Pandoc;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Pandoc fallback. Only reads OOXML (`docx`, `docm`); legacy `.doc` is
/// rejected without spawning anything.
pub struct PandocStrategy {
    executable: PathBuf,
    timeout: Option<Duration>,
    pdf_engine: Option<String>,
}

impl PandocStrategy {
    pub fn new(cfg: &Pandoc) -> Self {
        let exe = cfg.executable.trim();
        let pdf_engine = cfg.pdf_engine.trim();
        Self {
            executable: expand_tilde(if exe.is_empty() { "pandoc" } else { exe }),
            timeout: (cfg.timeout_seconds > 0).then(|| Duration::from_secs(cfg.timeout_seconds)),
            pdf_engine: (!pdf_engine.is_empty()).then(|| pdf_engine.to_string()),
        }
    }
}

fn reader_for(input: &Path) -> Option<&'static str> {
    let ext = input.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "docx" | "docm" => Some("docx"),
        _ => None,
    }
}

impl Strategy for PandocStrategy {
    fn name(&self) -> &'static str {
        "pandoc"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let reader = reader_for(input).ok_or_else(|| {
            anyhow!(
                "pandoc cannot read .{} input",
                input
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default()
            )
        })?;

        // The .pdf output extension selects PDF output.
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--from").arg(reader).arg("--output").arg(output);
        if let Some(engine) = &self.pdf_engine {
            cmd.arg(format!("--pdf-engine={engine}"));
        }
        cmd.arg(input);

        let out = run_with_timeout(cmd, self.timeout)?;
        ensure_success(&self.executable.display().to_string(), &out)?;
        Ok(())
    }

    fn doctor(&self) -> StrategyDiag {
        probe_version(self.name(), &self.executable)
    }
}
