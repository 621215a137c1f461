use super::{
    process::{ensure_success, expand_tilde, probe_version, run_with_timeout},
    Strategy, StrategyDiag,
};
use crate::config::Office;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::debug;

/// Headless LibreOffice (`soffice`/`libreoffice`) run as a subprocess.
pub struct OfficeStrategy {
    executable: PathBuf,
    timeout: Option<Duration>,
    extra_env: BTreeMap<String, String>,
}

impl OfficeStrategy {
    pub fn new(cfg: &Office) -> Self {
        Self {
            executable: resolve_office_exe(&cfg.executable),
            timeout: (cfg.timeout_seconds > 0).then(|| Duration::from_secs(cfg.timeout_seconds)),
            extra_env: cfg.extra_env.clone(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

/// `auto` (or empty) maps to the platform's usual launcher name.
pub fn resolve_office_exe(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        return PathBuf::from(if cfg!(windows) { "soffice" } else { "libreoffice" });
    }
    expand_tilde(raw)
}

/// Where the renderer writes its PDF: `<outdir>/<input stem>.pdf`.
pub fn rendered_path(input: &Path, outdir: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| anyhow!("input has no file name"))?;
    Ok(outdir.join(format!("{}.pdf", stem.to_string_lossy())))
}

impl Strategy for OfficeStrategy {
    fn name(&self) -> &'static str {
        "office"
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let outdir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let produced = rendered_path(input, outdir)?;

        let mut cmd = Command::new(&self.executable);
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(outdir)
            .arg(input);
        for (k, v) in &self.extra_env {
            cmd.env(k, v);
        }

        let out = run_with_timeout(cmd, self.timeout)?;
        ensure_success(&self.executable.display().to_string(), &out)?;

        if !produced.exists() {
            return Err(anyhow!(
                "renderer exited cleanly but produced no {}",
                produced.display()
            ));
        }
        if produced != output {
            debug!("moving {} -> {}", produced.display(), output.display());
            std::fs::rename(&produced, output)
                .with_context(|| format!("moving rendered PDF to {}", output.display()))?;
        }
        Ok(())
    }

    fn doctor(&self) -> StrategyDiag {
        probe_version(self.name(), &self.executable)
    }
}
