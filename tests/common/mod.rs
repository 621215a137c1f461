#![allow(dead_code)]

use anyhow::{anyhow, Result};
use docpress::config::Config;
use docpress::engine::{Strategy, StrategyChain, StrategyDiag};
use docpress::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% docpress test fixture\n%%EOF\n";

#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// Writes `FAKE_PDF` to the output path.
    Succeed,
    /// Returns an error.
    Fail,
    /// Returns Ok without writing anything.
    NoOutput,
    /// Writes a partial file, then returns an error.
    FailAfterPartialWrite,
}

/// Scripted strategy that records every call.
pub struct FakeStrategy {
    name: &'static str,
    behavior: Behavior,
    pub calls: Arc<AtomicUsize>,
    pub inputs: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeStrategy {
    pub fn new(name: &'static str, behavior: Behavior) -> Self {
        Self {
            name,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Strategy for FakeStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(input.to_path_buf());
        assert!(input.exists(), "input staged before conversion");
        match self.behavior {
            Behavior::Succeed => {
                std::fs::write(output, FAKE_PDF)?;
                Ok(())
            }
            Behavior::Fail => Err(anyhow!("{} is broken", self.name)),
            Behavior::NoOutput => Ok(()),
            Behavior::FailAfterPartialWrite => {
                std::fs::write(output, b"%PDF-")?;
                Err(anyhow!("{} crashed mid-write", self.name))
            }
        }
    }

    fn doctor(&self) -> StrategyDiag {
        StrategyDiag {
            strategy: self.name.to_string(),
            executable: "fake".to_string(),
            ok: true,
            version: None,
            error: None,
        }
    }
}

pub fn test_config(upload_dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.paths.upload_dir = upload_dir.display().to_string();
    cfg
}

pub fn pipeline_with(upload_dir: &Path, strategies: Vec<Box<dyn Strategy>>) -> Pipeline {
    Pipeline::new(&test_config(upload_dir), StrategyChain::new(strategies))
        .expect("pipeline")
}

pub fn dir_entries(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("read upload dir")
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}
