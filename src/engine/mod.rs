pub mod office;
pub mod pandoc;
pub mod process;
pub mod types;

use crate::config::Config;
use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::{debug, info, warn};

pub use office::OfficeStrategy;
pub use pandoc::PandocStrategy;
pub use types::StrategyDiag;

/// One way of turning a word-processing document into a PDF.
///
/// `convert` must leave a PDF at `output` on success. The chain double-checks
/// that, so an `Ok(())` without a file still counts as a failure.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
    fn doctor(&self) -> StrategyDiag;
}

/// Ordered fallback list of strategies.
pub struct StrategyChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
        for name in &cfg.conversion.strategies {
            let strategy: Box<dyn Strategy> = match name.trim().to_ascii_lowercase().as_str() {
                "office" => Box::new(OfficeStrategy::new(&cfg.office)),
                "pandoc" => Box::new(PandocStrategy::new(&cfg.pandoc)),
                other => return Err(anyhow!("unknown conversion strategy: {other}")),
            };
            strategies.push(strategy);
        }
        if strategies.is_empty() {
            return Err(anyhow!("conversion.strategies is empty"));
        }
        Ok(Self::new(strategies))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order until one leaves a file at `output`.
    ///
    /// Returns the winning strategy's name, or `None` once every strategy has
    /// failed. Failures are logged here and never propagated.
    pub fn convert(&self, input: &Path, output: &Path) -> Option<&'static str> {
        for strategy in &self.strategies {
            let name = strategy.name();
            debug!(strategy = name, input = %input.display(), "trying strategy");
            match strategy.convert(input, output) {
                Ok(()) if output.exists() => {
                    info!(strategy = name, "conversion succeeded");
                    return Some(name);
                }
                Ok(()) => {
                    warn!(strategy = name, "strategy reported success but wrote no output");
                }
                Err(err) => {
                    warn!(strategy = name, "strategy failed: {:#}", err);
                }
            }
            // A half-written PDF from a failed attempt must not pass the existence check.
            if output.exists() {
                let _ = std::fs::remove_file(output);
            }
        }
        None
    }

    pub fn doctor(&self) -> Vec<StrategyDiag> {
        self.strategies.iter().map(|s| s.doctor()).collect()
    }
}
