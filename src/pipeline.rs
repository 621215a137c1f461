use crate::{
    config::Config,
    engine::{StrategyChain, StrategyDiag},
    error::ConvertError,
    job::ConversionJob,
    report::ConversionReport,
    util::{ensure_dir, extension_of, now_rfc3339, pdf_download_name, sha256_hex, storage_filename},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// An uploaded document as received from the client.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct ConversionOutput {
    pub pdf: Vec<u8>,
    pub download_name: String,
    pub report: ConversionReport,
}

/// Validation, scratch files and the strategy chain for one conversion at a
/// time. Holds no per-request state, so one instance is shared across threads.
pub struct Pipeline {
    cfg: Config,
    upload_dir: PathBuf,
    chain: StrategyChain,
}

impl Pipeline {
    pub fn new(cfg: &Config, chain: StrategyChain) -> Result<Self> {
        let upload_dir = PathBuf::from(&cfg.paths.upload_dir);
        ensure_dir(&upload_dir)?;
        Ok(Self {
            cfg: cfg.clone(),
            upload_dir,
            chain,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let chain = StrategyChain::from_config(cfg)?;
        Self::new(cfg, chain)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    pub fn doctor(&self) -> Vec<StrategyDiag> {
        self.chain.doctor()
    }

    /// Filename checks, in the order clients see them. Returns the lowercased
    /// extension.
    pub fn validate_filename(&self, filename: &str) -> Result<String, ConvertError> {
        if filename.trim().is_empty() {
            return Err(ConvertError::EmptyFilename);
        }
        match extension_of(filename) {
            Some(ext) if self.cfg.is_allowed_extension(ext) => Ok(ext.to_ascii_lowercase()),
            _ => Err(ConvertError::UnsupportedType),
        }
    }

    pub fn validate_size(&self, len: u64) -> Result<(), ConvertError> {
        let limit = self.cfg.server.max_upload_bytes;
        if len > limit {
            return Err(ConvertError::PayloadTooLarge { limit });
        }
        Ok(())
    }

    /// Validate, stage, convert and read back the PDF. Blocks until the
    /// strategies are done; scratch files are gone when this returns.
    pub fn run(&self, req: ConversionRequest) -> Result<ConversionOutput, ConvertError> {
        let started_at = now_rfc3339();
        let started = Instant::now();

        let ext = self.validate_filename(&req.filename)?;
        self.validate_size(req.bytes.len() as u64)?;

        let safe_name = storage_filename(&req.filename, &ext);
        let download_name = pdf_download_name(&safe_name);
        let job = ConversionJob::new(&self.upload_dir, &safe_name);

        info!(
            job_id = %job.id(),
            filename = %req.filename,
            bytes = req.bytes.len(),
            "conversion started"
        );

        job.write_input(&req.bytes)
            .context("Failed to store upload")?;

        let Some(strategy) = self.chain.convert(job.input(), job.output()) else {
            return Err(ConvertError::ConversionFailed);
        };
        if !job.output().exists() {
            return Err(ConvertError::ConversionFailed);
        }

        let pdf = std::fs::read(job.output()).context("Failed to read converted PDF")?;

        let report = ConversionReport {
            job_id: job.id().to_string(),
            original_filename: req.filename,
            download_name: download_name.clone(),
            strategy: strategy.to_string(),
            input_bytes: req.bytes.len() as u64,
            pdf_bytes: pdf.len() as u64,
            pdf_sha256: sha256_hex(&pdf),
            started: started_at,
            finished: now_rfc3339(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            job_id = %report.job_id,
            strategy = %report.strategy,
            pdf_bytes = report.pdf_bytes,
            elapsed_ms = report.elapsed_ms,
            "conversion finished"
        );

        Ok(ConversionOutput {
            pdf,
            download_name,
            report,
        })
    }
}
