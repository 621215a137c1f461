use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub job_id: String,
    pub original_filename: String,
    pub download_name: String,
    pub strategy: String,
    pub input_bytes: u64,
    pub pdf_bytes: u64,
    pub pdf_sha256: String,
    pub started: String,
    pub finished: String,
    pub elapsed_ms: u64,
}
