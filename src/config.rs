use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub conversion: Conversion,
    #[serde(default)]
    pub office: Office,
    #[serde(default)]
    pub pandoc: Pandoc,
    #[serde(default)]
    pub cors: Cors,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// True when `ext` (without the dot) is in the allowed set, ignoring case.
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.conversion
            .allowed_extensions
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub max_upload_bytes: u64,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Server {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub upload_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            upload_dir: "uploads".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    pub allowed_extensions: Vec<String>,
    /// Strategy names in priority order. Known: "office", "pandoc".
    pub strategies: Vec<String>,
}
impl Default for Conversion {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["doc".into(), "docx".into(), "docm".into()],
            strategies: vec!["office".into(), "pandoc".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    /// "auto" picks soffice on Windows and libreoffice elsewhere.
    pub executable: String,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub extra_env: BTreeMap<String, String>,
}
impl Default for Office {
    fn default() -> Self {
        Self {
            executable: "auto".into(),
            timeout_seconds: 120,
            extra_env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pandoc {
    pub executable: String,
    pub timeout_seconds: u64,
    pub pdf_engine: String,
}
impl Default for Pandoc {
    fn default() -> Self {
        Self {
            executable: "pandoc".into(),
            timeout_seconds: 120,
            pdf_engine: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
    pub max_age_seconds: Option<u64>,
}
impl Default for Cors {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            max_age_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
