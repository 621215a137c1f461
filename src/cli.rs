use crate::{
    config::Config,
    pipeline::{ConversionRequest, Pipeline},
    report::ConversionReport,
    server,
    util::ensure_dir,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "docpress")]
#[command(about = "Word-to-PDF conversion service (headless office renderer + pandoc fallback)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./docpress.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Convert one local file through the same pipeline as the service.
    Convert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Report which conversion backends can be launched.
    Doctor {},
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            // Stdout logging with defaults, so the caller's error! is still seen.
            let _ = init_logging(&args, &Config::default());
            return Err(err);
        }
    };
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Serve { bind, port } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind.clone();
            }
            if let Some(port) = port {
                cfg.server.port = *port;
            }
            serve(&cfg)
        }
        Command::Convert { input, output } => convert(&cfg, input, output.as_deref()),
        Command::Doctor {} => doctor(&cfg),
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    match resolve_config_path(user)? {
        Some(path) => Config::load(&path),
        None => Ok(Config::default()),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(p) = user {
        if !p.exists() {
            return Err(anyhow!("config file not found: {}", p.display()));
        }
        return Ok(Some(p.to_path_buf()));
    }
    for candidate in ["docpress.toml", "docpress.example.toml"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let file_path = cfg.logging.write_to_file.then(|| {
        if cfg.logging.file_path.is_empty() {
            PathBuf::from("docpress.log")
        } else {
            PathBuf::from(&cfg.logging.file_path)
        }
    });

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn serve(cfg: &Config) -> Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(cfg)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "building tokio runtime")?;
    runtime.block_on(server::serve(pipeline))
}

fn convert(cfg: &Config, input: &Path, output: Option<&Path>) -> Result<()> {
    let pipeline = Pipeline::from_config(cfg)?;
    let (out_path, report) = convert_file(&pipeline, input, output)?;

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "output": out_path,
                "report": report,
            }))?
        );
    }
    Ok(())
}

/// One-shot conversion of a local file. The PDF goes to `output`, or next to
/// the input under the download name (`memo.docx` -> `memo.pdf`).
pub fn convert_file(
    pipeline: &Pipeline,
    input: &Path,
    output: Option<&Path>,
) -> Result<(PathBuf, ConversionReport)> {
    if !input.is_file() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }
    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("input has no file name: {}", input.display()))?;
    let bytes =
        std::fs::read(input).with_context(|| format!("reading input: {}", input.display()))?;

    let result = pipeline
        .run(ConversionRequest { filename, bytes })
        .map_err(|e| anyhow!("{}: {}", input.display(), e.user_message()))?;

    let out_path = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_file_name(&result.download_name),
    };
    if out_path.exists() {
        warn!("overwriting {}", out_path.display());
    }
    std::fs::write(&out_path, &result.pdf)
        .with_context(|| format!("writing PDF: {}", out_path.display()))?;
    info!("wrote {}", out_path.display());

    Ok((out_path, result.report))
}

fn doctor(cfg: &Config) -> Result<()> {
    let pipeline = Pipeline::from_config(cfg)?;
    let diag = pipeline.doctor();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "upload_dir": pipeline.upload_dir(),
            "strategies": diag,
        }))?
    );
    Ok(())
}
