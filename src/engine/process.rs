use crate::util::tail_lossy;
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::types::StrategyDiag;

const STDERR_TAIL_CHARS: usize = 800;

/// Spawn `cmd` with piped output and wait for it, killing it once `timeout`
/// elapses. `None` waits indefinitely.
pub fn run_with_timeout(mut cmd: Command, timeout: Option<Duration>) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!("spawn {} timeout={:?}", program, timeout);

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    // Own process group, so a timeout also reaches whatever the launcher forked
    // (libreoffice -> soffice.bin).
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning {program}"))?;

    match timeout {
        Some(limit) => wait_with_timeout(&mut child, &program, limit),
        None => child
            .wait_with_output()
            .with_context(|| format!("waiting for {program}")),
    }
}

/// Turn a nonzero exit into an error carrying the tail of stderr.
pub fn ensure_success(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(anyhow!(
        "{program} exited with {}: {}",
        output.status,
        tail_lossy(&output.stderr, STDERR_TAIL_CHARS)
    ))
}

/// `<exe> --version`, first line only. Shared by the strategies' doctor checks.
pub fn probe_version(strategy: &str, executable: &Path) -> StrategyDiag {
    let mut cmd = Command::new(executable);
    cmd.arg("--version");
    let result = run_with_timeout(cmd, Some(Duration::from_secs(30))).and_then(|out| {
        ensure_success(&executable.display().to_string(), &out)?;
        Ok(String::from_utf8_lossy(&out.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    });

    match result {
        Ok(version) => StrategyDiag {
            strategy: strategy.to_string(),
            executable: executable.display().to_string(),
            ok: true,
            version: Some(version),
            error: None,
        },
        Err(err) => StrategyDiag {
            strategy: strategy.to_string(),
            executable: executable.display().to_string(),
            ok: false,
            version: None,
            error: Some(format!("{err:#}")),
        },
    }
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn wait_with_timeout(child: &mut Child, program: &str, timeout: Duration) -> Result<Output> {
    // Drain both pipes on their own threads; a chatty renderer would otherwise
    // block on a full pipe buffer and never exit.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("{} timed out after {:?}; killing its process group", program, timeout);
            // Signal the group before reaping the leader, while its pgid is still ours.
            kill_process_group(child);
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            // Every writer in the group is dead, so both pipes are closed.
            let _ = stdout_thread.join();
            let stderr = stderr_thread
                .join()
                .ok()
                .and_then(|r| r.ok())
                .unwrap_or_default();
            return Err(anyhow!(
                "{} exceeded timeout ({:?}); stderr: {}",
                program,
                timeout,
                tail_lossy(&stderr, STDERR_TAIL_CHARS)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        return;
    };
    // SAFETY: kill(2) only sends a signal; the group was created by
    // `process_group(0)` above and its leader has not been reaped yet.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "killpg({}) failed: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}
