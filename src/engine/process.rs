use anyhow::{anyhow, Context, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything a tool wrote, plus its exit status if it finished in time.
struct Captured {
    status: Option<ExitStatus>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Run an external tool to completion, capturing stdout and stderr.
///
/// A zero `timeout_seconds` waits indefinitely. A non-zero exit status, or a
/// timeout, is an error carrying the tool's stderr.
pub fn run_tool<I, S>(
    exe: &str,
    args: I,
    timeout_seconds: u64,
    keep_stderr: bool,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(exe);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("run {:?} timeout={}s", cmd, timeout_seconds);

    let child = cmd.spawn().with_context(|| format!("spawning {exe}"))?;
    let timeout = (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds));
    let captured = capture(child, timeout).with_context(|| format!("waiting for {exe}"))?;
    let stderr = String::from_utf8_lossy(&captured.stderr);

    let Some(status) = captured.status else {
        warn!("{exe} killed after {timeout_seconds}s");
        return Err(anyhow!(
            "{exe} exceeded timeout of {timeout_seconds}s after writing {} bytes; stderr: {}",
            captured.stdout.len(),
            stderr.trim()
        ));
    };

    if !status.success() {
        return Err(anyhow!("{exe} exited with {status}: {}", stderr.trim()));
    }

    if keep_stderr && !stderr.trim().is_empty() {
        debug!("{exe} stderr: {}", stderr.trim());
    }

    Ok(Output {
        status,
        stdout: captured.stdout,
        stderr: captured.stderr,
    })
}

/// Probe whether `exe` can be spawned; returns combined stdout+stderr.
pub fn tool_banner(exe: &str, flag: &str) -> Result<String> {
    let output = Command::new(exe)
        .arg(flag)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("spawning {exe}"))?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(text)
}

/// Wait for `child`, killing it once `timeout` passes. Both pipes are read on
/// their own threads so the tool never blocks on a full buffer.
fn capture(mut child: Child, timeout: Option<Duration>) -> Result<Captured> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        None => Some(child.wait()?),
        Some(timeout) => {
            let deadline = Instant::now() + timeout;
            loop {
                if let Some(status) = child.try_wait()? {
                    break Some(status);
                }
                if Instant::now() >= deadline {
                    // kill fails if it already exited; wait reaps either way
                    let _ = child.kill();
                    child.wait()?;
                    break None;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    };

    Ok(Captured {
        status,
        stdout: collect(stdout, "stdout")?,
        stderr: collect(stderr, "stderr")?,
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(handle: JoinHandle<std::io::Result<Vec<u8>>>, stream: &str) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("{stream} reader thread panicked"))?
        .with_context(|| format!("reading {stream}"))
}
