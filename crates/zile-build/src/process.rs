//! Running external tools with captured output and an optional deadline

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::BuildError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exit code and combined stdout + stderr of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: Option<i32>,
    pub output: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn wait_with_deadline(
    child: &mut Child,
    tool: &str,
    timeout: Duration,
) -> Result<ExitStatus, BuildError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            warn!("Stopping `{}` after {}s", tool, timeout.as_secs());
            let _ = child.kill();
            let _ = child.wait();
            return Err(BuildError::Timeout {
                tool: tool.to_string(),
                seconds: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run `command` to completion, capturing both output streams.
///
/// With a `timeout` the child is killed once it is exceeded.
pub fn run_captured(
    tool: &str,
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<CapturedOutput, BuildError> {
    debug!("Running: {:?}", command);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| BuildError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        Some(timeout) => wait_with_deadline(&mut child, tool, timeout)?,
        None => child.wait()?,
    };

    let mut output = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();
    if !stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&stderr);
    }

    debug!("`{}` exited with {:?}", tool, status.code());
    Ok(CapturedOutput {
        code: status.code(),
        output,
    })
}
