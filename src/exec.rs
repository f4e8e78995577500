use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tokio::time::{Duration, timeout};
use tracing::{debug, warn};

pub const TIMEOUT_TEXT: &str = "timeout";
const READ_CHUNK: usize = 8 * 1024;

/// Runs a read-only external command with a wall-clock bound and an output
/// cap. Failures come back as text, never as errors.
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl BoundedExecutor {
    pub fn new(
        program: impl Into<String>,
        base_args: Vec<String>,
        timeout: Duration,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            program: program.into(),
            base_args,
            timeout,
            max_output_bytes,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    /// Stdout followed by stderr, truncated to the cap. `"timeout"` when the
    /// deadline passes; the child is killed when the pending future drops.
    pub async fn run(&self, args: &[String]) -> String {
        let started = Instant::now();
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(error) => {
                warn!("failed to spawn {}: {error}", self.program);
                return format!("error: {error}");
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let cap = self.max_output_bytes;
        let collect = async move {
            let (stdout, stderr) =
                tokio::join!(read_capped(stdout, cap), read_capped(stderr, cap));
            let _ = child.wait().await;
            (stdout, stderr)
        };

        match timeout(self.timeout, collect).await {
            Ok((stdout, stderr)) => {
                let truncated = stdout.len() + stderr.len() > cap;
                if truncated {
                    debug!("output of {} {:?} truncated to {cap} bytes", self.program, args);
                }
                debug!(
                    "{} {:?} finished in {}ms",
                    self.program,
                    args,
                    started.elapsed().as_millis()
                );
                merge_output(stdout, stderr, cap)
            }
            Err(_) => {
                warn!(
                    "{} {:?} timed out after {}ms",
                    self.program,
                    args,
                    self.timeout.as_millis()
                );
                TIMEOUT_TEXT.to_string()
            }
        }
    }
}

/// Keeps reading past the cap so the child never blocks on a full pipe.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Vec::new();
    };
    let mut kept = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(read) => {
                let room = cap.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..read.min(room)]);
            }
        }
    }
    kept
}

fn merge_output(mut stdout: Vec<u8>, stderr: Vec<u8>, cap: usize) -> String {
    stdout.extend_from_slice(&stderr);
    let text = String::from_utf8_lossy(&stdout).into_owned();
    truncate_on_char_boundary(text, cap)
}

fn truncate_on_char_boundary(mut text: String, cap: usize) -> String {
    if text.len() <= cap {
        return text;
    }
    let mut end = cap;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text
}

#[cfg(test)]
mod tests {
    use super::{BoundedExecutor, TIMEOUT_TEXT, merge_output, truncate_on_char_boundary};
    use tokio::time::{Duration, Instant};

    fn sh(timeout_ms: u64, cap: usize) -> BoundedExecutor {
        BoundedExecutor::new(
            "sh",
            vec!["-c".to_string()],
            Duration::from_millis(timeout_ms),
            cap,
        )
    }

    #[tokio::test]
    async fn stdout_then_stderr_are_merged() {
        let out = sh(2_000, 1024)
            .run(&["printf out; printf err 1>&2; exit 3".to_string()])
            .await;
        assert_eq!(out, "outerr");
    }

    #[tokio::test]
    async fn output_is_capped() {
        let out = sh(2_000, 4)
            .run(&["printf abcdefghij".to_string()])
            .await;
        assert_eq!(out, "abcd");
    }

    #[tokio::test]
    async fn slow_command_returns_timeout_text() {
        let started = Instant::now();
        let out = sh(100, 1024).run(&["sleep 5".to_string()]).await;
        assert_eq!(out, TIMEOUT_TEXT);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn missing_program_degrades_to_error_text() {
        let executor = BoundedExecutor::new(
            "ktwins-definitely-missing-binary",
            Vec::new(),
            Duration::from_millis(500),
            1024,
        );
        let out = executor.run(&[]).await;
        assert!(out.starts_with("error: "), "{out}");
    }

    #[test]
    fn with_timeout_keeps_program_and_cap() {
        let executor = sh(100, 8).with_timeout(Duration::from_secs(9));
        assert_eq!(executor.timeout, Duration::from_secs(9));
        assert_eq!(executor.max_output_bytes, 8);
        assert_eq!(executor.program, "sh");
    }

    #[test]
    fn truncation_respects_utf8_boundaries() {
        assert_eq!(truncate_on_char_boundary("⚠ab".to_string(), 2), "");
        assert_eq!(truncate_on_char_boundary("a⚠".to_string(), 3), "a");
        assert_eq!(merge_output(b"ab".to_vec(), b"cd".to_vec(), 3), "abc");
    }
}
