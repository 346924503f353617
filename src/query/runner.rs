//! apcaccess process runner
//!
//! Spawns the status executable, captures its output and enforces the
//! per-call deadline.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, error};

use super::{CommandSpec, QueryError, StatusQuery};

/// Default execution timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Captured output of a successful query
#[derive(Clone, Debug)]
pub struct QueryOutput {
    pub stdout: String,
    pub elapsed: Duration,
}

/// Runs status queries against the configured executable
#[derive(Clone, Debug)]
pub struct QueryRunner {
    command: CommandSpec,
    timeout: Duration,
}

impl QueryRunner {
    /// Create a runner with the default timeout
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the execution timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Run a status query.
    ///
    /// The child is killed if the deadline passes; dropping the wait future
    /// drops the child handle, which has `kill_on_drop` set.
    pub async fn run(&self, query: &StatusQuery) -> Result<QueryOutput, QueryError> {
        let argv = query.argv(&self.command);
        let command_line = argv.join(" ");
        debug!("Executing command: {}", command_line);

        let start = Instant::now();
        let child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!("Failed to collect apcaccess output: {:?}", e);
                return Err(QueryError::Io(e));
            }
            Err(_) => {
                error!(
                    "apcaccess command timed out after {}s: {}",
                    self.timeout.as_secs_f64(),
                    command_line
                );
                return Err(QueryError::Timeout(self.timeout));
            }
        };

        let elapsed = start.elapsed();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let code = output.status.code();
            error!(
                "apcaccess failed with exit code {:?}: {}",
                code,
                stderr.trim_end()
            );
            return Err(QueryError::Failed {
                code,
                stderr: stderr.into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !stderr.trim().is_empty() {
            debug!("apcaccess stderr: {}", stderr.trim_end());
        }
        debug!(
            "apcaccess output length: {} bytes in {}ms",
            stdout.len(),
            elapsed.as_millis()
        );

        Ok(QueryOutput { stdout, elapsed })
    }

    fn spawn_error(&self, e: std::io::Error) -> QueryError {
        match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                error!(
                    "apcaccess command not found - is apcupsd installed? ({}: {})",
                    self.command.program(),
                    e
                );
                QueryError::CommandNotFound(self.command.program().to_string())
            }
            _ => {
                error!("Failed to start {}: {:?}", self.command.program(), e);
                QueryError::Io(e)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner(command: &str) -> QueryRunner {
        QueryRunner::new(CommandSpec::parse(command).unwrap())
    }

    #[tokio::test]
    async fn test_run_returns_stdout_verbatim() {
        let runner = runner(r#"sh -c 'printf "APC      : 001,036,0859\nSTATUS   : ONLINE \n"'"#);
        let output = runner.run(&StatusQuery::local()).await.unwrap();
        assert_eq!(output.stdout, "APC      : 001,036,0859\nSTATUS   : ONLINE \n");
    }

    #[tokio::test]
    async fn test_run_passes_target() {
        let runner = runner(r#"sh -c 'echo "$@"' apcaccess"#);

        let output = runner
            .run(&StatusQuery::remote("10.0.0.5", "3552"))
            .await
            .unwrap();
        assert_eq!(output.stdout, "-h 10.0.0.5:3552 status\n");

        let output = runner.run(&StatusQuery::local()).await.unwrap();
        assert_eq!(output.stdout, "status\n");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let runner = runner(r#"sh -c 'echo "Error contacting host" >&2; exit 1'"#);
        let err = runner.run(&StatusQuery::local()).await.unwrap_err();

        match err {
            QueryError::Failed { code, stderr } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "Error contacting host\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let runner = runner("sh -c 'sleep 5'").timeout(Duration::from_millis(200));

        let start = Instant::now();
        let err = runner.run(&StatusQuery::local()).await.unwrap_err();

        assert!(matches!(err, QueryError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_run_missing_executable() {
        let runner = runner("apcaccess-proxy-missing-binary");
        let err = runner.run(&StatusQuery::local()).await.unwrap_err();

        assert!(matches!(err, QueryError::CommandNotFound(ref p) if p == "apcaccess-proxy-missing-binary"));
    }
}
