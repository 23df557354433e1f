//! Async command execution with timeout support
//!
//! Provides a unified interface for running stage commands with:
//! - Configurable timeouts (the child's process group is killed when the
//!   timeout fires)
//! - Output capture (stdout/stderr)
//! - Output truncation for large outputs
//! - Environment variable injection
//! - Working directory control

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::traits::{CommandExecutor, CommandLine};
use crate::error::ValidateError;

/// Maximum output size before truncation (in bytes)
pub const MAX_OUTPUT_SIZE: usize = 100_000; // 100KB

/// Truncation marker for large outputs
const TRUNCATION_MARKER: &str = "\n... [output truncated] ...\n";

/// How long to keep reading output after the command has exited
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Options for async command execution
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout duration (None = no timeout)
    pub timeout: Option<Duration>,
    /// Maximum output size per stream before truncation
    pub max_output_size: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            max_output_size: MAX_OUTPUT_SIZE,
        }
    }
}

impl ExecOptions {
    /// Create options with a working directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set timeout in seconds
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set maximum output size
    pub fn with_max_output(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }
}

/// Result of async command execution
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Standard output (may be truncated)
    pub stdout: String,
    /// Whether stdout was truncated
    pub stdout_truncated: bool,
    /// Standard error
    pub stderr: String,
    /// Whether stderr was truncated
    pub stderr_truncated: bool,
    /// Duration of execution
    pub duration: Duration,
}

impl ExecResult {
    /// Stdout followed by stderr, as one block of text
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => {
                let mut out = self.stdout.clone();
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&self.stderr);
                out
            }
        }
    }
}

/// Execute a command asynchronously with timeout support
///
/// # Arguments
/// * `program` - The program to execute
/// * `args` - Command arguments
/// * `options` - Execution options
///
/// # Returns
/// * `Result<ExecResult, ValidateError>` - Execution result or error
///
/// # Errors
/// * `ValidateError::SpawnFailed` - If the command couldn't be spawned
/// * `ValidateError::Timeout` - If the command timed out (when timeout is set)
pub async fn exec_command(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<ExecResult, ValidateError> {
    let start = Instant::now();
    let command_str = if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true); // Kill process if future is dropped
    #[cfg(unix)]
    cmd.process_group(0); // Own group, so a timeout kills the whole tree

    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    tracing::debug!("Executing async: {}", command_str);

    let mut child = cmd.spawn().map_err(|e| ValidateError::SpawnFailed {
        command: command_str.clone(),
        kind: e.kind(),
        error: e.to_string(),
    })?;

    // Read stdout and stderr concurrently so neither pipe fills up
    let stdout = StreamCapture::spawn(child.stdout.take(), options.max_output_size);
    let stderr = StreamCapture::spawn(child.stderr.take(), options.max_output_size);

    let status = match options.timeout {
        Some(timeout_duration) => {
            let waited = timeout(timeout_duration, child.wait()).await;
            let Ok(status) = waited else {
                tracing::debug!("Timed out after {:?}: {}", timeout_duration, command_str);
                kill_process_group(&mut child).await;
                stdout.abort();
                stderr.abort();
                return Err(ValidateError::Timeout {
                    command: command_str,
                    timeout_secs: timeout_duration.as_secs(),
                });
            };
            status
        }
        None => child.wait().await,
    }
    .map_err(ValidateError::Io)?;

    // A background process left behind by the command can hold the pipes
    // open forever, so the exit status is authoritative
    let ((stdout, stdout_truncated), (stderr, stderr_truncated)) =
        tokio::join!(stdout.finish(), stderr.finish());

    Ok(ExecResult {
        success: status.code() == Some(0),
        exit_code: status.code(),
        stdout,
        stdout_truncated,
        stderr,
        stderr_truncated,
        duration: start.elapsed(),
    })
}

/// Kill the command and everything it started
async fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // The child leads its own process group, see `exec_command`
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }

    if let Err(e) = child.kill().await {
        tracing::debug!("Failed to kill timed out process: {}", e);
    }
}

/// Output read so far from one stream
#[derive(Debug, Default)]
struct Captured {
    text: String,
    truncated: bool,
}

/// Background reader for a child's stdout or stderr
struct StreamCapture {
    buffer: Arc<Mutex<Captured>>,
    handle: JoinHandle<()>,
}

impl StreamCapture {
    fn spawn<R>(reader: Option<R>, max_size: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Captured::default()));
        let sink = Arc::clone(&buffer);
        let handle = tokio::spawn(async move {
            if let Some(reader) = reader {
                read_and_truncate(reader, max_size, &sink).await;
            }
        });
        Self { buffer, handle }
    }

    /// Wait for end of stream, giving up after `OUTPUT_DRAIN_GRACE`
    async fn finish(mut self) -> (String, bool) {
        if timeout(OUTPUT_DRAIN_GRACE, &mut self.handle).await.is_err() {
            tracing::debug!("Output stream still open after exit; keeping what was read");
            self.handle.abort();
        }
        self.take()
    }

    fn abort(self) {
        self.handle.abort();
    }

    fn take(&self) -> (String, bool) {
        match self.buffer.lock() {
            Ok(mut captured) => (std::mem::take(&mut captured.text), captured.truncated),
            Err(_) => (String::new(), false),
        }
    }
}

/// Read from an async reader into `sink`, truncating past `max_size`
async fn read_and_truncate<R: AsyncRead + Unpin>(
    reader: R,
    max_size: usize,
    sink: &Mutex<Captured>,
) {
    let mut buf_reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(4096);

    loop {
        line.clear();
        match buf_reader.read_until(b'\n', &mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {
                let Ok(mut captured) = sink.lock() else {
                    break;
                };
                // Keep draining after truncation so the child never blocks or
                // dies on a closed pipe
                if captured.truncated {
                    continue;
                }
                let text = String::from_utf8_lossy(&line);
                if captured.text.len() + text.len() > max_size {
                    let remaining = max_size.saturating_sub(captured.text.len());
                    captured.text.push_str(truncate_at_char_boundary(&text, remaining));
                    captured.text.push_str(TRUNCATION_MARKER);
                    captured.truncated = true;
                    continue;
                }
                captured.text.push_str(&text);
            }
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                break;
            }
        }
    }
}

/// Longest prefix of `s` no longer than `max` bytes
fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Spawns stage commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    /// Environment variables added to every command
    env: HashMap<String, String>,
}

impl ProcessExecutor {
    /// Create a new process executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable for every command
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Resolve the program on PATH (or relative to the working directory)
    fn resolve_program(
        &self,
        command: &CommandLine,
        working_dir: Option<&Path>,
    ) -> Result<PathBuf, ValidateError> {
        let cwd = match working_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().map_err(ValidateError::Io)?,
        };

        which::which_in(&command.program, std::env::var_os("PATH"), cwd).map_err(|e| {
            tracing::debug!("Tool '{}' not found: {}", command.program, e);
            ValidateError::ToolMissing {
                tool: command.program.clone(),
                command: command.to_string(),
            }
        })
    }
}

impl CommandExecutor for ProcessExecutor {
    async fn execute(
        &self,
        command: &CommandLine,
        options: &ExecOptions,
    ) -> Result<ExecResult, ValidateError> {
        let program = self.resolve_program(command, options.working_dir.as_deref())?;

        let mut options = options.clone();
        for (k, v) in &self.env {
            options.env.entry(k.clone()).or_insert_with(|| v.clone());
        }

        let program = program.to_string_lossy().to_string();
        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();

        exec_command(&program, &args, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_options_default() {
        let options = ExecOptions::default();

        assert!(options.working_dir.is_none());
        assert!(options.env.is_empty());
        assert!(options.timeout.is_none());
        assert_eq!(options.max_output_size, MAX_OUTPUT_SIZE);
    }

    #[test]
    fn test_exec_options_builder() {
        let options = ExecOptions::in_dir("/tmp")
            .with_timeout_secs(60)
            .with_env("KEY", "value")
            .with_max_output(1000);

        assert_eq!(options.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(options.timeout, Some(Duration::from_secs(60)));
        assert_eq!(options.env.get("KEY"), Some(&"value".to_string()));
        assert_eq!(options.max_output_size, 1000);
    }

    #[tokio::test]
    async fn test_exec_command_success() {
        let result = exec_command("echo", &["hello world"], &ExecOptions::default()).await;

        match result {
            Ok(res) => {
                assert!(res.success);
                assert_eq!(res.exit_code, Some(0));
                assert!(res.stdout.contains("hello world"));
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: echo not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_exec_command_failure() {
        let result = exec_command("false", &[], &ExecOptions::default()).await;

        match result {
            Ok(res) => {
                assert!(!res.success);
                assert_ne!(res.exit_code, Some(0));
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: false not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_exec_command_captures_stderr() {
        let result = exec_command(
            "sh",
            &["-c", "echo out; echo err 1>&2; exit 3"],
            &ExecOptions::default(),
        )
        .await;

        match result {
            Ok(res) => {
                assert_eq!(res.exit_code, Some(3));
                let combined = res.combined_output();
                assert!(combined.contains("out"));
                assert!(combined.contains("err"));
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: sh not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_exec_command_with_env() {
        let options = ExecOptions::default().with_env("MY_VAR", "test_value");

        let result = exec_command("sh", &["-c", "echo $MY_VAR"], &options).await;

        match result {
            Ok(res) => {
                assert!(res.success);
                assert!(res.stdout.contains("test_value"));
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: sh not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_exec_command_timeout() {
        let options = ExecOptions::default().with_timeout(Duration::from_millis(100));

        let result = exec_command("sleep", &["10"], &options).await;

        match result {
            Err(ValidateError::Timeout { timeout_secs, .. }) => {
                assert!(timeout_secs <= 1);
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: sleep not available");
            }
            Ok(_) => panic!("Expected timeout error"),
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_command_background_child_keeps_exit_status() {
        // The backgrounded sleep inherits stdout and keeps it open
        let options = ExecOptions::default().with_timeout_secs(10);

        let result = exec_command("sh", &["-c", "echo done; sleep 30 & exit 0"], &options).await;

        match result {
            Ok(res) => {
                assert!(res.success);
                assert_eq!(res.exit_code, Some(0));
                assert!(res.stdout.contains("done"));
                assert!(res.duration < Duration::from_secs(5));
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: sh not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_command_background_child_without_timeout() {
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            exec_command("sh", &["-c", "sleep 30 & exit 4"], &ExecOptions::default()),
        )
        .await
        .expect("exec_command must return once the shell exits");

        match result {
            Ok(res) => assert_eq!(res.exit_code, Some(4)),
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: sh not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    /// Live (running, not zombie) process check via procfs
    #[cfg(target_os = "linux")]
    fn process_alive(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next())
                .is_some_and(|state| state != "Z" && state != "X"),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_exec_command_timeout_kills_process_group() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = ExecOptions::in_dir(dir.path()).with_timeout(Duration::from_secs(1));

        let result = exec_command(
            "sh",
            &["-c", "sleep 30 & echo $! > grandchild.pid; wait"],
            &options,
        )
        .await;

        match result {
            Err(ValidateError::Timeout { .. }) => {}
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: sh not available");
                return;
            }
            other => panic!("Expected timeout, got {:?}", other),
        }

        let pid = std::fs::read_to_string(dir.path().join("grandchild.pid")).unwrap();
        let pid = pid.trim();

        let mut alive = process_alive(pid);
        for _ in 0..20 {
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            alive = process_alive(pid);
        }
        assert!(!alive, "background process {} survived the timeout", pid);
    }

    #[tokio::test]
    async fn test_exec_command_output_truncation() {
        let options = ExecOptions::default().with_max_output(100);

        let result = exec_command(
            "sh",
            &["-c", "for i in $(seq 1 100); do echo 'line of output'; done"],
            &options,
        )
        .await;

        match result {
            Ok(res) => {
                assert!(res.stdout_truncated);
                assert!(res.success, "child must run to completion after truncation");
                assert!(res.stdout.contains("[output truncated]"));
                assert!(res.stdout.len() <= 200);
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: sh not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_exec_command_working_dir() {
        let options = ExecOptions::in_dir("/tmp");

        let result = exec_command("pwd", &[], &options).await;

        match result {
            Ok(res) => {
                assert!(res.success);
                assert!(res.stdout.contains("/tmp"));
            }
            Err(ValidateError::SpawnFailed { .. }) => {
                eprintln!("Skipping test: pwd not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_exec_command_spawn_failed() {
        let result = exec_command("nonexistent_command_12345", &[], &ExecOptions::default()).await;

        match result {
            Err(e @ ValidateError::SpawnFailed { .. }) => {
                assert!(e.is_tool_unavailable());
                assert!(e.to_string().contains("nonexistent_command_12345"));
            }
            _ => panic!("Expected SpawnFailed error"),
        }
    }

    #[tokio::test]
    async fn test_process_executor_tool_missing() {
        let command = CommandLine::parse("nonexistent_tool_67890 --version").unwrap();
        let result = ProcessExecutor::new()
            .execute(&command, &ExecOptions::default())
            .await;

        match result {
            Err(ValidateError::ToolMissing { tool, command }) => {
                assert_eq!(tool, "nonexistent_tool_67890");
                assert_eq!(command, "nonexistent_tool_67890 --version");
            }
            other => panic!("Expected ToolMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_process_executor_runs_in_working_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();

        let command = CommandLine::parse("ls").unwrap();
        let result = ProcessExecutor::new()
            .execute(&command, &ExecOptions::in_dir(dir.path()))
            .await;

        match result {
            Ok(res) => assert!(res.stdout.contains("marker.txt")),
            Err(ValidateError::ToolMissing { .. }) => {
                eprintln!("Skipping test: ls not available");
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_combined_output() {
        let result = ExecResult {
            success: false,
            exit_code: Some(1),
            stdout: "compiling".to_string(),
            stdout_truncated: false,
            stderr: "error[E0308]".to_string(),
            stderr_truncated: false,
            duration: Duration::from_millis(5),
        };

        assert_eq!(result.combined_output(), "compiling\nerror[E0308]");
    }

    #[test]
    fn test_truncate_at_char_boundary() {
        assert_eq!(truncate_at_char_boundary("héllo", 2), "h");
        assert_eq!(truncate_at_char_boundary("hello", 10), "hello");
    }
}
