use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::Instant;

use crate::config::RunnerConfig;
use crate::error::{DocSamplesError, Result};

use super::Outcome;

/// Longest stderr excerpt kept in a failure message
const MAX_STDERR_CHARS: usize = 4000;

/// Executes samples of one language with an external interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRunner {
    language: String,
    program: String,
    args: Vec<String>,
    extension: String,
    scratch_dir: Option<PathBuf>,
}

impl ScriptRunner {
    pub fn new(language: impl Into<String>, program: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            program: program.into(),
            args: Vec::new(),
            extension: extension.into(),
            scratch_dir: None,
        }
    }

    /// The Python runner used when nothing else is configured
    pub fn python() -> Self {
        Self::new("python", "python3", "py")
    }

    pub fn from_config(language: &str, config: &RunnerConfig) -> Self {
        Self {
            language: language.to_string(),
            program: config.program.clone(),
            args: config.args.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
            scratch_dir: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Create sample files in `dir` instead of the system temp dir
    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run a sample and turn every way it can end into an [`Outcome`]
    pub async fn run(&self, code: &str, timeout: Duration) -> Outcome {
        match self.execute(code, timeout).await {
            Ok(()) => Outcome::Pass,
            Err(e) => Outcome::from_error(e),
        }
    }

    /// Write `code` to a temporary file and run the interpreter on it.
    ///
    /// The file lives for the duration of this call and is removed when it
    /// returns, whatever the result. On unix the interpreter leads its own
    /// process group, so a timeout also kills anything the sample started
    /// in the background.
    pub async fn execute(&self, code: &str, timeout: Duration) -> Result<()> {
        let suffix = format!(".{}", self.extension);
        let mut builder = tempfile::Builder::new();
        builder.prefix("doc-sample-").suffix(&suffix);
        let mut sample = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| DocSamplesError::RunnerUnavailable(format!("cannot create sample file: {}", e)))?;

        sample
            .write_all(code.as_bytes())
            .and_then(|_| sample.flush())
            .map_err(|e| DocSamplesError::RunnerUnavailable(format!("cannot write sample file: {}", e)))?;

        tracing::debug!(
            "Running {} sample with {} {}",
            self.language,
            self.program,
            sample.path().display()
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(sample.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let deadline = Instant::now() + timeout;
        let mut child = command.spawn().map_err(|e| {
            DocSamplesError::RunnerUnavailable(format!("failed to launch {}: {}", self.program, e))
        })?;
        let pid = child.id();

        // stderr is drained while waiting; a full pipe blocks the child
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let status = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(status) => status.map_err(|e| {
                DocSamplesError::ExecutionFailed(format!("failed to wait for {}: {}", self.program, e))
            })?,
            Err(_) => {
                kill_process_group(pid).await;
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill timed out sample: {}", e);
                }
                if let Some(task) = stderr {
                    task.abort();
                }
                return Err(DocSamplesError::ExecutionTimedOut(timeout));
            }
        };

        if status.success() {
            if let Some(task) = stderr {
                task.abort();
            }
            return Ok(());
        }

        // A background process can hold stderr open after the interpreter
        // exits, so the read shares the deadline
        let stderr = match stderr {
            Some(mut task) => match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(text) => text.unwrap_or_default(),
                Err(_) => {
                    task.abort();
                    kill_process_group(pid).await;
                    tracing::warn!("{} sample left stderr open after exiting", self.language);
                    String::new()
                }
            },
            None => String::new(),
        };
        let code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());

        Err(DocSamplesError::ExecutionFailed(format!(
            "exit status {}: {}",
            code,
            truncate(stderr.trim(), MAX_STDERR_CHARS)
        )))
    }
}

/// SIGKILL the process group led by `pid`
#[cfg(unix)]
async fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    // the shell builtin takes a negative pid without `--`
    let result = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -KILL -{}", pid))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        tracing::warn!("Failed to kill process group {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: Option<u32>) {}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::FailureKind;
    use tempfile::TempDir;

    fn sh_runner(scratch: &TempDir) -> ScriptRunner {
        ScriptRunner::new("sh", "sh", "sh").with_scratch_dir(Some(scratch.path().to_path_buf()))
    }

    fn is_empty_dir(dir: &TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_successful_sample_passes() {
        let scratch = TempDir::new().unwrap();
        let outcome = sh_runner(&scratch)
            .run("echo hello\nexit 0\n", Duration::from_secs(10))
            .await;

        assert_eq!(outcome, Outcome::Pass);
        assert!(is_empty_dir(&scratch));
    }

    #[tokio::test]
    async fn test_failing_sample_captures_stderr() {
        let scratch = TempDir::new().unwrap();
        let outcome = sh_runner(&scratch)
            .run("echo broken >&2\nexit 3\n", Duration::from_secs(10))
            .await;

        match outcome {
            Outcome::Fail(failure) => {
                assert_eq!(failure.kind, FailureKind::ExitStatus);
                assert!(failure.message.contains("exit status 3"), "{}", failure.message);
                assert!(failure.message.contains("broken"), "{}", failure.message);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(is_empty_dir(&scratch));
    }

    #[tokio::test]
    async fn test_timeout_kills_sample_and_removes_file() {
        let scratch = TempDir::new().unwrap();
        let started = std::time::Instant::now();
        let outcome = sh_runner(&scratch)
            .run("sleep 30\n", Duration::from_millis(300))
            .await;

        match outcome {
            Outcome::Fail(failure) => {
                assert_eq!(failure.kind, FailureKind::TimedOut);
                assert!(failure.message.contains("timed out"), "{}", failure.message);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(is_empty_dir(&scratch));
    }

    #[tokio::test]
    async fn test_background_process_does_not_extend_failed_run() {
        let scratch = TempDir::new().unwrap();
        let started = std::time::Instant::now();
        let outcome = sh_runner(&scratch)
            .run("sleep 6 &\nexit 1\n", Duration::from_secs(1))
            .await;

        assert!(
            started.elapsed() < Duration::from_secs(3),
            "run took {:?}",
            started.elapsed()
        );
        match outcome {
            Outcome::Fail(failure) => {
                assert_eq!(failure.kind, FailureKind::ExitStatus);
                assert!(failure.message.contains("exit status 1"), "{}", failure.message);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(is_empty_dir(&scratch));
    }

    #[cfg(target_os = "linux")]
    fn is_alive(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map(|rest| !rest.trim_start().starts_with('Z'))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_background_processes() {
        let scratch = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let pid_file = out.path().join("bg.pid");
        let code = format!("sleep 30 &\necho $! > '{}'\nsleep 30\n", pid_file.display());

        let outcome = sh_runner(&scratch).run(&code, Duration::from_secs(1)).await;
        assert!(matches!(outcome, Outcome::Fail(ref f) if f.kind == FailureKind::TimedOut));

        let pid = std::fs::read_to_string(&pid_file).expect("background pid recorded");
        let pid = pid.trim();
        let mut alive = is_alive(pid);
        for _ in 0..20 {
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            alive = is_alive(pid);
        }
        assert!(!alive, "background sleep {} survived the timeout", pid);
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_launch_failure() {
        let scratch = TempDir::new().unwrap();
        let runner = ScriptRunner::new("ghost", "definitely-not-an-interpreter-1234", "txt")
            .with_scratch_dir(Some(scratch.path().to_path_buf()));

        match runner.run("whatever", Duration::from_secs(1)).await {
            Outcome::Fail(failure) => {
                assert_eq!(failure.kind, FailureKind::Launch);
                assert!(failure.message.contains("failed to launch"), "{}", failure.message);
            }
            other => panic!("expected launch failure, got {:?}", other),
        }
        assert!(is_empty_dir(&scratch));
    }

    #[tokio::test]
    async fn test_args_come_before_sample_path() {
        let scratch = TempDir::new().unwrap();
        let runner = sh_runner(&scratch).with_args(vec!["-e".to_string()]);
        let outcome = runner.run("false\necho unreachable\n", Duration::from_secs(10)).await;
        assert!(matches!(outcome, Outcome::Fail(_)));
    }

    #[test]
    fn test_from_config_strips_dot() {
        let config = RunnerConfig {
            program: "node".to_string(),
            args: vec![],
            extension: ".js".to_string(),
            aliases: vec![],
        };
        let runner = ScriptRunner::from_config("javascript", &config);
        assert_eq!(runner.language(), "javascript");
        assert_eq!(runner.program(), "node");
        assert_eq!(runner.extension, "js");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
