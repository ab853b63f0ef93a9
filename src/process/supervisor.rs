//! @ai:module:intent Bounded execution of one external command: launch, poll, enforce limits, capture, classify
//! @ai:module:layer application
//! @ai:module:public_api ProcessSupervisor, RunRequest, RunOutcome, RunState, CaptureMode, SamplerFactory
//! @ai:module:stateless false

use crate::error::{ConfigError, RunError};
use crate::metrics::{ExecutionStatistics, OutputCapture};
use crate::process::monitored::{LaunchSpec, MonitoredProcess};
use crate::process::reader::NonBlockingReader;
use crate::process::sampler::{default_sampler, ResourceSampler};
use crate::process::{CommandLine, InputMode};
use crate::solver::{ClassifierRegistry, Solver, Verdict};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const DRAIN_INTERVAL: Duration = Duration::from_secs(1);
pub const TERMINATION_GRACE: Duration = Duration::from_millis(500);
pub const TAIL_GRACE: Duration = Duration::from_secs(1);
/// Available system memory below which the running process is killed
pub const MEMORY_FLOOR: u64 = 100 * 1024 * 1024;

pub type SamplerFactory = Arc<dyn Fn() -> Box<dyn ResourceSampler> + Send + Sync>;

/// @ai:intent How much of one output stream is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Full,
    /// Record only the most recent N bytes; the classifier still sees the whole stream
    Capped(usize),
    /// Stream is connected to the null device
    Discard,
}

impl CaptureMode {
    /// @ai:intent Full capture, or a cap when a limit is configured
    /// @ai:effects pure
    pub fn from_limit(limit: Option<usize>) -> Self {
        limit.map_or(CaptureMode::Full, CaptureMode::Capped)
    }

    fn stdio(&self) -> Stdio {
        match self {
            CaptureMode::Discard => Stdio::null(),
            _ => Stdio::piped(),
        }
    }
}

/// @ai:intent Terminal state of the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Completed,
    TimedOut,
    OutOfMemory,
    Interrupted,
}

/// @ai:intent Parameters of one supervised execution
pub struct RunRequest<'a> {
    /// Command with placeholders still in place
    pub command: &'a CommandLine,
    pub input_path: &'a Path,
    pub input_mode: InputMode,
    pub timeout: Duration,
    pub stdout_capture: CaptureMode,
    pub stderr_capture: CaptureMode,
    pub search_path: Option<&'a Path>,
    /// Classifier to use when the process completes; `None` yields Unknown
    pub solver: Option<Solver>,
    pub cancel: Option<&'a AtomicBool>,
}

/// @ai:intent Everything observed during one supervised execution
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Command as actually launched
    pub command: CommandLine,
    pub statistics: ExecutionStatistics,
    pub output: OutputCapture,
    pub verdict: Verdict,
    pub state: RunState,
}

/// Accumulates drained chunks of one stream. The whole stream is kept for
/// classification; a CaptureMode only limits what ends up in the record.
struct StreamCapture {
    mode: CaptureMode,
    bytes: Vec<u8>,
}

/// Text of one stream after the run.
struct CapturedText {
    /// Everything the process wrote, for the classifier
    full: String,
    /// What the record keeps
    stored: Option<String>,
    truncated: bool,
}

impl StreamCapture {
    fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            bytes: Vec::new(),
        }
    }

    fn extend(&mut self, chunks: Vec<Vec<u8>>) {
        if self.mode == CaptureMode::Discard {
            return;
        }
        for chunk in chunks {
            self.bytes.extend_from_slice(&chunk);
        }
    }

    fn drain_from(&mut self, reader: &mut Option<NonBlockingReader>) {
        if let Some(reader) = reader.as_mut() {
            self.extend(reader.drain_available());
        }
    }

    fn finish(self) -> CapturedText {
        let full = String::from_utf8_lossy(&self.bytes).into_owned();
        match self.mode {
            CaptureMode::Discard => CapturedText {
                full,
                stored: None,
                truncated: false,
            },
            CaptureMode::Full => CapturedText {
                stored: Some(full.clone()),
                full,
                truncated: false,
            },
            CaptureMode::Capped(limit) if self.bytes.len() > limit => {
                let tail = &self.bytes[self.bytes.len() - limit..];
                CapturedText {
                    stored: Some(String::from_utf8_lossy(tail).into_owned()),
                    full,
                    truncated: true,
                }
            }
            CaptureMode::Capped(_) => CapturedText {
                stored: Some(full.clone()),
                full,
                truncated: false,
            },
        }
    }
}

/// @ai:intent Drives one external command from launch to verdict
pub struct ProcessSupervisor {
    registry: Arc<ClassifierRegistry>,
    poll_interval: Duration,
    drain_interval: Duration,
    termination_grace: Duration,
    tail_grace: Duration,
    memory_floor: u64,
    sampler_factory: SamplerFactory,
}

impl ProcessSupervisor {
    /// @ai:intent Create a supervisor with the default cadence and limits
    /// @ai:effects pure
    pub fn new(registry: Arc<ClassifierRegistry>) -> Self {
        Self {
            registry,
            poll_interval: POLL_INTERVAL,
            drain_interval: DRAIN_INTERVAL,
            termination_grace: TERMINATION_GRACE,
            tail_grace: TAIL_GRACE,
            memory_floor: MEMORY_FLOOR,
            sampler_factory: Arc::new(default_sampler),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    pub fn with_termination_grace(mut self, grace: Duration) -> Self {
        self.termination_grace = grace;
        self
    }

    pub fn with_memory_floor(mut self, bytes: u64) -> Self {
        self.memory_floor = bytes;
        self
    }

    pub fn with_sampler_factory(mut self, factory: SamplerFactory) -> Self {
        self.sampler_factory = factory;
        self
    }

    pub fn registry(&self) -> &ClassifierRegistry {
        &self.registry
    }

    /// @ai:intent Run one command to a terminal state and classify it
    /// @ai:pre called from within a tokio runtime
    /// @ai:post exactly one Verdict; Timeout/OutOfMemory only when the limit was crossed
    /// @ai:effects io
    pub async fn run(&self, request: RunRequest<'_>) -> Result<RunOutcome, RunError> {
        let (command, stdin) = match request.input_mode {
            InputMode::Stdin => {
                let file = std::fs::File::open(request.input_path).map_err(|source| {
                    ConfigError::InputUnreadable {
                        path: request.input_path.to_path_buf(),
                        source,
                    }
                })?;
                (request.command.clone(), Stdio::from(file))
            }
            InputMode::Argument => (
                request.command.substitute(Some(request.input_path), None),
                Stdio::null(),
            ),
        };

        let mut process = MonitoredProcess::start(
            LaunchSpec {
                command: &command,
                stdin,
                stdout: request.stdout_capture.stdio(),
                stderr: request.stderr_capture.stdio(),
                search_path: request.search_path,
            },
            (self.sampler_factory)(),
        )?;
        tracing::debug!("Launched '{}' (pid {:?})", command, process.pid());

        let mut stdout_reader = process
            .take_stdout()
            .map(|s| NonBlockingReader::attach("stdout", s));
        let mut stderr_reader = process
            .take_stderr()
            .map(|s| NonBlockingReader::attach("stderr", s));
        let mut stdout = StreamCapture::new(request.stdout_capture);
        let mut stderr = StreamCapture::new(request.stderr_capture);

        let mut last_drain = Instant::now();
        let state = loop {
            tokio::time::sleep(self.poll_interval).await;

            // Limits are checked before completion is trusted, so a process
            // finishing right at the deadline may be recorded either way.
            if process.elapsed() > request.timeout {
                tracing::debug!("'{}' exceeded {:?}", command, request.timeout);
                process.terminate(self.termination_grace).await;
                break RunState::TimedOut;
            }
            if let Some(available) = process.available_system_memory() {
                if available < self.memory_floor {
                    tracing::warn!(
                        "Available memory {} MiB below floor, killing '{}'",
                        available / (1024 * 1024),
                        command
                    );
                    process.terminate(self.termination_grace).await;
                    break RunState::OutOfMemory;
                }
            }
            if request.cancel.is_some_and(|c| c.load(Ordering::SeqCst)) {
                process.terminate(self.termination_grace).await;
                break RunState::Interrupted;
            }
            if process.poll().is_some() {
                break RunState::Completed;
            }

            if last_drain.elapsed() >= self.drain_interval {
                stdout.drain_from(&mut stdout_reader);
                stderr.drain_from(&mut stderr_reader);
                last_drain = Instant::now();
            }
        };

        for reader in [&mut stdout_reader, &mut stderr_reader].into_iter().flatten() {
            reader.wait_for_eof(self.tail_grace).await;
        }
        stdout.drain_from(&mut stdout_reader);
        stderr.drain_from(&mut stderr_reader);

        let statistics = process.statistics().clone();
        let stdout = stdout.finish();
        let stderr = stderr.finish();

        let verdict = match state {
            RunState::Completed => self.registry.classify(
                request.solver,
                statistics.return_code.unwrap_or(-1),
                &stdout.full,
                &stderr.full,
            ),
            RunState::TimedOut => Verdict::Timeout,
            RunState::OutOfMemory => Verdict::OutOfMemory,
            RunState::Interrupted => Verdict::Unknown,
        };

        Ok(RunOutcome {
            command,
            statistics,
            output: OutputCapture {
                stdout: stdout.stored,
                stderr: stderr.stored,
                stdout_truncated: stdout.truncated,
                stderr_truncated: stderr.truncated,
            },
            verdict,
            state,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::LaunchError;
    use crate::process::sampler::{IoCounters, UnavailableSampler};
    use crate::test_support::CapturedLogs;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct LowMemorySampler;

    impl ResourceSampler for LowMemorySampler {
        fn refresh(&mut self, _pid: u32) -> bool {
            true
        }
        fn sample_memory(&self, _pid: u32) -> Option<u64> {
            Some(4096)
        }
        fn sample_cpu_time(&self, _pid: u32) -> Option<f64> {
            None
        }
        fn sample_io(&self, _pid: u32) -> Option<IoCounters> {
            None
        }
        fn available_system_memory(&mut self) -> Option<u64> {
            Some(10 * 1024 * 1024)
        }
    }

    fn supervisor() -> ProcessSupervisor {
        ProcessSupervisor::new(Arc::new(ClassifierRegistry::builtin()))
            .with_poll_interval(Duration::from_millis(10))
            .with_drain_interval(Duration::from_millis(30))
            .with_sampler_factory(Arc::new(|| {
                Box::new(UnavailableSampler) as Box<dyn ResourceSampler>
            }))
    }

    fn shell(script: &str) -> CommandLine {
        CommandLine::from_tokens(vec!["sh".to_string(), "-c".to_string(), script.to_string()])
    }

    fn request<'a>(command: &'a CommandLine, input: &'a Path) -> RunRequest<'a> {
        RunRequest {
            command,
            input_path: input,
            input_mode: InputMode::Argument,
            timeout: Duration::from_secs(10),
            stdout_capture: CaptureMode::Full,
            stderr_capture: CaptureMode::Full,
            search_path: None,
            solver: None,
            cancel: None,
        }
    }

    #[tokio::test]
    async fn test_sleep_past_timeout_is_timeout() {
        let command = CommandLine::parse("sleep 5 $INPUT_PATH");
        let input = Path::new("0");
        let started = Instant::now();
        let outcome = supervisor()
            .run(RunRequest {
                timeout: Duration::from_secs(1),
                ..request(&command, input)
            })
            .await
            .unwrap();

        assert_eq!(outcome.state, RunState::TimedOut);
        assert_eq!(outcome.verdict, Verdict::Timeout);
        assert!(started.elapsed() < Duration::from_millis(1300));
        assert_eq!(outcome.statistics.return_code, Some(-libc::SIGTERM));
    }

    #[tokio::test]
    async fn test_theorem_proved_is_satisfiable() {
        let command = shell("echo 'THEOREM PROVED'; exit 0 # $INPUT_PATH");
        let input = Path::new("/tmp/a.in");
        let outcome = supervisor()
            .run(RunRequest {
                solver: Some(Solver::Prover9),
                ..request(&command, input)
            })
            .await
            .unwrap();

        assert_eq!(outcome.state, RunState::Completed);
        assert_eq!(outcome.verdict, Verdict::Satisfiable);
        assert_eq!(outcome.statistics.return_code, Some(0));
    }

    #[tokio::test]
    async fn test_argument_mode_substitutes_input_path() {
        let command = CommandLine::parse("echo $INPUT_PATH");
        let input = Path::new("/tmp/a.p");
        let outcome = supervisor().run(request(&command, input)).await.unwrap();

        assert_eq!(outcome.command.tokens(), &["echo", "/tmp/a.p"]);
        assert_eq!(outcome.output.stdout.as_deref(), Some("/tmp/a.p\n"));
    }

    #[tokio::test]
    async fn test_stdin_mode_pipes_file_contents() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("problem.p");
        std::fs::write(&input, "fof(a, axiom, p).\n").unwrap();

        let command = CommandLine::parse("cat");
        let outcome = supervisor()
            .run(RunRequest {
                input_mode: InputMode::Stdin,
                ..request(&command, &input)
            })
            .await
            .unwrap();

        assert_eq!(outcome.command, command);
        assert_eq!(outcome.output.stdout.as_deref(), Some("fof(a, axiom, p).\n"));
    }

    #[tokio::test]
    async fn test_missing_stdin_input_is_config_error() {
        let command = CommandLine::parse("cat");
        let result = supervisor()
            .run(RunRequest {
                input_mode: InputMode::Stdin,
                ..request(&command, Path::new("/nonexistent/input.p"))
            })
            .await;

        assert!(matches!(
            result,
            Err(RunError::Config(ConfigError::InputUnreadable { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unspawnable_command_is_launch_error() {
        let command = CommandLine::parse("no_such_prover_xyz $INPUT_PATH");
        let result = supervisor().run(request(&command, Path::new("a.p"))).await;
        assert!(matches!(
            result,
            Err(RunError::Launch(LaunchError::Spawn { .. }))
        ));
    }

    #[tokio::test]
    async fn test_no_classifier_is_unknown() {
        let (logs, _guard) = CapturedLogs::install();
        let command = CommandLine::parse("echo $INPUT_PATH");
        let outcome = supervisor()
            .run(request(&command, Path::new("x")))
            .await
            .unwrap();
        assert_eq!(outcome.statistics.return_code, Some(0));
        assert_eq!(outcome.verdict, Verdict::Unknown);
        assert_eq!(logs.count("No output classifier registered"), 1);
    }

    #[tokio::test]
    async fn test_low_memory_is_out_of_memory() {
        let command = CommandLine::parse("sleep 5 $INPUT_PATH");
        let outcome = supervisor()
            .with_sampler_factory(Arc::new(|| {
                Box::new(LowMemorySampler) as Box<dyn ResourceSampler>
            }))
            .run(request(&command, Path::new("0")))
            .await
            .unwrap();

        assert_eq!(outcome.state, RunState::OutOfMemory);
        assert_eq!(outcome.verdict, Verdict::OutOfMemory);
        assert_eq!(outcome.statistics.peak_memory, Some(4096));
    }

    #[tokio::test]
    async fn test_both_streams_drain_without_deadlock() {
        // Well past a 64 KiB pipe buffer on both streams
        let command = shell(
            "head -c 300000 /dev/zero | tr '\\0' a; head -c 300000 /dev/zero | tr '\\0' b >&2 # $INPUT_PATH",
        );
        let outcome = supervisor()
            .run(request(&command, Path::new("x")))
            .await
            .unwrap();

        assert_eq!(outcome.state, RunState::Completed);
        let stdout = outcome.output.stdout.unwrap();
        let stderr = outcome.output.stderr.unwrap();
        assert_eq!(stdout.len(), 300_000);
        assert!(stdout.bytes().all(|b| b == b'a'));
        assert_eq!(stderr.len(), 300_000);
        assert!(stderr.bytes().all(|b| b == b'b'));
    }

    #[tokio::test]
    async fn test_output_written_across_drains_is_complete_and_ordered() {
        let command = shell("for i in 1 2 3 4 5; do echo line$i; sleep 0.05; done # $INPUT_PATH");
        let outcome = supervisor()
            .run(request(&command, Path::new("x")))
            .await
            .unwrap();
        assert_eq!(
            outcome.output.stdout.as_deref(),
            Some("line1\nline2\nline3\nline4\nline5\n")
        );
    }

    #[tokio::test]
    async fn test_capped_capture_keeps_tail() {
        let command = shell("printf 0123456789ABCDEF # $INPUT_PATH");
        let outcome = supervisor()
            .run(RunRequest {
                stdout_capture: CaptureMode::Capped(10),
                stderr_capture: CaptureMode::Discard,
                ..request(&command, Path::new("x"))
            })
            .await
            .unwrap();

        assert_eq!(outcome.output.stdout.as_deref(), Some("6789ABCDEF"));
        assert!(outcome.output.stdout_truncated);
        assert_eq!(outcome.output.stderr, None);
    }

    #[tokio::test]
    async fn test_capped_capture_still_classifies_early_marker() {
        // SPASS reports its result before the proof listing
        let command = shell(
            "echo 'SPASS beiseite: Proof found.'; head -c 5000 /dev/zero | tr '\\0' x # $INPUT_PATH",
        );
        let outcome = supervisor()
            .run(RunRequest {
                stdout_capture: CaptureMode::Capped(1024),
                solver: Some(Solver::Spass),
                ..request(&command, Path::new("x"))
            })
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Satisfiable);
        let stored = outcome.output.stdout.unwrap();
        assert_eq!(stored.len(), 1024);
        assert!(!stored.contains("Proof found"));
        assert!(outcome.output.stdout_truncated);
    }

    #[tokio::test]
    async fn test_cancelled_run_is_unknown() {
        let cancel = AtomicBool::new(true);
        let command = CommandLine::parse("sleep 5 $INPUT_PATH");
        let outcome = supervisor()
            .run(RunRequest {
                cancel: Some(&cancel),
                ..request(&command, Path::new("0"))
            })
            .await
            .unwrap();

        assert_eq!(outcome.state, RunState::Interrupted);
        assert_eq!(outcome.verdict, Verdict::Unknown);
    }
}
