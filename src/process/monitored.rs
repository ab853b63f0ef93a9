//! @ai:module:intent Child process handle that samples its own resource usage on every status check
//! @ai:module:layer infrastructure
//! @ai:module:public_api MonitoredProcess, LaunchSpec
//! @ai:module:stateless false

use crate::error::LaunchError;
use crate::metrics::ExecutionStatistics;
use crate::process::sampler::ResourceSampler;
use crate::process::CommandLine;
use crate::toolchain::prefixed_path;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

/// @ai:intent Where the child's standard streams are connected
pub struct LaunchSpec<'a> {
    pub command: &'a CommandLine,
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
    /// Directory prepended to PATH in the child's environment
    pub search_path: Option<&'a Path>,
}

/// @ai:intent Owns one running child process and its ExecutionStatistics
pub struct MonitoredProcess {
    child: Child,
    pid: Option<u32>,
    program: String,
    started: Instant,
    sampler: Box<dyn ResourceSampler>,
    statistics: ExecutionStatistics,
    exited: bool,
    termination_requested: bool,
    io_warning_logged: bool,
}

impl MonitoredProcess {
    /// @ai:intent Spawn the process and take the first resource sample
    /// @ai:pre called from within a tokio runtime
    /// @ai:effects io
    pub fn start(
        spec: LaunchSpec<'_>,
        sampler: Box<dyn ResourceSampler>,
    ) -> Result<Self, LaunchError> {
        let program = spec.command.program().ok_or(LaunchError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(spec.command.args())
            .stdin(spec.stdin)
            .stdout(spec.stdout)
            .stderr(spec.stderr)
            .kill_on_drop(true);
        if let Some(path) = spec.search_path.and_then(prefixed_path) {
            command.env("PATH", path);
        }
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let mut process = Self {
            pid: child.id(),
            child,
            program: program.to_string(),
            started: Instant::now(),
            sampler,
            statistics: ExecutionStatistics::default(),
            exited: false,
            termination_requested: false,
            io_warning_logged: false,
        };
        process.poll();
        Ok(process)
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// @ai:intent Current snapshot; frozen once the process has exited
    pub fn statistics(&self) -> &ExecutionStatistics {
        &self.statistics
    }

    /// @ai:intent System-wide available memory as seen by the sampler
    /// @ai:effects io
    pub fn available_system_memory(&mut self) -> Option<u64> {
        self.sampler.available_system_memory()
    }

    /// @ai:intent Non-blocking status check; samples resources while alive
    /// @ai:post returns Some(return code) once the process has exited, and keeps returning it
    /// @ai:effects io
    pub fn poll(&mut self) -> Option<i32> {
        if self.exited {
            return self.statistics.return_code;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.finish(status);
                self.statistics.return_code
            }
            Ok(None) => {
                self.sample();
                self.statistics.execution_time = self.started.elapsed().as_secs_f64();
                None
            }
            Err(e) => {
                tracing::warn!("Failed to query status of '{}': {}", self.program, e);
                None
            }
        }
    }

    /// @ai:intent Ask the process to stop, then kill it after `grace`
    /// @ai:post the process has exited or been reaped; repeated calls are no-ops
    /// @ai:effects io
    pub async fn terminate(&mut self, grace: Duration) {
        if self.exited {
            return;
        }
        if !self.termination_requested {
            self.termination_requested = true;
            tracing::debug!("Terminating '{}' (pid {:?})", self.program, self.pid);
            self.request_stop();
        }

        if let Ok(Ok(status)) = tokio::time::timeout(grace, self.child.wait()).await {
            self.finish(status);
            return;
        }

        self.force_kill();
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => self.finish(status),
            Ok(Err(e)) => {
                tracing::warn!("Failed to reap '{}': {}", self.program, e);
                self.freeze();
            }
            Err(_) => {
                tracing::warn!(
                    "'{}' (pid {:?}) did not exit after being killed",
                    self.program,
                    self.pid
                );
                self.freeze();
            }
        }
    }

    fn sample(&mut self) {
        let Some(pid) = self.pid else {
            return;
        };
        if !self.sampler.refresh(pid) {
            return;
        }

        if let Some(memory) = self.sampler.sample_memory(pid) {
            self.statistics.record_memory(memory);
        }
        if let Some(cpu) = self.sampler.sample_cpu_time(pid) {
            self.statistics.cpu_time = Some(cpu);
        }
        match self.sampler.sample_io(pid) {
            Some(io) => {
                self.statistics.disk_reads = Some(io.read_bytes);
                self.statistics.disk_writes = Some(io.written_bytes);
            }
            None if !self.io_warning_logged => {
                self.io_warning_logged = true;
                tracing::warn!(
                    "Disk I/O counters unavailable for '{}' (pid {}), leaving them unset",
                    self.program,
                    pid
                );
            }
            None => {}
        }
    }

    fn finish(&mut self, status: ExitStatus) {
        self.statistics.return_code = Some(return_code(status));
        self.freeze();
    }

    fn freeze(&mut self) {
        self.exited = true;
        self.statistics.execution_time = self.started.elapsed().as_secs_f64();
    }

    #[cfg(unix)]
    fn request_stop(&mut self) {
        if !self.signal_group(libc::SIGTERM) {
            let _ = self.child.start_kill();
        }
    }

    #[cfg(not(unix))]
    fn request_stop(&mut self) {
        let _ = self.child.start_kill();
    }

    fn force_kill(&mut self) {
        #[cfg(unix)]
        self.signal_group(libc::SIGKILL);
        let _ = self.child.start_kill();
    }

    /// Signals the whole process group created at spawn.
    #[cfg(unix)]
    fn signal_group(&self, signal: libc::c_int) -> bool {
        let Some(pid) = self.pid else {
            return false;
        };
        let ret = unsafe { libc::kill(-(pid as libc::pid_t), signal) };
        ret == 0
    }
}

/// Exit code, or the negated signal number for signal-terminated processes.
fn return_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::sampler::{IoCounters, UnavailableSampler};
    use crate::test_support::CapturedLogs;
    use std::sync::{Arc, Mutex};

    /// Replays a fixed memory sequence, one value per refresh.
    struct ScriptedSampler {
        memory: Arc<Mutex<Vec<u64>>>,
        current: u64,
    }

    impl ResourceSampler for ScriptedSampler {
        fn refresh(&mut self, _pid: u32) -> bool {
            let mut memory = self.memory.lock().unwrap();
            if !memory.is_empty() {
                self.current = memory.remove(0);
            }
            true
        }
        fn sample_memory(&self, _pid: u32) -> Option<u64> {
            Some(self.current)
        }
        fn sample_cpu_time(&self, _pid: u32) -> Option<f64> {
            Some(0.0)
        }
        fn sample_io(&self, _pid: u32) -> Option<IoCounters> {
            Some(IoCounters::default())
        }
        fn available_system_memory(&mut self) -> Option<u64> {
            None
        }
    }

    fn spec(command: &CommandLine) -> LaunchSpec<'_> {
        LaunchSpec {
            command,
            stdin: Stdio::null(),
            stdout: Stdio::null(),
            stderr: Stdio::null(),
            search_path: None,
        }
    }

    async fn wait_for_exit(process: &mut MonitoredProcess) -> i32 {
        loop {
            if let Some(rc) = process.poll() {
                return rc;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_start_missing_executable_is_launch_error() {
        let command = CommandLine::parse("definitely_not_a_prover_xyz --help");
        let result = MonitoredProcess::start(spec(&command), Box::new(UnavailableSampler));
        assert!(matches!(result, Err(LaunchError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_start_empty_command_is_launch_error() {
        let command = CommandLine::parse("");
        let result = MonitoredProcess::start(spec(&command), Box::new(UnavailableSampler));
        assert!(matches!(result, Err(LaunchError::EmptyCommand)));
    }

    #[tokio::test]
    async fn test_poll_reports_return_code_and_freezes_time() {
        let command = CommandLine::from_tokens(vec![
            "sh".to_string(),
            "-c".to_string(),
            "exit 3".to_string(),
        ]);
        let mut process =
            MonitoredProcess::start(spec(&command), Box::new(UnavailableSampler)).unwrap();

        assert_eq!(wait_for_exit(&mut process).await, 3);
        let frozen = process.statistics().execution_time;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(process.poll(), Some(3));
        assert_eq!(process.statistics().execution_time, frozen);
    }

    #[tokio::test]
    async fn test_peak_memory_is_monotonic() {
        let memory = Arc::new(Mutex::new(vec![100, 300, 200, 250, 50]));
        let sampler = ScriptedSampler {
            memory: Arc::clone(&memory),
            current: 0,
        };
        let command = CommandLine::parse("sleep 5");
        let mut process = MonitoredProcess::start(spec(&command), Box::new(sampler)).unwrap();

        let mut previous = 0;
        for _ in 0..4 {
            assert_eq!(process.poll(), None);
            let peak = process.statistics().peak_memory.unwrap();
            assert!(peak >= previous);
            previous = peak;
        }
        assert_eq!(process.statistics().peak_memory, Some(300));
        process.terminate(Duration::from_millis(200)).await;
    }

    #[tokio::test]
    async fn test_missing_io_counters_warn_once_per_process() {
        let (logs, _guard) = CapturedLogs::install();
        let command = CommandLine::parse("sleep 5");
        let mut process =
            MonitoredProcess::start(spec(&command), Box::new(UnavailableSampler)).unwrap();

        for _ in 0..5 {
            assert_eq!(process.poll(), None);
        }
        process.terminate(Duration::from_millis(200)).await;

        assert_eq!(logs.count("Disk I/O counters unavailable"), 1);
        assert_eq!(process.statistics().disk_reads, None);
    }

    #[tokio::test]
    async fn test_available_io_counters_do_not_warn() {
        let (logs, _guard) = CapturedLogs::install();
        let sampler = ScriptedSampler {
            memory: Arc::new(Mutex::new(vec![1024])),
            current: 0,
        };
        let command = CommandLine::parse("sleep 5");
        let mut process = MonitoredProcess::start(spec(&command), Box::new(sampler)).unwrap();

        assert_eq!(process.poll(), None);
        process.terminate(Duration::from_millis(200)).await;

        assert_eq!(logs.count("WARN"), 0);
        assert_eq!(process.statistics().disk_reads, Some(0));
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent_and_reports_signal() {
        let command = CommandLine::parse("sleep 30");
        let mut process =
            MonitoredProcess::start(spec(&command), Box::new(UnavailableSampler)).unwrap();

        process.terminate(Duration::from_millis(500)).await;
        assert!(process.has_exited());
        assert_eq!(process.poll(), Some(-libc::SIGTERM));
        assert!(process.statistics().execution_time < 5.0);

        process.terminate(Duration::from_millis(500)).await;
        assert_eq!(process.poll(), Some(-libc::SIGTERM));
    }

    #[tokio::test]
    async fn test_terminate_escalates_to_kill() {
        let command = CommandLine::from_tokens(vec![
            "sh".to_string(),
            "-c".to_string(),
            "trap '' TERM; sleep 30".to_string(),
        ]);
        let mut process =
            MonitoredProcess::start(spec(&command), Box::new(UnavailableSampler)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        process.terminate(Duration::from_millis(200)).await;
        assert!(process.has_exited());
        assert_eq!(process.poll(), Some(-libc::SIGKILL));
    }

    #[tokio::test]
    async fn test_search_path_is_prepended() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let tool = dir.path().join("fake_prover");
        std::fs::write(&tool, "#!/bin/sh\nexit 7\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let command = CommandLine::from_tokens(vec![
            "sh".to_string(),
            "-c".to_string(),
            "fake_prover".to_string(),
        ]);
        let mut process = MonitoredProcess::start(
            LaunchSpec {
                search_path: Some(dir.path()),
                ..spec(&command)
            },
            Box::new(UnavailableSampler),
        )
        .unwrap();
        assert_eq!(wait_for_exit(&mut process).await, 7);
    }
}
