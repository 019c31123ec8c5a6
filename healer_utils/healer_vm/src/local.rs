//! Run the fuzzer as a local process, restart it when it dies or runs for too long.

use crate::{
    host,
    registry::{CreateError, InstanceSpec},
    stop::StopSignal,
    Instance,
};
use healer_core::filter::SyscallSet;
use nix::unistd::{setpgid, Pid};
use serde_derive::Deserialize;
use std::{
    fs::{create_dir_all, metadata},
    io,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

pub const BACKEND_NAME: &str = "local";
/// Wait time before restarting the fuzzer.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(10);
/// Max running time of one fuzzer process.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const MAX_PARALLEL: i64 = 100;

const WATCHDOG_TICK: Duration = Duration::from_millis(500);

/// Params of local backend, `params` object of the config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalParams {
    /// Path to fuzzer binary.
    #[serde(rename = "Fuzzer", alias = "fuzzer", default)]
    pub fuzzer: PathBuf,
    /// Path to executor binary.
    #[serde(rename = "Executor", alias = "executor", default)]
    pub executor: PathBuf,
    /// Parallel executors of each fuzzer, 0 means 1.
    #[serde(rename = "Parallel", alias = "parallel", default)]
    pub parallel: i64,
}

impl LocalParams {
    pub fn check(&mut self) -> Result<(), CreateError> {
        check_exists("fuzzer", &self.fuzzer)?;
        check_exists("executor", &self.executor)?;
        if self.parallel == 0 {
            self.parallel = 1;
        }
        if self.parallel < 1 || self.parallel > MAX_PARALLEL {
            return Err(CreateError::BadParallel(self.parallel));
        }
        Ok(())
    }
}

fn check_exists(what: &'static str, path: &Path) -> Result<(), CreateError> {
    metadata(path).map(|_| ()).map_err(|source| CreateError::NotFound {
        what,
        path: path.to_path_buf(),
        source,
    })
}

pub struct LocalInstance {
    params: LocalParams,
    workdir: PathBuf,
    syscalls: Option<Arc<SyscallSet>>,
    id: usize,
    mgr_port: u16,
    restart_delay: Duration,
    run_timeout: Duration,
    stop: Option<StopSignal>,
}

impl LocalInstance {
    /// Constructor registered as the `local` backend.
    pub fn create(spec: &InstanceSpec) -> Result<Box<dyn Instance>, CreateError> {
        Ok(Box::new(Self::with_spec(spec)?))
    }

    pub fn with_spec(spec: &InstanceSpec) -> Result<Self, CreateError> {
        let mut params = if spec.params.is_null() {
            LocalParams::default()
        } else {
            serde_json::from_value(spec.params.clone())?
        };
        params.check()?;

        if let Err(e) = create_dir_all(&spec.workdir) {
            log::warn!(
                "failed to create workdir '{}': {}",
                spec.workdir.display(),
                e
            );
        }
        host::disable_exception_trace();
        host::disable_core_dump();

        Ok(Self {
            params,
            workdir: spec.workdir.clone(),
            syscalls: spec.syscalls.clone(),
            id: spec.index,
            mgr_port: spec.port,
            restart_delay: DEFAULT_RESTART_DELAY,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            stop: spec.stop.clone(),
        })
    }

    /// Override the restart delay and the max running time of each fuzzer process.
    pub fn with_timing(mut self, restart_delay: Duration, run_timeout: Duration) -> Self {
        self.restart_delay = restart_delay;
        self.run_timeout = run_timeout;
        self
    }

    #[inline]
    pub fn name(&self) -> String {
        format!("local-{}", self.id)
    }

    #[inline]
    pub fn parallel(&self) -> i64 {
        self.params.parallel
    }

    #[inline]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Command line of the fuzzer, placed in its own process group.
    pub fn fuzzer_cmd(&self) -> Command {
        let mut cmd = Command::new(&self.params.fuzzer);
        cmd.arg("-name")
            .arg(self.name())
            .arg("-saveprog")
            .arg("-executor")
            .arg(&self.params.executor)
            .arg("-manager")
            .arg(format!("localhost:{}", self.mgr_port))
            .arg("-parallel")
            .arg(self.params.parallel.to_string());
        if let Some(calls) = self.syscalls.as_ref() {
            if !calls.is_empty() {
                cmd.arg(format!("-calls={}", calls));
            }
        }
        cmd.current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        unsafe {
            cmd.pre_exec(|| {
                setpgid(Pid::from_raw(0), Pid::from_raw(0))?;
                Ok(())
            });
        }
        cmd
    }

    fn stopped(&self) -> bool {
        self.stop.as_ref().map_or(false, |s| s.is_stopped())
    }

    /// Sleep the restart delay, returns true if stop was requested meanwhile.
    fn backoff(&self) -> bool {
        match self.stop.as_ref() {
            Some(stop) => stop.wait_timeout(self.restart_delay),
            None => {
                thread::sleep(self.restart_delay);
                false
            }
        }
    }

    /// Wait for the fuzzer to exit, kill its group once it runs for too long.
    fn supervise(&self, name: &str, mut child: Child) -> io::Result<ExitStatus> {
        let pid = child.id() as i32;
        let done = StopSignal::new();
        let handle = {
            let name = name.to_string();
            let done = done.clone();
            let stop = self.stop.clone();
            let timeout = self.run_timeout;
            thread::Builder::new()
                .name(format!("{}-watchdog", name))
                .spawn(move || watch(&name, pid, &done, stop.as_ref(), timeout))
        };
        let watchdog = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                log::warn!("{}: failed to spawn watchdog, killing fuzzer: {}", name, e);
                host::kill_process_group(pid);
                None
            }
        };

        let status = child.wait();
        done.stop();
        if let Some(h) = watchdog {
            let _ = h.join();
        }
        status
    }
}

impl Instance for LocalInstance {
    fn run(&mut self) {
        let name = self.name();
        log::info!("{}: started", name);

        for run in 0_u64.. {
            if self.stopped() {
                break;
            }
            let mut cmd = self.fuzzer_cmd();
            log::debug!("{}: run-{}: {:?}", name, run, cmd);
            match cmd.spawn() {
                Ok(child) => match self.supervise(&name, child) {
                    Ok(status) => log::info!("{}: fuzzer binary exited: {}", name, status),
                    Err(e) => log::warn!("{}: failed to wait fuzzer binary: {}", name, e),
                },
                Err(e) => log::warn!("{}: failed to start fuzzer binary: {}", name, e),
            }
            if self.backoff() {
                break;
            }
        }

        log::info!("{}: stopped", name);
    }
}

fn watch(name: &str, pid: i32, done: &StopSignal, stop: Option<&StopSignal>, timeout: Duration) {
    let start = Instant::now();
    loop {
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            // pid may be reaped and reused once `done` fired.
            if !done.is_stopped() {
                log::info!("{}: running for long enough, restarting", name);
                host::kill_process_group(pid);
            }
            return;
        }
        let tick = std::cmp::min(timeout - elapsed, WATCHDOG_TICK);
        if done.wait_timeout(tick) {
            return;
        }
        if stop.map_or(false, |s| s.is_stopped()) {
            if !done.is_stopped() {
                log::info!("{}: stop requested, killing fuzzer", name);
                host::kill_process_group(pid);
            }
            return;
        }
    }
}
