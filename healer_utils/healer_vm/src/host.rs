//! Host side tweaks for running fuzzers as local processes.

use nix::sys::resource::{setrlimit, Resource};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::{fs::OpenOptions, io::Write};

const EXCEPTION_TRACE: &str = "/proc/sys/debug/exception-trace";

/// Disable segfault messages in dmesg, fuzzers are going to crash a lot.
pub fn disable_exception_trace() {
    let ret = OpenOptions::new()
        .write(true)
        .open(EXCEPTION_TRACE)
        .and_then(|mut f| f.write_all(b"0"));
    if let Err(e) = ret {
        log::debug!("failed to disable {}: {}", EXCEPTION_TRACE, e);
    }
}

/// Don't write core files, inherited by all children spawned afterwards.
pub fn disable_core_dump() {
    if let Err(e) = setrlimit(Resource::RLIMIT_CORE, 0, 0) {
        log::debug!("failed to set RLIMIT_CORE: {}", e);
    }
}

/// SIGKILL the process group led by `pid` and the process itself.
///
/// Signals are sent twice and delivery is not confirmed, errors are ignored.
pub fn kill_process_group(pid: i32) {
    let targets = [Pid::from_raw(-pid), Pid::from_raw(pid)];
    for target in targets.iter().copied() {
        let _ = kill(target, Signal::SIGKILL);
        let _ = kill(target, Signal::SIGKILL);
    }
}
