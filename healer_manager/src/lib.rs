//! Boot fuzzer instances described by the manager config and keep them running.

use crate::config::Config;
use anyhow::Context;
use healer_core::{filter::SyscallSet, sys::load_target};
use healer_vm::{Instance, Registry, StopSignal};
use std::{os::raw::c_int, path::Path, sync::Arc, thread};

pub mod config;

/// Target the catalog is loaded for.
pub const TARGET: &str = "linux/amd64";

pub fn boot<P: AsRef<Path>>(config_path: P) -> anyhow::Result<()> {
    let config_path = config_path.as_ref();
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load config: {}", config_path.display()))?;
    log::info!(
        "manager '{}': {} {} instances, workdir: {}",
        config.name,
        config.count,
        config.ty,
        config.workdir.display()
    );
    log::debug!(
        "http: {}, master: {}, vmlinux: {}, nocover: {}",
        config.http,
        config.master,
        config.vmlinux.display(),
        config.nocover
    );

    let target = load_target(TARGET).context("failed to load target")?;
    let syscalls = config
        .syscalls(&target)
        .context("failed to resolve enabled syscalls")?;
    match syscalls.as_ref() {
        Some(calls) => log::info!(
            "syscalls: {}/{} enabled",
            calls.len(),
            target.all_syscalls().len()
        ),
        None => log::info!("syscalls: all {} enabled", target.all_syscalls().len()),
    }

    let registry = Registry::with_builtin();
    log::debug!("backends: {:?}", registry.backends());
    let stop = StopSignal::new();
    let instances = create_instances(&registry, &config, syscalls.map(Arc::new), Some(&stop))?;
    log::info!("{} instances created", instances.len());

    setup_signal_handler(stop.clone());
    run_instances(instances, &stop)
}

/// Create `count` instances of the configured backend, the first failure aborts.
pub fn create_instances(
    registry: &Registry,
    config: &Config,
    syscalls: Option<Arc<SyscallSet>>,
    stop: Option<&StopSignal>,
) -> anyhow::Result<Vec<Box<dyn Instance>>> {
    let count = config.count.max(0) as usize;
    let mut instances = Vec::with_capacity(count);
    for i in 0..count {
        let spec = config.instance_spec(i, syscalls.clone(), stop.cloned());
        let instance = registry
            .create(&config.ty, &spec)
            .with_context(|| format!("failed to create instance-{}", i))?;
        instances.push(instance);
    }
    Ok(instances)
}

/// Run each instance on its own thread, returns once all of them stopped.
pub fn run_instances(instances: Vec<Box<dyn Instance>>, stop: &StopSignal) -> anyhow::Result<()> {
    let mut handles = Vec::with_capacity(instances.len());
    for (i, mut instance) in instances.into_iter().enumerate() {
        let ret = thread::Builder::new()
            .name(format!("healer-instance-{}", i))
            .spawn(move || instance.run());
        match ret {
            Ok(h) => handles.push(h),
            Err(e) => {
                stop.stop();
                for h in handles {
                    let _ = h.join();
                }
                return Err(e).with_context(|| format!("failed to spawn thread for instance-{}", i));
            }
        }
    }

    let mut panicked = Vec::new();
    for (i, h) in handles.into_iter().enumerate() {
        if h.join().is_err() {
            panicked.push(i);
        }
    }
    if panicked.is_empty() {
        log::info!("All done");
        Ok(())
    } else {
        Err(anyhow::anyhow!("instances panicked: {:?}", panicked))
    }
}

fn setup_signal_handler(stop: StopSignal) {
    use signal_hook::consts::*;
    use signal_hook::iterator::exfiltrator::WithOrigin;
    use signal_hook::iterator::SignalsInfo;

    fn named_signal(sig: c_int) -> String {
        signal_hook::low_level::signal_name(sig)
            .map(|n| format!("{}({})", n, sig))
            .unwrap_or_else(|| sig.to_string())
    }

    let mut signals = match SignalsInfo::<WithOrigin>::new(TERM_SIGNALS) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("failed to setup signal handler: {}", e);
            return;
        }
    };

    thread::spawn(move || {
        for (n, info) in signals.forever().enumerate() {
            let from = if let Some(p) = info.process {
                format!("(pid: {}, uid: {})", p.pid, p.uid)
            } else {
                "unknown".to_string()
            };
            log::info!(
                "{} recved, from: {}, cause: {:?}",
                named_signal(info.signal),
                from,
                info.cause
            );
            if n == 0 {
                log::info!("stopping instances...");
                stop.stop();
            } else {
                log::warn!("exit without waiting instances");
                std::process::exit(1);
            }
        }
    });
}
