//! Name to constructor mapping of instance backends.

use crate::{local, stop::StopSignal, HashMap, Instance};
use healer_core::filter::SyscallSet;
use serde_json::Value;
use std::{io, path::PathBuf, sync::Arc};
use thiserror::Error;

/// Everything a backend constructor gets to build one instance.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    /// Working directory of the instance.
    pub workdir: PathBuf,
    /// Syscalls the fuzzer may use, `None` means all.
    pub syscalls: Option<Arc<SyscallSet>>,
    /// Port the manager listens on.
    pub port: u16,
    /// Zero based index of the instance.
    pub index: usize,
    /// Backend specific parameters, decoded by the backend itself.
    pub params: Value,
    /// Optional stop request, instances run forever without it.
    pub stop: Option<StopSignal>,
}

pub type Ctor = fn(&InstanceSpec) -> Result<Box<dyn Instance>, CreateError>;

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("unknown backend '{0}'")]
    UnknownBackend(String),
    #[error("failed to decode backend params: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{what} binary '{}' does not exist: {source}", .path.display())]
    NotFound {
        what: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("bad parallel param: {0}, want [1-100]")]
    BadParallel(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("backend '{0}' already registered")]
    Duplicated(String),
}

/// Backends by name.
///
/// Register everything before sharing the registry, lookups only need `&self`.
#[derive(Default)]
pub struct Registry {
    ctors: HashMap<String, Ctor>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all backends shipped by this crate.
    pub fn with_builtin() -> Self {
        let mut r = Self::new();
        r.ctors
            .insert(local::BACKEND_NAME.to_string(), local::LocalInstance::create);
        r
    }

    pub fn register<T: Into<String>>(&mut self, name: T, ctor: Ctor) -> Result<(), RegisterError> {
        let name = name.into();
        if self.ctors.contains_key(&name) {
            return Err(RegisterError::Duplicated(name));
        }
        log::debug!("backend '{}' registered", name);
        self.ctors.insert(name, ctor);
        Ok(())
    }

    /// Build an instance with backend `name`, errors of the constructor are returned as is.
    pub fn create(&self, name: &str, spec: &InstanceSpec) -> Result<Box<dyn Instance>, CreateError> {
        let ctor = self
            .ctors
            .get(name)
            .ok_or_else(|| CreateError::UnknownBackend(name.to_string()))?;
        ctor(spec)
    }

    /// Registered names, sorted.
    pub fn backends(&self) -> Vec<&str> {
        let mut names = self.ctors.keys().map(|n| &n[..]).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CREATED: AtomicUsize = AtomicUsize::new(0);

    struct Dummy;

    impl Instance for Dummy {
        fn run(&mut self) {}
    }

    fn dummy(_: &InstanceSpec) -> Result<Box<dyn Instance>, CreateError> {
        CREATED.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Dummy))
    }

    fn broken(spec: &InstanceSpec) -> Result<Box<dyn Instance>, CreateError> {
        Err(CreateError::BadParallel(spec.index as i64))
    }

    fn spec() -> InstanceSpec {
        InstanceSpec {
            workdir: PathBuf::from("/nonexistent/healer-registry-test"),
            syscalls: None,
            port: 0,
            index: 7,
            params: Value::Null,
            stop: None,
        }
    }

    #[test]
    fn register_and_create() {
        let mut r = Registry::new();
        r.register("dummy", dummy).unwrap();
        assert_eq!(r.backends(), vec!["dummy"]);
        let before = CREATED.load(Ordering::SeqCst);
        let mut inst = r.create("dummy", &spec()).unwrap();
        inst.run();
        assert_eq!(CREATED.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn duplicated_name_rejected() {
        let mut r = Registry::with_builtin();
        assert_eq!(
            r.register(local::BACKEND_NAME, dummy),
            Err(RegisterError::Duplicated("local".to_string()))
        );
        r.register("dummy", dummy).unwrap();
        assert!(r.register("dummy", broken).is_err());
        assert_eq!(r.backends(), vec!["dummy", "local"]);
    }

    #[test]
    fn unknown_backend() {
        let r = Registry::with_builtin();
        match r.create("qemu", &spec()) {
            Err(CreateError::UnknownBackend(name)) => assert_eq!(name, "qemu"),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("created instance with unknown backend"),
        }
        // lookup failed before any constructor ran
        assert!(!spec().workdir.exists());
        // names are case sensitive
        assert!(r.create("Local", &spec()).is_err());
    }

    #[test]
    fn ctor_error_passed_through() {
        let mut r = Registry::new();
        r.register("broken", broken).unwrap();
        assert!(matches!(
            r.create("broken", &spec()),
            Err(CreateError::BadParallel(7))
        ));
    }
}
