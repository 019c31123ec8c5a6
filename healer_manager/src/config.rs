//! Manager config file.

use healer_core::{
    filter::{self, SyscallSet, UnknownSyscall},
    target::Target,
};
use healer_vm::{InstanceSpec, StopSignal};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs::read_to_string,
    io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use thiserror::Error;

pub const MAX_INSTANCE: i64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config param {0} is empty")]
    EmptyParam(&'static str),
    #[error("invalid config param count: {0}, want [1, 1000]")]
    BadCount(i64),
    #[error("config param params should be an object, got: {0}")]
    BadParams(Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the manager.
    pub name: String,
    /// Address of the web ui.
    pub http: String,
    /// Address of the hub.
    pub master: String,
    pub workdir: PathBuf,
    pub vmlinux: PathBuf,
    /// Backend of the instances, `local` for now.
    #[serde(rename = "type")]
    pub ty: String,
    /// Number of instances.
    pub count: i64,
    /// Port the instances report to.
    pub port: u16,
    pub nocover: bool,
    /// Backend specific params, passed to the backend as is.
    pub params: Value,
    pub enable_syscalls: Vec<String>,
    pub disable_syscalls: Vec<String>,
}

impl Config {
    /// Read, parse and check the config at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        let params = [
            ("name", self.name.is_empty()),
            ("http", self.http.is_empty()),
            ("master", self.master.is_empty()),
            ("workdir", self.workdir.as_os_str().is_empty()),
            ("vmlinux", self.vmlinux.as_os_str().is_empty()),
            ("type", self.ty.is_empty()),
        ];
        if let Some((name, _)) = params.iter().find(|(_, empty)| *empty) {
            return Err(ConfigError::EmptyParam(*name));
        }
        if self.count < 1 || self.count > MAX_INSTANCE {
            return Err(ConfigError::BadCount(self.count));
        }
        if !self.params.is_null() && !self.params.is_object() {
            return Err(ConfigError::BadParams(self.params.clone()));
        }
        Ok(())
    }

    /// Syscalls enabled by the config, `None` means all.
    pub fn syscalls(&self, target: &Target) -> Result<Option<SyscallSet>, UnknownSyscall> {
        filter::resolve(target, &self.enable_syscalls[..], &self.disable_syscalls[..])
    }

    /// Spec of the `index`th instance.
    pub fn instance_spec(
        &self,
        index: usize,
        syscalls: Option<Arc<SyscallSet>>,
        stop: Option<StopSignal>,
    ) -> InstanceSpec {
        InstanceSpec {
            workdir: self.workdir.clone(),
            syscalls,
            port: self.port,
            index,
            params: self.params.clone(),
            stop,
        }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = serde_json::from_str(s)?;
        config.check()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healer_core::sys::load_target;
    use serde_json::json;
    use std::fs::write;
    use tempfile::TempDir;

    fn sample() -> Value {
        json!({
            "name": "test",
            "http": "localhost:50000",
            "master": "localhost:48342",
            "workdir": "/tmp/healer-workdir",
            "vmlinux": "/tmp/vmlinux",
            "type": "local",
            "count": 2,
            "port": 48343,
            "params": {"Fuzzer": "/bin/true", "Executor": "/bin/true"},
            "enable_syscalls": ["mmap"]
        })
    }

    fn parse(v: Value) -> Result<Config, ConfigError> {
        v.to_string().parse()
    }

    #[test]
    fn parse_sample() {
        let config = parse(sample()).unwrap();
        assert_eq!(config.name, "test");
        assert_eq!(config.ty, "local");
        assert_eq!(config.count, 2);
        assert_eq!(config.port, 48343);
        assert!(!config.nocover);
        assert!(config.disable_syscalls.is_empty());
    }

    #[test]
    fn shipped_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("local.json");
        let config = Config::load(path).unwrap();
        assert_eq!(config.ty, "local");
        let target = load_target("linux/amd64").unwrap();
        assert!(config.syscalls(&target).unwrap().is_some());
    }

    #[test]
    fn bad_count() {
        for count in &[0_i64, -1, 1001] {
            let mut v = sample();
            v["count"] = json!(count);
            assert!(matches!(parse(v), Err(ConfigError::BadCount(c)) if c == *count));
        }
        for count in &[1_i64, 1000] {
            let mut v = sample();
            v["count"] = json!(count);
            assert!(parse(v).is_ok());
        }
    }

    #[test]
    fn empty_params() {
        for key in &["name", "http", "master", "workdir", "vmlinux", "type"] {
            let mut v = sample();
            v[*key] = json!("");
            assert!(matches!(parse(v), Err(ConfigError::EmptyParam(k)) if k == *key));

            let mut v = sample();
            v.as_object_mut().unwrap().remove(*key);
            assert!(matches!(parse(v), Err(ConfigError::EmptyParam(k)) if k == *key));
        }
    }

    #[test]
    fn params_must_be_object() {
        let mut v = sample();
        v["params"] = json!([1, 2]);
        assert!(matches!(parse(v), Err(ConfigError::BadParams(_))));

        let mut v = sample();
        v.as_object_mut().unwrap().remove("params");
        assert!(parse(v).unwrap().params.is_null());
    }

    #[test]
    fn malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        write(&path, "{\"name\": ").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Config::load(dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
        // wrong field type
        let mut v = sample();
        v["count"] = json!("two");
        assert!(matches!(parse(v), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn enable_mmap_only() {
        let config = parse(sample()).unwrap();
        let target = load_target("linux/amd64").unwrap();
        let calls = config.syscalls(&target).unwrap().unwrap();
        let mmap = target.syscall_of_name("mmap").unwrap().id();
        let clock_gettime = target.syscall_of_name("clock_gettime").unwrap().id();
        let expected = [mmap, clock_gettime].iter().copied().collect::<SyscallSet>();
        assert_eq!(calls, expected);
    }

    #[test]
    fn no_filter() {
        let mut v = sample();
        v.as_object_mut().unwrap().remove("enable_syscalls");
        let config = parse(v).unwrap();
        let target = load_target("linux/amd64").unwrap();
        assert_eq!(config.syscalls(&target), Ok(None));
    }

    #[test]
    fn unknown_syscall() {
        let target = load_target("linux/amd64").unwrap();
        let mut v = sample();
        v["disable_syscalls"] = json!(["no_such_call"]);
        let config = parse(v).unwrap();
        assert_eq!(
            config.syscalls(&target),
            Err(UnknownSyscall::Disabled("no_such_call".to_string()))
        );
    }

    #[test]
    fn instance_spec() {
        let config = parse(sample()).unwrap();
        let spec = config.instance_spec(1, None, None);
        assert_eq!(spec.index, 1);
        assert_eq!(spec.port, 48343);
        assert_eq!(spec.workdir, Path::new("/tmp/healer-workdir"));
        assert_eq!(spec.params, config.params);
    }
}
