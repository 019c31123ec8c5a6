use crate::{
    syscall::{Syscall, SyscallId},
    HashMap,
};

/// Read-only syscall catalog of one os/arch pair.
#[derive(Debug, Clone)]
pub struct Target {
    /// Name of target os.
    os: Box<str>,
    /// Target arch.
    arch: Box<str>,
    /// All syscalls of current os, sorted by `SyscallId`.
    all_syscalls: Vec<Syscall>,
    /// Syscall name to syscall id mapping.
    syscall_name_mapping: HashMap<Box<str>, SyscallId>,
    /// Call name to ids of all its specializations, sorted.
    call_name_mapping: HashMap<Box<str>, Vec<SyscallId>>,
}

impl Target {
    #[inline(always)]
    pub fn os(&self) -> &str {
        &self.os
    }

    #[inline(always)]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    #[inline]
    pub fn target_name(&self) -> String {
        format!("{}/{}", self.os, self.arch)
    }

    #[inline(always)]
    pub fn all_syscalls(&self) -> &[Syscall] {
        &self.all_syscalls
    }

    #[inline(always)]
    pub fn syscall_of(&self, sid: SyscallId) -> &Syscall {
        &self.all_syscalls[sid]
    }

    /// Find syscall by its full description name, such as `openat$dir`.
    #[inline]
    pub fn syscall_of_name(&self, name: &str) -> Option<&Syscall> {
        let sid = self.syscall_name_mapping.get(name)?;
        Some(self.syscall_of(*sid))
    }

    /// Ids of all syscalls whose call name equals `call_name`, empty if none.
    #[inline]
    pub fn syscalls_of_call_name(&self, call_name: &str) -> &[SyscallId] {
        self.call_name_mapping
            .get(call_name)
            .map(|sids| &sids[..])
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct TargetBuilder {
    os: Option<String>,
    arch: Option<String>,
    syscalls: Vec<(u64, String)>,
}

impl TargetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn os<T: Into<String>>(&mut self, os: T) -> &mut Self {
        self.os = Some(os.into());
        self
    }

    pub fn arch<T: Into<String>>(&mut self, arch: T) -> &mut Self {
        self.arch = Some(arch.into());
        self
    }

    /// Append one syscall, its id is the order of insertion.
    pub fn syscall<T: Into<String>>(&mut self, nr: u64, name: T) -> &mut Self {
        self.syscalls.push((nr, name.into()));
        self
    }

    pub fn build(self) -> Target {
        let all_syscalls = self
            .syscalls
            .iter()
            .enumerate()
            .map(|(id, (nr, name))| Syscall::new(id, *nr, name))
            .collect::<Vec<_>>();
        let mut syscall_name_mapping = HashMap::with_capacity(all_syscalls.len());
        let mut call_name_mapping: HashMap<Box<str>, Vec<SyscallId>> = HashMap::new();
        for s in &all_syscalls {
            syscall_name_mapping.insert(s.name().into(), s.id());
            call_name_mapping
                .entry(s.call_name().into())
                .or_default()
                .push(s.id());
        }

        Target {
            os: self.os.unwrap_or_default().into_boxed_str(),
            arch: self.arch.unwrap_or_default().into_boxed_str(),
            all_syscalls,
            syscall_name_mapping,
            call_name_mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TargetBuilder;

    #[test]
    fn lookup_by_name_and_call_name() {
        let mut builder = TargetBuilder::new();
        builder
            .os("linux")
            .arch("amd64")
            .syscall(9, "mmap")
            .syscall(257, "openat")
            .syscall(257, "openat$dir");
        let target = builder.build();

        assert_eq!(target.target_name(), "linux/amd64");
        assert_eq!(target.all_syscalls().len(), 3);
        assert_eq!(target.syscall_of_name("openat$dir").unwrap().id(), 2);
        assert!(target.syscall_of_name("openat$file").is_none());
        assert_eq!(target.syscalls_of_call_name("openat"), &[1, 2]);
        assert!(target.syscalls_of_call_name("close").is_empty());
    }
}
