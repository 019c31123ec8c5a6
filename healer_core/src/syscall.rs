//! Syscall entry of a target

use std::fmt::Display;

pub type SyscallId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syscall {
    /// Unique id of each declared syscall.
    id: SyscallId,
    /// Kernel call number.
    nr: u64,
    /// Name in syslang description.
    name: Box<str>,
    /// Syscall name.
    call_name: Box<str>,
}

impl Display for Syscall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(id: {}, nr: {})", self.name, self.id, self.nr)
    }
}

impl Syscall {
    /// Build a syscall from its description name, such as `openat$dir`.
    /// The call name is the part before the first `$`.
    pub fn new(id: SyscallId, nr: u64, name: &str) -> Self {
        let call_name = name.split('$').next().unwrap_or(name);
        Self {
            id,
            nr,
            name: name.into(),
            call_name: call_name.into(),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> SyscallId {
        self.id
    }

    #[inline(always)]
    pub fn nr(&self) -> u64 {
        self.nr
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn call_name(&self) -> &str {
        &self.call_name
    }

    #[inline]
    pub fn is_specialized(&self) -> bool {
        self.name.len() != self.call_name.len()
    }
}
