//! Resolve the set of syscalls a fuzzer is allowed to use.

use crate::{syscall::SyscallId, target::Target, HashSet};
use std::fmt::{self, Display};
use std::iter::FromIterator;
use thiserror::Error;

/// Syscalls the fuzzer always generates, enabled regardless of user request.
pub const ALWAYS_ENABLED: [&str; 2] = ["mmap", "clock_gettime"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownSyscall {
    #[error("unknown enabled syscall: {0}")]
    Enabled(String),
    #[error("unknown disabled syscall: {0}")]
    Disabled(String),
}

/// Allow-list of syscall ids.
#[derive(Debug, Clone, Default)]
pub struct SyscallSet {
    ids: HashSet<SyscallId>,
}

impl PartialEq for SyscallSet {
    fn eq(&self, other: &Self) -> bool {
        *self.ids == *other.ids
    }
}

impl Eq for SyscallSet {}

impl SyscallSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every syscall of `target`.
    pub fn all(target: &Target) -> Self {
        target.all_syscalls().iter().map(|s| s.id()).collect()
    }

    #[inline]
    pub fn insert(&mut self, sid: SyscallId) -> bool {
        self.ids.insert(sid)
    }

    #[inline]
    pub fn remove(&mut self, sid: SyscallId) -> bool {
        self.ids.remove(&sid)
    }

    #[inline]
    pub fn contains(&self, sid: SyscallId) -> bool {
        self.ids.contains(&sid)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order.
    pub fn sorted(&self) -> Vec<SyscallId> {
        let mut ids = self.ids.iter().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<SyscallId> for SyscallSet {
    fn from_iter<T: IntoIterator<Item = SyscallId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Comma separated ids, ascending.
impl Display for SyscallSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sid) in self.sorted().into_iter().enumerate() {
            if i != 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", sid)?;
        }
        Ok(())
    }
}

/// Build the syscall allow-list from enable/disable lists of call names.
///
/// Returns `None` if both lists are empty, which means no filtering at all.
/// Names are matched against call names, so `openat` covers `openat$dir` too.
pub fn resolve<S: AsRef<str>>(
    target: &Target,
    enabled: &[S],
    disabled: &[S],
) -> Result<Option<SyscallSet>, UnknownSyscall> {
    if enabled.is_empty() && disabled.is_empty() {
        return Ok(None);
    }

    let mut calls = if enabled.is_empty() {
        SyscallSet::all(target)
    } else {
        let mut calls = SyscallSet::new();
        for name in enabled.iter().map(|n| n.as_ref()) {
            let sids = target.syscalls_of_call_name(name);
            if sids.is_empty() {
                return Err(UnknownSyscall::Enabled(name.to_string()));
            }
            for sid in sids {
                calls.insert(*sid);
            }
        }
        calls
    };

    for name in disabled.iter().map(|n| n.as_ref()) {
        let sids = target.syscalls_of_call_name(name);
        if sids.is_empty() {
            return Err(UnknownSyscall::Disabled(name.to_string()));
        }
        for sid in sids {
            calls.remove(*sid);
        }
    }

    for name in ALWAYS_ENABLED.iter() {
        match target.syscall_of_name(name) {
            Some(s) => {
                calls.insert(s.id());
            }
            None => log::warn!("{} missing in target {}", name, target.target_name()),
        }
    }

    Ok(Some(calls))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetBuilder;

    fn dummy_target() -> Target {
        let mut builder = TargetBuilder::new();
        builder
            .os("linux")
            .arch("amd64")
            .syscall(9, "mmap")
            .syscall(9, "mmap$IORING_OFF_SQES")
            .syscall(228, "clock_gettime")
            .syscall(257, "openat")
            .syscall(257, "openat$dir")
            .syscall(3, "close")
            .syscall(0, "read");
        builder.build()
    }

    fn set(ids: &[SyscallId]) -> SyscallSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn no_lists_no_filter() {
        let target = dummy_target();
        let empty: [&str; 0] = [];
        assert_eq!(resolve(&target, &empty, &empty), Ok(None));
    }

    #[test]
    fn enable_list_keeps_required_calls() {
        let target = dummy_target();
        let calls = resolve(&target, &["close"], &[]).unwrap().unwrap();
        assert_eq!(calls, set(&[0, 2, 5]));
    }

    #[test]
    fn enable_mmap_only() {
        let target = dummy_target();
        let calls = resolve(&target, &["mmap"], &[]).unwrap().unwrap();
        // the call name matches the specialization too.
        assert_eq!(calls, set(&[0, 1, 2]));
    }

    #[test]
    fn call_name_covers_all_specializations() {
        let target = dummy_target();
        let calls = resolve(&target, &["openat"], &[]).unwrap().unwrap();
        assert!(calls.contains(3));
        assert!(calls.contains(4));
    }

    #[test]
    fn disable_list_starts_from_all() {
        let target = dummy_target();
        let calls = resolve(&target, &[], &["openat", "read"]).unwrap().unwrap();
        assert_eq!(calls, set(&[0, 1, 2, 5]));
    }

    #[test]
    fn required_calls_survive_disabling() {
        let target = dummy_target();
        let calls = resolve(&target, &[], &["mmap", "clock_gettime"])
            .unwrap()
            .unwrap();
        assert!(calls.contains(0));
        assert!(calls.contains(2));
        // only the plain mmap is re-added
        assert!(!calls.contains(1));
    }

    #[test]
    fn enable_then_disable() {
        let target = dummy_target();
        let calls = resolve(&target, &["openat", "read"], &["openat"])
            .unwrap()
            .unwrap();
        assert_eq!(calls, set(&[0, 2, 6]));
    }

    #[test]
    fn unknown_names() {
        let target = dummy_target();
        assert_eq!(
            resolve(&target, &["close", "foo"], &[]),
            Err(UnknownSyscall::Enabled("foo".to_string()))
        );
        assert_eq!(
            resolve(&target, &[], &["bar"]),
            Err(UnknownSyscall::Disabled("bar".to_string()))
        );
        // exact match only
        assert!(resolve(&target, &["openat$dir"], &[]).is_err());
        assert!(resolve(&target, &["OPENAT"], &[]).is_err());
    }

    #[test]
    fn display_sorted() {
        let calls = set(&[12, 3, 7]);
        assert_eq!(calls.to_string(), "3,7,12");
        assert_eq!(SyscallSet::new().to_string(), "");
    }
}
