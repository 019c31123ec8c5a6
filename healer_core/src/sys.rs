//! Built-in syscall descriptions.
//!
//! Each table lists `(kernel call number, description name)` pairs, the position
//! of an entry is the `SyscallId` handed to the fuzzer.

use crate::target::{Target, TargetBuilder};
use std::str::FromStr;
use thiserror::Error;

pub const TARGETS: [(&str, &[(u64, &str)]); 1] = [("linux/amd64", LINUX_AMD64)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SysTarget {
    LinuxAmd64 = 0,
}

impl FromStr for SysTarget {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_ascii_lowercase()[..] {
            "linux/amd64" => Ok(Self::LinuxAmd64),
            _ => Err(LoadError::TargetNotSupported(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("target not supported: {0}")]
    TargetNotSupported(String),
}

pub fn load_target<T: AsRef<str>>(target: T) -> Result<Target, LoadError> {
    let sys = target.as_ref().parse::<SysTarget>()?;
    Ok(load_sys_target(sys))
}

pub fn load_sys_target(sys: SysTarget) -> Target {
    let (name, table) = TARGETS[sys as usize];
    let mut parts = name.split('/');
    let mut builder = TargetBuilder::new();
    builder
        .os(parts.next().unwrap_or_default())
        .arch(parts.next().unwrap_or_default());
    for (nr, name) in table.iter().copied() {
        builder.syscall(nr, name);
    }
    let target = builder.build();
    log::debug!(
        "target {} loaded, syscalls: {}",
        target.target_name(),
        target.all_syscalls().len()
    );
    target
}

#[rustfmt::skip]
const LINUX_AMD64: &[(u64, &str)] = &[
    (0, "read"),
    (0, "read$eventfd"),
    (0, "read$FUSE"),
    (1, "write"),
    (1, "write$eventfd"),
    (1, "write$FUSE_INIT"),
    (2, "open"),
    (2, "open$dir"),
    (3, "close"),
    (4, "stat"),
    (5, "fstat"),
    (6, "lstat"),
    (7, "poll"),
    (8, "lseek"),
    (9, "mmap"),
    (10, "mprotect"),
    (11, "munmap"),
    (12, "brk"),
    (13, "rt_sigaction"),
    (14, "rt_sigprocmask"),
    (15, "rt_sigreturn"),
    (16, "ioctl"),
    (16, "ioctl$TCGETS"),
    (16, "ioctl$TIOCGPTN"),
    (16, "ioctl$KVM_CREATE_VM"),
    (16, "ioctl$KVM_RUN"),
    (16, "ioctl$FIONREAD"),
    (17, "pread64"),
    (18, "pwrite64"),
    (19, "readv"),
    (20, "writev"),
    (21, "access"),
    (22, "pipe"),
    (23, "select"),
    (24, "sched_yield"),
    (25, "mremap"),
    (26, "msync"),
    (27, "mincore"),
    (28, "madvise"),
    (29, "shmget"),
    (29, "shmget$private"),
    (30, "shmat"),
    (31, "shmctl$IPC_RMID"),
    (31, "shmctl$IPC_STAT"),
    (32, "dup"),
    (33, "dup2"),
    (34, "pause"),
    (35, "nanosleep"),
    (37, "alarm"),
    (39, "getpid"),
    (40, "sendfile"),
    (41, "socket"),
    (41, "socket$inet"),
    (41, "socket$inet6"),
    (41, "socket$unix"),
    (41, "socket$netlink"),
    (42, "connect"),
    (42, "connect$inet"),
    (42, "connect$unix"),
    (43, "accept"),
    (43, "accept$inet"),
    (44, "sendto"),
    (44, "sendto$inet"),
    (45, "recvfrom"),
    (45, "recvfrom$inet"),
    (46, "sendmsg"),
    (46, "sendmsg$netlink"),
    (47, "recvmsg"),
    (48, "shutdown"),
    (49, "bind"),
    (49, "bind$inet"),
    (49, "bind$unix"),
    (50, "listen"),
    (51, "getsockname"),
    (52, "getpeername"),
    (53, "socketpair"),
    (53, "socketpair$unix"),
    (54, "setsockopt"),
    (54, "setsockopt$sock_int"),
    (54, "setsockopt$inet_tcp_int"),
    (55, "getsockopt"),
    (55, "getsockopt$sock_int"),
    (56, "clone"),
    (60, "exit"),
    (61, "wait4"),
    (62, "kill"),
    (63, "uname"),
    (64, "semget"),
    (64, "semget$private"),
    (65, "semop"),
    (66, "semctl$IPC_RMID"),
    (68, "msgget"),
    (68, "msgget$private"),
    (69, "msgsnd"),
    (70, "msgrcv"),
    (72, "fcntl$dupfd"),
    (72, "fcntl$getflags"),
    (72, "fcntl$setflags"),
    (72, "fcntl$lock"),
    (73, "flock"),
    (74, "fsync"),
    (75, "fdatasync"),
    (76, "truncate"),
    (77, "ftruncate"),
    (78, "getdents"),
    (79, "getcwd"),
    (80, "chdir"),
    (81, "fchdir"),
    (82, "rename"),
    (83, "mkdir"),
    (84, "rmdir"),
    (85, "creat"),
    (86, "link"),
    (87, "unlink"),
    (88, "symlink"),
    (89, "readlink"),
    (90, "chmod"),
    (91, "fchmod"),
    (92, "chown"),
    (93, "fchown"),
    (95, "umask"),
    (96, "gettimeofday"),
    (97, "getrlimit"),
    (98, "getrusage"),
    (99, "sysinfo"),
    (101, "ptrace"),
    (101, "ptrace$peek"),
    (101, "ptrace$cont"),
    (102, "getuid"),
    (104, "getgid"),
    (105, "setuid"),
    (106, "setgid"),
    (107, "geteuid"),
    (108, "getegid"),
    (109, "setpgid"),
    (111, "getpgrp"),
    (112, "setsid"),
    (113, "setreuid"),
    (114, "setregid"),
    (115, "getgroups"),
    (116, "setgroups"),
    (117, "setresuid"),
    (119, "setresgid"),
    (121, "getpgid"),
    (124, "getsid"),
    (125, "capget"),
    (126, "capset"),
    (131, "sigaltstack"),
    (132, "utime"),
    (133, "mknod"),
    (133, "mknod$loop"),
    (135, "personality"),
    (137, "statfs"),
    (138, "fstatfs"),
    (140, "getpriority"),
    (141, "setpriority"),
    (142, "sched_setparam"),
    (143, "sched_getparam"),
    (144, "sched_setscheduler"),
    (149, "mlock"),
    (150, "munlock"),
    (151, "mlockall"),
    (152, "munlockall"),
    (157, "prctl$PR_SET_NAME"),
    (157, "prctl$PR_GET_DUMPABLE"),
    (157, "prctl$PR_SET_SECCOMP"),
    (158, "arch_prctl$ARCH_SET_GS"),
    (158, "arch_prctl$ARCH_GET_FS"),
    (160, "setrlimit"),
    (161, "chroot"),
    (162, "sync"),
    (165, "mount"),
    (165, "mount$bpf"),
    (165, "mount$tmpfs"),
    (166, "umount2"),
    (186, "gettid"),
    (187, "readahead"),
    (188, "setxattr"),
    (189, "lsetxattr"),
    (190, "fsetxattr"),
    (191, "getxattr"),
    (194, "listxattr"),
    (197, "removexattr"),
    (200, "tkill"),
    (201, "time"),
    (202, "futex"),
    (203, "sched_setaffinity"),
    (204, "sched_getaffinity"),
    (206, "io_setup"),
    (207, "io_destroy"),
    (208, "io_getevents"),
    (209, "io_submit"),
    (210, "io_cancel"),
    (213, "epoll_create"),
    (216, "remap_file_pages"),
    (217, "getdents64"),
    (218, "set_tid_address"),
    (219, "restart_syscall"),
    (221, "fadvise64"),
    (222, "timer_create"),
    (223, "timer_settime"),
    (224, "timer_gettime"),
    (225, "timer_getoverrun"),
    (226, "timer_delete"),
    (227, "clock_settime"),
    (228, "clock_gettime"),
    (229, "clock_getres"),
    (230, "clock_nanosleep"),
    (231, "exit_group"),
    (232, "epoll_wait"),
    (233, "epoll_ctl$EPOLL_CTL_ADD"),
    (233, "epoll_ctl$EPOLL_CTL_DEL"),
    (233, "epoll_ctl$EPOLL_CTL_MOD"),
    (234, "tgkill"),
    (235, "utimes"),
    (237, "mbind"),
    (238, "set_mempolicy"),
    (239, "get_mempolicy"),
    (240, "mq_open"),
    (241, "mq_unlink"),
    (247, "waitid"),
    (248, "add_key"),
    (248, "add_key$user"),
    (249, "request_key"),
    (250, "keyctl$get_keyring_id"),
    (250, "keyctl$join"),
    (250, "keyctl$update"),
    (253, "inotify_init"),
    (254, "inotify_add_watch"),
    (255, "inotify_rm_watch"),
    (256, "migrate_pages"),
    (257, "openat"),
    (257, "openat$dir"),
    (257, "openat$kvm"),
    (257, "openat$ptmx"),
    (257, "openat$tun"),
    (258, "mkdirat"),
    (259, "mknodat"),
    (260, "fchownat"),
    (262, "newfstatat"),
    (263, "unlinkat"),
    (264, "renameat"),
    (265, "linkat"),
    (266, "symlinkat"),
    (267, "readlinkat"),
    (268, "fchmodat"),
    (269, "faccessat"),
    (270, "pselect6"),
    (271, "ppoll"),
    (272, "unshare"),
    (273, "set_robust_list"),
    (274, "get_robust_list"),
    (275, "splice"),
    (276, "tee"),
    (277, "sync_file_range"),
    (278, "vmsplice"),
    (279, "move_pages"),
    (280, "utimensat"),
    (281, "epoll_pwait"),
    (282, "signalfd"),
    (283, "timerfd_create"),
    (284, "eventfd"),
    (285, "fallocate"),
    (286, "timerfd_settime"),
    (287, "timerfd_gettime"),
    (288, "accept4"),
    (288, "accept4$inet"),
    (289, "signalfd4"),
    (290, "eventfd2"),
    (291, "epoll_create1"),
    (292, "dup3"),
    (293, "pipe2"),
    (294, "inotify_init1"),
    (295, "preadv"),
    (296, "pwritev"),
    (298, "perf_event_open"),
    (299, "recvmmsg"),
    (300, "fanotify_init"),
    (301, "fanotify_mark"),
    (302, "prlimit64"),
    (303, "name_to_handle_at"),
    (304, "open_by_handle_at"),
    (306, "syncfs"),
    (307, "sendmmsg"),
    (308, "setns"),
    (309, "getcpu"),
    (310, "process_vm_readv"),
    (311, "process_vm_writev"),
    (312, "kcmp"),
    (313, "finit_module"),
    (314, "sched_setattr"),
    (315, "sched_getattr"),
    (316, "renameat2"),
    (317, "seccomp$SECCOMP_SET_MODE_FILTER"),
    (318, "getrandom"),
    (319, "memfd_create"),
    (321, "bpf$MAP_CREATE"),
    (321, "bpf$PROG_LOAD"),
    (321, "bpf$MAP_UPDATE_ELEM"),
    (322, "execveat"),
    (323, "userfaultfd"),
    (324, "membarrier"),
    (325, "mlock2"),
    (326, "copy_file_range"),
    (327, "preadv2"),
    (328, "pwritev2"),
    (329, "pkey_mprotect"),
    (330, "pkey_alloc"),
    (331, "pkey_free"),
    (332, "statx"),
    (333, "io_pgetevents"),
    (334, "rseq"),
    (424, "pidfd_send_signal"),
    (425, "io_uring_setup"),
    (426, "io_uring_enter"),
    (427, "io_uring_register$IORING_REGISTER_BUFFERS"),
    (427, "io_uring_register$IORING_REGISTER_FILES"),
    (428, "open_tree"),
    (429, "move_mount"),
    (430, "fsopen"),
    (431, "fsconfig$FSCONFIG_SET_STRING"),
    (432, "fsmount"),
    (433, "fspick"),
    (434, "pidfd_open"),
    (435, "clone3"),
    (436, "close_range"),
    (437, "openat2"),
    (437, "openat2$dir"),
    (438, "pidfd_getfd"),
    (439, "faccessat2"),
    (440, "process_madvise"),
];

#[cfg(test)]
mod tests {
    use super::{load_target, SysTarget, TARGETS};
    use crate::HashSet;

    #[test]
    fn sys_target_name_parse() {
        for target in &TARGETS {
            target.0.parse::<SysTarget>().unwrap();
        }
        assert!("linux/sparc".parse::<SysTarget>().is_err());
    }

    #[test]
    fn load_all_targets() {
        for (name, table) in &TARGETS {
            let target = load_target(name).unwrap();
            assert_eq!(target.target_name(), *name);
            assert_eq!(target.all_syscalls().len(), table.len());
        }
    }

    #[test]
    fn description_names_are_unique() {
        for (_, table) in &TARGETS {
            let mut names = HashSet::new();
            for (_, name) in table.iter() {
                assert!(names.insert(*name), "duplicated syscall: {}", name);
            }
        }
    }

    #[test]
    fn required_syscalls_present() {
        let target = load_target("linux/amd64").unwrap();
        assert!(target.syscall_of_name("mmap").is_some());
        assert!(target.syscall_of_name("clock_gettime").is_some());
    }
}
