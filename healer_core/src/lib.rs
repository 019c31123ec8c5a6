//! Syscall catalog and syscall filtering of healer

use ahash::{AHashMap, AHashSet};

pub mod filter;
pub mod sys;
pub mod syscall;
pub mod target;

pub type HashMap<K, V> = AHashMap<K, V>;
pub type HashSet<V> = AHashSet<V>;
