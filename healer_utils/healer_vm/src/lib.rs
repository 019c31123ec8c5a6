//! Instance backends of healer.
//!
//! A backend knows how to build an [`Instance`] from an [`InstanceSpec`], the
//! [`Registry`] maps backend names to their constructors.

use ahash::AHashMap;

pub mod host;
pub mod local;
pub mod registry;
pub mod stop;

pub use registry::{CreateError, Ctor, InstanceSpec, RegisterError, Registry};
pub use stop::StopSignal;

pub type HashMap<K, V> = AHashMap<K, V>;

/// Handle of one fuzzing instance.
pub trait Instance: Send {
    /// Keep the instance running, restarting it whenever it dies.
    ///
    /// Never returns unless a stop signal was attached and fired.
    fn run(&mut self);
}
