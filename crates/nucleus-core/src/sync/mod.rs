//! Synchronization primitives usable before any allocator or scheduler exists.

mod lazy;
mod spinlock;

pub use lazy::LazyLock;
pub use spinlock::{SpinLock, SpinLockGuard};
