//! Lazy initialization primitive for `no_std`.
//!
//! A `no_std` equivalent of `std::sync::LazyLock` used for every process-wide
//! singleton in the kernel (IDT, driver registry, HAL context) that cannot be
//! built with a `const fn` initializer.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ops::Deref;
use core::sync::atomic::{AtomicU8, Ordering};

const UNINIT: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;

/// A value that is initialized on first access.
pub struct LazyLock<T, F = fn() -> T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
    init: UnsafeCell<Option<F>>,
}

// SAFETY: the atomic state machine ensures the value is fully initialized
// before any thread can read it, and the init closure runs exactly once.
unsafe impl<T: Send + Sync, F: Send> Send for LazyLock<T, F> {}
unsafe impl<T: Send + Sync, F: Send> Sync for LazyLock<T, F> {}

impl<T, F: FnOnce() -> T> LazyLock<T, F> {
    /// Creates a new `LazyLock` with the given initializer.
    pub const fn new(init: F) -> Self {
        Self {
            state: AtomicU8::new(UNINIT),
            value: UnsafeCell::new(MaybeUninit::uninit()),
            init: UnsafeCell::new(Some(init)),
        }
    }

    /// Forces initialization if not already done, then returns a reference.
    fn force(&self) -> &T {
        match self.state.load(Ordering::Acquire) {
            READY => return unsafe { (*self.value.get()).assume_init_ref() },
            UNINIT => {
                if self
                    .state
                    .compare_exchange(UNINIT, INITIALIZING, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
                {
                    // SAFETY: we are the only thread in INITIALIZING state.
                    let init = unsafe { (*self.init.get()).take().unwrap() };
                    let value = init();
                    unsafe { (*self.value.get()).write(value) };
                    self.state.store(READY, Ordering::Release);
                    return unsafe { (*self.value.get()).assume_init_ref() };
                }
            }
            _ => {}
        }

        // Either this thread lost the init race or is re-entering while
        // another is initializing: spin for READY. On our uniprocessor,
        // single-threaded-bootstrap target this only loops once or not at
        // all in practice.
        loop {
            if self.state.load(Ordering::Acquire) == READY {
                break;
            }
            core::hint::spin_loop();
        }
        unsafe { (*self.value.get()).assume_init_ref() }
    }
}

impl<T, F: FnOnce() -> T> Deref for LazyLock<T, F> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.force()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn initializes_on_first_access() {
        let lazy = LazyLock::new(|| 42);
        assert_eq!(*lazy, 42);
    }

    #[test]
    fn init_called_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let lazy = LazyLock::new(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            7
        });
        assert_eq!(*lazy, 7);
        assert_eq!(*lazy, 7);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
