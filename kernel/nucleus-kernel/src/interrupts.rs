//! Process-wide interrupt gate installation.
//!
//! Wraps the single [`Idt`] singleton every vector's gate lives in, plus the
//! global handler table [`HandlerFn`]s dispatch through, behind the two
//! operations the rest of the kernel needs: load the table into the CPU
//! once, and install (or reinstall) a vector's gate and handler at any
//! point afterward.

use nucleus_core::arch::x86_64::structures::idt::{HandlerFn, Idt};

pub use nucleus_core::arch::x86_64::structures::idt::{register_handler, unregister_handler};

/// The kernel's single Interrupt Descriptor Table.
///
/// `static mut` rather than a `SpinLock`-guarded static: [`Idt::init`]
/// requires `&'static self` (the CPU consults this table until a different
/// one is loaded), and a lock guard's own borrow is never long enough to
/// satisfy that. Every access goes through `addr_of!`/`addr_of_mut!` so the
/// compiler never has to prove a live `&`/`&mut` borrow of the static
/// outlives the raw pointer that produced it.
static mut IDT: Idt = Idt::new();

/// Loads the IDT into the CPU.
///
/// # Safety
///
/// Must be called exactly once, after the GDT has installed a valid code
/// segment selector, and before any external interrupt can fire.
pub unsafe fn init() {
    let idt_ptr = core::ptr::addr_of!(IDT);
    // SAFETY: `IDT` has `'static` storage duration; the caller's contract
    // guarantees no interrupt can fire, hence no concurrent access, before
    // this runs.
    unsafe { (*idt_ptr).init() };
}

/// Installs `handler` at `vector`, using `ist` as the gate's interrupt
/// stack table index (0 for none).
///
/// Safe to call both before and after [`init`]: the CPU re-reads the IDT
/// from memory on every interrupt, so a gate installed after the table is
/// already loaded takes effect immediately. Per the shared gate-update
/// ordering contract, the affected gate is marked not-present for the
/// instant it takes the new trampoline address and selector.
pub fn handle_interrupt(vector: u8, ist: u8, handler: HandlerFn) {
    register_handler(vector, handler);
    let idt_ptr = core::ptr::addr_of_mut!(IDT);
    // SAFETY: called only from single-threaded boot/driver-probe code, on
    // the one core that is up at this stage.
    unsafe { (*idt_ptr).handle_interrupt(vector, ist) };
}

/// Returns whether `vector`'s gate is currently marked present.
#[must_use]
pub fn is_handled(vector: u8) -> bool {
    let idt_ptr = core::ptr::addr_of!(IDT);
    // SAFETY: a shared read of a `Copy`-free but otherwise plain-data
    // struct; no other code mutates `IDT` concurrently on this core.
    unsafe { (*idt_ptr).is_handled(vector) }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn noop_handler(_regs: &mut nucleus_core::arch::x86_64::structures::idt::Registers) {}

    #[test]
    fn handle_interrupt_marks_the_gate_present() {
        assert!(!is_handled(200));
        handle_interrupt(200, 0, noop_handler);
        assert!(is_handled(200));
        unregister_handler(200);
    }

    #[test]
    fn unhandled_vector_is_not_present() {
        assert!(!is_handled(201));
    }
}
