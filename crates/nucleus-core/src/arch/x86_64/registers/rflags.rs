//! RFLAGS register.

bitflags::bitflags! {
    /// CPU flags (RFLAGS register).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RFlags: u64 {
        /// Carry flag.
        const CARRY           = 1 << 0;
        /// Parity flag.
        const PARITY          = 1 << 2;
        /// Adjust flag.
        const ADJUST          = 1 << 4;
        /// Zero flag.
        const ZERO            = 1 << 6;
        /// Sign flag.
        const SIGN            = 1 << 7;
        /// Trap flag (single-step).
        const TRAP            = 1 << 8;
        /// Interrupt enable flag.
        const INTERRUPT_FLAG  = 1 << 9;
        /// Direction flag.
        const DIRECTION       = 1 << 10;
        /// Overflow flag.
        const OVERFLOW        = 1 << 11;
    }
}

/// Reads the current RFLAGS register value.
#[inline]
#[must_use]
pub fn read() -> RFlags {
    let val: u64;
    unsafe {
        core::arch::asm!(
            "pushfq",
            "pop {}",
            out(reg) val,
            options(nomem),
        );
    }
    RFlags::from_bits_truncate(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_flag_bit_position() {
        assert_eq!(RFlags::INTERRUPT_FLAG.bits(), 1 << 9);
    }
}
