//! Interrupt Descriptor Table (IDT): gate layout, per-vector trampolines,
//! and the shared dispatch ABI.
//!
//! Unlike exception handling elsewhere in this lineage (which relies on the
//! `extern "x86-interrupt"` calling convention and lets LLVM generate the
//! register save/restore), every one of the 256 vectors here is backed by a
//! hand-written `#[unsafe(naked)]` trampoline. This generalizes the one
//! place the teacher already did manual register save/restore in assembly
//! — its LAPIC timer preemption stub — into the default mechanism, so a
//! single `Registers` snapshot ABI covers exceptions, ISA IRQs, and
//! dynamically allocated vectors alike.

use core::sync::atomic::{AtomicPtr, Ordering};

/// Number of IDT vectors.
pub const VECTOR_COUNT: usize = 256;

/// Kernel code segment selector, as installed by the GDT setup this crate
/// assumes has already run by the time [`Idt::init`] is called.
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;

/// Vectors for which the CPU itself pushes a 64-bit error code before the
/// return frame.
pub const ERROR_CODE_VECTORS: [u8; 8] = [8, 10, 11, 12, 13, 14, 17, 30];

/// Returns `true` if the CPU pushes a hardware error code for `vector`.
#[must_use]
pub const fn pushes_error_code(vector: u8) -> bool {
    let mut i = 0;
    while i < ERROR_CODE_VECTORS.len() {
        if ERROR_CODE_VECTORS[i] == vector {
            return true;
        }
        i += 1;
    }
    false
}

/// Handler function signature invoked by the shared trampoline body.
///
/// Receives a pointer to the saved register snapshot; handlers that need to
/// resume the interrupted code mutate it in place.
pub type HandlerFn = extern "C" fn(&mut Registers);

/// Type of the raw per-vector trampoline entry points stored in
/// [`TRAMPOLINES`].
pub type TrampolineFn = unsafe extern "C" fn();

/// Registered handlers, one atomic slot per vector. A null entry leaves the
/// interrupt silently dropped after register save/restore (the trampoline
/// still runs IRETQ, it just never calls out to Rust).
#[allow(clippy::declare_interior_mutable_const)]
static HANDLERS: [AtomicPtr<()>; VECTOR_COUNT] = {
    const INIT: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());
    [INIT; VECTOR_COUNT]
};

/// Registers a handler for `vector`, replacing any previous registration.
pub fn register_handler(vector: u8, handler: HandlerFn) {
    HANDLERS[vector as usize].store(handler as *mut (), Ordering::Release);
}

/// Clears the handler for `vector`.
pub fn unregister_handler(vector: u8) {
    HANDLERS[vector as usize].store(core::ptr::null_mut(), Ordering::Release);
}

/// Register snapshot handed to interrupt handlers.
///
/// Field order matches the push order the shared trampoline body uses:
/// general-purpose registers from `r15` down to `rax` (the order in which
/// they end up on the stack after `push rax; push rbx; ...; push r15`),
/// then `info`, then the CPU-pushed return frame. This ordering is the ABI
/// between the generated trampolines and every handler; changing one without
/// the other corrupts every interrupt taken.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Registers {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rbp: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    /// Hardware error code for fault vectors, else the interrupt vector
    /// number pushed by the trampoline to keep this slot always populated.
    pub info: u64,
    /// CPU-pushed return frame below this point.
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

/// Bytes of scratch space the trampoline reserves for `movaps`-saved
/// XMM0-XMM15 (16 registers x 16 bytes).
const XMM_AREA_SIZE: usize = 16 * 16;

/// Generates a `#[unsafe(naked)]` trampoline for one IDT vector.
///
/// `err` vectors have a hardware-pushed error code already occupying the
/// `info` slot; `noerr` vectors have the trampoline push the vector number
/// itself into that slot so every handler sees a uniformly shaped
/// [`Registers`], per the spec's "additionally pushes a dummy interrupt
/// number in the error-code slot" rule.
macro_rules! make_trampoline {
    ($vector:expr, err) => {{
        #[unsafe(naked)]
        unsafe extern "C" fn trampoline() {
            core::arch::naked_asm!(
                "push rax", "push rbx", "push rcx", "push rdx",
                "push rsi", "push rdi", "push rbp",
                "push r8", "push r9", "push r10", "push r11",
                "push r12", "push r13", "push r14", "push r15",
                // Error-code frame (6 qwords) + 15 GP pushes land RSP at
                // 8 mod 16; this pad restores 16-byte alignment for the
                // `movaps` operands below.
                "sub rsp, 8",
                "sub rsp, {xmm_area}",
                "movaps [rsp + 0*16], xmm0",   "movaps [rsp + 1*16], xmm1",
                "movaps [rsp + 2*16], xmm2",   "movaps [rsp + 3*16], xmm3",
                "movaps [rsp + 4*16], xmm4",   "movaps [rsp + 5*16], xmm5",
                "movaps [rsp + 6*16], xmm6",   "movaps [rsp + 7*16], xmm7",
                "movaps [rsp + 8*16], xmm8",   "movaps [rsp + 9*16], xmm9",
                "movaps [rsp + 10*16], xmm10", "movaps [rsp + 11*16], xmm11",
                "movaps [rsp + 12*16], xmm12", "movaps [rsp + 13*16], xmm13",
                "movaps [rsp + 14*16], xmm14", "movaps [rsp + 15*16], xmm15",
                "lea rdi, [rsp + {xmm_area} + 8]",
                "lea rax, [rip + {handlers}]",
                "mov rax, [rax + {handler_off}]",
                "test rax, rax",
                "jz 1f",
                "call rax",
                "1:",
                "movaps xmm0, [rsp + 0*16]",   "movaps xmm1, [rsp + 1*16]",
                "movaps xmm2, [rsp + 2*16]",   "movaps xmm3, [rsp + 3*16]",
                "movaps xmm4, [rsp + 4*16]",   "movaps xmm5, [rsp + 5*16]",
                "movaps xmm6, [rsp + 6*16]",   "movaps xmm7, [rsp + 7*16]",
                "movaps xmm8, [rsp + 8*16]",   "movaps xmm9, [rsp + 9*16]",
                "movaps xmm10, [rsp + 10*16]", "movaps xmm11, [rsp + 11*16]",
                "movaps xmm12, [rsp + 12*16]", "movaps xmm13, [rsp + 13*16]",
                "movaps xmm14, [rsp + 14*16]", "movaps xmm15, [rsp + 15*16]",
                "add rsp, {xmm_area}",
                "add rsp, 8",
                "pop r15", "pop r14", "pop r13", "pop r12", "pop r11",
                "pop r10", "pop r9", "pop r8",
                "pop rbp", "pop rdi", "pop rsi",
                "pop rdx", "pop rcx", "pop rbx", "pop rax",
                "add rsp, 8",
                "iretq",
                xmm_area = const XMM_AREA_SIZE,
                handlers = sym HANDLERS,
                handler_off = const ($vector as usize) * 8,
            );
        }
        trampoline as TrampolineFn
    }};
    ($vector:expr, noerr) => {{
        #[unsafe(naked)]
        unsafe extern "C" fn trampoline() {
            core::arch::naked_asm!(
                "push {vector}",
                "push rax", "push rbx", "push rcx", "push rdx",
                "push rsi", "push rdi", "push rbp",
                "push r8", "push r9", "push r10", "push r11",
                "push r12", "push r13", "push r14", "push r15",
                // No-error frame (5 qwords) + pushed vector + 15 GP pushes
                // land RSP at 8 mod 16; this pad restores 16-byte alignment
                // for the `movaps` operands below.
                "sub rsp, 8",
                "sub rsp, {xmm_area}",
                "movaps [rsp + 0*16], xmm0",   "movaps [rsp + 1*16], xmm1",
                "movaps [rsp + 2*16], xmm2",   "movaps [rsp + 3*16], xmm3",
                "movaps [rsp + 4*16], xmm4",   "movaps [rsp + 5*16], xmm5",
                "movaps [rsp + 6*16], xmm6",   "movaps [rsp + 7*16], xmm7",
                "movaps [rsp + 8*16], xmm8",   "movaps [rsp + 9*16], xmm9",
                "movaps [rsp + 10*16], xmm10", "movaps [rsp + 11*16], xmm11",
                "movaps [rsp + 12*16], xmm12", "movaps [rsp + 13*16], xmm13",
                "movaps [rsp + 14*16], xmm14", "movaps [rsp + 15*16], xmm15",
                "lea rdi, [rsp + {xmm_area} + 8]",
                "lea rax, [rip + {handlers}]",
                "mov rax, [rax + {handler_off}]",
                "test rax, rax",
                "jz 1f",
                "call rax",
                "1:",
                "movaps xmm0, [rsp + 0*16]",   "movaps xmm1, [rsp + 1*16]",
                "movaps xmm2, [rsp + 2*16]",   "movaps xmm3, [rsp + 3*16]",
                "movaps xmm4, [rsp + 4*16]",   "movaps xmm5, [rsp + 5*16]",
                "movaps xmm6, [rsp + 6*16]",   "movaps xmm7, [rsp + 7*16]",
                "movaps xmm8, [rsp + 8*16]",   "movaps xmm9, [rsp + 9*16]",
                "movaps xmm10, [rsp + 10*16]", "movaps xmm11, [rsp + 11*16]",
                "movaps xmm12, [rsp + 12*16]", "movaps xmm13, [rsp + 13*16]",
                "movaps xmm14, [rsp + 14*16]", "movaps xmm15, [rsp + 15*16]",
                "add rsp, {xmm_area}",
                "add rsp, 8",
                "pop r15", "pop r14", "pop r13", "pop r12", "pop r11",
                "pop r10", "pop r9", "pop r8",
                "pop rbp", "pop rdi", "pop rsi",
                "pop rdx", "pop rcx", "pop rbx", "pop rax",
                "add rsp, 8",
                "iretq",
                vector = const $vector as u64,
                xmm_area = const XMM_AREA_SIZE,
                handlers = sym HANDLERS,
                handler_off = const ($vector as usize) * 8,
            );
        }
        trampoline as TrampolineFn
    }};
}

/// `TRAMPOLINES[v]` is the entry point the IDT gate for vector `v` points at.
pub static TRAMPOLINES: [TrampolineFn; VECTOR_COUNT] = [
    // Vectors 0-15
    make_trampoline!(0, noerr),
    make_trampoline!(1, noerr),
    make_trampoline!(2, noerr),
    make_trampoline!(3, noerr),
    make_trampoline!(4, noerr),
    make_trampoline!(5, noerr),
    make_trampoline!(6, noerr),
    make_trampoline!(7, noerr),
    make_trampoline!(8, err),
    make_trampoline!(9, noerr),
    make_trampoline!(10, err),
    make_trampoline!(11, err),
    make_trampoline!(12, err),
    make_trampoline!(13, err),
    make_trampoline!(14, err),
    make_trampoline!(15, noerr),
    // Vectors 16-31
    make_trampoline!(16, noerr),
    make_trampoline!(17, err),
    make_trampoline!(18, noerr),
    make_trampoline!(19, noerr),
    make_trampoline!(20, noerr),
    make_trampoline!(21, noerr),
    make_trampoline!(22, noerr),
    make_trampoline!(23, noerr),
    make_trampoline!(24, noerr),
    make_trampoline!(25, noerr),
    make_trampoline!(26, noerr),
    make_trampoline!(27, noerr),
    make_trampoline!(28, noerr),
    make_trampoline!(29, noerr),
    make_trampoline!(30, err),
    make_trampoline!(31, noerr),
    // Vectors 32-47
    make_trampoline!(32, noerr),
    make_trampoline!(33, noerr),
    make_trampoline!(34, noerr),
    make_trampoline!(35, noerr),
    make_trampoline!(36, noerr),
    make_trampoline!(37, noerr),
    make_trampoline!(38, noerr),
    make_trampoline!(39, noerr),
    make_trampoline!(40, noerr),
    make_trampoline!(41, noerr),
    make_trampoline!(42, noerr),
    make_trampoline!(43, noerr),
    make_trampoline!(44, noerr),
    make_trampoline!(45, noerr),
    make_trampoline!(46, noerr),
    make_trampoline!(47, noerr),
    // Vectors 48-63
    make_trampoline!(48, noerr),
    make_trampoline!(49, noerr),
    make_trampoline!(50, noerr),
    make_trampoline!(51, noerr),
    make_trampoline!(52, noerr),
    make_trampoline!(53, noerr),
    make_trampoline!(54, noerr),
    make_trampoline!(55, noerr),
    make_trampoline!(56, noerr),
    make_trampoline!(57, noerr),
    make_trampoline!(58, noerr),
    make_trampoline!(59, noerr),
    make_trampoline!(60, noerr),
    make_trampoline!(61, noerr),
    make_trampoline!(62, noerr),
    make_trampoline!(63, noerr),
    // Vectors 64-79
    make_trampoline!(64, noerr),
    make_trampoline!(65, noerr),
    make_trampoline!(66, noerr),
    make_trampoline!(67, noerr),
    make_trampoline!(68, noerr),
    make_trampoline!(69, noerr),
    make_trampoline!(70, noerr),
    make_trampoline!(71, noerr),
    make_trampoline!(72, noerr),
    make_trampoline!(73, noerr),
    make_trampoline!(74, noerr),
    make_trampoline!(75, noerr),
    make_trampoline!(76, noerr),
    make_trampoline!(77, noerr),
    make_trampoline!(78, noerr),
    make_trampoline!(79, noerr),
    // Vectors 80-95
    make_trampoline!(80, noerr),
    make_trampoline!(81, noerr),
    make_trampoline!(82, noerr),
    make_trampoline!(83, noerr),
    make_trampoline!(84, noerr),
    make_trampoline!(85, noerr),
    make_trampoline!(86, noerr),
    make_trampoline!(87, noerr),
    make_trampoline!(88, noerr),
    make_trampoline!(89, noerr),
    make_trampoline!(90, noerr),
    make_trampoline!(91, noerr),
    make_trampoline!(92, noerr),
    make_trampoline!(93, noerr),
    make_trampoline!(94, noerr),
    make_trampoline!(95, noerr),
    // Vectors 96-111
    make_trampoline!(96, noerr),
    make_trampoline!(97, noerr),
    make_trampoline!(98, noerr),
    make_trampoline!(99, noerr),
    make_trampoline!(100, noerr),
    make_trampoline!(101, noerr),
    make_trampoline!(102, noerr),
    make_trampoline!(103, noerr),
    make_trampoline!(104, noerr),
    make_trampoline!(105, noerr),
    make_trampoline!(106, noerr),
    make_trampoline!(107, noerr),
    make_trampoline!(108, noerr),
    make_trampoline!(109, noerr),
    make_trampoline!(110, noerr),
    make_trampoline!(111, noerr),
    // Vectors 112-127
    make_trampoline!(112, noerr),
    make_trampoline!(113, noerr),
    make_trampoline!(114, noerr),
    make_trampoline!(115, noerr),
    make_trampoline!(116, noerr),
    make_trampoline!(117, noerr),
    make_trampoline!(118, noerr),
    make_trampoline!(119, noerr),
    make_trampoline!(120, noerr),
    make_trampoline!(121, noerr),
    make_trampoline!(122, noerr),
    make_trampoline!(123, noerr),
    make_trampoline!(124, noerr),
    make_trampoline!(125, noerr),
    make_trampoline!(126, noerr),
    make_trampoline!(127, noerr),
    // Vectors 128-143
    make_trampoline!(128, noerr),
    make_trampoline!(129, noerr),
    make_trampoline!(130, noerr),
    make_trampoline!(131, noerr),
    make_trampoline!(132, noerr),
    make_trampoline!(133, noerr),
    make_trampoline!(134, noerr),
    make_trampoline!(135, noerr),
    make_trampoline!(136, noerr),
    make_trampoline!(137, noerr),
    make_trampoline!(138, noerr),
    make_trampoline!(139, noerr),
    make_trampoline!(140, noerr),
    make_trampoline!(141, noerr),
    make_trampoline!(142, noerr),
    make_trampoline!(143, noerr),
    // Vectors 144-159
    make_trampoline!(144, noerr),
    make_trampoline!(145, noerr),
    make_trampoline!(146, noerr),
    make_trampoline!(147, noerr),
    make_trampoline!(148, noerr),
    make_trampoline!(149, noerr),
    make_trampoline!(150, noerr),
    make_trampoline!(151, noerr),
    make_trampoline!(152, noerr),
    make_trampoline!(153, noerr),
    make_trampoline!(154, noerr),
    make_trampoline!(155, noerr),
    make_trampoline!(156, noerr),
    make_trampoline!(157, noerr),
    make_trampoline!(158, noerr),
    make_trampoline!(159, noerr),
    // Vectors 160-175
    make_trampoline!(160, noerr),
    make_trampoline!(161, noerr),
    make_trampoline!(162, noerr),
    make_trampoline!(163, noerr),
    make_trampoline!(164, noerr),
    make_trampoline!(165, noerr),
    make_trampoline!(166, noerr),
    make_trampoline!(167, noerr),
    make_trampoline!(168, noerr),
    make_trampoline!(169, noerr),
    make_trampoline!(170, noerr),
    make_trampoline!(171, noerr),
    make_trampoline!(172, noerr),
    make_trampoline!(173, noerr),
    make_trampoline!(174, noerr),
    make_trampoline!(175, noerr),
    // Vectors 176-191
    make_trampoline!(176, noerr),
    make_trampoline!(177, noerr),
    make_trampoline!(178, noerr),
    make_trampoline!(179, noerr),
    make_trampoline!(180, noerr),
    make_trampoline!(181, noerr),
    make_trampoline!(182, noerr),
    make_trampoline!(183, noerr),
    make_trampoline!(184, noerr),
    make_trampoline!(185, noerr),
    make_trampoline!(186, noerr),
    make_trampoline!(187, noerr),
    make_trampoline!(188, noerr),
    make_trampoline!(189, noerr),
    make_trampoline!(190, noerr),
    make_trampoline!(191, noerr),
    // Vectors 192-207
    make_trampoline!(192, noerr),
    make_trampoline!(193, noerr),
    make_trampoline!(194, noerr),
    make_trampoline!(195, noerr),
    make_trampoline!(196, noerr),
    make_trampoline!(197, noerr),
    make_trampoline!(198, noerr),
    make_trampoline!(199, noerr),
    make_trampoline!(200, noerr),
    make_trampoline!(201, noerr),
    make_trampoline!(202, noerr),
    make_trampoline!(203, noerr),
    make_trampoline!(204, noerr),
    make_trampoline!(205, noerr),
    make_trampoline!(206, noerr),
    make_trampoline!(207, noerr),
    // Vectors 208-223
    make_trampoline!(208, noerr),
    make_trampoline!(209, noerr),
    make_trampoline!(210, noerr),
    make_trampoline!(211, noerr),
    make_trampoline!(212, noerr),
    make_trampoline!(213, noerr),
    make_trampoline!(214, noerr),
    make_trampoline!(215, noerr),
    make_trampoline!(216, noerr),
    make_trampoline!(217, noerr),
    make_trampoline!(218, noerr),
    make_trampoline!(219, noerr),
    make_trampoline!(220, noerr),
    make_trampoline!(221, noerr),
    make_trampoline!(222, noerr),
    make_trampoline!(223, noerr),
    // Vectors 224-239
    make_trampoline!(224, noerr),
    make_trampoline!(225, noerr),
    make_trampoline!(226, noerr),
    make_trampoline!(227, noerr),
    make_trampoline!(228, noerr),
    make_trampoline!(229, noerr),
    make_trampoline!(230, noerr),
    make_trampoline!(231, noerr),
    make_trampoline!(232, noerr),
    make_trampoline!(233, noerr),
    make_trampoline!(234, noerr),
    make_trampoline!(235, noerr),
    make_trampoline!(236, noerr),
    make_trampoline!(237, noerr),
    make_trampoline!(238, noerr),
    make_trampoline!(239, noerr),
    // Vectors 240-255
    make_trampoline!(240, noerr),
    make_trampoline!(241, noerr),
    make_trampoline!(242, noerr),
    make_trampoline!(243, noerr),
    make_trampoline!(244, noerr),
    make_trampoline!(245, noerr),
    make_trampoline!(246, noerr),
    make_trampoline!(247, noerr),
    make_trampoline!(248, noerr),
    make_trampoline!(249, noerr),
    make_trampoline!(250, noerr),
    make_trampoline!(251, noerr),
    make_trampoline!(252, noerr),
    make_trampoline!(253, noerr),
    make_trampoline!(254, noerr),
    make_trampoline!(255, noerr),
];

/// A single IDT gate entry (16 bytes).
#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct IdtEntry {
    offset_low: u16,
    selector: u16,
    ist: u8,
    type_attr: u8,
    offset_mid: u16,
    offset_high: u32,
    reserved: u32,
}

impl IdtEntry {
    const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            ist: 0,
            type_attr: 0,
            offset_mid: 0,
            offset_high: 0,
            reserved: 0,
        }
    }

    fn is_present(&self) -> bool {
        self.type_attr & 0x80 != 0
    }
}

/// Pointer to the IDT, loaded via `lidt` (10 bytes: 2-byte limit, 8-byte
/// base).
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
struct Idtr {
    limit: u16,
    base: u64,
}

impl Idtr {
    /// # Safety
    ///
    /// `self.base` must point at a live `[IdtEntry; VECTOR_COUNT]` that
    /// outlives the loaded IDT.
    unsafe fn load(&self) {
        unsafe {
            core::arch::asm!(
                "lidt [{}]",
                in(reg) self,
                options(readonly, nostack, preserves_flags),
            );
        }
    }
}

/// The Interrupt Descriptor Table: 256 gates, one per vector.
#[repr(C, align(16))]
pub struct Idt {
    entries: [IdtEntry; VECTOR_COUNT],
}

impl Default for Idt {
    fn default() -> Self {
        Self::new()
    }
}

impl Idt {
    /// Creates an IDT with every gate marked not-present.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [IdtEntry::missing(); VECTOR_COUNT],
        }
    }

    /// Loads this table into the CPU via `lidt`.
    ///
    /// # Safety
    ///
    /// `self` must be `'static`: the CPU consults this table on every
    /// interrupt until a different one is loaded.
    pub unsafe fn init(&'static self) {
        let idtr = Idtr {
            limit: (core::mem::size_of_val(&self.entries) - 1) as u16,
            base: self.entries.as_ptr() as u64,
        };
        unsafe { idtr.load() };
    }

    /// Points the gate for `vector` at its generated trampoline.
    ///
    /// Per spec, updates must be atomic from the CPU's perspective: the
    /// present bit is cleared first (in case this vector is being
    /// reconfigured while live) and set last, once every other field holds
    /// its new value.
    pub fn handle_interrupt(&mut self, vector: u8, ist: u8) {
        let trampoline_addr = TRAMPOLINES[vector as usize] as u64;
        let entry = &mut self.entries[vector as usize];

        entry.type_attr = 0; // clear present bit first
        entry.offset_low = trampoline_addr as u16;
        entry.selector = KERNEL_CODE_SELECTOR;
        entry.ist = ist & 0x07;
        entry.offset_mid = (trampoline_addr >> 16) as u16;
        entry.offset_high = (trampoline_addr >> 32) as u32;
        entry.type_attr = 0x8E; // present, ring 0, 64-bit interrupt gate
    }

    /// Returns whether `vector`'s gate is currently marked present.
    #[must_use]
    pub fn is_handled(&self, vector: u8) -> bool {
        self.entries[vector as usize].is_present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_vectors_match_spec_list() {
        for v in 0u16..256 {
            let expected = matches!(v, 8 | 10 | 11 | 12 | 13 | 14 | 17 | 30);
            assert_eq!(pushes_error_code(v as u8), expected);
        }
    }

    #[test]
    fn missing_entry_is_not_present() {
        let entry = IdtEntry::missing();
        assert!(!entry.is_present());
    }

    #[test]
    fn new_idt_has_no_gates_present() {
        let idt = Idt::new();
        for v in 0..VECTOR_COUNT {
            assert!(!idt.entries[v].is_present());
        }
    }

    #[test]
    fn handle_interrupt_sets_present_and_selector() {
        let mut idt = Idt::new();
        idt.handle_interrupt(32, 0);
        assert!(idt.is_handled(32));
        assert_eq!(idt.entries[32].selector, KERNEL_CODE_SELECTOR);
        assert_eq!(idt.entries[32].type_attr, 0x8E);
    }

    #[test]
    fn handle_interrupt_encodes_trampoline_address() {
        let mut idt = Idt::new();
        idt.handle_interrupt(14, 0);
        let entry = &idt.entries[14];
        let expected = TRAMPOLINES[14] as u64;
        let low = u64::from(entry.offset_low);
        let mid = u64::from(entry.offset_mid) << 16;
        let high = u64::from(entry.offset_high) << 32;
        assert_eq!(low | mid | high, expected);
    }

    #[test]
    fn registers_size_matches_field_count() {
        // 15 GP registers + info + 5-field CPU frame = 21 u64 fields.
        assert_eq!(core::mem::size_of::<Registers>(), 21 * 8);
    }

    #[test]
    fn trampolines_table_has_distinct_entries_per_vector() {
        // Each macro expansion defines a distinct local fn, so addresses
        // must differ even between adjacent noerr vectors.
        assert_ne!(TRAMPOLINES[0] as usize, TRAMPOLINES[1] as usize);
        assert_ne!(TRAMPOLINES[8] as usize, TRAMPOLINES[9] as usize);
    }
}
