//! Freestanding entry point for the nucleus kernel binary.
//!
//! GRUB (or any Multiboot2-compliant loader) hands control to [`_start`] in
//! 32-bit protected mode with paging disabled, EAX holding the Multiboot2
//! magic and EBX the physical address of the boot info block. Getting from
//! there to the 64-bit Rust world in [`crate::kernel_main`] takes a short,
//! unavoidable asm stub: build a 1 GiB identity map, enable PAE and long
//! mode, and far-jump into a 64-bit code segment. Everything past that jump
//! is ordinary Rust.
#![no_std]
#![no_main]

use nucleus_core::arch::x86_64::instructions::segmentation;
use nucleus_core::arch::x86_64::registers::control::{Cr0, Cr0Flags, Cr4, Cr4Flags};
use nucleus_core::arch::x86_64::structures::gdt::SegmentSelector;
use nucleus_core::arch::x86_64::{Descriptor, GlobalDescriptorTable};
use nucleus_core::sync::LazyLock;

/// The bootloader-facing Multiboot2 header, placed in its own linker section
/// so `x86_64-unknown-nucleus.ld` can require it appear within the first
/// 32 KiB of the image. Requests a 1024x768x32 linear framebuffer; GRUB
/// falls back to EGA text mode if no such mode is available, which the
/// `vga-text` driver then picks up instead of `linear-fb`.
#[repr(C, align(8))]
struct Multiboot2Header {
    magic: u32,
    architecture: u32,
    header_length: u32,
    checksum: u32,
    fb_tag_type: u16,
    fb_tag_flags: u16,
    fb_tag_size: u32,
    fb_width: u32,
    fb_height: u32,
    fb_depth: u32,
    fb_tag_padding: u32,
    end_tag_type: u16,
    end_tag_flags: u16,
    end_tag_size: u32,
}

const MULTIBOOT2_MAGIC: u32 = 0xE852_50D6;
const MULTIBOOT2_ARCHITECTURE_I386: u32 = 0;
const HEADER_LENGTH: u32 = core::mem::size_of::<Multiboot2Header>() as u32;

#[unsafe(link_section = ".multiboot2_header")]
#[unsafe(no_mangle)]
static MULTIBOOT2_HEADER: Multiboot2Header = Multiboot2Header {
    magic: MULTIBOOT2_MAGIC,
    architecture: MULTIBOOT2_ARCHITECTURE_I386,
    header_length: HEADER_LENGTH,
    checksum: 0u32
        .wrapping_sub(MULTIBOOT2_MAGIC)
        .wrapping_sub(MULTIBOOT2_ARCHITECTURE_I386)
        .wrapping_sub(HEADER_LENGTH),
    fb_tag_type: 5,
    fb_tag_flags: 0,
    fb_tag_size: 20,
    fb_width: 1024,
    fb_height: 768,
    fb_depth: 32,
    fb_tag_padding: 0,
    end_tag_type: 0,
    end_tag_flags: 0,
    end_tag_size: 8,
};

core::arch::global_asm!(
    r#"
.section .bss
.align 4096
boot_pml4:
    .skip 4096
boot_pdpt:
    .skip 4096
boot_pd:
    .skip 4096
.align 16
boot_stack_bottom:
    .skip 65536
boot_stack_top:

.section .rodata
.align 8
gdt64:
    .quad 0x0000000000000000
    .quad 0x00AF9A000000FFFF
    .quad 0x00CF92000000FFFF
gdt64_end:
gdt64_pointer:
    .word gdt64_end - gdt64 - 1
    .quad gdt64

.section .text
.code32
.global _start
.type _start, @function
_start:
    cli
    mov esp, offset boot_stack_top

    mov edi, ebx
    cmp eax, 0x36d76289
    jne .Lno_multiboot

    mov eax, offset boot_pdpt
    or eax, 0x3
    mov [offset boot_pml4], eax
    mov dword ptr [offset boot_pml4 + 4], 0

    mov eax, offset boot_pd
    or eax, 0x3
    mov [offset boot_pdpt], eax
    mov dword ptr [offset boot_pdpt + 4], 0

    mov ecx, 0
.Lfill_pd:
    mov eax, ecx
    shl eax, 21
    or eax, 0x83
    mov [offset boot_pd + ecx * 8], eax
    mov dword ptr [offset boot_pd + ecx * 8 + 4], 0
    inc ecx
    cmp ecx, 512
    jl .Lfill_pd

    mov eax, cr4
    or eax, 1 << 5
    mov cr4, eax

    mov eax, offset boot_pml4
    mov cr3, eax

    mov ecx, 0xC0000080
    rdmsr
    or eax, 1 << 8
    wrmsr

    mov eax, cr0
    or eax, (1 << 31) | 1
    mov cr0, eax

    lgdt [gdt64_pointer]

    mov ax, 0x10
    mov ds, ax
    mov es, ax
    mov fs, ax
    mov gs, ax
    mov ss, ax

    jmp 0x08:start64_trampoline

.Lno_multiboot:
    cli
.Lhang:
    hlt
    jmp .Lhang

.code64
start64_trampoline:
    jmp start64
"#,
);

/// First function reached in true 64-bit mode, still running on the
/// bootstrap asm's temporary GDT and page tables.
///
/// `rdi` carries the Multiboot2 info pointer the asm stub copied out of
/// `ebx` before the mode switch (the SysV64 first-argument register, so it
/// arrives here as this function's parameter for free).
///
/// # Safety
///
/// Must only ever be reached once, by the asm stub above, with interrupts
/// still disabled and no other code yet running.
#[unsafe(no_mangle)]
unsafe extern "C" fn start64(mb_info_addr: u64) -> ! {
    // SAFETY: nothing has touched SSE state yet; this must happen before any
    // interrupt could fire and run a trampoline's `movaps` save/restore.
    unsafe { enable_sse() };

    // SAFETY: replaces the asm stub's temporary GDT with the kernel's own,
    // built the same way the rest of the driver/HAL code expects (code
    // selector 0x08, matching `nucleus_core`'s `KERNEL_CODE_SELECTOR`).
    unsafe { install_gdt() };

    nucleus_kernel::kernel_main(mb_info_addr as usize)
}

/// Enables `fxsave`/`fxrstor`-class SSE instructions.
///
/// # Safety
///
/// Must run before any code executes a SIMD instruction, including the
/// interrupt trampolines' `movaps` register save/restore.
unsafe fn enable_sse() {
    let mut cr0 = Cr0::read();
    cr0.remove(Cr0Flags::EMULATE_COPROCESSOR);
    cr0.insert(Cr0Flags::MONITOR_COPROCESSOR);
    // SAFETY: only clears EM/sets MP, neither of which affects paging or
    // protected-mode state.
    unsafe { Cr0::write(cr0) };

    let mut cr4 = Cr4::read();
    cr4.insert(Cr4Flags::OSFXSR | Cr4Flags::OSXMMEXCPT);
    // SAFETY: x86-64 long mode architecturally requires SSE2 support, so
    // these bits are always available on a CPU that reached this code path.
    unsafe { Cr4::write(cr4) };
}

/// The kernel's permanent GDT, replacing the asm stub's temporary one.
/// Built the same shape (null, kernel code, kernel data) so the code
/// selector lands at 0x08, matching `nucleus_core`'s `KERNEL_CODE_SELECTOR`
/// the IDT gates are built against.
static KERNEL_GDT: LazyLock<(GlobalDescriptorTable<3>, SegmentSelector, SegmentSelector)> = LazyLock::new(|| {
    let mut gdt = GlobalDescriptorTable::new();
    let code = gdt.append(Descriptor::kernel_code_segment());
    let data = gdt.append(Descriptor::kernel_data_segment());
    (gdt, code, data)
});

/// Installs the kernel's own GDT, replacing the asm stub's temporary one.
///
/// # Safety
///
/// Must only be called once, before anything depends on the stub's GDT
/// staying loaded.
unsafe fn install_gdt() {
    let (gdt, code, data) = &*KERNEL_GDT;
    debug_assert_eq!(code.as_u16(), 0x08);
    debug_assert_eq!(data.as_u16(), 0x10);

    // SAFETY: `KERNEL_GDT` is a `static`, so `gdt` is `&'static`.
    unsafe { gdt.load() };

    // SAFETY: `code`/`data` both reference descriptors in the table just
    // loaded above.
    unsafe {
        segmentation::load_ds(*data);
        segmentation::load_ss(*data);
        segmentation::load_es(*data);
        segmentation::load_fs(*data);
        segmentation::load_gs(*data);
        segmentation::set_cs(*code);
    }

    nucleus_core::kdebug!("GDT initialised");
}
