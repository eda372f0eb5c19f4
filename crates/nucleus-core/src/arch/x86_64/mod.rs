//! x86_64 architecture support.

pub mod instructions;
pub mod registers;
pub mod structures;

pub use instructions::port::Port;
pub use structures::gdt::{Descriptor, GlobalDescriptorTable, SegmentSelector};
pub use structures::idt::{Idt, Registers};
