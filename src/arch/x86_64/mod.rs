//! Backend x86_64 da HAL
//!
//! Inline asm para controle de CPU/MMU, driver do Local APIC, gerência
//! da IDT e stubs naked de entrada de interrupção.

pub mod apic;
pub mod cpu;
pub mod gdt;
pub mod idt;
pub mod stubs;
