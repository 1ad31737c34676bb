//! Interrupt Descriptor Table (IDT)
//!
//! Estrutura usada pela CPU para despachar exceções e interrupções
//! externas. 256 entradas de 16 bytes, conforme especificação AMD64.
//! Os handlers são os stubs naked de `stubs.rs`.

use core::mem::size_of;

use crate::arch::x86_64::gdt::KERNEL_CODE_SEL;

/// Endereço de um stub assembly de entrada
pub type HandlerFunc = u64;

/// Entrada da IDT (16 bytes em 64-bit)
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct IdtEntry {
    offset_low: u16,
    selector: u16,
    ist_reserved_legacy: u8, // Bits 0-2: IST, 3-7: Reservado
    type_attr: u8,           // Gate Type, DPL, Present
    offset_mid: u16,
    offset_high: u32,
    reserved: u32,
}

impl IdtEntry {
    /// Cria uma entrada vazia (não presente)
    pub const fn missing() -> Self {
        Self {
            offset_low: 0,
            selector: 0,
            ist_reserved_legacy: 0,
            type_attr: 0,
            offset_mid: 0,
            offset_high: 0,
            reserved: 0,
        }
    }

    /// Cria uma entrada presente apontando para um handler
    ///
    /// `ist`: índice na Interrupt Stack Table (1-7) do TSS. 0 para não usar.
    pub fn new(handler: HandlerFunc, ist: u8) -> Self {
        let addr = handler;
        Self {
            offset_low: (addr & 0xFFFF) as u16,
            selector: KERNEL_CODE_SEL,
            ist_reserved_legacy: ist & 0x7,
            type_attr: 0x8E, // Present, DPL 0, Interrupt Gate
            offset_mid: ((addr >> 16) & 0xFFFF) as u16,
            offset_high: (addr >> 32) as u32,
            reserved: 0,
        }
    }
}

/// A Tabela IDT propriamente dita
#[repr(C, align(16))]
pub struct Idt {
    entries: [IdtEntry; 256],
}

impl Idt {
    pub const fn new() -> Self {
        Self {
            entries: [IdtEntry::missing(); 256],
        }
    }

    /// Define o handler do vetor
    pub fn set_handler(&mut self, vector: u8, handler: HandlerFunc) {
        self.entries[vector as usize] = IdtEntry::new(handler, 0);
    }

    /// Define o handler usando uma stack IST específica
    pub fn set_handler_ist(&mut self, vector: u8, handler: HandlerFunc, ist_index: u8) {
        self.entries[vector as usize] = IdtEntry::new(handler, ist_index);
    }

    /// Carrega a IDT na CPU (lidt)
    ///
    /// # Safety
    ///
    /// A tabela deve ser 'static e permanecer válida enquanto carregada.
    pub unsafe fn load(&'static self) {
        let descriptor = IdtDescriptor {
            limit: (size_of::<Self>() - 1) as u16,
            base: (self as *const Self) as u64,
        };
        core::arch::asm!(
            "lidt [{}]",
            in(reg) &descriptor,
            options(readonly, nostack, preserves_flags),
        );
    }
}

/// Descritor para LIDT
#[repr(C, packed)]
struct IdtDescriptor {
    limit: u16,
    base: u64,
}

/// IDT global (mutável apenas durante a init)
pub static mut IDT: Idt = Idt::new();
