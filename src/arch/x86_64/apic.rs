//! Driver do Local APIC (LAPIC)
//!
//! Cada core possui seu próprio LAPIC. Funções usadas por este núcleo:
//! - Sinal de End of Interrupt (EOI)
//! - IPIs por broadcast (shootdown de TLB, panic, reschedule)
//! - Identificação do core atual
//!
//! Acesso via MMIO (janela padrão 0xFEE00000), atravessando o mapeamento
//! físico→virtual do kernel. Os registradores são `u32` voláteis.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use volatile::VolatilePtr;

use crate::arch::x86_64::cpu::X64Cpu;
use crate::mm::addr::{phys_to_virt, PhysAddr};

const IA32_APIC_BASE_MSR: u32 = 0x1B;
const LAPIC_BASE_ADDR: u64 = 0xFEE0_0000;

// Offsets MMIO
const REG_ID: u64 = 0x020;
const REG_EOI: u64 = 0x0B0;
const REG_SVR: u64 = 0x0F0; // Spurious Interrupt Vector
const REG_ESR: u64 = 0x280; // Error Status Register
const REG_ICR_LOW: u64 = 0x300; // Interrupt Command Register

// Bits e Flags
const APIC_ENABLE_BIT: u64 = 1 << 11; // MSR Enable
const SVR_SOFT_ENABLE: u32 = 1 << 8;
const ICR_LEVEL_ASSERT: u32 = 1 << 14;
const ICR_DELIVERY_PENDING: u32 = 1 << 12;
const ICR_ALL_EXCLUDING_SELF: u32 = 0b11 << 18;

/// CPUs online, informado pelo kernel hospedeiro após enumerar a ACPI
static CPU_COUNT: AtomicUsize = AtomicUsize::new(1);

/// Janela volátil sobre um registrador do LAPIC
///
/// # Safety
/// A janela MMIO do LAPIC deve estar mapeada.
unsafe fn reg(offset: u64) -> VolatilePtr<'static, u32> {
    let va = phys_to_virt(PhysAddr::new(LAPIC_BASE_ADDR)).as_u64() + offset;
    VolatilePtr::new(NonNull::new_unchecked(va as *mut u32))
}

/// Inicializa o LAPIC do core atual.
///
/// # Safety
///
/// - Ring 0, janela MMIO mapeada.
/// - Não chamar concorrentemente no mesmo core.
pub unsafe fn init(spurious_vector: u8) {
    // 1. Habilitar LAPIC globalmente via MSR
    let msr_info = X64Cpu::rdmsr(IA32_APIC_BASE_MSR);
    if (msr_info & APIC_ENABLE_BIT) == 0 {
        X64Cpu::wrmsr(IA32_APIC_BASE_MSR, msr_info | APIC_ENABLE_BIT);
    }

    // 2. Spurious vector + software enable (bit 8)
    reg(REG_SVR).write(SVR_SOFT_ENABLE | spurious_vector as u32);

    // 3. Limpar Error Status (hardware antigo exige escrita dupla)
    reg(REG_ESR).write(0);
    reg(REG_ESR).write(0);

    // 4. EOI para limpar estado pendente anterior
    reg(REG_EOI).write(0);
}

/// Registra a topologia descoberta pelo kernel hospedeiro.
pub fn set_cpu_count(n: usize) {
    CPU_COUNT.store(n.max(1), Ordering::SeqCst);
}

pub fn cpu_count() -> usize {
    CPU_COUNT.load(Ordering::SeqCst)
}

/// ID do LAPIC atual (bits 24-31 do registrador ID).
#[inline]
pub fn id() -> u32 {
    // SAFETY: leitura de registrador sempre mapeado após init
    unsafe { reg(REG_ID).read() >> 24 }
}

/// Sinaliza End of Interrupt.
///
/// # Safety
/// LAPIC inicializado.
#[inline]
pub unsafe fn eoi() {
    reg(REG_EOI).write(0);
}

/// Envia `vector` para todas as outras CPUs (shorthand all-excluding-self).
///
/// O shorthand não expõe falha de entrega por CPU; se o comando foi
/// aceito, reportamos todas as `cpu_count() - 1` entregas.
///
/// # Safety
/// LAPIC inicializado; o vetor deve ter handler instalado na IDT.
pub unsafe fn broadcast(vector: u8) -> usize {
    let icr = reg(REG_ICR_LOW);

    // Esperar comando anterior drenar
    while icr.read() & ICR_DELIVERY_PENDING != 0 {
        core::hint::spin_loop();
    }

    icr.write(ICR_ALL_EXCLUDING_SELF | ICR_LEVEL_ASSERT | vector as u32);

    // Esperar aceitação deste comando
    while icr.read() & ICR_DELIVERY_PENDING != 0 {
        core::hint::spin_loop();
    }

    cpu_count().saturating_sub(1)
}
