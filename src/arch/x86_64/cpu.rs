//! Implementação x86_64 das operações de CPU (HAL).
//!
//! Usa Assembly inline para acesso direto ao hardware, controle de
//! interrupções e registradores de paginação.
//!
//! # Segurança
//! Esta implementação assume modo longo (64-bit) e Ring 0.

use core::arch::asm;

use crate::arch::traits::{CpuOps, IpiOps, MmuOps};
use crate::arch::x86_64::apic;
use crate::mm::addr::{PhysAddr, VirtAddr};

/// CR3 guarda a raiz alinhada a 4K; bits baixos são flags de cache
const CR3_ADDR_MASK: u64 = 0x000F_FFFF_FFFF_F000;

pub struct X64Cpu;

impl X64Cpu {
    /// Lê um Model Specific Register (MSR).
    ///
    /// # Safety
    /// Ler um MSR reservado ou inválido causa #GP.
    #[inline]
    pub unsafe fn rdmsr(msr: u32) -> u64 {
        let (high, low): (u32, u32);
        asm!(
            "rdmsr",
            in("ecx") msr,
            out("eax") low,
            out("edx") high,
            options(nomem, nostack, preserves_flags),
        );
        ((high as u64) << 32) | (low as u64)
    }

    /// Escreve um Model Specific Register (MSR).
    ///
    /// # Safety
    /// MSR errado pode desconfigurar a CPU.
    #[inline]
    pub unsafe fn wrmsr(msr: u32, value: u64) {
        let low = value as u32;
        let high = (value >> 32) as u32;
        asm!(
            "wrmsr",
            in("ecx") msr,
            in("eax") low,
            in("edx") high,
            options(nomem, nostack, preserves_flags),
        );
    }
}

impl CpuOps for X64Cpu {
    /// Para a execução da CPU até a próxima interrupção (HLT).
    #[inline]
    fn halt() {
        unsafe {
            asm!("hlt", options(nomem, nostack, preserves_flags));
        }
    }

    #[inline]
    fn disable_interrupts() {
        unsafe {
            asm!("cli", options(nomem, nostack, preserves_flags));
        }
    }

    #[inline]
    fn enable_interrupts() {
        unsafe {
            asm!("sti", options(nomem, nostack, preserves_flags));
        }
    }

    /// Verifica RFLAGS.IF (bit 9).
    #[inline]
    fn interrupts_enabled() -> bool {
        let rflags: u64;
        unsafe {
            asm!("pushfq; pop {}", out(reg) rflags, options(nomem, preserves_flags));
        }
        (rflags & (1 << 9)) != 0
    }
}

impl MmuOps for X64Cpu {
    #[inline]
    fn read_root() -> PhysAddr {
        let cr3: u64;
        unsafe {
            asm!("mov {}, cr3", out(reg) cr3, options(nomem, nostack, preserves_flags));
        }
        PhysAddr::new(cr3 & CR3_ADDR_MASK)
    }

    #[inline]
    unsafe fn write_root(root: PhysAddr) {
        asm!("mov cr3, {}", in(reg) root.as_u64(), options(nostack, preserves_flags));
    }

    /// CR2 guarda o endereço que causou o último page fault.
    #[inline]
    fn read_fault_address() -> VirtAddr {
        let cr2: u64;
        unsafe {
            asm!("mov {}, cr2", out(reg) cr2, options(nomem, nostack, preserves_flags));
        }
        VirtAddr::new(cr2)
    }

    #[inline]
    fn invalidate_page(addr: VirtAddr) {
        unsafe {
            asm!("invlpg [{}]", in(reg) addr.as_u64(), options(nostack, preserves_flags));
        }
    }

    /// Reload de CR3 descarta todas as entradas não-globais da TLB.
    #[inline]
    fn flush_tlb() {
        unsafe {
            asm!(
                "mov {tmp}, cr3",
                "mov cr3, {tmp}",
                tmp = out(reg) _,
                options(nostack, preserves_flags),
            );
        }
    }
}

impl IpiOps for X64Cpu {
    fn cpu_count() -> usize {
        apic::cpu_count()
    }

    fn current_cpu() -> usize {
        apic::id() as usize
    }

    fn broadcast(vector: u8) -> usize {
        // SAFETY: LAPIC inicializado durante o boot pelo kernel hospedeiro
        unsafe { apic::broadcast(vector) }
    }

    fn end_of_interrupt() {
        // SAFETY: escrita no registrador EOI é sempre aceita pelo LAPIC
        unsafe { apic::eoi() }
    }
}
