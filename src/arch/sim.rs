//! Backend Simulado de CPU
//!
//! Implementa os traits da HAL sobre contadores atômicos, para builds de
//! host e para os testes de unidade. A topologia (número de CPUs, falhas
//! de entrega de IPI) é configurável; broadcasts do vetor de TLB shootdown
//! invocam o handler remoto inline, simulando o ack das outras CPUs.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::arch::traits::{CpuOps, IpiOps, MmuOps};
use crate::interrupts::vectors;
use crate::mm::addr::{PhysAddr, VirtAddr};

static INT_ENABLED: AtomicBool = AtomicBool::new(false);

static SIM_ROOT: AtomicU64 = AtomicU64::new(0);
static FAULT_ADDR: AtomicU64 = AtomicU64::new(0);

static INVLPG_COUNT: AtomicUsize = AtomicUsize::new(0);
static FLUSH_COUNT: AtomicUsize = AtomicUsize::new(0);
static EOI_COUNT: AtomicUsize = AtomicUsize::new(0);
static HALT_COUNT: AtomicUsize = AtomicUsize::new(0);

static CPU_COUNT: AtomicUsize = AtomicUsize::new(1);
static IPI_FAILURES: AtomicUsize = AtomicUsize::new(0);
static REMOTE_ACKS: AtomicUsize = AtomicUsize::new(0);
static BROADCAST_COUNT: AtomicUsize = AtomicUsize::new(0);
static LAST_BROADCAST: AtomicUsize = AtomicUsize::new(usize::MAX);

pub struct SimCpu;

impl CpuOps for SimCpu {
    fn halt() {
        HALT_COUNT.fetch_add(1, Ordering::Relaxed);
    }

    fn disable_interrupts() {
        INT_ENABLED.store(false, Ordering::SeqCst);
    }

    fn enable_interrupts() {
        INT_ENABLED.store(true, Ordering::SeqCst);
    }

    fn interrupts_enabled() -> bool {
        INT_ENABLED.load(Ordering::SeqCst)
    }

    // O backend real entra em loop de HLT; aqui o panic torna caminhos
    // fatais observáveis com #[should_panic].
    fn hang() -> ! {
        panic!("cpu parked");
    }
}

impl MmuOps for SimCpu {
    fn read_root() -> PhysAddr {
        PhysAddr::new(SIM_ROOT.load(Ordering::SeqCst))
    }

    unsafe fn write_root(root: PhysAddr) {
        SIM_ROOT.store(root.as_u64(), Ordering::SeqCst);
    }

    fn read_fault_address() -> VirtAddr {
        VirtAddr::new(FAULT_ADDR.load(Ordering::SeqCst))
    }

    fn invalidate_page(_addr: VirtAddr) {
        INVLPG_COUNT.fetch_add(1, Ordering::SeqCst);
    }

    fn flush_tlb() {
        FLUSH_COUNT.fetch_add(1, Ordering::SeqCst);
    }
}

impl IpiOps for SimCpu {
    fn cpu_count() -> usize {
        CPU_COUNT.load(Ordering::SeqCst)
    }

    fn current_cpu() -> usize {
        0
    }

    fn broadcast(vector: u8) -> usize {
        BROADCAST_COUNT.fetch_add(1, Ordering::SeqCst);
        LAST_BROADCAST.store(vector as usize, Ordering::SeqCst);

        let targets = Self::cpu_count().saturating_sub(1);
        let failed = IPI_FAILURES.load(Ordering::SeqCst).min(targets);
        let delivered = targets - failed;

        if vector == vectors::TLB_SHOOTDOWN_VECTOR {
            // CPUs remotas atendem o IPI imediatamente
            for _ in 0..delivered {
                crate::core::state::KERNEL.tlb.shootdown_ipi();
                REMOTE_ACKS.fetch_add(1, Ordering::SeqCst);
            }
        }

        delivered
    }

    fn end_of_interrupt() {
        EOI_COUNT.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// CONTROLE DA SIMULAÇÃO
// =============================================================================

/// Zera contadores e volta à topologia padrão (1 CPU, sem falhas)
pub fn reset() {
    INT_ENABLED.store(false, Ordering::SeqCst);
    SIM_ROOT.store(0, Ordering::SeqCst);
    FAULT_ADDR.store(0, Ordering::SeqCst);
    INVLPG_COUNT.store(0, Ordering::SeqCst);
    FLUSH_COUNT.store(0, Ordering::SeqCst);
    EOI_COUNT.store(0, Ordering::SeqCst);
    HALT_COUNT.store(0, Ordering::SeqCst);
    CPU_COUNT.store(1, Ordering::SeqCst);
    IPI_FAILURES.store(0, Ordering::SeqCst);
    REMOTE_ACKS.store(0, Ordering::SeqCst);
    BROADCAST_COUNT.store(0, Ordering::SeqCst);
    LAST_BROADCAST.store(usize::MAX, Ordering::SeqCst);
}

/// Zera apenas os contadores de invalidação/IPI, mantendo a topologia
pub fn reset_counters() {
    INVLPG_COUNT.store(0, Ordering::SeqCst);
    FLUSH_COUNT.store(0, Ordering::SeqCst);
    EOI_COUNT.store(0, Ordering::SeqCst);
    REMOTE_ACKS.store(0, Ordering::SeqCst);
    BROADCAST_COUNT.store(0, Ordering::SeqCst);
    LAST_BROADCAST.store(usize::MAX, Ordering::SeqCst);
}

pub fn set_cpu_count(n: usize) {
    CPU_COUNT.store(n, Ordering::SeqCst);
}

/// Quantas CPUs remotas NÃO receberão o próximo broadcast
pub fn set_ipi_failures(n: usize) {
    IPI_FAILURES.store(n, Ordering::SeqCst);
}

pub fn set_interrupts(enabled: bool) {
    INT_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn set_fault_address(addr: u64) {
    FAULT_ADDR.store(addr, Ordering::SeqCst);
}

pub fn invlpg_count() -> usize {
    INVLPG_COUNT.load(Ordering::SeqCst)
}

pub fn flush_count() -> usize {
    FLUSH_COUNT.load(Ordering::SeqCst)
}

pub fn eoi_count() -> usize {
    EOI_COUNT.load(Ordering::SeqCst)
}

pub fn remote_acks() -> usize {
    REMOTE_ACKS.load(Ordering::SeqCst)
}

pub fn broadcast_count() -> usize {
    BROADCAST_COUNT.load(Ordering::SeqCst)
}

/// Último vetor enviado por broadcast (`None` se nenhum)
pub fn last_broadcast() -> Option<u8> {
    match LAST_BROADCAST.load(Ordering::SeqCst) {
        usize::MAX => None,
        v => Some(v as u8),
    }
}
