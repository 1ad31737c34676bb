//! Estado Global do Kernel
//!
//! Todo estado mutável de processo inteiro vive em UM struct explícito,
//! `KERNEL`, em vez de estáticos soltos espalhados pelos módulos. Cada
//! campo carrega sua própria disciplina de sincronização (atômico,
//! spinlock) e os colaboradores externos (alocador físico, resolver de
//! regiões, scheduler) são instalados em slots durante o boot.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::arch::traits::IpiOps;
use crate::core::percpu::LocalCpu;
use crate::interrupts::handlers::{IrqTable, MsiTable};
use crate::mm::config::MAX_CPUS;
use crate::mm::phys::FrameSource;
use crate::mm::region::RegionResolver;
use crate::mm::tlb::TlbShootdown;
use crate::mm::vas::AddressSpace;
use crate::sched::Scheduler;
use crate::sync::Spinlock;

pub struct KernelState {
    /// Coordenador de TLB shootdown (um pedido em voo por vez)
    pub tlb: TlbShootdown,
    /// Handlers de IRQ legada (linhas 0-15)
    pub irqs: IrqTable,
    /// Handlers de MSI (slots de vetor dedicados)
    pub msis: MsiTable,
    /// Algum core entrou em pânico
    pub panicking: AtomicBool,
    /// Cores que confirmaram o IPI de pânico e pararam
    pub panic_acks: AtomicUsize,
    /// Flags por CPU
    pub local: [LocalCpu; MAX_CPUS],

    // Colaboradores externos, instalados no boot
    frames: Spinlock<Option<&'static dyn FrameSource>>,
    resolver: Spinlock<Option<&'static dyn RegionResolver>>,
    scheduler: Spinlock<Option<&'static dyn Scheduler>>,
    kernel_space: Spinlock<Option<Arc<AddressSpace>>>,
    core_space: Spinlock<Option<Arc<AddressSpace>>>,
}

pub static KERNEL: KernelState = KernelState::new();

impl KernelState {
    pub const fn new() -> Self {
        const LOCAL_INIT: LocalCpu = LocalCpu::new();
        Self {
            tlb: TlbShootdown::new(),
            irqs: IrqTable::new(),
            msis: MsiTable::new(),
            panicking: AtomicBool::new(false),
            panic_acks: AtomicUsize::new(0),
            local: [LOCAL_INIT; MAX_CPUS],
            frames: Spinlock::new(None),
            resolver: Spinlock::new(None),
            scheduler: Spinlock::new(None),
            kernel_space: Spinlock::new(None),
            core_space: Spinlock::new(None),
        }
    }

    /// Flags da CPU atual
    pub fn this_cpu(&self) -> &LocalCpu {
        let id = crate::arch::Cpu::current_cpu();
        &self.local[id % MAX_CPUS]
    }

    pub fn is_panicking(&self) -> bool {
        self.panicking.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Slots de colaboradores
    // -------------------------------------------------------------------------

    pub fn install_frame_source(&self, source: &'static dyn FrameSource) {
        *self.frames.lock() = Some(source);
    }

    pub fn frame_source(&self) -> Option<&'static dyn FrameSource> {
        *self.frames.lock()
    }

    pub fn install_region_resolver(&self, resolver: &'static dyn RegionResolver) {
        *self.resolver.lock() = Some(resolver);
    }

    pub fn region_resolver(&self) -> Option<&'static dyn RegionResolver> {
        *self.resolver.lock()
    }

    pub fn install_scheduler(&self, scheduler: &'static dyn Scheduler) {
        *self.scheduler.lock() = Some(scheduler);
    }

    pub fn scheduler(&self) -> Option<&'static dyn Scheduler> {
        *self.scheduler.lock()
    }

    pub fn install_kernel_space(&self, space: Arc<AddressSpace>) {
        *self.kernel_space.lock() = Some(space);
    }

    pub fn kernel_space(&self) -> Option<Arc<AddressSpace>> {
        self.kernel_space.lock().clone()
    }

    pub fn install_core_space(&self, space: Arc<AddressSpace>) {
        *self.core_space.lock() = Some(space);
    }

    pub fn core_space(&self) -> Option<Arc<AddressSpace>> {
        self.core_space.lock().clone()
    }

    /// Volta o estado global ao ponto de boot (apenas testes).
    #[cfg(test)]
    pub(crate) fn reset_for_test(&self) {
        self.panicking.store(false, Ordering::SeqCst);
        self.panic_acks.store(0, Ordering::SeqCst);
        for cpu in self.local.iter() {
            cpu.reset();
        }
        self.tlb.reset_for_test();
        self.irqs.clear_all();
        self.msis.clear_all();
        *self.frames.lock() = None;
        *self.resolver.lock() = None;
        *self.scheduler.lock() = None;
        *self.kernel_space.lock() = None;
        *self.core_space.lock() = None;
    }
}
