//! Infraestrutura Compartilhada dos Testes
//!
//! O estado global (`KERNEL`) e o backend simulado de CPU são estáticos
//! de processo: testes que os tocam precisam rodar serializados. O guard
//! de `session()` faz a serialização e devolve os dois ao estado de
//! boot antes de cada teste.

use std::boxed::Box;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use alloc::sync::Arc;

use crate::arch::sim;
use crate::core::state::KERNEL;
use crate::interrupts::context::InterruptContext;
use crate::mm::addr::{PhysAddr, VirtAddr};
use crate::mm::config::PAGE_SIZE;
use crate::mm::fault::AccessType;
use crate::mm::phys::FrameSource;
use crate::mm::region::RegionResolver;
use crate::mm::vas::{AddressSpace, SpaceKind};
use crate::sched::Scheduler;

static SESSION: Mutex<()> = Mutex::new(());

/// Serializa o teste e reseta `KERNEL` + simulação. Segurar o guard até
/// o fim do teste.
pub fn session() -> MutexGuard<'static, ()> {
    // Um teste anterior pode ter abortado por panic esperado
    let guard = SESSION
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    KERNEL.reset_for_test();
    sim::reset();
    crate::mm::addr::set_direct_map_offset(0);
    guard
}

// =============================================================================
// ALOCADOR FÍSICO DE TESTE
// =============================================================================

/// Frame real do heap do processo, alinhado a página. Com o offset da
/// janela direta em zero, o "endereço físico" é o próprio ponteiro.
#[repr(C, align(4096))]
struct Frame {
    _bytes: [u8; PAGE_SIZE],
}

/// `FrameSource` de teste: frames vêm zerados, e todos os contadores do
/// protocolo de reserva ficam observáveis.
pub struct TestFrames {
    /// Limite de chunks reserváveis (injeção de falha de reserva)
    capacity: AtomicUsize,
    reserved: AtomicUsize,
    reserve_calls: AtomicUsize,
    unreserve_calls: AtomicUsize,
    allocated: AtomicUsize,
    released: AtomicUsize,
    fail_allocations: AtomicBool,
}

impl TestFrames {
    pub fn new() -> Self {
        Self {
            capacity: AtomicUsize::new(usize::MAX),
            reserved: AtomicUsize::new(0),
            reserve_calls: AtomicUsize::new(0),
            unreserve_calls: AtomicUsize::new(0),
            allocated: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            fail_allocations: AtomicBool::new(false),
        }
    }

    /// Vaza uma instância e instala como alocador físico do kernel.
    pub fn install() -> &'static TestFrames {
        let frames = Box::leak(Box::new(TestFrames::new()));
        KERNEL.install_frame_source(frames);
        frames
    }

    pub fn set_capacity(&self, chunks: usize) {
        self.capacity.store(chunks, Ordering::SeqCst);
    }

    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.store(fail, Ordering::SeqCst);
    }

    pub fn reserve_calls(&self) -> usize {
        self.reserve_calls.load(Ordering::SeqCst)
    }

    pub fn reserved(&self) -> usize {
        self.reserved.load(Ordering::SeqCst)
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl FrameSource for TestFrames {
    fn reserve(&self, count: usize) -> bool {
        self.reserve_calls.fetch_add(1, Ordering::SeqCst);
        if self.reserved.load(Ordering::SeqCst) + count > self.capacity.load(Ordering::SeqCst) {
            return false;
        }
        self.reserved.fetch_add(count, Ordering::SeqCst);
        true
    }

    fn unreserve(&self, count: usize) {
        self.unreserve_calls.fetch_add(1, Ordering::SeqCst);
        self.reserved.fetch_sub(count, Ordering::SeqCst);
    }

    fn allocate_frame(&self) -> Option<PhysAddr> {
        if self.fail_allocations.load(Ordering::SeqCst) {
            return None;
        }
        let frame = Box::leak(Box::new(Frame {
            _bytes: [0; PAGE_SIZE],
        }));
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Some(PhysAddr::new(frame as *mut Frame as u64))
    }

    fn release_frame(&self, _frame: PhysAddr) {
        // Frames são vazados de propósito; só o balanço interessa
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Instala um espaço do kernel novo sobre uma raiz zerada e o devolve.
pub fn boot_kernel_space(frames: &'static TestFrames) -> Arc<AddressSpace> {
    let root = frames.allocate_frame().expect("frame para a raiz do kernel");
    let space = Arc::new(AddressSpace::kernel(root));
    KERNEL.install_kernel_space(space.clone());
    space
}

// =============================================================================
// COLABORADORES MOCK
// =============================================================================

pub struct MockScheduler {
    started: AtomicBool,
    yields: AtomicUsize,
    user_faults: AtomicUsize,
    user_space: Mutex<Option<Arc<AddressSpace>>>,
    /// Frame (layout uniforme) que o próximo yield instala no lugar do
    /// interrompido, simulando um context switch real
    switch_to: Mutex<Option<InterruptContext>>,
    /// `sim::eoi_count()` observado dentro do último yield
    eoi_seen_at_yield: AtomicUsize,
}

impl MockScheduler {
    pub fn install() -> &'static MockScheduler {
        let sched = Box::leak(Box::new(MockScheduler {
            started: AtomicBool::new(false),
            yields: AtomicUsize::new(0),
            user_faults: AtomicUsize::new(0),
            user_space: Mutex::new(None),
            switch_to: Mutex::new(None),
            eoi_seen_at_yield: AtomicUsize::new(0),
        }));
        KERNEL.install_scheduler(sched);
        sched
    }

    pub fn set_switch_to(&self, ctx: InterruptContext) {
        *self.switch_to.lock().unwrap() = Some(ctx);
    }

    pub fn eoi_seen_at_yield(&self) -> usize {
        self.eoi_seen_at_yield.load(Ordering::SeqCst)
    }

    pub fn set_started(&self, started: bool) {
        self.started.store(started, Ordering::SeqCst);
    }

    pub fn set_current_user_space(&self, space: Option<Arc<AddressSpace>>) {
        *self.user_space.lock().unwrap() = space;
    }

    pub fn yields(&self) -> usize {
        self.yields.load(Ordering::SeqCst)
    }

    pub fn user_faults(&self) -> usize {
        self.user_faults.load(Ordering::SeqCst)
    }
}

impl Scheduler for MockScheduler {
    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn yield_from_interrupt(&self, ctx: &mut InterruptContext) {
        self.yields.fetch_add(1, Ordering::SeqCst);
        self.eoi_seen_at_yield
            .store(sim::eoi_count(), Ordering::SeqCst);
        if let Some(next) = self.switch_to.lock().unwrap().take() {
            *ctx = next;
        }
    }

    fn current_user_space(&self) -> Option<Arc<AddressSpace>> {
        self.user_space.lock().unwrap().clone()
    }

    fn deliver_user_fault(&self, _ctx: &InterruptContext) {
        self.user_faults.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockResolver {
    outcome: AtomicBool,
    calls: AtomicUsize,
    last_address: AtomicU64,
    last_kind: Mutex<Option<SpaceKind>>,
}

impl MockResolver {
    pub fn install() -> &'static MockResolver {
        let resolver = Box::leak(Box::new(MockResolver {
            outcome: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            last_address: AtomicU64::new(0),
            last_kind: Mutex::new(None),
        }));
        KERNEL.install_region_resolver(resolver);
        resolver
    }

    pub fn set_outcome(&self, resolved: bool) {
        self.outcome.store(resolved, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_address(&self) -> u64 {
        self.last_address.load(Ordering::SeqCst)
    }

    pub fn last_kind(&self) -> Option<SpaceKind> {
        *self.last_kind.lock().unwrap()
    }
}

impl RegionResolver for MockResolver {
    fn handle_fault(&self, space: &Arc<AddressSpace>, address: VirtAddr, _access: AccessType) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_address.store(address.as_u64(), Ordering::SeqCst);
        *self.last_kind.lock().unwrap() = Some(space.kind);
        self.outcome.load(Ordering::SeqCst)
    }
}
