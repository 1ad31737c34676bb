//! Dispatch de Interrupções
//!
//! Máquina de estados sobre o número do vetor, chamada pelos stubs a
//! cada trap. Responsabilidades, nesta ordem:
//!
//! 1. Curto-circuito se outro core está em pânico (só o vetor de ack
//!    faz alguma coisa: estacionar esta CPU).
//! 2. Normalização do frame ring 0 (ver `context.rs`).
//! 3. Roteamento por classe: exceção → fault handler / fatal; IPIs de
//!    TLB e timer; IRQ legada e MSI → tabelas de drivers; espúrios
//!    ignorados.
//! 4. EOI pela regra do limiar, yield pendente (o scheduler pode trocar
//!    o frame e pode não voltar — por isso o EOI vem antes),
//!    desnormalização pelo ring do frame de SAÍDA, checagem de sanidade
//!    (fatal se corrompido).

pub mod context;
pub mod handlers;
pub mod vectors;

use core::sync::atomic::Ordering;

use crate::arch::traits::{CpuOps, IpiOps, MmuOps};
use crate::core::panic::fatal_with_context;
use crate::core::state::KERNEL;
use crate::interrupts::context::InterruptContext;
use crate::interrupts::vectors::{
    classify, VectorClass, EOI_THRESHOLD, PAGE_FAULT_VECTOR,
};
use crate::mm::fault::PageFaultInfo;

/// Ponto de entrada chamado pelos stubs naked, com o ponteiro do frame
/// recém salvo na pilha de trap.
pub extern "C" fn trampoline(ctx: &mut InterruptContext) {
    dispatch(ctx);
}

/// Inicializa IDT e LAPIC do core atual.
///
/// # Safety
///
/// Uma vez por core, no boot, antes de habilitar interrupções.
#[cfg(target_arch = "x86_64")]
pub unsafe fn init() {
    crate::arch::x86_64::stubs::init_idt();
    crate::arch::x86_64::apic::init(vectors::APIC_SPURIOUS_VECTOR);
    crate::kok!("(INT) IDT e LAPIC prontos");
}

pub fn dispatch(ctx: &mut InterruptContext) {
    let vector = ctx.vector as u8;

    // Outro core em pânico: não competir com ele
    if KERNEL.is_panicking() {
        if vector == vectors::PANIC_VECTOR {
            park_for_panic();
        }
        return;
    }

    if ctx.from_ring0() {
        ctx.swap_ring0_tail();
    }

    match classify(vector) {
        VectorClass::Exception => handle_exception(ctx),
        VectorClass::PicSpurious | VectorClass::ApicSpurious => {}
        VectorClass::TlbShootdown => KERNEL.tlb.shootdown_ipi(),
        VectorClass::Timer => timer_tick(),
        VectorClass::Panic => park_for_panic(),
        VectorClass::Irq(line) => handle_irq(line),
        VectorClass::Msi(slot) => handle_msi(slot),
        VectorClass::Unknown => {
            crate::kwarn!("(INT) vetor sem dono: ", vector as u64);
        }
    }

    // EOI antes de qualquer yield: o scheduler pode não voltar para cá,
    // e o LAPIC não pode ficar com a classe de prioridade travada
    if vector >= EOI_THRESHOLD {
        crate::arch::Cpu::end_of_interrupt();
    }

    // Yield pedido pelo timer ou por handler de dispositivo. O scheduler
    // pode substituir `ctx` pelo frame de outra thread (layout uniforme),
    // inclusive de outro ring.
    if KERNEL.this_cpu().take_switch_pending() {
        if let Some(sched) = KERNEL.scheduler() {
            if sched.started() {
                sched.yield_from_interrupt(ctx);
            }
        }
    }

    // Devolve o frame ao layout que o stub vai restaurar, pelo ring do
    // frame de saída (o yield pode ter trocado o frame)
    if ctx.from_ring0() {
        ctx.swap_ring0_tail();
    }

    if !ctx.sanity_check() {
        fatal_with_context("(INT) frame corrompido na saída do trap", Some(ctx));
    }
}

/// Exceções da CPU (vetores 0x00-0x1F)
fn handle_exception(ctx: &mut InterruptContext) {
    let vector = ctx.vector as u8;
    let supervisor = ctx.from_ring0();

    // O resolver de faults pode precisar bloquear para alocar
    crate::arch::Cpu::enable_interrupts();

    if vector == PAGE_FAULT_VECTOR && ctx.error_code & 0x1 == 0 {
        let address = crate::arch::Cpu::read_fault_address();
        let info = PageFaultInfo::from_error_code(address, ctx.error_code);
        if crate::mm::fault::handle_page_fault(&info) {
            return;
        }
    }

    if supervisor {
        fatal_with_context("(INT) exceção de supervisor irresolvível", Some(ctx));
    }

    match KERNEL.scheduler() {
        Some(sched) => sched.deliver_user_fault(ctx),
        None => fatal_with_context("(INT) exceção de usuário sem scheduler", Some(ctx)),
    }
}

/// Timer: marca a troca pendente, só depois que o scheduler local
/// liberou. O yield em si acontece na cauda do dispatch, depois do EOI.
fn timer_tick() {
    if KERNEL.this_cpu().scheduler_ready() {
        KERNEL.this_cpu().set_switch_pending();
    }
}

/// Vetor de pânico: confirma e estaciona esta CPU para sempre
fn park_for_panic() {
    KERNEL.panic_acks.fetch_add(1, Ordering::SeqCst);
    crate::arch::Cpu::hang();
}

/// IRQ legada: varre a tabela, lock solto em volta de cada handler.
/// Linhas 9-11 são compartilháveis por PCI: handlers registrados com
/// linha -1 são sondados nelas.
fn handle_irq(line: u8) {
    let cpu = KERNEL.this_cpu();
    cpu.set_in_irq(true);

    let mut handled = false;
    for index in 0..handlers::MAX_IRQ_HANDLERS {
        // Cópia sob lock; invocação sem lock
        let slot = match KERNEL.irqs.slot(index) {
            Some(slot) => slot,
            None => continue,
        };

        let exact = slot.line == line as i16;
        let shared = (9..=11).contains(&line) && slot.line == -1;
        if exact || shared {
            if (slot.handler)(slot.context) {
                handled = true;
            }
        }
    }

    cpu.set_in_irq(false);

    if !handled {
        crate::kwarn!("(IRQ) linha sem handler: ", line as u64);
    }
}

/// MSI: lookup do slot, lock solto antes da invocação
fn handle_msi(slot_index: u8) {
    match KERNEL.msis.slot(slot_index as usize) {
        Some(slot) => {
            (slot.handler)(slot.context);
        }
        None => {
            crate::kwarn!("(MSI) slot sem handler: ", slot_index as u64);
        }
    }
}

// =============================================================================
// TESTES
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::sim;
    use crate::interrupts::context::{KERNEL_CS, KERNEL_SS, USER_CS, USER_SS};
    use crate::test_support::{self, MockScheduler};
    use core::sync::atomic::AtomicUsize;

    fn ring0_ctx(vector: u8, error_code: u64) -> InterruptContext {
        InterruptContext {
            rax: 1,
            rbx: 2,
            rcx: 3,
            rdx: 4,
            rsi: 5,
            rdi: 6,
            r8: 7,
            r9: 8,
            r10: 9,
            r11: 10,
            r12: 11,
            r13: 12,
            r14: 13,
            r15: 14,
            rbp: 15,
            vector: vector as u64,
            error_code,
            rip: 0xFFFF_9010_0000_4000,
            cs: KERNEL_CS,
            rflags: 0x202,
            rsp: 0xFFFF_9010_0040_0000,
            ss: KERNEL_SS,
        }
    }

    fn ring3_ctx(vector: u8, error_code: u64) -> InterruptContext {
        let mut ctx = ring0_ctx(vector, error_code);
        ctx.cs = USER_CS;
        ctx.ss = USER_SS;
        ctx.rip = 0x40_1000;
        ctx.rsp = 0x7FFF_F000;
        ctx
    }

    #[test]
    fn ring0_frame_survives_dispatch_unchanged() {
        let _session = test_support::session();

        let original = ring0_ctx(0x25, 0); // espúrio do PIC: no-op
        let mut ctx = original;
        dispatch(&mut ctx);
        assert_eq!(ctx, original);
        assert_eq!(sim::eoi_count(), 0); // abaixo do limiar
    }

    #[test]
    fn apic_spurious_still_gets_eoi() {
        let _session = test_support::session();

        let mut ctx = ring0_ctx(0xFF, 0);
        dispatch(&mut ctx);
        assert_eq!(sim::eoi_count(), 1);
    }

    #[test]
    fn unknown_vector_above_threshold_gets_eoi() {
        let _session = test_support::session();

        let mut ctx = ring0_ctx(0x40, 0);
        dispatch(&mut ctx);
        assert_eq!(sim::eoi_count(), 1);
    }

    #[test]
    fn timer_does_not_yield_before_ready() {
        let _session = test_support::session();
        let sched = MockScheduler::install();
        sched.set_started(true);

        let mut ctx = ring0_ctx(vectors::TIMER_VECTOR, 0);
        dispatch(&mut ctx);
        assert_eq!(sched.yields(), 0);

        crate::core::state::KERNEL.this_cpu().set_scheduler_ready(true);
        dispatch(&mut ctx);
        assert_eq!(sched.yields(), 1);
    }

    #[test]
    fn timer_requires_started_scheduler() {
        let _session = test_support::session();
        let sched = MockScheduler::install();
        crate::core::state::KERNEL.this_cpu().set_scheduler_ready(true);

        let mut ctx = ring0_ctx(vectors::TIMER_VECTOR, 0);
        dispatch(&mut ctx);
        assert_eq!(sched.yields(), 0);
    }

    #[test]
    fn yield_switching_to_a_user_frame_returns_it_intact() {
        let _session = test_support::session();
        let sched = MockScheduler::install();
        sched.set_started(true);
        KERNEL.this_cpu().set_scheduler_ready(true);

        // Thread de kernel preemptada; o scheduler troca para uma thread
        // de usuário pronta para o iretq
        let user = ring3_ctx(0, 0);
        sched.set_switch_to(user);

        let mut ctx = ring0_ctx(vectors::TIMER_VECTOR, 0);
        dispatch(&mut ctx);

        assert_eq!(sched.yields(), 1);
        // O frame de saída é o do scheduler, sem swap de cauda ring 0
        assert_eq!(ctx, user);
        assert_eq!(sim::eoi_count(), 1);
    }

    fn switch_requesting_handler(_context: usize) -> bool {
        KERNEL.this_cpu().set_switch_pending();
        true
    }

    #[test]
    fn eoi_precedes_a_handler_requested_yield() {
        let _session = test_support::session();
        let sched = MockScheduler::install();
        sched.set_started(true);

        let reg = KERNEL.msis.register(switch_requesting_handler, 0).unwrap();
        let mut ctx = ring0_ctx(reg.vector, 0);
        dispatch(&mut ctx);

        // O yield pode não voltar: o LAPIC já tinha recebido o EOI
        assert_eq!(sched.yields(), 1);
        assert_eq!(sched.eoi_seen_at_yield(), 1);
    }

    static IRQ_HITS: AtomicUsize = AtomicUsize::new(0);
    static SHARED_HITS: AtomicUsize = AtomicUsize::new(0);
    static MSI_HITS: AtomicUsize = AtomicUsize::new(0);

    fn counting_irq_handler(_context: usize) -> bool {
        IRQ_HITS.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn shared_line_handler(context: usize) -> bool {
        SHARED_HITS.fetch_add(1, Ordering::SeqCst);
        // O "dispositivo" só assevera quando o contexto manda
        context == 1
    }

    fn counting_msi_handler(_context: usize) -> bool {
        MSI_HITS.fetch_add(1, Ordering::SeqCst);
        true
    }

    #[test]
    fn irq_dispatch_matches_exact_line() {
        let _session = test_support::session();
        IRQ_HITS.store(0, Ordering::SeqCst);

        assert!(KERNEL.irqs.register(3, counting_irq_handler, 0));

        let mut ctx = ring0_ctx(vectors::IRQ_BASE + 3, 0);
        dispatch(&mut ctx);
        assert_eq!(IRQ_HITS.load(Ordering::SeqCst), 1);
        assert_eq!(sim::eoi_count(), 1);
        assert!(!KERNEL.this_cpu().in_irq());

        // Linha diferente não dispara
        let mut other = ring0_ctx(vectors::IRQ_BASE + 4, 0);
        dispatch(&mut other);
        assert_eq!(IRQ_HITS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_pci_lines_probe_wildcard_handlers() {
        let _session = test_support::session();
        SHARED_HITS.store(0, Ordering::SeqCst);

        assert!(KERNEL.irqs.register(-1, shared_line_handler, 1));

        // Linha 10 (compartilhável) sonda o handler -1
        let mut ctx = ring0_ctx(vectors::IRQ_BASE + 10, 0);
        dispatch(&mut ctx);
        assert_eq!(SHARED_HITS.load(Ordering::SeqCst), 1);

        // Linha 5 não sonda
        let mut ctx5 = ring0_ctx(vectors::IRQ_BASE + 5, 0);
        dispatch(&mut ctx5);
        assert_eq!(SHARED_HITS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn msi_dispatch_and_unregister() {
        let _session = test_support::session();
        MSI_HITS.store(0, Ordering::SeqCst);

        let reg = KERNEL.msis.register(counting_msi_handler, 0).unwrap();
        assert_eq!(reg.data, reg.vector as u64);

        let mut ctx = ring0_ctx(reg.vector, 0);
        dispatch(&mut ctx);
        assert_eq!(MSI_HITS.load(Ordering::SeqCst), 1);

        assert!(KERNEL.msis.unregister(reg.vector));
        dispatch(&mut ctx);
        // Sem handler: logado e ignorado
        assert_eq!(MSI_HITS.load(Ordering::SeqCst), 1);
    }

    static NESTED_EDITS: AtomicUsize = AtomicUsize::new(0);

    fn late_handler(_context: usize) -> bool {
        true
    }

    fn table_editing_handler(_context: usize) -> bool {
        // Só funciona porque o dispatch solta o lock das tabelas em
        // volta de cada invocação
        assert!(KERNEL.irqs.register(7, late_handler, 0));
        assert!(KERNEL.irqs.unregister(7, 0));
        let msi = KERNEL.msis.register(late_handler, 0).unwrap();
        assert!(KERNEL.msis.unregister(msi.vector));
        NESTED_EDITS.fetch_add(1, Ordering::SeqCst);
        true
    }

    #[test]
    fn handler_may_edit_the_tables_from_inside_dispatch() {
        let _session = test_support::session();
        NESTED_EDITS.store(0, Ordering::SeqCst);

        assert!(KERNEL.irqs.register(3, table_editing_handler, 0));

        let mut ctx = ring0_ctx(vectors::IRQ_BASE + 3, 0);
        dispatch(&mut ctx);
        assert_eq!(NESTED_EDITS.load(Ordering::SeqCst), 1);
        assert!(!KERNEL.this_cpu().in_irq());
    }

    #[test]
    fn panicking_kernel_short_circuits_dispatch() {
        let _session = test_support::session();
        KERNEL.panicking.store(true, Ordering::SeqCst);

        let mut ctx = ring0_ctx(vectors::TIMER_VECTOR, 0);
        let before = ctx;
        dispatch(&mut ctx);
        assert_eq!(ctx, before);
        assert_eq!(sim::eoi_count(), 0);
    }

    #[test]
    #[should_panic]
    fn panic_vector_parks_the_cpu() {
        let _session = test_support::session();
        KERNEL.panicking.store(true, Ordering::SeqCst);

        let mut ctx = ring0_ctx(vectors::PANIC_VECTOR, 0);
        dispatch(&mut ctx);
    }

    #[test]
    #[should_panic]
    fn corrupted_frame_is_fatal_on_exit() {
        let _session = test_support::session();

        let mut ctx = ring0_ctx(0x40, 0);
        ctx.ss = USER_SS; // seletor de pilha não bate com o ring
        dispatch(&mut ctx);
    }

    #[test]
    fn user_exception_is_delivered_to_scheduler() {
        let _session = test_support::session();
        let sched = MockScheduler::install();

        let mut ctx = ring3_ctx(6, 0); // #UD vindo de ring 3
        dispatch(&mut ctx);
        assert_eq!(sched.user_faults(), 1);
        assert_eq!(sim::eoi_count(), 0); // exceção fica abaixo do limiar
    }

    #[test]
    fn tlb_vector_routes_to_shootdown_handler() {
        let _session = test_support::session();

        // Publica um pedido como se outro core tivesse iniciado
        KERNEL
            .tlb
            .begin_remote_request_for_test(0x40_0000, 2, 1);

        let mut ctx = ring0_ctx(vectors::TLB_SHOOTDOWN_VECTOR, 0);
        dispatch(&mut ctx);
        assert_eq!(sim::invlpg_count(), 2);
        assert_eq!(sim::eoi_count(), 1);
    }
}
