//! Page Fault Handler
//!
//! Decide qual espaço de endereçamento e qual maquinário de regiões
//! resolve um fault, na ordem fixa da tabela de roteamento (primeira
//! regra que casa vence):
//!
//! 1. Descritores de core regions (supervisor): página zerada mapeada
//!    direto no espaço do kernel, SEM passar pelo resolver — esta faixa
//!    alimenta os metadados que o próprio alocador de VM usa, então não
//!    pode recursar pelo caminho genérico.
//! 2. Core space (supervisor): resolver genérico com o espaço core.
//! 3. Kernel space ou janela de módulos (supervisor): resolver genérico
//!    com o espaço do kernel.
//! 4. Endereço de usuário válido (página zero nunca): resolver genérico
//!    com o espaço de usuário corrente do scheduler (que já considera o
//!    override temporário de cópia entre processos).
//! 5. Resto: irresolvível.

use crate::arch::traits::CpuOps;
use crate::core::panic::kernel_fatal;
use crate::core::state::KERNEL;
use crate::mm::addr::VirtAddr;
use crate::mm::config::{
    CORE_REGIONS_BASE, CORE_REGIONS_SIZE, CORE_SPACE_BASE, CORE_SPACE_SIZE, KERNEL_SPACE_BASE,
    KERNEL_SPACE_SIZE, MODULES_BASE, MODULES_SIZE, PAGE_SIZE, USER_SPACE_END, USER_SPACE_START,
};
use crate::mm::error::MmError;
use crate::mm::mapper::MapFlags;

/// Tipo de acesso que causou o fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

/// Fault decodificado do error code de hardware
#[derive(Debug, Clone, Copy)]
pub struct PageFaultInfo {
    pub address: VirtAddr,
    pub access: AccessType,
    /// Fault veio de código em ring 3
    pub user_mode: bool,
    /// Bit "present": proteção violada em página JÁ mapeada
    pub present: bool,
    /// Fetch de instrução (NX)
    pub instruction_fetch: bool,
}

impl PageFaultInfo {
    /// Decodifica o error code empilhado pelo hardware no vetor 14:
    /// bit 0 = present, bit 1 = write, bit 2 = user, bit 4 = fetch.
    pub fn from_error_code(address: VirtAddr, error_code: u64) -> Self {
        Self {
            address,
            access: if error_code & 0x2 != 0 {
                AccessType::Write
            } else {
                AccessType::Read
            },
            user_mode: error_code & 0x4 != 0,
            present: error_code & 0x1 != 0,
            instruction_fetch: error_code & 0x10 != 0,
        }
    }
}

/// Resultado do roteamento (§ regras 1-5 acima)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultRoute {
    CoreRegions,
    CoreSpace,
    Kernel,
    User,
    Unresolvable,
}

/// Roteamento puro: endereço (com offset de página ignorado) + modo.
/// Determinístico, sem tocar em estado global.
pub fn route(address: VirtAddr, supervisor: bool) -> FaultRoute {
    let page = address.align_down(PAGE_SIZE as u64).as_u64();

    if supervisor {
        if page >= CORE_REGIONS_BASE && page < CORE_REGIONS_BASE + CORE_REGIONS_SIZE {
            return FaultRoute::CoreRegions;
        }
        if page >= CORE_SPACE_BASE && page < CORE_SPACE_BASE + CORE_SPACE_SIZE {
            return FaultRoute::CoreSpace;
        }
        if (page >= KERNEL_SPACE_BASE && page < KERNEL_SPACE_BASE + KERNEL_SPACE_SIZE)
            || (page >= MODULES_BASE && page < MODULES_BASE + MODULES_SIZE)
        {
            return FaultRoute::Kernel;
        }
    }

    if page >= USER_SPACE_START && page < USER_SPACE_END {
        return FaultRoute::User;
    }

    FaultRoute::Unresolvable
}

/// Valida uma faixa de buffer entregue pelo usuário: inteiramente dentro
/// do espaço de usuário, sem overflow e sem tocar a página zero.
pub fn user_range_valid(base: VirtAddr, length: u64) -> bool {
    let start = base.as_u64();
    let end = match start.checked_add(length) {
        Some(end) => end,
        None => return false,
    };
    start >= USER_SPACE_START && end <= USER_SPACE_END
}

/// Tenta resolver um page fault. `true` se a tradução foi instalada.
///
/// Pré-condição (fault de supervisor): interrupções HABILITADAS — o
/// resolver pode precisar bloquear para alocar. Chegar aqui com elas
/// desabilitadas é violação interna fatal, distinta de fault
/// irresolvível.
pub fn handle_page_fault(info: &PageFaultInfo) -> bool {
    if !info.user_mode && !crate::arch::Cpu::interrupts_enabled() {
        kernel_fatal("(FAULT) page fault de supervisor com interrupções desabilitadas");
    }

    let page = info.address.align_down(PAGE_SIZE as u64);

    match route(info.address, !info.user_mode) {
        FaultRoute::CoreRegions => bootstrap_core_region_page(page),
        FaultRoute::CoreSpace => {
            let (resolver, space) = match (KERNEL.region_resolver(), KERNEL.core_space()) {
                (Some(r), Some(s)) => (r, s),
                _ => return false,
            };
            resolver.handle_fault(&space, info.address, info.access)
        }
        FaultRoute::Kernel => {
            let (resolver, space) = match (KERNEL.region_resolver(), KERNEL.kernel_space()) {
                (Some(r), Some(s)) => (r, s),
                _ => return false,
            };
            resolver.handle_fault(&space, info.address, info.access)
        }
        FaultRoute::User => {
            let resolver = match KERNEL.region_resolver() {
                Some(r) => r,
                None => return false,
            };
            let space = match KERNEL.scheduler().and_then(|s| s.current_user_space()) {
                Some(s) => s,
                None => return false,
            };
            resolver.handle_fault(&space, info.address, info.access)
        }
        FaultRoute::Unresolvable => false,
    }
}

/// Regra 1: bootstrap dos descritores de core region. Um frame zerado,
/// mapeado imediatamente no espaço do kernel.
fn bootstrap_core_region_page(page: VirtAddr) -> bool {
    let frames = match KERNEL.frame_source() {
        Some(f) => f,
        None => kernel_fatal("(FAULT) core regions sem alocador físico instalado"),
    };
    let kernel_space = match KERNEL.kernel_space() {
        Some(s) => s,
        None => kernel_fatal("(FAULT) core regions sem espaço do kernel instalado"),
    };

    let frame = match frames.allocate_frame() {
        Some(f) => f,
        None => return false,
    };
    // SAFETY: frame recém entregue pelo alocador
    unsafe {
        crate::mm::mapper::zero_frame(frame);
    }

    match kernel_space.map_page(
        page,
        frame,
        MapFlags::WRITABLE | MapFlags::NO_EXECUTE | MapFlags::COMMIT_TABLES_NOW,
        frames,
    ) {
        Ok(()) => {
            crate::ktrace!("(FAULT) core region materializada em ", page.as_u64());
            true
        }
        // Outra CPU venceu a corrida: o mapeamento já serve
        Err(MmError::AlreadyMapped) => {
            frames.release_frame(frame);
            true
        }
        Err(_) => {
            frames.release_frame(frame);
            false
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
    use crate::mm::vas::SpaceKind;
    use crate::test_support::{self, MockResolver, MockScheduler, TestFrames};

    fn supervisor_fault(address: u64) -> PageFaultInfo {
        PageFaultInfo {
            address: VirtAddr::new(address),
            access: AccessType::Write,
            user_mode: false,
            present: false,
            instruction_fetch: false,
        }
    }

    fn user_fault(address: u64) -> PageFaultInfo {
        PageFaultInfo {
            user_mode: true,
            ..supervisor_fault(address)
        }
    }

    #[test]
    fn error_code_decodes_hardware_bits() {
        let info = PageFaultInfo::from_error_code(VirtAddr::new(0x1000), 0x2);
        assert_eq!(info.access, AccessType::Write);
        assert!(!info.user_mode);
        assert!(!info.present);

        let info = PageFaultInfo::from_error_code(VirtAddr::new(0x1000), 0x15);
        assert_eq!(info.access, AccessType::Read);
        assert!(info.user_mode);
        assert!(info.present);
        assert!(info.instruction_fetch);
    }

    #[test]
    fn routing_follows_rule_order() {
        // Regras de supervisor, na ordem
        assert_eq!(route(VirtAddr::new(CORE_REGIONS_BASE + 0x40), true), FaultRoute::CoreRegions);
        assert_eq!(route(VirtAddr::new(CORE_SPACE_BASE + 0x1000), true), FaultRoute::CoreSpace);
        assert_eq!(route(VirtAddr::new(KERNEL_SPACE_BASE), true), FaultRoute::Kernel);
        assert_eq!(route(VirtAddr::new(MODULES_BASE + 0x123), true), FaultRoute::Kernel);

        // Faixas de supervisor não resolvem faults de ring 3
        assert_eq!(route(VirtAddr::new(CORE_REGIONS_BASE), false), FaultRoute::Unresolvable);
        assert_eq!(route(VirtAddr::new(KERNEL_SPACE_BASE), false), FaultRoute::Unresolvable);

        // Endereço de usuário roteia nos dois modos (cópia de/para buffers)
        assert_eq!(route(VirtAddr::new(0x40_0000), true), FaultRoute::User);
        assert_eq!(route(VirtAddr::new(0x40_0000), false), FaultRoute::User);
        assert_eq!(route(VirtAddr::new(0x1000), false), FaultRoute::User);
    }

    #[test]
    fn routing_boundaries_are_exclusive() {
        // Página zero nunca resolve
        assert_eq!(route(VirtAddr::new(0), false), FaultRoute::Unresolvable);
        assert_eq!(route(VirtAddr::new(0xFFF), true), FaultRoute::Unresolvable);

        assert_eq!(route(VirtAddr::new(USER_SPACE_END), false), FaultRoute::Unresolvable);
        assert_eq!(
            route(VirtAddr::new(USER_SPACE_END - 1), false),
            FaultRoute::User
        );

        // Buracos entre as faixas da metade alta
        assert_eq!(
            route(VirtAddr::new(CORE_REGIONS_BASE + CORE_REGIONS_SIZE), true),
            FaultRoute::Unresolvable
        );
        assert_eq!(
            route(VirtAddr::new(CORE_SPACE_BASE + CORE_SPACE_SIZE), true),
            FaultRoute::Unresolvable
        );
        assert_eq!(route(VirtAddr::new(KERNEL_SPACE_BASE - 1), true), FaultRoute::Unresolvable);
        assert_eq!(
            route(VirtAddr::new(MODULES_BASE + MODULES_SIZE), true),
            FaultRoute::Unresolvable
        );
    }

    #[test]
    fn user_range_validation() {
        assert!(user_range_valid(VirtAddr::new(0x1000), 0x1000));
        assert!(user_range_valid(VirtAddr::new(0x40_0000), 0));

        // Página zero
        assert!(!user_range_valid(VirtAddr::new(0), 16));
        // Estoura o fim do espaço de usuário
        assert!(!user_range_valid(VirtAddr::new(USER_SPACE_END - 8), 16));
        // Overflow aritmético
        assert!(!user_range_valid(VirtAddr::new(0x1000), u64::MAX));
        // Endereço de kernel
        assert!(!user_range_valid(VirtAddr::new(KERNEL_SPACE_BASE), 16));
    }

    #[test]
    #[should_panic]
    fn supervisor_fault_with_interrupts_disabled_is_fatal() {
        let _session = test_support::session();
        // Reset deixa interrupções desabilitadas no backend simulado

        handle_page_fault(&supervisor_fault(KERNEL_SPACE_BASE));
    }

    #[test]
    fn core_region_fault_maps_a_zeroed_page() {
        let _session = test_support::session();
        sim::set_interrupts(true);
        let frames = TestFrames::install();
        let kernel = test_support::boot_kernel_space(frames);

        let addr = CORE_REGIONS_BASE + 3 * PAGE_SIZE as u64 + 0x10;
        assert!(handle_page_fault(&supervisor_fault(addr)));

        let page = VirtAddr::new(addr).align_down(PAGE_SIZE as u64);
        let pa = kernel.translate(page).expect("página materializada");

        // Conteúdo zerado, visível pela janela direta
        let bytes = crate::mm::addr::phys_to_virt(pa).as_ptr::<u8>();
        for i in [0usize, 7, 4095] {
            // SAFETY: frame de teste vivo pelo resto do processo
            unsafe {
                assert_eq!(*bytes.add(i), 0);
            }
        }
    }

    #[test]
    fn core_region_race_releases_the_extra_frame() {
        let _session = test_support::session();
        sim::set_interrupts(true);
        let frames = TestFrames::install();
        let _kernel = test_support::boot_kernel_space(frames);

        let fault = supervisor_fault(CORE_REGIONS_BASE);
        assert!(handle_page_fault(&fault));
        // Outra CPU teria faltado na mesma página: o frame extra volta
        assert!(handle_page_fault(&fault));
        assert_eq!(frames.released(), 1);
    }

    #[test]
    fn core_region_fault_fails_without_frames_left() {
        let _session = test_support::session();
        sim::set_interrupts(true);
        let frames = TestFrames::install();
        let _kernel = test_support::boot_kernel_space(frames);
        frames.set_fail_allocations(true);

        assert!(!handle_page_fault(&supervisor_fault(CORE_REGIONS_BASE)));
    }

    #[test]
    fn kernel_and_core_faults_reach_the_resolver() {
        let _session = test_support::session();
        sim::set_interrupts(true);
        let frames = TestFrames::install();
        let kernel = test_support::boot_kernel_space(frames);
        KERNEL.install_core_space(alloc::sync::Arc::new(
            crate::mm::vas::AddressSpace::core_space(kernel.root()),
        ));
        let resolver = MockResolver::install();

        let addr = KERNEL_SPACE_BASE + 0x5000;
        assert!(handle_page_fault(&supervisor_fault(addr)));
        assert_eq!(resolver.calls(), 1);
        assert_eq!(resolver.last_address(), addr);
        assert_eq!(resolver.last_kind(), Some(SpaceKind::Kernel));

        assert!(handle_page_fault(&supervisor_fault(CORE_SPACE_BASE + 0x2000)));
        assert_eq!(resolver.last_kind(), Some(SpaceKind::Core));

        // A janela de módulos resolve com o espaço do kernel
        assert!(handle_page_fault(&supervisor_fault(MODULES_BASE)));
        assert_eq!(resolver.last_kind(), Some(SpaceKind::Kernel));

        resolver.set_outcome(false);
        assert!(!handle_page_fault(&supervisor_fault(addr)));
    }

    #[test]
    fn kernel_fault_without_resolver_is_unresolved() {
        let _session = test_support::session();
        sim::set_interrupts(true);
        let frames = TestFrames::install();
        let _kernel = test_support::boot_kernel_space(frames);

        assert!(!handle_page_fault(&supervisor_fault(KERNEL_SPACE_BASE + 0x5000)));
    }

    #[test]
    fn user_faults_use_the_schedulers_current_space() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let resolver = MockResolver::install();
        let sched = MockScheduler::install();

        // Sem espaço corrente não há o que resolver
        assert!(!handle_page_fault(&user_fault(0x40_0000)));
        assert_eq!(resolver.calls(), 0);

        let user = crate::mm::vas::AddressSpace::new_user(frames).unwrap();
        sched.set_current_user_space(Some(user));

        assert!(handle_page_fault(&user_fault(0x40_0000)));
        assert_eq!(resolver.calls(), 1);
        assert_eq!(resolver.last_kind(), Some(SpaceKind::User));
    }

    #[test]
    fn unresolvable_addresses_return_false() {
        let _session = test_support::session();
        sim::set_interrupts(true);
        let _resolver = MockResolver::install();

        // Buraco da metade alta: nenhuma regra casa, resolver não é chamado
        assert!(!handle_page_fault(&supervisor_fault(0xFFFF_9050_0000_0000)));
    }
}
