//! Subsistema de Memória
//!
//! Ordem de init é rígida e cada estágio loga o que montou:
//! 1. Janela direta físico→virtual (offset vindo do bootloader)
//! 2. Alocador físico externo instalado no estado global
//! 3. Heap do kernel (caminho cru do mapper, sem Arc ainda)
//! 4. Pseudo-espaços kernel/core sobre a raiz do boot (já com heap)

pub mod addr;
pub mod config;
pub mod error;
pub mod fault;
pub mod heap;
pub mod mapper;
pub mod phys;
pub mod region;
pub mod tlb;
pub mod vas;

use alloc::sync::Arc;

use crate::arch::traits::MmuOps;
use crate::core::state::KERNEL;
use crate::mm::error::MmResult;
use crate::mm::phys::FrameSource;
use crate::mm::vas::AddressSpace;

pub use addr::{PhysAddr, VirtAddr};
pub use error::{MmError, MmResult as Result};
pub use fault::{handle_page_fault, AccessType, PageFaultInfo};
pub use mapper::MapFlags;

/// Inicializa o subsistema de memória.
///
/// # Safety
///
/// Uma vez, no boot do BSP, antes de qualquer alocação e antes de
/// habilitar os outros cores.
pub unsafe fn init(frames: &'static dyn FrameSource, direct_map_offset: u64) -> MmResult<()> {
    crate::kinfo!("(MM) Inicializando subsistema de memória");

    addr::set_direct_map_offset(direct_map_offset);
    KERNEL.install_frame_source(frames);

    heap::init(frames)?;
    crate::kinfo!("(MM) Heap montado em ", config::HEAP_VIRT_BASE);

    let root = crate::arch::Cpu::read_root();
    KERNEL.install_kernel_space(Arc::new(AddressSpace::kernel(root)));
    KERNEL.install_core_space(Arc::new(AddressSpace::core_space(root)));
    crate::kinfo!("(MM) Espaços kernel/core sobre root=", root.as_u64());

    crate::kok!("(MM) Subsistema de memória pronto");
    Ok(())
}
