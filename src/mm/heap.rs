//! Heap do Kernel
//!
//! Alocador de lista encadeada montado sobre uma faixa fixa do kernel
//! space. Bring-up acontece pelo caminho cru do mapper (a raiz do boot
//! ainda não tem objeto `AddressSpace` — ele mesmo precisa do heap).

use linked_list_allocator::LockedHeap;

use crate::arch::traits::MmuOps;
use crate::mm::addr::VirtAddr;
use crate::mm::config::{HEAP_INITIAL_SIZE, HEAP_VIRT_BASE, PAGE_SIZE};
use crate::mm::error::{MmError, MmResult};
use crate::mm::mapper::{self, MapFlags};
use crate::mm::phys::FrameSource;

#[cfg_attr(all(target_os = "none", not(test)), global_allocator)]
pub static KERNEL_HEAP: LockedHeap = LockedHeap::empty();

/// Mapeia e monta o heap inicial.
///
/// # Safety
///
/// Uma vez, no boot, com a janela direta já configurada e a raiz de
/// paginação do boot ativa.
pub unsafe fn init(frames: &dyn FrameSource) -> MmResult<()> {
    let root = crate::arch::Cpu::read_root();
    let pages = HEAP_INITIAL_SIZE / PAGE_SIZE;

    for i in 0..pages {
        let frame = frames.allocate_frame().ok_or(MmError::OutOfMemory)?;
        mapper::map_page_raw(
            root,
            VirtAddr::new(HEAP_VIRT_BASE + (i * PAGE_SIZE) as u64),
            frame,
            MapFlags::WRITABLE | MapFlags::NO_EXECUTE | MapFlags::GLOBAL,
            frames,
        )?;
    }

    KERNEL_HEAP
        .lock()
        .init(HEAP_VIRT_BASE as *mut u8, HEAP_INITIAL_SIZE);

    Ok(())
}
