//! Interface Abstrata da MMU.
//! Registradores de paginação e invalidação de TLB da CPU local.

use crate::mm::addr::{PhysAddr, VirtAddr};

pub trait MmuOps {
    /// Lê a raiz da hierarquia de tabelas ativa (CR3 no x86_64).
    fn read_root() -> PhysAddr;

    /// Troca a raiz ativa.
    ///
    /// # Safety
    ///
    /// `root` deve apontar para uma hierarquia válida que mapeie o código
    /// e a pilha em execução. Troca errada = triple fault.
    unsafe fn write_root(root: PhysAddr);

    /// Endereço virtual que causou o último page fault (CR2).
    fn read_fault_address() -> VirtAddr;

    /// Invalida a tradução de UMA página na TLB local (INVLPG).
    fn invalidate_page(addr: VirtAddr);

    /// Descarta a TLB local inteira (reload de CR3).
    fn flush_tlb();
}
