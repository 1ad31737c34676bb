//! Regiões e o Resolver Externo
//!
//! A semântica de regiões (anônima, file-backed, device) pertence à
//! camada de VM do kernel hospedeiro. Este núcleo só encaminha faults
//! para o resolver registrado, junto com o espaço de endereçamento que
//! a tabela de roteamento escolheu.

use alloc::sync::Arc;

use crate::mm::addr::VirtAddr;
use crate::mm::config::PAGE_SIZE;
use crate::mm::fault::AccessType;
use crate::mm::vas::AddressSpace;

/// Faixa virtual contígua, unidade que o fault handler resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub base: VirtAddr,
    pub pages: usize,
}

impl Region {
    pub const fn new(base: VirtAddr, pages: usize) -> Self {
        Self { base, pages }
    }

    pub fn contains(&self, addr: VirtAddr) -> bool {
        let start = self.base.as_u64();
        let end = start + (self.pages * PAGE_SIZE) as u64;
        addr.as_u64() >= start && addr.as_u64() < end
    }
}

/// Resolver de fault de região, implementado pela camada de VM
pub trait RegionResolver: Sync {
    /// Tenta satisfazer um fault em `address` dentro de `space`.
    ///
    /// Chamado com interrupções habilitadas; pode alocar e pode mapear
    /// páginas no espaço recebido. Retorna `false` se nenhuma região
    /// cobre o endereço ou o backing recusou.
    fn handle_fault(&self, space: &Arc<AddressSpace>, address: VirtAddr, access: AccessType)
        -> bool;
}
