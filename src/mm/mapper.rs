//! Walker/Mapper de Tabelas de Página
//!
//! Tradução de endereço virtual para a cadeia de índices dos 4 níveis,
//! materialização de tabelas intermediárias sob demanda e instalação/
//! remoção de mapeamentos folha.
//!
//! Acesso às tabelas sempre atravessa a janela direta físico→virtual e
//! usa leituras/escritas voláteis: a MMU enxerga as mesmas células.
//!
//! O protocolo de commit é por reserva: `commit_tables` garante estoque
//! no alocador para as tabelas L1 da faixa (tudo-ou-nada) e marca o
//! bitmap; os frames em si são consumidos quando `map_page_raw` precisa
//! materializar o caminho.

use bitflags::bitflags;

use crate::arch::traits::MmuOps;
use crate::mm::addr::{phys_to_virt, PhysAddr, VirtAddr};
use crate::mm::config::{
    align_down, align_up, COMMIT_WINDOW_SIZE, L1_SPAN, PAGE_OFFSET_BITS, PAGE_SIZE, PTE_ADDR_MASK,
    PTE_PRESENT, PTE_USER, PTE_WRITABLE,
};
use crate::mm::error::{MmError, MmResult};
use crate::mm::phys::FrameSource;
use crate::mm::vas::CommitBitmap;

bitflags! {
    /// Flags de mapeamento (bits de hardware + bits de software)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MapFlags: u64 {
        const WRITABLE      = 1 << 1;
        const USER          = 1 << 2;
        const WRITE_THROUGH = 1 << 3;
        const CACHE_DISABLE = 1 << 4;
        const GLOBAL        = 1 << 8;
        const NO_EXECUTE    = 1 << 63;

        /// Software: commita a tabela L1 do chunk durante o map,
        /// dispensando um `commit_tables` prévio. Nunca escrito na PTE.
        const COMMIT_TABLES_NOW = 1 << 48;
    }
}

impl MapFlags {
    /// Apenas os bits que a MMU entende
    #[inline]
    fn hardware_bits(self) -> u64 {
        (self & !Self::COMMIT_TABLES_NOW).bits()
    }
}

// =============================================================================
// ACESSO CRU ÀS TABELAS
// =============================================================================

/// Índice do endereço no nível dado (4 = raiz, 1 = folha)
#[inline]
pub fn table_index(va: VirtAddr, level: usize) -> usize {
    ((va.as_u64() >> (PAGE_OFFSET_BITS + 9 * (level - 1))) & 0x1FF) as usize
}

/// Índice do chunk de 2 MiB relativo à base da janela de commit
#[inline]
pub fn commit_chunk_index(commit_base: u64, addr: u64) -> usize {
    ((addr - commit_base) / L1_SPAN) as usize
}

#[inline]
unsafe fn get_table_entry(table: PhysAddr, index: usize) -> u64 {
    let ptr = phys_to_virt(table).as_ptr::<u64>().add(index);
    core::ptr::read_volatile(ptr)
}

#[inline]
unsafe fn set_table_entry(table: PhysAddr, index: usize, value: u64) {
    let ptr = phys_to_virt(table).as_mut_ptr::<u64>().add(index);
    core::ptr::write_volatile(ptr, value);
}

/// Zera um frame através da janela direta
pub(crate) unsafe fn zero_frame(frame: PhysAddr) {
    core::ptr::write_bytes(phys_to_virt(frame).as_mut_ptr::<u8>(), 0, PAGE_SIZE);
}

/// Desce da raiz até a tabela L1, materializando níveis ausentes.
///
/// Retorna a tabela L1 e quantas tabelas novas foram alocadas.
unsafe fn walk_or_create(
    root: PhysAddr,
    va: VirtAddr,
    user: bool,
    frames: &dyn FrameSource,
) -> MmResult<(PhysAddr, usize)> {
    let mut table = root;
    let mut created = 0;

    for level in (2..=4).rev() {
        let index = table_index(va, level);
        let entry = get_table_entry(table, index);

        if entry & PTE_PRESENT == 0 {
            let frame = frames.allocate_frame().ok_or(MmError::OutOfMemory)?;
            zero_frame(frame);
            let mut entry = frame.as_u64() | PTE_PRESENT | PTE_WRITABLE;
            if user {
                entry |= PTE_USER;
            }
            set_table_entry(table, index, entry);
            created += 1;
            table = frame;
        } else {
            table = PhysAddr::new(entry & PTE_ADDR_MASK);
        }
    }

    Ok((table, created))
}

/// Desce da raiz até a tabela L1 sem criar nada
unsafe fn walk(root: PhysAddr, va: VirtAddr) -> Option<PhysAddr> {
    let mut table = root;
    for level in (2..=4).rev() {
        let entry = get_table_entry(table, table_index(va, level));
        if entry & PTE_PRESENT == 0 {
            return None;
        }
        table = PhysAddr::new(entry & PTE_ADDR_MASK);
    }
    Some(table)
}

// =============================================================================
// OPERAÇÕES
// =============================================================================

/// Reserva as tabelas L1 de uma faixa, tudo-ou-nada.
///
/// Chamado com o lock do VAS seguro pelo chamador. Conta os chunks de
/// 2 MiB da faixa ainda sem bit de commit (arredondando cada ponta ao
/// limite de chunk), faz UMA reserva no alocador e só então marca os
/// bits. Falha do alocador não deixa nenhum estado parcial visível.
///
/// Retorna quantos chunks novos foram commitados.
pub(crate) fn commit_tables(
    bitmap: &mut CommitBitmap,
    commit_base: u64,
    base: VirtAddr,
    page_count: usize,
    frames: &dyn FrameSource,
) -> MmResult<usize> {
    if page_count == 0 {
        return Err(MmError::InvalidSize);
    }

    let start = base.as_u64();
    let end = start + (page_count * PAGE_SIZE) as u64;
    if start < commit_base || end > commit_base + COMMIT_WINDOW_SIZE {
        return Err(MmError::OutOfBounds);
    }

    let first = commit_chunk_index(commit_base, align_down(start as usize, L1_SPAN as usize) as u64);
    let last = commit_chunk_index(commit_base, align_up(end as usize, L1_SPAN as usize) as u64);

    let needed = bitmap.count_zeros_in_range(first, last);
    if needed == 0 {
        return Ok(0);
    }

    if !frames.reserve(needed) {
        return Err(MmError::OutOfMemory);
    }

    bitmap.set_range(first, last);
    Ok(needed)
}

/// Instala um mapeamento folha descendo a partir de `root`.
///
/// Caminho cru, sem bitmap de commit: usado pelo bring-up do heap antes
/// de existirem objetos `AddressSpace`, e pelo VAS depois de validar o
/// commit. Invalida a TLB local; shootdown é responsabilidade de quem
/// REMOVE mapeamentos.
///
/// Retorna quantas tabelas intermediárias foram materializadas.
pub fn map_page_raw(
    root: PhysAddr,
    va: VirtAddr,
    pa: PhysAddr,
    flags: MapFlags,
    frames: &dyn FrameSource,
) -> MmResult<usize> {
    if !va.is_aligned(PAGE_SIZE as u64) || !pa.is_aligned(PAGE_SIZE as u64) {
        return Err(MmError::NotAligned);
    }

    // SAFETY: janela direta cobre os frames de tabela
    unsafe {
        let (l1, created) = walk_or_create(root, va, flags.contains(MapFlags::USER), frames)?;
        let index = table_index(va, 1);

        if get_table_entry(l1, index) & PTE_PRESENT != 0 {
            return Err(MmError::AlreadyMapped);
        }

        set_table_entry(l1, index, pa.as_u64() | PTE_PRESENT | flags.hardware_bits());
        crate::arch::Cpu::invalidate_page(va);
        Ok(created)
    }
}

/// Traduz VA→PA descendo a hierarquia (sem efeitos colaterais)
pub fn translate_raw(root: PhysAddr, va: VirtAddr) -> Option<PhysAddr> {
    // SAFETY: apenas leituras através da janela direta
    unsafe {
        let l1 = walk(root, va)?;
        let entry = get_table_entry(l1, table_index(va, 1));
        if entry & PTE_PRESENT == 0 {
            return None;
        }
        Some(PhysAddr::new(
            (entry & PTE_ADDR_MASK) | (va.as_u64() & (PAGE_SIZE as u64 - 1)),
        ))
    }
}

/// Limpa as folhas de uma faixa. NÃO invalida TLBs: o chamador dispara
/// o shootdown com a faixa completa depois.
///
/// Retorna quantas folhas estavam presentes.
pub(crate) fn clear_range(root: PhysAddr, base: VirtAddr, page_count: usize) -> usize {
    let mut cleared = 0;
    // SAFETY: janela direta cobre os frames de tabela
    unsafe {
        for i in 0..page_count {
            let va = base.add((i * PAGE_SIZE) as u64);
            if let Some(l1) = walk(root, va) {
                let index = table_index(va, 1);
                if get_table_entry(l1, index) & PTE_PRESENT != 0 {
                    set_table_entry(l1, index, 0);
                    cleared += 1;
                }
            }
        }
    }
    cleared
}

// =============================================================================
// TESTES
// =============================================================================
