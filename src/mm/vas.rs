//! Espaço de Endereçamento Virtual (VAS)
//!
//! Descritor por processo (ou pseudo-espaço do kernel/core): raiz da
//! hierarquia de tabelas, bitmap de commit das tabelas L1 dentro da
//! janela de 512 GiB do espaço, e contadores. Toda mutação estrutural
//! acontece sob o mutex interno — que pode esperar, então NUNCA é
//! adquirido com interrupções desabilitadas.

use alloc::sync::Arc;

use crate::klib::FixedBitmap;
use crate::mm::addr::{PhysAddr, VirtAddr};
use crate::mm::config::{
    COMMIT_BITMAP_WORDS, CORE_SPACE_BASE, KERNEL_WINDOW_BASE, L1_SPAN, TABLE_ENTRIES,
    USER_SPACE_END, USER_SPACE_START,
};
use crate::mm::error::{MmError, MmResult};
use crate::mm::mapper::{self, MapFlags};
use crate::mm::phys::FrameSource;
use crate::sync::Mutex;

/// Bitmap de commit: um bit por chunk de 2 MiB na janela do espaço
pub type CommitBitmap = FixedBitmap<COMMIT_BITMAP_WORDS>;

/// Tipo do espaço: decide a janela de commit e as regras de teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceKind {
    /// Processo de usuário (janela a partir de 0)
    User,
    /// Pseudo-espaço do kernel (janela da metade alta inteira)
    Kernel,
    /// Pseudo-espaço do alocador core (compartilha a raiz do kernel)
    Core,
}

/// Estado mutável do espaço, protegido pelo mutex
pub struct VasState {
    /// Bit i setado <=> chunk i tem tabela L1 commitada (reservada)
    pub l1_commit: CommitBitmap,
    /// Chunks commitados
    pub committed_tables: usize,
    /// Chunks cuja L1 já foi materializada (a reserva do commit foi
    /// convertida no frame alocado)
    pub materialized_tables: usize,
    /// Tabelas intermediárias materializadas na hierarquia
    pub active_tables: usize,
}

pub struct AddressSpace {
    pub kind: SpaceKind,
    /// Raiz física da hierarquia (vai para CR3 no context switch)
    root: PhysAddr,
    /// Base da janela coberta pelo bitmap de commit
    commit_base: u64,
    state: Mutex<VasState>,
}

impl AddressSpace {
    const fn window_base(kind: SpaceKind) -> u64 {
        match kind {
            SpaceKind::User => 0,
            SpaceKind::Kernel => KERNEL_WINDOW_BASE,
            SpaceKind::Core => CORE_SPACE_BASE,
        }
    }

    fn from_root(kind: SpaceKind, root: PhysAddr) -> Self {
        Self {
            kind,
            root,
            commit_base: Self::window_base(kind),
            state: Mutex::new(VasState {
                l1_commit: CommitBitmap::new(),
                committed_tables: 0,
                materialized_tables: 0,
                active_tables: 0,
            }),
        }
    }

    /// Pseudo-espaço do kernel sobre uma raiz já ativa (a do boot)
    pub fn kernel(root: PhysAddr) -> Self {
        Self::from_root(SpaceKind::Kernel, root)
    }

    /// Pseudo-espaço do alocador core, compartilhando a raiz do kernel
    pub fn core_space(root: PhysAddr) -> Self {
        Self::from_root(SpaceKind::Core, root)
    }

    /// Cria um espaço de usuário novo: raiz zerada com a metade alta
    /// copiada do espaço do kernel (mapeamentos do kernel são visíveis
    /// em todo processo).
    pub fn new_user(frames: &dyn FrameSource) -> MmResult<Arc<Self>> {
        let root = frames.allocate_frame().ok_or(MmError::OutOfMemory)?;
        // SAFETY: frame recém entregue, janela direta válida
        unsafe {
            mapper::zero_frame(root);
        }

        if let Some(kernel) = crate::core::state::KERNEL.kernel_space() {
            // SAFETY: cópia das entradas 256..512 da raiz do kernel
            unsafe {
                let src = crate::mm::addr::phys_to_virt(kernel.root).as_ptr::<u64>();
                let dst = crate::mm::addr::phys_to_virt(root).as_mut_ptr::<u64>();
                for i in TABLE_ENTRIES / 2..TABLE_ENTRIES {
                    core::ptr::write_volatile(dst.add(i), core::ptr::read_volatile(src.add(i)));
                }
            }
        }

        crate::ktrace!("(VAS) Espaço de usuário criado, root=", root.as_u64());
        Ok(Arc::new(Self::from_root(SpaceKind::User, root)))
    }

    #[inline]
    pub fn root(&self) -> PhysAddr {
        self.root
    }

    #[inline]
    pub fn commit_base(&self) -> u64 {
        self.commit_base
    }

    /// Commita (reserva) as tabelas L1 da faixa. Tudo-ou-nada.
    pub fn commit_region_tables(
        &self,
        base: VirtAddr,
        page_count: usize,
        frames: &dyn FrameSource,
    ) -> MmResult<()> {
        let mut state = self.state.lock();
        let added = mapper::commit_tables(
            &mut state.l1_commit,
            self.commit_base,
            base,
            page_count,
            frames,
        )?;
        state.committed_tables += added;
        Ok(())
    }

    /// Instala um mapeamento folha.
    ///
    /// Exige que o chunk da página esteja commitado, a não ser que
    /// `COMMIT_TABLES_NOW` peça o commit em linha.
    pub fn map_page(
        &self,
        va: VirtAddr,
        pa: PhysAddr,
        flags: MapFlags,
        frames: &dyn FrameSource,
    ) -> MmResult<()> {
        if !self.owns(va) {
            return Err(MmError::WrongSpace);
        }

        let mut state = self.state.lock();

        let chunk = mapper::commit_chunk_index(self.commit_base, va.align_down(L1_SPAN).as_u64());
        if !state.l1_commit.test(chunk) {
            if !flags.contains(MapFlags::COMMIT_TABLES_NOW) {
                return Err(MmError::NotCommitted);
            }
            let added =
                mapper::commit_tables(&mut state.l1_commit, self.commit_base, va, 1, frames)?;
            state.committed_tables += added;
        }

        let created = mapper::map_page_raw(self.root, va, pa, flags, frames)?;
        state.active_tables += created;

        // O walker cria as tabelas faltantes de cima para baixo: criou
        // alguma <=> criou a L1 do chunk. A reserva do commit vira o
        // frame recém alocado.
        if created > 0 {
            state.materialized_tables += 1;
            frames.unreserve(1);
        }
        Ok(())
    }

    /// Remove os mapeamentos folha da faixa e faz o shootdown síncrono.
    ///
    /// Quando retorna, NENHUMA CPU tem tradução para a faixa.
    pub fn unmap_range(&self, base: VirtAddr, page_count: usize) -> usize {
        let cleared = {
            let _state = self.state.lock();
            mapper::clear_range(self.root, base, page_count)
        };
        // Lock do VAS solto antes do spin global do shootdown
        crate::core::state::KERNEL.tlb.invalidate_range(base, page_count);
        cleared
    }

    /// Tradução VA→PA (diagnóstico e testes)
    pub fn translate(&self, va: VirtAddr) -> Option<PhysAddr> {
        mapper::translate_raw(self.root, va)
    }

    /// O endereço pertence à janela deste espaço?
    pub fn owns(&self, va: VirtAddr) -> bool {
        match self.kind {
            SpaceKind::User => va.as_u64() >= USER_SPACE_START && va.as_u64() < USER_SPACE_END,
            _ => va.as_u64() >= self.commit_base,
        }
    }

    /// Estatísticas (committed_tables, active_tables)
    pub fn stats(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.committed_tables, state.active_tables)
    }

    /// Destrói um espaço de usuário: devolve todas as tabelas da metade
    /// baixa, a raiz e as reservas de commit não materializadas ao
    /// alocador. Frames folha pertencem às regiões e são devolvidos
    /// pela camada de VM antes disto.
    pub fn teardown(&self, frames: &dyn FrameSource) -> MmResult<()> {
        if self.kind != SpaceKind::User {
            return Err(MmError::WrongSpace);
        }

        let mut state = self.state.lock();

        // SAFETY: percurso só da metade do usuário, sob o lock do VAS
        unsafe {
            free_user_half(self.root, frames);
        }
        frames.release_frame(self.root);

        // Chunks commitados cuja L1 nunca foi materializada ainda
        // seguram a reserva do commit
        let pending = state.committed_tables - state.materialized_tables;
        if pending > 0 {
            frames.unreserve(pending);
        }

        state.l1_commit.clear_all();
        state.committed_tables = 0;
        state.materialized_tables = 0;
        state.active_tables = 0;

        crate::ktrace!("(VAS) Teardown concluído, root=", self.root.as_u64());
        Ok(())
    }
}

/// Libera recursivamente as tabelas da metade baixa (entradas 0..256 da
/// raiz), sem tocar nos frames folha.
unsafe fn free_user_half(root: PhysAddr, frames: &dyn FrameSource) {
    use crate::mm::config::{PTE_ADDR_MASK, PTE_PRESENT};

    let root_ptr = crate::mm::addr::phys_to_virt(root).as_mut_ptr::<u64>();
    for i4 in 0..TABLE_ENTRIES / 2 {
        let e4 = core::ptr::read_volatile(root_ptr.add(i4));
        if e4 & PTE_PRESENT == 0 {
            continue;
        }
        let l3 = PhysAddr::new(e4 & PTE_ADDR_MASK);
        let l3_ptr = crate::mm::addr::phys_to_virt(l3).as_mut_ptr::<u64>();
        for i3 in 0..TABLE_ENTRIES {
            let e3 = core::ptr::read_volatile(l3_ptr.add(i3));
            if e3 & PTE_PRESENT == 0 {
                continue;
            }
            let l2 = PhysAddr::new(e3 & PTE_ADDR_MASK);
            let l2_ptr = crate::mm::addr::phys_to_virt(l2).as_mut_ptr::<u64>();
            for i2 in 0..TABLE_ENTRIES {
                let e2 = core::ptr::read_volatile(l2_ptr.add(i2));
                if e2 & PTE_PRESENT != 0 {
                    frames.release_frame(PhysAddr::new(e2 & PTE_ADDR_MASK));
                }
            }
            frames.release_frame(l2);
        }
        frames.release_frame(l3);
        core::ptr::write_volatile(root_ptr.add(i4), 0);
    }
}

// =============================================================================
// TESTES
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::sim;
    use crate::interrupts::vectors::TLB_SHOOTDOWN_VECTOR;
    use crate::mm::config::{KERNEL_SPACE_BASE, PAGE_SIZE};
    use crate::test_support::{self, TestFrames};

    #[test]
    fn map_requires_committed_chunk() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let space = AddressSpace::new_user(frames).unwrap();

        let va = VirtAddr::new(0x40_0000);
        let pa = frames.allocate_frame().unwrap();
        let user_rw = MapFlags::WRITABLE | MapFlags::USER;

        assert_eq!(space.map_page(va, pa, user_rw, frames), Err(MmError::NotCommitted));

        space.commit_region_tables(va, 16, frames).unwrap();
        space.map_page(va, pa, user_rw, frames).unwrap();
        assert_eq!(space.translate(va), Some(pa));

        let (committed, active) = space.stats();
        assert_eq!(committed, 1);
        assert_eq!(active, 3);
    }

    #[test]
    fn commit_now_flag_commits_inline() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let space = AddressSpace::new_user(frames).unwrap();

        let va = VirtAddr::new(0x40_0000);
        let pa = frames.allocate_frame().unwrap();
        space
            .map_page(
                va,
                pa,
                MapFlags::WRITABLE | MapFlags::USER | MapFlags::COMMIT_TABLES_NOW,
                frames,
            )
            .unwrap();

        let (committed, _) = space.stats();
        assert_eq!(committed, 1);

        // O chunk ficou commitado: a vizinha mapeia sem a flag
        let pa2 = frames.allocate_frame().unwrap();
        space
            .map_page(
                va.add(PAGE_SIZE as u64),
                pa2,
                MapFlags::WRITABLE | MapFlags::USER,
                frames,
            )
            .unwrap();
    }

    #[test]
    fn spaces_reject_foreign_addresses() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let kernel = test_support::boot_kernel_space(frames);
        let user = AddressSpace::new_user(frames).unwrap();
        let pa = frames.allocate_frame().unwrap();

        // Endereço de usuário no espaço do kernel
        assert_eq!(
            kernel.map_page(VirtAddr::new(0x40_0000), pa, MapFlags::WRITABLE, frames),
            Err(MmError::WrongSpace)
        );
        // Endereço de kernel no espaço de usuário
        assert_eq!(
            user.map_page(VirtAddr::new(KERNEL_SPACE_BASE), pa, MapFlags::WRITABLE, frames),
            Err(MmError::WrongSpace)
        );
        // Página zero nunca é mapeável
        assert_eq!(
            user.map_page(VirtAddr::new(0), pa, MapFlags::WRITABLE, frames),
            Err(MmError::WrongSpace)
        );
    }

    #[test]
    fn unmap_range_is_synchronous_across_cpus() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let space = AddressSpace::new_user(frames).unwrap();

        let base = VirtAddr::new(0x40_0000);
        space.commit_region_tables(base, 5, frames).unwrap();
        for i in 0..5u64 {
            let pa = frames.allocate_frame().unwrap();
            space
                .map_page(
                    base.add(i * PAGE_SIZE as u64),
                    pa,
                    MapFlags::WRITABLE | MapFlags::USER,
                    frames,
                )
                .unwrap();
        }

        sim::set_cpu_count(2);
        sim::reset_counters();

        let cleared = space.unmap_range(base, 5);
        assert_eq!(cleared, 5);
        for i in 0..5u64 {
            assert!(space.translate(base.add(i * PAGE_SIZE as u64)).is_none());
        }

        // A CPU remota invalidou e confirmou antes do retorno
        assert_eq!(sim::remote_acks(), 1);
        assert_eq!(sim::last_broadcast(), Some(TLB_SHOOTDOWN_VECTOR));
        // 5 páginas na remota + 5 no iniciador
        assert_eq!(sim::invlpg_count(), 10);
    }

    #[test]
    fn new_user_space_sees_kernel_half() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let kernel = test_support::boot_kernel_space(frames);

        let kva = VirtAddr::new(KERNEL_SPACE_BASE + 0x20_0000);
        let pa = frames.allocate_frame().unwrap();
        kernel
            .map_page(
                kva,
                pa,
                MapFlags::WRITABLE | MapFlags::GLOBAL | MapFlags::COMMIT_TABLES_NOW,
                frames,
            )
            .unwrap();

        // A metade alta copiada resolve o mesmo mapeamento
        let user = AddressSpace::new_user(frames).unwrap();
        assert_eq!(user.translate(kva), Some(pa));
    }

    #[test]
    fn teardown_returns_tables_but_not_leaves() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let space = AddressSpace::new_user(frames).unwrap();

        let va = VirtAddr::new(0x40_0000);
        let pa = frames.allocate_frame().unwrap();
        space
            .map_page(
                va,
                pa,
                MapFlags::WRITABLE | MapFlags::USER | MapFlags::COMMIT_TABLES_NOW,
                frames,
            )
            .unwrap();

        // raiz + frame folha + L3 + L2 + L1
        assert_eq!(frames.allocated(), 5);

        space.teardown(frames).unwrap();
        // Devolve as 3 tabelas e a raiz; o frame folha pertence à região
        assert_eq!(frames.released(), 4);

        let (committed, active) = space.stats();
        assert_eq!(committed, 0);
        assert_eq!(active, 0);
    }

    #[test]
    fn teardown_returns_unmaterialized_commit_reservations() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let space = AddressSpace::new_user(frames).unwrap();

        // Três chunks commitados (6 MiB), só o primeiro materializado
        let base = VirtAddr::new(0x40_0000);
        space.commit_region_tables(base, 3 * 512, frames).unwrap();
        assert_eq!(frames.reserved(), 3);

        let pa = frames.allocate_frame().unwrap();
        space
            .map_page(base, pa, MapFlags::WRITABLE | MapFlags::USER, frames)
            .unwrap();
        // A materialização da L1 consumiu a reserva do chunk dela
        assert_eq!(frames.reserved(), 2);

        space.teardown(frames).unwrap();
        // Os dois chunks nunca materializados devolvem as reservas
        assert_eq!(frames.reserved(), 0);
    }

    #[test]
    fn teardown_refuses_kernel_spaces() {
        let _session = test_support::session();
        let frames = TestFrames::install();
        let kernel = test_support::boot_kernel_space(frames);

        assert_eq!(kernel.teardown(frames), Err(MmError::WrongSpace));
    }
}
