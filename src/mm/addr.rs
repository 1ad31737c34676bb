//! Endereços Tipados
//!
//! Wrappers transparentes para separar endereços físicos de virtuais no
//! sistema de tipos, mais a tradução físico→virtual pela janela de
//! mapeamento direto (HHDM).

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::mm::config::{align_down, align_up, is_aligned};

/// Offset do mapeamento direto físico→virtual.
///
/// Zero (identity map) até o kernel hospedeiro informar a base real da
/// HHDM. Em testes de host o zero faz ponteiros de heap funcionarem
/// diretamente como "frames".
static DIRECT_MAP_OFFSET: AtomicU64 = AtomicU64::new(0);

/// Define a base da janela de mapeamento direto
pub fn set_direct_map_offset(offset: u64) {
    DIRECT_MAP_OFFSET.store(offset, Ordering::SeqCst);
}

/// Traduz um endereço físico para seu alias na janela direta
#[inline]
pub fn phys_to_virt(addr: PhysAddr) -> VirtAddr {
    VirtAddr::new(addr.as_u64() + DIRECT_MAP_OFFSET.load(Ordering::Relaxed))
}

/// Endereço físico (wrapper type-safe)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Adiciona offset
    #[inline]
    pub fn add(self, offset: u64) -> Self {
        Self(self.0 + offset)
    }

    #[inline]
    pub fn is_aligned(self, align: u64) -> bool {
        is_aligned(self.0 as usize, align as usize)
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysAddr({:#x})", self.0)
    }
}

/// Endereço virtual (wrapper type-safe)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(u64);

impl VirtAddr {
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Retorna ponteiro raw const
    #[inline]
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// Retorna ponteiro raw mut
    #[inline]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }

    /// Alinha para baixo
    #[inline]
    pub fn align_down(self, align: u64) -> Self {
        Self(align_down(self.0 as usize, align as usize) as u64)
    }

    /// Alinha para cima
    #[inline]
    pub fn align_up(self, align: u64) -> Self {
        Self(align_up(self.0 as usize, align as usize) as u64)
    }

    /// Verifica alinhamento
    #[inline]
    pub fn is_aligned(self, align: u64) -> bool {
        is_aligned(self.0 as usize, align as usize)
    }

    /// Adiciona offset
    #[inline]
    pub fn add(self, offset: u64) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#x})", self.0)
    }
}

impl fmt::LowerHex for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
