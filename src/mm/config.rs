//! # Configuração do Módulo de Memória
//!
//! Constantes de layout, paginação e política do subsistema de memória.

// =============================================================================
// CONSTANTES DE PAGINAÇÃO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Máscara para alinhar endereços a página
pub const PAGE_MASK: usize = !(PAGE_SIZE - 1);

/// Bits de offset dentro de uma página
pub const PAGE_OFFSET_BITS: usize = 12;

/// Entradas por tabela de página
pub const TABLE_ENTRIES: usize = 512;

/// Quanto endereço uma tabela L1 inteira cobre (2 MiB)
pub const L1_SPAN: u64 = (TABLE_ENTRIES * PAGE_SIZE) as u64;

// =============================================================================
// LAYOUT DE MEMÓRIA VIRTUAL
// =============================================================================
//
// Todas as faixas reservadas do kernel cabem numa única janela de commit
// de 512 GiB a partir de KERNEL_WINDOW_BASE. O espaço de usuário tem sua
// própria janela a partir de 0.
//

/// Base da janela de commit da metade do kernel
pub const KERNEL_WINDOW_BASE: u64 = 0xFFFF_9000_0000_0000;

/// Janela 1:1 sobre a memória física baixa (4 GiB)
pub const LOW_IDENTITY_BASE: u64 = 0xFFFF_9000_0000_0000;
pub const LOW_IDENTITY_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Descritores de core regions (65536 slots de 64 bytes)
pub const CORE_REGIONS_BASE: u64 = 0xFFFF_9001_0000_0000;
pub const CORE_REGION_SLOT_SIZE: u64 = 64;
pub const CORE_REGION_COUNT: u64 = 65536;
pub const CORE_REGIONS_SIZE: u64 = CORE_REGION_SLOT_SIZE * CORE_REGION_COUNT;

/// Core space: heap de objetos internos do kernel (16 GiB)
pub const CORE_SPACE_BASE: u64 = 0xFFFF_9002_0000_0000;
pub const CORE_SPACE_SIZE: u64 = 16 * 1024 * 1024 * 1024;

/// Kernel space: mapeamentos gerais do kernel (64 GiB)
pub const KERNEL_SPACE_BASE: u64 = 0xFFFF_9010_0000_0000;
pub const KERNEL_SPACE_SIZE: u64 = 64 * 1024 * 1024 * 1024;

/// Janela de módulos carregáveis (1 GiB)
pub const MODULES_BASE: u64 = 0xFFFF_9030_0000_0000;
pub const MODULES_SIZE: u64 = 1024 * 1024 * 1024;

/// Espaço de usuário: [USER_SPACE_START, USER_SPACE_END)
/// Página zero nunca é mapeável (null deref deve faltar).
pub const USER_SPACE_START: u64 = 0x1000;
pub const USER_SPACE_END: u64 = 0x0000_8000_0000_0000;

/// Base do heap do kernel (dentro do kernel space)
pub const HEAP_VIRT_BASE: u64 = KERNEL_SPACE_BASE;

/// Tamanho inicial do heap (16 MiB)
pub const HEAP_INITIAL_SIZE: usize = 16 * 1024 * 1024;

// =============================================================================
// JANELA DE COMMIT
// =============================================================================

/// Cobertura da janela de commit de um espaço (512 GiB)
pub const COMMIT_WINDOW_SIZE: u64 = 512 * 1024 * 1024 * 1024;

/// Um bit de commit por chunk de 2 MiB => 262144 bits => 4096 words
pub const COMMIT_BITMAP_WORDS: usize = (COMMIT_WINDOW_SIZE / L1_SPAN) as usize / 64;

// =============================================================================
// POLÍTICA DE TLB
// =============================================================================

/// Acima disso, flush total em vez de INVLPG por página
pub const SHOOTDOWN_FLUSH_THRESHOLD: usize = 1024;

// =============================================================================
// CONFIGURAÇÃO SMP
// =============================================================================

/// Número máximo de CPUs suportadas
pub const MAX_CPUS: usize = 64;

// =============================================================================
// FLAGS DE PAGE TABLE
// =============================================================================

/// Presente
pub const PTE_PRESENT: u64 = 1 << 0;

/// Escrita permitida
pub const PTE_WRITABLE: u64 = 1 << 1;

/// Acessível em user mode
pub const PTE_USER: u64 = 1 << 2;

/// Write-through
pub const PTE_WRITE_THROUGH: u64 = 1 << 3;

/// Cache disabled
pub const PTE_CACHE_DISABLE: u64 = 1 << 4;

/// Global (sobrevive a reload de CR3)
pub const PTE_GLOBAL: u64 = 1 << 8;

/// No Execute
pub const PTE_NO_EXECUTE: u64 = 1 << 63;

/// Máscara para extrair endereço físico de PTE
pub const PTE_ADDR_MASK: u64 = 0x000F_FFFF_FFFF_F000;

// =============================================================================
// FUNÇÕES UTILITÁRIAS
// =============================================================================

/// Alinha valor para cima ao múltiplo de align
#[inline(always)]
pub const fn align_up(val: usize, align: usize) -> usize {
    (val + align - 1) & !(align - 1)
}

/// Alinha valor para baixo ao múltiplo de align
#[inline(always)]
pub const fn align_down(val: usize, align: usize) -> usize {
    val & !(align - 1)
}

/// Verifica se valor está alinhado
#[inline(always)]
pub const fn is_aligned(val: usize, align: usize) -> bool {
    val & (align - 1) == 0
}
