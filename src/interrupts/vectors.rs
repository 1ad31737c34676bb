//! Mapa de Vetores
//!
//! Particionamento fixo dos 256 vetores da IDT:
//!
//! - 0x00-0x1F: exceções da CPU
//! - 0x20-0x2F: faixa do PIC legado remapeado (só espúrios chegam aqui)
//! - 0x30:      limiar de EOI (>= isto recebe EOI no fim do dispatch)
//! - 0x50-0x5F: IRQs legadas (linha 0-15)
//! - 0x70-0xAF: slots de MSI
//! - 0xFC:      timer (reschedule)
//! - 0xFD:      TLB shootdown
//! - 0xFE:      pânico (estacionar CPU)
//! - 0xFF:      espúrio do APIC

pub const EXCEPTION_END: u8 = 0x20;
pub const PAGE_FAULT_VECTOR: u8 = 14;

pub const PIC_SPURIOUS_START: u8 = 0x20;
pub const PIC_SPURIOUS_END: u8 = 0x30;

/// Vetores >= isto recebem EOI ao final do dispatch
pub const EOI_THRESHOLD: u8 = 0x30;

pub const IRQ_BASE: u8 = 0x50;
pub const IRQ_COUNT: u8 = 16;

pub const MSI_BASE: u8 = 0x70;
pub const MSI_COUNT: u8 = 64;

pub const TIMER_VECTOR: u8 = 0xFC;
pub const TLB_SHOOTDOWN_VECTOR: u8 = 0xFD;
pub const PANIC_VECTOR: u8 = 0xFE;
pub const APIC_SPURIOUS_VECTOR: u8 = 0xFF;

/// Classificação de um vetor para o dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorClass {
    /// Exceção da CPU (vetor < 0x20)
    Exception,
    /// Espúrio do PIC legado: ignorar, sem EOI
    PicSpurious,
    /// Espúrio do APIC: ignorar (EOI sai pela regra do limiar)
    ApicSpurious,
    /// IRQ legada, com o número da linha
    Irq(u8),
    /// MSI, com o índice do slot
    Msi(u8),
    Timer,
    TlbShootdown,
    Panic,
    /// Vetor fora de qualquer faixa atribuída
    Unknown,
}

/// Classifica um vetor. Total: todo u8 cai em exatamente uma classe.
pub fn classify(vector: u8) -> VectorClass {
    match vector {
        0x00..=0x1F => VectorClass::Exception,
        0x20..=0x2F => VectorClass::PicSpurious,
        v if v >= IRQ_BASE && v < IRQ_BASE + IRQ_COUNT => VectorClass::Irq(v - IRQ_BASE),
        v if v >= MSI_BASE && v < MSI_BASE + MSI_COUNT => VectorClass::Msi(v - MSI_BASE),
        TIMER_VECTOR => VectorClass::Timer,
        TLB_SHOOTDOWN_VECTOR => VectorClass::TlbShootdown,
        PANIC_VECTOR => VectorClass::Panic,
        APIC_SPURIOUS_VECTOR => VectorClass::ApicSpurious,
        _ => VectorClass::Unknown,
    }
}

// =============================================================================
// TESTES
// =============================================================================
