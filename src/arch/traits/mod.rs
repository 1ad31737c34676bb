//! Contratos da camada de arquitetura

pub mod cpu;
pub mod ipi;
pub mod mmu;

pub use cpu::CpuOps;
pub use ipi::IpiOps;
pub use mmu::MmuOps;
