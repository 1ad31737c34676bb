//! Camada de Arquitetura (HAL)
//!
//! Traits em `traits/` definem o contrato; cada backend implementa.
//! O resto do kernel usa apenas o alias `crate::arch::Cpu`.
//!
//! - `x86_64/`: backend real (inline asm, LAPIC, IDT, stubs)
//! - `sim`:     backend simulado para builds de host e testes

pub mod traits;

#[cfg(target_arch = "x86_64")]
pub mod x86_64;

#[cfg(any(test, not(target_arch = "x86_64")))]
pub mod sim;

#[cfg(all(target_arch = "x86_64", not(test)))]
pub use x86_64::cpu::X64Cpu as Cpu;

#[cfg(any(test, not(target_arch = "x86_64")))]
pub use sim::SimCpu as Cpu;
