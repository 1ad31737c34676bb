// =============================================================================
// ANVIL - Núcleo de Memória Virtual e Interrupções
// =============================================================================
//
// Biblioteca central do Anvil OS para x86_64:
// - Espaços de endereçamento (kernel, core, usuário) com commit de tabelas
// - Walker/mapper de 4 níveis
// - Page fault handler com roteamento por região
// - TLB shootdown coordenado via IPI
// - Dispatch de interrupções (exceções, IRQs legadas, MSI, timer, panic)
//
// O restante do sistema (drivers, scheduler, alocador físico, VMAs) é
// fornecido pelo kernel que embute esta crate, através dos traits em
// `mm::phys`, `mm::region` e `sched`.
//
// Em testes a crate compila para o host contra o backend simulado em
// `arch::sim` (mesmo mecanismo de seleção de plataforma usado para o
// backend real: alias `crate::arch::Cpu`).
//
// =============================================================================

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod core;
pub mod interrupts;
pub mod klib;
pub mod mm;
pub mod sched;
pub mod sync;

#[cfg(test)]
mod test_support;
