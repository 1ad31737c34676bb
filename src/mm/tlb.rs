//! Coordenador de TLB Shootdown
//!
//! Depois de qualquer remoção/downgrade de mapeamento, nenhuma CPU pode
//! continuar usando a tradução velha. Protocolo serializado: UM pedido
//! em voo no sistema inteiro, publicado em estado global e confirmado
//! por contagem atômica de acks.
//!
//! O portão é um spin-gate, não um mutex que dorme: o iniciador espera
//! com interrupções HABILITADAS, porque precisa continuar atendendo os
//! IPIs de shootdown de outro iniciador enquanto espera a vez dele.
//! A espera não tem timeout: CPU remota travada durante shootdown já é
//! condição fatal do sistema.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::arch::traits::{IpiOps, MmuOps};
use crate::core::panic::kernel_fatal;
use crate::interrupts::vectors::TLB_SHOOTDOWN_VECTOR;
use crate::mm::addr::VirtAddr;
use crate::mm::config::{PAGE_SIZE, SHOOTDOWN_FLUSH_THRESHOLD};

pub struct TlbShootdown {
    /// Portão global: true enquanto um pedido está em voo
    gate: AtomicBool,
    /// Base da faixa publicada
    base: AtomicU64,
    /// Páginas da faixa publicada
    pages: AtomicUsize,
    /// CPUs remotas que ainda não confirmaram
    remaining: AtomicUsize,
}

impl TlbShootdown {
    pub const fn new() -> Self {
        Self {
            gate: AtomicBool::new(false),
            base: AtomicU64::new(0),
            pages: AtomicUsize::new(0),
            remaining: AtomicUsize::new(0),
        }
    }

    /// Invalida a faixa em TODAS as CPUs. Síncrono: quando retorna,
    /// nenhuma CPU tem tradução para a faixa. Nunca falha — espera.
    pub fn invalidate_range(&self, base: VirtAddr, page_count: usize) {
        if page_count == 0 {
            return;
        }

        // Adquirir o portão (interrupções seguem habilitadas)
        while self.gate.swap(true, Ordering::Acquire) {
            core::hint::spin_loop();
        }

        self.base.store(base.as_u64(), Ordering::SeqCst);
        self.pages.store(page_count, Ordering::SeqCst);

        let others = crate::arch::Cpu::cpu_count().saturating_sub(1);
        if others > 0 {
            self.remaining.store(others, Ordering::SeqCst);

            let delivered = crate::arch::Cpu::broadcast(TLB_SHOOTDOWN_VECTOR);
            let missed = others - delivered.min(others);
            if missed > 0 {
                // Só CPUs alcançáveis entram na espera
                crate::kwarn!("(TLB) IPIs não entregues: ", missed as u64);
                let prev = self.remaining.fetch_sub(missed, Ordering::SeqCst);
                if prev < missed {
                    kernel_fatal("(TLB) contador de acks estourou no desconto");
                }
            }

            while self.remaining.load(Ordering::SeqCst) > 0 {
                core::hint::spin_loop();
            }
        }

        // Invalidação local do iniciador, depois de todos os acks
        local_invalidate(base, page_count);

        self.gate.store(false, Ordering::Release);
    }

    /// Handler do IPI de shootdown, rodando na CPU remota.
    ///
    /// Invalida localmente a faixa publicada e confirma. Chegar aqui sem
    /// pedido pendente é violação fatal.
    pub fn shootdown_ipi(&self) {
        let base = VirtAddr::new(self.base.load(Ordering::SeqCst));
        let pages = self.pages.load(Ordering::SeqCst);

        local_invalidate(base, pages);

        let prev = self.remaining.fetch_sub(1, Ordering::SeqCst);
        if prev == 0 {
            kernel_fatal("(TLB) IPI de shootdown sem pedido pendente");
        }
    }

    /// Publica um pedido como se outro core o tivesse iniciado, para
    /// exercitar o lado receptor do protocolo.
    #[cfg(test)]
    pub(crate) fn begin_remote_request_for_test(&self, base: u64, pages: usize, remaining: usize) {
        self.gate.store(true, Ordering::SeqCst);
        self.base.store(base, Ordering::SeqCst);
        self.pages.store(pages, Ordering::SeqCst);
        self.remaining.store(remaining, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn reset_for_test(&self) {
        self.gate.store(false, Ordering::SeqCst);
        self.base.store(0, Ordering::SeqCst);
        self.pages.store(0, Ordering::SeqCst);
        self.remaining.store(0, Ordering::SeqCst);
    }
}

/// Política local: acima do limiar, flush total sai mais barato que o
/// loop de INVLPG.
fn local_invalidate(base: VirtAddr, page_count: usize) {
    if page_count > SHOOTDOWN_FLUSH_THRESHOLD {
        crate::arch::Cpu::flush_tlb();
    } else {
        for i in 0..page_count {
            crate::arch::Cpu::invalidate_page(base.add((i * PAGE_SIZE) as u64));
        }
    }
}

// =============================================================================
// TESTES
// =============================================================================
