//! Contexto de Interrupção
//!
//! Snapshot dos registradores salvo pelos stubs, na ordem exata de push
//! (campo mais baixo = último push). O layout é ABI com `stubs.rs`: não
//! reordenar campos.
//!
//! # Os dois layouts da cauda
//!
//! Quando o trap interrompe ring 0, o hardware não troca de pilha e a
//! cauda do frame fica com `rsp`/`ss` na ordem oposta à do caso ring 3.
//! Em vez de reinterpretação de campos no lugar, a normalização é uma
//! função explícita e involutiva (`swap_ring0_tail`): o dispatch aplica
//! na entrada para obter o layout uniforme estilo ring 3 e reaplica na
//! saída para devolver o layout que o `iretq` do stub espera.

use crate::mm::config::USER_SPACE_END;

/// Seletores esperados no frame, por ring
pub const KERNEL_CS: u64 = 0x08;
pub const KERNEL_SS: u64 = 0x10;
pub const USER_SS: u64 = 0x1B;
pub const USER_CS: u64 = 0x23;

/// Base canônica da metade alta (código de kernel vive acima disto)
const KERNEL_HALF_BASE: u64 = 0xFFFF_8000_0000_0000;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptContext {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rbp: u64,
    /// Vetor empilhado pelo stub
    pub vector: u64,
    /// Error code do hardware (ou zero sintético)
    pub error_code: u64,
    // Cauda empilhada pelo hardware
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

impl InterruptContext {
    /// O trap interrompeu código de ring 0?
    #[inline]
    pub fn from_ring0(&self) -> bool {
        self.cs & 0x3 == 0
    }

    /// Normaliza a cauda ring 0 para o layout uniforme (e vice-versa).
    ///
    /// Involutiva: aplicar duas vezes devolve o contexto original
    /// byte a byte.
    pub fn swap_ring0_tail(&mut self) {
        core::mem::swap(&mut self.rsp, &mut self.ss);
    }

    /// Checagem de consistência antes de todo retorno de trap:
    /// seletores e RIP têm que bater com o ring declarado.
    pub fn sanity_check(&self) -> bool {
        if self.from_ring0() {
            self.cs == KERNEL_CS && self.ss == KERNEL_SS && self.rip >= KERNEL_HALF_BASE
        } else {
            self.cs == USER_CS && self.ss == USER_SS && self.rip < USER_SPACE_END
        }
    }
}

// =============================================================================
// TESTES
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ring0_context() -> InterruptContext {
        InterruptContext {
            rax: 0x1111,
            rbx: 0x2222,
            rcx: 0x3333,
            rdx: 0x4444,
            rsi: 0x5555,
            rdi: 0x6666,
            r8: 0x7777,
            r9: 0x8888,
            r10: 0x9999,
            r11: 0xAAAA,
            r12: 0xBBBB,
            r13: 0xCCCC,
            r14: 0xDDDD,
            r15: 0xEEEE,
            rbp: 0xF0F0,
            vector: 14,
            error_code: 0x2,
            rip: 0xFFFF_9010_0000_1234,
            cs: KERNEL_CS,
            rflags: 0x202,
            rsp: 0xFFFF_9010_0020_0000,
            ss: KERNEL_SS,
        }
    }

    #[test]
    fn tail_swap_is_its_own_inverse() {
        let original = ring0_context();
        let mut ctx = original;
        ctx.swap_ring0_tail();
        assert_ne!(ctx, original);
        ctx.swap_ring0_tail();
        assert_eq!(ctx, original);
    }

    #[test]
    fn sanity_accepts_wellformed_rings() {
        let ctx = ring0_context();
        assert!(ctx.sanity_check());

        let mut user = ctx;
        user.cs = USER_CS;
        user.ss = USER_SS;
        user.rip = 0x40_0000;
        assert!(user.sanity_check());
    }

    #[test]
    fn sanity_rejects_mismatched_selectors() {
        let mut ctx = ring0_context();
        ctx.ss = USER_SS;
        assert!(!ctx.sanity_check());

        let mut low_rip = ring0_context();
        low_rip.rip = 0x1000;
        assert!(!low_rip.sanity_check());

        let mut user_high = ring0_context();
        user_high.cs = USER_CS;
        user_high.ss = USER_SS;
        user_high.rip = 0xFFFF_9010_0000_0000;
        assert!(!user_high.sanity_check());
    }
}
