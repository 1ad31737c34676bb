//! Pânico do Kernel
//!
//! Caminho único para violações internas irrecuperáveis: relatório em
//! todos os sinks de diagnóstico, IPI de pânico para estacionar as
//! outras CPUs e halt definitivo.

use crate::arch::traits::{CpuOps, IpiOps};
use crate::core::state::KERNEL;
use crate::interrupts::context::InterruptContext;
use crate::interrupts::vectors::PANIC_VECTOR;

/// Quantos spins esperar pelos acks das outras CPUs antes de desistir
const PANIC_ACK_SPINS: usize = 1_000_000;

/// Violação interna irrecuperável. Nunca retorna.
pub fn kernel_fatal(msg: &str) -> ! {
    fatal_with_context(msg, None)
}

/// Como `kernel_fatal`, com dump do frame de interrupção.
pub fn fatal_with_context(msg: &str, ctx: Option<&InterruptContext>) -> ! {
    use core::sync::atomic::Ordering;

    // Pânico dentro do pânico: parar já, sem tocar em mais nada
    if KERNEL.panicking.swap(true, Ordering::SeqCst) {
        crate::arch::Cpu::hang();
    }

    crate::arch::Cpu::disable_interrupts();

    crate::kerror!("(FATAL) Violação interna do kernel");
    crate::kerror!(msg);

    if let Some(ctx) = ctx {
        dump_context(ctx);
    }

    let others = crate::arch::Cpu::cpu_count().saturating_sub(1);
    if others > 0 {
        let delivered = crate::arch::Cpu::broadcast(PANIC_VECTOR);
        let mut spins = 0;
        while KERNEL.panic_acks.load(Ordering::SeqCst) < delivered && spins < PANIC_ACK_SPINS {
            core::hint::spin_loop();
            spins += 1;
        }
        crate::klog!("(FATAL) CPUs estacionadas: ");
        crate::klog!("", KERNEL.panic_acks.load(Ordering::SeqCst) as u64);
        crate::knl!();
    }

    crate::arch::Cpu::hang()
}

/// Dump do frame salvo pelos stubs
fn dump_context(ctx: &InterruptContext) {
    crate::klog!("  VEC=", ctx.vector, " ERR=", ctx.error_code);
    crate::knl!();
    crate::klog!("  RIP=", ctx.rip, " RSP=", ctx.rsp);
    crate::knl!();
    crate::klog!("  CS =", ctx.cs as u64, " SS =", ctx.ss as u64);
    crate::knl!();
    crate::klog!("  RFL=", ctx.rflags, " RBP=", ctx.rbp);
    crate::knl!();
    crate::klog!("  RAX=", ctx.rax, " RBX=", ctx.rbx);
    crate::knl!();
    crate::klog!("  RCX=", ctx.rcx, " RDX=", ctx.rdx);
    crate::knl!();
    crate::klog!("  RSI=", ctx.rsi, " RDI=", ctx.rdi);
    crate::knl!();
    crate::klog!("  R8 =", ctx.r8, " R9 =", ctx.r9);
    crate::knl!();
    crate::klog!("  R10=", ctx.r10, " R11=", ctx.r11);
    crate::knl!();
    crate::klog!("  R12=", ctx.r12, " R13=", ctx.r13);
    crate::knl!();
    crate::klog!("  R14=", ctx.r14, " R15=", ctx.r15);
    crate::knl!();
}

/// Panic handler de linguagem para builds bare-metal.
///
/// Sem core::fmt: emitimos arquivo e linha crus e paramos pelo mesmo
/// caminho de `kernel_fatal`.
#[cfg(all(target_os = "none", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    use core::sync::atomic::Ordering;

    if KERNEL.panicking.swap(true, Ordering::SeqCst) {
        crate::arch::Cpu::hang();
    }

    crate::arch::Cpu::disable_interrupts();
    crate::kerror!("(PANIC) panic de linguagem");
    if let Some(location) = info.location() {
        crate::klog!("  em ");
        crate::klog!(location.file());
        crate::klog!(":", location.line() as u64);
        crate::knl!();
    }

    if crate::arch::Cpu::cpu_count() > 1 {
        let _ = crate::arch::Cpu::broadcast(PANIC_VECTOR);
    }

    crate::arch::Cpu::hang()
}
