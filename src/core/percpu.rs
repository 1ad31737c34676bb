//! Flags por CPU
//!
//! Estado que o dispatch de interrupções consulta sem lock. Um slot por
//! CPU, indexado pelo id do core.

use core::sync::atomic::{AtomicBool, Ordering};

pub struct LocalCpu {
    /// CPU está dentro de um handler de IRQ de dispositivo
    pub in_irq: AtomicBool,
    /// Scheduler desta CPU já pode receber yields do timer
    pub scheduler_ready: AtomicBool,
    /// Troca de contexto pendente para a saída da interrupção
    pub switch_pending: AtomicBool,
}

impl LocalCpu {
    pub const fn new() -> Self {
        Self {
            in_irq: AtomicBool::new(false),
            scheduler_ready: AtomicBool::new(false),
            switch_pending: AtomicBool::new(false),
        }
    }

    pub fn in_irq(&self) -> bool {
        self.in_irq.load(Ordering::Relaxed)
    }

    pub fn set_in_irq(&self, value: bool) {
        self.in_irq.store(value, Ordering::Relaxed);
    }

    pub fn scheduler_ready(&self) -> bool {
        self.scheduler_ready.load(Ordering::Relaxed)
    }

    pub fn set_scheduler_ready(&self, value: bool) {
        self.scheduler_ready.store(value, Ordering::Relaxed);
    }

    pub fn take_switch_pending(&self) -> bool {
        self.switch_pending.swap(false, Ordering::Relaxed)
    }

    pub fn set_switch_pending(&self) {
        self.switch_pending.store(true, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn reset(&self) {
        self.in_irq.store(false, Ordering::Relaxed);
        self.scheduler_ready.store(false, Ordering::Relaxed);
        self.switch_pending.store(false, Ordering::Relaxed);
    }
}
