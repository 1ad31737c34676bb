//! Tabelas de Handlers de Dispositivo
//!
//! Registro de IRQs legadas e MSIs exposto aos drivers. Ambas as
//! tabelas vivem sob spinlock, mas o dispatch SOLTA o lock em volta de
//! cada invocação de handler: o callback pode demorar e pode ele mesmo
//! registrar/desregistrar interrupções sem deadlock.
//!
//! Um handler que precise de troca de thread marca a flag por-CPU
//! (`KERNEL.this_cpu().set_switch_pending()`); o dispatch cede depois
//! do EOI.

use crate::interrupts::vectors::{MSI_BASE, MSI_COUNT};
use crate::sync::Spinlock;

/// Callback de dispositivo: recebe o contexto opaco registrado e
/// retorna se o dispositivo dele realmente gerou a interrupção.
pub type IrqHandler = fn(context: usize) -> bool;

pub const MAX_IRQ_HANDLERS: usize = 64;

/// Registro de uma linha de IRQ legada
#[derive(Clone, Copy)]
pub struct IrqSlot {
    /// Linha 0-15, ou -1 para handlers de linha compartilhada por PCI
    /// (sondados em qualquer fault das linhas 9-11)
    pub line: i16,
    pub handler: IrqHandler,
    pub context: usize,
}

pub struct IrqTable {
    slots: Spinlock<[Option<IrqSlot>; MAX_IRQ_HANDLERS]>,
}

impl IrqTable {
    pub const fn new() -> Self {
        Self {
            slots: Spinlock::new([None; MAX_IRQ_HANDLERS]),
        }
    }

    /// Registra um handler. `false` se a tabela está cheia.
    pub fn register(&self, line: i16, handler: IrqHandler, context: usize) -> bool {
        if !(-1..16).contains(&line) {
            return false;
        }
        let mut slots = self.slots.lock();
        for slot in slots.iter_mut() {
            if slot.is_none() {
                *slot = Some(IrqSlot {
                    line,
                    handler,
                    context,
                });
                return true;
            }
        }
        crate::kwarn!("(IRQ) tabela de handlers cheia");
        false
    }

    /// Remove o registro que casa com (line, context).
    pub fn unregister(&self, line: i16, context: usize) -> bool {
        let mut slots = self.slots.lock();
        for slot in slots.iter_mut() {
            if let Some(s) = slot {
                if s.line == line && s.context == context {
                    *slot = None;
                    return true;
                }
            }
        }
        false
    }

    /// Cópia do slot `index` (lock adquirido e solto aqui dentro)
    pub(crate) fn slot(&self, index: usize) -> Option<IrqSlot> {
        self.slots.lock()[index]
    }

    #[cfg(test)]
    pub(crate) fn clear_all(&self) {
        *self.slots.lock() = [None; MAX_IRQ_HANDLERS];
    }
}

/// Resultado de um registro de MSI: o que o driver programa no device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsiRegistration {
    pub vector: u8,
    /// Endereço da mensagem MSI (janela do LAPIC)
    pub address: u64,
    /// Payload da mensagem (carrega o vetor)
    pub data: u64,
}

#[derive(Clone, Copy)]
pub struct MsiSlot {
    pub handler: IrqHandler,
    pub context: usize,
}

pub struct MsiTable {
    slots: Spinlock<[Option<MsiSlot>; MSI_COUNT as usize]>,
}

impl MsiTable {
    pub const fn new() -> Self {
        Self {
            slots: Spinlock::new([None; MSI_COUNT as usize]),
        }
    }

    /// Aloca um slot livre e devolve o par endereço/dados para o driver
    /// programar no dispositivo. `None` se todos os vetores estão em uso.
    pub fn register(&self, handler: IrqHandler, context: usize) -> Option<MsiRegistration> {
        let mut slots = self.slots.lock();
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(MsiSlot { handler, context });
                let vector = MSI_BASE + i as u8;
                return Some(MsiRegistration {
                    vector,
                    address: 0xFEE0_0000,
                    data: vector as u64,
                });
            }
        }
        crate::kwarn!("(MSI) sem vetores livres");
        None
    }

    /// Libera o slot do vetor.
    pub fn unregister(&self, vector: u8) -> bool {
        if vector < MSI_BASE || vector >= MSI_BASE + MSI_COUNT {
            return false;
        }
        let mut slots = self.slots.lock();
        let index = (vector - MSI_BASE) as usize;
        let was = slots[index].is_some();
        slots[index] = None;
        was
    }

    /// Cópia do slot do vetor (lock adquirido e solto aqui dentro)
    pub(crate) fn slot(&self, index: usize) -> Option<MsiSlot> {
        if index >= MSI_COUNT as usize {
            return None;
        }
        self.slots.lock()[index]
    }

    #[cfg(test)]
    pub(crate) fn clear_all(&self) {
        *self.slots.lock() = [None; MSI_COUNT as usize];
    }
}
