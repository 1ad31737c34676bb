//! Primitivas de Sincronização
//!
//! - `Spinlock`: busy-wait com interrupções desabilitadas na seção crítica.
//!   Seguro dentro de handlers de interrupção.
//! - `Mutex`: lock estrutural do VAS. Hoje faz spin (com interrupções
//!   habilitadas); o scheduler externo pode bloquear em cima de `is_locked`.

pub mod mutex;
pub mod spinlock;

pub use mutex::{Mutex, MutexGuard};
pub use spinlock::{Spinlock, SpinlockGuard};
