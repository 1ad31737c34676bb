//! Núcleo de infraestrutura do kernel

pub mod logging;
pub mod panic;
pub mod percpu;
pub mod state;
