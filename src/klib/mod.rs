//! Biblioteca utilitária do kernel

pub mod bitmap;

pub use bitmap::FixedBitmap;
