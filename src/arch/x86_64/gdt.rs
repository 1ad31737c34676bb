//! Seletores de Segmento
//!
//! A GDT em si é montada pelo kernel hospedeiro no boot; este núcleo só
//! precisa dos seletores para preencher a IDT e validar frames de
//! interrupção (cs/ss por ring).

/// Código do kernel (Ring 0)
pub const KERNEL_CODE_SEL: u16 = 0x08;
/// Dados/pilha do kernel (Ring 0)
pub const KERNEL_DATA_SEL: u16 = 0x10;
/// Dados/pilha de usuário (Ring 3, RPL=3)
pub const USER_DATA_SEL: u16 = 0x1B;
/// Código de usuário (Ring 3, RPL=3)
pub const USER_CODE_SEL: u16 = 0x23;
