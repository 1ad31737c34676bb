//! Bitmap de tamanho fixo
//!
//! Usado pelo VAS para rastrear chunks de 2 MiB com tabelas L1 commitadas.
//! Armazenamento inline (const generic), sem alocação.

/// Bitmap de `WORDS * 64` bits com armazenamento inline
pub struct FixedBitmap<const WORDS: usize> {
    words: [u64; WORDS],
}

impl<const WORDS: usize> FixedBitmap<WORDS> {
    /// Número total de bits
    pub const BITS: usize = WORDS * 64;

    /// Cria bitmap com todos os bits zerados
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Marca o bit `index`
    ///
    /// Retorna `false` se fora dos limites.
    pub fn set(&mut self, index: usize) -> bool {
        if index >= Self::BITS {
            return false;
        }
        self.words[index / 64] |= 1u64 << (index % 64);
        true
    }

    /// Limpa o bit `index`
    pub fn clear(&mut self, index: usize) -> bool {
        if index >= Self::BITS {
            return false;
        }
        self.words[index / 64] &= !(1u64 << (index % 64));
        true
    }

    /// Testa o bit `index` (fora dos limites = false)
    pub fn test(&self, index: usize) -> bool {
        if index >= Self::BITS {
            return false;
        }
        self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Conta bits ZERADOS no intervalo `[start, end)`
    ///
    /// É o número de chunks que ainda precisam de commit.
    pub fn count_zeros_in_range(&self, start: usize, end: usize) -> usize {
        let end = end.min(Self::BITS);
        let mut zeros = 0;
        for i in start..end {
            if !self.test(i) {
                zeros += 1;
            }
        }
        zeros
    }

    /// Marca todos os bits no intervalo `[start, end)`
    pub fn set_range(&mut self, start: usize, end: usize) {
        let end = end.min(Self::BITS);
        for i in start..end {
            self.set(i);
        }
    }

    /// Limpa todos os bits
    pub fn clear_all(&mut self) {
        self.words = [0; WORDS];
    }

    /// Total de bits marcados
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

// =============================================================================
// TESTES
// =============================================================================
