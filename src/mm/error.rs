//! Tipos de Erro do Subsistema de Memória
//!
//! Define erros estruturados para diagnóstico preciso de falhas em MM.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Sem memória física disponível (OOM)
    OutOfMemory,
    /// Endereço inválido (não canônico ou fora de range)
    InvalidAddress,
    /// Endereço não alinhado a página
    NotAligned,
    /// Tamanho inválido (zero ou muito grande)
    InvalidSize,
    /// Região já mapeada
    AlreadyMapped,
    /// Região não mapeada
    NotMapped,
    /// Tabelas intermediárias não commitadas para a faixa
    NotCommitted,
    /// Fora da janela de commit do espaço
    OutOfBounds,
    /// Operação não pertence a este tipo de espaço
    WrongSpace,
    /// Falha na inicialização
    InitFailed,
    /// Parâmetro inválido
    InvalidParameter,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: sem frames físicos disponíveis",
            Self::InvalidAddress => "Endereço inválido",
            Self::NotAligned => "Endereço não alinhado a página",
            Self::InvalidSize => "Tamanho inválido",
            Self::AlreadyMapped => "Região já mapeada",
            Self::NotMapped => "Região não mapeada",
            Self::NotCommitted => "Tabelas não commitadas para a faixa",
            Self::OutOfBounds => "Fora da janela de commit",
            Self::WrongSpace => "Operação não pertence a este espaço",
            Self::InitFailed => "Falha na inicialização",
            Self::InvalidParameter => "Parâmetro inválido",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
