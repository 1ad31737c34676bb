//! Interface Abstrata de Interrupções Inter-Processador.

pub trait IpiOps {
    /// Número de CPUs online
    fn cpu_count() -> usize;

    /// Índice da CPU atual
    fn current_cpu() -> usize;

    /// Envia `vector` para todas as OUTRAS CPUs.
    ///
    /// Retorna o número de CPUs para as quais a entrega foi confirmada.
    /// O chamador deve tratar `retorno < cpu_count() - 1` como falha
    /// parcial de entrega.
    fn broadcast(vector: u8) -> usize;

    /// Sinaliza fim de interrupção ao controlador (EOI).
    fn end_of_interrupt();
}
