//! Interface do Alocador Físico
//!
//! O alocador de frames (bitmap, buddy, zonas) pertence ao kernel
//! hospedeiro. Este núcleo só exige o contrato abaixo e SEMPRE recebe o
//! alocador por parâmetro explícito nas operações de mapeamento: quem
//! chama decide a ordem de locks, e o handler de page fault nunca
//! re-adquire um lock que o chamador já segura.

use crate::mm::addr::PhysAddr;

/// Fonte de frames físicos de 4 KiB
pub trait FrameSource: Sync {
    /// Reserva `count` frames para uso futuro, tudo-ou-nada.
    ///
    /// Não entrega frames: apenas garante que `allocate_frame` terá
    /// estoque. Retorna `false` sem efeito se não houver `count` frames.
    fn reserve(&self, count: usize) -> bool;

    /// Libera `count` unidades de reserva: ou a alocação reservada se
    /// materializou (a reserva virou o frame entregue), ou a reserva
    /// foi abandonada sem consumo (teardown do espaço).
    fn unreserve(&self, count: usize);

    /// Entrega um frame zerável.
    fn allocate_frame(&self) -> Option<PhysAddr>;

    /// Devolve um frame ao estoque.
    fn release_frame(&self, frame: PhysAddr);
}
