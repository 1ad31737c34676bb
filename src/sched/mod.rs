//! Interface do Scheduler
//!
//! O scheduler real (tasks, filas, prioridades) pertence ao kernel
//! hospedeiro. O dispatch de interrupções só precisa deste contrato:
//! gatilho de yield no timer, o espaço de usuário corrente para o fault
//! handler e a entrega de exceções a threads de usuário.

use alloc::sync::Arc;

use crate::interrupts::context::InterruptContext;
use crate::mm::vas::AddressSpace;

pub trait Scheduler: Sync {
    /// O scheduler global já começou a agendar?
    fn started(&self) -> bool;

    /// Cede a CPU a partir de um trap. Pode trocar de pilha e não
    /// retornar ao mesmo ponto; quando retorna, `ctx` é o contexto que
    /// o `iretq` deve restaurar — possivelmente o de OUTRA thread, de
    /// qualquer ring, sempre no layout uniforme de cauda (o dispatch
    /// desnormaliza pelo ring do frame devolvido).
    fn yield_from_interrupt(&self, ctx: &mut InterruptContext);

    /// Espaço de usuário que deve resolver faults da thread corrente.
    /// Já considera o override temporário usado em cópias entre
    /// processos.
    fn current_user_space(&self) -> Option<Arc<AddressSpace>>;

    /// Entrega uma exceção de usuário irresolvida à thread faltosa
    /// (sinal, término — política externa).
    fn deliver_user_fault(&self, ctx: &InterruptContext);
}
