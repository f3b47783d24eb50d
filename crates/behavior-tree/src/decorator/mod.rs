//! Decorator tasks.
//!
//! Decorators wrap a single child and modify its result or how often it
//! runs. Loop decorators ([`UntilFail`], [`UntilSuccess`], [`Repeat`]) re-run
//! their child within the same step for as long as their
//! [`LoopDecorator::condition`] holds.

mod always;
mod include;
mod inverter;
mod random;
mod repeat;
mod semaphore_guard;
mod until;

use crate::behavior::Behavior;
use crate::context::TaskContext;
use crate::error::TaskResult;

pub use always::{AlwaysFail, AlwaysSucceed};
pub use include::Include;
pub use inverter::Inverter;
pub use random::Random;
pub use repeat::Repeat;
pub use semaphore_guard::SemaphoreGuard;
pub use until::{UntilFail, UntilSuccess};

/// Runs the single child and hands its report to the decorator.
pub(crate) fn run_decorated<E, B>(owner: &mut B, cx: &mut TaskContext<'_, E>) -> TaskResult<()>
where
    E: 'static,
    B: Behavior<E> + ?Sized,
{
    let report = cx.run_child(0)?;
    owner.deliver(cx, 0, report)
}

/// Decorator that re-runs its child while a condition holds.
///
/// The loop flag is per-execution state: it is raised at the start of every
/// run, dropped by handlers that end the loop, and never copied into clones.
pub trait LoopDecorator {
    fn looping(&self) -> bool;

    fn set_looping(&mut self, looping: bool);

    fn condition(&self) -> bool {
        self.looping()
    }
}

pub(crate) fn run_loop<E, L>(owner: &mut L, cx: &mut TaskContext<'_, E>) -> TaskResult<()>
where
    E: 'static,
    L: Behavior<E> + LoopDecorator + ?Sized,
{
    owner.set_looping(true);
    while owner.condition() {
        let Some(report) = cx.run_child(0)? else {
            break;
        };
        owner.deliver(cx, 0, Some(report))?;
    }
    Ok(())
}

/// A child that is still running ends the loop for this step.
pub(crate) fn loop_child_running<E, L>(owner: &mut L, cx: &mut TaskContext<'_, E>) -> TaskResult<()>
where
    E: 'static,
    L: LoopDecorator + ?Sized,
{
    owner.set_looping(false);
    cx.running();
    Ok(())
}
