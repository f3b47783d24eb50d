use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::decorator::run_decorated;
use crate::error::TaskResult;

/// Inverts the result of its child.
///
/// # Semantics
///
/// - If the child succeeds, the inverter fails
/// - If the child fails, the inverter succeeds
/// - A running child keeps the inverter running
///
/// This is analogous to a logical NOT (!) operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inverter;

impl<E: 'static> Behavior<E> for Inverter {
    fn name(&self) -> &'static str {
        "invert"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::DECORATOR
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        run_decorated(self, cx)
    }

    fn child_running(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        cx.running();
        Ok(())
    }

    fn child_success(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        cx.fail();
        Ok(())
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        cx.success();
        Ok(())
    }
}
