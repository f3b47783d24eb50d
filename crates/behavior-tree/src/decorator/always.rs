use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::decorator::run_decorated;
use crate::error::TaskResult;

/// Succeeds once its child finishes, whatever the child's result.
///
/// Useful for optional behaviors that shouldn't make a sequence fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSucceed;

impl<E: 'static> Behavior<E> for AlwaysSucceed {
    fn name(&self) -> &'static str {
        "alwaysSucceed"
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
        cx.success();
        Ok(())
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        cx.success();
        Ok(())
    }
}

/// Fails once its child finishes, whatever the child's result.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFail;

impl<E: 'static> Behavior<E> for AlwaysFail {
    fn name(&self) -> &'static str {
        "alwaysFail"
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
        cx.fail();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::tests::{Decrement, Increment, TestContext};
    use crate::{BehaviorTree, Status, Task};

    fn run<B: Behavior<TestContext> + 'static>(decorator: B, child: Task<TestContext>, value: i32) -> (Status, i32) {
        let root = Task::new(decorator).with_child(child).unwrap();
        let mut tree = BehaviorTree::with_root(root).with_object(TestContext { value });
        tree.step().unwrap();
        (tree.status(), tree.object().map_or(0, |ctx| ctx.value))
    }

    #[test]
    fn always_succeed_on_success() {
        assert_eq!(run(AlwaysSucceed, Task::new(Increment), 0), (Status::Succeeded, 1));
    }

    #[test]
    fn always_succeed_on_failure() {
        // Child still executed
        assert_eq!(run(AlwaysSucceed, Task::new(Decrement), 0), (Status::Succeeded, -1));
    }

    #[test]
    fn always_fail_on_success() {
        assert_eq!(run(AlwaysFail, Task::new(Increment), 0), (Status::Failed, 1));
    }
}
