use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::decorator::{LoopDecorator, loop_child_running, run_loop};
use crate::error::TaskResult;

/// Re-runs its child until the child fails, then succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntilFail {
    looping: bool,
}

impl UntilFail {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoopDecorator for UntilFail {
    fn looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}

impl<E: 'static> Behavior<E> for UntilFail {
    fn name(&self) -> &'static str {
        "untilFail"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::DECORATOR
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        run_loop(self, cx)
    }

    fn child_running(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        loop_child_running(self, cx)
    }

    fn child_success(&mut self, _cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.looping = true;
        Ok(())
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        cx.success();
        self.looping = false;
        Ok(())
    }

    fn reset_task(&mut self) {
        self.looping = false;
    }
}

/// Re-runs its child until the child succeeds, then succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntilSuccess {
    looping: bool,
}

impl UntilSuccess {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoopDecorator for UntilSuccess {
    fn looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}

impl<E: 'static> Behavior<E> for UntilSuccess {
    fn name(&self) -> &'static str {
        "untilSuccess"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::DECORATOR
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        run_loop(self, cx)
    }

    fn child_running(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        loop_child_running(self, cx)
    }

    fn child_success(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        cx.success();
        self.looping = false;
        Ok(())
    }

    fn child_fail(&mut self, _cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.looping = true;
        Ok(())
    }

    fn reset_task(&mut self) {
        self.looping = false;
    }
}
