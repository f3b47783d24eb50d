use crate::behavior::{Behavior, TaskConstraint};
use crate::composite::{SingleRunningBranch, SingleRunningChildBranch, run_single_running};
use crate::context::TaskContext;
use crate::error::TaskResult;

/// Runs children one after another until one fails.
///
/// # Semantics
///
/// - A child that fails makes the sequence fail immediately
/// - A child that succeeds moves the sequence on to the next child
/// - If every child succeeds, the sequence succeeds
/// - A running child is resumed on the next step
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    branch: SingleRunningChildBranch,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn random() -> Self {
        Self {
            branch: SingleRunningChildBranch::randomized(),
        }
    }
}

impl SingleRunningBranch for Sequence {
    fn branch(&self) -> &SingleRunningChildBranch {
        &self.branch
    }

    fn branch_mut(&mut self) -> &mut SingleRunningChildBranch {
        &mut self.branch
    }
}

impl<E: 'static> Behavior<E> for Sequence {
    fn name(&self) -> &'static str {
        if self.branch.is_randomized() {
            "randomSequence"
        } else {
            "sequence"
        }
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::BRANCH
    }

    fn start(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        self.branch.start(cx.child_count());
        Ok(())
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        run_single_running(self, cx)
    }

    fn child_running(&mut self, cx: &mut TaskContext<'_, E>, index: usize) -> TaskResult<()> {
        self.branch.set_running(index);
        cx.running();
        Ok(())
    }

    fn child_success(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.branch.child_finished();
        self.branch.advance();
        if self.branch.current_child_index() < cx.child_count() {
            self.run(cx)
        } else {
            cx.success();
            Ok(())
        }
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.branch.child_finished();
        cx.fail();
        Ok(())
    }

    fn children_cancelled(&mut self) {
        self.branch.cancelled();
    }

    fn reset_task(&mut self) {
        self.branch.reset_task();
    }
}
