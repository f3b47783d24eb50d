use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::decorator::{LoopDecorator, loop_child_running, run_loop};
use crate::distribution::{DistributionKind, IntegerDistribution};
use crate::error::{AttributeError, TaskResult};
use crate::parser::{AttributeKind, AttributeSpec, AttributeValue};

/// Runs its child a sampled number of times, then succeeds.
///
/// Child failures count as completed runs. A negative count repeats forever.
#[derive(Debug, Clone)]
pub struct Repeat {
    times: IntegerDistribution,
    count: i32,
    looping: bool,
}

impl Repeat {
    const ATTRIBUTES: &'static [AttributeSpec] = &[AttributeSpec::new(
        "times",
        AttributeKind::Distribution(DistributionKind::Integer),
    )];

    pub fn new(times: IntegerDistribution) -> Self {
        Self {
            times,
            count: 0,
            looping: false,
        }
    }

    pub fn forever() -> Self {
        Self::new(IntegerDistribution::Constant(-1))
    }

    pub fn times(&self) -> IntegerDistribution {
        self.times
    }

    fn child_done<E: 'static>(&mut self, cx: &mut TaskContext<'_, E>) {
        if self.count > 0 {
            self.count -= 1;
        }
        if self.count == 0 {
            cx.success();
            self.looping = false;
        } else {
            self.looping = true;
        }
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Self::forever()
    }
}

impl LoopDecorator for Repeat {
    fn looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn condition(&self) -> bool {
        self.looping && self.count != 0
    }
}

impl<E: 'static> Behavior<E> for Repeat {
    fn name(&self) -> &'static str {
        "repeat"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::DECORATOR
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        Self::ATTRIBUTES
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match name {
            "times" => self.times = value.into_integer_distribution(name)?,
            _ => return Err(AttributeError::Unknown { name: name.into() }),
        }
        Ok(())
    }

    fn start(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        self.count = self.times.next_int(cx.rng());
        Ok(())
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        // Zero repetitions complete without touching the child.
        if self.count == 0 {
            cx.success();
            return Ok(());
        }
        run_loop(self, cx)
    }

    fn child_running(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        loop_child_running(self, cx)
    }

    fn child_success(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.child_done(cx);
        Ok(())
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.child_done(cx);
        Ok(())
    }

    fn reset_task(&mut self) {
        self.count = 0;
        self.looping = false;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::tests::{Scripted, runs};
    use crate::decorator::tests::{Decrement, Increment, TestContext};
    use crate::{BehaviorTree, Status, Task};

    #[test]
    fn repeats_the_requested_number_of_times() {
        let root = Task::new(Repeat::new(IntegerDistribution::Constant(3)))
            .with_child(Task::new(Increment))
            .unwrap();
        let mut tree = BehaviorTree::with_root(root).with_object(TestContext { value: 0 });
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
        assert_eq!(tree.object().map(|ctx| ctx.value), Some(3));
    }

    #[test]
    fn failures_count_as_runs() {
        let root = Task::new(Repeat::new(IntegerDistribution::Constant(2)))
            .with_child(Task::new(Decrement))
            .unwrap();
        let mut tree = BehaviorTree::with_root(root).with_object(TestContext { value: 0 });
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
        assert_eq!(tree.object().map(|ctx| ctx.value), Some(-2));
    }

    #[test]
    fn zero_times_succeeds_without_running_child() {
        let root = Task::<()>::new(Repeat::new(IntegerDistribution::Constant(0)))
            .with_child(Scripted::task(crate::Status::Succeeded))
            .unwrap();
        let mut tree = BehaviorTree::with_root(root);
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
        assert_eq!(runs(tree.root().unwrap().child(0).unwrap()), 0);
    }

    #[test]
    fn running_child_keeps_remaining_count() {
        let root = Task::<()>::new(Repeat::new(IntegerDistribution::Constant(2)))
            .with_child(Scripted::task(Status::Running))
            .unwrap();
        let mut tree = BehaviorTree::with_root(root);
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Running);

        tree.root_mut()
            .unwrap()
            .child_mut(0)
            .unwrap()
            .downcast_mut::<Scripted>()
            .unwrap()
            .status = Status::Succeeded;
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
        assert_eq!(runs(tree.root().unwrap().child(0).unwrap()), 3);
    }
}
