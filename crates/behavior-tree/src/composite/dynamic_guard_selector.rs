use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::error::TaskResult;

/// Runs the first child whose guard passes, re-checking guards every step.
///
/// If a higher-priority child becomes eligible while a lower one is running,
/// the running child is cancelled and the new one started in the same step.
/// Fails when no guard passes.
#[derive(Debug, Clone, Default)]
pub struct DynamicGuardSelector {
    running_child: Option<usize>,
}

impl DynamicGuardSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running_child(&self) -> Option<usize> {
        self.running_child
    }
}

impl<E: 'static> Behavior<E> for DynamicGuardSelector {
    fn name(&self) -> &'static str {
        "dynamicGuardSelector"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::BRANCH
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        let mut selected = None;
        for index in 0..cx.child_count() {
            if cx.check_child_guard(index)? {
                selected = Some(index);
                break;
            }
        }

        if let Some(running) = self.running_child {
            if selected != Some(running) {
                cx.cancel_child(running)?;
                self.running_child = None;
            }
        }

        let Some(index) = selected else {
            cx.fail();
            return Ok(());
        };
        if self.running_child.is_none() {
            self.running_child = Some(index);
            cx.start_child(index)?;
        }
        let report = cx.step_child(index)?;
        self.deliver(cx, index, report)
    }

    fn child_running(&mut self, cx: &mut TaskContext<'_, E>, index: usize) -> TaskResult<()> {
        self.running_child = Some(index);
        cx.running();
        Ok(())
    }

    fn child_success(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.running_child = None;
        cx.success();
        Ok(())
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.running_child = None;
        cx.fail();
        Ok(())
    }

    fn children_cancelled(&mut self) {
        self.running_child = None;
    }

    fn reset_task(&mut self) {
        self.running_child = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::tests::{Scripted, runs};
    use crate::leaf::{FnTask, Success};
    use crate::{BehaviorTree, Status, Task};

    fn flag(name: &'static str, pick: fn(&(bool, bool)) -> bool) -> Task<(bool, bool)> {
        Task::new(FnTask::new(name, move |flags: &mut (bool, bool)| {
            if pick(flags) {
                Status::Succeeded
            } else {
                Status::Failed
            }
        }))
    }

    fn tree() -> BehaviorTree<(bool, bool)> {
        let urgent = Scripted::task(Status::Running).with_guard(flag("urgent", |f| f.0));
        let idle = Scripted::task(Status::Running).with_guard(flag("idle", |f| f.1));
        let root = Task::new(DynamicGuardSelector::new())
            .with_child(urgent)
            .unwrap()
            .with_child(idle)
            .unwrap();
        BehaviorTree::with_root(root).with_object((false, true))
    }

    #[test]
    fn runs_first_child_with_passing_guard() {
        let mut tree = tree();
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Running);
        let root = tree.root().unwrap();
        assert_eq!(runs(root.child(0).unwrap()), 0);
        assert_eq!(runs(root.child(1).unwrap()), 1);
    }

    #[test]
    fn higher_priority_child_preempts_running_one() {
        let mut tree = tree();
        tree.step().unwrap();
        if let Some(flags) = tree.object_mut() {
            flags.0 = true;
        }
        tree.step().unwrap();

        let root = tree.root().unwrap();
        assert_eq!(root.child(1).unwrap().status(), Status::Cancelled);
        assert_eq!(root.child(0).unwrap().status(), Status::Running);
        let selector = root.downcast_ref::<DynamicGuardSelector>().unwrap();
        assert_eq!(selector.running_child(), Some(0));
    }

    #[test]
    fn fails_when_no_guard_passes() {
        let mut tree = tree();
        tree.set_object(Some((false, false)));
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Failed);
    }

    #[test]
    fn unguarded_child_always_qualifies() {
        let root = Task::<()>::new(DynamicGuardSelector::new())
            .with_child(Task::new(Success))
            .unwrap();
        let mut tree = BehaviorTree::with_root(root);
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
    }
}
