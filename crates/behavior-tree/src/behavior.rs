//! Core behavior trait.
//!
//! A [`Behavior`] is the decision logic of one task kind. The surrounding
//! [`Task`](crate::Task) node owns the status, guard and children; the
//! behavior only sees them through the [`TaskContext`] passed to every
//! protocol call. The trait is generic over the blackboard type `E`.

use std::any::Any;

use crate::context::TaskContext;
use crate::error::{AttributeError, TaskError, TaskResult};
use crate::parser::{AttributeSpec, AttributeValue};
use crate::status::Status;

/// Child-count limits of a task kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConstraint {
    pub min_children: usize,
    pub max_children: usize,
}

impl TaskConstraint {
    pub const LEAF: Self = Self::new(0, 0);
    pub const DECORATOR: Self = Self::new(1, 1);
    pub const BRANCH: Self = Self::new(1, usize::MAX);

    pub const fn new(min_children: usize, max_children: usize) -> Self {
        Self {
            min_children,
            max_children,
        }
    }

    pub(crate) fn overflow_error(&self, task: &str) -> TaskError {
        match self.max_children {
            0 => TaskError::illegal_state("A leaf task cannot have any children"),
            1 => TaskError::illegal_state("A decorator task cannot have more than one child"),
            max => TaskError::illegal_state(format!(
                "Task '{task}' cannot have more than {max} children"
            )),
        }
    }
}

/// Decision logic of a task kind.
///
/// # Protocol
///
/// The owning task calls [`start`](Behavior::start) when it leaves a
/// non-running state, then [`run`](Behavior::run) once per step while it is
/// active. `run` must report through the context with exactly one of
/// `running()`, `success()` or `fail()`. Reports from children arrive
/// synchronously in [`child_running`](Behavior::child_running),
/// [`child_success`](Behavior::child_success) and
/// [`child_fail`](Behavior::child_fail). [`end`](Behavior::end) is called
/// whenever the task succeeds, fails or is cancelled.
///
/// Implementors derive `Clone`; cloning a task clones the behavior and then
/// calls [`reset_task`](Behavior::reset_task) on the copy, so per-execution
/// fields never leak into clones.
pub trait Behavior<E>: BehaviorBase<E> + Send {
    /// Name used in logs, listener events and DSL diagnostics.
    fn name(&self) -> &'static str;

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::LEAF
    }

    /// Attributes this kind accepts from the DSL.
    fn attributes(&self) -> &'static [AttributeSpec] {
        &[]
    }

    /// Applies an attribute value already converted to the declared type.
    fn set_attribute(&mut self, name: &str, _value: AttributeValue) -> Result<(), AttributeError> {
        Err(AttributeError::Unknown {
            name: name.to_string(),
        })
    }

    fn start(&mut self, _cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        Ok(())
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()>;

    fn end(&mut self) {}

    fn child_running(&mut self, _cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        Ok(())
    }

    fn child_success(&mut self, _cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        Ok(())
    }

    fn child_fail(&mut self, _cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        Ok(())
    }

    /// Called when the owning task cancels its running children.
    fn children_cancelled(&mut self) {}

    /// Clears per-execution state.
    fn reset_task(&mut self) {}

    /// Restores the freshly constructed configuration.
    fn reset(&mut self) {
        self.reset_task();
    }

    /// Routes a child's report to the matching handler.
    fn deliver(
        &mut self,
        cx: &mut TaskContext<'_, E>,
        index: usize,
        report: Option<Status>,
    ) -> TaskResult<()> {
        match report {
            Some(Status::Running) => self.child_running(cx, index),
            Some(Status::Succeeded) => self.child_success(cx, index),
            Some(Status::Failed) => self.child_fail(cx, index),
            _ => Ok(()),
        }
    }
}

/// Object-safe plumbing implemented for every `Behavior + Clone`.
pub trait BehaviorBase<E> {
    fn clone_behavior(&self) -> Box<dyn Behavior<E>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E, B> BehaviorBase<E> for B
where
    B: Behavior<E> + Clone + 'static,
{
    fn clone_behavior(&self) -> Box<dyn Behavior<E>> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_messages_depend_on_arity() {
        assert_eq!(
            TaskConstraint::LEAF.overflow_error("success").to_string(),
            "A leaf task cannot have any children"
        );
        assert_eq!(
            TaskConstraint::DECORATOR.overflow_error("invert").to_string(),
            "A decorator task cannot have more than one child"
        );
        assert_eq!(
            TaskConstraint::new(0, 3).overflow_error("custom").to_string(),
            "Task 'custom' cannot have more than 3 children"
        );
    }
}
