//! Leaf tasks: the actions and conditions at the bottom of a tree.

use std::fmt;
use std::sync::Arc;

use crate::behavior::Behavior;
use crate::context::TaskContext;
use crate::distribution::{DistributionKind, FloatDistribution};
use crate::error::{AttributeError, TaskResult};
use crate::parser::{AttributeKind, AttributeSpec, AttributeValue};
use crate::status::Status;

/// Always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Success;

impl<E: 'static> Behavior<E> for Success {
    fn name(&self) -> &'static str {
        "success"
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        cx.success();
        Ok(())
    }
}

/// Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failure;

impl<E: 'static> Behavior<E> for Failure {
    fn name(&self) -> &'static str {
        "failure"
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        cx.fail();
        Ok(())
    }
}

/// Keeps running until the tree's timepiece has advanced by a sampled
/// number of seconds, then succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Wait {
    seconds: FloatDistribution,
    start_time: f32,
    timeout: f32,
}

impl Wait {
    const ATTRIBUTES: &'static [AttributeSpec] = &[AttributeSpec::new(
        "seconds",
        AttributeKind::Distribution(DistributionKind::Float),
    )
    .required()];

    pub fn new(seconds: FloatDistribution) -> Self {
        Self {
            seconds,
            start_time: 0.0,
            timeout: 0.0,
        }
    }

    pub fn seconds(&self) -> FloatDistribution {
        self.seconds
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self::new(FloatDistribution::ZERO)
    }
}

impl<E: 'static> Behavior<E> for Wait {
    fn name(&self) -> &'static str {
        "wait"
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        Self::ATTRIBUTES
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match name {
            "seconds" => self.seconds = value.into_float_distribution(name)?,
            _ => return Err(AttributeError::Unknown { name: name.into() }),
        }
        Ok(())
    }

    fn start(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        self.start_time = cx.time();
        self.timeout = self.seconds.next_float(cx.rng());
        Ok(())
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        if cx.time() - self.start_time < self.timeout {
            cx.running();
        } else {
            cx.success();
        }
        Ok(())
    }

    fn reset_task(&mut self) {
        self.start_time = 0.0;
        self.timeout = 0.0;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

type LeafFn<E> = dyn Fn(&mut E) -> Status + Send + Sync;

/// Leaf backed by a closure over the blackboard object.
///
/// The closure must return `Running`, `Succeeded` or `Failed`.
pub struct FnTask<E> {
    name: &'static str,
    func: Arc<LeafFn<E>>,
}

impl<E> FnTask<E> {
    pub fn new<F>(name: &'static str, func: F) -> Self
    where
        F: Fn(&mut E) -> Status + Send + Sync + 'static,
    {
        Self {
            name,
            func: Arc::new(func),
        }
    }
}

impl<E> Clone for FnTask<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            func: Arc::clone(&self.func),
        }
    }
}

impl<E> fmt::Debug for FnTask<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask").field("name", &self.name).finish()
    }
}

impl<E: 'static> Behavior<E> for FnTask<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        let status = (self.func)(cx.object_mut()?);
        cx.report(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BehaviorTree, Task, TaskError};

    #[test]
    fn wait_runs_until_timeout_elapses() {
        let mut tree = BehaviorTree::<()>::with_root(Task::new(Wait::new(
            FloatDistribution::Constant(1.0),
        )));
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Running);
        tree.update(0.5).unwrap();
        assert_eq!(tree.status(), Status::Running);
        tree.update(0.5).unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
    }

    #[test]
    fn zero_wait_succeeds_immediately() {
        let mut tree = BehaviorTree::<()>::with_root(Task::new(Wait::default()));
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
    }

    #[test]
    fn fn_task_reads_blackboard() {
        let positive = FnTask::new("isPositive", |value: &mut i32| {
            if *value > 0 {
                Status::Succeeded
            } else {
                Status::Failed
            }
        });
        let mut tree = BehaviorTree::with_root(Task::new(positive)).with_object(3);
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);

        tree.set_object(Some(-1));
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Failed);
    }

    #[test]
    fn fn_task_rejects_non_outcome_status() {
        let bad = FnTask::new("bad", |_: &mut ()| Status::Cancelled);
        let mut tree = BehaviorTree::with_root(Task::new(bad)).with_object(());
        let err = tree.step().unwrap_err();
        assert!(matches!(err, TaskError::IllegalState(_)));
        assert_eq!(err.to_string(), "Invalid status 'CANCELLED' returned by the execute method");
    }
}
