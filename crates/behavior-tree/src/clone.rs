//! Pluggable task cloning strategies.
//!
//! Libraries clone archetype trees through a [`TaskCloner`] when one is
//! installed, and hand disposed roots back to it.

use crate::error::BoxError;
use crate::task::Task;

pub trait TaskCloner<E>: Send {
    fn clone_task(&mut self, task: &Task<E>) -> Result<Task<E>, BoxError>;

    /// Receives the root of a disposed tree.
    fn free_task(&mut self, task: Task<E>) {
        drop(task);
    }
}

/// Plain deep copy via [`Task::clone_task`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepCloner;

impl<E: 'static> TaskCloner<E> for DeepCloner {
    fn clone_task(&mut self, task: &Task<E>) -> Result<Task<E>, BoxError> {
        Ok(task.clone_task())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::error::TaskError;
    use crate::leaf::Success;

    struct Broken;

    impl TaskCloner<()> for Broken {
        fn clone_task(&mut self, _task: &Task<()>) -> Result<Task<()>, BoxError> {
            Err("out of pooled tasks".into())
        }
    }

    #[test]
    fn deep_cloner_returns_fresh_copy() {
        let task = Task::<()>::new(Success);
        let clone = task.clone_with(&mut DeepCloner).unwrap();
        assert!(clone.is::<Success>());
    }

    #[test]
    fn cloner_failure_is_wrapped_with_cause() {
        let task = Task::<()>::new(Success);
        let err = task.clone_with(&mut Broken).unwrap_err();
        assert!(matches!(err, TaskError::CloneFailed { ref task, .. } if task == "success"));
        assert_eq!(err.source().unwrap().to_string(), "out of pooled tasks");
    }
}
