use std::sync::Arc;

use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::decorator::run_decorated;
use crate::error::{AttributeError, TaskError, TaskResult};
use crate::parser::{AttributeKind, AttributeSpec, AttributeValue};
use crate::semaphore::NonBlockingSemaphore;

/// Runs its child only while holding one resource of a named semaphore.
///
/// The resource is taken when the guard starts and given back when it ends,
/// whether it succeeded, failed or was cancelled. If none is available the
/// guard fails without running its child. Semaphores are looked up in the
/// tree's [`SemaphoreRepository`](crate::semaphore::SemaphoreRepository).
#[derive(Debug, Clone, Default)]
pub struct SemaphoreGuard {
    name: Option<String>,
    semaphore: Option<Arc<NonBlockingSemaphore>>,
    acquired: bool,
}

impl SemaphoreGuard {
    const ATTRIBUTES: &'static [AttributeSpec] =
        &[AttributeSpec::new("name", AttributeKind::String).required()];

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn semaphore_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `true` while this guard holds a resource.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }
}

impl<E: 'static> Behavior<E> for SemaphoreGuard {
    fn name(&self) -> &'static str {
        "semaphoreGuard"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::DECORATOR
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        Self::ATTRIBUTES
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match name {
            "name" => self.name = Some(value.into_string(name)?),
            _ => return Err(AttributeError::Unknown { name: name.into() }),
        }
        Ok(())
    }

    fn start(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        let semaphore = match &self.semaphore {
            Some(semaphore) => Arc::clone(semaphore),
            None => {
                let name = self
                    .name
                    .as_deref()
                    .ok_or_else(|| TaskError::illegal_state("Semaphore guard has no semaphore name"))?;
                let semaphore = cx.semaphore(name)?;
                self.semaphore = Some(Arc::clone(&semaphore));
                semaphore
            }
        };
        self.acquired = semaphore.acquire();
        Ok(())
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        if self.acquired {
            run_decorated(self, cx)
        } else {
            cx.fail();
            Ok(())
        }
    }

    fn end(&mut self) {
        if self.acquired {
            if let Some(semaphore) = &self.semaphore {
                semaphore.release();
            }
            self.acquired = false;
        }
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
        cx.fail();
        Ok(())
    }

    /// Running guards are cancelled, and so released, before this is called.
    fn reset_task(&mut self) {
        self.semaphore = None;
        self.acquired = false;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
