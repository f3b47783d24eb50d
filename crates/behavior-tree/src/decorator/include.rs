use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::decorator::run_decorated;
use crate::error::{AttributeError, TaskError, TaskResult};
use crate::parser::{AttributeKind, AttributeSpec, AttributeValue};

/// Stands in for the root task of another tree.
///
/// An eager include is replaced by a copy of the referenced archetype's root
/// when a library creates a tree, and is never run itself. A lazy include
/// stays in the tree and fetches its subtree through the tree's
/// [`SubtreeSource`](crate::library::SubtreeSource) the first time it
/// starts; afterwards it behaves like a pass-through decorator.
#[derive(Debug, Clone, Default)]
pub struct Include {
    subtree: Option<String>,
    lazy: bool,
}

impl Include {
    const ATTRIBUTES: &'static [AttributeSpec] = &[
        AttributeSpec::new("subtree", AttributeKind::String).required(),
        AttributeSpec::new("lazy", AttributeKind::Bool),
    ];

    pub fn new(subtree: impl Into<String>, lazy: bool) -> Self {
        Self {
            subtree: Some(subtree.into()),
            lazy,
        }
    }

    pub fn eager(subtree: impl Into<String>) -> Self {
        Self::new(subtree, false)
    }

    pub fn lazy(subtree: impl Into<String>) -> Self {
        Self::new(subtree, true)
    }

    pub fn subtree(&self) -> Option<&str> {
        self.subtree.as_deref()
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }
}

impl<E: 'static> Behavior<E> for Include {
    fn name(&self) -> &'static str {
        "include"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::new(0, 1)
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        Self::ATTRIBUTES
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match name {
            "subtree" => self.subtree = Some(value.into_string(name)?),
            "lazy" => self.lazy = value.into_bool(name)?,
            _ => return Err(AttributeError::Unknown { name: name.into() }),
        }
        Ok(())
    }

    fn start(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        if !self.lazy {
            return Err(TaskError::illegal_state("A non-lazy include isn't meant to be run"));
        }
        if cx.child_count() == 0 {
            let reference = self
                .subtree
                .as_deref()
                .ok_or_else(|| TaskError::illegal_state("Include task has no subtree reference"))?;
            let root = cx.create_subtree(reference)?;
            cx.add_child(root)?;
        }
        Ok(())
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
        cx.fail();
        Ok(())
    }

    fn reset(&mut self) {
        self.subtree = None;
        self.lazy = false;
    }
}
