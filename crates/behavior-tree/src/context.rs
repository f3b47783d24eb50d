//! Evaluation context handed to behaviors.
//!
//! A task never holds pointers to its parent or tree. Instead every protocol
//! call receives a [`TaskContext`] that borrows the task's own status and
//! children together with the environment owned by the running tree.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::behavior::TaskConstraint;
use crate::error::{TaskError, TaskResult};
use crate::library::SubtreeSource;
use crate::semaphore::{NonBlockingSemaphore, SemaphoreRepository};
use crate::status::Status;
use crate::task::{Control, Task, TreeId};
use crate::timepiece::Timepiece;
use crate::tree::{TaskRef, TreeListener};

/// State shared by every task of one tree.
pub(crate) struct TreeEnv<E> {
    pub(crate) id: TreeId,
    pub(crate) object: Option<E>,
    pub(crate) rng: StdRng,
    pub(crate) timepiece: Timepiece,
    pub(crate) listeners: Option<Vec<Box<dyn TreeListener>>>,
    pub(crate) subtrees: Option<Arc<dyn SubtreeSource<E>>>,
    pub(crate) semaphores: Option<SemaphoreRepository>,
}

impl<E> TreeEnv<E> {
    pub(crate) fn new() -> Self {
        Self {
            id: TreeId::next(),
            object: None,
            rng: StdRng::from_entropy(),
            timepiece: Timepiece::default(),
            listeners: None,
            subtrees: None,
            semaphores: None,
        }
    }

    /// Environment for operating on a task outside of any tree.
    pub(crate) fn detached() -> Self {
        Self {
            id: TreeId::DETACHED,
            object: None,
            rng: StdRng::seed_from_u64(0),
            timepiece: Timepiece::default(),
            listeners: None,
            subtrees: None,
            semaphores: None,
        }
    }

    /// Fresh environment sharing this one's subtree source and semaphores.
    pub(crate) fn derive(&self) -> Self {
        let mut env = Self::new();
        env.subtrees = self.subtrees.clone();
        env.semaphores = self.semaphores.clone();
        env
    }

    pub(crate) fn notify_status(&mut self, name: &str, status: Status, previous: Status) {
        if let Some(listeners) = self.listeners.as_mut() {
            for listener in listeners.iter_mut() {
                listener.status_updated(TaskRef { name, status }, previous);
            }
        }
    }

    pub(crate) fn notify_child_added(&mut self, name: &str, status: Status, index: usize) {
        if let Some(listeners) = self.listeners.as_mut() {
            for listener in listeners.iter_mut() {
                listener.child_added(TaskRef { name, status }, index);
            }
        }
    }
}

/// Borrowed view of a task and its tree during one protocol call.
pub struct TaskContext<'a, E> {
    name: &'static str,
    status: &'a mut Status,
    children: &'a mut Vec<Task<E>>,
    env: &'a mut TreeEnv<E>,
    constraint: TaskConstraint,
    report: Option<Status>,
}

impl<'a, E: 'static> TaskContext<'a, E> {
    pub(crate) fn new(
        name: &'static str,
        status: &'a mut Status,
        children: &'a mut Vec<Task<E>>,
        env: &'a mut TreeEnv<E>,
    ) -> Self {
        Self {
            name,
            status,
            children,
            env,
            constraint: TaskConstraint::BRANCH,
            report: None,
        }
    }

    pub(crate) fn with_constraint(mut self, constraint: TaskConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Last status reported during this call, if any.
    pub(crate) fn into_report(self) -> Option<Status> {
        self.report
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn status(&self) -> Status {
        *self.status
    }

    fn set_status(&mut self, status: Status) {
        let previous = std::mem::replace(self.status, status);
        self.env.notify_status(self.name, status, previous);
        self.report = Some(status);
    }

    /// Reports that the task needs to run again on the next step.
    pub fn running(&mut self) {
        self.set_status(Status::Running);
    }

    pub fn success(&mut self) {
        self.set_status(Status::Succeeded);
    }

    pub fn fail(&mut self) {
        self.set_status(Status::Failed);
    }

    /// Reports a status computed by leaf logic.
    pub fn report(&mut self, status: Status) -> TaskResult<()> {
        match status {
            Status::Running | Status::Succeeded | Status::Failed => {
                self.set_status(status);
                Ok(())
            }
            other => Err(TaskError::illegal_state(format!(
                "Invalid status '{other}' returned by the execute method"
            ))),
        }
    }

    /// Blackboard object of the running tree.
    pub fn object(&self) -> TaskResult<&E> {
        self.env.object.as_ref().ok_or_else(missing_object)
    }

    pub fn object_mut(&mut self) -> TaskResult<&mut E> {
        self.env.object.as_mut().ok_or_else(missing_object)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.env.rng
    }

    /// Current time of the tree's timepiece.
    pub fn time(&self) -> f32 {
        self.env.timepiece.time()
    }

    pub fn delta_time(&self) -> f32 {
        self.env.timepiece.delta_time()
    }

    pub fn tree_id(&self) -> TreeId {
        self.env.id
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> TaskResult<&Task<E>> {
        self.children.get(index).ok_or(TaskError::IndexOutOfBounds {
            index,
            size: self.children.len(),
        })
    }

    pub fn child_status(&self, index: usize) -> TaskResult<Status> {
        self.child(index).map(Task::status)
    }

    /// Appends a child while the task is being evaluated and notifies the
    /// tree's listeners.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` when the kind's maximum child count is reached.
    pub fn add_child(&mut self, child: Task<E>) -> TaskResult<usize> {
        if self.children.len() >= self.constraint.max_children {
            return Err(self.constraint.overflow_error(self.name));
        }
        self.children.push(child);
        let index = self.children.len() - 1;
        self.env.notify_child_added(self.name, *self.status, index);
        Ok(index)
    }

    /// Root task of another tree, created through the running tree's
    /// subtree source.
    pub fn create_subtree(&self, reference: &str) -> TaskResult<Task<E>> {
        let source = self.env.subtrees.as_ref().ok_or_else(|| {
            TaskError::IllegalState(format!(
                "The behavior tree has no subtree source to include '{reference}'"
            ))
        })?;
        source
            .create_subtree(reference)
            .map_err(|source| TaskError::Include {
                reference: reference.to_string(),
                source: Box::new(source),
            })
    }

    /// Looks up a named semaphore in the running tree's repository.
    pub fn semaphore(&self, name: &str) -> TaskResult<Arc<NonBlockingSemaphore>> {
        self.env
            .semaphores
            .as_ref()
            .and_then(|semaphores| semaphores.get(name))
            .ok_or_else(|| TaskError::IllegalState(format!("Unknown semaphore '{name}'")))
    }

    /// Runs a child the standard way: resume it if running, otherwise start
    /// it, check its guard and run or fail it. Returns the child's report.
    pub fn run_child(&mut self, index: usize) -> TaskResult<Option<Status>> {
        slot(self.children, index)?.execute_in(Control::Parent, self.env)
    }

    /// Binds the child to this task and calls its start hook.
    pub fn start_child(&mut self, index: usize) -> TaskResult<()> {
        slot(self.children, index)?.start_in(Control::Parent, self.env)
    }

    /// Evaluates the child's guard chain.
    pub fn check_child_guard(&mut self, index: usize) -> TaskResult<bool> {
        slot(self.children, index)?.check_guard_in(self.env)
    }

    /// Runs the child without starting it or checking its guard.
    pub fn step_child(&mut self, index: usize) -> TaskResult<Option<Status>> {
        slot(self.children, index)?.run_step(self.env)
    }

    /// Fails the child directly, as when its guard rejects it.
    pub fn fail_child(&mut self, index: usize) -> TaskResult<Option<Status>> {
        Ok(slot(self.children, index)?.fail_in(self.env))
    }

    pub fn cancel_child(&mut self, index: usize) -> TaskResult<()> {
        slot(self.children, index)?.cancel_in(self.env);
        Ok(())
    }

    /// Cancels every running child from `start` onwards.
    pub fn cancel_running_children(&mut self, start: usize) {
        Task::cancel_running(self.children, start, self.env);
    }

    /// Structurally re-arms every child.
    pub fn reset_children(&mut self) {
        for child in self.children.iter_mut() {
            child.reset_task_in(self.env);
        }
    }
}

fn slot<E>(children: &mut [Task<E>], index: usize) -> TaskResult<&mut Task<E>> {
    let size = children.len();
    children
        .get_mut(index)
        .ok_or(TaskError::IndexOutOfBounds { index, size })
}

fn missing_object() -> TaskError {
    TaskError::illegal_state("The behavior tree has no blackboard object")
}
