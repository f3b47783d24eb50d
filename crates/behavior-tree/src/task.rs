//! Task nodes and the evaluation protocol.
//!
//! A [`Task`] owns its behavior, status, optional guard and children. The
//! parent and the tree are never referenced directly: [`Control`] records who
//! drives the task and [`TreeId`] names the tree it was last started in.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::behavior::{Behavior, TaskConstraint};
use crate::clone::TaskCloner;
use crate::context::{TaskContext, TreeEnv};
use crate::error::{TaskError, TaskResult};
use crate::status::Status;

/// Handle of a [`BehaviorTree`](crate::BehaviorTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

impl TreeId {
    pub(crate) const DETACHED: TreeId = TreeId(0);

    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TreeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Who drives a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// The task is the root of a tree.
    Tree,
    /// The task is a child of a branch or decorator.
    Parent,
    /// The task is evaluated as somebody's guard.
    Guard,
}

pub struct Task<E> {
    behavior: Box<dyn Behavior<E>>,
    status: Status,
    guard: Option<Box<Task<E>>>,
    children: Vec<Task<E>>,
    control: Option<Control>,
    tree: Option<TreeId>,
}

impl<E: 'static> Task<E> {
    pub fn new<B: Behavior<E> + 'static>(behavior: B) -> Self {
        Self::from_boxed(Box::new(behavior))
    }

    pub fn from_boxed(behavior: Box<dyn Behavior<E>>) -> Self {
        Self {
            behavior,
            status: Status::Fresh,
            guard: None,
            children: Vec::new(),
            control: None,
            tree: None,
        }
    }

    /// Attaches children without arity checks. Builders use this for kinds
    /// whose constraint they already satisfy.
    pub(crate) fn with_children_unchecked(mut self, children: Vec<Task<E>>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: Task<E>) -> TaskResult<Self> {
        self.add_child(child)?;
        Ok(self)
    }

    pub fn with_guard(mut self, guard: Task<E>) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    pub fn name(&self) -> &'static str {
        self.behavior.name()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn control(&self) -> Option<Control> {
        self.control
    }

    pub fn tree_id(&self) -> Option<TreeId> {
        self.tree
    }

    pub fn constraint(&self) -> TaskConstraint {
        self.behavior.constraint()
    }

    pub fn behavior(&self) -> &dyn Behavior<E> {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn Behavior<E> {
        self.behavior.as_mut()
    }

    /// Returns the behavior as its concrete kind.
    pub fn downcast_ref<B: 'static>(&self) -> Option<&B> {
        self.behavior.as_any().downcast_ref()
    }

    pub fn downcast_mut<B: 'static>(&mut self) -> Option<&mut B> {
        self.behavior.as_any_mut().downcast_mut()
    }

    pub fn is<B: 'static>(&self) -> bool {
        self.behavior.as_any().is::<B>()
    }

    pub fn guard(&self) -> Option<&Task<E>> {
        self.guard.as_deref()
    }

    pub fn guard_mut(&mut self) -> Option<&mut Task<E>> {
        self.guard.as_deref_mut()
    }

    /// Replaces the guard, returning the previous one.
    pub fn set_guard(&mut self, guard: Option<Task<E>>) -> Option<Task<E>> {
        std::mem::replace(&mut self.guard, guard.map(Box::new)).map(|guard| *guard)
    }

    /// Appends a child and returns its index.
    ///
    /// This is a structural edit: no listener is notified. Listeners only
    /// hear about children added through [`BehaviorTree::add_child`] and
    /// [`TaskContext::add_child`] while the tree is being evaluated.
    ///
    /// [`BehaviorTree::add_child`]: crate::BehaviorTree::add_child
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` when the kind's maximum child count is reached.
    pub fn add_child(&mut self, child: Task<E>) -> TaskResult<usize> {
        let constraint = self.behavior.constraint();
        if self.children.len() >= constraint.max_children {
            return Err(constraint.overflow_error(self.name()));
        }
        self.children.push(child);
        Ok(self.children.len() - 1)
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

    pub fn child_mut(&mut self, index: usize) -> TaskResult<&mut Task<E>> {
        let size = self.children.len();
        self.children
            .get_mut(index)
            .ok_or(TaskError::IndexOutOfBounds { index, size })
    }

    pub fn children(&self) -> &[Task<E>] {
        &self.children
    }

    /// Deep copy of this task, its guard chain and its children.
    ///
    /// The copy is `Fresh` and unbound; per-execution behavior state is reset.
    pub fn clone_task(&self) -> Task<E> {
        let mut behavior = self.behavior.clone_behavior();
        behavior.reset_task();
        Task {
            behavior,
            status: Status::Fresh,
            guard: self.guard.as_ref().map(|guard| Box::new(guard.clone_task())),
            children: self.children.iter().map(Task::clone_task).collect(),
            control: None,
            tree: None,
        }
    }

    /// Clones through a custom strategy, wrapping its failure.
    pub fn clone_with(&self, cloner: &mut dyn TaskCloner<E>) -> TaskResult<Task<E>> {
        cloner
            .clone_task(self)
            .map_err(|source| TaskError::CloneFailed {
                task: self.name().to_string(),
                source,
            })
    }

    /// Returns the task to its freshly constructed state, dropping children
    /// and guard.
    pub fn reset(&mut self) {
        self.status = Status::Fresh;
        self.control = None;
        self.tree = None;
        self.guard = None;
        self.children.clear();
        self.behavior.reset();
    }

    /// Re-arms the task for another run, keeping structure and configuration.
    /// A running task is cancelled first.
    pub fn reset_task(&mut self) {
        self.reset_task_in(&mut TreeEnv::detached());
    }

    /// Cancels this task and its running descendants.
    pub fn cancel(&mut self) {
        self.cancel_in(&mut TreeEnv::detached());
    }

    pub(crate) fn start_in(&mut self, control: Control, env: &mut TreeEnv<E>) -> TaskResult<()> {
        self.control = Some(control);
        self.tree = Some(env.id);
        let constraint = self.behavior.constraint();
        let mut cx = TaskContext::new(self.behavior.name(), &mut self.status, &mut self.children, env)
            .with_constraint(constraint);
        self.behavior.start(&mut cx)
    }

    /// Runs the behavior once and returns the last status it reported.
    pub(crate) fn run_step(&mut self, env: &mut TreeEnv<E>) -> TaskResult<Option<Status>> {
        let constraint = self.behavior.constraint();
        let mut cx = TaskContext::new(self.behavior.name(), &mut self.status, &mut self.children, env)
            .with_constraint(constraint);
        self.behavior.run(&mut cx)?;
        let report = cx.into_report();
        if matches!(report, Some(Status::Succeeded | Status::Failed)) {
            self.behavior.end();
        }
        Ok(report)
    }

    /// Resumes a running task, or starts it, checks its guard and runs it.
    pub(crate) fn execute_in(
        &mut self,
        control: Control,
        env: &mut TreeEnv<E>,
    ) -> TaskResult<Option<Status>> {
        if self.status == Status::Running {
            return self.run_step(env);
        }
        self.start_in(control, env)?;
        if self.check_guard_in(env)? {
            self.run_step(env)
        } else {
            Ok(self.fail_in(env))
        }
    }

    /// `true` if the task has no guard or its guard chain succeeds.
    pub(crate) fn check_guard_in(&mut self, env: &mut TreeEnv<E>) -> TaskResult<bool> {
        match self.guard.as_deref_mut() {
            Some(guard) => evaluate_guard(guard, env),
            None => Ok(true),
        }
    }

    pub(crate) fn fail_in(&mut self, env: &mut TreeEnv<E>) -> Option<Status> {
        let previous = std::mem::replace(&mut self.status, Status::Failed);
        env.notify_status(self.behavior.name(), Status::Failed, previous);
        self.behavior.end();
        Some(Status::Failed)
    }

    /// Cancellation is never reported to the parent.
    pub(crate) fn cancel_in(&mut self, env: &mut TreeEnv<E>) {
        Self::cancel_running(&mut self.children, 0, env);
        self.behavior.children_cancelled();
        let previous = std::mem::replace(&mut self.status, Status::Cancelled);
        env.notify_status(self.behavior.name(), Status::Cancelled, previous);
        self.behavior.end();
    }

    pub(crate) fn cancel_running(children: &mut [Task<E>], start: usize, env: &mut TreeEnv<E>) {
        for child in children.iter_mut().skip(start) {
            if child.status == Status::Running {
                child.cancel_in(env);
            }
        }
    }

    pub(crate) fn reset_task_in(&mut self, env: &mut TreeEnv<E>) {
        if self.status == Status::Running {
            self.cancel_in(env);
        }
        for child in self.children.iter_mut() {
            child.reset_task_in(env);
        }
        self.status = Status::Fresh;
        self.tree = None;
        self.control = None;
        self.behavior.reset_task();
    }
}

/// Runs a guard in one step: nested guards first, then the guard itself.
pub(crate) fn evaluate_guard<E: 'static>(
    guard: &mut Task<E>,
    env: &mut TreeEnv<E>,
) -> TaskResult<bool> {
    if !guard.check_guard_in(env)? {
        return Ok(false);
    }
    guard.start_in(Control::Guard, env)?;
    guard.run_step(env)?;
    match guard.status {
        Status::Succeeded => Ok(true),
        Status::Failed => Ok(false),
        other => Err(TaskError::illegal_state(format!(
            "Illegal guard status '{other}'. Guards must either succeed or fail in one step."
        ))),
    }
}

impl<E> fmt::Debug for Task<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.behavior.name())
            .field("status", &self.status)
            .field("guard", &self.guard)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{Selector, Sequence};
    use crate::decorator::Inverter;
    use crate::leaf::{Failure, Success};

    #[derive(Debug, Clone)]
    struct Scripted(Status);

    impl Behavior<()> for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn run(&mut self, cx: &mut TaskContext<'_, ()>) -> TaskResult<()> {
            cx.report(self.0)
        }
    }

    fn run_detached(task: &mut Task<()>) -> TaskResult<Option<Status>> {
        task.execute_in(Control::Tree, &mut TreeEnv::detached())
    }

    #[test]
    fn new_task_is_fresh_and_unbound() {
        let task = Task::<()>::new(Success);
        assert_eq!(task.status(), Status::Fresh);
        assert!(task.control().is_none());
        assert!(task.tree_id().is_none());
        assert!(task.guard().is_none());
    }

    #[test]
    fn leaf_rejects_children() {
        let mut task = Task::<()>::new(Success);
        let err = task.add_child(Task::new(Failure)).unwrap_err();
        assert_eq!(err.to_string(), "A leaf task cannot have any children");
    }

    #[test]
    fn decorator_rejects_second_child() {
        let mut task = Task::<()>::new(Inverter);
        task.add_child(Task::new(Success)).unwrap();
        let err = task.add_child(Task::new(Success)).unwrap_err();
        assert!(matches!(err, TaskError::IllegalState(_)));
        assert_eq!(err.to_string(), "A decorator task cannot have more than one child");
    }

    #[test]
    fn child_index_out_of_range_is_a_bounds_error() {
        let task = Task::<()>::new(Sequence::new()).with_child(Task::new(Success)).unwrap();
        assert!(task.child(0).is_ok());
        assert!(matches!(
            task.child(1),
            Err(TaskError::IndexOutOfBounds { index: 1, size: 1 })
        ));
    }

    #[test]
    fn reset_clears_everything() {
        let mut task = Task::<()>::new(Sequence::new())
            .with_child(Task::new(Success))
            .unwrap()
            .with_guard(Task::new(Success));
        run_detached(&mut task).unwrap();
        assert_eq!(task.status(), Status::Succeeded);

        task.reset();
        assert_eq!(task.status(), Status::Fresh);
        assert!(task.control().is_none());
        assert!(task.tree_id().is_none());
        assert!(task.guard().is_none());
        assert_eq!(task.child_count(), 0);
    }

    #[test]
    fn clone_is_fresh_and_structurally_equal() {
        let mut task = Task::<()>::new(Selector::new())
            .with_child(Task::new(Failure))
            .unwrap()
            .with_child(Task::new(Success).with_guard(Task::new(Success)))
            .unwrap();
        run_detached(&mut task).unwrap();
        assert_eq!(task.status(), Status::Succeeded);

        let clone = task.clone_task();
        assert_eq!(clone.status(), Status::Fresh);
        assert!(clone.is::<Selector>());
        assert_eq!(clone.child_count(), 2);
        assert!(clone.child(0).unwrap().is::<Failure>());
        assert_eq!(clone.child(1).unwrap().status(), Status::Fresh);
        assert!(clone.child(1).unwrap().guard().is_some());
        // The original keeps its own state.
        assert_eq!(task.child(1).unwrap().status(), Status::Succeeded);
    }

    #[test]
    fn guard_must_not_run() {
        let mut task =
            Task::<()>::new(Success).with_guard(Task::new(Scripted(Status::Running)));
        let err = run_detached(&mut task).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Illegal guard status 'RUNNING'. Guards must either succeed or fail in one step."
        );
    }

    #[test]
    fn failing_guard_fails_the_task_without_running_it() {
        let mut task = Task::<()>::new(Success).with_guard(Task::new(Failure));
        assert_eq!(run_detached(&mut task).unwrap(), Some(Status::Failed));
        assert_eq!(task.guard().unwrap().control(), Some(Control::Guard));
    }

    #[test]
    fn nested_guards_are_checked_first() {
        // The inner guard would succeed, but its own guard fails.
        let inner = Task::new(Success).with_guard(Task::new(Failure));
        let mut task = Task::<()>::new(Success).with_guard(inner);
        assert_eq!(run_detached(&mut task).unwrap(), Some(Status::Failed));
        assert_eq!(task.guard().unwrap().status(), Status::Fresh);
    }

    #[test]
    fn cancel_marks_running_descendants() {
        let mut task = Task::<()>::new(Sequence::new())
            .with_child(Task::new(Scripted(Status::Running)))
            .unwrap();
        assert_eq!(run_detached(&mut task).unwrap(), Some(Status::Running));

        task.cancel();
        assert_eq!(task.status(), Status::Cancelled);
        assert_eq!(task.child(0).unwrap().status(), Status::Cancelled);
    }

    #[test]
    fn reset_task_rearms_without_dropping_structure() {
        let mut task = Task::<()>::new(Sequence::new())
            .with_child(Task::new(Scripted(Status::Running)))
            .unwrap()
            .with_guard(Task::new(Success));
        run_detached(&mut task).unwrap();

        task.reset_task();
        assert_eq!(task.status(), Status::Fresh);
        assert!(task.control().is_none());
        assert!(task.guard().is_some());
        assert_eq!(task.child_count(), 1);
        assert_eq!(task.child(0).unwrap().status(), Status::Fresh);
    }
}
