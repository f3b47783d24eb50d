//! Root container driving a task tree one step at a time.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::clone::TaskCloner;
use crate::context::TreeEnv;
use crate::error::{TaskError, TaskResult};
use crate::library::SubtreeSource;
use crate::semaphore::SemaphoreRepository;
use crate::status::Status;
use crate::task::{Control, Task, TreeId, evaluate_guard};
use crate::timepiece::Timepiece;

/// Snapshot of a task passed to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRef<'a> {
    pub name: &'a str,
    pub status: Status,
}

/// Observer of status changes inside a tree.
pub trait TreeListener: Send {
    fn status_updated(&mut self, task: TaskRef<'_>, previous_status: Status);

    fn child_added(&mut self, _task: TaskRef<'_>, _index: usize) {}
}

/// Listener that logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl TreeListener for TracingListener {
    fn status_updated(&mut self, task: TaskRef<'_>, previous_status: Status) {
        debug!(task = task.name, from = %previous_status, to = %task.status, "status updated");
    }

    fn child_added(&mut self, task: TaskRef<'_>, index: usize) {
        debug!(task = task.name, index, "child added");
    }
}

/// A tree of tasks bound to a blackboard object of type `E`.
///
/// The tree holds at most one root task. Each call to [`step`](Self::step)
/// evaluates the root once; tasks that report `Running` are resumed on the
/// next step instead of being restarted.
pub struct BehaviorTree<E> {
    root: Option<Task<E>>,
    guard: Option<Box<Task<E>>>,
    status: Status,
    env: TreeEnv<E>,
}

impl<E: 'static> BehaviorTree<E> {
    /// Name reported to listeners for the tree itself.
    pub const NAME: &'static str = "behaviorTree";

    pub fn new() -> Self {
        Self {
            root: None,
            guard: None,
            status: Status::Fresh,
            env: TreeEnv::new(),
        }
    }

    pub fn with_root(root: Task<E>) -> Self {
        let mut tree = Self::new();
        tree.root = Some(root);
        tree
    }

    pub fn with_object(mut self, object: E) -> Self {
        self.env.object = Some(object);
        self
    }

    /// Makes every random decision of this tree reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    pub fn with_subtree_source(mut self, source: Arc<dyn SubtreeSource<E>>) -> Self {
        self.set_subtree_source(Some(source));
        self
    }

    pub fn with_semaphores(mut self, semaphores: SemaphoreRepository) -> Self {
        self.set_semaphores(Some(semaphores));
        self
    }

    pub fn id(&self) -> TreeId {
        self.env.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn object(&self) -> Option<&E> {
        self.env.object.as_ref()
    }

    pub fn object_mut(&mut self) -> Option<&mut E> {
        self.env.object.as_mut()
    }

    /// Replaces the blackboard object, returning the previous one.
    pub fn set_object(&mut self, object: Option<E>) -> Option<E> {
        std::mem::replace(&mut self.env.object, object)
    }

    pub fn root(&self) -> Option<&Task<E>> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut Task<E>> {
        self.root.as_mut()
    }

    pub fn into_root(self) -> Option<Task<E>> {
        self.root
    }

    /// Sets the root task.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the tree already has a root.
    pub fn add_child(&mut self, child: Task<E>) -> TaskResult<usize> {
        if self.root.is_some() {
            return Err(TaskError::illegal_state(
                "A behavior tree cannot have more than one root task",
            ));
        }
        self.root = Some(child);
        self.env.notify_child_added(Self::NAME, self.status, 0);
        Ok(0)
    }

    pub fn child_count(&self) -> usize {
        usize::from(self.root.is_some())
    }

    pub fn child(&self, index: usize) -> TaskResult<&Task<E>> {
        match (&self.root, index) {
            (Some(root), 0) => Ok(root),
            _ => Err(TaskError::IndexOutOfBounds {
                index,
                size: self.child_count(),
            }),
        }
    }

    pub fn guard(&self) -> Option<&Task<E>> {
        self.guard.as_deref()
    }

    pub fn guard_mut(&mut self) -> Option<&mut Task<E>> {
        self.guard.as_deref_mut()
    }

    pub fn set_guard(&mut self, guard: Option<Task<E>>) -> Option<Task<E>> {
        std::mem::replace(&mut self.guard, guard.map(Box::new)).map(|guard| *guard)
    }

    /// Source lazy includes resolve their subtrees through.
    pub fn set_subtree_source(&mut self, source: Option<Arc<dyn SubtreeSource<E>>>) {
        self.env.subtrees = source;
    }

    pub fn has_subtree_source(&self) -> bool {
        self.env.subtrees.is_some()
    }

    pub fn semaphores(&self) -> Option<&SemaphoreRepository> {
        self.env.semaphores.as_ref()
    }

    /// Repository semaphore guards look their semaphores up in.
    pub fn set_semaphores(&mut self, semaphores: Option<SemaphoreRepository>) {
        self.env.semaphores = semaphores;
    }

    pub fn timepiece(&self) -> &Timepiece {
        &self.env.timepiece
    }

    pub fn timepiece_mut(&mut self) -> &mut Timepiece {
        &mut self.env.timepiece
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.env.rng
    }

    pub fn reseed(&mut self, seed: u64) {
        self.env.rng = StdRng::seed_from_u64(seed);
    }

    pub fn add_listener<L: TreeListener + 'static>(&mut self, listener: L) {
        self.env
            .listeners
            .get_or_insert_with(Vec::new)
            .push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.env.listeners.as_ref().map_or(0, Vec::len)
    }

    pub fn remove_listeners(&mut self) {
        if let Some(listeners) = self.env.listeners.as_mut() {
            listeners.clear();
        }
    }

    /// Evaluates the tree once.
    ///
    /// A failing tree guard fails the tree without touching the root. A tree
    /// without a root does nothing.
    pub fn step(&mut self) -> TaskResult<()> {
        let Some(root) = self.root.as_mut() else {
            trace!(tree = self.env.id.get(), "step skipped: no root task");
            return Ok(());
        };
        trace!(tree = self.env.id.get(), root = root.name(), "step");

        if let Some(guard) = self.guard.as_deref_mut() {
            if !evaluate_guard(guard, &mut self.env)? {
                self.update_status(Status::Failed);
                return Ok(());
            }
        }

        if let Some(report) = root.execute_in(Control::Tree, &mut self.env)? {
            self.update_status(report);
        }
        Ok(())
    }

    /// Advances the timepiece by `delta_time` seconds and steps the tree.
    pub fn update(&mut self, delta_time: f32) -> TaskResult<()> {
        self.env.timepiece.update(delta_time);
        self.step()
    }

    /// Evaluates the guard chain of a task in this tree's environment.
    pub fn check_guard(&mut self, task: &mut Task<E>) -> TaskResult<bool> {
        task.check_guard_in(&mut self.env)
    }

    /// Cancels the running root, if any.
    pub fn cancel(&mut self) {
        if let Some(root) = self.root.as_mut() {
            if root.status() == Status::Running {
                root.cancel_in(&mut self.env);
            }
        }
        if self.status == Status::Running {
            self.update_status(Status::Cancelled);
        }
    }

    /// Re-arms the root for another run; listeners and blackboard are kept.
    pub fn reset_task(&mut self) {
        if let Some(root) = self.root.as_mut() {
            root.reset_task_in(&mut self.env);
        }
        self.status = Status::Fresh;
    }

    /// Clears the tree completely, shared services included.
    pub fn reset(&mut self) {
        self.env.listeners = None;
        self.env.subtrees = None;
        self.env.semaphores = None;
        self.env.object = None;
        self.root = None;
        self.guard = None;
        self.status = Status::Fresh;
    }

    /// Copies the task structure into a new tree. The blackboard object and
    /// listeners are not copied; the subtree source and semaphores are shared.
    pub fn clone_tree(&self) -> BehaviorTree<E> {
        BehaviorTree {
            root: self.root.as_ref().map(Task::clone_task),
            guard: self.guard.as_ref().map(|guard| Box::new(guard.clone_task())),
            status: Status::Fresh,
            env: self.env.derive(),
        }
    }

    /// Like [`clone_tree`](Self::clone_tree) with a custom task cloner.
    pub fn clone_with(&self, cloner: &mut dyn TaskCloner<E>) -> TaskResult<BehaviorTree<E>> {
        let root = self
            .root
            .as_ref()
            .map(|root| root.clone_with(cloner))
            .transpose()?;
        let guard = self
            .guard
            .as_ref()
            .map(|guard| guard.clone_with(cloner).map(Box::new))
            .transpose()?;
        Ok(BehaviorTree {
            root,
            guard,
            status: Status::Fresh,
            env: self.env.derive(),
        })
    }

    fn update_status(&mut self, status: Status) {
        let previous = std::mem::replace(&mut self.status, status);
        self.env.notify_status(Self::NAME, status, previous);
    }
}

impl<E: 'static> Default for BehaviorTree<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for BehaviorTree<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTree")
            .field("id", &self.env.id)
            .field("status", &self.status)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::behavior::Behavior;
    use crate::composite::Sequence;
    use crate::context::TaskContext;
    use crate::leaf::{Failure, Success};

    #[derive(Debug, Clone)]
    struct CountDown;

    impl Behavior<u32> for CountDown {
        fn name(&self) -> &'static str {
            "countDown"
        }

        fn run(&mut self, cx: &mut TaskContext<'_, u32>) -> TaskResult<()> {
            let left = cx.object_mut()?;
            if *left == 0 {
                cx.success();
            } else {
                *left -= 1;
                cx.running();
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl TreeListener for Recorder {
        fn status_updated(&mut self, task: TaskRef<'_>, previous_status: Status) {
            if let Ok(mut log) = self.0.lock() {
                log.push(format!("{}:{}->{}", task.name, previous_status, task.status));
            }
        }

        fn child_added(&mut self, task: TaskRef<'_>, index: usize) {
            if let Ok(mut log) = self.0.lock() {
                log.push(format!("{}+{}", task.name, index));
            }
        }
    }

    #[test]
    fn step_without_root_is_a_no_op() {
        let mut tree = BehaviorTree::<()>::new();
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Fresh);
    }

    #[test]
    fn second_root_is_rejected() {
        let mut tree = BehaviorTree::<()>::new();
        tree.add_child(Task::new(Success)).unwrap();
        let err = tree.add_child(Task::new(Success)).unwrap_err();
        assert_eq!(err.to_string(), "A behavior tree cannot have more than one root task");
        assert_eq!(tree.child_count(), 1);
    }

    #[test]
    fn running_root_is_resumed_not_restarted() {
        let mut tree = BehaviorTree::with_root(Task::new(CountDown)).with_object(2);
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Running);
        assert_eq!(tree.root().unwrap().control(), Some(Control::Tree));
        assert_eq!(tree.root().unwrap().tree_id(), Some(tree.id()));
        tree.step().unwrap();
        assert_eq!(tree.object(), Some(&0));
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
    }

    #[test]
    fn missing_blackboard_is_an_illegal_state() {
        let mut tree = BehaviorTree::<u32>::with_root(Task::new(CountDown));
        assert!(matches!(tree.step(), Err(TaskError::IllegalState(_))));
    }

    #[test]
    fn failing_tree_guard_skips_the_root() {
        let mut tree = BehaviorTree::<()>::with_root(Task::new(Success));
        tree.set_guard(Some(Task::new(Failure)));
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Failed);
        assert_eq!(tree.root().unwrap().status(), Status::Fresh);
    }

    #[test]
    fn listeners_observe_status_changes() {
        let recorder = Recorder::default();
        let mut tree = BehaviorTree::<()>::new();
        tree.add_listener(recorder.clone());
        tree.add_child(Task::new(Sequence::new()).with_child(Task::new(Success)).unwrap())
            .unwrap();
        tree.step().unwrap();

        let log = recorder.0.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "behaviorTree+0",
                "success:FRESH->SUCCEEDED",
                "sequence:FRESH->SUCCEEDED",
                "behaviorTree:FRESH->SUCCEEDED",
            ]
        );
    }

    #[test]
    fn reset_drops_listeners_but_reset_task_keeps_them() {
        let mut tree = BehaviorTree::<()>::with_root(Task::new(Success));
        tree.add_listener(TracingListener);
        tree.step().unwrap();

        tree.reset_task();
        assert_eq!(tree.listener_count(), 1);
        assert_eq!(tree.status(), Status::Fresh);
        assert_eq!(tree.root().unwrap().status(), Status::Fresh);

        tree.reset();
        assert_eq!(tree.listener_count(), 0);
        assert!(tree.root().is_none());
    }

    #[test]
    fn clone_copies_structure_but_not_blackboard() {
        let mut tree = BehaviorTree::with_root(Task::new(CountDown)).with_object(5);
        tree.add_listener(TracingListener);
        tree.step().unwrap();

        let clone = tree.clone_tree();
        assert_ne!(clone.id(), tree.id());
        assert!(clone.object().is_none());
        assert_eq!(clone.listener_count(), 0);
        assert_eq!(clone.status(), Status::Fresh);
        assert!(clone.root().unwrap().is::<CountDown>());
        assert_eq!(clone.root().unwrap().status(), Status::Fresh);
    }

    #[test]
    fn cancel_stops_a_running_root() {
        let mut tree = BehaviorTree::with_root(Task::new(CountDown)).with_object(3);
        tree.step().unwrap();
        tree.cancel();
        assert_eq!(tree.status(), Status::Cancelled);
        assert_eq!(tree.root().unwrap().status(), Status::Cancelled);
    }
}
