//! Branch tasks.
//!
//! Branches hold an ordered list of children and decide which of them run:
//! [`Sequence`] (AND logic), [`Selector`] (OR logic), their randomized
//! variants, [`Parallel`] and [`DynamicGuardSelector`].
//!
//! Selectors and sequences run one child at a time. Their shared cursor
//! bookkeeping lives in [`SingleRunningChildBranch`].

mod dynamic_guard_selector;
mod parallel;
mod selector;
mod sequence;

use rand::Rng;

use crate::behavior::Behavior;
use crate::context::TaskContext;
use crate::error::TaskResult;

pub use dynamic_guard_selector::DynamicGuardSelector;
pub use parallel::{Orchestrator, Parallel, Policy};
pub use selector::Selector;
pub use sequence::Sequence;

/// Cursor state of a branch that runs exactly one child at a time.
///
/// In randomized mode the visiting order is a permutation of the child
/// indices, shuffled lazily: each time the cursor reaches a position the
/// entry there is swapped with a random entry at or after it. Every child is
/// visited exactly once per pass and each pass gets a fresh order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleRunningChildBranch {
    running_child: Option<usize>,
    current_child_index: usize,
    random_children: Option<Vec<usize>>,
    randomized: bool,
}

impl SingleRunningChildBranch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn randomized() -> Self {
        Self {
            randomized: true,
            ..Self::default()
        }
    }

    pub fn is_randomized(&self) -> bool {
        self.randomized
    }

    pub fn running_child(&self) -> Option<usize> {
        self.running_child
    }

    pub fn current_child_index(&self) -> usize {
        self.current_child_index
    }

    /// Visiting order of a randomized branch, once it has started.
    pub fn random_children(&self) -> Option<&[usize]> {
        self.random_children.as_deref()
    }

    /// Snapshot of the child order that the random selection shuffles.
    pub fn create_random_children(child_count: usize) -> Vec<usize> {
        (0..child_count).collect()
    }

    pub fn start(&mut self, child_count: usize) {
        self.current_child_index = 0;
        self.running_child = None;
        if self.randomized
            && self
                .random_children
                .as_ref()
                .is_none_or(|order| order.len() != child_count)
        {
            self.random_children = Some(Self::create_random_children(child_count));
        }
    }

    pub(crate) fn set_running(&mut self, index: usize) {
        self.running_child = Some(index);
    }

    /// Forgets the running child after it reported success or failure.
    pub fn child_finished(&mut self) {
        self.running_child = None;
    }

    pub(crate) fn advance(&mut self) {
        self.current_child_index += 1;
    }

    pub(crate) fn cancelled(&mut self) {
        self.running_child = None;
    }

    pub fn reset_task(&mut self) {
        self.current_child_index = 0;
        self.running_child = None;
        self.random_children = None;
    }

    /// Child index at the cursor, swapping a random later entry into place
    /// first when randomized.
    fn select<R: Rng + ?Sized>(&mut self, rng: &mut R, child_count: usize) -> usize {
        let cursor = self.current_child_index;
        match self.random_children.as_mut() {
            Some(order) if order.len() == child_count => {
                let last = child_count - 1;
                if cursor < last {
                    let other = rng.gen_range(cursor..=last);
                    order.swap(cursor, other);
                }
                order[cursor]
            }
            _ => cursor,
        }
    }
}

/// Branch kinds built on [`SingleRunningChildBranch`].
pub trait SingleRunningBranch {
    fn branch(&self) -> &SingleRunningChildBranch;

    fn branch_mut(&mut self) -> &mut SingleRunningChildBranch;
}

/// Resumes the running child, or starts the child at the cursor.
///
/// Does nothing once the cursor has passed the last child.
pub(crate) fn run_single_running<E, B>(owner: &mut B, cx: &mut TaskContext<'_, E>) -> TaskResult<()>
where
    E: 'static,
    B: Behavior<E> + SingleRunningBranch + ?Sized,
{
    if let Some(index) = owner.branch().running_child() {
        let report = cx.step_child(index)?;
        return owner.deliver(cx, index, report);
    }

    let child_count = cx.child_count();
    if owner.branch().current_child_index() >= child_count {
        return Ok(());
    }

    let index = owner.branch_mut().select(cx.rng(), child_count);
    owner.branch_mut().set_running(index);
    cx.start_child(index)?;
    if cx.check_child_guard(index)? {
        run_single_running(owner, cx)
    } else {
        let report = cx.fail_child(index)?;
        owner.deliver(cx, index, report)
    }
}
