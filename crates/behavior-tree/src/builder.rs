//! Builder utilities for ergonomic behavior tree construction.
//!
//! Instead of `Task::new(Sequence::new()).with_child(a)?.with_child(b)?`,
//! write `sequence(vec![a, b])`. Every helper produces a kind whose child
//! limits its argument list already satisfies, so none of them can fail.

use crate::composite::{DynamicGuardSelector, Orchestrator, Parallel, Policy, Selector, Sequence};
use crate::decorator::{
    AlwaysFail, AlwaysSucceed, Inverter, Random, Repeat, UntilFail, UntilSuccess,
};
use crate::distribution::{FloatDistribution, IntegerDistribution};
use crate::leaf::{Failure, FnTask, Success, Wait};
use crate::status::Status;
use crate::task::Task;

fn branch<E: 'static>(task: Task<E>, children: Vec<Task<E>>) -> Task<E> {
    task.with_children_unchecked(children)
}

fn decorated<E: 'static>(task: Task<E>, child: Task<E>) -> Task<E> {
    task.with_children_unchecked(vec![child])
}

#[inline]
pub fn sequence<E: 'static>(children: Vec<Task<E>>) -> Task<E> {
    branch(Task::new(Sequence::new()), children)
}

#[inline]
pub fn selector<E: 'static>(children: Vec<Task<E>>) -> Task<E> {
    branch(Task::new(Selector::new()), children)
}

#[inline]
pub fn random_sequence<E: 'static>(children: Vec<Task<E>>) -> Task<E> {
    branch(Task::new(Sequence::random()), children)
}

#[inline]
pub fn random_selector<E: 'static>(children: Vec<Task<E>>) -> Task<E> {
    branch(Task::new(Selector::random()), children)
}

pub fn parallel<E: 'static>(
    policy: Policy,
    orchestrator: Orchestrator,
    children: Vec<Task<E>>,
) -> Task<E> {
    branch(Task::new(Parallel::new(policy, orchestrator)), children)
}

/// Children are tried in priority order; each should carry a guard.
#[inline]
pub fn dynamic_guard_selector<E: 'static>(children: Vec<Task<E>>) -> Task<E> {
    branch(Task::new(DynamicGuardSelector::default()), children)
}

#[inline]
pub fn inverter<E: 'static>(child: Task<E>) -> Task<E> {
    decorated(Task::new(Inverter), child)
}

#[inline]
pub fn always_succeed<E: 'static>(child: Task<E>) -> Task<E> {
    decorated(Task::new(AlwaysSucceed), child)
}

#[inline]
pub fn always_fail<E: 'static>(child: Task<E>) -> Task<E> {
    decorated(Task::new(AlwaysFail), child)
}

#[inline]
pub fn until_fail<E: 'static>(child: Task<E>) -> Task<E> {
    decorated(Task::new(UntilFail::new()), child)
}

#[inline]
pub fn until_success<E: 'static>(child: Task<E>) -> Task<E> {
    decorated(Task::new(UntilSuccess::new()), child)
}

pub fn repeat<E: 'static>(times: IntegerDistribution, child: Task<E>) -> Task<E> {
    decorated(Task::new(Repeat::new(times)), child)
}

/// A random decorator; without a child it acts as a leaf.
pub fn random<E: 'static>(success: FloatDistribution, child: Option<Task<E>>) -> Task<E> {
    let task = Task::new(Random::new(success));
    match child {
        Some(child) => decorated(task, child),
        None => task,
    }
}

#[inline]
pub fn success<E: 'static>() -> Task<E> {
    Task::new(Success)
}

#[inline]
pub fn failure<E: 'static>() -> Task<E> {
    Task::new(Failure)
}

#[inline]
pub fn wait<E: 'static>(seconds: FloatDistribution) -> Task<E> {
    Task::new(Wait::new(seconds))
}

/// A leaf running `func` against the blackboard object.
pub fn leaf<E, F>(name: &'static str, func: F) -> Task<E>
where
    E: 'static,
    F: Fn(&mut E) -> Status + Send + Sync + 'static,
{
    Task::new(FnTask::new(name, func))
}

/// Attaches `guard` to `task`.
#[inline]
pub fn guarded<E: 'static>(guard: Task<E>, task: Task<E>) -> Task<E> {
    task.with_guard(guard)
}
