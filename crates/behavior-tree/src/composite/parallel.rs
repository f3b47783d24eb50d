use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::error::{AttributeError, TaskResult};
use crate::parser::{AttributeKind, AttributeSpec, AttributeValue};
use crate::status::Status;

/// When a [`Parallel`] finishes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Policy {
    /// Fails as soon as one child fails; succeeds when all children succeed.
    #[default]
    Sequence,
    /// Succeeds as soon as one child succeeds; fails when all children fail.
    Selector,
}

/// How a [`Parallel`] treats children that already finished.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Orchestrator {
    /// Every child is run (resumed or restarted) on every step.
    #[default]
    Resume,
    /// Finished children wait until the parallel itself finishes; all
    /// children are then re-armed together.
    Join,
}

/// Runs all children in the same step.
///
/// The [`Policy`] decides the outcome, the [`Orchestrator`] decides whether
/// finished children are run again before the parallel completes. When the
/// parallel completes, children still running are cancelled.
#[derive(Debug, Clone)]
pub struct Parallel {
    policy: Policy,
    orchestrator: Orchestrator,
    no_running_tasks: bool,
    last_result: Option<bool>,
    current_child_index: usize,
}

impl Parallel {
    const ATTRIBUTES: &'static [AttributeSpec] = &[
        AttributeSpec::new("policy", AttributeKind::Enum(&["sequence", "selector"])),
        AttributeSpec::new("orchestrator", AttributeKind::Enum(&["resume", "join"])),
    ];

    pub fn new(policy: Policy, orchestrator: Orchestrator) -> Self {
        Self {
            policy,
            orchestrator,
            no_running_tasks: true,
            last_result: None,
            current_child_index: 0,
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn orchestrator(&self) -> Orchestrator {
        self.orchestrator
    }

    fn on_child_success(&self, child_count: usize, last_child_status: Status) -> Option<bool> {
        match self.policy {
            Policy::Sequence => {
                let all_done = match self.orchestrator {
                    Orchestrator::Join => last_child_status == Status::Succeeded,
                    Orchestrator::Resume => self.current_child_index + 1 == child_count,
                };
                (self.no_running_tasks && all_done).then_some(true)
            }
            Policy::Selector => Some(true),
        }
    }

    fn on_child_fail(&self, child_count: usize) -> Option<bool> {
        match self.policy {
            Policy::Sequence => Some(false),
            Policy::Selector => (self.no_running_tasks
                && self.current_child_index + 1 == child_count)
                .then_some(false),
        }
    }
}

impl Default for Parallel {
    fn default() -> Self {
        Self::new(Policy::default(), Orchestrator::default())
    }
}

impl<E: 'static> Behavior<E> for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::BRANCH
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        Self::ATTRIBUTES
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match name {
            "policy" => self.policy = value.into_enum(name)?,
            "orchestrator" => self.orchestrator = value.into_enum(name)?,
            _ => return Err(AttributeError::Unknown { name: name.into() }),
        }
        Ok(())
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        self.no_running_tasks = true;
        self.last_result = None;
        let child_count = cx.child_count();

        self.current_child_index = 0;
        while self.current_child_index < child_count {
            let index = self.current_child_index;
            let report = match self.orchestrator {
                Orchestrator::Resume => cx.run_child(index)?,
                Orchestrator::Join => match cx.child_status(index)? {
                    Status::Succeeded | Status::Failed => None,
                    _ => cx.run_child(index)?,
                },
            };
            self.deliver(cx, index, report)?;

            if let Some(result) = self.last_result {
                let first = if self.no_running_tasks { index + 1 } else { 0 };
                cx.cancel_running_children(first);
                if self.orchestrator == Orchestrator::Join {
                    cx.reset_children();
                }
                if result {
                    cx.success();
                } else {
                    cx.fail();
                }
                return Ok(());
            }
            self.current_child_index += 1;
        }
        cx.running();
        Ok(())
    }

    fn child_running(&mut self, _cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.no_running_tasks = false;
        Ok(())
    }

    fn child_success(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        let child_count = cx.child_count();
        let last_child_status = match child_count {
            0 => Status::Fresh,
            n => cx.child_status(n - 1)?,
        };
        self.last_result = self.on_child_success(child_count, last_child_status);
        Ok(())
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.last_result = self.on_child_fail(cx.child_count());
        Ok(())
    }

    fn reset_task(&mut self) {
        self.no_running_tasks = true;
        self.last_result = None;
        self.current_child_index = 0;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
