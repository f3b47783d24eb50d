use rand::Rng;

use crate::behavior::{Behavior, TaskConstraint};
use crate::context::TaskContext;
use crate::decorator::run_decorated;
use crate::distribution::{DistributionKind, FloatDistribution};
use crate::error::{AttributeError, TaskResult};
use crate::parser::{AttributeKind, AttributeSpec, AttributeValue};

/// Succeeds with a sampled probability.
///
/// Without a child the decision is made immediately. With a child, the
/// decision is made once the child finishes, ignoring the child's result.
#[derive(Debug, Clone)]
pub struct Random {
    success: FloatDistribution,
    probability: f32,
}

impl Random {
    const ATTRIBUTES: &'static [AttributeSpec] = &[AttributeSpec::new(
        "success",
        AttributeKind::Distribution(DistributionKind::Float),
    )];

    pub fn new(success: FloatDistribution) -> Self {
        Self {
            success,
            probability: 0.0,
        }
    }

    pub fn success(&self) -> FloatDistribution {
        self.success
    }

    fn decide<E: 'static>(&self, cx: &mut TaskContext<'_, E>) {
        if cx.rng().r#gen::<f32>() <= self.probability {
            cx.success();
        } else {
            cx.fail();
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new(FloatDistribution::Constant(0.5))
    }
}

impl<E: 'static> Behavior<E> for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn constraint(&self) -> TaskConstraint {
        TaskConstraint::new(0, 1)
    }

    fn attributes(&self) -> &'static [AttributeSpec] {
        Self::ATTRIBUTES
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), AttributeError> {
        match name {
            "success" => self.success = value.into_float_distribution(name)?,
            _ => return Err(AttributeError::Unknown { name: name.into() }),
        }
        Ok(())
    }

    fn start(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        self.probability = self.success.next_float(cx.rng());
        Ok(())
    }

    fn run(&mut self, cx: &mut TaskContext<'_, E>) -> TaskResult<()> {
        if cx.child_count() > 0 {
            run_decorated(self, cx)
        } else {
            self.decide(cx);
            Ok(())
        }
    }

    fn child_running(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        cx.running();
        Ok(())
    }

    fn child_success(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.decide(cx);
        Ok(())
    }

    fn child_fail(&mut self, cx: &mut TaskContext<'_, E>, _index: usize) -> TaskResult<()> {
        self.decide(cx);
        Ok(())
    }

    fn reset_task(&mut self) {
        self.probability = 0.0;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::tests::{Scripted, runs};
    use crate::{BehaviorTree, Status, Task};

    #[test]
    fn certain_outcomes() {
        let mut always = BehaviorTree::<()>::with_root(Task::new(Random::new(
            FloatDistribution::Constant(1.0),
        )));
        always.step().unwrap();
        assert_eq!(always.status(), Status::Succeeded);

        let mut never = BehaviorTree::<()>::with_root(Task::new(Random::new(
            FloatDistribution::Constant(-1.0),
        )));
        never.step().unwrap();
        assert_eq!(never.status(), Status::Failed);
    }

    #[test]
    fn decides_after_child_finishes() {
        let root = Task::<()>::new(Random::new(FloatDistribution::Constant(1.0)))
            .with_child(Scripted::task(Status::Failed))
            .unwrap();
        let mut tree = BehaviorTree::with_root(root);
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
        assert_eq!(runs(tree.root().unwrap().child(0).unwrap()), 1);
    }

    #[test]
    fn seeded_trees_decide_identically() {
        let outcomes = |seed| {
            let mut tree = BehaviorTree::<()>::with_root(Task::new(Random::default())).with_seed(seed);
            (0..16)
                .map(|_| {
                    tree.step().map(|_| tree.status())
                })
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        };
        assert_eq!(outcomes(21), outcomes(21));
    }

    #[test]
    fn accepts_at_most_one_child() {
        let mut task = Task::<()>::new(Random::default());
        task.add_child(Task::new(crate::leaf::Success)).unwrap();
        assert!(task.add_child(Task::new(crate::leaf::Success)).is_err());
    }
}
