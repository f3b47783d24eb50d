//! Task kinds known to the parser.
//!
//! Kinds are registered under a qualified type name and referred to from
//! the DSL through aliases, either registered up front or declared with an
//! `import alias:"type"` line.

use std::collections::BTreeMap;
use std::fmt;

use crate::behavior::Behavior;
use crate::composite::{DynamicGuardSelector, Parallel, Selector, Sequence};
use crate::decorator::{
    AlwaysFail, AlwaysSucceed, Include, Inverter, Random, Repeat, SemaphoreGuard, UntilFail,
    UntilSuccess,
};
use crate::leaf::{Failure, Success, Wait};

type Factory<E> = Box<dyn Fn() -> Box<dyn Behavior<E>> + Send + Sync>;

pub struct TaskRegistry<E> {
    factories: BTreeMap<String, Factory<E>>,
    aliases: BTreeMap<String, String>,
}

impl<E: 'static> TaskRegistry<E> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in kinds and their default aliases.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_default::<Selector>("behavior_tree::composite::Selector", "selector");
        registry.register_default::<Sequence>("behavior_tree::composite::Sequence", "sequence");
        registry.register_default::<Parallel>("behavior_tree::composite::Parallel", "parallel");
        registry.register_default::<DynamicGuardSelector>(
            "behavior_tree::composite::DynamicGuardSelector",
            "dynamicGuardSelector",
        );
        registry.register_with("behavior_tree::composite::RandomSelector", Selector::random);
        registry.alias("randomSelector", "behavior_tree::composite::RandomSelector");
        registry.register_with("behavior_tree::composite::RandomSequence", Sequence::random);
        registry.alias("randomSequence", "behavior_tree::composite::RandomSequence");

        registry.register_default::<AlwaysFail>("behavior_tree::decorator::AlwaysFail", "alwaysFail");
        registry.register_default::<AlwaysSucceed>(
            "behavior_tree::decorator::AlwaysSucceed",
            "alwaysSucceed",
        );
        registry.register_default::<Include>("behavior_tree::decorator::Include", "include");
        registry.register_default::<Inverter>("behavior_tree::decorator::Inverter", "invert");
        registry.register_default::<Random>("behavior_tree::decorator::Random", "random");
        registry.register_default::<Repeat>("behavior_tree::decorator::Repeat", "repeat");
        registry.register_default::<SemaphoreGuard>(
            "behavior_tree::decorator::SemaphoreGuard",
            "semaphoreGuard",
        );
        registry.register_default::<UntilFail>("behavior_tree::decorator::UntilFail", "untilFail");
        registry.register_default::<UntilSuccess>(
            "behavior_tree::decorator::UntilSuccess",
            "untilSuccess",
        );

        registry.register_default::<Success>("behavior_tree::leaf::Success", "success");
        registry.register_default::<Failure>("behavior_tree::leaf::Failure", "failure");
        registry.register_default::<Wait>("behavior_tree::leaf::Wait", "wait");
        registry
    }

    fn register_default<B>(&mut self, type_name: &str, alias: &str)
    where
        B: Behavior<E> + Default + 'static,
    {
        self.register::<B>(type_name);
        self.alias(alias, type_name);
    }

    /// Registers a kind constructed through `Default`.
    pub fn register<B>(&mut self, type_name: impl Into<String>)
    where
        B: Behavior<E> + Default + 'static,
    {
        self.register_with(type_name, B::default);
    }

    pub fn register_with<B, F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        B: Behavior<E> + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        self.factories.insert(
            type_name.into(),
            Box::new(move || Box::new(factory()) as Box<dyn Behavior<E>>),
        );
    }

    /// Maps `alias` to a registered type. Returns `false` if the type is
    /// unknown.
    pub fn alias(&mut self, alias: impl Into<String>, type_name: &str) -> bool {
        if !self.factories.contains_key(type_name) {
            return false;
        }
        self.aliases.insert(alias.into(), type_name.to_string());
        true
    }

    pub fn contains_type(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Resolves an alias or a type name to a registered type name.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        match self.aliases.get(name) {
            Some(type_name) => Some(type_name.as_str()),
            None if self.factories.contains_key(name) => Some(name),
            None => None,
        }
    }

    pub fn instantiate(&self, name: &str) -> Option<Box<dyn Behavior<E>>> {
        let type_name = self.resolve(name)?;
        self.factories.get(type_name).map(|factory| factory())
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(alias, type_name)| (alias.as_str(), type_name.as_str()))
    }
}

impl<E: 'static> Default for TaskRegistry<E> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<E> fmt::Debug for TaskRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::FnTask;
    use crate::status::Status;

    #[test]
    fn default_aliases_resolve() {
        let registry = TaskRegistry::<()>::with_defaults();
        for alias in [
            "alwaysFail",
            "alwaysSucceed",
            "dynamicGuardSelector",
            "failure",
            "include",
            "invert",
            "parallel",
            "random",
            "randomSelector",
            "randomSequence",
            "repeat",
            "selector",
            "semaphoreGuard",
            "sequence",
            "success",
            "untilFail",
            "untilSuccess",
            "wait",
        ] {
            assert!(registry.instantiate(alias).is_some(), "{alias}");
        }
        assert_eq!(
            registry.instantiate("randomSelector").map(|b| b.name()),
            Some("randomSelector")
        );
    }

    #[test]
    fn type_names_resolve_directly() {
        let registry = TaskRegistry::<()>::with_defaults();
        assert_eq!(
            registry.resolve("behavior_tree::leaf::Success"),
            Some("behavior_tree::leaf::Success")
        );
        assert!(registry.instantiate("no_such_task").is_none());
    }

    #[test]
    fn custom_kinds_and_aliases() {
        let mut registry = TaskRegistry::<i32>::new();
        registry.register_with("game::Bump", || {
            FnTask::new("bump", |value: &mut i32| {
                *value += 1;
                Status::Succeeded
            })
        });
        assert!(!registry.alias("missing", "game::Missing"));
        assert!(registry.alias("bump", "game::Bump"));
        assert_eq!(registry.instantiate("bump").map(|b| b.name()), Some("bump"));
        assert_eq!(registry.aliases().count(), 1);
    }
}
