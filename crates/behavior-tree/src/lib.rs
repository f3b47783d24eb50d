//! Resumable behavior tree engine.
//!
//! Trees are made of [`Task`] nodes. Each task owns its status, an optional
//! guard and its children, and delegates decisions to a [`Behavior`]. A
//! [`BehaviorTree`] owns the root task together with the blackboard object,
//! a seeded random source, a [`Timepiece`] and status listeners.
//!
//! - **Resumable**: a task reporting `Running` is resumed on the next step
//! - **Guards**: a guard must succeed in one step before its task may run
//! - **Owned structure**: no back-pointers; parents reach children through
//!   a [`TaskContext`] handed to every protocol call
//! - **DSL**: trees can be written as indented text and loaded through a
//!   [`BehaviorTreeParser`] or a cached [`BehaviorTreeLibrary`]
//!
//! # Architecture
//!
//! - [`Behavior`]: decision logic of one task kind
//! - Leaf tasks: [`Success`], [`Failure`], [`Wait`], [`FnTask`]
//! - Composite tasks: [`Sequence`], [`Selector`], [`Parallel`],
//!   [`DynamicGuardSelector`]
//! - Decorator tasks: [`Inverter`], [`AlwaysSucceed`], [`AlwaysFail`],
//!   [`UntilSuccess`], [`UntilFail`], [`Repeat`], [`Random`], [`Include`],
//!   [`SemaphoreGuard`]

pub mod behavior;
pub mod builder;
pub mod clone;
pub mod composite;
pub mod config;
pub mod context;
pub mod decorator;
pub mod distribution;
pub mod error;
pub mod leaf;
pub mod library;
pub mod parser;
pub mod semaphore;
pub mod status;
pub mod task;
pub mod timepiece;
pub mod tree;

pub use behavior::{Behavior, TaskConstraint};
pub use clone::{DeepCloner, TaskCloner};
pub use composite::{
    DynamicGuardSelector, Orchestrator, Parallel, Policy, Selector, Sequence,
    SingleRunningChildBranch,
};
pub use config::LibraryConfig;
pub use context::TaskContext;
pub use decorator::{
    AlwaysFail, AlwaysSucceed, Include, Inverter, LoopDecorator, Random, Repeat, SemaphoreGuard,
    UntilFail, UntilSuccess,
};
pub use distribution::{
    Distribution, DistributionKind, DoubleDistribution, FloatDistribution, IntegerDistribution,
    LongDistribution,
};
pub use error::{
    AttributeError, BoxError, DistributionFormatError, LibraryError, LibraryResult, ParseError,
    ParseResult, TaskError, TaskResult,
};
pub use leaf::{Failure, FnTask, Success, Wait};
pub use library::{
    BehaviorTreeLibrary, BehaviorTreeLibraryManager, FileResolver, InMemoryResolver,
    PooledBehaviorTreeLibrary, SubtreeSource, TreeLibrary, TreeResolver,
};
pub use parser::{BehaviorTreeParser, DebugLevel, DistributionAdapters, TaskRegistry};
pub use semaphore::{NonBlockingSemaphore, SemaphoreRepository};
pub use status::Status;
pub use task::{Control, Task, TreeId};
pub use timepiece::Timepiece;
pub use tree::{BehaviorTree, TaskRef, TracingListener, TreeListener};
