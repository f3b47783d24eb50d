//! Archetype tree libraries.
//!
//! A library parses each referenced tree once, keeps it as an archetype and
//! hands out clones. Sources are loaded through a [`TreeResolver`]:
//!
//! - [`FileResolver`] reads `{base_dir}/{reference}[.{extension}]`
//! - [`InMemoryResolver`] serves sources registered up front
//!
//! [`PooledBehaviorTreeLibrary`] additionally recycles disposed trees, and
//! [`BehaviorTreeLibraryManager`] lets an application swap the active
//! library at runtime.
//!
//! Eager [`Include`] tasks are grafted when a tree or root task is created:
//! each one is replaced by a copy of the referenced archetype's root. Lazy
//! includes resolve at run time through the tree's [`SubtreeSource`].

mod manager;
mod pool;
mod pooled;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::clone::TaskCloner;
use crate::decorator::Include;
use crate::error::{LibraryError, LibraryResult, ParseError, TaskError};
use crate::parser::BehaviorTreeParser;
use crate::task::Task;
use crate::tree::BehaviorTree;

pub use manager::BehaviorTreeLibraryManager;
pub use pool::Pool;
pub use pooled::PooledBehaviorTreeLibrary;

/// Loads the DSL source of a tree reference.
pub trait TreeResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> io::Result<String>;
}

#[derive(Debug, Clone)]
pub struct FileResolver {
    base_dir: PathBuf,
    extension: Option<String>,
}

impl FileResolver {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            extension: None,
        }
    }

    /// Appends `.{extension}` to references that do not already end with it.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path(&self, reference: &str) -> PathBuf {
        match &self.extension {
            Some(extension) if !reference.ends_with(&format!(".{extension}")) => {
                self.base_dir.join(format!("{reference}.{extension}"))
            }
            _ => self.base_dir.join(reference),
        }
    }
}

impl TreeResolver for FileResolver {
    fn resolve(&self, reference: &str) -> io::Result<String> {
        fs::read_to_string(self.path(reference))
    }
}

/// Resolver over sources held in memory, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolver {
    sources: HashMap<String, String>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, reference: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(reference, source);
        self
    }

    pub fn insert(&mut self, reference: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(reference.into(), source.into());
    }
}

impl TreeResolver for InMemoryResolver {
    fn resolve(&self, reference: &str) -> io::Result<String> {
        self.sources.get(reference).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no behavior tree source for `{reference}`"),
            )
        })
    }
}

/// Operations shared by the plain and the pooled library.
pub trait TreeLibrary<E> {
    /// Stores `tree` as the archetype for `reference`, replacing any previous
    /// one.
    fn register_archetype_tree(&mut self, reference: &str, tree: BehaviorTree<E>);

    fn has_archetype_tree(&self, reference: &str) -> bool;

    /// Returns the cached archetype, loading and parsing it on first use.
    fn retrieve_archetype_tree(&mut self, reference: &str) -> LibraryResult<&BehaviorTree<E>>;

    /// A fresh copy of the archetype's root task.
    fn create_root_task(&mut self, reference: &str) -> LibraryResult<Task<E>>;

    /// A fresh copy of the archetype bound to `object`.
    fn create_behavior_tree(
        &mut self,
        reference: &str,
        object: Option<E>,
    ) -> LibraryResult<BehaviorTree<E>>;

    /// Hands a tree created from `reference` back to the library.
    fn dispose_behavior_tree(&mut self, reference: &str, tree: BehaviorTree<E>);
}

/// Creates subtree root tasks for lazy includes while a tree runs.
pub trait SubtreeSource<E>: Send + Sync {
    fn create_subtree(&self, reference: &str) -> LibraryResult<Task<E>>;
}

/// A library shared behind a mutex serves the trees it created. Trees
/// holding it must not be stepped while the lock is held.
impl<E, L> SubtreeSource<E> for Mutex<L>
where
    L: TreeLibrary<E> + Send,
{
    fn create_subtree(&self, reference: &str) -> LibraryResult<Task<E>> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .create_root_task(reference)
    }
}

pub struct BehaviorTreeLibrary<E> {
    parser: BehaviorTreeParser<E>,
    resolver: Box<dyn TreeResolver>,
    archetypes: HashMap<String, BehaviorTree<E>>,
    cloner: Option<Box<dyn TaskCloner<E>>>,
}

impl<E: 'static> BehaviorTreeLibrary<E> {
    pub fn new<R: TreeResolver + 'static>(resolver: R) -> Self {
        Self::with_parser(BehaviorTreeParser::new(), resolver)
    }

    pub fn with_parser<R: TreeResolver + 'static>(parser: BehaviorTreeParser<E>, resolver: R) -> Self {
        Self {
            parser,
            resolver: Box::new(resolver),
            archetypes: HashMap::new(),
            cloner: None,
        }
    }

    pub fn parser(&self) -> &BehaviorTreeParser<E> {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut BehaviorTreeParser<E> {
        &mut self.parser
    }

    /// Installs the strategy used to clone archetypes and free disposed
    /// roots. Without one, archetypes are deep-copied and disposed trees
    /// dropped.
    pub fn set_cloner(&mut self, cloner: Option<Box<dyn TaskCloner<E>>>) {
        self.cloner = cloner;
    }

    pub fn has_cloner(&self) -> bool {
        self.cloner.is_some()
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    fn archetype(&mut self, reference: &str) -> LibraryResult<&BehaviorTree<E>> {
        match self.archetypes.entry(reference.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!(reference, "archetype cache miss");
                let parse_error = |source| LibraryError::Parse {
                    reference: reference.to_string(),
                    source,
                };
                let source = self
                    .resolver
                    .resolve(reference)
                    .map_err(|err| parse_error(ParseError::Io(err)))?;
                let tree = self.parser.parse(&source, None).map_err(parse_error)?;
                Ok(entry.insert(tree))
            }
        }
    }

    /// Copy of the archetype's root with eager includes still in place.
    fn clone_root(&mut self, reference: &str) -> LibraryResult<Task<E>> {
        self.archetype(reference)?;
        let root = self
            .archetypes
            .get(reference)
            .and_then(BehaviorTree::root)
            .ok_or_else(|| {
                TaskError::IllegalState(format!("Archetype tree '{reference}' has no root task"))
            })?;
        let task = match self.cloner.as_deref_mut() {
            Some(cloner) => root.clone_with(cloner)?,
            None => root.clone_task(),
        };
        Ok(task)
    }

    /// Replaces every eager include under `task`, guards included, with the
    /// root of the referenced archetype. `chain` holds the references being
    /// expanded.
    fn graft_includes(&mut self, task: &mut Task<E>, chain: &mut Vec<String>) -> LibraryResult<()> {
        if let Some(guard) = task.guard_mut() {
            self.graft_includes(guard, chain)?;
        }
        let Some(include) = task.downcast_ref::<Include>().filter(|include| !include.is_lazy()) else {
            for index in 0..task.child_count() {
                self.graft_includes(task.child_mut(index)?, chain)?;
            }
            return Ok(());
        };
        let reference = include
            .subtree()
            .ok_or_else(|| TaskError::illegal_state("Include task has no subtree reference"))?
            .to_string();
        if chain.contains(&reference) {
            return Err(TaskError::IllegalState(format!("Recursive include of '{reference}'")).into());
        }
        debug!(reference = %reference, "grafting included subtree");

        chain.push(reference.clone());
        let mut root = self.clone_root(&reference)?;
        self.graft_includes(&mut root, chain)?;
        chain.pop();

        if let Some(guard) = task.set_guard(None) {
            if root.guard().is_some() {
                return Err(TaskError::IllegalState(format!(
                    "Included subtree '{reference}' already has a guard"
                ))
                .into());
            }
            root.set_guard(Some(guard));
        }
        *task = root;
        Ok(())
    }
}

impl<E: 'static> TreeLibrary<E> for BehaviorTreeLibrary<E> {
    fn register_archetype_tree(&mut self, reference: &str, tree: BehaviorTree<E>) {
        self.archetypes.insert(reference.to_string(), tree);
    }

    fn has_archetype_tree(&self, reference: &str) -> bool {
        self.archetypes.contains_key(reference)
    }

    fn retrieve_archetype_tree(&mut self, reference: &str) -> LibraryResult<&BehaviorTree<E>> {
        self.archetype(reference)
    }

    fn create_root_task(&mut self, reference: &str) -> LibraryResult<Task<E>> {
        let mut root = self.clone_root(reference)?;
        self.graft_includes(&mut root, &mut vec![reference.to_string()])?;
        Ok(root)
    }

    /// Copies the whole archetype, tree guard included.
    fn create_behavior_tree(
        &mut self,
        reference: &str,
        object: Option<E>,
    ) -> LibraryResult<BehaviorTree<E>> {
        self.archetype(reference)?;
        let archetype = self.archetypes.get(reference).ok_or_else(|| {
            TaskError::IllegalState(format!("Archetype tree '{reference}' is not loaded"))
        })?;
        let mut tree = match self.cloner.as_deref_mut() {
            Some(cloner) => archetype.clone_with(cloner)?,
            None => archetype.clone_tree(),
        };

        let mut chain = vec![reference.to_string()];
        if let Some(root) = tree.root_mut() {
            self.graft_includes(root, &mut chain)?;
        }
        if let Some(guard) = tree.guard_mut() {
            self.graft_includes(guard, &mut chain)?;
        }
        tree.set_object(object);
        Ok(tree)
    }

    fn dispose_behavior_tree(&mut self, reference: &str, tree: BehaviorTree<E>) {
        debug!(reference, "disposing behavior tree");
        if let (Some(cloner), Some(root)) = (self.cloner.as_deref_mut(), tree.into_root()) {
            cloner.free_task(root);
        }
    }
}

impl<E> std::fmt::Debug for BehaviorTreeLibrary<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTreeLibrary")
            .field("archetypes", &self.archetypes.keys().collect::<Vec<_>>())
            .field("cloner", &self.cloner.is_some())
            .finish()
    }
}
