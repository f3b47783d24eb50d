use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::LibraryResult;
use crate::library::{BehaviorTreeLibrary, Pool, TreeLibrary, TreeResolver};
use crate::parser::BehaviorTreeParser;
use crate::task::Task;
use crate::tree::BehaviorTree;

/// Library that recycles disposed trees through one [`Pool`] per reference.
///
/// Disposed trees are re-armed with [`BehaviorTree::reset_task`] and lose
/// their blackboard object, listeners, subtree source and semaphores before
/// being pooled, so an obtained tree looks like a fresh clone of the
/// archetype.
pub struct PooledBehaviorTreeLibrary<E> {
    library: BehaviorTreeLibrary<E>,
    pools: HashMap<String, Pool<BehaviorTree<E>>>,
    pool_size: usize,
}

impl<E: 'static> PooledBehaviorTreeLibrary<E> {
    pub const DEFAULT_POOL_SIZE: usize = 16;

    pub fn new<R: TreeResolver + 'static>(resolver: R) -> Self {
        Self::from_library(BehaviorTreeLibrary::new(resolver))
    }

    pub fn with_parser<R: TreeResolver + 'static>(parser: BehaviorTreeParser<E>, resolver: R) -> Self {
        Self::from_library(BehaviorTreeLibrary::with_parser(parser, resolver))
    }

    pub fn from_library(library: BehaviorTreeLibrary<E>) -> Self {
        Self {
            library,
            pools: HashMap::new(),
            pool_size: Self::DEFAULT_POOL_SIZE,
        }
    }

    /// Maximum number of free trees kept per reference. Applies to pools
    /// created afterwards.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn library(&self) -> &BehaviorTreeLibrary<E> {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut BehaviorTreeLibrary<E> {
        &mut self.library
    }

    pub fn pool(&self, reference: &str) -> Option<&Pool<BehaviorTree<E>>> {
        self.pools.get(reference)
    }

    /// Drops the free trees of one reference.
    pub fn clear(&mut self, reference: &str) {
        if let Some(pool) = self.pools.get_mut(reference) {
            pool.clear();
        }
    }

    /// Drops the free trees of every reference.
    pub fn clear_all(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
    }
}

impl<E: 'static> TreeLibrary<E> for PooledBehaviorTreeLibrary<E> {
    /// Also drops pooled copies of a replaced archetype.
    fn register_archetype_tree(&mut self, reference: &str, tree: BehaviorTree<E>) {
        self.pools.remove(reference);
        self.library.register_archetype_tree(reference, tree);
    }

    fn has_archetype_tree(&self, reference: &str) -> bool {
        self.library.has_archetype_tree(reference)
    }

    fn retrieve_archetype_tree(&mut self, reference: &str) -> LibraryResult<&BehaviorTree<E>> {
        self.library.retrieve_archetype_tree(reference)
    }

    fn create_root_task(&mut self, reference: &str) -> LibraryResult<Task<E>> {
        self.library.create_root_task(reference)
    }

    fn create_behavior_tree(
        &mut self,
        reference: &str,
        object: Option<E>,
    ) -> LibraryResult<BehaviorTree<E>> {
        if let Some(mut tree) = self.pools.get_mut(reference).and_then(Pool::obtain) {
            debug!(reference, "reusing pooled behavior tree");
            tree.set_object(object);
            return Ok(tree);
        }
        self.library.create_behavior_tree(reference, object)
    }

    fn dispose_behavior_tree(&mut self, reference: &str, mut tree: BehaviorTree<E>) {
        tree.reset_task();
        tree.set_object(None);
        tree.remove_listeners();
        tree.set_subtree_source(None);
        tree.set_semaphores(None);
        let pool_size = self.pool_size;
        let pool = self
            .pools
            .entry(reference.to_string())
            .or_insert_with(|| Pool::new(pool_size));
        if !pool.free(tree) {
            warn!(reference, max = pool.max(), "behavior tree pool is full, dropping tree");
        }
    }
}

impl<E> std::fmt::Debug for PooledBehaviorTreeLibrary<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pools: HashMap<&str, usize> = self
            .pools
            .iter()
            .map(|(reference, pool)| (reference.as_str(), pool.free_count()))
            .collect();
        f.debug_struct("PooledBehaviorTreeLibrary")
            .field("library", &self.library)
            .field("pools", &pools)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::Sequence;
    use crate::library::InMemoryResolver;
    use crate::status::Status;
    use crate::tree::TracingListener;

    const REFERENCE: &str = "patrol";

    fn library() -> PooledBehaviorTreeLibrary<u32> {
        PooledBehaviorTreeLibrary::new(
            InMemoryResolver::new().with_source(REFERENCE, "sequence\n  success\n  wait seconds:1\n"),
        )
        .with_pool_size(2)
    }

    #[test]
    fn disposed_tree_is_reused_fresh() {
        let mut library = library();
        let mut tree = library.create_behavior_tree(REFERENCE, Some(7)).unwrap();
        tree.add_listener(TracingListener);
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Running);

        library.dispose_behavior_tree(REFERENCE, tree);
        assert_eq!(library.pool(REFERENCE).map(Pool::free_count), Some(1));

        let tree = library.create_behavior_tree(REFERENCE, Some(9)).unwrap();
        assert_eq!(library.pool(REFERENCE).map(Pool::free_count), Some(0));
        assert_eq!(tree.status(), Status::Fresh);
        assert_eq!(tree.object(), Some(&9));
        assert_eq!(tree.listener_count(), 0);
        let root = tree.root().unwrap();
        assert!(root.is::<Sequence>());
        assert_eq!(root.child_count(), 2);
        assert!(root.children().iter().all(|c| c.status() == Status::Fresh));
    }

    #[test]
    fn pools_are_bounded_and_clearable() {
        let mut library = library();
        let trees: Vec<_> = (0..3)
            .map(|_| library.create_behavior_tree(REFERENCE, None).unwrap())
            .collect();
        for tree in trees {
            library.dispose_behavior_tree(REFERENCE, tree);
        }
        let pool = library.pool(REFERENCE).unwrap();
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.peak(), 2);

        library.clear(REFERENCE);
        assert_eq!(library.pool(REFERENCE).map(Pool::free_count), Some(0));

        let tree = library.create_behavior_tree(REFERENCE, None).unwrap();
        library.dispose_behavior_tree(REFERENCE, tree);
        library.clear_all();
        assert_eq!(library.pool(REFERENCE).map(Pool::free_count), Some(0));
    }

    #[test]
    fn replacing_an_archetype_drops_its_pool() {
        let mut library = library();
        let tree = library.create_behavior_tree(REFERENCE, None).unwrap();
        library.dispose_behavior_tree(REFERENCE, tree);
        library.register_archetype_tree(REFERENCE, BehaviorTree::with_root(Task::new(crate::leaf::Success)));
        assert!(library.pool(REFERENCE).is_none());
        let tree = library.create_behavior_tree(REFERENCE, None).unwrap();
        assert!(tree.root().unwrap().is::<crate::leaf::Success>());
    }
}
