use crate::error::LibraryResult;
use crate::library::TreeLibrary;
use crate::task::Task;
use crate::tree::BehaviorTree;

/// Owns the active library and forwards every operation to it.
///
/// Applications keep one manager and pass it where trees are created; the
/// library behind it can be replaced at any time with
/// [`set_library`](Self::set_library).
pub struct BehaviorTreeLibraryManager<E> {
    library: Box<dyn TreeLibrary<E>>,
}

impl<E: 'static> BehaviorTreeLibraryManager<E> {
    pub fn new<L: TreeLibrary<E> + 'static>(library: L) -> Self {
        Self {
            library: Box::new(library),
        }
    }

    pub fn from_boxed(library: Box<dyn TreeLibrary<E>>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &dyn TreeLibrary<E> {
        self.library.as_ref()
    }

    pub fn library_mut(&mut self) -> &mut dyn TreeLibrary<E> {
        self.library.as_mut()
    }

    /// Installs `library`, returning the previous one.
    pub fn set_library(&mut self, library: Box<dyn TreeLibrary<E>>) -> Box<dyn TreeLibrary<E>> {
        std::mem::replace(&mut self.library, library)
    }

    pub fn register_archetype_tree(&mut self, reference: &str, tree: BehaviorTree<E>) {
        self.library.register_archetype_tree(reference, tree);
    }

    pub fn has_archetype_tree(&self, reference: &str) -> bool {
        self.library.has_archetype_tree(reference)
    }

    pub fn retrieve_archetype_tree(&mut self, reference: &str) -> LibraryResult<&BehaviorTree<E>> {
        self.library.retrieve_archetype_tree(reference)
    }

    pub fn create_root_task(&mut self, reference: &str) -> LibraryResult<Task<E>> {
        self.library.create_root_task(reference)
    }

    pub fn create_behavior_tree(
        &mut self,
        reference: &str,
        object: Option<E>,
    ) -> LibraryResult<BehaviorTree<E>> {
        self.library.create_behavior_tree(reference, object)
    }

    pub fn dispose_behavior_tree(&mut self, reference: &str, tree: BehaviorTree<E>) {
        self.library.dispose_behavior_tree(reference, tree);
    }
}

impl<E> std::fmt::Debug for BehaviorTreeLibraryManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTreeLibraryManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{Failure, Success};
    use crate::library::{BehaviorTreeLibrary, InMemoryResolver, PooledBehaviorTreeLibrary};

    #[test]
    fn delegates_to_the_installed_library() {
        let mut manager = BehaviorTreeLibraryManager::<()>::new(BehaviorTreeLibrary::new(
            InMemoryResolver::new().with_source("a", "success"),
        ));
        assert!(!manager.has_archetype_tree("a"));
        let tree = manager.create_behavior_tree("a", None).unwrap();
        assert!(tree.root().unwrap().is::<Success>());
        assert!(manager.has_archetype_tree("a"));
        manager.dispose_behavior_tree("a", tree);
    }

    #[test]
    fn swapping_libraries_switches_archetypes() {
        let mut manager = BehaviorTreeLibraryManager::<()>::new(BehaviorTreeLibrary::new(
            InMemoryResolver::new().with_source("a", "success"),
        ));
        manager.retrieve_archetype_tree("a").unwrap();

        let previous = manager.set_library(Box::new(PooledBehaviorTreeLibrary::new(
            InMemoryResolver::new().with_source("a", "failure"),
        )));
        assert!(previous.has_archetype_tree("a"));
        assert!(!manager.has_archetype_tree("a"));
        assert!(manager.create_root_task("a").unwrap().is::<Failure>());

        manager.register_archetype_tree("b", BehaviorTree::with_root(Task::new(Success)));
        assert!(manager.library().has_archetype_tree("b"));
    }
}
