//! Library configuration.
use std::path::PathBuf;

use crate::library::{BehaviorTreeLibrary, FileResolver, PooledBehaviorTreeLibrary, TreeLibrary};
use crate::parser::{BehaviorTreeParser, DebugLevel};

/// Where archetype trees are loaded from and how the library is built.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct LibraryConfig {
    /// Directory tree references are resolved against.
    pub base_dir: PathBuf,
    /// Extension appended to references, without the dot.
    pub extension: Option<String>,
    pub debug_level: DebugLevel,
    /// Recycle disposed trees through per-reference pools.
    pub pooled: bool,
    pub pool_size: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            extension: Some("tree".to_string()),
            debug_level: DebugLevel::None,
            pooled: false,
            pool_size: PooledBehaviorTreeLibrary::<()>::DEFAULT_POOL_SIZE,
        }
    }
}

impl LibraryConfig {
    pub fn resolver(&self) -> FileResolver {
        let resolver = FileResolver::new(&self.base_dir);
        match &self.extension {
            Some(extension) if !extension.is_empty() => resolver.with_extension(extension),
            _ => resolver,
        }
    }

    pub fn parser<E: 'static>(&self) -> BehaviorTreeParser<E> {
        BehaviorTreeParser::new().with_debug_level(self.debug_level)
    }

    /// A plain or pooled library reading from [`base_dir`](Self::base_dir).
    pub fn build_library<E: 'static>(&self) -> Box<dyn TreeLibrary<E>> {
        let library = BehaviorTreeLibrary::with_parser(self.parser(), self.resolver());
        if self.pooled {
            Box::new(PooledBehaviorTreeLibrary::from_library(library).with_pool_size(self.pool_size))
        } else {
            Box::new(library)
        }
    }
}
