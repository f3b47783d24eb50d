//! Behavior tree DSL.
//!
//! ```text
//! import patrol:"game::Patrol"
//!
//! subtree name:"attack"
//!   sequence
//!     (inRange) shoot
//!     wait seconds:"uniform,0.5,1.5"
//!
//! root
//!   selector
//!     $attack
//!     patrol
//! ```
//!
//! [`BehaviorTreeReader`] turns the text into line and statement events.
//! [`BehaviorTreeParser`] collects them into an outline, then instantiates
//! tasks through its [`TaskRegistry`], converting attributes with
//! [`DistributionAdapters`] where a kind declares a distribution.

pub mod adapters;
pub mod attribute;
pub mod reader;
pub mod registry;

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{ParseError, ParseResult};
use crate::task::Task;
use crate::tree::BehaviorTree;

use self::attribute::ConversionError;

pub use adapters::DistributionAdapters;
pub use attribute::{AttributeKind, AttributeSpec, AttributeValue};
pub use reader::{BehaviorTreeReader, ReaderHandler, Value};
pub use registry::TaskRegistry;

/// How much the parser logs while building a tree.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DebugLevel {
    #[default]
    None,
    /// Statements and attributes as they are read.
    Low,
    /// Everything from `Low` plus the finished tree.
    High,
}

pub struct BehaviorTreeParser<E> {
    registry: TaskRegistry<E>,
    adapters: DistributionAdapters,
    debug_level: DebugLevel,
}

impl<E: 'static> BehaviorTreeParser<E> {
    pub fn new() -> Self {
        Self::with_registry(TaskRegistry::with_defaults())
    }

    pub fn with_registry(registry: TaskRegistry<E>) -> Self {
        Self {
            registry,
            adapters: DistributionAdapters::new(),
            debug_level: DebugLevel::None,
        }
    }

    pub fn with_debug_level(mut self, debug_level: DebugLevel) -> Self {
        self.debug_level = debug_level;
        self
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.debug_level
    }

    pub fn set_debug_level(&mut self, debug_level: DebugLevel) {
        self.debug_level = debug_level;
    }

    pub fn registry(&self) -> &TaskRegistry<E> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TaskRegistry<E> {
        &mut self.registry
    }

    pub fn adapters(&self) -> &DistributionAdapters {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut DistributionAdapters {
        &mut self.adapters
    }

    /// Parses a tree and binds it to `object`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingRoot`] for a document without a root
    /// task, [`ParseError::Distribution`] for malformed distribution
    /// literals and `Syntax`/`Structure` errors for everything else.
    pub fn parse(&self, text: &str, object: Option<E>) -> ParseResult<BehaviorTree<E>> {
        self.read(object, |reader, outline| reader.parse(text, outline))
    }

    pub fn parse_reader<R: Read>(&self, source: R, object: Option<E>) -> ParseResult<BehaviorTree<E>> {
        self.read(object, |reader, outline| reader.parse_reader(source, outline))
    }

    pub fn parse_bytes(&self, bytes: &[u8], object: Option<E>) -> ParseResult<BehaviorTree<E>> {
        self.read(object, |reader, outline| reader.parse_bytes(bytes, outline))
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P, object: Option<E>) -> ParseResult<BehaviorTree<E>> {
        self.read(object, |reader, outline| reader.parse_file(path, outline))
    }

    pub fn parse_chars(
        &self,
        data: &[char],
        offset: usize,
        length: usize,
        object: Option<E>,
    ) -> ParseResult<BehaviorTree<E>> {
        self.read(object, |reader, outline| {
            reader.parse_chars(data, offset, length, outline)
        })
    }

    fn read<F>(&self, object: Option<E>, scan: F) -> ParseResult<BehaviorTree<E>>
    where
        F: FnOnce(&mut BehaviorTreeReader, &mut Outline<'_, E>) -> ParseResult<()>,
    {
        let mut outline = Outline::new(&self.registry, self.debug_level);
        scan(&mut BehaviorTreeReader::new(), &mut outline)?;
        let root = self.build(outline)?;

        let mut tree = BehaviorTree::with_root(root);
        if let Some(object) = object {
            tree = tree.with_object(object);
        }
        if self.debug_level == DebugLevel::High {
            if let Some(root) = tree.root() {
                debug!(tree = %describe(root), "built behavior tree");
            }
        }
        Ok(tree)
    }

    fn build(&self, outline: Outline<'_, E>) -> ParseResult<Task<E>> {
        let Outline {
            nodes,
            imports,
            root_tree,
            subtrees,
            ..
        } = outline;
        let mut builder = Builder {
            parser: self,
            nodes: &nodes,
            imports: &imports,
            subtrees: subtrees
                .iter()
                .map(|(name, tree)| (name.as_str(), (tree.root, tree.line)))
                .collect(),
            built: HashMap::new(),
            in_progress: Vec::new(),
        };

        // Every subtree is validated, referenced or not.
        for (name, tree) in &subtrees {
            builder.subtree(name, tree.line)?;
        }

        let root_tree = root_tree.ok_or(ParseError::MissingRoot)?;
        let root = root_tree.root.ok_or_else(|| {
            ParseError::structure(root_tree.line, "The root tree has no task")
        })?;
        builder.build(root)
    }
}

impl<E: 'static> Default for BehaviorTreeParser<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for BehaviorTreeParser<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorTreeParser")
            .field("registry", &self.registry)
            .field("adapters", &self.adapters)
            .field("debug_level", &self.debug_level)
            .finish()
    }
}

/// Indented one-line-per-task rendering of a task and its guards.
pub fn describe<E: 'static>(task: &Task<E>) -> String {
    fn walk<E: 'static>(task: &Task<E>, depth: usize, out: &mut String) {
        let mut guards = Vec::new();
        let mut guard = task.guard();
        while let Some(g) = guard {
            guards.push(g.name());
            guard = g.guard();
        }
        let _ = write!(out, "{:width$}", "", width = depth * 2);
        for name in guards.iter().rev() {
            let _ = write!(out, "({name}) ");
        }
        let _ = writeln!(out, "{}", task.name());
        for child in task.children() {
            walk(child, depth + 1, out);
        }
    }
    let mut out = String::new();
    walk(task, 0, &mut out);
    out
}

const IMPORT: &str = "import";
const SUBTREE: &str = "subtree";
const ROOT: &str = "root";

#[derive(Debug)]
struct Statement {
    name: String,
    line: usize,
    is_subtree_reference: bool,
    is_guard: bool,
    attributes: Vec<(String, Value)>,
}

#[derive(Debug)]
struct Node {
    name: String,
    line: usize,
    is_subtree_reference: bool,
    attributes: Vec<(String, Value)>,
    guard: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug)]
struct TreeOutline {
    line: usize,
    /// Indent of the keyword line; `None` for the implicit root tree.
    indent: Option<usize>,
    root: Option<usize>,
    /// Open ancestors as (indent, node).
    stack: Vec<(usize, usize)>,
}

impl TreeOutline {
    fn new(line: usize, indent: Option<usize>) -> Self {
        Self {
            line,
            indent,
            root: None,
            stack: Vec::new(),
        }
    }

    fn contains_indent(&self, indent: usize) -> bool {
        self.indent.is_none_or(|keyword| indent > keyword)
    }
}

#[derive(Debug, Clone, Copy)]
enum CurrentTree {
    Root,
    Subtree(usize),
}

/// First parsing phase: the reader's events arranged as trees of nodes.
struct Outline<'r, E> {
    registry: &'r TaskRegistry<E>,
    debug_level: DebugLevel,
    nodes: Vec<Node>,
    imports: HashMap<String, String>,
    root_tree: Option<TreeOutline>,
    subtrees: Vec<(String, TreeOutline)>,
    current: Option<CurrentTree>,
    line: usize,
    indent: usize,
    statements: Vec<Statement>,
}

impl<'r, E: 'static> Outline<'r, E> {
    fn new(registry: &'r TaskRegistry<E>, debug_level: DebugLevel) -> Self {
        Self {
            registry,
            debug_level,
            nodes: Vec::new(),
            imports: HashMap::new(),
            root_tree: None,
            subtrees: Vec::new(),
            current: None,
            line: 0,
            indent: 0,
            statements: Vec::new(),
        }
    }

    fn import(&mut self, statement: Statement) -> ParseResult<()> {
        let line = statement.line;
        if statement.attributes.is_empty() {
            return Err(ParseError::structure(line, "An import must declare at least one alias"));
        }
        for (alias, value) in statement.attributes {
            let Value::String(type_name) = value else {
                return Err(ParseError::structure(
                    line,
                    format!("Import '{alias}' expects a quoted type name, found {value}"),
                ));
            };
            if !self.registry.contains_type(&type_name) {
                return Err(ParseError::structure(
                    line,
                    format!("Cannot resolve task type '{type_name}'"),
                ));
            }
            self.imports.insert(alias, type_name);
        }
        Ok(())
    }

    fn subtree(&mut self, statement: Statement) -> ParseResult<()> {
        let line = statement.line;
        let mut name = None;
        for (attribute, value) in statement.attributes {
            match (attribute.as_str(), value) {
                ("name", Value::String(value)) => name = Some(value),
                ("name", other) => {
                    return Err(ParseError::structure(
                        line,
                        format!("Subtree name must be a string, found {other}"),
                    ));
                }
                (other, _) => {
                    return Err(ParseError::structure(
                        line,
                        format!("Unknown subtree attribute '{other}'"),
                    ));
                }
            }
        }
        let name = name.ok_or_else(|| ParseError::structure(line, "Missing subtree name"))?;
        if name.is_empty() {
            return Err(ParseError::structure(line, "Subtree name cannot be empty"));
        }
        if self.subtrees.iter().any(|(existing, _)| *existing == name) {
            return Err(ParseError::structure(
                line,
                format!("A subtree named '{name}' is already defined"),
            ));
        }
        self.subtrees
            .push((name, TreeOutline::new(line, Some(self.indent))));
        self.current = Some(CurrentTree::Subtree(self.subtrees.len() - 1));
        Ok(())
    }

    fn root(&mut self, statement: Statement) -> ParseResult<()> {
        let line = statement.line;
        if !statement.attributes.is_empty() {
            return Err(ParseError::structure(line, "The root keyword takes no attributes"));
        }
        if self.root_tree.is_some() {
            return Err(ParseError::structure(line, "The root tree is already defined"));
        }
        self.root_tree = Some(TreeOutline::new(line, Some(self.indent)));
        self.current = Some(CurrentTree::Root);
        Ok(())
    }

    fn node(&mut self, statement: Statement, guard: Option<usize>) -> ParseResult<usize> {
        if statement.is_subtree_reference && !statement.attributes.is_empty() {
            return Err(ParseError::structure(
                statement.line,
                format!("Subtree reference '${}' cannot have attributes", statement.name),
            ));
        }
        self.nodes.push(Node {
            name: statement.name,
            line: statement.line,
            is_subtree_reference: statement.is_subtree_reference,
            attributes: statement.attributes,
            guard,
            children: Vec::new(),
        });
        Ok(self.nodes.len() - 1)
    }

    fn task(&mut self, guards: Vec<Statement>, statement: Statement) -> ParseResult<()> {
        let (line, indent) = (statement.line, self.indent);

        let in_current = match self.current {
            Some(CurrentTree::Root) => self.root_tree.as_ref(),
            Some(CurrentTree::Subtree(index)) => self.subtrees.get(index).map(|(_, tree)| tree),
            None => None,
        }
        .is_some_and(|tree| tree.contains_indent(indent));
        if !in_current {
            if self.root_tree.is_some() {
                return Err(ParseError::structure(
                    line,
                    format!("Task '{}' is outside of any tree", statement.name),
                ));
            }
            self.root_tree = Some(TreeOutline::new(line, None));
            self.current = Some(CurrentTree::Root);
        }

        let mut guard = None;
        for statement in guards {
            guard = Some(self.node(statement, guard)?);
        }
        let index = self.node(statement, guard)?;

        let tree = match self.current {
            Some(CurrentTree::Root) => self.root_tree.as_mut(),
            Some(CurrentTree::Subtree(i)) => self.subtrees.get_mut(i).map(|(_, tree)| tree),
            None => None,
        }
        .ok_or_else(|| ParseError::structure(line, "No tree is open"))?;

        while tree.stack.last().is_some_and(|(open, _)| *open >= indent) {
            tree.stack.pop();
        }
        match tree.stack.last() {
            Some(&(_, parent)) => {
                let parent = &mut self.nodes[parent];
                if parent.is_subtree_reference {
                    return Err(ParseError::structure(
                        line,
                        format!("Subtree reference '${}' cannot have children", parent.name),
                    ));
                }
                parent.children.push(index);
            }
            None if tree.root.is_some() => {
                return Err(ParseError::structure(line, "A tree can have only one root task"));
            }
            None => tree.root = Some(index),
        }
        tree.stack.push((indent, index));
        Ok(())
    }
}

impl<E: 'static> ReaderHandler for Outline<'_, E> {
    fn start_line(&mut self, line: usize, indent: usize) -> ParseResult<()> {
        self.line = line;
        self.indent = indent;
        self.statements.clear();
        Ok(())
    }

    fn start_statement(&mut self, name: &str, is_subtree_reference: bool, is_guard: bool) -> ParseResult<()> {
        self.statements.push(Statement {
            name: name.to_string(),
            line: self.line,
            is_subtree_reference,
            is_guard,
            attributes: Vec::new(),
        });
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: Value) -> ParseResult<()> {
        let line = self.line;
        let statement = self
            .statements
            .last_mut()
            .ok_or_else(|| ParseError::syntax(line, format!("attribute '{name}' outside of a statement")))?;
        statement.attributes.push((name.to_string(), value));
        Ok(())
    }

    fn end_statement(&mut self) -> ParseResult<()> {
        if self.debug_level != DebugLevel::None {
            if let Some(statement) = self.statements.last() {
                debug!(
                    line = statement.line,
                    indent = self.indent,
                    name = %statement.name,
                    guard = statement.is_guard,
                    subtree_reference = statement.is_subtree_reference,
                    attributes = ?statement.attributes,
                    "statement"
                );
            }
        }
        Ok(())
    }

    fn end_line(&mut self) -> ParseResult<()> {
        let line = self.line;
        let mut statements = std::mem::take(&mut self.statements).into_iter();
        let mut guards = Vec::new();
        let statement = loop {
            match statements.next() {
                Some(statement) if statement.is_guard => guards.push(statement),
                Some(statement) => break statement,
                None => {
                    return Err(ParseError::structure(line, "A guard must be followed by a task"));
                }
            }
        };
        if let Some(extra) = statements.next() {
            let message = if extra.is_guard {
                "A guard must precede the task it guards".to_string()
            } else {
                format!("Only one task per line is allowed, found '{}'", extra.name)
            };
            return Err(ParseError::structure(line, message));
        }

        let keyword = !statement.is_subtree_reference
            && matches!(statement.name.as_str(), IMPORT | SUBTREE | ROOT);
        if keyword && !guards.is_empty() {
            return Err(ParseError::structure(
                line,
                format!("Guards cannot precede the '{}' keyword", statement.name),
            ));
        }
        match statement.name.as_str() {
            IMPORT if keyword => self.import(statement),
            SUBTREE if keyword => self.subtree(statement),
            ROOT if keyword => self.root(statement),
            _ => self.task(guards, statement),
        }
    }
}

/// Second parsing phase: nodes turned into tasks.
struct Builder<'p, 'o, E> {
    parser: &'p BehaviorTreeParser<E>,
    nodes: &'o [Node],
    imports: &'o HashMap<String, String>,
    subtrees: HashMap<&'o str, (Option<usize>, usize)>,
    built: HashMap<String, Task<E>>,
    in_progress: Vec<String>,
}

impl<E: 'static> Builder<'_, '_, E> {
    fn subtree(&mut self, name: &str, line: usize) -> ParseResult<Task<E>> {
        if let Some(task) = self.built.get(name) {
            return Ok(task.clone_task());
        }
        let Some(&(root, defined_at)) = self.subtrees.get(name) else {
            return Err(ParseError::structure(line, format!("Undefined subtree '{name}'")));
        };
        if self.in_progress.iter().any(|open| open == name) {
            return Err(ParseError::structure(
                line,
                format!("Recursive reference to subtree '{name}'"),
            ));
        }
        let root = root.ok_or_else(|| {
            ParseError::structure(defined_at, format!("Subtree '{name}' has no root task"))
        })?;

        self.in_progress.push(name.to_string());
        let task = self.build(root);
        self.in_progress.pop();
        let task = task?;
        let copy = task.clone_task();
        self.built.insert(name.to_string(), task);
        Ok(copy)
    }

    fn build(&mut self, index: usize) -> ParseResult<Task<E>> {
        let nodes = self.nodes;
        let node = &nodes[index];
        let mut task = if node.is_subtree_reference {
            self.subtree(&node.name, node.line)?
        } else {
            self.instantiate(node)?
        };
        if let Some(guard) = node.guard {
            if task.guard().is_some() {
                return Err(ParseError::structure(
                    node.line,
                    format!("Subtree '{}' is already guarded", node.name),
                ));
            }
            let guard = self.build(guard)?;
            task.set_guard(Some(guard));
        }
        Ok(task)
    }

    fn instantiate(&mut self, node: &Node) -> ParseResult<Task<E>> {
        let line = node.line;
        let type_name = self
            .imports
            .get(&node.name)
            .map_or(node.name.as_str(), String::as_str);
        let mut behavior = self
            .parser
            .registry
            .instantiate(type_name)
            .ok_or_else(|| ParseError::structure(line, format!("Unknown task '{}'", node.name)))?;

        let specs = behavior.attributes();
        for (name, value) in &node.attributes {
            let spec = specs.iter().find(|spec| spec.name == name).ok_or_else(|| {
                ParseError::structure(
                    line,
                    format!("Task '{}' has no attribute '{name}'", node.name),
                )
            })?;
            let converted = attribute::convert(spec.kind, value.clone(), &self.parser.adapters)
                .map_err(|err| match err {
                    ConversionError::Mismatch => ParseError::structure(
                        line,
                        format!(
                            "Attribute '{name}' of task '{}' expects {}, found {value}",
                            node.name, spec.kind
                        ),
                    ),
                    ConversionError::Distribution(source) => ParseError::Distribution {
                        line,
                        attribute: name.clone(),
                        source,
                    },
                })?;
            behavior
                .set_attribute(name, converted)
                .map_err(|err| ParseError::structure(line, format!("Task '{}': {err}", node.name)))?;
        }
        if let Some(missing) = specs
            .iter()
            .filter(|spec| spec.required)
            .find(|spec| !node.attributes.iter().any(|(name, _)| name == spec.name))
        {
            return Err(ParseError::structure(
                line,
                format!("Task '{}' requires attribute '{}'", node.name, missing.name),
            ));
        }

        let constraint = behavior.constraint();
        let count = node.children.len();
        if count > constraint.max_children {
            return Err(ParseError::structure(
                line,
                constraint.overflow_error(&node.name).to_string(),
            ));
        }
        if count < constraint.min_children {
            return Err(ParseError::structure(
                line,
                format!(
                    "Task '{}' requires at least {} children, found {count}",
                    node.name, constraint.min_children
                ),
            ));
        }

        let children = node
            .children
            .iter()
            .map(|&child| self.build(child))
            .collect::<ParseResult<Vec<_>>>()?;
        Ok(Task::from_boxed(behavior).with_children_unchecked(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::{Parallel, Policy, Selector, Sequence};
    use crate::decorator::{Inverter, Repeat};
    use crate::distribution::{FloatDistribution, IntegerDistribution};
    use crate::leaf::{Failure, Success, Wait};
    use crate::status::Status;

    fn parse(text: &str) -> ParseResult<BehaviorTree<()>> {
        BehaviorTreeParser::new().parse(text, None)
    }

    fn structure_message(text: &str) -> String {
        match parse(text) {
            Err(ParseError::Structure { message, .. }) => message,
            other => panic!("expected a structure error, got {other:?}"),
        }
    }

    #[test]
    fn single_leaf_under_root() {
        let tree = parse("root\n  success").unwrap();
        assert!(tree.root().unwrap().is::<Success>());
    }

    #[test]
    fn selector_keeps_child_order() {
        let tree = parse("root\n  selector\n    success\n    failure").unwrap();
        let root = tree.root().unwrap();
        assert!(root.is::<Selector>());
        assert_eq!(root.child_count(), 2);
        assert!(root.children()[0].is::<Success>());
        assert!(root.children()[1].is::<Failure>());
    }

    #[test]
    fn wait_gets_constant_duration() {
        let tree = parse("root\n  wait seconds:5.0").unwrap();
        let wait = tree.root().unwrap().downcast_ref::<Wait>().unwrap();
        assert_eq!(wait.seconds(), FloatDistribution::Constant(5.0));
    }

    #[test]
    fn empty_document_has_no_root() {
        assert!(matches!(parse(""), Err(ParseError::MissingRoot)));
        assert!(matches!(parse("# only a comment\n"), Err(ParseError::MissingRoot)));
    }

    #[test]
    fn second_root_task_is_rejected() {
        assert_eq!(
            structure_message("root\n  success\n  failure"),
            "A tree can have only one root task"
        );
    }

    #[test]
    fn leaf_children_are_rejected() {
        assert_eq!(
            structure_message("root\n  success\n    failure"),
            "A leaf task cannot have any children"
        );
        assert_eq!(
            structure_message("invert\n  success\n  failure"),
            "A decorator task cannot have more than one child"
        );
        assert_eq!(
            structure_message("selector"),
            "Task 'selector' requires at least 1 children, found 0"
        );
    }

    #[test]
    fn implicit_root_tree() {
        let tree = parse("sequence\n  success\n  success").unwrap();
        assert!(tree.root().unwrap().is::<Sequence>());
    }

    #[test]
    fn guards_chain_left_to_right() {
        let tree = parse("root\n  (success) (failure) invert\n    success").unwrap();
        let root = tree.root().unwrap();
        assert!(root.is::<Inverter>());
        let guard = root.guard().unwrap();
        assert!(guard.is::<Failure>());
        assert!(guard.guard().unwrap().is::<Success>());
    }

    #[test]
    fn guard_placement_errors() {
        assert_eq!(
            structure_message("root\n  (success)"),
            "A guard must be followed by a task"
        );
        assert_eq!(
            structure_message("(success) root\n  success"),
            "Guards cannot precede the 'root' keyword"
        );
    }

    #[test]
    fn subtrees_are_expanded_as_copies() {
        let text = "\
subtree name:\"twice\"
  sequence
    success
    success

root
  selector
    $twice
    $twice
";
        let tree = parse(text).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(root.child_count(), 2);
        for child in root.children() {
            assert!(child.is::<Sequence>());
            assert_eq!(child.child_count(), 2);
        }
    }

    #[test]
    fn forward_subtree_references() {
        let text = "root\n  $later\nsubtree name:\"later\"\n  failure\n";
        let tree = parse(text).unwrap();
        assert!(tree.root().unwrap().is::<Failure>());
    }

    #[test]
    fn subtree_errors() {
        assert_eq!(
            structure_message("subtree\n  success\nroot\n  success"),
            "Missing subtree name"
        );
        assert_eq!(
            structure_message("subtree name:\"\"\n  success\nroot\n  success"),
            "Subtree name cannot be empty"
        );
        assert_eq!(
            structure_message(
                "subtree name:\"a\"\n  success\nsubtree name:\"a\"\n  failure\nroot\n  $a"
            ),
            "A subtree named 'a' is already defined"
        );
        assert_eq!(structure_message("root\n  $missing"), "Undefined subtree 'missing'");
        assert_eq!(
            structure_message("subtree name:\"loop\"\n  invert\n    $loop\nroot\n  $loop"),
            "Recursive reference to subtree 'loop'"
        );
    }

    #[test]
    fn attribute_errors() {
        assert_eq!(
            structure_message("root\n  success color:\"red\""),
            "Task 'success' has no attribute 'color'"
        );
        assert_eq!(
            structure_message("root\n  wait"),
            "Task 'wait' requires attribute 'seconds'"
        );
        assert!(structure_message("root\n  wait seconds:true").contains("expects"));
        assert_eq!(structure_message("root\n  explode"), "Unknown task 'explode'");
    }

    #[test]
    fn malformed_distribution_is_distinguishable() {
        let err = parse("root\n  wait seconds:\"uniform,1,2,3\"").unwrap_err();
        assert!(err.is_distribution_format());
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn imports_alias_registered_types() {
        let text = "import yes:\"behavior_tree::leaf::Success\"\nroot\n  yes";
        assert!(parse(text).unwrap().root().unwrap().is::<Success>());
        assert_eq!(
            structure_message("import x:\"game::Nope\"\nroot\n  x"),
            "Cannot resolve task type 'game::Nope'"
        );
    }

    #[test]
    fn typed_attributes_reach_the_task() {
        let tree = parse("parallel policy:selector\n  repeat times:3\n    success\n  success").unwrap();
        let root = tree.root().unwrap();
        assert_eq!(root.downcast_ref::<Parallel>().unwrap().policy(), Policy::Selector);
        let repeat = root.children()[0].downcast_ref::<Repeat>().unwrap();
        assert_eq!(repeat.times(), IntegerDistribution::Constant(3));
    }

    #[test]
    fn parsed_tree_runs() {
        let mut tree = BehaviorTreeParser::new()
            .parse("selector\n  failure\n  success", Some(()))
            .unwrap();
        tree.step().unwrap();
        assert_eq!(tree.status(), Status::Succeeded);
        assert!(tree.object().is_some());
    }

    #[test]
    fn describe_renders_indented_outline() {
        let tree = parse("selector\n  (success) failure\n  success").unwrap();
        assert_eq!(
            describe(tree.root().unwrap()),
            "selector\n  (success) failure\n  success\n"
        );
    }

    #[test]
    fn debug_level_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<DebugLevel>().ok(), Some(DebugLevel::High));
        assert_eq!(DebugLevel::Low.to_string(), "low");
    }
}
