pub(crate) mod assignments;
/// Python extractor: turns one source file into a module record
///
/// This module is organized into focused sub-modules:
/// - helpers: String literals, docstrings, docstring cleaning
/// - types: Class extraction and member reclassification
/// - functions: Function and method extraction
/// - signatures: Parameters, return types and the visibility policy
/// - decorators: Decorator extraction and method roles
/// - imports: Import statement handling
/// - syntax: Python 3 rules the grammar does not enforce
/// - assignments: Constant and class variable extraction
/// - unparse: Expression printer for defaults, annotations, decorators and bases
pub(crate) mod decorators;
pub(crate) mod functions;
pub(crate) mod helpers;
pub(crate) mod imports;
pub(crate) mod signatures;
pub(crate) mod syntax;
pub(crate) mod types;
pub(crate) mod unparse;

use crate::error::{ParseFailure, ParseFailureReason};
use crate::extractors::base::{generate_id, BaseExtractor, ComponentKind, Module};
use crate::language::new_parser;
use crate::utils::hashing::content_hash;
use assignments::{extract_assignment, Assignment};
use helpers::{named_children, plain_string_value};
use signatures::should_include;
use std::path::Path;
use tree_sitter::{Node, Tree};
use types::{function_definition, single_assignment};

/// Name of the module-level export list
pub const EXPORT_LIST_NAME: &str = "__all__";

/// Top-level statement shapes that can contribute to the public API
enum Declaration<'a> {
    Class(Node<'a>),
    Function(Node<'a>),
    /// Plain, chained or annotated assignment
    Assignment(Assignment<'a>),
}

impl<'a> Declaration<'a> {
    fn classify(statement: Node<'a>) -> Option<Self> {
        match statement.kind() {
            "class_definition" => Some(Declaration::Class(statement)),
            "function_definition" => Some(Declaration::Function(statement)),
            "decorated_definition" => {
                let definition = statement.child_by_field_name("definition")?;
                match definition.kind() {
                    "class_definition" => Some(Declaration::Class(definition)),
                    _ => function_definition(&statement).map(Declaration::Function),
                }
            }
            "expression_statement" => single_assignment(&statement)
                .map(|node| Declaration::Assignment(Assignment::from_node(node))),
            _ => None,
        }
    }
}

/// Python extractor for one source file
pub struct PythonExtractor {
    base: BaseExtractor,
    include_private: bool,
}

impl PythonExtractor {
    pub fn new(file_path: String, content: String, include_private: bool) -> Self {
        Self {
            base: BaseExtractor::new(file_path, content),
            include_private,
        }
    }

    /// Build the module record from a parsed tree of this extractor's content
    pub fn extract_module(&self, tree: &Tree) -> Module {
        let root = tree.root_node();
        let file_path = self.base.file_path.clone();
        let name = Path::new(&file_path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut module = Module {
            id: generate_id(&file_path, &name, 1),
            name,
            file_path,
            line_number: 1,
            docstring: helpers::extract_docstring(self, &root),
            source_text: Some(self.base.content.clone()),
            classes: Vec::new(),
            functions: Vec::new(),
            constants: Vec::new(),
            imports: imports::extract_imports(self, &root),
            export_list: self.extract_export_list(&root),
            content_hash: content_hash(&self.base.content),
        };

        let export_list = module.export_list.clone();
        let is_visible =
            |name: &str| should_include(name, export_list.as_deref(), self.include_private);

        for statement in named_children(&root) {
            match Declaration::classify(statement) {
                Some(Declaration::Class(node)) => {
                    if is_visible(&types::class_name(self, &node)) {
                        module.classes.push(types::extract_class(self, &node));
                    }
                }
                Some(Declaration::Function(node)) => {
                    if is_visible(&functions::function_name(self, &node)) {
                        module.functions.push(functions::extract_function(self, &node));
                    }
                }
                Some(Declaration::Assignment(assignment)) => {
                    for name in assignment.target_names(self) {
                        if is_visible(&name) {
                            module.constants.push(extract_assignment(
                                self,
                                &assignment,
                                &name,
                                &name,
                                ComponentKind::Constant,
                            ));
                        }
                    }
                }
                None => {}
            }
        }

        tracing::debug!(
            "Extracted {} classes, {} functions, {} constants from {}",
            module.classes.len(),
            module.functions.len(),
            module.constants.len(),
            module.file_path
        );

        module
    }

    /// First module-level `__all__ = [...]` (or tuple) binding, string entries only
    fn extract_export_list(&self, root: &Node) -> Option<Vec<String>> {
        named_children(root).into_iter().find_map(|statement| {
            let assignment = Assignment::from_node(single_assignment(&statement)?);
            let value = assignment.plain_value_for(self, EXPORT_LIST_NAME)?;
            if !matches!(value.kind(), "list" | "tuple" | "expression_list") {
                return None;
            }

            Some(
                named_children(&value)
                    .iter()
                    .filter_map(|element| plain_string_value(self, element))
                    .collect(),
            )
        })
    }

    // ========================================================================
    // Accessors for sub-modules
    // ========================================================================

    pub(crate) fn base(&self) -> &BaseExtractor {
        &self.base
    }

    pub(crate) fn include_private(&self) -> bool {
        self.include_private
    }
}

/// Parse one source text into a module record
///
/// `file_path` is the relative Unix-style path used for ids and display. Syntax errors
/// anywhere in the file reject the whole file.
pub fn parse_source(
    source: &str,
    file_path: &str,
    include_private: bool,
) -> Result<Module, ParseFailure> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut parser = new_parser()
        .map_err(|e| ParseFailure::new(file_path, ParseFailureReason::Grammar(e.to_string())))?;
    let tree = parser.parse(source, None).ok_or_else(|| {
        ParseFailure::new(
            file_path,
            ParseFailureReason::Grammar("parser produced no tree".to_string()),
        )
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(ParseFailure::new(
            file_path,
            ParseFailureReason::Syntax {
                line: first_error_line(root),
            },
        ));
    }
    if let Some(line) = syntax::find_violation(&root, source) {
        return Err(ParseFailure::new(file_path, ParseFailureReason::Syntax { line }));
    }

    let extractor = PythonExtractor::new(file_path.to_string(), source.to_string(), include_private);
    Ok(extractor.extract_module(&tree))
}

/// Read and parse a file from disk
///
/// Unreadable files and non-UTF-8 content become typed failures rather than errors.
pub fn parse_file(path: &Path, file_path: &str, include_private: bool) -> Result<Module, ParseFailure> {
    let bytes = std::fs::read(path)
        .map_err(|e| ParseFailure::new(file_path, ParseFailureReason::Io(e.to_string())))?;
    let source = String::from_utf8(bytes)
        .map_err(|e| ParseFailure::new(file_path, ParseFailureReason::Encoding(e.to_string())))?;

    parse_source(&source, file_path, include_private)
}

/// Line of the first error or missing node, depth-first
fn first_error_line(node: Node) -> u32 {
    if node.is_error() || node.is_missing() {
        return BaseExtractor::line_number(&node);
    }

    let mut cursor = node.walk();
    let erroneous = node.children(&mut cursor).find(|child| child.has_error());
    match erroneous {
        Some(child) => first_error_line(child),
        None => BaseExtractor::line_number(&node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::base::{Component, Module};

    const INVENTORY: &str = include_str!("../../../test_samples/inventory.py");
    const EXPORTS: &str = include_str!("../../../test_samples/exports.py");

    fn parse(source: &str) -> Module {
        parse_source(source, "pkg/inventory.py", false).unwrap()
    }

    fn names<T: Component>(items: &[T]) -> Vec<&str> {
        items.iter().map(|item| item.name()).collect()
    }

    #[test]
    fn test_minimal_module() {
        let source = "def _priv(): ...\n\ndef pub(a, b=2): ...\n\nclass Foo(Base):\n    def method(self, x): ...\n";
        let module = parse_source(source, "minimal.py", false).unwrap();

        assert_eq!(names(&module.functions), vec!["pub"]);
        assert_eq!(names(&module.classes), vec!["Foo"]);
        assert_eq!(names(&module.classes[0].methods), vec!["method"]);
        assert_eq!(module.classes[0].base_classes, vec!["Base"]);
        assert_eq!(module.functions[0].parameters[1].default_value.as_deref(), Some("2"));
        assert_eq!(module.classes[0].methods[0].parameters[0].name, "x");
    }

    #[test]
    fn test_module_record() {
        let module = parse(INVENTORY);
        assert_eq!(module.name, "inventory");
        assert_eq!(module.file_path, "pkg/inventory.py");
        assert_eq!(module.line_number, 1);
        assert_eq!(module.id, generate_id("pkg/inventory.py", "inventory", 1));
        assert_eq!(module.docstring.as_deref(), Some("Inventory tracking for warehouses."));
        assert_eq!(module.source_text.as_deref(), Some(INVENTORY));
        assert_eq!(module.content_hash.len(), 64);
        assert!(module.export_list.is_none());
        assert!(module.imports.contains(&"dataclasses.dataclass".to_string()));
    }

    #[test]
    fn test_underscore_policy() {
        let module = parse(INVENTORY);
        assert_eq!(names(&module.functions), vec!["restock", "audit"]);
        assert_eq!(names(&module.constants), vec!["MAX_ITEMS", "__version__", "default_zone"]);

        let with_private = parse_source(INVENTORY, "pkg/inventory.py", true).unwrap();
        assert_eq!(names(&with_private.functions), vec!["restock", "audit", "_normalize"]);
        assert!(names(&with_private.constants).contains(&"_registry"));
    }

    #[test]
    fn test_decorated_declarations() {
        let module = parse(INVENTORY);
        let item = module.classes.iter().find(|c| c.name == "Item").unwrap();
        assert_eq!(item.decorators, vec!["dataclass(frozen=True)"]);
        assert_eq!(item.line_number, 14);
        assert!(item.source_text.as_deref().unwrap().starts_with("class Item"));

        let audit = module.functions.iter().find(|f| f.name == "audit").unwrap();
        assert_eq!(audit.decorators, vec!["log_calls"]);
        assert!(audit.is_async);
    }

    #[test]
    fn test_export_list_is_the_only_filter() {
        let module = parse_source(EXPORTS, "pkg/exports.py", false).unwrap();
        assert_eq!(module.export_list, Some(vec!["A".to_string(), "_hidden_but_exported".to_string()]));
        assert_eq!(names(&module.classes), vec!["A"]);
        assert_eq!(names(&module.functions), vec!["_hidden_but_exported"]);
        assert!(module.constants.is_empty());
    }

    #[test]
    fn test_ids_are_stable_and_line_sensitive() {
        let first = parse(INVENTORY);
        let second = parse(INVENTORY);
        assert_eq!(first, second);

        let edited_docstring = INVENTORY.replace("Restock an item.", "Restock an item quickly.");
        let edited = parse(&edited_docstring);
        assert_eq!(first.functions[0].id, edited.functions[0].id);
        assert_ne!(first.functions[0].docstring, edited.functions[0].docstring);

        let shifted = parse(&format!("\n{}", INVENTORY));
        assert_ne!(first.functions[0].id, shifted.functions[0].id);
    }

    #[test]
    fn test_syntax_error_is_a_typed_failure() {
        let failure = parse_source("def broken(:\n    pass\n", "broken.py", false).unwrap_err();
        assert!(failure.is_syntax());
        assert_eq!(failure.file_path, "broken.py");
    }

    #[test]
    fn test_grammar_accepted_but_invalid_python_fails() {
        for (source, line) in [
            ("print 'hi'\n", 1),
            ("x = 1\nexec 'code'\n", 2),
            ("def f(a=1, b): pass\n", 1),
            ("x = 1\n  y = 2\n", 2),
        ] {
            let failure = parse_source(source, "legacy.py", false).unwrap_err();
            assert_eq!(failure.reason, ParseFailureReason::Syntax { line }, "{:?}", source);
        }
    }

    #[test]
    fn test_encoding_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("latin1.py");
        std::fs::write(&path, b"NAME = '\xe9'\n").unwrap();

        let failure = parse_file(&path, "latin1.py", false).unwrap_err();
        assert!(matches!(failure.reason, ParseFailureReason::Encoding(_)));
    }

    #[test]
    fn test_ambiguous_shapes_are_dropped() {
        let source = "a, b = 1, 2\nobj.attr = 3\ncount += 1\nVALUE = 4\n";
        let module = parse_source(source, "shapes.py", false).unwrap();
        assert_eq!(names(&module.constants), vec!["VALUE"]);
    }
}
