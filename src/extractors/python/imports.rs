/// Import statement handling
/// Flattens every import in a file to dotted names (`os.path`, `typing.Optional`)
use super::helpers::named_children;
use super::PythonExtractor;
use std::collections::VecDeque;
use tree_sitter::Node;

/// Collect imports anywhere in the tree, nested ones included
///
/// Statements are visited breadth-first, so module-level imports come first.
pub(crate) fn extract_imports(extractor: &PythonExtractor, root: &Node) -> Vec<String> {
    let mut imports = Vec::new();
    let mut queue = VecDeque::from([*root]);

    while let Some(node) = queue.pop_front() {
        match node.kind() {
            "import_statement" => {
                for name in imported_names(extractor, &node) {
                    imports.push(name);
                }
            }
            "import_from_statement" | "future_import_statement" => {
                let module = from_module(extractor, &node);
                for name in imported_names(extractor, &node) {
                    imports.push(qualify(&module, &name));
                }
                if has_wildcard(&node) {
                    imports.push(qualify(&module, "*"));
                }
            }
            _ => {
                let mut cursor = node.walk();
                queue.extend(node.named_children(&mut cursor));
            }
        }
    }

    imports
}

fn qualify(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", module, name)
    }
}

/// Imported names, aliases resolved to the original name
fn imported_names(extractor: &PythonExtractor, node: &Node) -> Vec<String> {
    let mut cursor = node.walk();
    let names = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|name| match name.kind() {
            "dotted_name" => Some(dotted_name(extractor, &name)),
            "aliased_import" => name
                .child_by_field_name("name")
                .map(|original| dotted_name(extractor, &original)),
            _ => None,
        })
        .collect();
    names
}

/// Source module of a `from` import; relative dots are dropped, a bare `from .` is empty
fn from_module(extractor: &PythonExtractor, node: &Node) -> String {
    if node.kind() == "future_import_statement" {
        return "__future__".to_string();
    }

    match node.child_by_field_name("module_name") {
        Some(module) if module.kind() == "relative_import" => named_children(&module)
            .iter()
            .find(|child| child.kind() == "dotted_name")
            .map(|name| dotted_name(extractor, name))
            .unwrap_or_default(),
        Some(module) => dotted_name(extractor, &module),
        None => String::new(),
    }
}

fn has_wildcard(node: &Node) -> bool {
    named_children(node)
        .iter()
        .any(|child| child.kind() == "wildcard_import")
}

fn dotted_name(extractor: &PythonExtractor, node: &Node) -> String {
    let base = extractor.base();
    let parts: Vec<String> = named_children(node)
        .iter()
        .map(|part| base.get_node_text(part))
        .collect();

    if parts.is_empty() {
        base.get_node_text(node)
    } else {
        parts.join(".")
    }
}
