/// Function and method extraction
/// Handles sync and async definitions, with or without decorators
use super::decorators::{extract_decorators, MethodRole};
use super::helpers::extract_docstring;
use super::signatures::{extract_parameters, extract_return_type};
use super::PythonExtractor;
use crate::extractors::base::{BaseExtractor, Function, Method};
use tree_sitter::Node;

/// Extract a module-level function from a `function_definition` node
pub(crate) fn extract_function(extractor: &PythonExtractor, node: &Node) -> Function {
    let base = extractor.base();
    let name = function_name(extractor, node);

    Function {
        id: base.generate_id(&name, node),
        file_path: base.file_path.clone(),
        line_number: BaseExtractor::line_number(node),
        docstring: function_docstring(extractor, node),
        source_text: base.source_segment(node),
        parameters: node
            .child_by_field_name("parameters")
            .map(|params| extract_parameters(extractor, &params, false))
            .unwrap_or_default(),
        return_type: extract_return_type(extractor, node),
        is_async: is_async(node),
        decorators: extract_decorators(extractor, node),
        name,
    }
}

/// Extract a method defined directly in the body of `class_name`
///
/// The receiver is dropped from the parameters unless the method is a staticmethod.
pub(crate) fn extract_method(extractor: &PythonExtractor, node: &Node, class_name: &str) -> Method {
    let base = extractor.base();
    let name = function_name(extractor, node);
    let decorators = extract_decorators(extractor, node);
    let role = MethodRole::from_decorators(&decorators);

    Method {
        id: base.generate_id(&format!("{}.{}", class_name, name), node),
        file_path: base.file_path.clone(),
        line_number: BaseExtractor::line_number(node),
        docstring: function_docstring(extractor, node),
        source_text: base.source_segment(node),
        parameters: node
            .child_by_field_name("parameters")
            .map(|params| extract_parameters(extractor, &params, !role.is_static))
            .unwrap_or_default(),
        return_type: extract_return_type(extractor, node),
        is_async: is_async(node),
        decorators,
        is_static: role.is_static,
        is_classmethod: role.is_classmethod,
        is_property: role.is_property,
        parent_class: class_name.to_string(),
        name,
    }
}

pub(crate) fn function_name(extractor: &PythonExtractor, node: &Node) -> String {
    node.child_by_field_name("name")
        .map(|name| extractor.base().get_node_text(&name))
        .unwrap_or_default()
}

fn function_docstring(extractor: &PythonExtractor, node: &Node) -> Option<String> {
    node.child_by_field_name("body")
        .and_then(|body| extract_docstring(extractor, &body))
}

/// `async def` carries an anonymous `async` keyword child
fn is_async(node: &Node) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|child| child.kind() == "async");
    result
}
