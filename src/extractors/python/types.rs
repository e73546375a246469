/// Class extraction
/// Classes, base classes and class bodies (methods, properties, class variables)
use super::assignments::{extract_assignment, Assignment};
use super::decorators::extract_decorators;
use super::functions::{extract_method, function_name};
use super::helpers::{extract_docstring, named_children};
use super::signatures::should_include_member;
use super::unparse::unparse;
use super::PythonExtractor;
use crate::extractors::base::{BaseExtractor, Class, ComponentKind, Method, Property};
use tree_sitter::Node;

/// A function in a class body after reclassification
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Member {
    Method(Method),
    /// A method decorated with `@property`, promoted to a property record
    Property(Property),
}

impl Member {
    /// Reclassify a parsed method. Property methods keep their id, docstring and
    /// source; the return annotation becomes the property type.
    pub fn classify(method: Method) -> Self {
        if !method.is_property {
            return Member::Method(method);
        }

        Member::Property(Property {
            id: method.id,
            name: method.name,
            kind: ComponentKind::Property,
            file_path: method.file_path,
            line_number: method.line_number,
            docstring: method.docstring,
            source_text: method.source_text,
            type_annotation: method.return_type,
            default_value: None,
            is_class_var: false,
        })
    }
}

/// Extract a class from a `class_definition` node
pub(crate) fn extract_class(extractor: &PythonExtractor, node: &Node) -> Class {
    let base = extractor.base();
    let name = class_name(extractor, node);

    let mut class = Class {
        id: base.generate_id(&name, node),
        name,
        file_path: base.file_path.clone(),
        line_number: BaseExtractor::line_number(node),
        docstring: None,
        source_text: base.source_segment(node),
        base_classes: extract_base_classes(extractor, node),
        methods: Vec::new(),
        properties: Vec::new(),
        class_variables: Vec::new(),
        decorators: extract_decorators(extractor, node),
    };

    if let Some(body) = node.child_by_field_name("body") {
        class.docstring = extract_docstring(extractor, &body);
        extract_class_body(extractor, &body, &mut class);
    }

    class
}

pub(crate) fn class_name(extractor: &PythonExtractor, node: &Node) -> String {
    node.child_by_field_name("name")
        .map(|name| extractor.base().get_node_text(&name))
        .unwrap_or_default()
}

/// Base classes in declaration order. Keyword arguments (`metaclass=...`) are not bases.
fn extract_base_classes(extractor: &PythonExtractor, node: &Node) -> Vec<String> {
    let Some(superclasses) = node.child_by_field_name("superclasses") else {
        return Vec::new();
    };

    named_children(&superclasses)
        .iter()
        .filter(|child| !matches!(child.kind(), "keyword_argument" | "dictionary_splat"))
        .map(|child| unparse(extractor, child))
        .collect()
}

fn extract_class_body(extractor: &PythonExtractor, body: &Node, class: &mut Class) {
    let include_private = extractor.include_private();

    for statement in named_children(body) {
        match statement.kind() {
            "function_definition" | "decorated_definition" => {
                let Some(definition) = function_definition(&statement) else {
                    continue;
                };
                let name = function_name(extractor, &definition);
                if !should_include_member(&name, include_private) {
                    continue;
                }

                match Member::classify(extract_method(extractor, &definition, &class.name)) {
                    Member::Method(method) => class.methods.push(method),
                    Member::Property(property) => class.properties.push(property),
                }
            }
            "expression_statement" => {
                let Some(assignment) = single_assignment(&statement) else {
                    continue;
                };
                let assignment = Assignment::from_node(assignment);
                for name in assignment.target_names(extractor) {
                    if !should_include_member(&name, include_private) {
                        continue;
                    }
                    let qualified_name = format!("{}.{}", class.name, name);
                    class.class_variables.push(extract_assignment(
                        extractor,
                        &assignment,
                        &name,
                        &qualified_name,
                        ComponentKind::Variable,
                    ));
                }
            }
            // Nested classes and other statements are not part of the documented surface
            _ => {}
        }
    }
}

/// The function inside a (possibly decorated) definition; decorated classes yield `None`
pub(crate) fn function_definition<'a>(statement: &Node<'a>) -> Option<Node<'a>> {
    match statement.kind() {
        "function_definition" => Some(*statement),
        "decorated_definition" => statement
            .child_by_field_name("definition")
            .filter(|definition| definition.kind() == "function_definition"),
        _ => None,
    }
}

/// The assignment of an expression statement that holds exactly one
pub(crate) fn single_assignment<'a>(statement: &Node<'a>) -> Option<Node<'a>> {
    match named_children(statement).as_slice() {
        [only] if only.kind() == "assignment" => Some(*only),
        _ => None,
    }
}
