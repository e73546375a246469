/// Function signatures and naming policy
/// Handles parameter lists, return types and the underscore visibility rules
use super::helpers::named_children;
use super::unparse::unparse;
use super::PythonExtractor;
use crate::extractors::base::Parameter;
use tree_sitter::Node;

/// Special methods documented even when private members are hidden
pub const DOCUMENTED_SPECIAL_METHODS: [&str; 5] =
    ["__init__", "__new__", "__call__", "__enter__", "__exit__"];

/// Module-level visibility: explicit export list first, then the naming convention
///
/// A single leading underscore hides a name; dunder names stay visible.
pub fn should_include(name: &str, export_list: Option<&[String]>, include_private: bool) -> bool {
    if let Some(exports) = export_list {
        return exports.iter().any(|export| export == name);
    }

    if include_private {
        return true;
    }

    !(name.starts_with('_') && !name.starts_with("__"))
}

/// Class member visibility. Export lists never apply to members.
pub fn should_include_member(name: &str, include_private: bool) -> bool {
    if include_private || DOCUMENTED_SPECIAL_METHODS.contains(&name) {
        return true;
    }

    !name.starts_with('_')
}

/// Extract function parameters from a `parameters` node
///
/// Order follows the declaration: positional, `*args`, keyword-only, `**kwargs`.
/// `drop_receiver` removes the first positional parameter (`self`/`cls`).
pub(crate) fn extract_parameters(
    extractor: &PythonExtractor,
    parameters_node: &Node,
    drop_receiver: bool,
) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut receiver_pending = drop_receiver;

    for child in named_children(parameters_node) {
        // Nothing after a bare `*` or `/` marker can be the receiver
        if matches!(child.kind(), "keyword_separator" | "positional_separator") {
            receiver_pending = false;
            continue;
        }

        let Some((param, positional)) = extract_parameter(extractor, &child) else {
            continue;
        };

        // Only a leading positional parameter can be the receiver
        if receiver_pending {
            receiver_pending = false;
            if positional {
                continue;
            }
        }

        params.push(param);
    }

    params
}

/// One parameter plus whether it can bind positionally
fn extract_parameter(extractor: &PythonExtractor, node: &Node) -> Option<(Parameter, bool)> {
    let base = extractor.base();

    match node.kind() {
        "identifier" => Some((Parameter::new(base.get_node_text(node)), true)),

        "default_parameter" | "typed_default_parameter" => {
            let name = node.child_by_field_name("name")?;
            let mut param = Parameter::new(base.get_node_text(&name));
            param.type_annotation = node
                .child_by_field_name("type")
                .map(|annotation| unparse(extractor, &annotation));
            param.default_value = node
                .child_by_field_name("value")
                .map(|value| unparse(extractor, &value));
            Some((param, true))
        }

        "typed_parameter" => {
            // The annotated target is the first named child: identifier or splat pattern
            let target = named_children(node).into_iter().next()?;
            let (mut param, positional) = extract_parameter(extractor, &target)?;
            param.type_annotation = node
                .child_by_field_name("type")
                .map(|annotation| unparse(extractor, &annotation));
            Some((param, positional))
        }

        "list_splat_pattern" => {
            let name = named_children(node).into_iter().next()?;
            Some((
                Parameter::new(format!("*{}", base.get_node_text(&name))),
                false,
            ))
        }

        "dictionary_splat_pattern" => {
            let name = named_children(node).into_iter().next()?;
            Some((
                Parameter::new(format!("**{}", base.get_node_text(&name))),
                false,
            ))
        }

        // Bare `*` and `/` markers carry no parameter of their own
        _ => None,
    }
}

/// Return annotation of a function definition
pub(crate) fn extract_return_type(extractor: &PythonExtractor, node: &Node) -> Option<String> {
    node.child_by_field_name("return_type")
        .map(|annotation| unparse(extractor, &annotation))
}
