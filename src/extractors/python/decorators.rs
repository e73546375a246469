/// Decorator extraction and handling
/// Supports @property, @staticmethod, @classmethod, and custom decorators
use super::helpers::named_children;
use super::unparse::unparse;
use super::PythonExtractor;
use tree_sitter::Node;

/// Extract decorators from a function or class definition
///
/// Decorators hang off the enclosing `decorated_definition`. Each one is rendered as
/// its full expression, arguments included (`lru_cache(maxsize=128)`).
pub(crate) fn extract_decorators(extractor: &PythonExtractor, node: &Node) -> Vec<String> {
    let Some(decorated) = node
        .parent()
        .filter(|parent| parent.kind() == "decorated_definition")
    else {
        return Vec::new();
    };

    named_children(&decorated)
        .iter()
        .filter(|child| child.kind() == "decorator")
        .map(|decorator| unparse(extractor, decorator))
        .collect()
}

/// Role flags a method derives from its decorators (exact names only)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MethodRole {
    pub is_static: bool,
    pub is_classmethod: bool,
    pub is_property: bool,
}

impl MethodRole {
    pub fn from_decorators(decorators: &[String]) -> Self {
        let has = |name: &str| decorators.iter().any(|decorator| decorator == name);
        Self {
            is_static: has("staticmethod"),
            is_classmethod: has("classmethod"),
            is_property: has("property"),
        }
    }
}
