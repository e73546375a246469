/// Variable and constant assignment extraction
/// Handles plain, chained and annotated assignments with simple name targets
use super::unparse::unparse;
use super::PythonExtractor;
use crate::extractors::base::{BaseExtractor, ComponentKind, Property};
use tree_sitter::Node;

/// An assignment statement broken into the parts extraction cares about
#[derive(Debug, Clone)]
pub(crate) struct Assignment<'a> {
    /// Outermost `assignment` node; gives the line and the source slice
    pub node: Node<'a>,
    /// Name targets in declaration order (`a = b = 1` binds `a` then `b`)
    pub targets: Vec<Node<'a>>,
    pub annotation: Option<Node<'a>>,
    pub value: Option<Node<'a>>,
}

impl<'a> Assignment<'a> {
    /// Unfold a (possibly chained) assignment. Tuple, attribute and subscript targets are
    /// skipped, so the target list can be empty.
    pub fn from_node(node: Node<'a>) -> Self {
        let annotation = node.child_by_field_name("type");
        let mut targets = Vec::new();
        let mut current = node;

        let value = loop {
            if let Some(left) = current.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    targets.push(left);
                }
            }

            match current.child_by_field_name("right") {
                Some(right) if right.kind() == "assignment" => current = right,
                right => break right,
            }
        };

        Self {
            node,
            targets,
            annotation,
            value,
        }
    }

    pub fn target_names(&self, extractor: &PythonExtractor) -> Vec<String> {
        self.targets
            .iter()
            .map(|target| extractor.base().get_node_text(target))
            .collect()
    }

    /// Value bound to `name` by a plain, unannotated assignment
    pub fn plain_value_for(&self, extractor: &PythonExtractor, name: &str) -> Option<Node<'a>> {
        if self.annotation.is_some() {
            return None;
        }
        self.target_names(extractor)
            .iter()
            .any(|target| target == name)
            .then_some(self.value)
            .flatten()
    }
}

/// Build the record for one name bound by an assignment
///
/// `qualified_name` feeds the identifier (`NAME` at module level, `Class.NAME` in a class).
pub(crate) fn extract_assignment(
    extractor: &PythonExtractor,
    assignment: &Assignment,
    name: &str,
    qualified_name: &str,
    kind: ComponentKind,
) -> Property {
    let base = extractor.base();

    Property {
        id: base.generate_id(qualified_name, &assignment.node),
        name: name.to_string(),
        kind,
        file_path: base.file_path.clone(),
        line_number: BaseExtractor::line_number(&assignment.node),
        docstring: None,
        source_text: base.source_segment(&assignment.node),
        type_annotation: assignment
            .annotation
            .map(|annotation| unparse(extractor, &annotation)),
        default_value: assignment.value.map(|value| unparse(extractor, &value)),
        is_class_var: kind == ComponentKind::Variable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::new_parser;

    fn with_assignment(source: &str, check: impl FnOnce(&PythonExtractor, &Assignment)) {
        let extractor = PythonExtractor::new("pkg/settings.py".to_string(), source.to_string(), false);
        let tree = new_parser().unwrap().parse(source, None).unwrap();
        let statement = tree.root_node().named_child(0).unwrap();
        let node = statement.named_child(0).unwrap();
        check(&extractor, &Assignment::from_node(node));
    }

    #[test]
    fn test_chained_assignment_binds_every_name() {
        with_assignment("A = B = 10\n", |extractor, assignment| {
            assert_eq!(assignment.target_names(extractor), vec!["A", "B"]);
            let prop = extract_assignment(extractor, assignment, "B", "B", ComponentKind::Constant);
            assert_eq!(prop.default_value.as_deref(), Some("10"));
            assert_eq!(prop.source_text.as_deref(), Some("A = B = 10"));
            assert_eq!(prop.line_number, 1);
            assert!(!prop.is_class_var);
        });
    }

    #[test]
    fn test_annotated_assignment_without_value() {
        with_assignment("timeout: float\n", |extractor, assignment| {
            let prop = extract_assignment(
                extractor,
                assignment,
                "timeout",
                "Config.timeout",
                ComponentKind::Variable,
            );
            assert_eq!(prop.type_annotation.as_deref(), Some("float"));
            assert_eq!(prop.default_value, None);
            assert!(prop.is_class_var);
            assert_eq!(prop.id, crate::extractors::base::generate_id("pkg/settings.py", "Config.timeout", 1));
        });
    }

    #[test]
    fn test_tuple_targets_are_skipped() {
        with_assignment("a, b = 1, 2\n", |extractor, assignment| {
            assert!(assignment.target_names(extractor).is_empty());
        });
    }
}
