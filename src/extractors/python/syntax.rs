// Compile checks the grammar does not make
//
// tree-sitter-python accepts a superset of Python 3: Python 2 statements, any parameter
// order, and stray indentation all parse without error nodes. These checks reject them so
// such files fail like any other syntax error.

use super::helpers::named_children;
use crate::extractors::base::BaseExtractor;
use tree_sitter::Node;

/// Line of the first construct Python 3 would refuse to compile, in source order
pub(crate) fn find_violation(root: &Node, source: &str) -> Option<u32> {
    let mut pending = vec![*root];

    while let Some(node) = pending.pop() {
        let violation = match node.kind() {
            "print_statement" | "exec_statement" => Some(node),
            "parameters" | "lambda_parameters" => non_default_after_default(&node),
            "module" | "block" => misindented_statement(&node, source),
            _ => None,
        };
        if let Some(offender) = violation {
            return Some(BaseExtractor::line_number(&offender));
        }

        pending.extend(named_children(&node).into_iter().rev());
    }

    None
}

/// A required positional parameter following a defaulted one
fn non_default_after_default<'a>(parameters: &Node<'a>) -> Option<Node<'a>> {
    let mut seen_default = false;

    for child in named_children(parameters) {
        match child.kind() {
            "default_parameter" | "typed_default_parameter" => seen_default = true,
            // Keyword-only parameters may omit defaults
            "keyword_separator" | "list_splat_pattern" | "dictionary_splat_pattern" => return None,
            "identifier" if seen_default => return Some(child),
            "typed_parameter" => {
                let target = named_children(&child).first().map(|target| target.kind());
                match target {
                    Some("list_splat_pattern" | "dictionary_splat_pattern") => return None,
                    Some("identifier") if seen_default => return Some(child),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    None
}

/// First line-leading statement whose column differs from its siblings'
///
/// Module statements must start at column zero. A block takes its indentation from its
/// first statement that begins a line; statements after `;` or on the header line are
/// not line-leading and are skipped.
fn misindented_statement<'a>(container: &Node<'a>, source: &str) -> Option<Node<'a>> {
    let mut indent = (container.kind() == "module").then_some(0);

    for statement in named_children(container) {
        if statement.kind() == "comment" || !starts_line(&statement, source) {
            continue;
        }

        let column = statement.start_position().column;
        match indent {
            None => indent = Some(column),
            Some(expected) if expected != column => return Some(statement),
            Some(_) => {}
        }
    }

    None
}

/// Only whitespace precedes the node on its line
fn starts_line(node: &Node, source: &str) -> bool {
    let start = node.start_byte();
    let line_start = start.saturating_sub(node.start_position().column);
    source
        .get(line_start..start)
        .is_some_and(|prefix| prefix.trim().is_empty())
}
