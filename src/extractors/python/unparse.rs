// Expression printer for Python extraction
//
// Renders defaults, annotations, decorators and base classes back to Python text from the
// syntax tree. Total: every node yields a string, shapes it does not know print as `...`.

use super::helpers::{named_children, plain_string_value};
use super::PythonExtractor;
use tree_sitter::Node;

/// Placeholder for expression shapes the printer does not render
pub const PLACEHOLDER: &str = "...";

/// Render an expression node as Python source text
pub(crate) fn unparse(extractor: &PythonExtractor, node: &Node) -> String {
    let base = extractor.base();

    match node.kind() {
        "identifier" | "keyword_identifier" | "true" | "false" | "none" | "ellipsis" => {
            base.get_node_text(node)
        }

        "integer" => integer_literal(&base.get_node_text(node)),
        "float" => float_literal(&base.get_node_text(node)),

        "string" | "concatenated_string" => match plain_string_value(extractor, node) {
            Some(value) => python_repr(&value),
            // f-strings and bytes keep their literal form
            None => base.get_node_text(node),
        },

        "attribute" => format!(
            "{}.{}",
            field(extractor, node, "object"),
            field(extractor, node, "attribute")
        ),

        "subscript" => {
            let mut cursor = node.walk();
            let subscripts: Vec<String> = node
                .children_by_field_name("subscript", &mut cursor)
                .map(|child| unparse(extractor, &child))
                .collect();
            format!("{}[{}]", field(extractor, node, "value"), subscripts.join(", "))
        }

        "slice" => {
            let mut cursor = node.walk();
            let bounds: String = node
                .children(&mut cursor)
                .filter(|child| child.kind() != "comment")
                .map(|child| {
                    if child.is_named() {
                        unparse(extractor, &child)
                    } else {
                        child.kind().to_string()
                    }
                })
                .collect();
            bounds
        }

        "call" => {
            let arguments = match node.child_by_field_name("arguments") {
                Some(args) if args.kind() == "argument_list" => unparse(extractor, &args),
                Some(args) => format!("({})", unparse(extractor, &args)),
                None => "()".to_string(),
            };
            format!("{}{}", field(extractor, node, "function"), arguments)
        }

        "argument_list" => format!("({})", join_children(extractor, node)),

        "keyword_argument" => format!(
            "{}={}",
            field(extractor, node, "name"),
            field(extractor, node, "value")
        ),

        "list_splat" | "list_splat_pattern" => format!("*{}", first_named(extractor, node)),
        "dictionary_splat" | "dictionary_splat_pattern" => {
            format!("**{}", first_named(extractor, node))
        }

        "list" => format!("[{}]", join_children(extractor, node)),
        "set" => format!("{{{}}}", join_children(extractor, node)),
        "dictionary" => format!("{{{}}}", join_children(extractor, node)),
        "pair" => format!(
            "{}: {}",
            field(extractor, node, "key"),
            field(extractor, node, "value")
        ),

        "tuple" | "expression_list" | "pattern_list" => {
            let elements = named_children(node);
            match elements.as_slice() {
                [single] => format!("({},)", unparse(extractor, single)),
                _ => format!("({})", join_children(extractor, node)),
            }
        }

        "parenthesized_expression" => match named_children(node).first() {
            Some(inner) if needs_parentheses(inner.kind()) => {
                format!("({})", unparse(extractor, inner))
            }
            Some(inner) => unparse(extractor, inner),
            None => PLACEHOLDER.to_string(),
        },

        "binary_operator" | "boolean_operator" => format!(
            "{} {} {}",
            field(extractor, node, "left"),
            operator(node),
            field(extractor, node, "right")
        ),

        "unary_operator" => format!("{}{}", operator(node), field(extractor, node, "argument")),
        "not_operator" => format!("not {}", field(extractor, node, "argument")),
        "await" => format!("await {}", first_named(extractor, node)),

        "comparison_operator" => {
            let mut cursor = node.walk();
            let parts: Vec<String> = node
                .children(&mut cursor)
                .filter(|child| child.kind() != "comment")
                .map(|child| {
                    if child.is_named() {
                        unparse(extractor, &child)
                    } else {
                        child.kind().to_string()
                    }
                })
                .collect();
            parts.join(" ")
        }

        "conditional_expression" => match named_children(node).as_slice() {
            [body, condition, alternative] => format!(
                "{} if {} else {}",
                unparse(extractor, body),
                unparse(extractor, condition),
                unparse(extractor, alternative)
            ),
            _ => PLACEHOLDER.to_string(),
        },

        "named_expression" => format!(
            "{} := {}",
            field(extractor, node, "name"),
            field(extractor, node, "value")
        ),

        "lambda" => {
            let body = field(extractor, node, "body");
            match node.child_by_field_name("parameters") {
                Some(params) => {
                    let rendered: Vec<String> = named_children(&params)
                        .iter()
                        .map(|param| render_lambda_parameter(extractor, param))
                        .collect();
                    format!("lambda {}: {}", rendered.join(", "), body)
                }
                None => format!("lambda: {}", body),
            }
        }

        "type" | "decorator" => first_named(extractor, node),

        "generic_type" => match named_children(node).as_slice() {
            [name, parameters] => format!(
                "{}{}",
                unparse(extractor, name),
                unparse(extractor, parameters)
            ),
            _ => PLACEHOLDER.to_string(),
        },
        "type_parameter" => format!("[{}]", join_children(extractor, node)),
        "union_type" => join_with(extractor, node, " | "),
        "member_type" => join_with(extractor, node, "."),
        "constrained_type" => join_with(extractor, node, ": "),
        "splat_type" => {
            let mut cursor = node.walk();
            let marker = node
                .children(&mut cursor)
                .find(|child| !child.is_named())
                .map(|child| child.kind().to_string())
                .unwrap_or_default();
            format!("{}{}", marker, first_named(extractor, node))
        }

        _ => PLACEHOLDER.to_string(),
    }
}

/// Python `repr()` of a string value
pub(crate) fn python_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut repr = String::with_capacity(value.len() + 2);
    repr.push(quote);
    for c in value.chars() {
        match c {
            '\\' => repr.push_str("\\\\"),
            '\n' => repr.push_str("\\n"),
            '\r' => repr.push_str("\\r"),
            '\t' => repr.push_str("\\t"),
            c if c == quote => {
                repr.push('\\');
                repr.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                repr.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => repr.push(c),
        }
    }
    repr.push(quote);
    repr
}

/// Integer literal as Python prints its value: `1_000` -> `1000`, `0x10` -> `16`
///
/// Imaginary literals and values past `u128` keep their source text.
fn integer_literal(text: &str) -> String {
    let digits = text.replace('_', "").to_ascii_lowercase();
    let (radix, body) = match digits.get(..2) {
        Some("0x") => (16, &digits[2..]),
        Some("0o") => (8, &digits[2..]),
        Some("0b") => (2, &digits[2..]),
        _ => (10, digits.as_str()),
    };

    match u128::from_str_radix(body, radix) {
        Ok(value) => value.to_string(),
        Err(_) => text.to_string(),
    }
}

/// Float literal as Python's `repr` prints it: `1e3` -> `1000.0`, `1E-5` -> `1e-05`
fn float_literal(text: &str) -> String {
    let Ok(value) = text.replace('_', "").parse::<f64>() else {
        // imaginary suffix
        return text.to_string();
    };
    if value.is_infinite() {
        return "1e309".to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let positional = value.to_string();
        if positional.contains('.') {
            positional
        } else {
            format!("{}.0", positional)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

fn needs_parentheses(kind: &str) -> bool {
    matches!(
        kind,
        "binary_operator"
            | "boolean_operator"
            | "unary_operator"
            | "not_operator"
            | "comparison_operator"
            | "conditional_expression"
            | "lambda"
            | "await"
            | "named_expression"
    )
}

fn field(extractor: &PythonExtractor, node: &Node, name: &str) -> String {
    node.child_by_field_name(name)
        .map(|child| unparse(extractor, &child))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn first_named(extractor: &PythonExtractor, node: &Node) -> String {
    named_children(node)
        .first()
        .map(|child| unparse(extractor, child))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn join_children(extractor: &PythonExtractor, node: &Node) -> String {
    join_with(extractor, node, ", ")
}

fn join_with(extractor: &PythonExtractor, node: &Node, separator: &str) -> String {
    named_children(node)
        .iter()
        .map(|child| unparse(extractor, child))
        .collect::<Vec<_>>()
        .join(separator)
}

fn operator(node: &Node) -> String {
    node.child_by_field_name("operator")
        .map(|op| op.kind().to_string())
        .unwrap_or_default()
}

fn render_lambda_parameter(extractor: &PythonExtractor, param: &Node) -> String {
    match param.kind() {
        "default_parameter" => format!(
            "{}={}",
            field(extractor, param, "name"),
            field(extractor, param, "value")
        ),
        "keyword_separator" => "*".to_string(),
        "positional_separator" => "/".to_string(),
        _ => unparse(extractor, param),
    }
}
