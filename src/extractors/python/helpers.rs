// Helper utilities for Python extraction
// String literal decoding, docstring lookup and docstring cleaning.

use super::PythonExtractor;
use tree_sitter::Node;

/// Named children of a node, skipping comments (comments are extras and can show up
/// anywhere in a block or a bracketed expression)
pub(crate) fn named_children<'a>(node: &Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

/// Lower-cased prefix of a string literal (`r`, `b`, `f`, `rb`, ...)
pub(crate) fn string_prefix(extractor: &PythonExtractor, node: &Node) -> String {
    let mut cursor = node.walk();
    let start = node
        .children(&mut cursor)
        .find(|child| child.kind() == "string_start");

    match start {
        Some(start) => extractor
            .base()
            .get_node_text(&start)
            .trim_end_matches(['"', '\''])
            .to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Value of a plain string literal: not an f-string, not bytes
///
/// Implicitly concatenated literals are joined. Escapes are decoded unless the literal is
/// raw. Returns `None` for any other node shape.
pub(crate) fn plain_string_value(extractor: &PythonExtractor, node: &Node) -> Option<String> {
    match node.kind() {
        "string" => {
            let prefix = string_prefix(extractor, node);
            if prefix.contains(['f', 'b', 't']) {
                return None;
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            let start = children.iter().find(|c| c.kind() == "string_start")?;
            let end = children.iter().rev().find(|c| c.kind() == "string_end")?;
            let raw = extractor
                .base()
                .content
                .get(start.end_byte()..end.start_byte())?
                .replace("\r\n", "\n");

            if prefix.contains('r') {
                Some(raw)
            } else {
                Some(decode_escapes(&raw))
            }
        }
        "concatenated_string" => {
            let mut value = String::new();
            for part in named_children(node) {
                value.push_str(&plain_string_value(extractor, &part)?);
            }
            Some(value)
        }
        _ => None,
    }
}

/// Docstring of a module, class or function body
///
/// The first statement must be a lone plain string literal. The text is cleaned the way
/// Python's `inspect.cleandoc` does it.
pub(crate) fn extract_docstring(extractor: &PythonExtractor, body: &Node) -> Option<String> {
    let first = named_children(body).into_iter().next()?;
    if first.kind() != "expression_statement" {
        return None;
    }

    let expressions = named_children(&first);
    match expressions.as_slice() {
        [expr] if matches!(expr.kind(), "string" | "concatenated_string") => {
            plain_string_value(extractor, expr).map(|value| clean_docstring(&value))
        }
        _ => None,
    }
}

/// Tab expansion, common margin removal and blank edge line removal
pub fn clean_docstring(doc: &str) -> String {
    let lines: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start();
            if content.is_empty() {
                None
            } else {
                Some(line.chars().count() - content.chars().count())
            }
        })
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                line.trim_start().to_string()
            } else {
                line.chars().skip(margin).collect()
            }
        })
        .collect();

    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    let leading = cleaned.iter().take_while(|line| line.is_empty()).count();

    cleaned[leading..].join("\n")
}

fn expand_tabs(line: &str) -> String {
    const TAB_SIZE: usize = 8;
    let mut expanded = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = TAB_SIZE - column % TAB_SIZE;
            expanded.push_str(&" ".repeat(spaces));
            column += spaces;
        } else if c != '\r' {
            expanded.push(c);
            column += 1;
        }
    }
    expanded
}

/// Decode backslash escapes of a non-raw string literal body
///
/// Unknown or malformed escapes are kept verbatim, as Python does.
pub(crate) fn decode_escapes(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }

        let Some(escape) = chars.next() else {
            decoded.push('\\');
            break;
        };

        match escape {
            '\n' => {}
            '\\' | '\'' | '"' => decoded.push(escape),
            'a' => decoded.push('\x07'),
            'b' => decoded.push('\x08'),
            'f' => decoded.push('\x0c'),
            'n' => decoded.push('\n'),
            'r' => decoded.push('\r'),
            't' => decoded.push('\t'),
            'v' => decoded.push('\x0b'),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.clone().next().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                decoded.extend(char::from_u32(value));
            }
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let code_point = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match code_point {
                    Some(ch) => {
                        decoded.push(ch);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        decoded.push('\\');
                        decoded.push(escape);
                    }
                }
            }
            other => {
                decoded.push('\\');
                decoded.push(other);
            }
        }
    }

    decoded
}
