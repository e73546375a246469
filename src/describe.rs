//! Description plumbing
//!
//! Builds the requests and prompts a description generator works from, and parses batch
//! responses back into `component_id -> description`. No model client ships here; callers
//! plug one in through `DescriptionGenerator`.
//!
//! Requests are keyed only by component id, so batches may be generated in any order.

use crate::extractors::base::{Component, ComponentKind, ComponentRef, Module, Parameter};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Simple components per batch request
pub const DEFAULT_BATCH_SIZE: usize = 10;

const KEY_METHOD_LIMIT: usize = 10;
const BATCH_DOCSTRING_LIMIT: usize = 200;

pub const SYSTEM_PROMPT: &str = "You are a technical writer documenting the public API of a Python library.

Write clear, concise descriptions of code components:
1. Keep a professional, technical tone
2. Say what the component does and when someone would use it
3. Cover parameters, return values and raised exceptions when they matter
4. Mention side effects and constraints
5. Use one to three sentences for simple items, more for classes and modules
6. Build on an existing docstring rather than replacing it
7. Do not include code examples unless asked";

/// Fenced code block, optionally tagged `json`
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n?(.*?)```").expect("fenced block pattern is valid")
});

/// Where a component sits, for the prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionContext {
    pub module: Option<String>,
    pub class: Option<String>,
    /// Attach the component's source text to the prompt
    pub include_source: bool,
}

/// One component waiting for a description
#[derive(Debug, Clone)]
pub struct DescriptionRequest<'a> {
    pub component: ComponentRef<'a>,
    pub context: DescriptionContext,
}

impl<'a> DescriptionRequest<'a> {
    pub fn new(component: ComponentRef<'a>, context: DescriptionContext) -> Self {
        Self { component, context }
    }

    pub fn id(&self) -> &str {
        self.component.id()
    }

    /// Classes and modules are described one per request
    pub fn is_complex(&self) -> bool {
        matches!(self.component.kind(), ComponentKind::Class | ComponentKind::Module)
    }
}

/// Produces descriptions for one batch of requests
pub trait DescriptionGenerator {
    /// `component_id -> description` for the requests it could describe
    fn generate(&self, batch: &[DescriptionRequest<'_>]) -> Result<BTreeMap<String, String>>;
}

/// Requests for a whole module: the module, then each class followed by its methods and
/// properties, then the functions
pub fn requests_for_module(module: &Module, include_source: bool) -> Vec<DescriptionRequest<'_>> {
    let in_module = DescriptionContext {
        module: Some(module.name.clone()),
        class: None,
        include_source,
    };

    let mut requests = vec![DescriptionRequest::new(
        ComponentRef::Module(module),
        DescriptionContext {
            include_source,
            ..Default::default()
        },
    )];

    for class in &module.classes {
        requests.push(DescriptionRequest::new(ComponentRef::Class(class), in_module.clone()));

        let in_class = DescriptionContext {
            class: Some(class.name.clone()),
            ..in_module.clone()
        };
        for method in &class.methods {
            requests.push(DescriptionRequest::new(ComponentRef::Method(method), in_class.clone()));
        }
        for property in &class.properties {
            // Property bodies add nothing over the signature
            let context = DescriptionContext {
                include_source: false,
                ..in_class.clone()
            };
            requests.push(DescriptionRequest::new(ComponentRef::Property(property), context));
        }
    }

    for function in &module.functions {
        requests.push(DescriptionRequest::new(ComponentRef::Function(function), in_module.clone()));
    }

    requests
}

/// `name: type = default`, with `Any` for missing annotations
fn format_parameter(parameter: &Parameter) -> String {
    let mut text = format!(
        "{}: {}",
        parameter.name,
        parameter.type_annotation.as_deref().unwrap_or("Any")
    );
    if let Some(default) = parameter.default_value.as_deref().filter(|d| !d.is_empty()) {
        text.push_str(" = ");
        text.push_str(default);
    }
    text
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// Prompt for a single component
pub fn build_prompt(request: &DescriptionRequest<'_>) -> String {
    let component = &request.component;
    let context = &request.context;

    let mut parts = vec![
        format!("Generate documentation for the following {}:\n", component.kind()),
        format!("Name: {}", component.name()),
        format!("File: {}:{}", component.file_path(), component.line_number()),
    ];

    if let Some(module) = &context.module {
        parts.push(format!("Module: {}", module));
    }
    if let Some(class) = &context.class {
        parts.push(format!("Class: {}", class));
    }

    if let Some(docstring) = component.docstring().filter(|d| !d.is_empty()) {
        parts.push(format!("\nExisting docstring:\n{}", docstring));
    }

    if context.include_source {
        if let Some(source) = component.source_text() {
            parts.push(format!("\nSource code:\n```python\n{}\n```", source));
        }
    }

    match *component {
        ComponentRef::Function(function) => {
            push_callable(&mut parts, &function.parameters, function.return_type.as_deref(), function.is_async);
        }
        ComponentRef::Method(method) => {
            push_callable(&mut parts, &method.parameters, method.return_type.as_deref(), method.is_async);
            if method.is_static {
                parts.push("Note: This is a static method".to_string());
            } else if method.is_classmethod {
                parts.push("Note: This is a class method".to_string());
            }
        }
        ComponentRef::Class(class) => {
            if !class.base_classes.is_empty() {
                parts.push(format!("Base classes: {}", class.base_classes.join(", ")));
            }
            if !class.methods.is_empty() {
                parts.push(format!(
                    "Key methods: {}",
                    join_names(class.methods.iter().take(KEY_METHOD_LIMIT).map(|m| m.name.as_str()))
                ));
            }
        }
        ComponentRef::Property(property) => {
            if let Some(annotation) = &property.type_annotation {
                parts.push(format!("Type: {}", annotation));
            }
            if let Some(default) = property.default_value.as_deref().filter(|d| !d.is_empty()) {
                parts.push(format!("Default: {}", default));
            }
        }
        ComponentRef::Module(module) => {
            if !module.classes.is_empty() {
                parts.push(format!(
                    "Classes: {}",
                    join_names(module.classes.iter().map(|c| c.name.as_str()))
                ));
            }
            if !module.functions.is_empty() {
                parts.push(format!(
                    "Functions: {}",
                    join_names(module.functions.iter().map(|f| f.name.as_str()))
                ));
            }
        }
    }

    parts.push("\nWrite a clear, concise documentation description:".to_string());
    parts.join("\n")
}

fn push_callable(parts: &mut Vec<String>, parameters: &[Parameter], return_type: Option<&str>, is_async: bool) {
    if !parameters.is_empty() {
        let rendered: Vec<String> = parameters.iter().map(format_parameter).collect();
        parts.push(format!("Parameters: {}", rendered.join(", ")));
    }
    if let Some(return_type) = return_type {
        parts.push(format!("Return type: {}", return_type));
    }
    if is_async {
        parts.push("Note: This is an async function/method".to_string());
    }
}

/// Split requests into generator calls: every class and module alone, in input order,
/// then the remaining requests in groups of `batch_size`
pub fn partition_batches(requests: Vec<DescriptionRequest<'_>>, batch_size: usize) -> Vec<Vec<DescriptionRequest<'_>>> {
    let batch_size = batch_size.max(1);
    let (complex, simple): (Vec<_>, Vec<_>) = requests.into_iter().partition(DescriptionRequest::is_complex);

    let mut batches: Vec<Vec<DescriptionRequest<'_>>> = complex.into_iter().map(|request| vec![request]).collect();
    batches.extend(simple.chunks(batch_size).map(|chunk| chunk.to_vec()));
    batches
}

/// Prompt asking for a JSON array of `{id, description}` for several components
pub fn build_batch_prompt(requests: &[DescriptionRequest<'_>]) -> String {
    let mut parts = vec![
        "Generate documentation for the following components.".to_string(),
        "Return a JSON array with objects containing 'id' and 'description' fields.".to_string(),
        "\nComponents to document:\n".to_string(),
    ];

    for request in requests {
        let component = &request.component;
        let mut info = vec![
            format!("- ID: {}", component.id()),
            format!("  Name: {}", component.name()),
            format!("  Type: {}", component.kind()),
        ];

        if let Some(docstring) = component.docstring().filter(|d| !d.is_empty()) {
            info.push(format!("  Docstring: {}", truncate(docstring, BATCH_DOCSTRING_LIMIT)));
        }

        let callable = match *component {
            ComponentRef::Function(function) => Some((&function.parameters, &function.return_type)),
            ComponentRef::Method(method) => Some((&method.parameters, &method.return_type)),
            _ => None,
        };
        if let Some((parameters, return_type)) = callable {
            if !parameters.is_empty() {
                info.push(format!(
                    "  Parameters: {}",
                    join_names(parameters.iter().map(|p| p.name.as_str()))
                ));
            }
            if let Some(return_type) = return_type {
                info.push(format!("  Returns: {}", return_type));
            }
        }

        parts.push(info.join("\n"));
        parts.push(String::new());
    }

    parts.push(
        "\nRespond with only a JSON array, no additional text. Format: [{\"id\": \"...\", \"description\": \"...\"}]"
            .to_string(),
    );
    parts.join("\n")
}

/// The single-component prompt for a batch of one, the batch prompt otherwise
pub fn prompt_for(batch: &[DescriptionRequest<'_>]) -> String {
    match batch {
        [single] => build_prompt(single),
        _ => build_batch_prompt(batch),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    id: String,
    description: String,
}

/// Parse a batch response into `id -> description`
///
/// Accepts a bare JSON array or one wrapped in a fenced block (```` ```json ````).
pub fn parse_batch_response(text: &str) -> Result<BTreeMap<String, String>> {
    let text = text.trim();
    let json = FENCED_BLOCK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim())
        .unwrap_or(text);

    let items: Vec<BatchItem> =
        serde_json::from_str(json).context("Batch response is not a JSON array of {id, description}")?;

    Ok(items.into_iter().map(|item| (item.id, item.description)).collect())
}

/// Run every request through `generator`
///
/// A failed multi-component batch is retried one component at a time; components that
/// still fail are logged and left without a description.
pub fn generate_descriptions(
    generator: &dyn DescriptionGenerator,
    requests: Vec<DescriptionRequest<'_>>,
    batch_size: usize,
) -> BTreeMap<String, String> {
    let mut descriptions = BTreeMap::new();

    for batch in partition_batches(requests, batch_size) {
        match generator.generate(&batch) {
            Ok(generated) => descriptions.extend(generated),
            Err(e) if batch.len() > 1 => {
                warn!("Batch of {} failed, retrying one by one: {:#}", batch.len(), e);
                for request in &batch {
                    match generator.generate(std::slice::from_ref(request)) {
                        Ok(generated) => descriptions.extend(generated),
                        Err(e) => warn!("No description for {}: {:#}", request.id(), e),
                    }
                }
            }
            Err(e) => warn!("No description for {}: {:#}", batch[0].id(), e),
        }
    }

    debug!("Generated {} descriptions", descriptions.len());
    descriptions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::python::parse_source;
    use std::cell::Cell;

    const INVENTORY: &str = include_str!("../test_samples/inventory.py");

    fn inventory() -> Module {
        parse_source(INVENTORY, "pkg/inventory.py", false).unwrap()
    }

    fn names<'a>(requests: &'a [DescriptionRequest<'a>]) -> Vec<&'a str> {
        requests.iter().map(|request| request.component.name()).collect()
    }

    #[test]
    fn test_requests_follow_module_order() {
        let module = inventory();
        let requests = requests_for_module(&module, true);
        assert_eq!(
            names(&requests),
            vec![
                "inventory",
                "Item",
                "in_stock",
                "Warehouse",
                "__init__",
                "add",
                "validate",
                "from_config",
                "sync",
                "restock",
                "audit",
            ]
        );

        let add = &requests[5];
        assert_eq!(add.context.module.as_deref(), Some("inventory"));
        assert_eq!(add.context.class.as_deref(), Some("Warehouse"));
        assert!(add.context.include_source);
        assert!(!requests[2].context.include_source, "Properties never carry source");
        assert_eq!(requests[0].context.module, None);
    }

    #[test]
    fn test_function_prompt() {
        let module = inventory();
        let requests = requests_for_module(&module, false);
        let restock = requests.iter().find(|r| r.component.name() == "restock").unwrap();
        let prompt = build_prompt(restock);

        assert!(prompt.starts_with("Generate documentation for the following function:\n"));
        assert!(prompt.contains("Name: restock"));
        assert!(prompt.contains("File: pkg/inventory.py:55"));
        assert!(prompt.contains("Module: inventory"));
        assert!(prompt.contains("Existing docstring:\nRestock an item.\n\nReturns a new item"));
        assert!(prompt.contains("Parameters: item: Item, amount: int = 10"));
        assert!(prompt.contains("Return type: Item"));
        assert!(!prompt.contains("Source code"));
        assert!(prompt.ends_with("Write a clear, concise documentation description:"));
    }

    #[test]
    fn test_method_and_class_prompts() {
        let module = inventory();
        let requests = requests_for_module(&module, true);

        let validate = requests.iter().find(|r| r.component.name() == "validate").unwrap();
        let prompt = build_prompt(validate);
        assert!(prompt.contains("Class: Warehouse"));
        assert!(prompt.contains("Parameters: sku: str"));
        assert!(prompt.contains("Note: This is a static method"));
        assert!(prompt.contains("Source code:\n```python\n    @staticmethod") || prompt.contains("Source code:\n```python\ndef validate"));

        let sync = requests.iter().find(|r| r.component.name() == "sync").unwrap();
        let prompt = build_prompt(sync);
        assert!(prompt.contains("Parameters: remote: Any, timeout: Any = 30.0"));
        assert!(prompt.contains("Note: This is an async function/method"));

        let warehouse = requests.iter().find(|r| r.component.name() == "Warehouse").unwrap();
        let prompt = build_prompt(warehouse);
        assert!(prompt.contains("Key methods: __init__, add, validate, from_config, sync"));
        assert!(!prompt.contains("Base classes"));

        let module_prompt = build_prompt(&requests[0]);
        assert!(module_prompt.contains("following module"));
        assert!(module_prompt.contains("Classes: Item, Warehouse"));
        assert!(module_prompt.contains("Functions: restock, audit"));
    }

    #[test]
    fn test_property_prompt() {
        let module = inventory();
        let requests = requests_for_module(&module, false);
        let prompt = build_prompt(&requests[2]);
        assert!(prompt.contains("following property"));
        assert!(prompt.contains("Type: bool"));
        assert!(!prompt.contains("Default:"));
    }

    #[test]
    fn test_partition_batches() {
        let module = inventory();
        let batches = partition_batches(requests_for_module(&module, false), 4);

        let shapes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(shapes, vec![1, 1, 1, 4, 4]);
        assert_eq!(batches[0][0].component.kind(), ComponentKind::Module);
        assert_eq!(batches[1][0].component.name(), "Item");
        assert_eq!(batches[2][0].component.name(), "Warehouse");
        assert_eq!(batches[3][0].component.name(), "in_stock");

        let unbounded = partition_batches(requests_for_module(&module, false), 0);
        assert_eq!(unbounded.len(), 3 + 8, "Zero batch size means one per batch");
    }

    #[test]
    fn test_batch_prompt() {
        let module = inventory();
        let requests = requests_for_module(&module, false);
        let simple: Vec<_> = requests.into_iter().filter(|r| !r.is_complex()).take(2).collect();
        let prompt = build_batch_prompt(&simple);

        assert!(prompt.contains(&format!("- ID: {}", simple[0].id())));
        assert!(prompt.contains("  Type: property"));
        assert!(prompt.contains("  Docstring: Whether any units remain."));
        assert!(prompt.contains("  Parameters: name, capacity"));
        assert!(prompt.ends_with("Format: [{\"id\": \"...\", \"description\": \"...\"}]"));
        assert_eq!(prompt_for(&simple[..1]), build_prompt(&simple[0]));
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_parse_batch_response() {
        let bare = r#"[{"id": "a1", "description": "Adds."}, {"id": "b2", "description": "Bees."}]"#;
        let parsed = parse_batch_response(bare).unwrap();
        assert_eq!(parsed["a1"], "Adds.");
        assert_eq!(parsed.len(), 2);

        let fenced = "Here you go:\n```json\n[{\"id\": \"a1\", \"description\": \"Adds.\"}]\n```\nDone.";
        assert_eq!(parse_batch_response(fenced).unwrap()["a1"], "Adds.");

        let plain_fence = "```\n[{\"id\": \"c3\", \"description\": \"See.\"}]\n```";
        assert_eq!(parse_batch_response(plain_fence).unwrap()["c3"], "See.");

        assert!(parse_batch_response("I could not do that").is_err());
        assert!(parse_batch_response(r#"[{"id": "a1"}]"#).is_err());
    }

    struct EchoGenerator {
        calls: Cell<usize>,
        fail_batches: bool,
    }

    impl DescriptionGenerator for EchoGenerator {
        fn generate(&self, batch: &[DescriptionRequest<'_>]) -> Result<BTreeMap<String, String>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_batches && batch.len() > 1 {
                anyhow::bail!("model returned prose");
            }
            if batch.iter().any(|r| r.component.name() == "audit") {
                anyhow::bail!("rate limited");
            }
            Ok(batch
                .iter()
                .map(|r| (r.id().to_string(), format!("About {}", r.component.name())))
                .collect())
        }
    }

    #[test]
    fn test_generate_descriptions_with_fallback() {
        let module = inventory();
        let generator = EchoGenerator {
            calls: Cell::new(0),
            fail_batches: true,
        };
        let descriptions =
            generate_descriptions(&generator, requests_for_module(&module, false), DEFAULT_BATCH_SIZE);

        // 3 complex calls, 1 failed batch, 8 single retries
        assert_eq!(generator.calls.get(), 12);
        assert_eq!(descriptions.len(), 10, "Only the failing component is missing");
        assert_eq!(descriptions[&module.id], "About inventory");
        assert!(!descriptions.contains_key(&module.functions[1].id));
    }

    #[test]
    fn test_generate_descriptions_batched() {
        let module = inventory();
        let generator = EchoGenerator {
            calls: Cell::new(0),
            fail_batches: false,
        };
        let requests: Vec<_> = requests_for_module(&module, false)
            .into_iter()
            .filter(|r| r.component.name() != "audit")
            .collect();
        let descriptions = generate_descriptions(&generator, requests, DEFAULT_BATCH_SIZE);

        assert_eq!(generator.calls.get(), 4);
        assert_eq!(descriptions.len(), 10);
    }
}
