// TOC Builder for DocuAgent
//
// Turns extracted modules into the nested outline: module (level 0), classes, functions
// and significant constants (level 1), methods, properties and class variables (level 2).

use super::TocEntry;
use crate::extractors::base::{Class, ComponentKind, Function, Method, Module, Property};
use crate::utils::paths::dotted_module_path;

/// Dunder names worth listing next to upper-case constants
pub const SIGNIFICANT_DUNDERS: [&str; 3] = ["__version__", "__author__", "__all__"];

const CLASS_TITLE_BASES: usize = 2;
const FUNCTION_TITLE_PARAMS: usize = 3;
const METHOD_TITLE_PARAMS: usize = 2;

/// Outline builder; pure function of its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocBuilder {
    pub include_methods: bool,
    /// Covers both properties and class variables
    pub include_properties: bool,
}

impl Default for TocBuilder {
    fn default() -> Self {
        Self {
            include_methods: true,
            include_properties: true,
        }
    }
}

impl TocBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One root entry per module, in input order
    pub fn build(&self, modules: &[Module]) -> Vec<TocEntry> {
        modules.iter().map(|module| self.module_entry(module)).collect()
    }

    fn module_entry(&self, module: &Module) -> TocEntry {
        let mut entry = TocEntry {
            id: module.id.clone(),
            title: module_title(module),
            kind: ComponentKind::Module,
            level: 0,
            parent_id: None,
            file_path: module.file_path.clone(),
            line_number: module.line_number,
            children: Vec::new(),
        };

        for class in &module.classes {
            entry.children.push(self.class_entry(class, &module.id));
        }

        for function in &module.functions {
            entry.children.push(TocEntry::leaf(
                &function.id,
                function_title(function),
                ComponentKind::Function,
                1,
                &module.id,
                &function.file_path,
                function.line_number,
            ));
        }

        for constant in module
            .constants
            .iter()
            .filter(|constant| is_significant_constant(&constant.name))
        {
            entry
                .children
                .push(property_entry(constant, ComponentKind::Constant, 1, &module.id));
        }

        entry
    }

    fn class_entry(&self, class: &Class, module_id: &str) -> TocEntry {
        let mut entry = TocEntry {
            id: class.id.clone(),
            title: class_title(class),
            kind: ComponentKind::Class,
            level: 1,
            parent_id: Some(module_id.to_string()),
            file_path: class.file_path.clone(),
            line_number: class.line_number,
            children: Vec::new(),
        };

        if self.include_methods {
            for method in &class.methods {
                entry.children.push(TocEntry::leaf(
                    &method.id,
                    method_title(method),
                    ComponentKind::Method,
                    2,
                    &class.id,
                    &method.file_path,
                    method.line_number,
                ));
            }
        }

        if self.include_properties {
            for property in &class.properties {
                entry
                    .children
                    .push(property_entry(property, ComponentKind::Property, 2, &class.id));
            }
            for variable in &class.class_variables {
                entry
                    .children
                    .push(property_entry(variable, ComponentKind::Variable, 2, &class.id));
            }
        }

        entry
    }
}

fn property_entry(property: &Property, kind: ComponentKind, level: u32, parent_id: &str) -> TocEntry {
    TocEntry::leaf(
        &property.id,
        property.name.clone(),
        kind,
        level,
        parent_id,
        &property.file_path,
        property.line_number,
    )
}

/// `pkg/sub/core.py` => `pkg.sub.core`
pub fn module_title(module: &Module) -> String {
    dotted_module_path(&module.file_path)
}

/// `Name` or `Name(Base1, Base2, ...)`
pub fn class_title(class: &Class) -> String {
    if class.base_classes.is_empty() {
        return class.name.clone();
    }

    let mut bases = class
        .base_classes
        .iter()
        .take(CLASS_TITLE_BASES)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if class.base_classes.len() > CLASS_TITLE_BASES {
        bases.push_str(", ...");
    }
    format!("{}({})", class.name, bases)
}

/// `[async ]name(a, b=..., c, ...)`: first three parameters, defaults elided
pub fn function_title(function: &Function) -> String {
    let mut params: Vec<String> = function
        .parameters
        .iter()
        .take(FUNCTION_TITLE_PARAMS)
        .map(|param| match param.default_value.as_deref() {
            Some(default) if !default.is_empty() => format!("{}=...", param.name),
            _ => param.name.clone(),
        })
        .collect();
    if function.parameters.len() > FUNCTION_TITLE_PARAMS {
        params.push("...".to_string());
    }

    let prefix = if function.is_async { "async " } else { "" };
    format!("{}{}({})", prefix, function.name, params.join(", "))
}

/// `[@staticmethod |@classmethod |async ]name(a, b, ...)`: first two parameter names
pub fn method_title(method: &Method) -> String {
    let mut params: Vec<String> = method
        .parameters
        .iter()
        .take(METHOD_TITLE_PARAMS)
        .map(|param| param.name.clone())
        .collect();
    if method.parameters.len() > METHOD_TITLE_PARAMS {
        params.push("...".to_string());
    }

    let prefix = if method.is_static {
        "@staticmethod "
    } else if method.is_classmethod {
        "@classmethod "
    } else if method.is_async {
        "async "
    } else {
        ""
    };
    format!("{}{}({})", prefix, method.name, params.join(", "))
}

/// Upper-case names and a few metadata dunders are listed; other constants are not
pub fn is_significant_constant(name: &str) -> bool {
    is_upper(name) || SIGNIFICANT_DUNDERS.contains(&name)
}

/// At least one cased character and no lower-case ones
fn is_upper(name: &str) -> bool {
    let mut cased = false;
    for c in name.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}
