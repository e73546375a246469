// Component model for DocuAgent
//
// All data structures produced by the Python extractor: modules, classes, functions,
// methods, properties and parameters. Records are built once by the extractor and never
// mutated afterwards; every consumer (outline, store, description plumbing) reads them.

use serde::{Deserialize, Serialize};

/// Kinds of documented components
///
/// Closed set: the outline, the selection store and the renderer all key off these values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Module,
    Class,
    Function,
    Method,
    Property,
    Constant,
    Variable,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Module => write!(f, "module"),
            ComponentKind::Class => write!(f, "class"),
            ComponentKind::Function => write!(f, "function"),
            ComponentKind::Method => write!(f, "method"),
            ComponentKind::Property => write!(f, "property"),
            ComponentKind::Constant => write!(f, "constant"),
            ComponentKind::Variable => write!(f, "variable"),
        }
    }
}

impl ComponentKind {
    /// Convert from string representation (for persisted outlines)
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "module" => Some(ComponentKind::Module),
            "class" => Some(ComponentKind::Class),
            "function" => Some(ComponentKind::Function),
            "method" => Some(ComponentKind::Method),
            "property" => Some(ComponentKind::Property),
            "constant" => Some(ComponentKind::Constant),
            "variable" => Some(ComponentKind::Variable),
            _ => None,
        }
    }
}

/// Capabilities shared by every documented entity
pub trait Component {
    /// Content-derived identifier (see `generate_id`)
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn kind(&self) -> ComponentKind;
    /// Relative Unix-style path of the defining file
    fn file_path(&self) -> &str;
    /// 1-based line of the declaration keyword
    fn line_number(&self) -> u32;
    fn docstring(&self) -> Option<&str>;
    /// Verbatim source of the declaration span, when it could be recovered
    fn source_text(&self) -> Option<&str>;
}

/// A function or method parameter
///
/// Purely descriptive: defaults and annotations are rendered expression text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name; variadics carry a `*` / `**` prefix
    pub name: String,
    pub type_annotation: Option<String>,
    pub default_value: Option<String>,
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: None,
            default_value: None,
            description: None,
        }
    }
}

/// Module constant, class variable, or a method promoted to a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub id: String,
    pub name: String,
    /// `Constant` at module level, `Variable` for class variables, `Property` for
    /// methods decorated as properties
    pub kind: ComponentKind,
    pub file_path: String,
    pub line_number: u32,
    pub docstring: Option<String>,
    pub source_text: Option<String>,
    pub type_annotation: Option<String>,
    pub default_value: Option<String>,
    pub is_class_var: bool,
}

/// A standalone function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Function {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub line_number: u32,
    pub docstring: Option<String>,
    pub source_text: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub decorators: Vec<String>,
}

/// A function defined in a class body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Method {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub line_number: u32,
    pub docstring: Option<String>,
    pub source_text: Option<String>,
    /// Parameters without the implicit receiver
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub decorators: Vec<String>,
    pub is_static: bool,
    pub is_classmethod: bool,
    pub is_property: bool,
    pub parent_class: String,
}

/// A class definition with its public members
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Class {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub line_number: u32,
    pub docstring: Option<String>,
    pub source_text: Option<String>,
    pub base_classes: Vec<String>,
    pub methods: Vec<Method>,
    pub properties: Vec<Property>,
    pub class_variables: Vec<Property>,
    pub decorators: Vec<String>,
}

/// One parsed source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub id: String,
    /// File stem
    pub name: String,
    pub file_path: String,
    pub line_number: u32,
    pub docstring: Option<String>,
    pub source_text: Option<String>,
    pub classes: Vec<Class>,
    pub functions: Vec<Function>,
    pub constants: Vec<Property>,
    /// Flat dotted names of everything imported anywhere in the file
    pub imports: Vec<String>,
    /// Explicit export list (`__all__`), in declaration order
    pub export_list: Option<Vec<String>>,
    /// BLAKE3 hex digest of the source text
    pub content_hash: String,
}

impl Module {
    /// A module contributes to the outline only through classes, functions or constants.
    /// Imports and the members of classes do not count.
    pub fn has_public_api(&self) -> bool {
        !(self.classes.is_empty() && self.functions.is_empty() && self.constants.is_empty())
    }

    /// Resolve any component defined in this module by id
    pub fn find(&self, id: &str) -> Option<ComponentRef<'_>> {
        self.components().find(|component| component.id() == id)
    }

    /// Every component of the module, parent before children
    pub fn components(&self) -> impl Iterator<Item = ComponentRef<'_>> {
        std::iter::once(ComponentRef::Module(self))
            .chain(self.classes.iter().flat_map(|class| {
                std::iter::once(ComponentRef::Class(class))
                    .chain(class.methods.iter().map(ComponentRef::Method))
                    .chain(class.properties.iter().map(ComponentRef::Property))
                    .chain(class.class_variables.iter().map(ComponentRef::Property))
            }))
            .chain(self.functions.iter().map(ComponentRef::Function))
            .chain(self.constants.iter().map(ComponentRef::Property))
    }
}

/// Resolve a component id across a module list; `None` for dangling ids
pub fn find_component<'a>(modules: &'a [Module], id: &str) -> Option<ComponentRef<'a>> {
    modules.iter().find_map(|module| module.find(id))
}

/// Borrowed view over any component record
#[derive(Debug, Clone, Copy)]
pub enum ComponentRef<'a> {
    Module(&'a Module),
    Class(&'a Class),
    Function(&'a Function),
    Method(&'a Method),
    Property(&'a Property),
}

macro_rules! impl_component {
    ($ty:ty, $kind:expr) => {
        impl Component for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn kind(&self) -> ComponentKind {
                $kind
            }
            fn file_path(&self) -> &str {
                &self.file_path
            }
            fn line_number(&self) -> u32 {
                self.line_number
            }
            fn docstring(&self) -> Option<&str> {
                self.docstring.as_deref()
            }
            fn source_text(&self) -> Option<&str> {
                self.source_text.as_deref()
            }
        }
    };
}

impl_component!(Module, ComponentKind::Module);
impl_component!(Class, ComponentKind::Class);
impl_component!(Function, ComponentKind::Function);
impl_component!(Method, ComponentKind::Method);

impl Component for Property {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn kind(&self) -> ComponentKind {
        self.kind
    }
    fn file_path(&self) -> &str {
        &self.file_path
    }
    fn line_number(&self) -> u32 {
        self.line_number
    }
    fn docstring(&self) -> Option<&str> {
        self.docstring.as_deref()
    }
    fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }
}

impl<'a> ComponentRef<'a> {
    fn inner(&self) -> &'a dyn Component {
        match *self {
            ComponentRef::Module(module) => module,
            ComponentRef::Class(class) => class,
            ComponentRef::Function(function) => function,
            ComponentRef::Method(method) => method,
            ComponentRef::Property(property) => property,
        }
    }
}

impl Component for ComponentRef<'_> {
    fn id(&self) -> &str {
        self.inner().id()
    }
    fn name(&self) -> &str {
        self.inner().name()
    }
    fn kind(&self) -> ComponentKind {
        self.inner().kind()
    }
    fn file_path(&self) -> &str {
        self.inner().file_path()
    }
    fn line_number(&self) -> u32 {
        self.inner().line_number()
    }
    fn docstring(&self) -> Option<&str> {
        self.inner().docstring()
    }
    fn source_text(&self) -> Option<&str> {
        self.inner().source_text()
    }
}
