//! Function catalog tables for the gdexpr expression engine.
//!
//! Defines the declarative metadata the engine binds calls against: the
//! [`ParameterDescriptor`]s of every [`FunctionSignature`], grouped by
//! [`OwnerScope`] and [`ValueKind`].  A [`Catalog`] is deserialized from a
//! JSONC document and indexed lazily; the engine itself only sees it through
//! the read-only [`FunctionCatalog`] and [`SceneQuery`] traits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

mod scene;

pub use scene::{BehaviorInstance, Scene, SceneError, SceneObject};

/// Current format version for the catalog JSON schema.
pub const CATALOG_FORMAT_VERSION: &str = "0.1.0";

/// Kind of value an expression (and therefore a function) produces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Numeric expression.
    Number,
    /// Text (string) expression.
    Text,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Number => write!(f, "number"),
            ValueKind::Text => write!(f, "text"),
        }
    }
}

/// Which receiver a function is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OwnerScope {
    /// Free function, no receiver: `Random(10)`.
    #[serde(rename = "static")]
    Static,
    /// Function of a game object's type: `Player.X()`.
    #[serde(rename = "object")]
    ObjectBound,
    /// Function of a behavior attached to an object: `Player.Physics::Speed()`.
    #[serde(rename = "behavior")]
    BehaviorBound,
}

impl std::fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerScope::Static => write!(f, "static"),
            OwnerScope::ObjectBound => write!(f, "object"),
            OwnerScope::BehaviorBound => write!(f, "behavior"),
        }
    }
}

/// Declared kind of a function parameter.
///
/// Serialized as a plain tag (`"expression"`, `"layer"`, ...). Tags the engine
/// has no grammar for are kept verbatim in [`ParameterKind::Other`] and bound
/// without parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterKind {
    /// Numeric sub-expression.
    Expression,
    /// Camera index, parsed as a numeric sub-expression.
    Camera,
    /// Text sub-expression.
    StringValue,
    /// Layer name, parsed as a text sub-expression.
    Layer,
    /// Color (`"r;g;b"`), parsed as a text sub-expression.
    Color,
    /// File path, parsed as a text sub-expression.
    FilePath,
    /// Joystick axis name, parsed as a text sub-expression.
    JoystickAxis,
    /// Any other tag (object names, variables, operators...).
    Other(String),
}

impl ParameterKind {
    /// The serialized tag of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            ParameterKind::Expression => "expression",
            ParameterKind::Camera => "camera",
            ParameterKind::StringValue => "string",
            ParameterKind::Layer => "layer",
            ParameterKind::Color => "color",
            ParameterKind::FilePath => "file",
            ParameterKind::JoystickAxis => "joyaxis",
            ParameterKind::Other(tag) => tag,
        }
    }

    /// The grammar a bound argument of this kind is parsed with, or `None`
    /// when the argument is passed through verbatim.
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            ParameterKind::Expression | ParameterKind::Camera => Some(ValueKind::Number),
            ParameterKind::StringValue
            | ParameterKind::Layer
            | ParameterKind::Color
            | ParameterKind::FilePath
            | ParameterKind::JoystickAxis => Some(ValueKind::Text),
            ParameterKind::Other(_) => None,
        }
    }
}

impl From<String> for ParameterKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "expression" => ParameterKind::Expression,
            "camera" => ParameterKind::Camera,
            "string" => ParameterKind::StringValue,
            "layer" => ParameterKind::Layer,
            "color" => ParameterKind::Color,
            "file" => ParameterKind::FilePath,
            "joyaxis" => ParameterKind::JoystickAxis,
            _ => ParameterKind::Other(tag),
        }
    }
}

impl From<ParameterKind> for String {
    fn from(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one declared parameter of a function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    /// Declared kind; decides which grammar parses the bound value.
    pub kind: ParameterKind,
    /// May be omitted from the end of an argument list.
    #[serde(default)]
    pub optional: bool,
    /// Never written by authors; synthesized for the code generator.
    #[serde(default)]
    pub generator_only: bool,
    /// Substituted when an optional parameter is left blank.
    /// Empty means "use the kind's neutral value".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_value: String,
    /// Parameter name shown in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterDescriptor {
    /// A required, author-visible parameter of the given kind.
    pub fn required(kind: ParameterKind) -> Self {
        Self {
            kind,
            optional: false,
            generator_only: false,
            default_value: String::new(),
            name: None,
            description: None,
        }
    }

    /// An optional parameter with a declared default (may be empty).
    pub fn optional(kind: ParameterKind, default_value: impl Into<String>) -> Self {
        Self {
            optional: true,
            default_value: default_value.into(),
            ..Self::required(kind)
        }
    }

    /// A generator-only parameter of the given kind.
    pub fn generator_only(kind: ParameterKind) -> Self {
        Self {
            generator_only: true,
            ..Self::required(kind)
        }
    }

    /// Whether an author writes this parameter (it counts toward arity).
    pub fn is_author_visible(&self) -> bool {
        !self.generator_only
    }
}

/// Declarative signature of one catalog function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSignature {
    /// Function name as written in expressions (without owner or behavior prefix).
    pub name: String,
    /// Receiver scope.
    pub scope: OwnerScope,
    /// Object type (object-bound) or behavior type (behavior-bound).
    /// Empty string for object functions shared by every object type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_type: Option<String>,
    /// Kind of value the function returns.
    pub returns: ValueKind,
    /// Declared parameters, in order. The owner object and behavior are not
    /// listed; they travel separately on the resolved call.
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionSignature {
    /// Smallest number of arguments an author may write.
    pub fn min_arguments(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.is_author_visible() && !p.optional)
            .count()
    }

    /// Largest number of arguments an author may write.
    pub fn max_arguments(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.is_author_visible())
            .count()
    }

    /// Short human-readable form, e.g. `Physics::Speed(expression, [layer])`.
    pub fn display_signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .filter(|p| p.is_author_visible())
            .map(|p| {
                let label = p.name.as_deref().unwrap_or(p.kind.as_str());
                if p.optional {
                    format!("[{label}]")
                } else {
                    label.to_string()
                }
            })
            .collect();
        let prefix = match (self.scope, self.owner_type.as_deref()) {
            (OwnerScope::BehaviorBound, Some(ty)) => format!("{ty}::"),
            _ => String::new(),
        };
        format!("{prefix}{}({})", self.name, params.join(", "))
    }
}

// ─── Lookup traits ──────────────────────────────────────────────────────────

/// Read-only access to function signatures, keyed by scope.
///
/// Every lookup is filtered by the kind of value the caller's grammar
/// produces: the numeric grammar never resolves a text function and vice
/// versa.
pub trait FunctionCatalog {
    /// Signature of a static function.
    fn static_function(&self, returns: ValueKind, name: &str) -> Option<&FunctionSignature>;

    /// Signature of a function of objects of type `object_type`.
    fn object_function(
        &self,
        returns: ValueKind,
        object_type: &str,
        name: &str,
    ) -> Option<&FunctionSignature>;

    /// Signature of a function of behaviors of type `behavior_type`.
    fn behavior_function(
        &self,
        returns: ValueKind,
        behavior_type: &str,
        name: &str,
    ) -> Option<&FunctionSignature>;

    /// Whether a static function exists.
    fn has_static(&self, returns: ValueKind, name: &str) -> bool {
        self.static_function(returns, name).is_some()
    }

    /// Whether an object-bound function exists.
    fn has_object_bound(&self, returns: ValueKind, object_type: &str, name: &str) -> bool {
        self.object_function(returns, object_type, name).is_some()
    }

    /// Whether a behavior-bound function exists.
    fn has_behavior_bound(&self, returns: ValueKind, behavior_type: &str, name: &str) -> bool {
        self.behavior_function(returns, behavior_type, name).is_some()
    }
}

/// Read-only view of the objects visible to an expression.
pub trait SceneQuery {
    /// Declared type of the named object.
    fn type_of_object(&self, object: &str) -> Option<&str>;

    /// Declared type of the behavior named `behavior`, preferably as attached
    /// to `object`.
    fn type_of_behavior(&self, object: &str, behavior: &str) -> Option<&str>;

    /// Names of the behaviors attached to the named object.
    fn behaviors_attached_to(&self, object: &str) -> Vec<&str>;

    /// Whether `behavior` is attached to `object`.
    fn has_behavior(&self, object: &str, behavior: &str) -> bool {
        self.behaviors_attached_to(object).contains(&behavior)
    }
}

// ─── Catalog ────────────────────────────────────────────────────────────────

/// Errors raised while loading or validating a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document is not valid JSON (after JSONC stripping).
    #[error("invalid catalog JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// An entry violates a structural rule.
    #[error("invalid catalog entry {index} ({name}): {reason}")]
    InvalidEntry {
        /// Position of the entry in `functions`.
        index: usize,
        /// Function name of the entry.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Two entries share scope, owner type, return kind, and name.
    #[error("duplicate catalog entry: {scope} function {name} returning {returns} for owner '{owner}'")]
    DuplicateEntry {
        /// Scope of both entries.
        scope: OwnerScope,
        /// Owner type (empty for static functions).
        owner: String,
        /// Function name.
        name: String,
        /// Return kind.
        returns: ValueKind,
    },
}

/// `(returns, scope)` → owner type → name → index into `functions`.
type ScopeIndex = HashMap<(ValueKind, OwnerScope), HashMap<String, HashMap<String, usize>>>;

/// Concrete function catalog loaded from a JSONC document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Catalog format version for compatibility checks.
    #[serde(default = "default_format_version")]
    pub format_version: String,
    /// All function signatures.
    #[serde(default)]
    functions: Vec<FunctionSignature>,

    /// Lookup index (lazily initialized).
    #[serde(skip)]
    index: OnceLock<ScopeIndex>,
}

fn default_format_version() -> String {
    CATALOG_FORMAT_VERSION.to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            format_version: default_format_version(),
            functions: Vec::new(),
            index: OnceLock::new(),
        }
    }
}

impl Catalog {
    /// Build a catalog from signatures, validating every entry.
    pub fn new(functions: Vec<FunctionSignature>) -> Result<Self, CatalogError> {
        let catalog = Self {
            functions,
            ..Self::default()
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSONC text.
    pub fn from_jsonc(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(&gdexpr_jsonc::strip_jsonc(text))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// All signatures, in document order.
    pub fn functions(&self) -> &[FunctionSignature] {
        &self.functions
    }

    /// Number of signatures.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the catalog has no signatures.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Check the structural rules every entry must follow.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen: HashMap<(ValueKind, OwnerScope, &str, &str), usize> = HashMap::new();
        for (index, f) in self.functions.iter().enumerate() {
            let invalid = |reason: &str| CatalogError::InvalidEntry {
                index,
                name: f.name.clone(),
                reason: reason.to_string(),
            };
            if f.name.trim().is_empty() {
                return Err(invalid("function name must not be empty"));
            }
            if f.name.contains('(') || f.name.contains('.') || f.name.contains("::") {
                return Err(invalid("function name must not contain '(', '.', or '::'"));
            }
            match (f.scope, f.owner_type.as_deref()) {
                (OwnerScope::Static, Some(_)) => {
                    return Err(invalid("static functions must not declare an ownerType"));
                }
                (OwnerScope::ObjectBound | OwnerScope::BehaviorBound, None) => {
                    return Err(invalid("object and behavior functions need an ownerType"));
                }
                (OwnerScope::BehaviorBound, Some("")) => {
                    return Err(invalid("behavior functions need a non-empty ownerType"));
                }
                _ => {}
            }
            let owner = f.owner_type.as_deref().unwrap_or("");
            if seen
                .insert((f.returns, f.scope, owner, f.name.as_str()), index)
                .is_some()
            {
                return Err(CatalogError::DuplicateEntry {
                    scope: f.scope,
                    owner: owner.to_string(),
                    name: f.name.clone(),
                    returns: f.returns,
                });
            }
        }
        Ok(())
    }

    /// Returns the cached index, building it lazily on first access.
    fn index(&self) -> &ScopeIndex {
        self.index.get_or_init(|| {
            let mut index = ScopeIndex::new();
            for (i, f) in self.functions.iter().enumerate() {
                index
                    .entry((f.returns, f.scope))
                    .or_default()
                    .entry(f.owner_type.clone().unwrap_or_default())
                    .or_default()
                    .insert(f.name.clone(), i);
            }
            index
        })
    }

    fn lookup(
        &self,
        returns: ValueKind,
        scope: OwnerScope,
        owner: &str,
        name: &str,
    ) -> Option<&FunctionSignature> {
        self.index()
            .get(&(returns, scope))
            .and_then(|owners| owners.get(owner))
            .and_then(|names| names.get(name))
            .map(|&i| &self.functions[i])
    }
}

impl FunctionCatalog for Catalog {
    fn static_function(&self, returns: ValueKind, name: &str) -> Option<&FunctionSignature> {
        self.lookup(returns, OwnerScope::Static, "", name)
    }

    /// Falls back to the base object type `""`, whose functions every object
    /// type shares.
    fn object_function(
        &self,
        returns: ValueKind,
        object_type: &str,
        name: &str,
    ) -> Option<&FunctionSignature> {
        self.lookup(returns, OwnerScope::ObjectBound, object_type, name)
            .or_else(|| self.lookup(returns, OwnerScope::ObjectBound, "", name))
    }

    fn behavior_function(
        &self,
        returns: ValueKind,
        behavior_type: &str,
        name: &str,
    ) -> Option<&FunctionSignature> {
        self.lookup(returns, OwnerScope::BehaviorBound, behavior_type, name)
    }
}
