// Typed output IR. The walker lowers input nodes into this; the post-processor
// edits it in place; `emit` renders it. No serde_json rendering logic here.

use serde_json::{Map, Value};

use crate::model::{KeyRule, Presence};

#[derive(Debug, Clone, Default)]
pub enum Ty {
    #[default]
    Any,                     // unconstrained
    Never,                   // rejects everything, including presence
    Ref(String),             // pointer into the definitions table
    String(StringTy),
    Number(NumberTy),
    Boolean(BooleanTy),
    Array(ArrayTy),
    Object(ObjectTy),
    AnyOf(Vec<Schema>),
    OneOf(Vec<Schema>),
    AllOf(Vec<Schema>),
}

/// One output node plus the annotations that ride along with any kind.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub ty: Ty,
    pub nullable: bool,
    pub enum_: Vec<Value>,   // closed value set; empty = none
    pub also: Vec<Value>,    // literals accepted beyond `ty`
    pub invalid: Vec<Value>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub examples: Vec<Value>,
    pub meta: Vec<Map<String, Value>>,    // folded by the post-processor
    pub keywords: Map<String, Value>,     // extra keywords, emitted last
    pub when: Option<WhenTag>,            // set on conditional branches
    pub strip: bool,
}

/// Which conditional outcome a branch stands for.
#[derive(Debug, Clone)]
pub struct WhenTag {
    pub subject: WhenSubject,
    pub test: Option<Box<Schema>>,   // `is` test for sibling-key subjects
    pub otherwise: bool,
}

#[derive(Debug, Clone)]
pub enum WhenSubject {
    Key(String),
    Schema(Box<Schema>),
}

#[derive(Debug, Clone, Default)]
pub struct StringTy {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub patterns: Vec<PatternTy>,
    pub format: Option<String>,
    pub format_any_of: Vec<String>,
    pub content_encoding: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PatternTy {
    pub regex: String,
    pub title: Option<String>,
    pub invert: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NumberTy {
    pub integer: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct BooleanTy {
    pub literals: Vec<String>,   // truthy then falsy
    pub insensitive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArrayTy {
    pub items: Vec<Schema>,
    pub ordered: Vec<Schema>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectTy {
    pub fields: Vec<Field>,  // declaration order
    pub pattern_fields: Vec<(String, Schema)>,
    pub additional: bool,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub rules: Vec<KeyRule>,
    pub conditional_presence: Vec<ConditionalPresence>,
}

/// Presence a conditional child takes on depending on which test on its
/// sibling key selects the outcome.
#[derive(Debug, Clone)]
pub struct ConditionalPresence {
    pub key: String,
    pub subject: String,
    pub steps: Vec<PresenceStep>,
}

#[derive(Debug, Clone)]
pub struct PresenceStep {
    pub test: Option<Schema>,   // None: no declared test matched
    pub presence: Presence,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

impl Schema {
    pub fn new(ty: Ty) -> Self {
        Self { ty, ..Self::default() }
    }

    pub fn any() -> Self {
        Self::new(Ty::Any)
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(Ty::Ref(name.into()))
    }

    /// True for a bare `{}`: no type, no values, no keywords.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self.ty, Ty::Any)
            && !self.nullable
            && self.enum_.is_empty()
            && self.also.is_empty()
            && self.invalid.is_empty()
            && self.keywords.is_empty()
            && self.when.is_none()
    }
}

impl ObjectTy {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Anchored alternation matching each literal regardless of ASCII case,
/// e.g. `["yes", "no"]` → `^(?:[yY][eE][sS]|[nN][oO])$`.
pub fn folded_alternation(literals: &[String]) -> String {
    let arms: Vec<String> = literals
        .iter()
        .map(|lit| {
            lit.chars()
                .map(|c| {
                    let (lo, up) = (c.to_ascii_lowercase(), c.to_ascii_uppercase());
                    if lo != up {
                        format!("[{lo}{up}]")
                    } else {
                        regex::escape(&c.to_string())
                    }
                })
                .collect()
        })
        .collect();
    format!("^(?:{})$", arms.join("|"))
}
