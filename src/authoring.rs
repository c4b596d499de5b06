//! JSON authoring surface.
//!
//! A schema tree written as nested JSON objects, one per node:
//!
//! ```json
//! { "type": "object", "id": "person",
//!   "keys": { "name": { "type": "string", "presence": "required", "min": 3 } },
//!   "rules": [{ "or": ["guid", "uuid"] }] }
//! ```
//!
//! Fields are a flat bag; those that do not apply to the node's `type` are
//! ignored. Loading produces a [`SchemaTree`] plus the root id.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{
    Alternatives, ArrayRules, BinaryRules, BooleanRules, Case, Conditional, ConditionalForm, DateFormat,
    DateRules, IpVersion, Kind, KeyRule, LinkRef, MatchMode, NodeId, NumberRules, ObjectRules,
    PatternRule, Presence, SchemaNode, SchemaTree, Sign, StringFormat, StringRules, Subject,
    SwitchCase, TimestampUnit, ValueOp, ValueOpKind, WhenClause,
};
use crate::path_de;

// ————————————————————————————————————————————————————————————————————————————
// WIRE TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Option<String>,
    pub presence: Option<PresenceSpec>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub examples: Vec<Value>,
    /// Explicit mutation log; the `valid`/`allow`/`invalid` shorthands
    /// append after it.
    pub values: Vec<ValueOpSpec>,
    pub valid: Vec<Value>,
    pub allow: Vec<Value>,
    pub invalid: Vec<Value>,
    pub meta: Vec<Map<String, Value>>,
    pub strip: bool,
    pub shared: Vec<NodeSpec>,

    // ---- string / binary ----
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub length: Option<f64>,
    pub patterns: Vec<PatternSpec>,
    pub formats: Vec<FormatSpec>,
    pub case: Option<CaseSpec>,
    pub insensitive: bool,
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
    pub sensitive: bool,
    pub encoding: Option<String>,

    // ---- number ----
    pub integer: bool,
    pub precision: Option<u32>,
    pub sign: Option<SignSpec>,
    pub greater: Option<f64>,
    pub less: Option<f64>,
    pub multiple: Option<f64>,

    // ---- date ----
    pub timestamp: Option<TimestampSpec>,

    // ---- array ----
    pub items: Vec<NodeSpec>,
    pub ordered: Vec<NodeSpec>,
    pub unique: bool,

    // ---- object ----
    pub keys: IndexMap<String, NodeSpec>,
    pub pattern_keys: Vec<PatternKeySpec>,
    pub unknown: bool,
    pub rules: Vec<RuleSpec>,

    // ---- alternatives ----
    #[serde(rename = "try")]
    pub candidates: Vec<NodeSpec>,
    pub mode: Option<ModeSpec>,
    pub when: Option<Box<WhenSpec>>,

    // ---- link ----
    #[serde(rename = "ref")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceSpec {
    Optional,
    Required,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValueOpSpec {
    pub op: ValueOpName,
    #[serde(default, rename = "override")]
    pub reset: bool,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueOpName {
    Valid,
    Allow,
    Invalid,
    Example,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternSpec {
    pub regex: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatSpec {
    Email,
    Uri,
    #[serde(alias = "uuid")]
    Guid,
    Hostname,
    IsoDate,
    IsoDuration,
    /// `{"ip": []}` accepts any version.
    Ip(Vec<IpSpec>),
    Alphanum,
    Token,
    Hex,
    Base64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpSpec {
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSpec {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignSpec {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSpec {
    Javascript,
    Unix,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternKeySpec {
    pub regex: String,
    pub schema: NodeSpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSpec {
    And(Vec<String>),
    Or(Vec<String>),
    Xor(Vec<String>),
    Nand(Vec<String>),
    Oxor(Vec<String>),
    With { key: String, peers: Vec<String> },
    Without { key: String, peers: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSpec {
    Any,
    One,
    All,
}

/// Subject plus one of the three conditional shapes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WhenSpec {
    #[serde(rename = "ref")]
    pub key: Option<String>,
    pub schema: Option<NodeSpec>,
    pub is: Option<IsSpec>,
    pub then: Option<NodeSpec>,
    pub otherwise: Option<NodeSpec>,
    pub chain: Option<Vec<ClauseSpec>>,
    pub switch: Option<Vec<SwitchCaseSpec>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClauseSpec {
    pub is: Option<IsSpec>,
    pub then: Option<NodeSpec>,
    pub otherwise: Option<NodeSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchCaseSpec {
    pub is: Option<IsSpec>,
    pub then: Option<NodeSpec>,
}

/// A node, or a bare literal standing for "exactly this value".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IsSpec {
    Node(Box<NodeSpec>),
    Literal(Value),
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

/// An authored tree ready for translation.
#[derive(Debug, Clone)]
pub struct Authored {
    pub tree: SchemaTree,
    pub root: NodeId,
}

pub fn from_str(src: &str) -> Result<Authored> {
    let spec: NodeSpec = path_de::from_str_with_path(src)?;
    load(spec)
}

pub fn from_slice(bytes: &[u8]) -> Result<Authored> {
    let spec: NodeSpec = path_de::from_slice_with_path(bytes)?;
    load(spec)
}

pub fn load(spec: NodeSpec) -> Result<Authored> {
    let mut loader = Loader { tree: SchemaTree::new(), ids: IndexMap::new() };
    let root = loader.node(spec, "$")?;
    Ok(Authored { tree: loader.tree, root })
}

struct Loader {
    tree: SchemaTree,
    /// Nodes already built per id, so a shared declaration repeated in
    /// several places maps onto one arena node.
    ids: IndexMap<String, (NodeId, NodeSpec)>,
}

impl Loader {
    fn node(&mut self, spec: NodeSpec, path: &str) -> Result<NodeId> {
        if let Some((existing, seen)) = spec.id.as_ref().and_then(|id| self.ids.get(id)) {
            if *seen == spec {
                return Ok(*existing);
            }
        }
        let snapshot = spec.id.as_ref().map(|_| spec.clone());

        let mut shared = Vec::with_capacity(spec.shared.len());
        for (i, s) in spec.shared.into_iter().enumerate() {
            shared.push(self.node(s, &format!("{path}.shared[{i}]"))?);
        }

        let kind = match spec.kind.as_str() {
            "any" => Kind::Any,
            "forbidden" => Kind::Forbidden,
            "string" => Kind::String(StringRules {
                min_length: count(spec.length.or(spec.min), "min", path)?,
                max_length: count(spec.length.or(spec.max), "max", path)?,
                patterns: spec
                    .patterns
                    .into_iter()
                    .map(|p| PatternRule { regex: p.regex, name: p.name, invert: p.invert })
                    .collect(),
                formats: spec.formats.into_iter().map(string_format).collect(),
                case: spec.case.map(|c| match c {
                    CaseSpec::Lower => Case::Lower,
                    CaseSpec::Upper => Case::Upper,
                }),
                insensitive: spec.insensitive,
                truthy: spec.truthy,
                falsy: spec.falsy,
            }),
            "number" => Kind::Number(NumberRules {
                integer: spec.integer,
                precision: spec.precision,
                sign: spec.sign.map(|s| match s {
                    SignSpec::Positive => Sign::Positive,
                    SignSpec::Negative => Sign::Negative,
                }),
                min: spec.min.map(OrderedFloat),
                max: spec.max.map(OrderedFloat),
                greater: spec.greater.map(OrderedFloat),
                less: spec.less.map(OrderedFloat),
                multiple: spec.multiple.map(OrderedFloat),
            }),
            "boolean" => Kind::Boolean(BooleanRules {
                truthy: spec.truthy,
                falsy: spec.falsy,
                sensitive: spec.sensitive,
            }),
            "binary" => Kind::Binary(BinaryRules {
                encoding: spec.encoding,
                min_length: count(spec.length.or(spec.min), "min", path)?,
                max_length: count(spec.length.or(spec.max), "max", path)?,
            }),
            "date" => Kind::Date(DateRules {
                format: match spec.timestamp {
                    None => DateFormat::Iso,
                    Some(TimestampSpec::Javascript) => DateFormat::Timestamp(TimestampUnit::Javascript),
                    Some(TimestampSpec::Unix) => DateFormat::Timestamp(TimestampUnit::Unix),
                },
            }),
            "array" => {
                let mut items = Vec::with_capacity(spec.items.len());
                for (i, s) in spec.items.into_iter().enumerate() {
                    items.push(self.node(s, &format!("{path}.items[{i}]"))?);
                }
                let mut ordered = Vec::with_capacity(spec.ordered.len());
                for (i, s) in spec.ordered.into_iter().enumerate() {
                    ordered.push(self.node(s, &format!("{path}.ordered[{i}]"))?);
                }
                Kind::Array(ArrayRules {
                    items,
                    ordered,
                    min_items: count(spec.length.or(spec.min), "min", path)?,
                    max_items: count(spec.length.or(spec.max), "max", path)?,
                    unique: spec.unique,
                })
            }
            "object" => {
                let mut children = IndexMap::with_capacity(spec.keys.len());
                for (key, s) in spec.keys {
                    let child = self.node(s, &format!("{path}.keys.{key}"))?;
                    children.insert(key, child);
                }
                let mut pattern_children = Vec::with_capacity(spec.pattern_keys.len());
                for (i, p) in spec.pattern_keys.into_iter().enumerate() {
                    let child = self.node(p.schema, &format!("{path}.patternKeys[{i}]"))?;
                    pattern_children.push((p.regex, child));
                }
                Kind::Object(ObjectRules {
                    children,
                    pattern_children,
                    allow_unknown: spec.unknown,
                    min_keys: count(spec.length.or(spec.min), "min", path)?,
                    max_keys: count(spec.length.or(spec.max), "max", path)?,
                    rules: spec.rules.into_iter().map(key_rule).collect(),
                })
            }
            "alternatives" => match spec.when {
                Some(when) => self.conditional(*when, &format!("{path}.when"))?,
                None => {
                    let mut candidates = Vec::with_capacity(spec.candidates.len());
                    for (i, s) in spec.candidates.into_iter().enumerate() {
                        candidates.push(self.node(s, &format!("{path}.try[{i}]"))?);
                    }
                    let mode = match spec.mode {
                        None | Some(ModeSpec::Any) => MatchMode::Any,
                        Some(ModeSpec::One) => MatchMode::One,
                        Some(ModeSpec::All) => MatchMode::All,
                    };
                    Kind::Alternatives(Alternatives::Try { candidates, mode })
                }
            },
            "link" => match spec.target {
                Some(target) => Kind::Link(LinkRef(target)),
                None => {
                    return Err(Error::Authoring {
                        path: path.to_string(),
                        reason: "link node is missing `ref`".into(),
                    });
                }
            },
            other => {
                return Err(Error::UnsupportedNodeKind {
                    kind: other.to_string(),
                    path: path.to_string(),
                });
            }
        };

        let mut values: Vec<ValueOp> = spec
            .values
            .into_iter()
            .map(|v| ValueOp { kind: op_kind(v.op), reset: v.reset, values: v.values })
            .collect();
        for (kind, vs) in [
            (ValueOpKind::Valid, spec.valid),
            (ValueOpKind::Allow, spec.allow),
            (ValueOpKind::Invalid, spec.invalid),
            (ValueOpKind::Example, spec.examples),
        ] {
            if !vs.is_empty() {
                values.push(ValueOp { kind, reset: false, values: vs });
            }
        }

        let node = SchemaNode {
            id: spec.id.clone(),
            presence: match spec.presence {
                None | Some(PresenceSpec::Optional) => Presence::Optional,
                Some(PresenceSpec::Required) => Presence::Required,
                Some(PresenceSpec::Forbidden) => Presence::Forbidden,
            },
            label: spec.label,
            description: spec.description,
            default: spec.default,
            values,
            meta: spec.meta,
            strip: spec.strip,
            shared,
            kind,
        };
        let id = self.tree.insert(node);
        if let (Some(name), Some(snapshot)) = (spec.id, snapshot) {
            if self.ids.contains_key(&name) {
                // left for the registry to reject
                warn!(id = %name, path, "id declared twice with different bodies");
            } else {
                self.ids.insert(name, (id, snapshot));
            }
        }
        Ok(id)
    }

    fn conditional(&mut self, when: WhenSpec, path: &str) -> Result<Kind> {
        let subject = match (when.key, when.schema) {
            (Some(key), None) => Subject::Key(key),
            (None, Some(schema)) => Subject::Schema(self.node(schema, &format!("{path}.schema"))?),
            (Some(_), Some(_)) => {
                return Err(Error::malformed("condition names both `ref` and `schema`"));
            }
            (None, None) => return Err(Error::malformed("condition has no subject")),
        };
        let single = when.is.is_some() || when.then.is_some() || when.otherwise.is_some();
        let form = match (when.chain, when.switch) {
            (Some(_), Some(_)) => {
                return Err(Error::malformed("condition declares both `chain` and `switch`"));
            }
            (Some(chain), None) => {
                if single {
                    return Err(Error::malformed(
                        "`chain` cannot be mixed with `is`/`then`/`otherwise`",
                    ));
                }
                let mut clauses = Vec::with_capacity(chain.len());
                for (i, c) in chain.into_iter().enumerate() {
                    clauses.push(self.clause(c, &format!("{path}.chain[{i}]"))?);
                }
                ConditionalForm::Chain(clauses)
            }
            (None, Some(cases)) => {
                if when.is.is_some() || when.then.is_some() {
                    return Err(Error::malformed("`switch` cannot be mixed with `is`/`then`"));
                }
                let mut out = Vec::with_capacity(cases.len());
                for (i, c) in cases.into_iter().enumerate() {
                    let at = format!("{path}.switch[{i}]");
                    out.push(SwitchCase {
                        is: self.is(c.is, &at)?,
                        then: self.optional(c.then, &format!("{at}.then"))?,
                    });
                }
                let otherwise = self.optional(when.otherwise, &format!("{path}.otherwise"))?;
                ConditionalForm::Switch { cases: out, otherwise }
            }
            (None, None) => ConditionalForm::Single(self.clause(
                ClauseSpec { is: when.is, then: when.then, otherwise: when.otherwise },
                path,
            )?),
        };
        Ok(Kind::Alternatives(Alternatives::Conditional(Conditional { subject, form })))
    }

    fn clause(&mut self, c: ClauseSpec, path: &str) -> Result<WhenClause> {
        Ok(WhenClause {
            is: self.is(c.is, path)?,
            then: self.optional(c.then, &format!("{path}.then"))?,
            otherwise: self.optional(c.otherwise, &format!("{path}.otherwise"))?,
        })
    }

    fn is(&mut self, is: Option<IsSpec>, path: &str) -> Result<Option<NodeId>> {
        match is {
            None => Ok(None),
            Some(IsSpec::Node(spec)) => self.node(*spec, &format!("{path}.is")).map(Some),
            Some(IsSpec::Literal(v)) => {
                Ok(Some(self.tree.insert(SchemaNode::any().valid([v]).required())))
            }
        }
    }

    fn optional(&mut self, spec: Option<NodeSpec>, path: &str) -> Result<Option<NodeId>> {
        spec.map(|s| self.node(s, path)).transpose()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn count(v: Option<f64>, field: &str, path: &str) -> Result<Option<u64>> {
    match v {
        None => Ok(None),
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(Some(n as u64)),
        Some(n) => Err(Error::Authoring {
            path: format!("{path}.{field}"),
            reason: format!("expected a non-negative integer count, got {n}"),
        }),
    }
}

fn string_format(f: FormatSpec) -> StringFormat {
    match f {
        FormatSpec::Email => StringFormat::Email,
        FormatSpec::Uri => StringFormat::Uri,
        FormatSpec::Guid => StringFormat::Guid,
        FormatSpec::Hostname => StringFormat::Hostname,
        FormatSpec::IsoDate => StringFormat::IsoDate,
        FormatSpec::IsoDuration => StringFormat::IsoDuration,
        FormatSpec::Ip(vs) => StringFormat::Ip(
            vs.into_iter()
                .map(|v| match v {
                    IpSpec::Ipv4 => IpVersion::V4,
                    IpSpec::Ipv6 => IpVersion::V6,
                })
                .collect(),
        ),
        FormatSpec::Alphanum => StringFormat::Alphanum,
        FormatSpec::Token => StringFormat::Token,
        FormatSpec::Hex => StringFormat::Hex,
        FormatSpec::Base64 => StringFormat::Base64,
    }
}

fn key_rule(r: RuleSpec) -> KeyRule {
    match r {
        RuleSpec::And(ks) => KeyRule::And(ks),
        RuleSpec::Or(ks) => KeyRule::Or(ks),
        RuleSpec::Xor(ks) => KeyRule::Xor(ks),
        RuleSpec::Nand(ks) => KeyRule::Nand(ks),
        RuleSpec::Oxor(ks) => KeyRule::Oxor(ks),
        RuleSpec::With { key, peers } => KeyRule::With { key, peers },
        RuleSpec::Without { key, peers } => KeyRule::Without { key, peers },
    }
}

fn op_kind(op: ValueOpName) -> ValueOpKind {
    match op {
        ValueOpName::Valid => ValueOpKind::Valid,
        ValueOpName::Allow => ValueOpKind::Allow,
        ValueOpName::Invalid => ValueOpKind::Invalid,
        ValueOpName::Example => ValueOpKind::Example,
    }
}

// ------------------------------- Tests ------------------------------------ //
