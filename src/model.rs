//! Input node model.
//!
//! A validation schema is an arena of [`SchemaNode`]s addressed by [`NodeId`].
//! Edges (object children, array items, branches, shared declarations) are
//! plain ids, so a node may be reached along several paths, including from
//! itself. Nodes carry no logic: value mutations and metadata are recorded
//! as ordered logs and only interpreted by the translator.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::{Map, Value};

// ————————————————————————————————————————————————————————————————————————————
// ARENA
// ————————————————————————————————————————————————————————————————————————————

/// Stable identity of a node inside one [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    nodes: Vec<SchemaNode>,
}

impl SchemaTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: SchemaNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Panics on an id from another tree, like slice indexing.
    pub fn get(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every outgoing edge of `id`, in declaration order.
    pub fn edges(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.get(id);
        let mut out: Vec<NodeId> = node.shared.clone();
        match &node.kind {
            Kind::Array(a) => {
                out.extend(a.items.iter().copied());
                out.extend(a.ordered.iter().copied());
            }
            Kind::Object(o) => {
                out.extend(o.children.values().copied());
                out.extend(o.pattern_children.iter().map(|(_, c)| *c));
            }
            Kind::Alternatives(Alternatives::Try { candidates, .. }) => {
                out.extend(candidates.iter().copied());
            }
            Kind::Alternatives(Alternatives::Conditional(c)) => {
                if let Subject::Schema(s) = &c.subject {
                    out.push(*s);
                }
                match &c.form {
                    ConditionalForm::Single(w) => out.extend(w.targets()),
                    ConditionalForm::Chain(ws) => {
                        for w in ws {
                            out.extend(w.targets());
                        }
                    }
                    ConditionalForm::Switch { cases, otherwise } => {
                        for case in cases {
                            out.extend(case.is);
                            out.extend(case.then);
                        }
                        out.extend(*otherwise);
                    }
                }
            }
            Kind::Any
            | Kind::Forbidden
            | Kind::String(_)
            | Kind::Number(_)
            | Kind::Boolean(_)
            | Kind::Binary(_)
            | Kind::Date(_)
            | Kind::Link(_) => {}
        }
        out
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Presence {
    #[default]
    Optional,
    Required,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOpKind {
    /// Restrict the node to the enumerated values.
    Valid,
    /// Accept the values in addition to whatever the kind accepts.
    Allow,
    /// Reject the values.
    Invalid,
    /// Document the values as examples only.
    Example,
}

/// One "allow these values" style call. `reset` is the override marker:
/// it discards what was accumulated before applying `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueOp {
    pub kind: ValueOpKind,
    pub reset: bool,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    pub id: Option<String>,
    pub presence: Presence,
    pub label: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    /// Ordered value mutations, including examples.
    pub values: Vec<ValueOp>,
    /// Ordered `meta` calls; later keys win.
    pub meta: Vec<Map<String, Value>>,
    pub strip: bool,
    /// Nodes declared reusable from here on; each must carry an `id`.
    pub shared: Vec<NodeId>,
    pub kind: Kind,
}

#[derive(Debug, Clone, Default)]
pub enum Kind {
    #[default]
    Any,
    Forbidden,
    String(StringRules),
    Number(NumberRules),
    Boolean(BooleanRules),
    Binary(BinaryRules),
    Date(DateRules),
    Array(ArrayRules),
    Object(ObjectRules),
    Alternatives(Alternatives),
    Link(LinkRef),
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Any => "any",
            Kind::Forbidden => "forbidden",
            Kind::String(_) => "string",
            Kind::Number(_) => "number",
            Kind::Boolean(_) => "boolean",
            Kind::Binary(_) => "binary",
            Kind::Date(_) => "date",
            Kind::Array(_) => "array",
            Kind::Object(_) => "object",
            Kind::Alternatives(_) => "alternatives",
            Kind::Link(_) => "link",
        }
    }
}

// ---- string ----

#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub patterns: Vec<PatternRule>,
    pub formats: Vec<StringFormat>,
    pub case: Option<Case>,
    pub insensitive: bool,
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub regex: String,
    pub name: Option<String>,
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    Uri,
    Guid,
    Hostname,
    IsoDate,
    IsoDuration,
    Ip(Vec<IpVersion>),
    Alphanum,
    Token,
    Hex,
    Base64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Lower,
    Upper,
}

// ---- number ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub integer: bool,
    pub precision: Option<u32>,
    pub sign: Option<Sign>,
    pub min: Option<OrderedFloat<f64>>,
    pub max: Option<OrderedFloat<f64>>,
    pub greater: Option<OrderedFloat<f64>>,
    pub less: Option<OrderedFloat<f64>>,
    pub multiple: Option<OrderedFloat<f64>>,
}

// ---- boolean / binary / date ----

#[derive(Debug, Clone, Default)]
pub struct BooleanRules {
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
    /// Literal matching is case-insensitive unless set.
    pub sensitive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BinaryRules {
    pub encoding: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    Javascript,
    Unix,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateFormat {
    #[default]
    Iso,
    Timestamp(TimestampUnit),
}

#[derive(Debug, Clone, Default)]
pub struct DateRules {
    pub format: DateFormat,
}

// ---- array ----

#[derive(Debug, Clone, Default)]
pub struct ArrayRules {
    /// Candidate item schemas, matched by alternation.
    pub items: Vec<NodeId>,
    /// Positional item schemas (tuple form).
    pub ordered: Vec<NodeId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique: bool,
}

// ---- object ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRule {
    And(Vec<String>),
    Or(Vec<String>),
    Xor(Vec<String>),
    Nand(Vec<String>),
    Oxor(Vec<String>),
    With { key: String, peers: Vec<String> },
    Without { key: String, peers: Vec<String> },
}

impl KeyRule {
    pub fn name(&self) -> &'static str {
        match self {
            KeyRule::And(_) => "and",
            KeyRule::Or(_) => "or",
            KeyRule::Xor(_) => "xor",
            KeyRule::Nand(_) => "nand",
            KeyRule::Oxor(_) => "oxor",
            KeyRule::With { .. } => "with",
            KeyRule::Without { .. } => "without",
        }
    }

    /// Every key the rule mentions, subject first for `with`/`without`.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            KeyRule::And(ks)
            | KeyRule::Or(ks)
            | KeyRule::Xor(ks)
            | KeyRule::Nand(ks)
            | KeyRule::Oxor(ks) => ks.iter().map(String::as_str).collect(),
            KeyRule::With { key, peers } | KeyRule::Without { key, peers } => {
                std::iter::once(key.as_str())
                    .chain(peers.iter().map(String::as_str))
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectRules {
    pub children: IndexMap<String, NodeId>,
    pub pattern_children: Vec<(String, NodeId)>,
    pub allow_unknown: bool,
    pub min_keys: Option<u64>,
    pub max_keys: Option<u64>,
    pub rules: Vec<KeyRule>,
}

// ---- alternatives ----

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    #[default]
    Any,
    One,
    All,
}

#[derive(Debug, Clone)]
pub enum Alternatives {
    Try { candidates: Vec<NodeId>, mode: MatchMode },
    Conditional(Conditional),
}

/// What a conditional tests: a sibling key's value or an arbitrary schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Key(String),
    Schema(NodeId),
}

#[derive(Debug, Clone)]
pub struct Conditional {
    pub subject: Subject,
    pub form: ConditionalForm,
}

#[derive(Debug, Clone)]
pub enum ConditionalForm {
    Single(WhenClause),
    Chain(Vec<WhenClause>),
    Switch {
        cases: Vec<SwitchCase>,
        otherwise: Option<NodeId>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhenClause {
    pub is: Option<NodeId>,
    pub then: Option<NodeId>,
    pub otherwise: Option<NodeId>,
}

impl WhenClause {
    fn targets(&self) -> impl Iterator<Item = NodeId> {
        [self.is, self.then, self.otherwise].into_iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchCase {
    pub is: Option<NodeId>,
    pub then: Option<NodeId>,
}

// ---- link ----

/// Reference to a node registered elsewhere, written `#name` or `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef(pub String);

impl LinkRef {
    pub fn id(&self) -> &str {
        self.0.strip_prefix('#').unwrap_or(&self.0)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDERS
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn new(kind: Kind) -> Self {
        Self { kind, ..Self::default() }
    }

    pub fn any() -> Self {
        Self::new(Kind::Any)
    }
    pub fn forbidden() -> Self {
        Self::new(Kind::Forbidden)
    }
    pub fn string() -> Self {
        Self::new(Kind::String(StringRules::default()))
    }
    pub fn number() -> Self {
        Self::new(Kind::Number(NumberRules::default()))
    }
    pub fn boolean() -> Self {
        Self::new(Kind::Boolean(BooleanRules::default()))
    }
    pub fn link(target: impl Into<String>) -> Self {
        Self::new(Kind::Link(LinkRef(target.into())))
    }

    pub fn array<I: IntoIterator<Item = NodeId>>(items: I) -> Self {
        Self::new(Kind::Array(ArrayRules {
            items: items.into_iter().collect(),
            ..ArrayRules::default()
        }))
    }

    pub fn object<K, I>(children: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, NodeId)>,
    {
        Self::new(Kind::Object(ObjectRules {
            children: children.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..ObjectRules::default()
        }))
    }

    pub fn alternatives<I: IntoIterator<Item = NodeId>>(candidates: I) -> Self {
        Self::new(Kind::Alternatives(Alternatives::Try {
            candidates: candidates.into_iter().collect(),
            mode: MatchMode::Any,
        }))
    }

    pub fn conditional(subject: Subject, form: ConditionalForm) -> Self {
        Self::new(Kind::Alternatives(Alternatives::Conditional(Conditional { subject, form })))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }
    pub fn forbid(mut self) -> Self {
        self.presence = Presence::Forbidden;
        self
    }
    pub fn strip(mut self) -> Self {
        self.strip = true;
        self
    }
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
    pub fn default_value(mut self, v: Value) -> Self {
        self.default = Some(v);
        self
    }
    pub fn meta(mut self, m: Map<String, Value>) -> Self {
        self.meta.push(m);
        self
    }
    pub fn share(mut self, node: NodeId) -> Self {
        self.shared.push(node);
        self
    }

    pub fn push_values<I: IntoIterator<Item = Value>>(
        mut self,
        kind: ValueOpKind,
        reset: bool,
        values: I,
    ) -> Self {
        self.values.push(ValueOp { kind, reset, values: values.into_iter().collect() });
        self
    }
    pub fn valid<I: IntoIterator<Item = Value>>(self, values: I) -> Self {
        self.push_values(ValueOpKind::Valid, false, values)
    }
    pub fn allow<I: IntoIterator<Item = Value>>(self, values: I) -> Self {
        self.push_values(ValueOpKind::Allow, false, values)
    }
    pub fn example(self, v: Value) -> Self {
        self.push_values(ValueOpKind::Example, false, [v])
    }

    /// Mutable access to the object payload, if this is an object.
    pub fn object_rules_mut(&mut self) -> Option<&mut ObjectRules> {
        match &mut self.kind {
            Kind::Object(o) => Some(o),
            _ => None,
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_cover_conditional_targets_in_order() {
        let mut tree = SchemaTree::new();
        let is_a = tree.insert(SchemaNode::any().valid([Value::from("a")]));
        let then_a = tree.insert(SchemaNode::string());
        let fallback = tree.insert(SchemaNode::number());
        let cond = tree.insert(SchemaNode::conditional(
            Subject::Key("kind".into()),
            ConditionalForm::Switch {
                cases: vec![SwitchCase { is: Some(is_a), then: Some(then_a) }],
                otherwise: Some(fallback),
            },
        ));
        assert_eq!(tree.edges(cond), vec![is_a, then_a, fallback]);
    }

    #[test]
    fn link_ref_accepts_hash_prefix() {
        assert_eq!(LinkRef("#unit".into()).id(), "unit");
        assert_eq!(LinkRef("unit".into()).id(), "unit");
    }

    #[test]
    fn with_rule_lists_subject_first() {
        let rule = KeyRule::With { key: "a".into(), peers: vec!["b".into(), "c".into()] };
        assert_eq!(rule.keys(), vec!["a", "b", "c"]);
        assert_eq!(rule.name(), "with");
    }
}
