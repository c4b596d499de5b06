//! Node walker.
//!
//! Depth-first lowering of a [`SchemaTree`] into the output IR. Named nodes
//! (an `id`, or an anonymous node reachable along more than one edge) are
//! translated once into the registry's definitions table and referenced by
//! pointer everywhere they occur. Each node moves through
//! `Unvisited → Visiting → Emitted`; meeting a node that is still `Visiting`
//! yields a pointer instead of recursing, which is what terminates cycles.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::combinator;
use crate::conditional::{self, Guard, Test};
use crate::config::TranslateOptions;
use crate::emit::{self, Document};
use crate::error::Result;
use crate::ir::{
    folded_alternation, ArrayTy, BooleanTy, ConditionalPresence, Field, NumberTy, ObjectTy,
    PatternTy, PresenceStep, Schema, StringTy, Ty, WhenSubject, WhenTag,
};
use crate::model::{
    Alternatives, ArrayRules, BinaryRules, BooleanRules, Case, Conditional, DateFormat, IpVersion,
    Kind, MatchMode, NodeId, NumberRules, ObjectRules, Presence, SchemaNode, SchemaTree, Sign,
    StringFormat, StringRules, Subject, TimestampUnit,
};
use crate::post;
use crate::registry::{Registry, Resolution};
use crate::values::{self, ValueSet};

/// Translate the tree under `root` into a document in the `target` format.
pub fn translate(tree: &SchemaTree, root: NodeId, target: &str) -> Result<Document> {
    translate_with(tree, root, &TranslateOptions::for_target(target)?)
}

pub fn translate_with(
    tree: &SchemaTree,
    root: NodeId,
    options: &TranslateOptions,
) -> Result<Document> {
    Walker::new(tree, root, options).run(root)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Visiting,
    Emitted,
}

pub struct Walker<'t> {
    tree: &'t SchemaTree,
    options: &'t TranslateOptions,
    registry: Registry,
    states: Vec<VisitState>,
    /// Definition names handed out to anonymous shared nodes.
    generated: HashMap<NodeId, String>,
    /// Anonymous nodes with more than one incoming edge.
    multi: HashSet<NodeId>,
    user_ids: HashSet<String>,
}

impl<'t> Walker<'t> {
    pub fn new(tree: &'t SchemaTree, root: NodeId, options: &'t TranslateOptions) -> Self {
        let (multi, user_ids) = scan(tree, root);
        Self {
            tree,
            options,
            registry: Registry::new(),
            states: vec![VisitState::Unvisited; tree.len()],
            generated: HashMap::new(),
            multi,
            user_ids,
        }
    }

    /// Translate the tree under `root` into a finished document.
    pub fn run(mut self, root: NodeId) -> Result<Document> {
        let mut root_schema = self.visit(root)?;
        // shared declarations that nothing linked to still get a definition
        loop {
            let todo: Vec<(String, NodeId)> = self
                .registry
                .pending()
                .into_iter()
                .filter(|(_, node)| self.states[node.index()] == VisitState::Unvisited)
                .collect();
            if todo.is_empty() {
                break;
            }
            for (name, node) in todo {
                self.define(&name, node)?;
            }
        }
        let mut definitions = self.registry.finish()?;
        post::process(&mut root_schema, self.options);
        for body in definitions.values_mut() {
            post::process(body, self.options);
        }
        Ok(emit::document(&root_schema, &definitions, self.options))
    }

    fn visit(&mut self, id: NodeId) -> Result<Schema> {
        let node = self.tree.get(id);
        trace!(node = id.index(), kind = node.kind.name(), "visit");
        match self.definition_name(id)? {
            Some(name) => {
                self.define(&name, id)?;
                let mut out = self.registry.link_to(&name);
                out.strip = node.strip;
                Ok(out)
            }
            None => {
                self.states[id.index()] = VisitState::Visiting;
                let out = self.lower(node)?;
                self.states[id.index()] = VisitState::Emitted;
                Ok(out)
            }
        }
    }

    /// The definitions-table name for `id`, registering it on first sight.
    fn definition_name(&mut self, id: NodeId) -> Result<Option<String>> {
        let node = self.tree.get(id);
        if let Some(name) = &node.id {
            self.registry.register(name, id)?;
            return Ok(Some(name.clone()));
        }
        if !self.multi.contains(&id) {
            return Ok(None);
        }
        if let Some(name) = self.generated.get(&id) {
            return Ok(Some(name.clone()));
        }
        let name = self.registry.fresh_name(&self.user_ids);
        self.registry.register(&name, id)?;
        self.generated.insert(id, name.clone());
        Ok(Some(name))
    }

    /// Translate a named node into its definition unless that has already
    /// started. A node still `Visiting` is left alone: the caller's pointer
    /// is the placeholder that closes the cycle.
    fn define(&mut self, name: &str, id: NodeId) -> Result<()> {
        if self.states[id.index()] != VisitState::Unvisited {
            return Ok(());
        }
        debug!(name, node = id.index(), "translating shared definition");
        self.states[id.index()] = VisitState::Visiting;
        let mut body = self.lower(self.tree.get(id))?;
        body.strip = false;
        self.states[id.index()] = VisitState::Emitted;
        self.registry.emit(name, body);
        Ok(())
    }

    fn follow(&mut self, target: &str) -> Result<Schema> {
        let out = self.registry.link_to(target);
        if let Resolution::Pending(node) = self.registry.resolve(target) {
            self.define(target, node)?;
        }
        Ok(out)
    }

    fn declare_shared(&mut self, node: &SchemaNode) -> Result<()> {
        for &shared in &node.shared {
            match &self.tree.get(shared).id {
                Some(name) => {
                    self.registry.register(name, shared)?;
                }
                None => warn!(node = shared.index(), "shared schema has no id; ignored"),
            }
        }
        Ok(())
    }

    // ————————————————————————————————————————————————————————————————————————
    // LOWERING
    // ————————————————————————————————————————————————————————————————————————

    fn lower(&mut self, node: &'t SchemaNode) -> Result<Schema> {
        self.declare_shared(node)?;
        let values = values::accumulate(&node.values);
        let mut folded = false;

        let mut out = if node.presence == Presence::Forbidden {
            Schema::new(Ty::Never)
        } else {
            match &node.kind {
                Kind::Any => Schema::any(),
                Kind::Forbidden => Schema::new(Ty::Never),
                Kind::String(r) => {
                    let (s, consumed) = self.lower_string(r, &values);
                    folded = consumed;
                    s
                }
                Kind::Number(r) => Schema::new(Ty::Number(lower_number(r))),
                Kind::Boolean(r) => Schema::new(Ty::Boolean(lower_boolean(r))),
                Kind::Binary(r) => Schema::new(Ty::String(lower_binary(r))),
                Kind::Date(r) => self.lower_date(r.format),
                Kind::Array(r) => Schema::new(Ty::Array(self.lower_array(r)?)),
                Kind::Object(r) => Schema::new(Ty::Object(self.lower_object(r)?)),
                Kind::Alternatives(Alternatives::Try { candidates, mode }) => {
                    let arms = candidates
                        .iter()
                        .map(|c| self.visit(*c))
                        .collect::<Result<Vec<_>>>()?;
                    Schema::new(match mode {
                        MatchMode::Any => Ty::AnyOf(arms),
                        MatchMode::One => Ty::OneOf(arms),
                        MatchMode::All => Ty::AllOf(arms),
                    })
                }
                Kind::Alternatives(Alternatives::Conditional(c)) => {
                    Schema::new(Ty::AnyOf(self.lower_conditional(c)?))
                }
                Kind::Link(link) => self.follow(link.id())?,
            }
        };

        if !matches!(out.ty, Ty::Never) {
            apply_values(&mut out, &values, folded);
        }
        out.examples = values.examples;
        out.title = node.label.clone();
        out.description = node.description.clone();
        out.default = node.default.clone();
        out.meta = node.meta.clone();
        out.strip = node.strip;
        Ok(out)
    }

    /// The flag is set when a case-insensitive closed set was turned into a
    /// pattern and must not also become an `enum`.
    fn lower_string(&self, r: &StringRules, values: &ValueSet) -> (Schema, bool) {
        let mut st = StringTy {
            min_length: r.min_length,
            max_length: r.max_length,
            ..StringTy::default()
        };
        for p in &r.patterns {
            st.patterns.push(PatternTy { regex: p.regex.clone(), title: p.name.clone(), invert: p.invert });
        }
        for f in &r.formats {
            match f {
                StringFormat::Email => st.format = Some("email".into()),
                StringFormat::Uri => st.format = Some("uri".into()),
                StringFormat::Guid => st.format = Some("uuid".into()),
                StringFormat::Hostname => st.format = Some("hostname".into()),
                StringFormat::IsoDate => st.format = Some("date-time".into()),
                StringFormat::IsoDuration => st.format = Some("duration".into()),
                StringFormat::Ip(versions) => {
                    let mut names: Vec<String> = versions
                        .iter()
                        .map(|v| match v {
                            IpVersion::V4 => "ipv4".to_string(),
                            IpVersion::V6 => "ipv6".to_string(),
                        })
                        .collect();
                    if names.is_empty() {
                        names = vec!["ipv4".into(), "ipv6".into()];
                    }
                    names.dedup();
                    if names.len() == 1 {
                        st.format = names.pop();
                    } else {
                        st.format_any_of = names;
                    }
                }
                StringFormat::Alphanum => st.patterns.push(derived("^[a-zA-Z0-9]+$")),
                StringFormat::Token => st.patterns.push(derived("^[a-zA-Z0-9_]+$")),
                StringFormat::Hex => st.patterns.push(derived("^[a-fA-F0-9]+$")),
                StringFormat::Base64 => st.content_encoding = Some("base64".into()),
            }
        }
        match r.case {
            Some(Case::Lower) => st.patterns.push(derived("^[^A-Z]*$")),
            Some(Case::Upper) => st.patterns.push(derived("^[^a-z]*$")),
            None => {}
        }

        // a case-insensitive closed set cannot be an `enum`; match it by pattern
        let literals: Vec<String> = values
            .non_null()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        let folded = r.insensitive
            && values.only
            && !literals.is_empty()
            && literals.len() == values.non_null().len();
        if folded {
            st.patterns.push(derived(&folded_alternation(&literals)));
        }

        let mut out = Schema::new(Ty::String(st));
        if !r.truthy.is_empty() {
            out.keywords.insert(self.options.extension_key("truthy"), json!(r.truthy));
        }
        if !r.falsy.is_empty() {
            out.keywords.insert(self.options.extension_key("falsy"), json!(r.falsy));
        }
        if folded {
            out.nullable = values.allows_null();
        }
        (out, folded)
    }

    fn lower_date(&self, format: DateFormat) -> Schema {
        match format {
            DateFormat::Iso => Schema::new(Ty::String(StringTy {
                format: Some("date-time".into()),
                ..StringTy::default()
            })),
            DateFormat::Timestamp(unit) => {
                let mut out = Schema::new(Ty::Number(NumberTy::default()));
                let unit = match unit {
                    TimestampUnit::Javascript => "javascript",
                    TimestampUnit::Unix => "unix",
                };
                out.keywords.insert(self.options.extension_key("timestamp"), json!(unit));
                out
            }
        }
    }

    fn lower_array(&mut self, r: &ArrayRules) -> Result<ArrayTy> {
        let items = r.items.iter().map(|i| self.visit(*i)).collect::<Result<Vec<_>>>()?;
        let ordered = r.ordered.iter().map(|i| self.visit(*i)).collect::<Result<Vec<_>>>()?;
        Ok(ArrayTy {
            items,
            ordered,
            min_items: r.min_items,
            max_items: r.max_items,
            unique: r.unique,
        })
    }

    fn lower_object(&mut self, r: &ObjectRules) -> Result<ObjectTy> {
        combinator::check(&r.rules, &r.children)?;
        let mut fields = Vec::with_capacity(r.children.len());
        let mut conditional_presence = Vec::new();
        for (name, &child) in &r.children {
            let schema = self.visit(child)?;
            let required = self.tree.get(child).presence == Presence::Required;
            fields.push(Field { name: name.clone(), schema, required });
            if let Some(cp) = self.conditional_presence(name, child)? {
                conditional_presence.push(cp);
            }
        }
        let mut pattern_fields = Vec::with_capacity(r.pattern_children.len());
        for (regex, child) in &r.pattern_children {
            pattern_fields.push((regex.clone(), self.visit(*child)?));
        }
        Ok(ObjectTy {
            fields,
            pattern_fields,
            additional: r.allow_unknown,
            min_properties: r.min_keys,
            max_properties: r.max_keys,
            rules: r.rules.clone(),
            conditional_presence,
        })
    }

    /// The presence each outcome of a sibling-key conditional declares for
    /// the conditional's own key. `None` when every outcome is optional.
    fn conditional_presence(
        &mut self,
        key: &str,
        child: NodeId,
    ) -> Result<Option<ConditionalPresence>> {
        let tree = self.tree;
        let node = tree.get(child);
        let Kind::Alternatives(Alternatives::Conditional(c)) = &node.kind else {
            return Ok(None);
        };
        let Subject::Key(subject) = &c.subject else {
            return Ok(None);
        };
        if node.presence != Presence::Optional {
            return Ok(None);
        }
        let presence_of =
            |outcome: Option<NodeId>| outcome.map_or(Presence::Optional, |id| tree.get(id).presence);
        let plan = conditional::plan(c)?;
        if plan.iter().all(|step| presence_of(step.outcome) == Presence::Optional) {
            return Ok(None);
        }
        let mut steps = Vec::with_capacity(plan.len());
        for step in plan {
            let test = match step.guard {
                Guard::Matches(Test::Is(is)) => Some(self.visit(is)?),
                Guard::Matches(Test::Truthy) => Some(truthy_test()),
                Guard::Matches(Test::Subject) => continue,
                Guard::Otherwise => None,
            };
            steps.push(PresenceStep { test, presence: presence_of(step.outcome) });
        }
        Ok(Some(ConditionalPresence { key: key.to_string(), subject: subject.clone(), steps }))
    }

    fn lower_conditional(&mut self, c: &Conditional) -> Result<Vec<Schema>> {
        let plan = conditional::plan(c)?;
        let subject = match &c.subject {
            Subject::Key(k) => WhenSubject::Key(k.clone()),
            Subject::Schema(s) => WhenSubject::Schema(Box::new(self.visit(*s)?)),
        };
        let mut branches = Vec::with_capacity(plan.len());
        for step in plan {
            let mut branch = match step.outcome {
                Some(then) => self.visit(then)?,
                None => Schema::any(),
            };
            let (test, otherwise) = match step.guard {
                Guard::Matches(Test::Is(is)) => (Some(Box::new(self.visit(is)?)), false),
                Guard::Matches(Test::Truthy) => (Some(Box::new(truthy_test())), false),
                Guard::Matches(Test::Subject) => (None, false),
                Guard::Otherwise => (None, true),
            };
            branch.when = Some(WhenTag { subject: subject.clone(), test, otherwise });
            branches.push(branch);
        }
        Ok(branches)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Anonymous nodes reachable along more than one edge (the root counts as
/// having one incoming edge), plus every user id in reach.
fn scan(tree: &SchemaTree, root: NodeId) -> (HashSet<NodeId>, HashSet<String>) {
    let mut indegree = vec![0usize; tree.len()];
    let mut seen = vec![false; tree.len()];
    let mut ids = HashSet::new();
    let mut stack = vec![root];
    indegree[root.index()] += 1;
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut seen[id.index()], true) {
            continue;
        }
        if let Some(name) = &tree.get(id).id {
            ids.insert(name.clone());
        }
        for next in tree.edges(id) {
            indegree[next.index()] += 1;
            if !seen[next.index()] {
                stack.push(next);
            }
        }
    }
    let multi = (0..tree.len())
        .map(NodeId)
        .filter(|id| indegree[id.index()] > 1 && tree.get(*id).id.is_none())
        .collect();
    (multi, ids)
}

fn derived(regex: &str) -> PatternTy {
    PatternTy { regex: regex.to_string(), title: None, invert: false }
}

fn lower_number(r: &NumberRules) -> NumberTy {
    let mut n = NumberTy {
        integer: r.integer,
        minimum: r.min.map(|v| v.0),
        maximum: r.max.map(|v| v.0),
        exclusive_minimum: r.greater.map(|v| v.0),
        exclusive_maximum: r.less.map(|v| v.0),
        multiple_of: r.multiple.map(|v| v.0),
    };
    match r.sign {
        Some(Sign::Positive) => {
            n.exclusive_minimum = Some(n.exclusive_minimum.map_or(0.0, |g| g.max(0.0)));
        }
        Some(Sign::Negative) => {
            n.exclusive_maximum = Some(n.exclusive_maximum.map_or(0.0, |l| l.min(0.0)));
        }
        None => {}
    }
    if let (false, None, Some(p)) = (r.integer, n.multiple_of, r.precision) {
        // precision past f64 range would give `multipleOf: 0`, which is invalid
        let step = 1.0 / 10f64.powi(i32::try_from(p).unwrap_or(i32::MAX));
        if step > 0.0 {
            n.multiple_of = Some(step);
        }
    }
    n
}

fn lower_boolean(r: &BooleanRules) -> BooleanTy {
    BooleanTy {
        literals: r.truthy.iter().chain(&r.falsy).cloned().collect(),
        insensitive: !r.sensitive,
    }
}

fn lower_binary(r: &BinaryRules) -> StringTy {
    StringTy {
        min_length: r.min_length,
        max_length: r.max_length,
        format: if r.encoding.is_none() { Some("binary".into()) } else { None },
        content_encoding: r.encoding.clone(),
        ..StringTy::default()
    }
}

/// A closed set (`Valid`) becomes `enum`; widening values (`Allow`) ride
/// along in `also`. `null` is tracked separately so typed nodes can list it
/// in `type`.
fn apply_values(out: &mut Schema, values: &ValueSet, folded: bool) {
    out.invalid = values.invalid.clone();
    if folded {
        return;
    }
    if values.only {
        out.enum_ = values.permitted.clone();
        out.nullable = values.allows_null() && is_typed(&out.ty);
    } else {
        out.nullable = values.allows_null();
        out.also = values.non_null();
    }
}

pub(crate) fn is_typed(ty: &Ty) -> bool {
    matches!(ty, Ty::String(_) | Ty::Number(_) | Ty::Boolean(_) | Ty::Array(_) | Ty::Object(_))
}

/// Default `is` for a sibling-key condition: the value is truthy.
fn truthy_test() -> Schema {
    let mut s = Schema::any();
    s.invalid = vec![Value::Null, Value::Bool(false), json!(0), json!("")];
    s
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IpVersion, PatternRule, ValueOpKind};
    use ordered_float::OrderedFloat;

    fn lower_one(node: SchemaNode) -> Schema {
        let mut tree = SchemaTree::new();
        let root = tree.insert(node);
        let options = TranslateOptions::default();
        let mut walker = Walker::new(&tree, root, &options);
        walker.visit(root).unwrap()
    }

    #[test]
    fn positive_tightens_exclusive_minimum() {
        let n = lower_number(&NumberRules {
            precision: Some(2),
            sign: Some(Sign::Positive),
            greater: Some(OrderedFloat(-5.0)),
            less: Some(OrderedFloat(200.0)),
            ..NumberRules::default()
        });
        assert_eq!(n.exclusive_minimum, Some(0.0));
        assert_eq!(n.exclusive_maximum, Some(200.0));
        assert_eq!(n.multiple_of, Some(0.01));
    }

    #[test]
    fn negative_tightens_exclusive_maximum() {
        let loose = lower_number(&NumberRules {
            sign: Some(Sign::Negative),
            less: Some(OrderedFloat(10.0)),
            ..NumberRules::default()
        });
        assert_eq!(loose.exclusive_maximum, Some(0.0));
        let tight = lower_number(&NumberRules {
            sign: Some(Sign::Negative),
            less: Some(OrderedFloat(-3.0)),
            ..NumberRules::default()
        });
        assert_eq!(tight.exclusive_maximum, Some(-3.0));
        assert_eq!(tight.exclusive_minimum, None);
    }

    #[test]
    fn explicit_multiple_wins_over_precision() {
        let n = lower_number(&NumberRules {
            precision: Some(2),
            multiple: Some(OrderedFloat(0.5)),
            ..NumberRules::default()
        });
        assert_eq!(n.multiple_of, Some(0.5));
    }

    #[test]
    fn precision_past_float_range_emits_no_multiple() {
        for p in [400, u32::MAX] {
            let n = lower_number(&NumberRules { precision: Some(p), ..NumberRules::default() });
            assert_eq!(n.multiple_of, None);
        }
    }

    #[test]
    fn match_modes_pick_the_combinator() {
        let cases = [(MatchMode::Any, "anyOf"), (MatchMode::One, "oneOf"), (MatchMode::All, "allOf")];
        for (mode, want) in cases {
            let mut tree = SchemaTree::new();
            let a = tree.insert(SchemaNode::string());
            let b = tree.insert(SchemaNode::number());
            let root = tree.insert(SchemaNode::new(Kind::Alternatives(Alternatives::Try {
                candidates: vec![a, b],
                mode,
            })));
            let options = TranslateOptions::default();
            let s = Walker::new(&tree, root, &options).visit(root).unwrap();
            let (name, arms) = match &s.ty {
                Ty::AnyOf(arms) => ("anyOf", arms),
                Ty::OneOf(arms) => ("oneOf", arms),
                Ty::AllOf(arms) => ("allOf", arms),
                other => panic!("unexpected {other:?}"),
            };
            assert_eq!(name, want);
            assert_eq!(arms.len(), 2);
        }
    }

    #[test]
    fn label_becomes_title() {
        let node = SchemaNode { label: Some("Age".into()), ..SchemaNode::number() };
        let s = lower_one(node);
        assert_eq!(s.title.as_deref(), Some("Age"));
    }

    #[test]
    fn integer_ignores_precision() {
        let n = lower_number(&NumberRules { integer: true, precision: Some(2), ..NumberRules::default() });
        assert_eq!(n.multiple_of, None);
    }

    #[test]
    fn ip_with_two_versions_becomes_format_alternatives() {
        let s = lower_one(SchemaNode::new(Kind::String(StringRules {
            formats: vec![StringFormat::Ip(vec![IpVersion::V4, IpVersion::V6])],
            ..StringRules::default()
        })));
        let Ty::String(st) = s.ty else { panic!("expected string") };
        assert_eq!(st.format, None);
        assert_eq!(st.format_any_of, vec!["ipv4", "ipv6"]);
    }

    #[test]
    fn valid_with_null_marks_typed_node_nullable() {
        let s = lower_one(SchemaNode::string().valid([json!("Male"), json!(""), Value::Null]));
        assert!(s.nullable);
        assert_eq!(s.enum_, vec![json!("Male"), json!(""), Value::Null]);
        assert!(s.also.is_empty());
    }

    #[test]
    fn allow_widens_instead_of_restricting() {
        let s = lower_one(SchemaNode::number().allow([json!("n/a"), Value::Null]));
        assert!(s.enum_.is_empty());
        assert!(s.nullable);
        assert_eq!(s.also, vec![json!("n/a")]);
    }

    #[test]
    fn insensitive_closed_set_becomes_pattern() {
        let mut node = SchemaNode::new(Kind::String(StringRules {
            insensitive: true,
            patterns: vec![PatternRule { regex: "^x".into(), name: None, invert: true }],
            ..StringRules::default()
        }));
        node = node.push_values(ValueOpKind::Valid, false, [json!("ab")]);
        let s = lower_one(node);
        assert!(s.enum_.is_empty());
        let Ty::String(st) = s.ty else { panic!("expected string") };
        assert_eq!(st.patterns.len(), 2);
        assert_eq!(st.patterns[1].regex, "^(?:[aA][bB])$");
    }

    #[test]
    fn forbidden_presence_overrides_kind() {
        let s = lower_one(SchemaNode::string().forbid().describe("gone"));
        assert!(matches!(s.ty, Ty::Never));
        assert_eq!(s.description.as_deref(), Some("gone"));
    }

    #[test]
    fn scan_finds_anonymous_nodes_with_several_parents() {
        let mut tree = SchemaTree::new();
        let leaf = tree.insert(SchemaNode::string());
        let named = tree.insert(SchemaNode::string().with_id("n"));
        let root = tree.insert(SchemaNode::object([("a", leaf), ("b", leaf), ("c", named), ("d", named)]));
        let (multi, ids) = scan(&tree, root);
        assert!(multi.contains(&leaf));
        assert!(!multi.contains(&named));
        assert!(ids.contains("n"));
    }
}
