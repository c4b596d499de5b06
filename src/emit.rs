// Renders the post-processed IR into draft-07 JSON Schema documents.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::combinator;
use crate::config::TranslateOptions;
use crate::ir::{
    folded_alternation, ArrayTy, BooleanTy, ConditionalPresence, NumberTy, ObjectTy, Schema,
    StringTy, Ty, WhenSubject, WhenTag,
};
use crate::model::Presence;

/// Keywords that never reject an instance, so they may sit beside `$ref`.
const NON_ASSERTING: &[&str] = &["title", "readOnly", "writeOnly", "deprecated", "$comment"];

/// A finished translation: the root schema with its definitions table.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    value: Value,
}

impl Document {
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// The definitions table, absent when nothing was shared.
    pub fn definitions(&self) -> Option<&Map<String, Value>> {
        self.value.get("definitions").and_then(Value::as_object)
    }

    pub fn to_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.value)
    }
}

pub fn document(
    root: &Schema,
    definitions: &IndexMap<String, Schema>,
    options: &TranslateOptions,
) -> Document {
    let mut o = Map::new();
    if options.schema_uri {
        o.insert("$schema".into(), Value::from(options.target.schema_uri()));
    }
    o.extend(render(root, options));
    if !definitions.is_empty() {
        let defs: Map<String, Value> = definitions
            .iter()
            .map(|(name, body)| (name.clone(), Value::Object(render(body, options))))
            .collect();
        o.insert(options.target.definitions_key().into(), Value::Object(defs));
    }
    Document { value: Value::Object(o) }
}

/// JSON pointer to a definitions entry, escaping `~` and `/`.
pub fn pointer(name: &str) -> String {
    format!("#/definitions/{}", name.replace('~', "~0").replace('/', "~1"))
}

pub fn render(s: &Schema, options: &TranslateOptions) -> Map<String, Value> {
    let constrained = s.nullable
        || !s.enum_.is_empty()
        || !s.also.is_empty()
        || !s.invalid.is_empty()
        || s.keywords.keys().any(|k| {
            !NON_ASSERTING.contains(&k.as_str()) && !k.starts_with(&options.extension_prefix)
        });
    let mut core = match &s.ty {
        Ty::Any => Map::new(),
        Ty::Never => obj(json!({ "not": {} })),
        Ty::Ref(name) if constrained => obj(json!({ "allOf": [{ "$ref": pointer(name) }] })),
        Ty::Ref(name) => obj(json!({ "$ref": pointer(name) })),
        Ty::String(st) => string(st),
        Ty::Number(n) => number(n),
        Ty::Boolean(b) => boolean(b),
        Ty::Array(a) => array(a, options),
        Ty::Object(ob) => object(ob, options),
        Ty::AnyOf(arms) => obj(json!({ "anyOf": arms_of(arms, options) })),
        Ty::OneOf(arms) => obj(json!({ "oneOf": arms_of(arms, options) })),
        Ty::AllOf(arms) => obj(json!({ "allOf": arms_of(arms, options) })),
    };

    // ---- values ----
    let mut also = s.also.clone();
    if s.nullable {
        match core.get("type").and_then(Value::as_str).map(str::to_string) {
            Some(t) => {
                core.insert("type".into(), json!([t, "null"]));
            }
            None => also.push(Value::Null),
        }
    }
    if !s.enum_.is_empty() {
        core.insert("enum".into(), Value::Array(s.enum_.clone()));
    }
    let mut o = if also.is_empty() || matches!(s.ty, Ty::Any) {
        core
    } else {
        obj(json!({ "anyOf": [Value::Object(core), { "enum": also }] }))
    };
    if !s.invalid.is_empty() {
        o.insert("not".into(), json!({ "enum": s.invalid }));
    }

    // ---- annotations ----
    if let Some(t) = &s.title {
        o.insert("title".into(), Value::from(t.clone()));
    }
    if let Some(d) = &s.description {
        o.insert("description".into(), Value::from(d.clone()));
    }
    if let Some(d) = &s.default {
        o.insert("default".into(), d.clone());
    }
    if !s.examples.is_empty() {
        o.insert("examples".into(), Value::Array(s.examples.clone()));
    }
    if let Some(when) = &s.when {
        o.insert(options.extension_key("when"), when_tag(when, options));
    }
    for (k, v) in &s.keywords {
        o.insert(k.clone(), v.clone());
    }
    o
}

// ---- per kind ----

fn string(st: &StringTy) -> Map<String, Value> {
    let mut o = obj(json!({ "type": "string" }));
    if let Some(m) = st.min_length {
        o.insert("minLength".into(), Value::from(m));
    }
    if let Some(m) = st.max_length {
        o.insert("maxLength".into(), Value::from(m));
    }
    let mut all_of = Vec::new();
    for p in &st.patterns {
        if p.invert {
            all_of.push(json!({ "not": { "pattern": p.regex } }));
        } else if let Some(title) = &p.title {
            all_of.push(json!({ "pattern": p.regex, "title": title }));
        } else if !o.contains_key("pattern") {
            o.insert("pattern".into(), Value::from(p.regex.clone()));
        } else {
            all_of.push(json!({ "pattern": p.regex }));
        }
    }
    if let Some(f) = &st.format {
        o.insert("format".into(), Value::from(f.clone()));
    } else if !st.format_any_of.is_empty() {
        let arms: Vec<Value> = st.format_any_of.iter().map(|f| json!({ "format": f })).collect();
        o.insert("anyOf".into(), Value::Array(arms));
    }
    if let Some(enc) = &st.content_encoding {
        o.insert("contentEncoding".into(), Value::from(enc.clone()));
    }
    if !all_of.is_empty() {
        o.insert("allOf".into(), Value::Array(all_of));
    }
    o
}

fn number(n: &NumberTy) -> Map<String, Value> {
    let ty = if n.integer { "integer" } else { "number" };
    let mut o = obj(json!({ "type": ty }));
    if let Some(m) = n.minimum {
        o.insert("minimum".into(), num(m));
    }
    if let Some(m) = n.maximum {
        o.insert("maximum".into(), num(m));
    }
    if let Some(m) = n.exclusive_minimum {
        o.insert("exclusiveMinimum".into(), num(m));
    }
    if let Some(m) = n.exclusive_maximum {
        o.insert("exclusiveMaximum".into(), num(m));
    }
    if let Some(m) = n.multiple_of {
        o.insert("multipleOf".into(), num(m));
    }
    o
}

fn boolean(b: &BooleanTy) -> Map<String, Value> {
    if b.literals.is_empty() {
        return obj(json!({ "type": "boolean" }));
    }
    let literal = if b.insensitive {
        json!({ "type": "string", "pattern": folded_alternation(&b.literals) })
    } else {
        json!({ "type": "string", "enum": b.literals })
    };
    obj(json!({ "anyOf": [{ "type": "boolean" }, literal] }))
}

fn array(a: &ArrayTy, options: &TranslateOptions) -> Map<String, Value> {
    let mut o = obj(json!({ "type": "array" }));
    let items = match a.items.as_slice() {
        [] => None,
        [one] => Some(Value::Object(render(one, options))),
        many => Some(json!({ "anyOf": arms_of(many, options) })),
    };
    if a.ordered.is_empty() {
        if let Some(items) = items {
            o.insert("items".into(), items);
        }
    } else {
        o.insert("items".into(), Value::Array(arms_of(&a.ordered, options)));
        o.insert("additionalItems".into(), items.unwrap_or(Value::Bool(false)));
    }
    if let Some(m) = a.min_items {
        o.insert("minItems".into(), Value::from(m));
    }
    if let Some(m) = a.max_items {
        o.insert("maxItems".into(), Value::from(m));
    }
    if a.unique {
        o.insert("uniqueItems".into(), Value::Bool(true));
    }
    o
}

fn object(ob: &ObjectTy, options: &TranslateOptions) -> Map<String, Value> {
    let mut o = obj(json!({ "type": "object" }));
    let mut props = Map::new();
    for f in &ob.fields {
        props.insert(f.name.clone(), Value::Object(render(&f.schema, options)));
    }
    o.insert("properties".into(), Value::Object(props));
    let required: Vec<Value> = ob
        .fields
        .iter()
        .filter(|f| f.required)
        .map(|f| Value::from(f.name.clone()))
        .collect();
    if !required.is_empty() {
        o.insert("required".into(), Value::Array(required));
    }
    if !ob.pattern_fields.is_empty() {
        let pats: Map<String, Value> = ob
            .pattern_fields
            .iter()
            .map(|(rx, s)| (rx.clone(), Value::Object(render(s, options))))
            .collect();
        o.insert("patternProperties".into(), Value::Object(pats));
    }
    o.insert("additionalProperties".into(), Value::Bool(ob.additional));
    if let Some(m) = ob.min_properties {
        o.insert("minProperties".into(), Value::from(m));
    }
    if let Some(m) = ob.max_properties {
        o.insert("maxProperties".into(), Value::from(m));
    }
    let presence = combinator::translate(&ob.rules);
    if !presence.dependencies.is_empty() {
        o.insert("dependencies".into(), Value::Object(presence.dependencies));
    }
    let mut all_of = presence.all_of;
    all_of.extend(ob.conditional_presence.iter().filter_map(|cp| presence_chain(cp, options)));
    if !all_of.is_empty() {
        o.insert("allOf".into(), Value::Array(all_of));
    }
    o
}

/// Nested `if`/`then`/`else` over the sibling key, one level per declared
/// test, stating the key's presence for each outcome.
fn presence_chain(cp: &ConditionalPresence, options: &TranslateOptions) -> Option<Value> {
    let mut acc: Option<Value> = None;
    for step in cp.steps.iter().rev() {
        let outcome = presence_constraint(&cp.key, step.presence);
        let Some(test) = &step.test else {
            acc = outcome;
            continue;
        };
        if outcome.is_none() && acc.is_none() {
            continue;
        }
        let mut props = Map::new();
        props.insert(cp.subject.clone(), Value::Object(render(test, options)));
        let mut o = Map::new();
        o.insert("if".into(), json!({ "properties": props, "required": [cp.subject] }));
        o.insert("then".into(), outcome.unwrap_or_else(|| json!({})));
        if let Some(rest) = acc.take() {
            o.insert("else".into(), rest);
        }
        acc = Some(Value::Object(o));
    }
    acc
}

fn presence_constraint(key: &str, presence: Presence) -> Option<Value> {
    match presence {
        Presence::Optional => None,
        Presence::Required => Some(json!({ "required": [key] })),
        Presence::Forbidden => Some(json!({ "not": { "required": [key] } })),
    }
}

fn when_tag(when: &WhenTag, options: &TranslateOptions) -> Value {
    let mut o = Map::new();
    match &when.subject {
        WhenSubject::Key(k) => {
            o.insert("ref".into(), Value::from(k.clone()));
        }
        WhenSubject::Schema(s) => {
            o.insert("schema".into(), Value::Object(render(s, options)));
        }
    }
    if let Some(test) = &when.test {
        o.insert("is".into(), Value::Object(render(test, options)));
    }
    if when.otherwise {
        o.insert("otherwise".into(), Value::Bool(true));
    }
    Value::Object(o)
}

// ---- helpers ----

fn arms_of(arms: &[Schema], options: &TranslateOptions) -> Vec<Value> {
    arms.iter().map(|a| Value::Object(render(a, options))).collect()
}

fn obj(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

/// Integral floats render as JSON integers (`0`, not `0.0`).
fn num(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ------------------------------- Tests ------------------------------------ //
