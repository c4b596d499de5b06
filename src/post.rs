//! Post-processing over the lowered IR.
//!
//! Runs once per translated body, bottom-up: folds each node's `meta` log
//! into keywords, then prunes object fields and array candidates that are
//! marked for stripping. Presence rules that mention a pruned key are
//! dropped with a warning, since they could never be satisfied as written.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::TranslateOptions;
use crate::ir::{ObjectTy, Schema, Ty, WhenSubject};

/// Meta keys that are standard JSON Schema annotations and pass through
/// unprefixed.
const ANNOTATIONS: &[&str] = &[
    "title",
    "readOnly",
    "writeOnly",
    "deprecated",
    "$comment",
    "format",
    "contentMediaType",
];

pub fn process(schema: &mut Schema, options: &TranslateOptions) {
    for child in children_mut(schema) {
        process(child, options);
    }
    fold_meta(schema, options);
    match &mut schema.ty {
        Ty::Object(obj) => prune_object(obj, options),
        Ty::Array(arr) => arr.items.retain(|item| !is_stripped(item, options)),
        _ => {}
    }
}

fn children_mut(schema: &mut Schema) -> Vec<&mut Schema> {
    let mut out: Vec<&mut Schema> = Vec::new();
    match &mut schema.ty {
        Ty::AnyOf(arms) | Ty::OneOf(arms) | Ty::AllOf(arms) => out.extend(arms.iter_mut()),
        Ty::Array(arr) => {
            out.extend(arr.items.iter_mut());
            out.extend(arr.ordered.iter_mut());
        }
        Ty::Object(obj) => {
            out.extend(obj.fields.iter_mut().map(|f| &mut f.schema));
            out.extend(obj.pattern_fields.iter_mut().map(|(_, s)| s));
            for cp in &mut obj.conditional_presence {
                out.extend(cp.steps.iter_mut().filter_map(|step| step.test.as_mut()));
            }
        }
        Ty::Any | Ty::Never | Ty::Ref(_) | Ty::String(_) | Ty::Number(_) | Ty::Boolean(_) => {}
    }
    if let Some(when) = &mut schema.when {
        if let Some(test) = &mut when.test {
            out.push(test.as_mut());
        }
        if let WhenSubject::Schema(subject) = &mut when.subject {
            out.push(subject.as_mut());
        }
    }
    out
}

/// Later `meta` calls win key by key.
fn fold_meta(schema: &mut Schema, options: &TranslateOptions) {
    if schema.meta.is_empty() {
        return;
    }
    let mut folded = Map::new();
    for m in schema.meta.drain(..) {
        folded.extend(m);
    }
    for (key, value) in folded {
        if key.starts_with(&options.extension_prefix) {
            schema.keywords.insert(key, value);
            continue;
        }
        if !ANNOTATIONS.contains(&key.as_str()) {
            schema.keywords.insert(options.extension_key(&key), value);
            continue;
        }
        match (key.as_str(), &mut schema.ty, value) {
            ("title", _, Value::String(t)) => schema.title = Some(t),
            ("format", Ty::String(st), Value::String(f)) => {
                st.format = Some(f);
                st.format_any_of.clear();
            }
            (_, _, value) => {
                schema.keywords.insert(key.clone(), value);
            }
        }
    }
}

fn is_stripped(schema: &Schema, options: &TranslateOptions) -> bool {
    schema.strip
        || (options.strip_write_only
            && schema.keywords.get("writeOnly") == Some(&Value::Bool(true)))
}

fn prune_object(obj: &mut ObjectTy, options: &TranslateOptions) {
    let mut removed: Vec<String> = Vec::new();
    obj.fields.retain(|f| {
        let keep = !is_stripped(&f.schema, options);
        if !keep {
            removed.push(f.name.clone());
        }
        keep
    });
    obj.pattern_fields.retain(|(_, s)| !is_stripped(s, options));
    if removed.is_empty() {
        return;
    }
    debug!(keys = ?removed, "stripped object keys");
    obj.rules.retain(|rule| {
        let dangling = rule.keys().iter().any(|k| removed.iter().any(|r| r == k));
        if dangling {
            warn!(rule = rule.name(), "dropping key rule that references a stripped key");
        }
        !dangling
    });
    obj.conditional_presence
        .retain(|cp| !removed.iter().any(|r| *r == cp.key || *r == cp.subject));
}

// ------------------------------- Tests ------------------------------------ //
