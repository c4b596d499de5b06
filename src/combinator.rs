//! Combinator translator.
//!
//! Object-level key rules constrain which sibling keys may co-occur. They
//! are translated into presence-only constructs (`required`, `not`,
//! `anyOf`/`oneOf` over `required`, `dependencies`) so a validator can check
//! them without looking at any value.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::model::{KeyRule, NodeId};

/// Every key a rule mentions must be one of the object's children.
pub fn check(rules: &[KeyRule], children: &IndexMap<String, NodeId>) -> Result<()> {
    for rule in rules {
        for key in rule.keys() {
            if !children.contains_key(key) {
                return Err(Error::UnknownCombinatorKey {
                    rule: rule.name(),
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Dependency {
    required: Vec<String>,
    forbidden: Vec<String>,
}

/// Rendered presence constraints for one object.
#[derive(Debug, Default, PartialEq)]
pub struct PresenceConstraints {
    /// Draft-07 `dependencies`, keyed by the triggering key.
    pub dependencies: Map<String, Value>,
    /// Constraints that do not fit `dependencies`, one entry per rule.
    pub all_of: Vec<Value>,
}

impl PresenceConstraints {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.all_of.is_empty()
    }
}

pub fn translate(rules: &[KeyRule]) -> PresenceConstraints {
    let mut deps: IndexMap<String, Dependency> = IndexMap::new();
    let mut all_of = Vec::new();

    for rule in rules {
        match rule {
            KeyRule::And(keys) => {
                for key in keys {
                    let others = keys.iter().filter(|k| *k != key).cloned();
                    push_unique(&mut deps.entry(key.clone()).or_default().required, others);
                }
            }
            KeyRule::Or(keys) if !keys.is_empty() => {
                all_of.push(json!({ "anyOf": keys.iter().map(|k| required(k)).collect::<Vec<_>>() }));
            }
            KeyRule::Xor(keys) if !keys.is_empty() => {
                let arms: Vec<Value> = keys.iter().map(|k| exactly(k, keys)).collect();
                all_of.push(json!({ "oneOf": arms }));
            }
            KeyRule::Nand(keys) if !keys.is_empty() => {
                all_of.push(json!({ "not": { "required": keys } }));
            }
            KeyRule::Oxor(keys) if !keys.is_empty() => {
                let mut arms = vec![none_of(keys)];
                arms.extend(keys.iter().map(|k| exactly(k, keys)));
                all_of.push(json!({ "oneOf": arms }));
            }
            KeyRule::With { key, peers } => {
                push_unique(&mut deps.entry(key.clone()).or_default().required, peers.iter().cloned());
            }
            KeyRule::Without { key, peers } => {
                push_unique(&mut deps.entry(key.clone()).or_default().forbidden, peers.iter().cloned());
            }
            // empty key lists constrain nothing
            KeyRule::Or(_) | KeyRule::Xor(_) | KeyRule::Nand(_) | KeyRule::Oxor(_) => {}
        }
    }

    let mut dependencies = Map::new();
    for (key, dep) in deps {
        if let Some(v) = render_dependency(dep) {
            dependencies.insert(key, v);
        }
    }
    PresenceConstraints { dependencies, all_of }
}

fn render_dependency(dep: Dependency) -> Option<Value> {
    match (dep.required.is_empty(), dep.forbidden.is_empty()) {
        (true, true) => None,
        (false, true) => Some(json!(dep.required)),
        (req_empty, false) => {
            let mut o = Map::new();
            if !req_empty {
                o.insert("required".into(), json!(dep.required));
            }
            o.insert("not".into(), json!({ "anyOf": dep.forbidden.iter().map(|k| required(k)).collect::<Vec<_>>() }));
            Some(Value::Object(o))
        }
    }
}

fn required(key: &str) -> Value {
    json!({ "required": [key] })
}

fn none_of(keys: &[String]) -> Value {
    json!({ "not": { "anyOf": keys.iter().map(|k| required(k)).collect::<Vec<_>>() } })
}

/// `key` present, every other key in `keys` absent.
fn exactly(key: &str, keys: &[String]) -> Value {
    let others: Vec<String> = keys.iter().filter(|k| *k != key).cloned().collect();
    if others.is_empty() {
        required(key)
    } else {
        let mut o = required(key);
        o["not"] = json!({ "anyOf": others.iter().map(|k| required(k)).collect::<Vec<_>>() });
        o
    }
}

fn push_unique(set: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !set.contains(&item) {
            set.push(item);
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
