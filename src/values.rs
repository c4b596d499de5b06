//! Value-set accumulator.
//!
//! Folds a node's ordered [`ValueOp`] log into the final permitted, invalid
//! and example sets. Sets keep first-seen order and suppress duplicates by
//! JSON equality. A `reset` op discards what came before it, then applies
//! its own values.

use serde_json::Value;

use crate::model::{ValueOp, ValueOpKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    /// Values from `Valid` and `Allow` calls.
    pub permitted: Vec<Value>,
    /// True when a surviving `Valid` call restricts the node to `permitted`.
    pub only: bool,
    pub invalid: Vec<Value>,
    pub examples: Vec<Value>,
}

impl ValueSet {
    pub fn apply(mut self, op: &ValueOp) -> Self {
        match op.kind {
            ValueOpKind::Valid | ValueOpKind::Allow => {
                if op.reset {
                    self.permitted.clear();
                    self.examples.clear();
                    // a bare override lifts the restriction; one carrying
                    // values keeps whatever `Valid` established
                    if op.values.is_empty() {
                        self.only = false;
                    }
                }
                extend_unique(&mut self.permitted, &op.values);
                if op.kind == ValueOpKind::Valid && !op.values.is_empty() {
                    self.only = true;
                }
            }
            ValueOpKind::Invalid => {
                if op.reset {
                    self.invalid.clear();
                }
                extend_unique(&mut self.invalid, &op.values);
            }
            ValueOpKind::Example => {
                if op.reset {
                    self.examples.clear();
                }
                extend_unique(&mut self.examples, &op.values);
            }
        }
        self
    }

    pub fn allows_null(&self) -> bool {
        self.permitted.iter().any(Value::is_null)
    }

    /// Permitted values other than `null`, in order.
    pub fn non_null(&self) -> Vec<Value> {
        self.permitted.iter().filter(|v| !v.is_null()).cloned().collect()
    }
}

pub fn accumulate(ops: &[ValueOp]) -> ValueSet {
    ops.iter().fold(ValueSet::default(), ValueSet::apply)
}

fn extend_unique(set: &mut Vec<Value>, values: &[Value]) {
    for v in values {
        if !set.contains(v) {
            set.push(v.clone());
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
