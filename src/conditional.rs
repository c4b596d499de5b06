//! Conditional resolver.
//!
//! Turns a `when` / chain / `switch` block into the full list of branches it
//! can take. Nothing is evaluated: every `then` and the fall-through case
//! become branches, and a block without a declared `otherwise` still gets an
//! unconstrained fall-through branch. The walker translates the referenced
//! nodes and renders the branches as a disjunction.

use crate::error::{Error, Result};
use crate::model::{Conditional, ConditionalForm, NodeId, Subject, WhenClause};

/// The test that selects a declared outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Test {
    /// The sibling key's value must match this schema.
    Is(NodeId),
    /// The sibling key's value must be truthy (no `is` was given).
    Truthy,
    /// The conditional's own subject schema must match.
    Subject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Matches(Test),
    /// No declared test matched.
    Otherwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchPlan {
    pub guard: Guard,
    /// `None` means the branch is unconstrained.
    pub outcome: Option<NodeId>,
}

pub fn plan(cond: &Conditional) -> Result<Vec<BranchPlan>> {
    match &cond.form {
        ConditionalForm::Single(clause) => {
            let test = clause_test(&cond.subject, clause)?;
            Ok(vec![
                BranchPlan { guard: Guard::Matches(test), outcome: clause.then },
                BranchPlan { guard: Guard::Otherwise, outcome: clause.otherwise },
            ])
        }
        ConditionalForm::Chain(clauses) => {
            let Some((last, init)) = clauses.split_last() else {
                return Err(Error::malformed("conditional chain has no clauses"));
            };
            let mut out = Vec::with_capacity(clauses.len() + 1);
            for (i, clause) in init.iter().enumerate() {
                if clause.otherwise.is_some() {
                    return Err(Error::malformed(format!(
                        "chain clause {i} declares `otherwise` but is not the last clause"
                    )));
                }
                let test = clause_test(&cond.subject, clause)?;
                out.push(BranchPlan { guard: Guard::Matches(test), outcome: clause.then });
            }
            let test = clause_test(&cond.subject, last)?;
            out.push(BranchPlan { guard: Guard::Matches(test), outcome: last.then });
            out.push(BranchPlan { guard: Guard::Otherwise, outcome: last.otherwise });
            Ok(out)
        }
        ConditionalForm::Switch { cases, otherwise } => {
            if matches!(cond.subject, Subject::Schema(_)) {
                return Err(Error::malformed("`switch` requires a sibling-key condition"));
            }
            if cases.is_empty() {
                return Err(Error::malformed("`switch` has no cases"));
            }
            let mut out = Vec::with_capacity(cases.len() + 1);
            for (i, case) in cases.iter().enumerate() {
                let Some(is) = case.is else {
                    return Err(Error::malformed(format!("switch case {i} is missing `is`")));
                };
                if case.then.is_none() {
                    return Err(Error::malformed(format!("switch case {i} is missing `then`")));
                }
                out.push(BranchPlan { guard: Guard::Matches(Test::Is(is)), outcome: case.then });
            }
            out.push(BranchPlan { guard: Guard::Otherwise, outcome: *otherwise });
            Ok(out)
        }
    }
}

fn clause_test(subject: &Subject, clause: &WhenClause) -> Result<Test> {
    if clause.then.is_none() && clause.otherwise.is_none() {
        return Err(Error::malformed("clause declares neither `then` nor `otherwise`"));
    }
    match (subject, clause.is) {
        (Subject::Key(_), Some(is)) => Ok(Test::Is(is)),
        (Subject::Key(_), None) => Ok(Test::Truthy),
        (Subject::Schema(_), None) => Ok(Test::Subject),
        (Subject::Schema(_), Some(_)) => {
            Err(Error::malformed("`is` cannot be combined with a schema condition"))
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
