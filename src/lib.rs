//! Translate validation-schema trees into draft-07 JSON Schema documents.
//!
//! ```no_run
//! use vschema2json::{translate, SchemaNode, SchemaTree};
//!
//! let mut tree = SchemaTree::new();
//! let name = tree.insert(SchemaNode::string().required());
//! let root = tree.insert(SchemaNode::object([("name", name)]));
//! let doc = translate(&tree, root, "json").unwrap();
//! println!("{}", doc.to_string_pretty().unwrap());
//! ```

pub mod authoring;
pub mod combinator;
pub mod conditional;
pub mod config;
pub mod emit;
pub mod error;
pub mod ir;
pub mod model;
pub mod path_de;
pub mod post;
pub mod registry;
pub mod values;
pub mod walker;

pub use config::{TargetFormat, TranslateOptions};
pub use emit::Document;
pub use error::{Error, Result};
pub use model::{
    Alternatives, Conditional, ConditionalForm, KeyRule, Kind, MatchMode, NodeId, Presence,
    SchemaNode, SchemaTree, Subject, SwitchCase, ValueOp, ValueOpKind, WhenClause,
};
pub use walker::{translate, translate_with};
