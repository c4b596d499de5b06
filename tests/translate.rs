use proptest::prelude::*;
use serde_json::{json, Value};
use vschema2json::{
    translate, ConditionalForm, Error, KeyRule, SchemaNode, SchemaTree, Subject, SwitchCase,
    ValueOpKind,
};

fn draft7(schema: &Value) -> jsonschema::Validator {
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .build(schema)
        .expect("emitted schema compiles")
}

fn object_with_rule(keys: &[&str], rule: KeyRule) -> (SchemaTree, vschema2json::NodeId) {
    let mut tree = SchemaTree::new();
    let children: Vec<(String, _)> = keys
        .iter()
        .map(|k| (k.to_string(), tree.insert(SchemaNode::string())))
        .collect();
    let mut obj = SchemaNode::object(children);
    obj.object_rules_mut().unwrap().rules.push(rule);
    let root = tree.insert(obj);
    (tree, root)
}

// ---- strip ----

#[test]
fn stripped_keys_vanish_at_every_depth() {
    let mut tree = SchemaTree::new();
    let a = tree.insert(SchemaNode::string());
    let b = tree.insert(SchemaNode::number().strip());
    let d = tree.insert(SchemaNode::string().strip());
    let nested = tree.insert(SchemaNode::object([("d", d)]).strip());
    let root = tree.insert(SchemaNode::object([("a", a), ("b", b), ("nested", nested)]));

    let doc = translate(&tree, root, "json").unwrap();
    let v = doc.as_value();
    assert_eq!(v["properties"], json!({ "a": { "type": "string" } }));
    assert!(v.get("required").is_none());
}

#[test]
fn stripped_required_key_leaves_required_list() {
    let mut tree = SchemaTree::new();
    let a = tree.insert(SchemaNode::string().required());
    let b = tree.insert(SchemaNode::string().required().strip());
    let root = tree.insert(SchemaNode::object([("a", a), ("b", b)]));
    let v = translate(&tree, root, "json").unwrap().into_value();
    assert_eq!(v["required"], json!(["a"]));
}

// ---- conditionals ----

#[test]
fn switch_without_otherwise_has_three_branches() {
    let mut tree = SchemaTree::new();
    let is_m = tree.insert(SchemaNode::any().valid([json!("Male")]).required());
    let then_m = tree.insert(SchemaNode::string());
    let is_f = tree.insert(SchemaNode::any().valid([json!("Female")]).required());
    let then_f = tree.insert(SchemaNode::number());
    let cond = tree.insert(SchemaNode::conditional(
        Subject::Key("gender".into()),
        ConditionalForm::Switch {
            cases: vec![
                SwitchCase { is: Some(is_m), then: Some(then_m) },
                SwitchCase { is: Some(is_f), then: Some(then_f) },
            ],
            otherwise: None,
        },
    ));
    let gender = tree.insert(SchemaNode::string());
    let root = tree.insert(SchemaNode::object([("gender", gender), ("pick", cond)]));

    let v = translate(&tree, root, "json").unwrap().into_value();
    let branches = v["properties"]["pick"]["anyOf"].as_array().unwrap();
    assert_eq!(branches.len(), 3);
    assert_eq!(branches[0]["type"], json!("string"));
    assert_eq!(branches[0]["x-when"], json!({ "ref": "gender", "is": { "enum": ["Male"] } }));
    assert_eq!(branches[2], json!({ "x-when": { "ref": "gender", "otherwise": true } }));
}

#[test]
fn schema_subject_is_kept_as_structural_test() {
    let mut tree = SchemaTree::new();
    let subject = tree.insert(SchemaNode::number());
    let then = tree.insert(SchemaNode::string());
    let cond = tree.insert(SchemaNode::conditional(
        Subject::Schema(subject),
        ConditionalForm::Single(vschema2json::WhenClause { is: None, then: Some(then), otherwise: None }),
    ));
    let v = translate(&tree, cond, "json").unwrap().into_value();
    let branches = v["anyOf"].as_array().unwrap();
    assert_eq!(branches[0]["x-when"], json!({ "schema": { "type": "number" } }));
    assert_eq!(
        branches[1],
        json!({ "x-when": { "schema": { "type": "number" }, "otherwise": true } })
    );
}

#[test]
fn key_condition_without_is_tests_truthiness() {
    let mut tree = SchemaTree::new();
    let then = tree.insert(SchemaNode::string());
    let cond = tree.insert(SchemaNode::conditional(
        Subject::Key("flag".into()),
        ConditionalForm::Single(vschema2json::WhenClause { is: None, then: Some(then), otherwise: None }),
    ));
    let v = translate(&tree, cond, "json").unwrap().into_value();
    assert_eq!(
        v["anyOf"][0]["x-when"]["is"],
        json!({ "not": { "enum": [null, false, 0, ""] } })
    );
}

#[test]
fn required_outcome_makes_key_required_when_test_matches() {
    let mut tree = SchemaTree::new();
    let gender = tree.insert(SchemaNode::string());
    let is_f = tree.insert(SchemaNode::any().valid([json!("Female")]).required());
    let then = tree.insert(SchemaNode::number().required());
    let cond = tree.insert(SchemaNode::conditional(
        Subject::Key("gender".into()),
        ConditionalForm::Single(vschema2json::WhenClause { is: Some(is_f), then: Some(then), otherwise: None }),
    ));
    let root = tree.insert(SchemaNode::object([("gender", gender), ("rank", cond)]));

    let v = translate(&tree, root, "json").unwrap().into_value();
    assert!(v.get("required").is_none());
    assert_eq!(
        v["allOf"],
        json!([{
            "if": { "properties": { "gender": { "enum": ["Female"] } }, "required": ["gender"] },
            "then": { "required": ["rank"] }
        }])
    );
    let validator = draft7(&v);
    assert!(!validator.is_valid(&json!({ "gender": "Female" })));
    assert!(validator.is_valid(&json!({ "gender": "Female", "rank": 1 })));
    assert!(validator.is_valid(&json!({ "gender": "Male" })));
    assert!(validator.is_valid(&json!({})));
}

#[test]
fn switch_outcomes_chain_presence_in_case_order() {
    let mut tree = SchemaTree::new();
    let gender = tree.insert(SchemaNode::string());
    let is_m = tree.insert(SchemaNode::any().valid([json!("Male")]).required());
    let then_m = tree.insert(SchemaNode::string().required());
    let is_f = tree.insert(SchemaNode::any().valid([json!("Female")]).required());
    let then_f = tree.insert(SchemaNode::number().forbid());
    let cond = tree.insert(SchemaNode::conditional(
        Subject::Key("gender".into()),
        ConditionalForm::Switch {
            cases: vec![
                SwitchCase { is: Some(is_m), then: Some(then_m) },
                SwitchCase { is: Some(is_f), then: Some(then_f) },
            ],
            otherwise: None,
        },
    ));
    let root = tree.insert(SchemaNode::object([("gender", gender), ("pick", cond)]));

    let v = translate(&tree, root, "json").unwrap().into_value();
    assert_eq!(v["allOf"][0]["then"], json!({ "required": ["pick"] }));
    assert_eq!(v["allOf"][0]["else"]["then"], json!({ "not": { "required": ["pick"] } }));
    let validator = draft7(&v);
    assert!(!validator.is_valid(&json!({ "gender": "Male" })));
    assert!(validator.is_valid(&json!({ "gender": "Male", "pick": "x" })));
    assert!(!validator.is_valid(&json!({ "gender": "Female", "pick": 1 })));
    assert!(validator.is_valid(&json!({ "gender": "Female" })));
    assert!(validator.is_valid(&json!({ "gender": "Other" })));
}

#[test]
fn optional_outcomes_add_no_presence_constraint() {
    let mut tree = SchemaTree::new();
    let flag = tree.insert(SchemaNode::boolean());
    let then = tree.insert(SchemaNode::string());
    let cond = tree.insert(SchemaNode::conditional(
        Subject::Key("flag".into()),
        ConditionalForm::Single(vschema2json::WhenClause { is: None, then: Some(then), otherwise: None }),
    ));
    let root = tree.insert(SchemaNode::object([("flag", flag), ("note", cond)]));
    let v = translate(&tree, root, "json").unwrap().into_value();
    assert!(v.get("allOf").is_none());
}

// ---- sharing and cycles ----

#[test]
fn self_reference_terminates_with_one_definition() {
    let mut tree = SchemaTree::new();
    let value = tree.insert(SchemaNode::number().required());
    let back = tree.insert(SchemaNode::link("#tree"));
    let children = tree.insert(SchemaNode::array([back]));
    let root = tree.insert(SchemaNode::object([("value", value), ("children", children)]).with_id("tree"));

    let doc = translate(&tree, root, "json").unwrap();
    let defs = doc.definitions().unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(doc.as_value()["$ref"], json!("#/definitions/tree"));
    assert_eq!(
        defs["tree"]["properties"]["children"]["items"],
        json!({ "$ref": "#/definitions/tree" })
    );
}

#[test]
fn mutual_recursion_through_links() {
    let mut tree = SchemaTree::new();
    let to_b = tree.insert(SchemaNode::link("b"));
    let a = tree.insert(SchemaNode::object([("next", to_b)]).with_id("a"));
    let to_a = tree.insert(SchemaNode::link("a"));
    let b = tree.insert(SchemaNode::object([("next", to_a)]).with_id("b"));
    let root = tree.insert(SchemaNode::object([("start", a)]).share(b));

    let doc = translate(&tree, root, "json").unwrap();
    let defs = doc.definitions().unwrap();
    assert_eq!(defs.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(defs["a"]["properties"]["next"], json!({ "$ref": "#/definitions/b" }));
    assert_eq!(defs["b"]["properties"]["next"], json!({ "$ref": "#/definitions/a" }));
}

#[test]
fn anonymous_node_reached_twice_is_hoisted() {
    let mut tree = SchemaTree::new();
    let leaf = tree.insert(SchemaNode::string().describe("shared leaf"));
    let root = tree.insert(SchemaNode::object([("x", leaf), ("y", leaf)]));
    let doc = translate(&tree, root, "json").unwrap();
    let v = doc.as_value();
    assert_eq!(v["properties"]["x"], json!({ "$ref": "#/definitions/shared-1" }));
    assert_eq!(v["properties"]["y"], json!({ "$ref": "#/definitions/shared-1" }));
    assert_eq!(
        doc.definitions().unwrap()["shared-1"],
        json!({ "type": "string", "description": "shared leaf" })
    );
}

#[test]
fn shared_declaration_is_emitted_even_when_unused() {
    let mut tree = SchemaTree::new();
    let unit = tree.insert(SchemaNode::string().with_id("unit"));
    let root = tree.insert(SchemaNode::object(Vec::<(String, _)>::new()).share(unit));
    let doc = translate(&tree, root, "json").unwrap();
    assert_eq!(doc.definitions().unwrap()["unit"], json!({ "type": "string" }));
}

// ---- values ----

#[test]
fn override_replaces_earlier_values() {
    let mut tree = SchemaTree::new();
    let root = tree.insert(
        SchemaNode::string()
            .allow([json!("a"), json!("b"), json!("c")])
            .push_values(ValueOpKind::Valid, true, [json!("x"), json!("y"), json!("z")]),
    );
    let v = translate(&tree, root, "json").unwrap().into_value();
    assert_eq!(v["enum"], json!(["x", "y", "z"]));
    assert!(v.get("anyOf").is_none());
}

#[test]
fn empty_override_clears_the_value_set() {
    let mut tree = SchemaTree::new();
    let root = tree.insert(
        SchemaNode::string()
            .valid([json!("a"), json!("b")])
            .push_values(ValueOpKind::Valid, true, Vec::<Value>::new()),
    );
    let v = translate(&tree, root, "json").unwrap().into_value();
    assert!(v.get("enum").is_none());
}

#[test]
fn link_with_invalid_values_keeps_them_enforced() {
    let mut tree = SchemaTree::new();
    let s = tree.insert(SchemaNode::string().with_id("s"));
    let k = tree.insert(SchemaNode::link("#s").push_values(ValueOpKind::Invalid, false, [json!("bad")]));
    let root = tree.insert(SchemaNode::object([("s", s), ("k", k)]));

    let v = translate(&tree, root, "json").unwrap().into_value();
    assert_eq!(v["properties"]["k"]["allOf"], json!([{ "$ref": "#/definitions/s" }]));
    assert!(v["properties"]["k"].get("$ref").is_none());
    let validator = draft7(&v);
    assert!(!validator.is_valid(&json!({ "k": "bad" })));
    assert!(validator.is_valid(&json!({ "k": "fine" })));
    assert!(!validator.is_valid(&json!({ "k": 1 })));
}

#[test]
fn link_meta_wraps_only_for_asserting_keywords() {
    let meta = |v: Value| v.as_object().cloned().unwrap();
    let mut tree = SchemaTree::new();
    let s = tree.insert(SchemaNode::string().with_id("s"));
    let email = tree.insert(SchemaNode::link("#s").meta(meta(json!({ "format": "email" }))));
    let shown = tree.insert(SchemaNode::link("#s").meta(meta(json!({ "readOnly": true, "x-lookup": "s" }))));
    let root = tree.insert(SchemaNode::object([("s", s), ("email", email), ("shown", shown)]));

    let v = translate(&tree, root, "json").unwrap().into_value();
    assert_eq!(
        v["properties"]["email"],
        json!({ "allOf": [{ "$ref": "#/definitions/s" }], "format": "email" })
    );
    assert_eq!(
        v["properties"]["shown"],
        json!({ "$ref": "#/definitions/s", "readOnly": true, "x-lookup": "s" })
    );
}

// ---- combinators against a real validator ----

#[test]
fn xor_accepts_exactly_one_key() {
    let (tree, root) = object_with_rule(&["a", "b"], KeyRule::Xor(vec!["a".into(), "b".into()]));
    let schema = translate(&tree, root, "json").unwrap().into_value();
    let validator = draft7(&schema);
    assert!(!validator.is_valid(&json!({ "a": "1", "b": "2" })));
    assert!(validator.is_valid(&json!({ "a": "1" })));
    assert!(validator.is_valid(&json!({ "b": "2" })));
    assert!(!validator.is_valid(&json!({})));
}

#[test]
fn oxor_accepts_none_or_one() {
    let (tree, root) = object_with_rule(&["ip", "host"], KeyRule::Oxor(vec!["ip".into(), "host".into()]));
    let schema = translate(&tree, root, "json").unwrap().into_value();
    let validator = draft7(&schema);
    assert!(validator.is_valid(&json!({})));
    assert!(validator.is_valid(&json!({ "ip": "x" })));
    assert!(!validator.is_valid(&json!({ "ip": "x", "host": "y" })));
}

#[test]
fn and_requires_all_once_any_is_present() {
    let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let (tree, root) = object_with_rule(&["a", "b", "c"], KeyRule::And(keys));
    let schema = translate(&tree, root, "json").unwrap().into_value();
    let validator = draft7(&schema);
    assert!(validator.is_valid(&json!({})));
    assert!(validator.is_valid(&json!({ "a": "", "b": "", "c": "" })));
    assert!(!validator.is_valid(&json!({ "a": "", "c": "" })));
}

#[test]
fn nand_rejects_all_together() {
    let (tree, root) = object_with_rule(&["a", "b"], KeyRule::Nand(vec!["a".into(), "b".into()]));
    let schema = translate(&tree, root, "json").unwrap().into_value();
    let validator = draft7(&schema);
    assert!(validator.is_valid(&json!({ "a": "" })));
    assert!(!validator.is_valid(&json!({ "a": "", "b": "" })));
}

#[test]
fn with_and_without_are_presence_dependencies() {
    let mut tree = SchemaTree::new();
    let children: Vec<(String, _)> = ["t", "d", "w"]
        .iter()
        .map(|k| (k.to_string(), tree.insert(SchemaNode::string())))
        .collect();
    let mut obj = SchemaNode::object(children);
    let rules = &mut obj.object_rules_mut().unwrap().rules;
    rules.push(KeyRule::With { key: "t".into(), peers: vec!["d".into()] });
    rules.push(KeyRule::Without { key: "d".into(), peers: vec!["w".into()] });
    let root = tree.insert(obj);
    let schema = translate(&tree, root, "json").unwrap().into_value();
    let validator = draft7(&schema);
    assert!(validator.is_valid(&json!({ "t": "", "d": "" })));
    assert!(!validator.is_valid(&json!({ "t": "" })));
    assert!(!validator.is_valid(&json!({ "d": "", "w": "" })));
    assert!(validator.is_valid(&json!({ "w": "" })));
}

// ---- errors ----

#[test]
fn two_nodes_under_one_id_fail() {
    let mut tree = SchemaTree::new();
    let a = tree.insert(SchemaNode::string().with_id("dup"));
    let b = tree.insert(SchemaNode::number().with_id("dup"));
    let root = tree.insert(SchemaNode::object([("a", a), ("b", b)]));
    let err = translate(&tree, root, "json").unwrap_err();
    assert!(matches!(err, Error::DuplicateId { ref id } if id == "dup"));
}

#[test]
fn dangling_link_fails() {
    let mut tree = SchemaTree::new();
    let ghost = tree.insert(SchemaNode::link("#ghost"));
    let root = tree.insert(SchemaNode::object([("g", ghost)]));
    let err = translate(&tree, root, "json").unwrap_err();
    assert!(matches!(err, Error::UnresolvedLink { ref id } if id == "ghost"));
}

#[test]
fn unsupported_target_fails_before_walking() {
    let mut tree = SchemaTree::new();
    let root = tree.insert(SchemaNode::any());
    let err = translate(&tree, root, "open-api").unwrap_err();
    assert!(matches!(err, Error::UnsupportedTarget(ref t) if t == "open-api"));
}

#[test]
fn switch_case_without_is_is_malformed() {
    let mut tree = SchemaTree::new();
    let then = tree.insert(SchemaNode::string());
    let root = tree.insert(SchemaNode::conditional(
        Subject::Key("k".into()),
        ConditionalForm::Switch {
            cases: vec![SwitchCase { is: None, then: Some(then) }],
            otherwise: None,
        },
    ));
    let err = translate(&tree, root, "json").unwrap_err();
    assert!(matches!(err, Error::MalformedConditional { .. }));
}

#[test]
fn rule_on_missing_key_fails() {
    let (tree, root) = object_with_rule(&["a"], KeyRule::Or(vec!["a".into(), "zzz".into()]));
    let err = translate(&tree, root, "json").unwrap_err();
    assert!(matches!(err, Error::UnknownCombinatorKey { rule: "or", ref key } if key == "zzz"));
}

// ---- determinism ----

fn leaf(kind: u8) -> SchemaNode {
    match kind {
        0 => SchemaNode::string(),
        1 => SchemaNode::number().valid([json!(1), json!(2)]),
        2 => SchemaNode::boolean().required(),
        3 => SchemaNode::any().describe("anything"),
        _ => SchemaNode::string().allow([Value::Null]),
    }
}

proptest! {
    #[test]
    fn translation_is_deterministic_and_refs_resolve(
        kinds in proptest::collection::vec(0u8..5, 1..12),
        reuse in proptest::collection::vec(any::<bool>(), 12),
    ) {
        let mut tree = SchemaTree::new();
        let mut children = Vec::new();
        let mut last = None;
        for (i, k) in kinds.iter().enumerate() {
            let id = match (reuse[i], last) {
                (true, Some(prev)) => prev,
                _ => tree.insert(leaf(*k)),
            };
            last = Some(id);
            children.push((format!("k{i}"), id));
        }
        let root = tree.insert(SchemaNode::object(children));

        let first = translate(&tree, root, "json").unwrap();
        let second = translate(&tree, root, "json").unwrap();
        prop_assert_eq!(first.to_string_pretty().unwrap(), second.to_string_pretty().unwrap());

        let defs = first.definitions().cloned().unwrap_or_default();
        for (_, prop) in first.as_value()["properties"].as_object().unwrap() {
            if let Some(Value::String(ptr)) = prop.get("$ref") {
                let name = ptr.trim_start_matches("#/definitions/");
                prop_assert!(defs.contains_key(name));
            }
        }
    }
}
