//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Policy evaluation rule order
//! - Subtree atomicity of exclusion
//! - Order preservation and idempotence of pruning

use crate::engine::{FileOutcome, Pruner, prune, prune_file};
use crate::model::{Enum, EnumValue, Field, Member, Message, OneOf, SchemaFile, Service};
use crate::node::NodeMut;
use crate::policy::{ActiveTerms, Policy, decide, evaluate};
use crate::test_support::{field, method};
use crate::validate::join;
use proptest::prelude::*;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

const TERMS: [&str; 4] = ["public", "internal", "beta", "partner"];

fn arb_term() -> impl Strategy<Value = String> {
    prop::sample::select(TERMS.to_vec()).prop_map(str::to_string)
}

fn arb_terms() -> impl Strategy<Value = ActiveTerms> {
    prop::collection::vec(arb_term(), 0..3).prop_map(ActiveTerms::new)
}

fn arb_policy() -> impl Strategy<Value = Option<Policy>> {
    prop_oneof![
        2 => Just(None),
        3 => (
            prop::collection::vec(arb_term(), 0..3),
            prop::collection::vec(arb_term(), 0..3),
        )
            .prop_map(|(include, exclude)| Some(Policy { include, exclude })),
    ]
}

fn arb_field() -> impl Strategy<Value = Field> {
    arb_policy().prop_map(|policy| Field {
        policy,
        ..field("", 0)
    })
}

/// The zero value carries no policy, so the enum can neither become empty
/// nor lose its proto3 zero value.
fn arb_enum() -> impl Strategy<Value = Enum> {
    (arb_policy(), prop::collection::vec(arb_policy(), 0..4)).prop_map(|(policy, rest)| {
        let mut en = Enum::new("");
        en.policy = policy;
        en.values.push(EnumValue::new("V0", 0));
        for (idx, value_policy) in rest.into_iter().enumerate() {
            let number = idx as i32 + 1;
            let mut value = EnumValue::new(format!("V{number}"), number);
            value.policy = value_policy;
            en.values.push(value);
        }
        en
    })
}

/// As with enums, the first choice is unconditional.
fn arb_oneof() -> impl Strategy<Value = OneOf> {
    (arb_policy(), prop::collection::vec(arb_policy(), 0..3)).prop_map(|(policy, rest)| {
        let mut oneof = OneOf::new("");
        oneof.policy = policy;
        oneof.choices.push(field("", 0));
        for choice_policy in rest {
            oneof.choices.push(Field {
                policy: choice_policy,
                ..field("", 0)
            });
        }
        oneof
    })
}

fn assemble_message(
    policy: Option<Policy>,
    fields: Vec<Field>,
    oneofs: Vec<OneOf>,
    enums: Vec<Enum>,
    nested: Vec<Message>,
) -> Message {
    let mut msg = Message::new("");
    msg.policy = policy;
    let mut number = 0;
    for (idx, mut f) in fields.into_iter().enumerate() {
        number += 1;
        f.name = format!("f{idx}");
        f.number = number;
        msg.members.push(Member::Field(f));
    }
    for (idx, mut oneof) in oneofs.into_iter().enumerate() {
        oneof.name = format!("o{idx}");
        for (choice_idx, choice) in oneof.choices.iter_mut().enumerate() {
            number += 1;
            choice.name = format!("o{idx}_c{choice_idx}");
            choice.number = number;
        }
        // Interleave: a oneof goes in front of the last plain field.
        let at = msg.members.len().saturating_sub(1);
        msg.members.insert(at, Member::OneOf(oneof));
    }
    for (idx, mut en) in enums.into_iter().enumerate() {
        en.name = format!("E{idx}");
        msg.enums.push(en);
    }
    for (idx, mut inner) in nested.into_iter().enumerate() {
        inner.name = format!("M{idx}");
        msg.messages.push(inner);
    }
    msg
}

fn arb_message() -> impl Strategy<Value = Message> {
    let leaf = (
        arb_policy(),
        prop::collection::vec(arb_field(), 0..4),
        prop::collection::vec(arb_oneof(), 0..2),
        prop::collection::vec(arb_enum(), 0..2),
    )
        .prop_map(|(policy, fields, oneofs, enums)| {
            assemble_message(policy, fields, oneofs, enums, Vec::new())
        });

    leaf.prop_recursive(3, 24, 3, |inner| {
        (
            arb_policy(),
            prop::collection::vec(arb_field(), 0..4),
            prop::collection::vec(arb_oneof(), 0..2),
            prop::collection::vec(arb_enum(), 0..2),
            prop::collection::vec(inner, 0..3),
        )
            .prop_map(|(policy, fields, oneofs, enums, nested)| {
                assemble_message(policy, fields, oneofs, enums, nested)
            })
    })
}

fn arb_service() -> impl Strategy<Value = Service> {
    (arb_policy(), prop::collection::vec(arb_policy(), 0..4)).prop_map(|(policy, methods)| {
        let mut svc = Service::new("");
        svc.policy = policy;
        for (idx, method_policy) in methods.into_iter().enumerate() {
            let mut m = method(&format!("Call{idx}"));
            m.policy = method_policy;
            svc.methods.push(m);
        }
        svc
    })
}

/// A file whose own root carries no policy, so it is never dropped.
fn arb_file() -> impl Strategy<Value = SchemaFile> {
    (
        prop::collection::vec(arb_message(), 0..4),
        prop::collection::vec(arb_enum(), 0..2),
        prop::collection::vec(arb_service(), 0..2),
    )
        .prop_map(|(messages, enums, services)| {
            let mut file = SchemaFile::new("generated.proto");
            file.package = Some("pkg".to_string());
            for (idx, mut msg) in messages.into_iter().enumerate() {
                msg.name = format!("Top{idx}");
                file.messages.push(msg);
            }
            for (idx, mut en) in enums.into_iter().enumerate() {
                en.name = format!("TopEnum{idx}");
                file.enums.push(en);
            }
            for (idx, mut svc) in services.into_iter().enumerate() {
                svc.name = format!("Svc{idx}");
                file.services.push(svc);
            }
            file
        })
}

// ============================================================================
// Helpers
// ============================================================================

/// Pre-order list of `kind:path` entries for everything in the tree.
fn outline(file: &SchemaFile) -> Vec<String> {
    let mut out = Vec::new();
    let scope = file.package_name();
    for msg in &file.messages {
        outline_message(msg, scope, &mut out);
    }
    for en in &file.enums {
        outline_enum(en, scope, &mut out);
    }
    for svc in &file.services {
        let path = join(scope, &svc.name);
        out.push(format!("service:{path}"));
        for m in &svc.methods {
            out.push(format!("method:{}", join(&path, &m.name)));
        }
    }
    out
}

fn outline_message(msg: &Message, scope: &str, out: &mut Vec<String>) {
    let path = join(scope, &msg.name);
    out.push(format!("message:{path}"));
    for member in &msg.members {
        match member {
            Member::Field(f) => out.push(format!("field:{}", join(&path, &f.name))),
            Member::OneOf(o) => {
                let oneof_path = join(&path, &o.name);
                out.push(format!("oneof:{oneof_path}"));
                for choice in &o.choices {
                    out.push(format!("choice:{}", join(&oneof_path, &choice.name)));
                }
            }
        }
    }
    for nested in &msg.messages {
        outline_message(nested, &path, out);
    }
    for en in &msg.enums {
        outline_enum(en, &path, out);
    }
}

fn outline_enum(en: &Enum, scope: &str, out: &mut Vec<String>) {
    let path = join(scope, &en.name);
    out.push(format!("enum:{path}"));
    for value in &en.values {
        out.push(format!("value:{}", join(&path, &value.name)));
    }
}

fn is_subsequence(short: &[String], long: &[String]) -> bool {
    let mut rest = long.iter();
    short.iter().all(|item| rest.any(|candidate| candidate == item))
}

/// Every policy still present in the tree, file root excluded.
fn surviving_policies(file: &SchemaFile) -> Vec<Option<Policy>> {
    fn from_message(msg: &Message, out: &mut Vec<Option<Policy>>) {
        out.push(msg.policy.clone());
        for member in &msg.members {
            match member {
                Member::Field(f) => out.push(f.policy.clone()),
                Member::OneOf(o) => {
                    out.push(o.policy.clone());
                    out.extend(o.choices.iter().map(|c| c.policy.clone()));
                }
            }
        }
        for nested in &msg.messages {
            from_message(nested, out);
        }
        for en in &msg.enums {
            from_enum(en, out);
        }
    }

    fn from_enum(en: &Enum, out: &mut Vec<Option<Policy>>) {
        out.push(en.policy.clone());
        out.extend(en.values.iter().map(|v| v.policy.clone()));
    }

    let mut out = Vec::new();
    for msg in &file.messages {
        from_message(msg, &mut out);
    }
    for en in &file.enums {
        from_enum(en, &mut out);
    }
    for svc in &file.services {
        out.push(svc.policy.clone());
        out.extend(svc.methods.iter().map(|m| m.policy.clone()));
    }
    out
}

// ============================================================================
// Property tests: Policy evaluation
// ============================================================================

proptest! {
    #[test]
    fn nodes_without_policy_are_kept(terms in arb_terms()) {
        prop_assert!(!decide(None, &terms));
    }

    #[test]
    fn exclude_takes_precedence_over_include(
        term in arb_term(),
        include in prop::collection::vec(arb_term(), 0..3),
        exclude in prop::collection::vec(arb_term(), 0..3),
    ) {
        let mut policy = Policy { include, exclude };
        policy.include.push(term.clone());
        policy.exclude.push(term.clone());

        prop_assert!(decide(Some(&policy), &ActiveTerms::new([term])));
    }

    #[test]
    fn allow_list_excludes_when_no_term_matches(
        include in prop::collection::vec(prop::sample::select(vec!["alpha", "omega"]), 1..3),
        terms in prop::collection::vec(arb_term(), 1..3),
    ) {
        let policy = Policy::include(include);
        prop_assert!(decide(Some(&policy), &ActiveTerms::new(terms)));
    }

    #[test]
    fn empty_term_set_never_excludes(policy in arb_policy()) {
        prop_assert!(!decide(policy.as_ref(), &ActiveTerms::default()));
    }
}

// ============================================================================
// Property tests: Pruning
// ============================================================================

proptest! {
    #[test]
    fn excluded_parent_is_removed_without_inspecting_children(
        mut msg in arb_message(),
        terms in prop::collection::vec(arb_term(), 1..3),
    ) {
        let terms = ActiveTerms::new(terms);
        let trigger = terms.iter().next().unwrap_or("public").to_string();
        msg.name = "Parent".to_string();
        msg.policy = Some(Policy::exclude([trigger]));
        // Would fail node validation if the walk descended into it.
        msg.enums.push(Enum::new("Unvisited"));
        let before = msg.members.len() + msg.messages.len() + msg.enums.len();

        let mut pruner = Pruner::new(&terms);
        let removed = pruner.prune(NodeMut::Message(&mut msg), "pkg");

        prop_assert_eq!(removed, Ok(true));
        prop_assert!(pruner.removed().is_empty());
        prop_assert_eq!(msg.members.len() + msg.messages.len() + msg.enums.len(), before);
    }

    #[test]
    fn surviving_nodes_keep_their_relative_order(
        file in arb_file(),
        terms in arb_terms(),
    ) {
        let before = outline(&file);
        let mut pruned = file.clone();
        let outcome = prune_file(&mut pruned, &terms);

        let kept = matches!(outcome, Ok(FileOutcome::Kept { .. }));
        prop_assert!(kept, "file must be kept, got {:?}", outcome);
        let after = outline(&pruned);
        prop_assert!(after.len() <= before.len());
        prop_assert!(is_subsequence(&after, &before), "{after:?} is not ordered like {before:?}");
    }

    #[test]
    fn every_surviving_node_passes_its_policy(
        mut file in arb_file(),
        terms in arb_terms(),
    ) {
        prune_file(&mut file, &terms).expect("generated trees stay valid");
        for policy in surviving_policies(&file) {
            prop_assert!(!evaluate(policy.as_ref(), &terms).is_excluded());
        }
    }

    #[test]
    fn pruning_twice_changes_nothing(
        mut file in arb_file(),
        terms in arb_terms(),
    ) {
        prune_file(&mut file, &terms).expect("first pass");
        let once = outline(&file);

        let second = prune_file(&mut file, &terms).expect("second pass");

        prop_assert_eq!(second, FileOutcome::Kept { removed: Vec::new() });
        prop_assert_eq!(outline(&file), once);
    }

    #[test]
    fn no_terms_keep_the_whole_tree(file in arb_file()) {
        let before = outline(&file);
        let mut pruned = file.clone();
        let excluded = prune(NodeMut::File(&mut pruned), &ActiveTerms::default());

        prop_assert_eq!(excluded, Ok(false));
        prop_assert_eq!(outline(&pruned), before);
    }
}
