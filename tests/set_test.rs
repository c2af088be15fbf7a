/*!
 * Signal Set Tests
 * Value-type algebra, name resolution and serialization
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sigtramp::{MaskHow, SignalError, SignalKind, SignalSet};

fn kinds() -> Vec<SignalKind> {
    SignalKind::iter().collect()
}

fn arb_set() -> impl Strategy<Value = SignalSet> {
    any::<u64>().prop_map(|mask| {
        let all = kinds();
        SignalSet::from_kinds(
            all.iter()
                .copied()
                .enumerate()
                .filter(|(i, _)| mask & (1u64 << (i % 64)) != 0)
                .map(|(_, kind)| kind),
        )
    })
}

#[test]
fn empty_and_full_are_complements() {
    assert_eq!(SignalSet::empty().complement(), SignalSet::full());
    assert_eq!(SignalSet::full().complement(), SignalSet::empty());
    assert!(SignalSet::empty().is_empty());
    assert_eq!(SignalSet::full().len(), kinds().len());
}

#[test]
fn build_starts_empty_and_adds() {
    let set = SignalSet::build(false, ["int", "term"]).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.contains_name("int").unwrap());
    assert!(set.contains_name("terminate").unwrap());
    assert!(!set.contains_name("hup").unwrap());
}

#[test]
fn build_starts_full_and_removes() {
    let set = SignalSet::build(true, ["int"]).unwrap();
    assert!(!set.contains_name("int").unwrap());
    assert!(set.contains_name("term").unwrap());
    assert_eq!(set.len(), kinds().len() - 1);
}

#[test]
fn build_rejects_unknown_name() {
    assert!(matches!(
        SignalSet::build(false, ["nonesuch"]),
        Err(SignalError::InvalidSignal(_))
    ));
}

#[test]
fn contains_name_rejects_unknown_name() {
    let set = SignalSet::empty();
    assert!(matches!(
        set.contains_name("nonesuch"),
        Err(SignalError::InvalidSignal(_))
    ));
}

#[test]
fn algebra_returns_new_sets_without_mutating_inputs() {
    let a = SignalSet::build(false, ["int", "term"]).unwrap();
    let b = SignalSet::build(false, ["term", "hup"]).unwrap();

    let union = a | b;
    let difference = a - b;

    assert_eq!(a, SignalSet::build(false, ["int", "term"]).unwrap());
    assert_eq!(b, SignalSet::build(false, ["term", "hup"]).unwrap());
    assert_eq!(union.len(), 3);
    assert_eq!(difference, SignalSet::build(false, ["int"]).unwrap());
}

#[test]
fn set_name_toggles_membership() {
    let mut set = SignalSet::empty();
    set.set_name("usr1", true).unwrap();
    assert!(set.contains_name("user1").unwrap());
    set.set_name("USR1", false).unwrap();
    assert!(set.is_empty());
}

#[test]
fn iteration_is_ascending_numeric() {
    let numbers: Vec<i32> = SignalSet::full().iter().map(SignalKind::number).collect();
    for pair in numbers.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn display_lists_canonical_names() {
    let set = SignalSet::build(false, ["term", "interrupt"]).unwrap();
    let text = set.to_string();
    assert!(text.contains("int"));
    assert!(text.contains("term"));
    assert!(text.starts_with('{') && text.ends_with('}'));
}

#[test]
fn set_serde_round_trips_by_name() {
    let set = SignalSet::build(false, ["int", "term", "hup"]).unwrap();
    let json = serde_json::to_string(&set).unwrap();
    let back: SignalSet = serde_json::from_str(&json).unwrap();
    assert_eq!(back, set);
}

#[test]
fn kind_serde_round_trips_by_name() {
    let kind = SignalKind::from_name("winch").unwrap();
    let json = serde_json::to_string(&kind).unwrap();
    assert_eq!(json, "\"winch\"");
    let back: SignalKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, kind);
}

#[test]
fn mask_how_parses_script_names() {
    assert_eq!(MaskHow::from_name("block").unwrap(), MaskHow::Block);
    assert_eq!(MaskHow::from_name("unblock").unwrap(), MaskHow::Unblock);
    assert_eq!(MaskHow::from_name("set").unwrap(), MaskHow::Set);
    assert!(matches!(
        MaskHow::from_name("sideways"),
        Err(SignalError::InvalidMaskOp(_))
    ));
}

#[test]
fn defined_covers_synonyms_case_insensitively() {
    assert!(SignalKind::defined("INT"));
    assert!(SignalKind::defined("Interrupt"));
    assert!(SignalKind::defined("windowchange"));
    assert!(!SignalKind::defined("sigmund"));
}

proptest! {
    #[test]
    fn union_is_commutative(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(a | b, b | a);
    }

    #[test]
    fn union_is_associative(a in arb_set(), b in arb_set(), c in arb_set()) {
        prop_assert_eq!((a | b) | c, a | (b | c));
    }

    #[test]
    fn difference_with_self_is_empty(a in arb_set()) {
        prop_assert_eq!(a - a, SignalSet::empty());
    }

    #[test]
    fn complement_is_involutive(a in arb_set()) {
        prop_assert_eq!(!!a, a);
    }
}
