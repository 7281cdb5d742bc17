//! Concrete shanten and outs cases for hands written in tile notation.

mod common;

use common::{evaluator, hand, tiles};
use jantaku_engine::hand_evaluator::{distinct_codes, shanten_chiitoitsu, shanten_kokushi};
use jantaku_engine::tile::{next_dora_code, ORPHAN_CODES};
use jantaku_engine::Archetype;

#[test]
fn tenpai_waiting_on_two_sides() {
    let ev = evaluator();
    let held = tiles("111222m333p45s11z");
    assert_eq!(ev.shanten_minimum(&hand("111222m333p45s11z")), 0);
    let outs = ev.outs(&held);
    // 3s and 6s.
    assert_eq!(distinct_codes(&outs.normal), vec![20, 23]);
    assert_eq!(outs.normal.len(), 8);
    assert_eq!(ev.count_minimum_outs(&held), 8);
}

#[test]
fn scattered_hand_is_three_away() {
    let ev = evaluator();
    assert_eq!(ev.shanten_minimum(&hand("128m555889p357s1z")), 3);
}

#[test]
fn scattered_hand_outs() {
    let ev = evaluator();
    let held = tiles("128m555899p357s1z");
    let breakdown = ev.shanten(&hand("128m555899p357s1z"));
    assert_eq!(breakdown.minimum(), 3);
    let outs = ev.outs(&held);
    assert_eq!(distinct_codes(&outs.normal).len(), 19);
    assert_eq!(outs.normal.len(), 68);
}

#[test]
fn seven_pairs_near_hand() {
    let ev = evaluator();
    let near = hand("112288m3355p4s15z");
    assert_eq!(shanten_chiitoitsu(&near), 1);
    assert!(ev.shanten_minimum(&near) <= 1);
    let outs = ev.outs(&tiles("112288m3355p4s15z"));
    // 4s, East and White: three unheld copies each.
    assert_eq!(distinct_codes(&outs.chiitoitsu), vec![21, 27, 31]);
    assert_eq!(outs.chiitoitsu.len(), 9);
}

#[test]
fn tied_archetypes_count_shared_outs_once() {
    let ev = evaluator();
    // 123m and 456p twice each plus 7s: normal and seven pairs both
    // wait on the single 7s.
    let held = tiles("112233m445566p7s");
    let breakdown = ev.shanten(&hand("112233m445566p7s"));
    assert_eq!(breakdown.best(), vec![Archetype::Normal, Archetype::Chiitoitsu]);
    let outs = ev.outs(&held);
    assert_eq!(outs.normal.len(), 3);
    assert_eq!(outs.chiitoitsu.len(), 3);
    assert_eq!(ev.count_minimum_outs(&held), 3);
}

#[test]
fn thirteen_orphans_without_pair() {
    let ev = evaluator();
    let held = tiles("19m19p19s1234567z");
    assert_eq!(shanten_kokushi(&hand("19m19p19s1234567z")), 0);
    let outs = ev.outs(&held);
    assert_eq!(distinct_codes(&outs.kokushi), ORPHAN_CODES.to_vec());
    assert_eq!(outs.kokushi.len(), 39);
    assert_eq!(ev.shanten(&hand("19m19p19s1234567z")).best(), vec![Archetype::Kokushi]);
}

#[test]
fn thirteen_orphans_with_pair_waits_on_missing_code() {
    let ev = evaluator();
    let outs = ev.outs(&tiles("119m19p19s123456z"));
    // Only Red is missing, and no copy of it is held.
    assert_eq!(distinct_codes(&outs.kokushi), vec![33]);
    assert_eq!(outs.kokushi.len(), 4);
}

#[test]
fn winning_shapes_are_agari() {
    let ev = evaluator();
    for notation in [
        "123456789m11p234s",
        "1122m3344p5566s77z",
        "119m19p19s1234567z",
        "111m222p333s444z55z",
    ] {
        assert!(ev.is_agari(&hand(notation)), "{notation} should be complete");
    }
}

#[test]
fn outs_never_include_held_tiles_or_full_codes() {
    let ev = evaluator();
    let held = tiles("1111m234p567s789s1z");
    let outs = ev.outs(&held);
    for tile in outs.normal.iter().chain(&outs.chiitoitsu).chain(&outs.kokushi) {
        assert!(!held.contains(tile));
        assert_ne!(tile.code(), 0);
    }
}

#[test]
fn drawn_hand_has_no_counted_outs() {
    let ev = evaluator();
    assert_eq!(ev.count_minimum_outs(&tiles("111222m333p45s11z9m")), 0);
}

#[test]
fn dora_successors() {
    // 9m -> 1m, North -> East, Red -> White, 5s -> 6s.
    assert_eq!(next_dora_code(8), 0);
    assert_eq!(next_dora_code(30), 27);
    assert_eq!(next_dora_code(33), 31);
    assert_eq!(next_dora_code(22), 23);
}
