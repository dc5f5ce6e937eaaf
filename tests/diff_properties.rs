// Diff and pitch properties over generated inputs
#![cfg(not(target_arch = "wasm32"))]

use ear_staff_wasm::interaction::{apply_diff, diff_sequences, DiffKind, PitchQuantizer, QuantizeRequest};
use ear_staff_wasm::interaction::quantizer::PitchClassSet;
use ear_staff_wasm::models::key_signature::decide_accidental_for_key;
use ear_staff_wasm::models::pitch::{midi_to_pitch_spec, parse_pitch_token, token_to_midi};
use ear_staff_wasm::models::{Accidental, KeySignature, SpellingPreference};
use proptest::prelude::*;
use proptest::sample::Index;

fn token(preference: SpellingPreference) -> impl Strategy<Value = String> {
    (48i32..84).prop_map(move |midi| midi_to_pitch_spec(midi, preference).token())
}

fn sequence(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(token(SpellingPreference::Flat), 0..=max_len)
}

fn preference() -> impl Strategy<Value = SpellingPreference> {
    prop_oneof![Just(SpellingPreference::Flat), Just(SpellingPreference::Sharp)]
}

#[derive(Debug, Clone)]
enum Edit {
    Insert(Index, String),
    Remove(Index),
    Replace(Index, String),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<Index>(), token(SpellingPreference::Sharp)).prop_map(|(at, t)| Edit::Insert(at, t)),
        any::<Index>().prop_map(Edit::Remove),
        (any::<Index>(), token(SpellingPreference::Sharp)).prop_map(|(at, t)| Edit::Replace(at, t)),
    ]
}

/// Apply one structural edit; removing from or replacing in an empty sequence appends
fn apply_edit(prev: &[String], edit: &Edit) -> Vec<String> {
    let mut next = prev.to_vec();
    match edit {
        Edit::Insert(at, t) => next.insert(at.index(next.len() + 1), t.clone()),
        Edit::Remove(at) if !next.is_empty() => {
            next.remove(at.index(next.len()));
        }
        Edit::Replace(at, t) if !next.is_empty() => {
            let i = at.index(next.len());
            next[i] = t.clone();
        }
        Edit::Remove(_) => next.push("C4".to_string()),
        Edit::Replace(_, t) => next.push(t.clone()),
    }
    next
}

fn own_alteration(accidental: Option<Accidental>) -> i32 {
    match accidental {
        Some(Accidental::Sharp) => 1,
        Some(Accidental::Flat) => -1,
        _ => 0,
    }
}

proptest! {
    #[test]
    fn diff_of_identical_sequences_is_empty(seq in sequence(12)) {
        prop_assert!(diff_sequences(&seq, &seq).is_empty());
    }

    #[test]
    fn apply_diff_reconstructs_next(prev in sequence(10), next in sequence(10)) {
        let diffs = diff_sequences(&prev, &next);
        prop_assert_eq!(apply_diff(&prev, &diffs), next);
    }

    #[test]
    fn single_edit_diff_shape(prev in sequence(8), edit in edit()) {
        let next = apply_edit(&prev, &edit);
        let diffs = diff_sequences(&prev, &next);

        let inserts = diffs.iter().filter(|d| d.kind == DiffKind::Insert).count();
        let deletes = diffs.iter().filter(|d| d.kind == DiffKind::Delete).count();
        prop_assert!(inserts + deletes <= 1, "{:?} -> {:?}: {:?}", prev, next, diffs);
        if next.len() > prev.len() {
            prop_assert_eq!(inserts, 1);
            prop_assert_eq!(diffs.last().map(|d| d.index), Some(prev.len()));
        }
        if next.len() < prev.len() {
            prop_assert_eq!(deletes, 1);
            prop_assert_eq!(diffs.last().map(|d| d.index), Some(next.len()));
        }
        prop_assert_eq!(apply_diff(&prev, &diffs), next);
    }

    #[test]
    fn diff_indices_ascend(prev in sequence(10), next in sequence(10)) {
        let indices: Vec<usize> = diff_sequences(&prev, &next).iter().map(|d| d.index).collect();
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]), "{:?}", indices);
    }

    #[test]
    fn spelling_round_trips_midi(midi in 0i32..=127, preference in preference()) {
        let spec = midi_to_pitch_spec(midi, preference);
        prop_assert_eq!(spec.midi(), midi);
        prop_assert_eq!(token_to_midi(&spec.token()), Some(midi));
        prop_assert_eq!(parse_pitch_token(&spec.token()), Some(spec));
    }

    #[test]
    fn key_accidental_is_none_only_when_key_agrees(
        key in prop::sample::select(KeySignature::ALL.to_vec()),
        midi in 36i32..96,
        preference in preference(),
    ) {
        let spec = midi_to_pitch_spec(midi, preference);
        let own = own_alteration(spec.accidental);
        let shown = decide_accidental_for_key(&spec, Some(key));
        prop_assert_eq!(shown.is_none(), own == key.alteration(spec.letter), "{} in {:?}", spec, key);
        if shown.is_some() && own == 0 {
            prop_assert_eq!(shown, Some(Accidental::Natural));
        }
    }

    #[test]
    fn quantizer_output_is_always_allowed(
        classes in prop::collection::vec(0i32..12, 1..=6),
        requests in prop::collection::vec((30i32..100, 40i32..90, -1i32..=1, 40i32..90), 1..20),
    ) {
        let quantizer = PitchQuantizer::new(PitchClassSet::from_integers(&classes), 40, 90).unwrap();
        for (preview_midi, last_midi, direction, base_midi) in requests {
            let request = QuantizeRequest {
                preview_midi,
                last_midi: Some(last_midi),
                direction,
                base_midi,
            };
            let midi = quantizer.quantize(request);
            prop_assert!((40..=90).contains(&midi), "{:?} -> {}", request, midi);
            prop_assert!(classes.contains(&midi.rem_euclid(12)), "{:?} -> {}", request, midi);
        }
    }
}
