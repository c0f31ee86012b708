//! Turn selection.
//!
//! Decides who speaks next from the transcript tail: the hidden AI, a
//! random simulated human, or nobody. Pure; the caller generates and
//! appends the line.

use super::participant::{Participant, Roster};
use super::transcript::{Transcript, TranscriptEntry};
use rand::Rng;
use rand::seq::IndexedRandom;

pub const QUESTION_PROBABILITY: f64 = 0.7;
pub const REPLY_TO_LOCAL_PROBABILITY: f64 = 0.5;
pub const BASE_PROBABILITY: f64 = 0.25;

/// Who was picked to speak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub speaker: Participant,
    pub is_hidden_ai: bool,
}

/// `?`, "what", "how" or "why" anywhere in the text, case-insensitive.
pub fn contains_question(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains('?') || lower.contains("what") || lower.contains("how") || lower.contains("why")
}

/// Chance that the hidden AI takes this turn, given the last entry.
pub fn response_probability(last: Option<&TranscriptEntry>) -> f64 {
    match last {
        Some(entry) if contains_question(&entry.text) => QUESTION_PROBABILITY,
        Some(entry) if entry.is_local_user => REPLY_TO_LOCAL_PROBABILITY,
        _ => BASE_PROBABILITY,
    }
}

/// Non-local participants who did not speak recently. Falls back to every
/// non-local participant when that leaves nobody.
pub fn available_responders<'a>(roster: &'a Roster, recent_senders: &[&str]) -> Vec<&'a Participant> {
    let fresh: Vec<&Participant> = roster
        .participants()
        .iter()
        .filter(|p| !p.is_local_user && !recent_senders.contains(&p.display_name.as_str()))
        .collect();
    if !fresh.is_empty() {
        return fresh;
    }
    roster
        .participants()
        .iter()
        .filter(|p| !p.is_local_user)
        .collect()
}

/// Pick the next speaker, or `None` when no one can respond.
pub fn select_speaker(
    roster: &Roster,
    transcript: &Transcript,
    recent_window: usize,
    rng: &mut impl Rng,
) -> Option<Selection> {
    let recent = transcript.recent_senders(recent_window);
    let available = available_responders(roster, &recent);
    let ai_available = available.iter().any(|p| p.is_hidden_ai);

    let probability = response_probability(transcript.last());
    let draw: f64 = rng.random();

    if ai_available && draw < probability {
        return Some(Selection {
            speaker: roster.hidden_ai().clone(),
            is_hidden_ai: true,
        });
    }

    let humans: Vec<&Participant> = available.into_iter().filter(|p| !p.is_hidden_ai).collect();
    humans.choose(rng).map(|p| Selection {
        speaker: (*p).clone(),
        is_hidden_ai: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Address;
    use proptest::prelude::*;
    use rstest::rstest;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn roster(seed: u64, total: usize) -> Roster {
        let mut rng = StdRng::seed_from_u64(seed);
        let local = Address::new(format!("0x{:040x}", 1));
        Roster::build(vec![], &local, total, &mut rng).unwrap()
    }

    #[rstest]
    #[case("Who is it?", true)]
    #[case("WHAT do you think", true)]
    #[case("somehow", true)]
    #[case("hello there", false)]
    fn test_question_detection(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(contains_question(text), expected);
    }

    #[test]
    fn test_response_probability() {
        let mut t = Transcript::new();
        assert_eq!(response_probability(t.last()), BASE_PROBABILITY);
        t.append("Player 1", "hello", false, true);
        assert_eq!(response_probability(t.last()), REPLY_TO_LOCAL_PROBABILITY);
        t.append("Player 2", "why though", false, false);
        assert_eq!(response_probability(t.last()), QUESTION_PROBABILITY);
        t.append("Player 3", "ok", false, false);
        assert_eq!(response_probability(t.last()), BASE_PROBABILITY);
    }

    #[test]
    fn test_recent_senders_excluded() {
        let r = roster(4, 10);
        let recent: Vec<&str> = r
            .participants()
            .iter()
            .filter(|p| !p.is_local_user)
            .take(4)
            .map(|p| p.display_name.as_str())
            .collect();
        let available = available_responders(&r, &recent);
        assert_eq!(available.len(), 5);
        assert!(available.iter().all(|p| !recent.contains(&p.display_name.as_str())));
    }

    #[test]
    fn test_exclusion_relaxed_when_everyone_spoke() {
        let r = roster(5, 3);
        let recent: Vec<&str> = r
            .participants()
            .iter()
            .map(|p| p.display_name.as_str())
            .collect();
        let available = available_responders(&r, &recent);
        assert_eq!(available.len(), 2);
        assert!(available.iter().all(|p| !p.is_local_user));
    }

    #[test]
    fn test_two_player_roster_only_ai_can_speak() {
        let r = roster(9, 2);
        let t = Transcript::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ai_turns = 0;
        for _ in 0..100 {
            match select_speaker(&r, &t, 4, &mut rng) {
                Some(sel) => {
                    assert!(sel.is_hidden_ai);
                    ai_turns += 1;
                }
                None => {}
            }
        }
        // Base probability is 0.25; the rest of the draws find no human.
        assert!(ai_turns > 5 && ai_turns < 60);
    }

    #[test]
    fn test_question_favours_hidden_ai() {
        let r = roster(11, 10);
        let mut t = Transcript::new();
        t.append(r.local().display_name.clone(), "who is the bot?", false, true);
        let mut rng = StdRng::seed_from_u64(42);
        let ai = (0..1000)
            .filter_map(|_| select_speaker(&r, &t, 4, &mut rng))
            .filter(|s| s.is_hidden_ai)
            .count();
        assert!((600..800).contains(&ai), "ai picked {} times", ai);
    }

    proptest! {
        #[test]
        fn prop_local_user_never_selected(seed in any::<u64>(), total in 2usize..=10, lines in 0usize..20) {
            let r = roster(seed, total);
            let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
            let mut t = Transcript::new();
            for i in 0..lines {
                let p = &r.participants()[i % r.len()];
                t.append(p.display_name.clone(), "some line", p.is_hidden_ai, p.is_local_user);
            }
            if let Some(sel) = select_speaker(&r, &t, 4, &mut rng) {
                prop_assert!(!sel.speaker.is_local_user);
                prop_assert_eq!(sel.is_hidden_ai, sel.speaker.is_hidden_ai);
            }
        }
    }
}
