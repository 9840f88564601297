use crate::api::{AnswerResponse, GuessResponse};
use crate::game::LetterState;

#[test]
fn parses_the_answer_response() {
    let response: AnswerResponse =
        serde_json::from_str(r#"{"word": "speed"}"#).expect("valid payload");
    assert_eq!(response.word, "speed");
}

#[test]
fn parses_a_scored_guess() {
    let payload = r#"{
        "guess": "erase",
        "is_word_in_list": true,
        "is_correct": false,
        "character_info": [
            {"char": "e", "scoring": {"in_word": true,  "correct_idx": false}},
            {"char": "r", "scoring": {"in_word": false, "correct_idx": false}},
            {"char": "a", "scoring": {"in_word": false, "correct_idx": false}},
            {"char": "s", "scoring": {"in_word": true,  "correct_idx": false}},
            {"char": "e", "scoring": {"in_word": true,  "correct_idx": false}}
        ]
    }"#;

    let response: GuessResponse = serde_json::from_str(payload).expect("valid payload");
    let result = response.into_result().expect("convertible payload");

    assert_eq!(result.word, "ERASE");
    assert!(result.is_valid_word);
    assert!(!result.is_correct);
    assert_eq!(result.letter_states.len(), 5);
    assert_eq!(
        result.letter_states[0],
        LetterState {
            letter: 'E',
            in_word: true,
            correct_position: false
        }
    );
    assert_eq!(
        result.letter_states[1],
        LetterState {
            letter: 'R',
            in_word: false,
            correct_position: false
        }
    );
}

#[test]
fn synthesizes_letter_states_for_a_winning_guess() {
    // The service omits character_info once the guess is correct.
    let payload = r#"{
        "guess": "speed",
        "is_word_in_list": true,
        "is_correct": true,
        "character_info": null
    }"#;

    let response: GuessResponse = serde_json::from_str(payload).expect("valid payload");
    let result = response.into_result().expect("convertible payload");

    assert_eq!(result.word, "SPEED");
    assert!(result.is_correct);
    assert_eq!(result.letter_states.len(), 5);
    assert!(result
        .letter_states
        .iter()
        .all(|l| l.in_word && l.correct_position));
}

#[test]
fn invalid_words_carry_no_letter_states() {
    let payload = r#"{
        "guess": "zzzzz",
        "is_word_in_list": false,
        "is_correct": false,
        "character_info": null
    }"#;

    let response: GuessResponse = serde_json::from_str(payload).expect("valid payload");
    let result = response.into_result().expect("convertible payload");

    assert!(!result.is_valid_word);
    assert!(result.letter_states.is_empty());
}

#[test]
fn rejects_truncated_per_letter_scoring() {
    let payload = r#"{
        "guess": "erase",
        "is_word_in_list": true,
        "is_correct": false,
        "character_info": [
            {"char": "e", "scoring": {"in_word": true, "correct_idx": false}}
        ]
    }"#;

    let response: GuessResponse = serde_json::from_str(payload).expect("valid payload");
    assert!(response.into_result().is_err());
}

#[test]
fn rejects_missing_scoring_for_a_wrong_guess() {
    let payload = r#"{
        "guess": "erase",
        "is_word_in_list": true,
        "is_correct": false,
        "character_info": null
    }"#;

    let response: GuessResponse = serde_json::from_str(payload).expect("valid payload");
    assert!(response.into_result().is_err());
}
