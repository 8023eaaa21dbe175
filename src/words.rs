use crate::models::{Outcome, Word};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub correct: i64,
    pub missed: i64,
    pub extras: i64,
    pub incorrect: i64,
}

impl OutcomeTally {
    pub fn total(&self) -> i64 {
        self.correct + self.missed + self.extras + self.incorrect
    }
}

pub fn tally(words: &[Word]) -> OutcomeTally {
    let mut counts = OutcomeTally::default();
    for word in words {
        match word.outcome {
            Outcome::Correct => counts.correct += 1,
            Outcome::Missed => counts.missed += 1,
            Outcome::Extra => counts.extras += 1,
            Outcome::Incorrect => counts.incorrect += 1,
        }
    }
    counts
}

/// Positions of every non-correct word, in passage order. This is the
/// errors-only playback track.
pub fn error_indices(words: &[Word]) -> Vec<usize> {
    words
        .iter()
        .enumerate()
        .filter(|(_, word)| word.outcome != Outcome::Correct)
        .map(|(index, _)| index)
        .collect()
}

pub fn passage_text(words: &[Word]) -> String {
    words
        .iter()
        .map(|word| word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, outcome: Outcome) -> Word {
        Word {
            text: text.to_string(),
            student_answer: None,
            outcome,
            start_seconds: 0.0,
            end_seconds: 0.0,
        }
    }

    #[test]
    fn legacy_right_label_normalizes_to_correct() {
        assert_eq!(Outcome::from_label("right"), Outcome::Correct);
        assert_eq!(Outcome::from_label("Right"), Outcome::Correct);
        assert_eq!(Outcome::from_label("correct"), Outcome::Correct);
        assert_eq!(Outcome::from_label("missed"), Outcome::Missed);
        assert_eq!(Outcome::from_label("extra"), Outcome::Extra);
        assert_eq!(Outcome::from_label("incorrect"), Outcome::Incorrect);
    }

    #[test]
    fn unknown_labels_default_to_correct() {
        assert_eq!(Outcome::from_label(""), Outcome::Correct);
        assert_eq!(Outcome::from_label("substitution"), Outcome::Correct);
    }

    #[test]
    fn error_indices_skip_correct_words() {
        let words = vec![
            word("The", Outcome::Correct),
            word("cat", Outcome::Missed),
            word("sat", Outcome::Incorrect),
        ];
        assert_eq!(error_indices(&words), vec![1, 2]);
    }

    #[test]
    fn error_index_count_complements_correct_count() {
        let words = vec![
            word("a", Outcome::Correct),
            word("b", Outcome::Extra),
            word("c", Outcome::Correct),
            word("d", Outcome::Missed),
            word("e", Outcome::Incorrect),
        ];
        let counts = tally(&words);
        let indices = error_indices(&words);
        assert_eq!(indices.len() as i64, words.len() as i64 - counts.correct);
        assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn tally_counts_every_outcome() {
        let words = vec![
            word("a", Outcome::Correct),
            word("b", Outcome::Correct),
            word("c", Outcome::Missed),
            word("d", Outcome::Extra),
            word("e", Outcome::Incorrect),
        ];
        let counts = tally(&words);
        assert_eq!(counts.correct, 2);
        assert_eq!(counts.missed, 1);
        assert_eq!(counts.extras, 1);
        assert_eq!(counts.incorrect, 1);
        assert_eq!(counts.total(), words.len() as i64);
    }

    #[test]
    fn passage_joins_words_in_order() {
        let words = vec![
            word("The", Outcome::Correct),
            word("quick", Outcome::Missed),
            word("fox", Outcome::Correct),
        ];
        assert_eq!(passage_text(&words), "The quick fox");
    }
}
