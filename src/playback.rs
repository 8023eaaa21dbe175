use crate::models::Word;
use crate::words;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Stopped,
    PlayingAll,
    PlayingErrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// The word sequence is empty.
    NothingToPlay,
    /// Errors-only playback was requested but every word is correct.
    NoErrors,
}

/// Discrete-step playback cursor over a word sequence.
///
/// The sequencer is synchronous: the caller owns the timer and calls `tick`
/// once per period. Starting a run replaces any active one, so there is never
/// more than one track in flight. Manual stepping is rejected while a
/// timer-driven run is active; callers must stop playback first.
#[derive(Debug)]
pub struct Sequencer {
    word_count: usize,
    error_track: Vec<usize>,
    mode: PlaybackMode,
    current_index: usize,
    track_pos: usize,
}

impl Sequencer {
    pub fn new(words: &[Word]) -> Self {
        Sequencer {
            word_count: words.len(),
            error_track: words::error_indices(words),
            mode: PlaybackMode::Stopped,
            current_index: 0,
            track_pos: 0,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn error_count(&self) -> usize {
        self.error_track.len()
    }

    pub fn play_all(&mut self) -> Result<(), StartError> {
        if self.word_count == 0 {
            return Err(StartError::NothingToPlay);
        }
        self.mode = PlaybackMode::PlayingAll;
        self.track_pos = 0;
        Ok(())
    }

    /// Rejected, leaving the state untouched, when there are no errors to
    /// walk; the caller surfaces that to the user.
    pub fn play_errors(&mut self) -> Result<(), StartError> {
        if self.error_track.is_empty() {
            return Err(StartError::NoErrors);
        }
        self.mode = PlaybackMode::PlayingErrors;
        self.track_pos = 0;
        Ok(())
    }

    /// Cancel playback immediately. The cursor stays where it was; only a run
    /// that completes naturally resets it to the start.
    pub fn stop(&mut self) {
        self.mode = PlaybackMode::Stopped;
    }

    /// Advance one step and return the word index to highlight. Returns
    /// `None` when stopped, or on the tick past the last track entry, which
    /// ends the run and resets the cursor to 0.
    pub fn tick(&mut self) -> Option<usize> {
        match self.mode {
            PlaybackMode::Stopped => None,
            PlaybackMode::PlayingAll => {
                if self.track_pos < self.word_count {
                    self.current_index = self.track_pos;
                    self.track_pos += 1;
                    Some(self.current_index)
                } else {
                    self.finish()
                }
            }
            PlaybackMode::PlayingErrors => {
                if let Some(&word_index) = self.error_track.get(self.track_pos) {
                    self.current_index = word_index;
                    self.track_pos += 1;
                    Some(word_index)
                } else {
                    self.finish()
                }
            }
        }
    }

    fn finish(&mut self) -> Option<usize> {
        self.mode = PlaybackMode::Stopped;
        self.current_index = 0;
        self.track_pos = 0;
        None
    }

    /// Move the cursor forward one word, clamped to the last index. Only
    /// valid while stopped; returns `None` (no movement, no highlight) if a
    /// timer-driven run is active.
    pub fn step_forward(&mut self) -> Option<usize> {
        if self.mode != PlaybackMode::Stopped || self.word_count == 0 {
            return None;
        }
        if self.current_index < self.word_count - 1 {
            self.current_index += 1;
        }
        Some(self.current_index)
    }

    /// Mirror of `step_forward`, clamped to index 0.
    pub fn step_back(&mut self) -> Option<usize> {
        if self.mode != PlaybackMode::Stopped || self.word_count == 0 {
            return None;
        }
        self.current_index = self.current_index.saturating_sub(1);
        Some(self.current_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;

    fn words(outcomes: &[Outcome]) -> Vec<Word> {
        outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| Word {
                text: format!("w{i}"),
                student_answer: None,
                outcome: *outcome,
                start_seconds: i as f64,
                end_seconds: i as f64 + 0.4,
            })
            .collect()
    }

    #[test]
    fn play_all_walks_every_word_then_resets() {
        let words = words(&[Outcome::Correct, Outcome::Missed, Outcome::Correct]);
        let mut seq = Sequencer::new(&words);
        seq.play_all().unwrap();

        assert_eq!(seq.tick(), Some(0));
        assert_eq!(seq.tick(), Some(1));
        assert_eq!(seq.tick(), Some(2));
        assert_eq!(seq.tick(), None);
        assert_eq!(seq.mode(), PlaybackMode::Stopped);
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn stop_preserves_the_cursor() {
        let words = words(&[Outcome::Correct, Outcome::Correct, Outcome::Correct]);
        let mut seq = Sequencer::new(&words);
        seq.play_all().unwrap();

        assert_eq!(seq.tick(), Some(0));
        assert_eq!(seq.tick(), Some(1));
        seq.stop();
        assert_eq!(seq.mode(), PlaybackMode::Stopped);
        assert_eq!(seq.current_index(), 1);
        assert_eq!(seq.tick(), None);
    }

    #[test]
    fn play_errors_visits_only_error_positions() {
        let words = words(&[
            Outcome::Correct,
            Outcome::Missed,
            Outcome::Correct,
            Outcome::Incorrect,
        ]);
        let mut seq = Sequencer::new(&words);
        assert_eq!(seq.error_count(), 2);
        seq.play_errors().unwrap();

        assert_eq!(seq.tick(), Some(1));
        assert_eq!(seq.tick(), Some(3));
        assert_eq!(seq.tick(), None);
        assert_eq!(seq.mode(), PlaybackMode::Stopped);
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn play_errors_rejected_when_everything_is_correct() {
        let words = words(&[Outcome::Correct, Outcome::Correct]);
        let mut seq = Sequencer::new(&words);

        assert_eq!(seq.play_errors(), Err(StartError::NoErrors));
        assert_eq!(seq.mode(), PlaybackMode::Stopped);
        assert_eq!(seq.tick(), None);
    }

    #[test]
    fn play_all_rejected_on_empty_sequence() {
        let mut seq = Sequencer::new(&[]);
        assert_eq!(seq.play_all(), Err(StartError::NothingToPlay));
        assert_eq!(seq.mode(), PlaybackMode::Stopped);
    }

    #[test]
    fn starting_a_new_run_replaces_the_active_one() {
        let words = words(&[Outcome::Missed, Outcome::Correct, Outcome::Incorrect]);
        let mut seq = Sequencer::new(&words);
        seq.play_errors().unwrap();
        assert_eq!(seq.tick(), Some(0));

        seq.play_all().unwrap();
        assert_eq!(seq.mode(), PlaybackMode::PlayingAll);
        assert_eq!(seq.tick(), Some(0));
        assert_eq!(seq.tick(), Some(1));
    }

    #[test]
    fn manual_steps_clamp_at_both_ends() {
        let words = words(&[Outcome::Correct, Outcome::Correct, Outcome::Correct]);
        let mut seq = Sequencer::new(&words);

        assert_eq!(seq.step_back(), Some(0));
        assert_eq!(seq.step_forward(), Some(1));
        assert_eq!(seq.step_forward(), Some(2));
        assert_eq!(seq.step_forward(), Some(2));
        assert_eq!(seq.step_back(), Some(1));
    }

    #[test]
    fn manual_steps_rejected_while_playing() {
        let words = words(&[Outcome::Correct, Outcome::Missed]);
        let mut seq = Sequencer::new(&words);
        seq.play_all().unwrap();
        assert_eq!(seq.tick(), Some(0));

        assert_eq!(seq.step_forward(), None);
        assert_eq!(seq.step_back(), None);
        assert_eq!(seq.current_index(), 0);
        assert_eq!(seq.mode(), PlaybackMode::PlayingAll);
    }

    #[test]
    fn manual_steps_on_empty_sequence_do_nothing() {
        let mut seq = Sequencer::new(&[]);
        assert_eq!(seq.step_forward(), None);
        assert_eq!(seq.step_back(), None);
    }
}
