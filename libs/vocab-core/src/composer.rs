//! Multiple-choice question composition.
//!
//! Distractors come from a candidate-pool pipeline: same category first, then
//! similar difficulty, then anything in the language pair. Every stage
//! excludes the ids already chosen.

use crate::error::Result;
use crate::store::DistractorSource;
use crate::types::{LanguagePair, Word};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Entries at or above this length are treated as glosses, not vocabulary.
pub const MAX_ENTRY_CHARS: usize = 100;

const NOISE_MARKERS: &[&str] = &[
    "form of",
    "nominative",
    "genitive",
    "plural of",
    "participle of",
];

/// Filter passed to a distractor source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
    pub language_pair: LanguagePair,
    pub category: Option<String>,
    pub difficulty_range: Option<RangeInclusive<u8>>,
}

impl CandidateFilter {
    /// Any word in the language pair.
    pub fn any(language_pair: LanguagePair) -> Self {
        Self {
            language_pair,
            category: None,
            difficulty_range: None,
        }
    }

    pub fn same_category(target: &Word) -> Self {
        Self {
            category: Some(target.category.clone()),
            ..Self::any(target.language_pair())
        }
    }

    /// Difficulty within one step of the target.
    pub fn similar_difficulty(target: &Word) -> Self {
        let low = target.difficulty.saturating_sub(1);
        let high = target.difficulty.saturating_add(1);
        Self {
            difficulty_range: Some(low..=high),
            ..Self::any(target.language_pair())
        }
    }

    pub fn matches(&self, word: &Word) -> bool {
        word.source_lang == self.language_pair.source
            && word.target_lang == self.language_pair.target
            && self.category.as_ref().map_or(true, |c| &word.category == c)
            && self
                .difficulty_range
                .as_ref()
                .map_or(true, |r| r.contains(&word.difficulty))
    }
}

/// Whether a word looks like an inflection gloss rather than vocabulary.
pub fn is_grammatical_noise(word: &Word) -> bool {
    [&word.headword, &word.translation].iter().any(|text| {
        let lowered = text.to_lowercase();
        text.chars().count() >= MAX_ENTRY_CHARS
            || NOISE_MARKERS.iter().any(|marker| lowered.contains(marker))
    })
}

/// Which side of the word is shown as the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    WordToTranslation,
    TranslationToWord,
}

impl Direction {
    pub fn from_reversed(reversed: bool) -> Self {
        if reversed {
            Self::TranslationToWord
        } else {
            Self::WordToTranslation
        }
    }
}

/// One answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub word_id: i64,
    pub text: String,
}

/// Question payload handed to the UI.
///
/// `options` holds the correct answer plus up to `count` distractors and can
/// be shorter than usual on a small dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub correct_id: i64,
    pub options: Vec<QuestionOption>,
    pub direction: Direction,
    pub direction_label: String,
}

impl Question {
    pub fn is_correct(&self, chosen_word_id: i64) -> bool {
        chosen_word_id == self.correct_id
    }
}

/// Pool stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolStage {
    Category,
    Difficulty,
    Random,
}

/// Running state of one distractor selection.
struct CandidatePipeline<'a, S: DistractorSource + ?Sized> {
    source: &'a S,
    target: &'a Word,
    count: usize,
    exclude: HashSet<i64>,
    picked: Vec<Word>,
}

impl<'a, S: DistractorSource + ?Sized> CandidatePipeline<'a, S> {
    fn new(source: &'a S, target: &'a Word, count: usize) -> Self {
        let mut exclude = HashSet::new();
        exclude.insert(target.id);
        Self {
            source,
            target,
            count,
            exclude,
            picked: Vec::with_capacity(count),
        }
    }

    fn remaining(&self) -> usize {
        self.count.saturating_sub(self.picked.len())
    }

    fn run_stage(&mut self, stage: PoolStage) -> Result<()> {
        let slots = match stage {
            PoolStage::Category => ceil_fraction(self.count, 4),
            PoolStage::Difficulty => ceil_fraction(self.count, 3),
            PoolStage::Random => self.remaining(),
        };
        let limit = slots.min(self.remaining());
        if limit == 0 {
            return Ok(());
        }

        let filter = match stage {
            PoolStage::Category => CandidateFilter::same_category(self.target),
            PoolStage::Difficulty => CandidateFilter::similar_difficulty(self.target),
            PoolStage::Random => CandidateFilter::any(self.target.language_pair()),
        };

        let found = self
            .source
            .find_distractor_candidates(&filter, &self.exclude, limit)?;
        let before = self.picked.len();
        for word in found {
            if self.picked.len() - before >= limit {
                break;
            }
            if filter.matches(&word) && !is_grammatical_noise(&word) && self.exclude.insert(word.id)
            {
                self.picked.push(word);
            }
        }
        tracing::trace!(
            target_id = self.target.id,
            ?stage,
            added = self.picked.len() - before,
            "distractor stage done"
        );
        Ok(())
    }

    fn run(mut self) -> Result<Vec<Word>> {
        for stage in [PoolStage::Category, PoolStage::Difficulty, PoolStage::Random] {
            self.run_stage(stage)?;
        }
        Ok(self.picked)
    }
}

/// `ceil(count * tenths / 10)` without floating point.
fn ceil_fraction(count: usize, tenths: usize) -> usize {
    (count * tenths + 9) / 10
}

/// Human-readable language name for a code.
pub fn language_name(code: &str) -> String {
    let name = match code.to_ascii_lowercase().as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "sv" => "Swedish",
        "pl" => "Polish",
        "ru" => "Russian",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        _ => return code.to_uppercase(),
    };
    name.to_string()
}

/// Builds multiple-choice questions from a distractor source.
pub struct QuestionComposer<'a, S: DistractorSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: DistractorSource + ?Sized> QuestionComposer<'a, S> {
    pub const DEFAULT_DISTRACTORS: usize = 3;

    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Pick up to `count` distractors for `target`. Never fails.
    pub fn select_distractors(&self, target: &Word, count: usize) -> Vec<Word> {
        match CandidatePipeline::new(self.source, target, count).run() {
            Ok(picked) => {
                if picked.len() < count {
                    tracing::debug!(
                        word_id = target.id,
                        found = picked.len(),
                        wanted = count,
                        "not enough distractor candidates"
                    );
                }
                picked
            }
            Err(err) => {
                tracing::warn!(word_id = target.id, error = %err, "distractor pipeline failed, using random fallback");
                self.random_fallback(target, count)
            }
        }
    }

    fn random_fallback(&self, target: &Word, count: usize) -> Vec<Word> {
        let filter = CandidateFilter::any(target.language_pair());
        let exclude: HashSet<i64> = [target.id].into_iter().collect();
        match self.source.find_distractor_candidates(&filter, &exclude, count) {
            Ok(found) => {
                let mut seen = exclude;
                found
                    .into_iter()
                    .filter(|w| filter.matches(w) && !is_grammatical_noise(w) && seen.insert(w.id))
                    .take(count)
                    .collect()
            }
            Err(err) => {
                tracing::warn!(word_id = target.id, error = %err, "random fallback failed, no distractors");
                Vec::new()
            }
        }
    }

    /// Assemble a shuffled question for `target`.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        target: &Word,
        count: usize,
        reversed: bool,
        rng: &mut R,
    ) -> Question {
        let direction = Direction::from_reversed(reversed);
        let answer_text = |word: &Word| match direction {
            Direction::WordToTranslation => word.translation.clone(),
            Direction::TranslationToWord => word.headword.clone(),
        };

        let distractors = self.select_distractors(target, count);
        let mut options: Vec<QuestionOption> = std::iter::once(target)
            .chain(distractors.iter())
            .map(|word| QuestionOption {
                word_id: word.id,
                text: answer_text(word),
            })
            .collect();
        options.shuffle(rng);

        let source_name = language_name(&target.source_lang);
        let target_name = language_name(&target.target_lang);
        let (prompt, direction_label) = match direction {
            Direction::WordToTranslation => (
                target.headword.clone(),
                format!("{} → {}", source_name, target_name),
            ),
            Direction::TranslationToWord => (
                target.translation.clone(),
                format!("{} → {}", target_name, source_name),
            ),
        };

        Question {
            prompt,
            correct_id: target.id,
            options,
            direction,
            direction_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::types::CefrLevel;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::cell::Cell;

    fn word(id: i64, category: &str, difficulty: u8) -> Word {
        Word {
            id,
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            headword: format!("word{}", id),
            translation: format!("palabra{}", id),
            category: category.to_string(),
            difficulty,
            frequency_rank: id as u32,
            cefr_level: CefrLevel::A1,
        }
    }

    struct VecSource {
        words: Vec<Word>,
        fail_first: Cell<usize>,
        calls: Cell<usize>,
    }

    impl VecSource {
        fn new(words: Vec<Word>) -> Self {
            Self {
                words,
                fail_first: Cell::new(0),
                calls: Cell::new(0),
            }
        }

        fn failing(words: Vec<Word>, failures: usize) -> Self {
            let source = Self::new(words);
            source.fail_first.set(failures);
            source
        }
    }

    impl DistractorSource for VecSource {
        fn find_distractor_candidates(
            &self,
            filter: &CandidateFilter,
            exclude_ids: &HashSet<i64>,
            limit: usize,
        ) -> Result<Vec<Word>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_first.get() > 0 {
                self.fail_first.set(self.fail_first.get() - 1);
                return Err(EngineError::Storage("database is locked".to_string()));
            }
            Ok(self
                .words
                .iter()
                .filter(|w| filter.matches(w) && !exclude_ids.contains(&w.id))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_slot_split_rounds_up() {
        assert_eq!(ceil_fraction(3, 4), 2);
        assert_eq!(ceil_fraction(3, 3), 1);
        assert_eq!(ceil_fraction(5, 4), 2);
        assert_eq!(ceil_fraction(5, 3), 2);
        assert_eq!(ceil_fraction(0, 4), 0);
    }

    #[test]
    fn test_category_pool_is_filled_first() {
        let target = word(1, "food", 5);
        let source = VecSource::new(vec![
            word(2, "animals", 5),
            word(3, "food", 9),
            word(4, "food", 1),
            word(5, "food", 2),
            word(6, "travel", 1),
        ]);
        let composer = QuestionComposer::new(&source);
        let picked: Vec<i64> = composer
            .select_distractors(&target, 3)
            .iter()
            .map(|w| w.id)
            .collect();
        // Two food words, then one with difficulty 4..=6.
        assert_eq!(picked, vec![3, 4, 2]);
    }

    #[test]
    fn test_random_pool_fills_remaining_slots() {
        let target = word(1, "food", 5);
        let source = VecSource::new(vec![word(2, "travel", 10), word(3, "animals", 1)]);
        let composer = QuestionComposer::new(&source);
        let picked: Vec<i64> = composer
            .select_distractors(&target, 3)
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(picked, vec![2, 3]);
    }

    #[test]
    fn test_target_is_never_a_distractor() {
        let target = word(1, "food", 5);
        let mut words = vec![target.clone()];
        words.extend((2..10).map(|id| word(id, "food", 5)));
        let source = VecSource::new(words);
        let composer = QuestionComposer::new(&source);
        let question = composer.compose(&target, 3, false, &mut rng());
        let ids: Vec<i64> = question.options.iter().map(|o| o.word_id).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.iter().filter(|&&id| id == 1).count(), 1);
    }

    #[test]
    fn test_other_language_pairs_are_ignored() {
        let target = word(1, "food", 5);
        let mut french = word(2, "food", 5);
        french.target_lang = "fr".to_string();
        let source = VecSource::new(vec![french, word(3, "food", 5)]);
        let composer = QuestionComposer::new(&source);
        let picked = composer.select_distractors(&target, 3);
        assert_eq!(picked.len(), 1);
        assert!(picked.iter().all(|w| w.shares_pair(&target)));
    }

    #[test]
    fn test_noise_entries_are_skipped() {
        let mut gloss = word(2, "food", 5);
        gloss.translation = "genitive plural of casa".to_string();
        let mut long = word(3, "food", 5);
        long.headword = "x".repeat(MAX_ENTRY_CHARS);
        assert!(is_grammatical_noise(&gloss));
        assert!(is_grammatical_noise(&long));
        assert!(!is_grammatical_noise(&word(4, "food", 5)));

        let target = word(1, "food", 5);
        let source = VecSource::new(vec![gloss, long, word(4, "food", 5)]);
        let composer = QuestionComposer::new(&source);
        let ids: Vec<i64> = composer
            .select_distractors(&target, 3)
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn test_pipeline_failure_falls_back_to_random_query() {
        let target = word(1, "food", 5);
        let source = VecSource::failing(vec![word(2, "food", 5), word(3, "travel", 2)], 1);
        let composer = QuestionComposer::new(&source);
        let picked = composer.select_distractors(&target, 3);
        assert_eq!(picked.len(), 2);
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn test_total_failure_yields_short_option_list() {
        let target = word(1, "food", 5);
        let source = VecSource::failing(vec![word(2, "food", 5)], 2);
        let composer = QuestionComposer::new(&source);
        let question = composer.compose(&target, 3, false, &mut rng());
        assert_eq!(question.options.len(), 1);
        assert_eq!(question.options[0].word_id, 1);
    }

    #[test]
    fn test_direction_controls_prompt_and_label() {
        let target = word(1, "food", 5);
        let source = VecSource::new(vec![word(2, "food", 5)]);
        let composer = QuestionComposer::new(&source);

        let forward = composer.compose(&target, 3, false, &mut rng());
        assert_eq!(forward.prompt, "word1");
        assert_eq!(forward.direction, Direction::WordToTranslation);
        assert_eq!(forward.direction_label, "English → Spanish");
        assert!(forward.options.iter().any(|o| o.text == "palabra1"));

        let reversed = composer.compose(&target, 3, true, &mut rng());
        assert_eq!(reversed.prompt, "palabra1");
        assert_eq!(reversed.direction_label, "Spanish → English");
        assert!(reversed.options.iter().any(|o| o.text == "word1"));
        assert!(reversed.is_correct(1));
    }

    #[test]
    fn test_unknown_language_code_is_uppercased() {
        assert_eq!(language_name("eo"), "EO");
        assert_eq!(language_name("DE"), "German");
    }
}
