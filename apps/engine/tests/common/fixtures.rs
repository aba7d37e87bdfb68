//! Test fixtures and factory functions for creating test data.

use chrono::{NaiveDate, NaiveDateTime};
use vocab_core::{CefrLevel, Word};

pub const CATEGORIES: [&str; 4] = ["food", "travel", "family", "work"];

/// Id of the grammatical-noise entry in `vocabulary()`.
pub const NOISE_WORD_ID: i64 = 41;

/// Local timestamp on a June 2024 day.
pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Create an English-Spanish word.
pub fn word(id: i64, category: &str, difficulty: u8) -> Word {
    Word {
        id,
        source_lang: "en".to_string(),
        target_lang: "es".to_string(),
        headword: format!("word {}", id),
        translation: format!("palabra {}", id),
        category: category.to_string(),
        difficulty,
        frequency_rank: id as u32,
        cefr_level: CefrLevel::A1,
    }
}

/// 40 English-Spanish words over four categories, one noise entry, and ten
/// English-French words.
pub fn vocabulary() -> Vec<Word> {
    let mut words: Vec<Word> = (1..=40)
        .map(|id| word(id, CATEGORIES[(id % 4) as usize], (id % 10) as u8 + 1))
        .collect();

    let mut noise = word(NOISE_WORD_ID, "food", 3);
    noise.translation = "genitive form of casa".to_string();
    words.push(noise);

    words.extend((101..=110).map(|id| {
        let mut french = word(id, "food", 3);
        french.target_lang = "fr".to_string();
        french.translation = format!("mot {}", id);
        french
    }));
    words
}
