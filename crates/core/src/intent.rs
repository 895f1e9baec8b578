use regex::Regex;

use crate::models::{Intent, IntentResult};
use crate::normalize::normalize_text;

/// Intent patterns in declaration order. Ties on match count go to the
/// earliest intent in this table.
pub const INTENT_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::BookAppointment,
        &["đặt", "hẹn", "book", "đặt lịch", "đặt hẹn"],
    ),
    (
        Intent::AskPrice,
        &["giá", "bao nhiêu", "chi phí", "cost", "price"],
    ),
    (
        Intent::ServiceInquiry,
        &["tẩy trắng", "trám", "nhổ", "bọc", "cạo vôi", "nhức", "đau"],
    ),
    (Intent::Greeting, &["chào", "xin chào", "hello", "hi"]),
    (
        Intent::Goodbye,
        &["cảm ơn", "thông cảm ơn", "tạm biệt", "bye"],
    ),
    (
        Intent::Contact,
        &["điện thoại", "phone", "liên hệ", "địa chỉ", "địa chỉ của"],
    ),
];

/// Rule-based classifier: counts matching patterns per intent.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    patterns: Vec<(Intent, Vec<Regex>)>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::from_table(INTENT_PATTERNS)
    }
}

impl IntentClassifier {
    pub fn from_table(table: &[(Intent, &[&str])]) -> Self {
        let patterns = table
            .iter()
            .map(|(intent, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|pattern| {
                        Regex::new(&format!("(?i){}", regex::escape(pattern)))
                            .expect("escaped intent pattern is a valid regex")
                    })
                    .collect();
                (*intent, compiled)
            })
            .collect();

        Self { patterns }
    }

    pub fn predict(&self, text: &str) -> IntentResult {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return IntentResult::unknown();
        }

        let mut best: Option<(Intent, usize, usize)> = None;
        for (intent, patterns) in &self.patterns {
            let hits = patterns
                .iter()
                .filter(|pattern| pattern.is_match(&normalized))
                .count();
            if hits == 0 {
                continue;
            }
            // Strictly greater keeps the first-declared intent on ties.
            if best.map_or(true, |(_, best_hits, _)| hits > best_hits) {
                best = Some((*intent, hits, patterns.len()));
            }
        }

        match best {
            Some((intent, hits, total)) => IntentResult {
                intent,
                confidence: (hits as f32 / total.max(1) as f32).min(1.0),
            },
            None => IntentResult::unknown(),
        }
    }
}
