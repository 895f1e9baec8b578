use regex::Regex;

/// Canonical service tag followed by the surface variants that map to it.
pub const SERVICE_SYNONYMS: &[(&str, &[&str])] = &[
    ("tẩy trắng", &["tẩy trắng răng", "tẩy", "trắng răng", "trắng"]),
    ("trám", &["trám răng", "trám"]),
    ("nhổ", &["nhổ răng", "nhổ"]),
    ("cạo vôi", &["cạo vôi răng", "cạo vôi"]),
    ("bọc răng sứ", &["bọc răng", "bọc răng sứ"]),
];

/// Detects canonical service tags in already-normalized text.
#[derive(Debug, Clone)]
pub struct KeywordDetector {
    table: Vec<(String, Vec<Regex>)>,
}

impl Default for KeywordDetector {
    fn default() -> Self {
        Self::from_table(SERVICE_SYNONYMS)
    }
}

impl KeywordDetector {
    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        let table = table
            .iter()
            .map(|(tag, variants)| {
                let matchers = variants
                    .iter()
                    .map(|variant| {
                        Regex::new(&format!(r"\b{}\b", regex::escape(variant)))
                            .expect("escaped variant is a valid regex")
                    })
                    .collect();
                (tag.to_string(), matchers)
            })
            .collect();

        Self { table }
    }

    /// Tags in table order, each at most once.
    pub fn find_keywords(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        self.table
            .iter()
            .filter(|(_, variants)| variants.iter().any(|variant| variant.is_match(text)))
            .map(|(tag, _)| tag.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_tag_once_even_with_several_variants() {
        let detector = KeywordDetector::default();
        let found = detector.find_keywords("tôi muốn tẩy trắng răng cho trắng");
        assert_eq!(found, vec!["tẩy trắng".to_string()]);
    }

    #[test]
    fn keeps_table_order() {
        let detector = KeywordDetector::default();
        let found = detector.find_keywords("bọc răng sứ rồi nhổ răng khôn và trám");
        assert_eq!(found, vec!["trám", "nhổ", "bọc răng sứ"]);
    }

    #[test]
    fn ignores_variants_inside_other_words() {
        let detector = KeywordDetector::default();
        assert!(detector.find_keywords("trámx nhổy").is_empty());
        assert!(detector.find_keywords("").is_empty());
    }
}
