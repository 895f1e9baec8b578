use unicode_segmentation::UnicodeSegmentation;

/// Lowercased Unicode words of at least two characters.
pub fn tokenize(input: &str) -> Vec<String> {
    input
        .unicode_words()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() > 1)
        .collect()
}

/// Contiguous word n-grams for every `n` in `min_n..=max_n`, joined by a space.
pub fn ngrams(tokens: &[String], min_n: usize, max_n: usize) -> Vec<String> {
    let min_n = min_n.max(1);
    let mut grams = Vec::new();

    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        grams.extend(tokens.windows(n).map(|window| window.join(" ")));
    }

    grams
}
