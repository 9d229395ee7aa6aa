use std::collections::HashSet;

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Deduplicate candidates and order them by edit distance to `word`.
/// The sort is stable, so equally distant candidates keep their input order.
pub fn rank<I>(word: &str, candidates: I, max_suggestions: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let lower = word.to_lowercase();
    let mut seen = HashSet::new();
    let mut ranked: Vec<(usize, String)> = candidates
        .into_iter()
        .filter(|c| !c.is_empty() && *c != word)
        .filter(|c| seen.insert(c.to_lowercase()))
        .map(|c| (edit_distance(&lower, &c.to_lowercase()), c))
        .collect();

    ranked.sort_by_key(|(distance, _)| *distance);
    ranked.truncate(max_suggestions);
    ranked.into_iter().map(|(_, c)| c).collect()
}

/// `max(0.3, 1 - d / max_len)` against the top suggestion, rounded to two
/// decimals. `0.1` when there is nothing to suggest. The distance is taken
/// on the strings as given, so a case change counts as an edit.
pub fn confidence(word: &str, suggestions: &[String]) -> f64 {
    let Some(top) = suggestions.first() else {
        return 0.1;
    };

    let distance = edit_distance(word, top);
    let max_len = word.chars().count().max(top.chars().count()).max(1);
    let score = (1.0 - distance as f64 / max_len as f64).max(0.3);
    (score * 100.0).round() / 100.0
}

/// Calculate Levenshtein distance between two strings
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(a_len + 1) {
        row[0] = i;
    }
    for (j, item) in matrix[0].iter_mut().enumerate().take(b_len + 1) {
        *item = j;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    for (i, a_char) in a_chars.iter().enumerate() {
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };

            matrix[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(
                    matrix[i][j + 1] + 1, // deletion
                    matrix[i + 1][j] + 1, // insertion
                ),
                matrix[i][j] + cost, // substitution
            );
        }
    }

    matrix[a_len][b_len]
}

/// Every single-edit variant of a word: deletions, adjacent swaps,
/// insertions and substitutions over `a-z`.
pub fn generate_transformations(word: &str) -> Vec<String> {
    let mut transformations = Vec::new();
    let chars: Vec<char> = word.chars().collect();

    // Deletions
    for i in 0..chars.len() {
        let mut new_word = chars.clone();
        new_word.remove(i);
        transformations.push(new_word.iter().collect());
    }

    // Transpositions (swap adjacent)
    for i in 0..chars.len().saturating_sub(1) {
        let mut new_word = chars.clone();
        new_word.swap(i, i + 1);
        transformations.push(new_word.iter().collect());
    }

    // Insertions
    for i in 0..=chars.len() {
        for letter in ALPHABET.chars() {
            let mut new_word = chars.clone();
            new_word.insert(i, letter);
            transformations.push(new_word.iter().collect());
        }
    }

    // Substitutions
    for (i, &ch) in chars.iter().enumerate() {
        for letter in ALPHABET.chars().filter(|&l| l != ch) {
            let mut new_word = chars.clone();
            new_word[i] = letter;
            transformations.push(new_word.iter().collect());
        }
    }

    transformations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("hello", "hello"), 0);
        assert_eq!(edit_distance("hello", "hallo"), 1);
        assert_eq!(edit_distance("hello", "hullo"), 1);
        assert_eq!(edit_distance("hello", "world"), 4);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("mispelled", "misspelled"), 1);
    }

    #[test]
    fn test_transformations() {
        let transforms = generate_transformations("hello");
        assert!(transforms.contains(&"hllo".to_string())); // deletion
        assert!(transforms.contains(&"ehllo".to_string())); // transposition
        assert!(transforms.contains(&"helloo".to_string())); // insertion
        assert!(transforms.contains(&"jello".to_string())); // substitution
    }

    #[test]
    fn test_rank_orders_by_distance_and_dedupes() {
        let candidates = vec![
            "missile".to_string(),
            "misspelled".to_string(),
            "spelled".to_string(),
            "misspelled".to_string(),
            "mispelled".to_string(),
        ];

        let ranked = rank("mispelled", candidates, 5);
        assert_eq!(ranked, vec!["misspelled", "spelled", "missile"]);
    }

    #[test]
    fn test_rank_truncates() {
        let candidates = (0..10).map(|i| format!("word{i}"));
        assert_eq!(rank("word", candidates, 5).len(), 5);
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence("mispelled", &["misspelled".to_string()]), 0.9);
        assert_eq!(confidence("teh", &["the".to_string()]), 0.33);
        assert_eq!(confidence("xyz", &["abcdefgh".to_string()]), 0.3);
        assert_eq!(confidence("anything", &[]), 0.1);
    }

    #[test]
    fn test_confidence_counts_case_changes() {
        assert_eq!(confidence("helo", &["Hello".to_string()]), 0.6);
        assert_eq!(confidence("helo", &["hello".to_string()]), 0.8);
    }
}
