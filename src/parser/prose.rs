use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\b[A-Za-z']+\b").unwrap();
    static ref URL: Regex = Regex::new(r"(?:https?://|www\.)[^\s<>()\[\]]+").unwrap();
    static ref EMAIL: Regex = Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
}

/// Words in a single line as `(byte offset in line, word)`. Apostrophes at
/// either end are trimmed and the offset adjusted to match.
pub fn words(line: &str) -> Vec<(usize, &str)> {
    WORD.find_iter(line)
        .filter_map(|m| {
            let raw = m.as_str();
            let word = raw.trim_start_matches('\'');
            let offset = m.start() + (raw.len() - word.len());
            let word = word.trim_end_matches('\'');
            (!word.is_empty()).then_some((offset, word))
        })
        .collect()
}

/// Single letters are skipped, except the words "a" and "I".
pub fn is_skippable_single_letter(word: &str) -> bool {
    word.chars().count() == 1 && !matches!(word, "a" | "A" | "i" | "I")
}

/// True when an odd number of backticks precede `offset` on the line.
pub fn is_inside_inline_code(line: &str, offset: usize) -> bool {
    line[..offset].matches('`').count() % 2 == 1
}

/// URL and email spans of one line.
#[derive(Debug, Default)]
pub struct LineSkips {
    urls: Vec<Range<usize>>,
    emails: Vec<Range<usize>>,
}

impl LineSkips {
    pub fn scan(line: &str) -> Self {
        Self {
            urls: URL.find_iter(line).map(|m| m.range()).collect(),
            emails: EMAIL.find_iter(line).map(|m| m.range()).collect(),
        }
    }

    pub fn in_url(&self, word: &Range<usize>) -> bool {
        self.urls.iter().any(|r| r.start <= word.start && word.end <= r.end)
    }

    pub fn in_email(&self, word: &Range<usize>) -> bool {
        self.emails.iter().any(|r| r.start <= word.start && word.end <= r.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_extraction() {
        let found = words("Hello, world! Don't 'quote' me 42 times.");
        let texts: Vec<&str> = found.iter().map(|(_, w)| *w).collect();

        assert_eq!(texts, vec!["Hello", "world", "Don't", "quote", "me", "times"]);
        assert_eq!(found[0].0, 0);
        assert_eq!(found[3].0, 21);
    }

    #[test]
    fn test_single_letters() {
        assert!(is_skippable_single_letter("x"));
        assert!(!is_skippable_single_letter("a"));
        assert!(!is_skippable_single_letter("I"));
        assert!(!is_skippable_single_letter("an"));
    }

    #[test]
    fn test_inline_code_by_backtick_parity() {
        let line = "Use the `exampleVar` in your cod.";
        assert!(is_inside_inline_code(line, 9));
        assert!(!is_inside_inline_code(line, 29));
    }

    #[test]
    fn test_url_and_email_spans() {
        let line = "See https://exmple.org/pathh or www.tset.com and mail bob@exmaple.com now";
        let skips = LineSkips::scan(line);

        for (offset, word) in words(line) {
            let range = offset..offset + word.len();
            let skipped = skips.in_url(&range) || skips.in_email(&range);
            let expected = matches!(word, "https" | "exmple" | "org" | "pathh" | "www" | "tset" | "com" | "bob" | "exmaple");
            assert_eq!(skipped, expected, "word {word}");
        }
    }
}
