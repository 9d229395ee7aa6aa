use crate::checker::tokenizer::split_identifier;
use crate::parser::languages::{is_keyword_or_builtin, LanguageConfig};
use crate::Span;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref ESCAPE_SEQUENCE: Regex = Regex::new(r"(?s)\\.").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Comment,
    String,
    Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedToken {
    pub text: String,
    pub kind: TokenKind,
    pub source_span: Span,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractOptions {
    pub check_comments: bool,
    pub check_strings: bool,
    pub check_identifiers: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            check_comments: true,
            check_strings: true,
            check_identifiers: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 50,
        }
    }
}

/// Extract comment, string and identifier tokens from `code`.
///
/// Comment and string matches do not overlap, see `literal_spans`.
/// An identifier match that starts inside a kept comment or string is not
/// emitted, so a word is never reported twice. This differs from emitting
/// every pattern match independently.
pub fn extract(code: &str, config: &LanguageConfig, options: &ExtractOptions) -> Vec<ExtractedToken> {
    let index = LineIndex::new(code);
    let literals = literal_spans(code, config);
    let mut tokens = Vec::new();

    // Comments and strings

    for (span, kind) in &literals {
        let wanted = match kind {
            TokenKind::Comment => options.check_comments,
            TokenKind::String => options.check_strings,
            TokenKind::Identifier => false,
        };
        if !wanted {
            continue;
        }

        let raw = &code[span.start..span.end];
        let text = match kind {
            TokenKind::Comment => clean_comment_text(raw),
            _ => clean_string_text(raw),
        };
        if text.is_empty() {
            continue;
        }

        let (line, column) = index.line_column(code, span.start);
        tokens.push(ExtractedToken {
            text,
            kind: *kind,
            source_span: *span,
            line,
            column,
        });
    }

    // Identifiers outside literals
    if config.check_identifiers && options.check_identifiers {
        for m in config.identifier_pattern.find_iter(code) {
            let inside_literal = literals
                .iter()
                .any(|(span, _)| span.start <= m.start() && m.start() < span.end);
            let word = m.as_str();
            if inside_literal || word.chars().count() <= 2 || is_keyword_or_builtin(word, config) {
                continue;
            }

            let (line, column) = index.line_column(code, m.start());
            for part in split_identifier(word) {
                if part.chars().count() > 2 {
                    tokens.push(ExtractedToken {
                        text: part,
                        kind: TokenKind::Identifier,
                        source_span: Span::new(m.start(), m.end()),
                        line,
                        column,
                    });
                }
            }
        }
    }

    tokens.sort_by_key(|t| t.source_span.start);
    tokens
}

/// Non-overlapping comment and string spans, earliest start first.
///
/// Overlaps are resolved like a lexer would: the earliest start wins and the
/// longer match wins a tie, so `"http://x"` stays a string and `// it's`
/// stays a comment. Losing candidates are dropped.
fn literal_spans(code: &str, config: &LanguageConfig) -> Vec<(Span, TokenKind)> {
    let mut candidates: Vec<(Span, TokenKind)> = Vec::new();
    for pattern in &config.comment_patterns {
        candidates.extend(
            pattern
                .find_iter(code)
                .map(|m| (Span::new(m.start(), m.end()), TokenKind::Comment)),
        );
    }
    for pattern in &config.string_patterns {
        candidates.extend(
            pattern
                .find_iter(code)
                .map(|m| (Span::new(m.start(), m.end()), TokenKind::String)),
        );
    }
    candidates.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(b.0.end.cmp(&a.0.end)));

    let mut kept: Vec<(Span, TokenKind)> = Vec::with_capacity(candidates.len());
    let mut covered_until = 0;
    for (span, kind) in candidates {
        if span.start < covered_until {
            continue;
        }
        covered_until = span.end;
        kept.push((span, kind));
    }
    kept
}

/// Strip comment delimiters and continuation markers, then collapse
/// whitespace.
pub fn clean_comment_text(raw: &str) -> String {
    let mut text = raw.trim();

    for prefix in ["<!--", "/*", "//", "--[[", "--", "#", "=begin"] {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest;
            break;
        }
    }
    text = text.trim_end();
    for suffix in ["-->", "*/", "]]", "=end"] {
        if let Some(rest) = text.strip_suffix(suffix) {
            text = rest;
            break;
        }
    }

    text.lines()
        .map(|line| line.trim().trim_start_matches(['*', '-', '/', '!', '#']))
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip quote delimiters and escape sequences.
pub fn clean_string_text(raw: &str) -> String {
    let mut text = raw.trim();

    let mut stripped = false;
    for quote in ["\"\"\"", "'''"] {
        if text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote) {
            text = &text[quote.len()..text.len() - quote.len()];
            stripped = true;
            break;
        }
    }
    if !stripped {
        for quote in ['"', '\'', '`'] {
            if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
                text = &text[1..text.len() - 1];
                break;
            }
        }
    }

    ESCAPE_SEQUENCE.replace_all(text, "").trim().to_string()
}

/// Bound token length, drop numbers and very short identifiers.
pub fn filter_content(tokens: Vec<ExtractedToken>, options: &FilterOptions) -> Vec<ExtractedToken> {
    tokens
        .into_iter()
        .filter(|token| {
            let len = token.text.chars().count();
            if len < options.min_length || len > options.max_length {
                return false;
            }
            if token.text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '_') {
                return false;
            }
            !(token.kind == TokenKind::Identifier && len < 4)
        })
        .collect()
}

/// Offsets of line starts, for 1-based line and column lookup.
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub(crate) fn line_column(&self, text: &str, offset: usize) -> (usize, usize) {
        let line_idx = self.starts.partition_point(|&s| s <= offset) - 1;
        let line_start = self.starts[line_idx];
        let column = text[line_start..offset].chars().count() + 1;
        (line_idx + 1, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::languages::LanguageRegistry;

    fn tokens_of(code: &str, language: &str) -> Vec<ExtractedToken> {
        let registry = LanguageRegistry::builtin();
        let config = registry.get(language).unwrap();
        extract(code, &config, &ExtractOptions::default())
    }

    fn texts(tokens: &[ExtractedToken], kind: TokenKind) -> Vec<&str> {
        tokens.iter().filter(|t| t.kind == kind).map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_clean_comment_text() {
        assert_eq!(clean_comment_text("// hello world"), "hello world");
        assert_eq!(clean_comment_text("/* multi\n * line */"), "multi line");
        assert_eq!(clean_comment_text("/** Doc\n *   comment\n */"), "Doc comment");
        assert_eq!(clean_comment_text("# python   style"), "python style");
        assert_eq!(clean_comment_text("<!-- html note -->"), "html note");
        assert_eq!(clean_comment_text("/// rustdoc line"), "rustdoc line");
        assert_eq!(clean_comment_text("//"), "");
    }

    #[test]
    fn test_clean_string_text() {
        assert_eq!(clean_string_text(r#""hello world""#), "hello world");
        assert_eq!(clean_string_text(r"'it\'s here'"), "its here");
        assert_eq!(clean_string_text(r#""line\nbreak""#), "linebreak");
        assert_eq!(clean_string_text("\"\"\"doc string\"\"\""), "doc string");
        assert_eq!(clean_string_text("`template`"), "template");
        assert_eq!(clean_string_text(r#""   ""#), "");
    }

    #[test]
    fn test_javascript_extraction() {
        let code = "// Compute the totl\nconst userName = \"Helo there\";\n";
        let tokens = tokens_of(code, "javascript");

        assert_eq!(texts(&tokens, TokenKind::Comment), vec!["Compute the totl"]);
        assert_eq!(texts(&tokens, TokenKind::String), vec!["Helo there"]);
        assert_eq!(texts(&tokens, TokenKind::Identifier), vec!["user", "name"]);
    }

    #[test]
    fn test_identifier_subwords_share_parent_span() {
        let code = "let parseConfigFile = 1;";
        let tokens = tokens_of(code, "javascript");
        let idents: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Identifier).collect();

        assert_eq!(idents.len(), 3);
        assert!(idents.iter().all(|t| t.source_span == Span::new(4, 19)));
        assert_eq!(&code[4..19], "parseConfigFile");
    }

    #[test]
    fn test_keywords_and_short_identifiers_skipped() {
        let code = "if (x) { return abc; }";
        let tokens = tokens_of(code, "javascript");
        assert_eq!(texts(&tokens, TokenKind::Identifier), vec!["abc"]);
    }

    #[test]
    fn test_identifier_inside_comment_not_emitted() {
        let code = "// computeTotal helper\nlet fooBar = 1;\n";
        let tokens = tokens_of(code, "javascript");

        assert_eq!(texts(&tokens, TokenKind::Comment), vec!["computeTotal helper"]);
        assert_eq!(texts(&tokens, TokenKind::Identifier), vec!["foo", "bar"]);
    }

    #[test]
    fn test_string_wins_over_comment_inside_it() {
        let code = "const url = \"http://example.com\";";
        let tokens = tokens_of(code, "javascript");

        assert!(texts(&tokens, TokenKind::Comment).is_empty());
        assert_eq!(texts(&tokens, TokenKind::String), vec!["http://example.com"]);
    }

    #[test]
    fn test_python_docstring_and_comment() {
        let code = "def run():\n    \"\"\"Run the tsk.\"\"\"\n    # retry twice\n    pass\n";
        let tokens = tokens_of(code, "py");

        assert_eq!(texts(&tokens, TokenKind::String), vec!["Run the tsk."]);
        assert_eq!(texts(&tokens, TokenKind::Comment), vec!["retry twice"]);
        let comment = tokens.iter().find(|t| t.kind == TokenKind::Comment).unwrap();
        assert_eq!((comment.line, comment.column), (3, 5));
    }

    #[test]
    fn test_identifiers_disabled_for_language() {
        let code = "key: \"valeu\" # comentary";
        let tokens = tokens_of(code, "yaml");
        assert!(texts(&tokens, TokenKind::Identifier).is_empty());
        assert_eq!(texts(&tokens, TokenKind::String), vec!["valeu"]);
    }

    #[test]
    fn test_options_disable_kinds() {
        let registry = LanguageRegistry::builtin();
        let config = registry.get("rust").unwrap();
        let code = "// note\nlet value = \"text\";";
        let options = ExtractOptions {
            check_comments: false,
            check_strings: true,
            check_identifiers: false,
        };

        let tokens = extract(code, &config, &options);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let registry = LanguageRegistry::builtin();
        let config = registry.get("javascript").unwrap();
        let code = "/* one */ // two\nlet threeFour = 'five';";

        let first = extract(code, &config, &ExtractOptions::default());
        let second = extract(code, &config, &ExtractOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_content() {
        let token = |text: &str, kind| ExtractedToken {
            text: text.to_string(),
            kind,
            source_span: Span::new(0, 0),
            line: 1,
            column: 1,
        };
        let tokens = vec![
            token("ok", TokenKind::Comment),
            token("fine words", TokenKind::Comment),
            token("12345", TokenKind::String),
            token("abc", TokenKind::Identifier),
            token("abcd", TokenKind::Identifier),
            token(&"x".repeat(51), TokenKind::String),
        ];

        let kept: Vec<String> = filter_content(tokens, &FilterOptions::default())
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(kept, vec!["fine words", "abcd"]);
    }

    #[test]
    fn test_line_index() {
        let text = "ab\ncdé\nf";
        let index = LineIndex::new(text);
        assert_eq!(index.line_column(text, 0), (1, 1));
        assert_eq!(index.line_column(text, 4), (2, 2));
        assert_eq!(index.line_column(text, text.len() - 1), (3, 1));
    }
}
