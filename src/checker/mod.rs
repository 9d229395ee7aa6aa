pub mod cache;
pub mod dictionary;
pub mod suggestions;
pub mod tokenizer;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::Config;
use crate::error::Result;
use crate::parser::extractor::{self, ExtractOptions, FilterOptions, TokenKind};
use crate::parser::languages::{LanguageConfig, LanguageRegistry};
use crate::parser::prose::{self, LineSkips};
use crate::parser::regions::{self, lines_with_offsets, CodeRegion};
use crate::{CheckOutcome, CheckStatistics, IssueKind, Severity, Span, SpellIssue};
use cache::{cache_key, CacheStats, ResultCache};
use dictionary::{DictionaryEngine, LoadedDictionary};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Settings that shape a check. They are part of every cache key.
#[derive(Debug, Clone, Serialize)]
pub struct CheckSettings {
    pub language: String,
    pub check_code_blocks: bool,
    pub extract: ExtractOptions,
    /// Post-pass over extracted code tokens; `None` keeps every token.
    pub filter: Option<FilterOptions>,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            language: dictionary::DEFAULT_LANGUAGE.to_string(),
            check_code_blocks: true,
            extract: ExtractOptions::default(),
            filter: None,
        }
    }
}

impl CheckSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: dictionary::normalize_language(&config.language),
            check_code_blocks: config.check_code_blocks,
            extract: ExtractOptions {
                check_comments: config.check_comments,
                check_strings: config.check_strings,
                check_identifiers: config.check_identifiers,
            },
            filter: config.filter_tokens.then_some(FilterOptions {
                min_length: config.min_token_length,
                max_length: config.max_token_length,
            }),
        }
    }
}

/// Cached result of checking one block of code.
#[derive(Debug, Clone)]
pub struct CodeCheck {
    pub issues: Vec<SpellIssue>,
    pub words_checked: usize,
}

/// Walks a document, separates prose from code and reports misspellings.
///
/// Checks are synchronous and never perform I/O. Dictionaries must be loaded
/// through the engine beforehand.
pub struct SpellChecker {
    engine: Arc<DictionaryEngine>,
    languages: Arc<LanguageRegistry>,
    cache: Arc<ResultCache<CodeCheck>>,
    settings: CheckSettings,
    settings_key: String,
    ignore_patterns: Vec<Regex>,
}

impl SpellChecker {
    pub fn new(
        engine: Arc<DictionaryEngine>,
        languages: Arc<LanguageRegistry>,
        cache: Arc<ResultCache<CodeCheck>>,
        settings: CheckSettings,
    ) -> Self {
        let settings_key = serde_json::to_string(&settings).unwrap_or_default();
        Self {
            engine,
            languages,
            cache,
            settings,
            settings_key,
            ignore_patterns: Vec::new(),
        }
    }

    /// Words fully matching any of these patterns are never reported.
    /// Invalid patterns are logged and skipped.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Self {
        for pattern in patterns {
            match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(re) => self.ignore_patterns.push(re),
                Err(e) => warn!(pattern, error = %e, "invalid ignore pattern"),
            }
        }
        let patterns: Vec<&str> = self.ignore_patterns.iter().map(|r| r.as_str()).collect();
        self.settings_key = format!("{}|{}", self.settings_key, patterns.join("|"));
        self
    }

    pub fn engine(&self) -> &Arc<DictionaryEngine> {
        &self.engine
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    pub fn settings(&self) -> &CheckSettings {
        &self.settings
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Adds a word to the checker's dictionary and drops cached results,
    /// which may now be stale.
    pub fn add_custom_word(&self, word: &str) -> Result<()> {
        self.engine.dictionary(&self.settings.language)?.add_custom_word(word);
        self.cache.clear();
        Ok(())
    }

    /// Check a markdown or plain-text document. `chunk_offset` is added to
    /// every reported position.
    pub fn check_text(&self, text: &str, custom_words: &[String], chunk_offset: usize) -> Result<CheckOutcome> {
        let started = Instant::now();
        if text.is_empty() {
            return Ok(CheckOutcome::default());
        }

        let dictionary = self.engine.dictionary(&self.settings.language)?;
        let custom = lowercase_set(custom_words);
        let code_regions = regions::find_code_regions(text);
        let block_lines = regions::code_block_lines(text);

        let mut issues = Vec::new();
        let mut words_checked = 0;

        // Prose
        for (idx, line) in lines_with_offsets(text) {
            let in_block_line = block_lines.get(idx).copied().unwrap_or(false);
            let skips = LineSkips::scan(line.text);

            for (offset, word) in prose::words(line.text) {
                let range = offset..offset + word.len();
                let absolute = line.start + offset;

                if prose::is_skippable_single_letter(word)
                    || in_block_line
                    || regions::is_in_code_region(&code_regions, absolute)
                    || prose::is_inside_inline_code(line.text, offset)
                    || skips.in_url(&range)
                    || skips.in_email(&range)
                    || self.is_ignored(word)
                {
                    continue;
                }

                words_checked += 1;
                let column = line.text[..offset].chars().count() + 1;
                let position = Span::new(absolute, absolute + word.len());
                if let Some(issue) = check_word(&dictionary, &custom, word, position, idx + 1, column, Severity::Error) {
                    issues.push(issue);
                }
            }
        }

        // Fenced code in a known language
        if self.settings.check_code_blocks {
            for block in regions::fenced_blocks(text) {
                let Some(language) = block.language.as_deref() else {
                    continue;
                };
                let Some(config) = self.languages.get(language) else {
                    debug!(language, "no language support for fenced block, skipping");
                    continue;
                };

                let code = &text[block.content.clone()];
                let checked = self.check_code_cached(&dictionary, &config, code, custom_words, &custom);
                words_checked += checked.words_checked;
                issues.extend(checked.issues.into_iter().map(|mut issue| {
                    issue.position = issue.position.shifted(block.content.start);
                    issue.line += block.content_line - 1;
                    issue
                }));
            }
        }

        Ok(self.finish(issues, words_checked, chunk_offset, started))
    }

    /// Check a whole source file through the content extractor. Unknown
    /// languages produce an empty result.
    pub fn check_code(
        &self,
        code: &str,
        language: &str,
        custom_words: &[String],
        chunk_offset: usize,
    ) -> Result<CheckOutcome> {
        let started = Instant::now();
        let dictionary = self.engine.dictionary(&self.settings.language)?;
        let Some(config) = self.languages.get(language) else {
            warn!(language, "unsupported code language, nothing checked");
            return Ok(CheckOutcome::default());
        };

        let custom = lowercase_set(custom_words);
        let checked = self.check_code_cached(&dictionary, &config, code, custom_words, &custom);
        Ok(self.finish(checked.issues, checked.words_checked, chunk_offset, started))
    }

    /// Independent documents, checked in parallel. Results keep input order.
    pub fn check_batch(&self, texts: &[String], custom_words: &[String]) -> Vec<Result<CheckOutcome>> {
        texts
            .par_iter()
            .map(|text| self.check_text(text, custom_words, 0))
            .collect()
    }

    /// Split `text` into chunks of at most `max_chunk_bytes` on line
    /// boundaries outside code blocks, check each one and merge the results
    /// with document-wide positions and line numbers.
    pub fn check_chunked(&self, text: &str, custom_words: &[String], max_chunk_bytes: usize) -> Result<CheckOutcome> {
        let started = Instant::now();
        let mut spelling = Vec::new();
        let mut words_checked = 0;

        for chunk in chunk_boundaries(text, max_chunk_bytes) {
            let outcome = self.check_text(&text[chunk.start..chunk.end], custom_words, chunk.start)?;
            words_checked += outcome.statistics.words_checked;
            spelling.extend(outcome.spelling.into_iter().map(|mut issue| {
                issue.line += chunk.first_line;
                issue
            }));
        }

        Ok(CheckOutcome {
            spelling,
            statistics: CheckStatistics {
                words_checked,
                processing_time_ms: elapsed_ms(started),
            },
        })
    }

    fn check_code_cached(
        &self,
        dictionary: &LoadedDictionary,
        config: &LanguageConfig,
        code: &str,
        custom_words: &[String],
        custom: &HashSet<String>,
    ) -> CodeCheck {
        let mut sorted_custom: Vec<&String> = custom_words.iter().collect();
        sorted_custom.sort();
        let settings = format!("{}|{}|{:?}", self.settings_key, dictionary.language(), sorted_custom);
        let key = cache_key(code, &config.id, &settings);

        if let Some(hit) = self.cache.get(&key) {
            debug!(language = %config.id, "code check served from cache");
            return hit;
        }

        let checked = self.check_code_uncached(dictionary, config, code, custom);
        self.cache.set(key, checked.clone());
        checked
    }

    fn check_code_uncached(
        &self,
        dictionary: &LoadedDictionary,
        config: &LanguageConfig,
        code: &str,
        custom: &HashSet<String>,
    ) -> CodeCheck {
        let mut tokens = extractor::extract(code, config, &self.settings.extract);
        if let Some(filter) = &self.settings.filter {
            tokens = extractor::filter_content(tokens, filter);
        }

        let mut issues = Vec::new();
        let mut words_checked = 0;

        for token in tokens {
            let severity = severity_for(token.kind);
            let words = match token.kind {
                TokenKind::Identifier => vec![token.text.as_str()],
                TokenKind::Comment | TokenKind::String => {
                    let skips = LineSkips::scan(&token.text);
                    prose::words(&token.text)
                        .into_iter()
                        .filter(|(offset, word)| {
                            let range = *offset..*offset + word.len();
                            !prose::is_skippable_single_letter(word)
                                && !skips.in_url(&range)
                                && !skips.in_email(&range)
                        })
                        .map(|(_, word)| word)
                        .collect()
                }
            };

            for word in words {
                if self.is_ignored(word) {
                    continue;
                }
                words_checked += 1;
                if let Some(issue) = check_word(
                    dictionary,
                    custom,
                    word,
                    token.source_span,
                    token.line,
                    token.column,
                    severity,
                ) {
                    issues.push(issue);
                }
            }
        }

        CodeCheck { issues, words_checked }
    }

    fn is_ignored(&self, word: &str) -> bool {
        self.ignore_patterns.iter().any(|re| re.is_match(word))
    }

    fn finish(
        &self,
        mut issues: Vec<SpellIssue>,
        words_checked: usize,
        chunk_offset: usize,
        started: Instant,
    ) -> CheckOutcome {
        issues.sort_by_key(|issue| (issue.position.start, issue.position.end));
        for issue in &mut issues {
            issue.position = issue.position.shifted(chunk_offset);
        }

        debug!(words_checked, issues = issues.len(), "check finished");
        CheckOutcome {
            spelling: issues,
            statistics: CheckStatistics {
                words_checked,
                processing_time_ms: elapsed_ms(started),
            },
        }
    }
}

fn check_word(
    dictionary: &LoadedDictionary,
    custom: &HashSet<String>,
    word: &str,
    position: Span,
    line: usize,
    column: usize,
    severity: Severity,
) -> Option<SpellIssue> {
    if custom.contains(&word.to_lowercase()) || dictionary.is_correct(word) {
        return None;
    }

    let suggestions = dictionary.suggest(word);
    let confidence = suggestions::confidence(word, &suggestions);
    Some(SpellIssue {
        word: word.to_string(),
        suggestions,
        position,
        line,
        column,
        kind: IssueKind::Spelling,
        severity,
        confidence,
    })
}

fn severity_for(kind: TokenKind) -> Severity {
    match kind {
        TokenKind::Comment | TokenKind::Identifier => Severity::Info,
        TokenKind::String => Severity::Hint,
    }
}

fn lowercase_set(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| w.trim().to_lowercase()).collect()
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    start: usize,
    end: usize,
    /// Lines before this chunk.
    first_line: usize,
}

fn chunk_boundaries(text: &str, max_chunk_bytes: usize) -> Vec<Chunk> {
    let block_lines = regions::code_block_lines(text);
    let code_regions = regions::find_code_regions(text);
    let mut chunks = Vec::new();
    let mut current = Chunk {
        start: 0,
        end: 0,
        first_line: 0,
    };
    let mut prev_in_block = false;

    for (idx, line) in lines_with_offsets(text) {
        let in_block = block_lines.get(idx).copied().unwrap_or(false);
        let would_overflow = line.next - current.start > max_chunk_bytes;
        let can_split = current.end > current.start
            && !in_block
            && !prev_in_block
            && !cuts_region(&code_regions, line.start);

        if would_overflow && can_split {
            chunks.push(current);
            current = Chunk {
                start: line.start,
                end: line.start,
                first_line: idx,
            };
        }
        current.end = line.next;
        prev_in_block = in_block;
    }

    if current.end > current.start {
        chunks.push(current);
    }
    chunks
}

/// True when `offset` falls strictly inside a region, e.g. a multi-line
/// `<pre>` block.
fn cuts_region(regions: &[CodeRegion], offset: usize) -> bool {
    let idx = regions.partition_point(|r| r.end <= offset);
    regions.get(idx).is_some_and(|r| r.start < offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::testing::test_engine;

    async fn checker() -> SpellChecker {
        SpellChecker::new(
            test_engine().await,
            Arc::new(LanguageRegistry::builtin()),
            Arc::new(ResultCache::new(16)),
            CheckSettings::default(),
        )
    }

    fn words(outcome: &CheckOutcome) -> Vec<&str> {
        outcome.spelling.iter().map(|i| i.word.as_str()).collect()
    }

    #[tokio::test]
    async fn test_flags_misspelling_with_suggestion() {
        let checker = checker().await;
        let outcome = checker.check_text("This is mispelled.", &[], 0).unwrap();

        assert_eq!(outcome.spelling.len(), 1);
        let issue = &outcome.spelling[0];
        assert_eq!(issue.word, "mispelled");
        assert!(issue.suggestions.contains(&"misspelled".to_string()));
        assert_eq!(issue.position, Span::new(8, 17));
        assert_eq!((issue.line, issue.column), (1, 9));
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.kind, IssueKind::Spelling);
        assert_eq!(issue.confidence, 0.9);
        assert_eq!(outcome.statistics.words_checked, 3);
    }

    #[tokio::test]
    async fn test_custom_word_is_not_flagged() {
        let checker = checker().await;
        checker.add_custom_word("technicalterm").unwrap();

        let outcome = checker.check_text("a technicalterm here", &[], 0).unwrap();
        assert!(outcome.spelling.is_empty());
    }

    #[tokio::test]
    async fn test_per_call_custom_words() {
        let checker = checker().await;
        let custom = vec!["Frobnicate".to_string()];

        let outcome = checker.check_text("frobnicate the widgt", &custom, 0).unwrap();
        assert_eq!(words(&outcome), vec!["widgt"]);
    }

    #[tokio::test]
    async fn test_inline_code_is_skipped() {
        let checker = checker().await;
        let outcome = checker.check_text("Use the `exampleVar` in your cod.", &[], 0).unwrap();

        assert_eq!(words(&outcome), vec!["cod"]);
        assert!(outcome.spelling[0].suggestions.contains(&"code".to_string()));
    }

    #[tokio::test]
    async fn test_single_letters_urls_and_emails_skipped() {
        let checker = checker().await;
        let text = "See x in https://exmple.org/pagee or mail jdoe@exmaple.com now";
        let outcome = checker.check_text(text, &[], 0).unwrap();

        assert!(outcome.spelling.is_empty(), "{:?}", words(&outcome));
    }

    #[tokio::test]
    async fn test_fenced_code_routed_through_extractor() {
        let checker = checker().await;
        let text = "Some text.\n\n```js\n// the totl\nconst greetng = \"helo\";\n```\n";
        let outcome = checker.check_text(text, &[], 0).unwrap();

        let found: Vec<(&str, Severity, usize)> = outcome
            .spelling
            .iter()
            .map(|i| (i.word.as_str(), i.severity, i.line))
            .collect();
        assert_eq!(
            found,
            vec![
                ("totl", Severity::Info, 4),
                ("greetng", Severity::Info, 5),
                ("helo", Severity::Hint, 5),
            ]
        );

        let comment = &outcome.spelling[0];
        assert_eq!(&text[comment.position.start..comment.position.end], "// the totl");
    }

    #[tokio::test]
    async fn test_code_blocks_can_be_disabled() {
        let engine = test_engine().await;
        let checker = SpellChecker::new(
            engine,
            Arc::new(LanguageRegistry::builtin()),
            Arc::new(ResultCache::new(4)),
            CheckSettings {
                check_code_blocks: false,
                ..Default::default()
            },
        );

        let outcome = checker.check_text("```js\n// totl\n```\n", &[], 0).unwrap();
        assert!(outcome.spelling.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_fence_language_and_indented_code_skipped() {
        let checker = checker().await;
        let text = "```text\nwrongg\n```\n\n    indentd code\n\nHello world";
        let outcome = checker.check_text(text, &[], 0).unwrap();
        assert!(outcome.spelling.is_empty(), "{:?}", words(&outcome));
    }

    #[tokio::test]
    async fn test_chunk_offset_applied() {
        let checker = checker().await;
        let outcome = checker.check_text("hello wrld", &[], 100).unwrap();

        assert_eq!(outcome.spelling[0].position, Span::new(106, 110));
        assert_eq!(outcome.spelling[0].column, 7);
    }

    #[tokio::test]
    async fn test_empty_text() {
        let checker = checker().await;
        let outcome = checker.check_text("", &[], 0).unwrap();
        assert!(outcome.spelling.is_empty());
        assert_eq!(outcome.statistics.words_checked, 0);
    }

    #[tokio::test]
    async fn test_code_results_are_cached() {
        let checker = checker().await;
        let text = "```py\n# retyr\n```\n";

        let first = checker.check_text(text, &[], 0).unwrap();
        let second = checker.check_text(text, &[], 0).unwrap();

        assert_eq!(first.spelling, second.spelling);
        let stats = checker.cache_stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_check_code_for_source_file() {
        let checker = checker().await;
        let code = "def run():\n    # retry twice\n    return \"documentaion\"\n";
        let outcome = checker.check_code(code, "python", &[], 0).unwrap();

        assert_eq!(words(&outcome), vec!["documentaion"]);
        assert_eq!(outcome.spelling[0].line, 3);

        let unknown = checker.check_code(code, "cobol", &[], 0).unwrap();
        assert!(unknown.spelling.is_empty());
    }

    #[tokio::test]
    async fn test_check_batch_keeps_order() {
        let checker = checker().await;
        let texts = vec!["hello wrld".to_string(), "the text".to_string(), "tset".to_string()];

        let results = checker.check_batch(&texts, &[]);
        let counts: Vec<usize> = results.into_iter().map(|r| r.unwrap().spelling.len()).collect();
        assert_eq!(counts, vec![1, 0, 1]);
    }

    #[tokio::test]
    async fn test_check_chunked_matches_single_pass() {
        let checker = checker().await;
        let text = "hello wrld\nsecond line\n```js\n// totl\n```\nthird lien here\n";

        let whole = checker.check_text(text, &[], 0).unwrap();
        let chunked = checker.check_chunked(text, &[], 12).unwrap();

        let summary = |o: &CheckOutcome| -> Vec<(String, Span, usize)> {
            o.spelling.iter().map(|i| (i.word.clone(), i.position, i.line)).collect()
        };
        assert_eq!(summary(&chunked), summary(&whole));
    }

    #[tokio::test]
    async fn test_check_chunked_keeps_html_pre_whole() {
        let checker = checker().await;
        let text = "hello world\n<pre>\nwrongg here\nmore wrongg\n</pre>\nthe text\n";

        let whole = checker.check_text(text, &[], 0).unwrap();
        let chunked = checker.check_chunked(text, &[], 12).unwrap();

        assert!(whole.spelling.is_empty());
        assert_eq!(words(&chunked), words(&whole));

        let chunks = chunk_boundaries(text, 12);
        assert_eq!(chunks.len(), 3);
        assert_eq!(&text[chunks[1].start..chunks[1].end], "<pre>\nwrongg here\nmore wrongg\n</pre>\n");
    }

    #[tokio::test]
    async fn test_ignore_patterns() {
        let checker = checker().await.with_ignore_patterns(&["[A-Z]{2,}".to_string(), "(".to_string()]);
        let outcome = checker.check_text("The NASA wrld", &[], 0).unwrap();
        assert_eq!(words(&outcome), vec!["wrld"]);
    }

    #[tokio::test]
    async fn test_uninitialized_engine_aborts() {
        let engine = Arc::new(DictionaryEngine::builder().build());
        let checker = SpellChecker::new(
            engine,
            Arc::new(LanguageRegistry::builtin()),
            Arc::new(ResultCache::new(4)),
            CheckSettings::default(),
        );

        assert!(checker.check_text("hello", &[], 0).is_err());
    }

    #[test]
    fn test_chunk_boundaries_keep_blocks_whole() {
        let text = "one\n```\na\nb\nc\n```\ntwo\n";
        let chunks = chunk_boundaries(text, 4);

        assert!(chunks.iter().all(|c| {
            let piece = &text[c.start..c.end];
            piece.matches("```").count() % 2 == 0
        }));
        assert_eq!(chunks.first().map(|c| c.start), Some(0));
        assert_eq!(chunks.last().map(|c| c.end), Some(text.len()));
    }
}
