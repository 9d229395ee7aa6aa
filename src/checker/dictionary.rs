use crate::checker::suggestions;
use crate::error::{FailureReason, Result, SpellError, StrategyFailure};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_LANGUAGE: &str = "en_US";

const SYSTEM_DICTIONARY_ROOTS: &[&str] = &[
    "/usr/share/hunspell",
    "/usr/share/myspell",
    "/usr/share/myspell/dicts",
    "/Library/Spelling",
];

/// Raw Hunspell affix and dictionary file contents.
#[derive(Debug, Clone)]
pub struct DictionarySource {
    pub aff: String,
    pub dic: String,
}

/// One way of obtaining a dictionary. Strategies are tried in order and the
/// first that yields a parseable dictionary wins.
#[derive(Debug, Clone)]
pub enum LoadStrategy {
    /// Sources handed to the engine up front, e.g. via `include_str!`.
    Inline(Arc<HashMap<String, DictionarySource>>),
    /// `<dir>/<lang>/index.aff` or `<dir>/<lang>.aff`.
    Directory(PathBuf),
    /// `<root>/<lang>.aff` under the usual system locations.
    System(Vec<PathBuf>),
}

impl LoadStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LoadStrategy::Inline(_) => "inline",
            LoadStrategy::Directory(_) => "directory",
            LoadStrategy::System(_) => "system",
        }
    }

    async fn fetch(&self, language: &str) -> std::result::Result<DictionarySource, StrategyFailure> {
        let fail = |reason| StrategyFailure {
            strategy: self.name(),
            reason,
        };

        match self {
            LoadStrategy::Inline(sources) => sources
                .get(language)
                .cloned()
                .ok_or_else(|| fail(FailureReason::NotRegistered)),
            LoadStrategy::Directory(dir) => {
                let candidates = [
                    (dir.join(language).join("index.aff"), dir.join(language).join("index.dic")),
                    (dir.join(format!("{language}.aff")), dir.join(format!("{language}.dic"))),
                ];
                read_first_pair(&candidates).await.map_err(fail)
            }
            LoadStrategy::System(roots) => {
                let candidates: Vec<_> = roots
                    .iter()
                    .map(|root| (root.join(format!("{language}.aff")), root.join(format!("{language}.dic"))))
                    .collect();
                read_first_pair(&candidates).await.map_err(fail)
            }
        }
    }
}

async fn read_first_pair(candidates: &[(PathBuf, PathBuf)]) -> std::result::Result<DictionarySource, FailureReason> {
    for (aff_path, dic_path) in candidates {
        if tokio::fs::metadata(aff_path).await.is_err() {
            continue;
        }
        let aff = read(aff_path).await?;
        let dic = read(dic_path).await?;
        return Ok(DictionarySource { aff, dic });
    }
    Err(FailureReason::NotFound(
        candidates.iter().map(|(aff, _)| aff.clone()).collect(),
    ))
}

async fn read(path: &Path) -> std::result::Result<String, FailureReason> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FailureReason::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

async fn parse(source: DictionarySource) -> std::result::Result<spellbook::Dictionary, FailureReason> {
    tokio::task::spawn_blocking(move || {
        spellbook::Dictionary::new(&source.aff, &source.dic).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| FailureReason::Parse(e.to_string()))?
    .map_err(FailureReason::Parse)
}

/// `en-us` and `en_us` both become `en_US`.
pub fn normalize_language(code: &str) -> String {
    let mut parts = code.trim().split(['-', '_']);
    let mut normalized = parts.next().unwrap_or_default().to_lowercase();
    for part in parts {
        normalized.push('_');
        normalized.push_str(&part.to_uppercase());
    }
    normalized
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LanguageState {
    Loading,
    Loaded,
    /// Load failed; the code is served by the primary dictionary.
    Fallback,
}

struct DictionaryData {
    hunspell: spellbook::Dictionary,
    custom: HashSet<String>,
}

/// A loaded dictionary plus its runtime custom words.
pub struct LoadedDictionary {
    language: String,
    data: RwLock<DictionaryData>,
    max_suggestions: usize,
}

impl std::fmt::Debug for LoadedDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedDictionary")
            .field("language", &self.language)
            .field("custom_words", &self.data.read().custom.len())
            .finish()
    }
}

impl LoadedDictionary {
    fn new(language: &str, hunspell: spellbook::Dictionary, max_suggestions: usize) -> Self {
        Self {
            language: language.to_string(),
            data: RwLock::new(DictionaryData {
                hunspell,
                custom: HashSet::new(),
            }),
            max_suggestions,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_correct(&self, word: &str) -> bool {
        let data = self.data.read();
        data.custom.contains(&word.to_lowercase()) || data.hunspell.check(word)
    }

    /// Candidates from the affix dictionary, single edits it accepts, and
    /// nearby custom words, ranked by edit distance.
    pub fn suggest(&self, word: &str) -> Vec<String> {
        let lower = word.to_lowercase();
        let mut candidates = Vec::new();
        {
            let data = self.data.read();
            data.hunspell.suggest(word, &mut candidates);

            for variant in suggestions::generate_transformations(&lower) {
                if data.custom.contains(&variant) || data.hunspell.check(&variant) {
                    candidates.push(variant);
                }
            }

            let mut custom: Vec<&String> = data
                .custom
                .iter()
                .filter(|c| suggestions::edit_distance(&lower, c) <= 2)
                .collect();
            custom.sort();
            candidates.extend(custom.into_iter().cloned());
        }

        suggestions::rank(word, candidates, self.max_suggestions)
    }

    /// Adds to the exact-match set and to the affix dictionary under one
    /// write lock.
    pub fn add_custom_word(&self, word: &str) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }
        let mut data = self.data.write();
        data.custom.insert(word.to_lowercase());
        add_to_hunspell(&mut data.hunspell, word);
    }

    /// Replaces the exact-match set. Words already added to the affix
    /// dictionary stay there.
    pub fn set_custom_words<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = self.data.write();
        data.custom.clear();
        for word in words {
            let word = word.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            data.custom.insert(word.to_lowercase());
            add_to_hunspell(&mut data.hunspell, word);
        }
    }

    pub fn custom_words(&self) -> Vec<String> {
        let mut words: Vec<String> = self.data.read().custom.iter().cloned().collect();
        words.sort();
        words
    }
}

fn add_to_hunspell(hunspell: &mut spellbook::Dictionary, word: &str) {
    // A slash would be read as the start of an affix flag set.
    if word.contains('/') {
        return;
    }
    if let Err(e) = hunspell.add(word) {
        warn!(word, error = %e, "could not add custom word to dictionary");
    }
}

/// Per-language dictionaries with an eagerly loaded primary language.
///
/// Secondary languages load on first request through
/// [`DictionaryEngine::ensure_language`]. If every strategy fails for one,
/// the primary dictionary serves that code instead.
pub struct DictionaryEngine {
    primary: String,
    strategies: Vec<LoadStrategy>,
    dictionaries: DashMap<String, Arc<LoadedDictionary>>,
    states: DashMap<String, LanguageState>,
    max_suggestions: usize,
}

impl std::fmt::Debug for DictionaryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryEngine")
            .field("primary", &self.primary)
            .field("strategies", &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("languages", &self.language_states())
            .finish()
    }
}

impl DictionaryEngine {
    pub fn builder() -> DictionaryEngineBuilder {
        DictionaryEngineBuilder::default()
    }

    pub fn primary_language(&self) -> &str {
        &self.primary
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Load the primary dictionary. Failure here is fatal.
    pub async fn init(&self) -> Result<()> {
        if self.dictionaries.contains_key(&self.primary) {
            return Ok(());
        }

        self.states.insert(self.primary.clone(), LanguageState::Loading);
        match self.load(&self.primary).await {
            Ok(dictionary) => {
                info!(language = %self.primary, "primary dictionary loaded");
                self.dictionaries.insert(self.primary.clone(), Arc::new(dictionary));
                self.states.insert(self.primary.clone(), LanguageState::Loaded);
                Ok(())
            }
            Err(attempts) => {
                self.states.remove(&self.primary);
                Err(SpellError::DictionaryUnavailable {
                    language: self.primary.clone(),
                    attempts,
                })
            }
        }
    }

    /// Load `language` if needed. Secondary languages that cannot be loaded
    /// fall back to the primary dictionary with a warning.
    pub async fn ensure_language(&self, language: &str) -> Result<Arc<LoadedDictionary>> {
        let code = normalize_language(language);
        if let Some(dictionary) = self.dictionaries.get(&code) {
            return Ok(Arc::clone(dictionary.value()));
        }
        if code == self.primary {
            self.init().await?;
            return self.dictionary(&code);
        }

        let primary = self.primary_dictionary()?;
        self.states.insert(code.clone(), LanguageState::Loading);

        match self.load(&code).await {
            Ok(dictionary) => {
                info!(language = %code, "dictionary loaded");
                let dictionary = Arc::new(dictionary);
                self.dictionaries.insert(code.clone(), Arc::clone(&dictionary));
                self.states.insert(code, LanguageState::Loaded);
                Ok(dictionary)
            }
            Err(attempts) => {
                let reasons: Vec<String> = attempts.iter().map(|a| a.to_string()).collect();
                warn!(
                    language = %code,
                    fallback = %self.primary,
                    attempts = ?reasons,
                    "dictionary unavailable, using primary language"
                );
                self.dictionaries.insert(code.clone(), Arc::clone(&primary));
                self.states.insert(code, LanguageState::Fallback);
                Ok(primary)
            }
        }
    }

    /// Already-loaded dictionary for `language`, or the primary one if that
    /// language has not been loaded. Never performs I/O.
    pub fn dictionary(&self, language: &str) -> Result<Arc<LoadedDictionary>> {
        let code = normalize_language(language);
        if let Some(dictionary) = self.dictionaries.get(&code) {
            return Ok(Arc::clone(dictionary.value()));
        }
        debug!(language = %code, "language not loaded, using primary dictionary");
        self.primary_dictionary()
    }

    fn primary_dictionary(&self) -> Result<Arc<LoadedDictionary>> {
        self.dictionaries
            .get(&self.primary)
            .map(|d| Arc::clone(d.value()))
            .ok_or_else(|| SpellError::NotInitialized {
                language: self.primary.clone(),
            })
    }

    pub fn is_correct(&self, word: &str) -> Result<bool> {
        Ok(self.primary_dictionary()?.is_correct(word))
    }

    pub fn suggest(&self, word: &str) -> Result<Vec<String>> {
        Ok(self.primary_dictionary()?.suggest(word))
    }

    pub fn add_custom_word(&self, word: &str) -> Result<()> {
        self.primary_dictionary()?.add_custom_word(word);
        Ok(())
    }

    pub fn set_custom_words<I, S>(&self, words: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.primary_dictionary()?.set_custom_words(words);
        Ok(())
    }

    pub fn language_states(&self) -> Vec<(String, LanguageState)> {
        let mut states: Vec<_> = self
            .states
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    async fn load(&self, language: &str) -> std::result::Result<LoadedDictionary, Vec<StrategyFailure>> {
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            let source = match strategy.fetch(language).await {
                Ok(source) => source,
                Err(failure) => {
                    debug!(language, %failure, "dictionary strategy failed");
                    attempts.push(failure);
                    continue;
                }
            };

            match parse(source).await {
                Ok(hunspell) => {
                    debug!(language, strategy = strategy.name(), "dictionary parsed");
                    return Ok(LoadedDictionary::new(language, hunspell, self.max_suggestions));
                }
                Err(reason) => attempts.push(StrategyFailure {
                    strategy: strategy.name(),
                    reason,
                }),
            }
        }

        Err(attempts)
    }
}

#[derive(Debug)]
pub struct DictionaryEngineBuilder {
    primary: String,
    inline: HashMap<String, DictionarySource>,
    directories: Vec<PathBuf>,
    system_roots: Vec<PathBuf>,
    max_suggestions: usize,
}

impl Default for DictionaryEngineBuilder {
    fn default() -> Self {
        Self {
            primary: DEFAULT_LANGUAGE.to_string(),
            inline: HashMap::new(),
            directories: Vec::new(),
            system_roots: Vec::new(),
            max_suggestions: 5,
        }
    }
}

impl DictionaryEngineBuilder {
    pub fn primary_language(mut self, language: &str) -> Self {
        self.primary = normalize_language(language);
        self
    }

    pub fn with_inline(mut self, language: &str, aff: impl Into<String>, dic: impl Into<String>) -> Self {
        self.inline.insert(
            normalize_language(language),
            DictionarySource {
                aff: aff.into(),
                dic: dic.into(),
            },
        );
        self
    }

    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    /// The user data directory followed by the system Hunspell locations.
    pub fn with_default_locations(mut self) -> Self {
        if let Some(data_dir) = crate::config::Config::dictionary_data_dir() {
            self.directories.push(data_dir);
        }
        self.system_roots
            .extend(SYSTEM_DICTIONARY_ROOTS.iter().map(PathBuf::from));
        self
    }

    pub fn with_system_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.system_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn build(self) -> DictionaryEngine {
        let mut strategies = Vec::new();
        if !self.inline.is_empty() {
            strategies.push(LoadStrategy::Inline(Arc::new(self.inline)));
        }
        strategies.extend(self.directories.into_iter().map(LoadStrategy::Directory));
        if !self.system_roots.is_empty() {
            strategies.push(LoadStrategy::System(self.system_roots));
        }

        DictionaryEngine {
            primary: self.primary,
            strategies,
            dictionaries: DashMap::new(),
            states: DashMap::new(),
            max_suggestions: self.max_suggestions,
        }
    }
}
