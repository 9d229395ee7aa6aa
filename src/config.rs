use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = ".mdspell.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub language: String,
    pub dictionary_dir: Option<PathBuf>,
    pub personal_dictionary: Option<PathBuf>,
    pub custom_words: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub max_suggestions: usize,
    pub check_code_blocks: bool,
    pub check_comments: bool,
    pub check_strings: bool,
    pub check_identifiers: bool,
    pub cache_size: usize,
    /// Drop extracted code tokens outside `min_token_length..=max_token_length`.
    pub filter_tokens: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
            dictionary_dir: None,
            personal_dictionary: None,
            custom_words: Vec::new(),
            ignore_patterns: vec![
                r"[A-Z0-9_]{2,}".to_string(), // ALL_CAPS
                r"[a-fA-F0-9]{32,}".to_string(), // Hashes
            ],
            max_suggestions: 5,
            check_code_blocks: true,
            check_comments: true,
            check_strings: true,
            check_identifiers: true,
            cache_size: 100,
            filter_tokens: false,
            min_token_length: 3,
            max_token_length: 50,
        }
    }
}

/// A config file as written by the user. Missing keys keep the value from
/// the layer below.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    language: Option<String>,
    dictionary_dir: Option<PathBuf>,
    personal_dictionary: Option<PathBuf>,
    custom_words: Option<Vec<String>>,
    ignore_patterns: Option<Vec<String>>,
    max_suggestions: Option<usize>,
    check_code_blocks: Option<bool>,
    check_comments: Option<bool>,
    check_strings: Option<bool>,
    check_identifiers: Option<bool>,
    cache_size: Option<usize>,
    filter_tokens: Option<bool>,
    min_token_length: Option<usize>,
    max_token_length: Option<usize>,
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub language: Option<String>,
    pub dictionary_dir: Option<PathBuf>,
    pub personal_dictionary: Option<PathBuf>,
    pub custom_words: Vec<String>,
    pub no_code: bool,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    pub fn load(overrides: Overrides) -> Result<Self> {
        let global = Self::global_config_path();
        Self::load_from(global.as_deref(), Path::new(LOCAL_CONFIG_FILE), overrides)
    }

    pub fn load_from(global: Option<&Path>, local: &Path, overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        for path in global.into_iter().chain([local]) {
            if path.exists() {
                config.merge(Self::read_file(path)?);
            }
        }

        if let Some(language) = overrides.language {
            config.language = language;
        }
        if overrides.dictionary_dir.is_some() {
            config.dictionary_dir = overrides.dictionary_dir;
        }
        if overrides.personal_dictionary.is_some() {
            config.personal_dictionary = overrides.personal_dictionary;
        }
        config.custom_words.extend(overrides.custom_words);
        if overrides.no_code {
            config.check_code_blocks = false;
        }

        if config.personal_dictionary.is_none() {
            config.personal_dictionary = Self::default_personal_dict_path();
        }

        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(value) = file.language {
            self.language = value;
        }
        if let Some(value) = file.custom_words {
            self.custom_words = value;
        }
        if let Some(value) = file.ignore_patterns {
            self.ignore_patterns = value;
        }
        if let Some(value) = file.max_suggestions {
            self.max_suggestions = value;
        }
        if let Some(value) = file.check_code_blocks {
            self.check_code_blocks = value;
        }
        if let Some(value) = file.check_comments {
            self.check_comments = value;
        }
        if let Some(value) = file.check_strings {
            self.check_strings = value;
        }
        if let Some(value) = file.check_identifiers {
            self.check_identifiers = value;
        }
        if let Some(value) = file.cache_size {
            self.cache_size = value;
        }
        if let Some(value) = file.filter_tokens {
            self.filter_tokens = value;
        }
        if let Some(value) = file.min_token_length {
            self.min_token_length = value;
        }
        if let Some(value) = file.max_token_length {
            self.max_token_length = value;
        }
        if file.dictionary_dir.is_some() {
            self.dictionary_dir = file.dictionary_dir;
        }
        if file.personal_dictionary.is_some() {
            self.personal_dictionary = file.personal_dictionary;
        }
    }

    /// Config custom words plus the personal dictionary, if it exists.
    pub fn all_custom_words(&self) -> Result<Vec<String>> {
        let mut words = self.custom_words.clone();
        if let Some(path) = &self.personal_dictionary {
            if path.exists() {
                words.extend(read_word_list(path)?);
            }
        }
        Ok(words)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn default_personal_dict_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("personal.txt"))
    }

    /// Where `mdspell dict download` installs Hunspell files.
    pub fn dictionary_data_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_dir().join("dictionaries"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mdspell")
}

/// One word per line. Blank lines and `#` comments are ignored.
pub fn read_word_list(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read word list: {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
