use crate::checker::dictionary::normalize_language;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DICTIONARIES_BASE_URL: &str =
    "https://raw.githubusercontent.com/wooorm/dictionaries/main/dictionaries";

/// Hunspell language codes and their directory in the dictionaries repository.
const REMOTE_CODES: &[(&str, &str)] = &[
    ("en_US", "en"),
    ("en_GB", "en-GB"),
    ("en_CA", "en-CA"),
    ("en_AU", "en-AU"),
    ("fr_FR", "fr"),
    ("de_DE", "de"),
    ("es_ES", "es"),
    ("it_IT", "it"),
    ("pt_BR", "pt"),
    ("pt_PT", "pt-PT"),
    ("nl_NL", "nl"),
    ("sv_SE", "sv"),
    ("pl_PL", "pl"),
    ("ru_RU", "ru"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryInfo {
    pub language: String,
    pub dir: PathBuf,
    /// Entry count from the header line of the `.dic` file.
    pub word_count: Option<usize>,
    pub size_bytes: u64,
}

pub fn remote_code(language: &str) -> Option<&'static str> {
    let language = normalize_language(language);
    REMOTE_CODES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, remote)| *remote)
}

/// Languages with both `index.aff` and `index.dic` under `data_dir`, sorted.
pub fn installed_languages(data_dir: &Path) -> Result<Vec<String>> {
    if !data_dir.exists() {
        return Ok(Vec::new());
    }

    let mut languages = Vec::new();
    for entry in fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read dictionary directory: {}", data_dir.display()))?
    {
        let path = entry?.path();
        if path.join("index.aff").is_file() && path.join("index.dic").is_file() {
            if let Some(language) = path.file_name().and_then(|s| s.to_str()) {
                languages.push(language.to_string());
            }
        }
    }
    languages.sort();
    Ok(languages)
}

pub fn dictionary_info(data_dir: &Path, language: &str) -> Result<Option<DictionaryInfo>> {
    let language = normalize_language(language);
    let dir = data_dir.join(&language);
    let aff = dir.join("index.aff");
    let dic = dir.join("index.dic");
    if !aff.is_file() || !dic.is_file() {
        return Ok(None);
    }

    let size_bytes = fs::metadata(&aff)?.len() + fs::metadata(&dic)?.len();
    let contents = fs::read_to_string(&dic)
        .with_context(|| format!("Failed to read {}", dic.display()))?;
    let word_count = contents
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
        .and_then(|count| count.parse().ok());

    Ok(Some(DictionaryInfo {
        language,
        dir,
        word_count,
        size_bytes,
    }))
}

pub fn list_dictionaries(data_dir: &Path) -> Result<()> {
    let languages = installed_languages(data_dir)?;

    if languages.is_empty() {
        println!("{}", "No dictionaries installed.".yellow());
        println!(
            "Run {} to download a dictionary.",
            "mdspell dict download en_US".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed dictionaries:".bold());
    println!();

    for language in &languages {
        let size = dictionary_info(data_dir, language)?
            .map(|info| info.size_bytes / 1024)
            .unwrap_or(0);
        println!(
            "  {} {} ({})",
            "✓".green(),
            language.cyan().bold(),
            format!("{}KB", size).dimmed()
        );
    }

    println!();
    println!(
        "Data directory: {}",
        data_dir.display().to_string().dimmed()
    );

    Ok(())
}

pub fn download_dictionary(data_dir: &Path, language: &str) -> Result<()> {
    let language = normalize_language(language);
    let Some(remote) = remote_code(&language) else {
        let known: Vec<&str> = REMOTE_CODES.iter().map(|(code, _)| *code).collect();
        anyhow::bail!(
            "Language '{}' is not available for download. Known languages: {}",
            language,
            known.join(", ")
        );
    };

    println!(
        "{} Hunspell dictionary for {}...",
        "Downloading".cyan().bold(),
        language.yellow()
    );

    let target = data_dir.join(&language);
    fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create {}", target.display()))?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    for file in ["index.aff", "index.dic"] {
        let url = format!("{}/{}/{}", DICTIONARIES_BASE_URL, remote, file);
        pb.set_message(format!("Fetching {}", file));
        tracing::debug!(%url, "downloading dictionary file");

        let response = reqwest::blocking::get(&url)
            .with_context(|| format!("Failed to download {}", url))?;
        if !response.status().is_success() {
            pb.abandon_with_message("Download failed");
            anyhow::bail!("Failed to download {}: HTTP {}", url, response.status());
        }
        let body = response.bytes()?;
        fs::write(target.join(file), &body)
            .with_context(|| format!("Failed to write {}", target.join(file).display()))?;
    }
    pb.finish_with_message("Download complete");

    println!(
        "{} Dictionary installed: {}",
        "✓".green().bold(),
        target.display().to_string().cyan()
    );

    Ok(())
}

pub fn show_info(data_dir: &Path, language: &str) -> Result<()> {
    let Some(info) = dictionary_info(data_dir, language)? else {
        println!(
            "{} Dictionary for {} not found.",
            "✗".red().bold(),
            language.yellow()
        );
        println!(
            "Run {} to download it.",
            format!("mdspell dict download {}", language).cyan()
        );
        return Ok(());
    };

    println!("{}", format!("Dictionary: {}", info.language).bold());
    println!("  Path: {}", info.dir.display());
    println!("  Size: {} KB", info.size_bytes / 1024);
    println!("  Format: Hunspell (.aff/.dic)");
    match info.word_count {
        Some(count) => println!("  Words: {}", count),
        None => println!("  Words: {}", "Unknown".yellow()),
    }
    if let Some(remote) = remote_code(&info.language) {
        println!("  Source: {}/{}", DICTIONARIES_BASE_URL, remote);
    }

    Ok(())
}
