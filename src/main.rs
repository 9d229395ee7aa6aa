use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use mdspell::cli::output::{self, FileReport, OutputFormat};
use mdspell::config::Overrides;
use mdspell::dict::manager;
use mdspell::parser::FileType;
use mdspell::{CheckOutcome, CheckSettings, Config, DictionaryEngine, LanguageRegistry, ResultCache, SpellChecker};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "mdspell")]
#[command(version, about = "A code-fence-aware spellchecker for Markdown", long_about = None)]
struct Cli {
    /// Files to check
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Dictionary language (e.g., en_US, en_GB)
    #[arg(short, long, env = "MDSPELL_LANGUAGE")]
    language: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Extra word to accept (repeatable)
    #[arg(short = 'w', long = "custom-word", value_name = "WORD")]
    custom_words: Vec<String>,

    /// Personal dictionary file, one word per line
    #[arg(long)]
    personal_dict: Option<PathBuf>,

    /// Directory holding Hunspell dictionaries (<dir>/<lang>/index.aff|dic)
    #[arg(long, env = "MDSPELL_DICT_DIR")]
    dict_dir: Option<PathBuf>,

    /// Do not check comments, strings and identifiers in fenced code
    #[arg(long)]
    no_code: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if errors are found
    #[arg(long)]
    no_fail: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
    /// List supported code block languages and their aliases
    Languages,
}

#[derive(Subcommand, Debug)]
enum DictCommands {
    /// List installed dictionaries
    List,
    /// Download a Hunspell dictionary
    Download {
        /// Language code (e.g., en_US, en_GB, fr_FR)
        language: String,
    },
    /// Show dictionary info
    Info {
        /// Language code
        language: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "mdspell", &mut io::stdout());
        return Ok(());
    }

    mdspell::logging::init_logging(cli.verbose, cli.no_color);
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Some(command) = cli.command {
        return handle_command(command, cli.dict_dir);
    }

    if cli.files.is_empty() {
        anyhow::bail!("No files specified. Use --help for usage information.");
    }

    let config = Config::load(Overrides {
        language: cli.language,
        dictionary_dir: cli.dict_dir,
        personal_dictionary: cli.personal_dict,
        custom_words: cli.custom_words,
        no_code: cli.no_code,
    })?;
    debug!(?config, "configuration loaded");

    let checker = build_checker(&config)?;
    let custom_words = config.all_custom_words()?;
    let colored_output = !cli.no_color;

    let mut results: Vec<(PathBuf, CheckOutcome)> = Vec::new();
    for path in &cli.files {
        if !path.exists() {
            eprintln!("Error: File not found: {}", path.display());
            continue;
        }

        let outcome = check_file(&checker, path, &custom_words)?;
        info!(
            file = %path.display(),
            issues = outcome.error_count(),
            words = outcome.statistics.words_checked,
            "checked file"
        );
        if cli.format == OutputFormat::Text {
            output::print_issues(path, &outcome, colored_output);
        }
        results.push((path.clone(), outcome));
    }

    let total_issues: usize = results.iter().map(|(_, o)| o.error_count()).sum();
    match cli.format {
        OutputFormat::Json => {
            let reports: Vec<FileReport<'_>> = results
                .iter()
                .map(|(path, outcome)| FileReport {
                    file: path.display().to_string(),
                    outcome,
                })
                .collect();
            output::print_json(&reports)?;
        }
        OutputFormat::Text => output::print_check_summary(total_issues, results.len(), colored_output),
    }

    if total_issues > 0 && !cli.no_fail {
        std::process::exit(1);
    }

    Ok(())
}

fn build_checker(config: &Config) -> Result<SpellChecker> {
    let mut builder = DictionaryEngine::builder()
        .primary_language(&config.language)
        .max_suggestions(config.max_suggestions);
    if let Some(dir) = &config.dictionary_dir {
        builder = builder.with_directory(dir);
    }
    let engine = builder.with_default_locations().build();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime
        .block_on(engine.init())
        .context("Failed to load dictionary")?;

    let checker = SpellChecker::new(
        Arc::new(engine),
        Arc::new(LanguageRegistry::builtin()),
        Arc::new(ResultCache::new(config.cache_size)),
        CheckSettings::from_config(config),
    )
    .with_ignore_patterns(&config.ignore_patterns);
    Ok(checker)
}

fn check_file(checker: &SpellChecker, path: &Path, custom_words: &[String]) -> Result<CheckOutcome> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let outcome = match FileType::from_path(path, checker.languages()) {
        FileType::Markdown | FileType::PlainText => checker.check_text(&content, custom_words, 0)?,
        FileType::SourceCode(language) => checker.check_code(&content, &language, custom_words, 0)?,
    };
    Ok(outcome)
}

fn handle_command(command: Commands, dict_dir: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Dict { action } => {
            let data_dir = match dict_dir {
                Some(dir) => dir,
                None => Config::dictionary_data_dir().context("Failed to get data directory")?,
            };
            match action {
                DictCommands::List => manager::list_dictionaries(&data_dir)?,
                DictCommands::Download { language } => manager::download_dictionary(&data_dir, &language)?,
                DictCommands::Info { language } => manager::show_info(&data_dir, &language)?,
            }
        }
        Commands::Languages => {
            let registry = LanguageRegistry::builtin();
            for id in registry.list_supported() {
                let aliases = registry.aliases_for(&id);
                if aliases.is_empty() {
                    println!("{}", id);
                } else {
                    println!("{} ({})", id, aliases.join(", "));
                }
            }
        }
    }
    Ok(())
}
