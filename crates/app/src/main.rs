use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::model::{QuestionSetId, Settings};
use quiz_core::validation::ValidationMode;
use services::{AppServices, AppServicesError, Clock, CommandError, FileSummary, QuizCommands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod terminal;

use terminal::{LoopExit, TerminalDisplay, print_errors, run_quiz};

const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidSwitch { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { raw } => write!(f, "invalid question set id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSwitch { flag, raw } => {
                write!(f, "{flag} expects on or off, got: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

/// Everything `run` can fail with.
#[derive(Debug)]
enum AppError {
    Args(ArgsError),
    Init(AppServicesError),
    Command(CommandError),
    Io(std::io::Error),
}

impl AppError {
    fn messages(&self) -> Vec<String> {
        match self {
            AppError::Command(err) => err.messages(),
            other => vec![other.to_string()],
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Args(err) => write!(f, "{err}"),
            AppError::Init(err) => write!(f, "{err}"),
            AppError::Command(err) => write!(f, "{err}"),
            AppError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ArgsError> for AppError {
    fn from(err: ArgsError) -> Self {
        AppError::Args(err)
    }
}

impl From<AppServicesError> for AppError {
    fn from(err: AppServicesError) -> Self {
        AppError::Init(err)
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        AppError::Command(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz play [<id> | --sample]        # resume, or start a stored set");
    eprintln!("  quiz play-file <file> [--lenient]  # play a file without storing it");
    eprintln!("  quiz resume");
    eprintln!("  quiz import <file> [--name <name>]");
    eprintln!("  quiz list");
    eprintln!("  quiz delete <id>");
    eprintln!("  quiz stats");
    eprintln!("  quiz export [<file>]");
    eprintln!("  quiz restore <file>");
    eprintln!("  quiz clear                         # delete every set and saved progress");
    eprintln!("  quiz settings [--show-explanations on|off] [--randomize-questions on|off]");
    eprintln!("                [--randomize-options on|off] [--dark-mode on|off]");
    eprintln!();
    eprintln!("Every command accepts --db <sqlite_url> (default {DEFAULT_DB_URL}).");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlayTarget {
    ResumeOrFirst,
    Stored(QuestionSetId),
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingKey {
    ShowExplanations,
    RandomizeQuestions,
    RandomizeOptions,
    DarkMode,
}

impl SettingKey {
    fn from_flag(flag: &str) -> Option<(Self, &'static str)> {
        match flag {
            "--show-explanations" => Some((Self::ShowExplanations, "--show-explanations")),
            "--randomize-questions" => Some((Self::RandomizeQuestions, "--randomize-questions")),
            "--randomize-options" => Some((Self::RandomizeOptions, "--randomize-options")),
            "--dark-mode" => Some((Self::DarkMode, "--dark-mode")),
            _ => None,
        }
    }

    fn apply(self, settings: &mut Settings, value: bool) {
        match self {
            Self::ShowExplanations => settings.show_explanations = value,
            Self::RandomizeQuestions => settings.randomize_questions = value,
            Self::RandomizeOptions => settings.randomize_options = value,
            Self::DarkMode => settings.dark_mode = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Play(PlayTarget),
    PlayFile { path: PathBuf, lenient: bool },
    Resume,
    Import { path: PathBuf, name: Option<String> },
    List,
    Delete(QuestionSetId),
    Stats,
    Export(Option<PathBuf>),
    Restore(PathBuf),
    Clear,
    Settings(Vec<(SettingKey, bool)>),
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);

        let mut args = argv.into_iter();
        let Some(name) = args.next() else {
            return Ok(Some(Self {
                db_url,
                command: Command::Play(PlayTarget::ResumeOrFirst),
            }));
        };
        if matches!(name.as_str(), "--help" | "-h" | "help") {
            return Ok(None);
        }
        // Leading flags without a subcommand apply to `play`.
        let (name, leading) = if name.starts_with("--") {
            ("play".to_string(), Some(name))
        } else {
            (name, None)
        };
        let mut args = leading.into_iter().chain(args);

        let mut positional = Vec::new();
        let mut lenient = false;
        let mut sample = false;
        let mut set_name = None;
        let mut changes = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--help" | "-h" => return Ok(None),
                "--lenient" if name == "play-file" => lenient = true,
                "--sample" if name == "play" => sample = true,
                "--name" if name == "import" => set_name = Some(require_value(&mut args, "--name")?),
                flag if name == "settings" && SettingKey::from_flag(flag).is_some() => {
                    if let Some((key, flag)) = SettingKey::from_flag(flag) {
                        let raw = require_value(&mut args, flag)?;
                        changes.push((key, parse_switch(flag, raw)?));
                    }
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(flag.to_owned())),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let command = match name.as_str() {
            "play" => match positional.next() {
                _ if sample => Command::Play(PlayTarget::Sample),
                Some(raw) => Command::Play(PlayTarget::Stored(parse_id(raw)?)),
                None => Command::Play(PlayTarget::ResumeOrFirst),
            },
            "play-file" => Command::PlayFile {
                path: positional
                    .next()
                    .map(PathBuf::from)
                    .ok_or(ArgsError::MissingArgument { what: "question file" })?,
                lenient,
            },
            "resume" => Command::Resume,
            "import" => Command::Import {
                path: positional
                    .next()
                    .map(PathBuf::from)
                    .ok_or(ArgsError::MissingArgument { what: "question file" })?,
                name: set_name,
            },
            "list" => Command::List,
            "delete" => Command::Delete(parse_id(
                positional
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "question set id" })?,
            )?),
            "stats" => Command::Stats,
            "export" => Command::Export(positional.next().map(PathBuf::from)),
            "restore" => Command::Restore(
                positional
                    .next()
                    .map(PathBuf::from)
                    .ok_or(ArgsError::MissingArgument { what: "backup file" })?,
            ),
            "clear" => Command::Clear,
            "settings" => Command::Settings(changes),
            _ => return Err(ArgsError::UnknownArg(name)),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self { db_url, command }))
    }
}

fn parse_id(raw: String) -> Result<QuestionSetId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { raw })
}

fn parse_switch(flag: &'static str, raw: String) -> Result<bool, ArgsError> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ArgsError::InvalidSwitch { flag, raw }),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), AppError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn describe_file(summary: FileSummary) -> String {
    format!(
        "{} questions, {} categories",
        summary.question_count, summary.category_count
    )
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "Untitled".into(), |stem| stem.to_string_lossy().into_owned())
}

async fn play(commands: &mut QuizCommands, target: PlayTarget) -> Result<(), AppError> {
    match target {
        PlayTarget::ResumeOrFirst => {
            if commands.resume().await? {
                println!("Resuming your saved quiz.");
            } else {
                commands.start_default().await?;
            }
        }
        // A fresh process is idle, so starting overwrites any saved progress.
        PlayTarget::Stored(id) => commands.start_stored(id).await?,
        PlayTarget::Sample => commands.start_sample().await?,
    }
    interact(commands).await
}

async fn interact(commands: &mut QuizCommands) -> Result<(), AppError> {
    if run_quiz(commands).await? == LoopExit::Suspended {
        println!();
        println!("Progress saved. Run `quiz resume` to continue.");
    }
    Ok(())
}

async fn run() -> Result<(), AppError> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let Some(parsed) = Args::parse(argv).inspect_err(|_| print_usage())? else {
        print_usage();
        return Ok(());
    };

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::system()).await?;
    tracing::debug!(db = %parsed.db_url, "storage ready");
    let mut commands = app.commands(Arc::new(TerminalDisplay)).await;

    match parsed.command {
        Command::Play(target) => play(&mut commands, target).await?,
        Command::PlayFile { path, lenient } => {
            let raw = tokio::fs::read_to_string(&path).await?;
            let mode = if lenient {
                ValidationMode::Lenient
            } else {
                ValidationMode::Strict
            };
            let summary = commands.play_file(&file_stem(&path), &raw, mode).await?;
            println!("Loaded {}.", describe_file(summary));
            interact(&mut commands).await?;
        }
        Command::Resume => {
            if commands.resume().await? {
                interact(&mut commands).await?;
            } else {
                println!("No saved quiz to resume.");
            }
        }
        Command::Import { path, name } => {
            let raw = tokio::fs::read_to_string(&path).await?;
            let name = name.unwrap_or_else(|| file_stem(&path));
            let (id, summary) = commands.upload(&name, &raw).await?;
            println!(
                "Imported \"{name}\" as question set {id} ({}).",
                describe_file(summary)
            );
        }
        Command::List => {
            let summaries = commands.list().await?;
            if summaries.is_empty() {
                println!("No question sets stored. Import one with `quiz import <file>`.");
            }
            for summary in summaries {
                println!(
                    "{:>4}  {}  ({} questions; {})  uploaded {}",
                    summary.id.value(),
                    summary.name,
                    summary.question_count,
                    summary.categories.join(", "),
                    summary.uploaded_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Delete(id) => {
            commands.delete(id).await?;
            println!("Deleted question set {id}.");
        }
        Command::Stats => {
            let stats = commands.stats().await;
            println!("Question sets:  {}", stats.file_count);
            println!("Questions:      {}", stats.total_questions);
            println!("Categories:     {}", stats.total_categories);
            println!("Estimated size: {} KB", stats.estimated_size_kb);
        }
        Command::Export(path) => {
            let backup = commands.export().await?;
            match path {
                Some(path) => {
                    tokio::fs::write(&path, backup).await?;
                    println!("Backup written to {}.", path.display());
                }
                None => println!("{backup}"),
            }
        }
        Command::Restore(path) => {
            let raw = tokio::fs::read_to_string(&path).await?;
            let restored = commands.restore(&raw).await?;
            println!("Restored {restored} question sets.");
        }
        Command::Clear => {
            commands.clear_all().await?;
            println!("Deleted every question set and saved quiz. Settings were kept.");
        }
        Command::Settings(changes) => {
            let settings = if changes.is_empty() {
                commands.load_settings().await
            } else {
                commands
                    .update_settings(|settings| {
                        for (key, value) in changes {
                            key.apply(settings, value);
                        }
                    })
                    .await?
            };
            println!("show explanations:   {}", on_off(settings.show_explanations));
            println!("randomize questions: {}", on_off(settings.randomize_questions));
            println!("randomize options:   {}", on_off(settings.randomize_options));
            println!("dark mode:           {}", on_off(settings.dark_mode));
        }
    }

    for warning in commands.take_storage_warnings() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        match &err {
            AppError::Command(command) => print_errors(command),
            other => {
                for message in other.messages() {
                    eprintln!("error: {message}");
                }
            }
        }
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Args::parse(args.iter().map(|s| (*s).to_string()).collect())
            .unwrap()
            .unwrap()
            .command
    }

    #[test]
    fn no_arguments_resumes_or_plays_first_set() {
        assert_eq!(parse(&[]), Command::Play(PlayTarget::ResumeOrFirst));
    }

    #[test]
    fn leading_flags_apply_to_play() {
        assert_eq!(
            parse(&["--db", "/tmp/q.sqlite3"]),
            Command::Play(PlayTarget::ResumeOrFirst)
        );
    }

    #[test]
    fn play_accepts_id_or_sample() {
        assert_eq!(
            parse(&["play", "3"]),
            Command::Play(PlayTarget::Stored(QuestionSetId::new(3)))
        );
        assert_eq!(parse(&["play", "--sample"]), Command::Play(PlayTarget::Sample));
    }

    #[test]
    fn settings_flags_parse_switches() {
        assert_eq!(
            parse(&["settings", "--dark-mode", "on", "--show-explanations", "off"]),
            Command::Settings(vec![
                (SettingKey::DarkMode, true),
                (SettingKey::ShowExplanations, false)
            ])
        );
    }

    #[test]
    fn clear_takes_no_arguments() {
        assert_eq!(parse(&["clear"]), Command::Clear);
        assert!(matches!(
            Args::parse(vec!["clear".into(), "now".into()]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn file_summary_reads_as_counts() {
        let summary = FileSummary {
            question_count: 3,
            category_count: 2,
        };
        assert_eq!(describe_file(summary), "3 questions, 2 categories");
    }

    #[test]
    fn db_flag_is_normalised() {
        let args = Args::parse(vec!["list".into(), "--db".into(), "/tmp/q.sqlite3".into()])
            .unwrap()
            .unwrap();
        assert_eq!(args.db_url, "sqlite:///tmp/q.sqlite3");
        assert_eq!(args.command, Command::List);
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(matches!(
            Args::parse(vec!["delete".into(), "abc".into()]),
            Err(ArgsError::InvalidId { .. })
        ));
        assert!(matches!(
            Args::parse(vec!["import".into()]),
            Err(ArgsError::MissingArgument { .. })
        ));
        assert!(matches!(
            Args::parse(vec!["list".into(), "--lenient".into()]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            Args::parse(vec!["settings".into(), "--dark-mode".into(), "maybe".into()]),
            Err(ArgsError::InvalidSwitch { .. })
        ));
    }
}
