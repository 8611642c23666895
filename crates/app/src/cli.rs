use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quiz_core::model::{CategoryId, QuestionId, QuestionType};

#[derive(Parser, Debug)]
#[command(name = "quiz", about = "Import question banks and practise them in the terminal", version)]
pub struct Cli {
    /// SQLite database holding the quiz snapshot
    #[arg(long, global = true, env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3")]
    pub db: String,

    /// Questions drawn per random exam
    #[arg(long, global = true, env = "QUIZ_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Delay before `n` moves to the next question, in milliseconds
    #[arg(long, global = true, env = "QUIZ_ADVANCE_DELAY_MS", default_value_t = 0)]
    pub advance_delay_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import questions from a text file, or stdin when no file is given
    Import(ImportArgs),
    /// List categories with question counts and random-exam progress
    Categories,
    /// Study with immediate feedback
    Study(ScopeArgs),
    /// Sequential exam, scored on submit
    Exam(ScopeArgs),
    /// Random exam over unserved questions of a category, or the whole library
    Random(RandomArgs),
    /// Forget which questions of a category were already served
    ResetProgress {
        #[arg(long, value_parser = parse_category)]
        category: CategoryId,
    },
    /// Show wrong-question statistics, study them or clear them
    Wrong(WrongArgs),
    /// Remove a question from the wrong list
    Master {
        #[arg(value_parser = parse_question)]
        question: QuestionId,
    },
    /// Delete a category together with its questions
    DeleteCategory {
        #[arg(value_parser = parse_category)]
        category: CategoryId,
    },
    /// Delete a single question
    DeleteQuestion {
        #[arg(value_parser = parse_question)]
        question: QuestionId,
    },
    /// Find questions whose content contains the query
    Search {
        query: String,
        /// Start a study session over the results
        #[arg(long)]
        study: bool,
    },
    /// List submitted exams
    History,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    pub file: Option<PathBuf>,

    /// Create (or merge into) a category with this name
    #[arg(long, conflicts_with = "category", required_unless_present = "category")]
    pub new_category: Option<String>,

    /// Append to an existing category
    #[arg(long, value_parser = parse_category)]
    pub category: Option<CategoryId>,
}

#[derive(Args, Debug)]
pub struct ScopeArgs {
    /// Limit to one category (whole library when omitted)
    #[arg(long, value_parser = parse_category)]
    pub category: Option<CategoryId>,

    /// Limit to one question type: single, multiple, judgment, fill, essay
    #[arg(long = "type", value_parser = parse_type)]
    pub question_type: Option<QuestionType>,
}

#[derive(Args, Debug)]
pub struct RandomArgs {
    /// Category to draw from (whole-library mock exam when omitted)
    #[arg(long, value_parser = parse_category)]
    pub category: Option<CategoryId>,

    #[arg(long = "type", value_parser = parse_type, requires = "category")]
    pub question_type: Option<QuestionType>,

    /// Reset progress without asking when the pool is exhausted
    #[arg(long, requires = "category")]
    pub reset_if_exhausted: bool,
}

#[derive(Args, Debug)]
pub struct WrongArgs {
    #[arg(long, value_parser = parse_category)]
    pub category: Option<CategoryId>,

    /// Study the wrong questions
    #[arg(long, conflicts_with = "clear")]
    pub study: bool,

    /// Clear wrong entries of `--category`
    #[arg(long, requires = "category")]
    pub clear: bool,

    /// With `--clear`, only this question type
    #[arg(long = "type", value_parser = parse_type, requires = "clear")]
    pub question_type: Option<QuestionType>,
}

fn parse_type(raw: &str) -> Result<QuestionType, String> {
    QuestionType::from_name(raw).ok_or_else(|| {
        format!("unknown question type `{raw}` (expected single, multiple, judgment, fill or essay)")
    })
}

fn parse_category(raw: &str) -> Result<CategoryId, String> {
    raw.parse().map_err(|e| format!("{e}"))
}

fn parse_question(raw: &str) -> Result<QuestionId, String> {
    raw.parse().map_err(|e| format!("{e}"))
}
