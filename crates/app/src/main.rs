mod cli;
mod db;
mod interactive;
mod render;

use std::io::{self, BufRead, Read, Write};

use clap::Parser;
use quiz_core::model::CategoryId;
use services::{
    Clock, ImportTarget, QuestionScope, QuizService, QuizSession, QuizSettings, RandomStart,
    SessionKind,
};
use storage::repository::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ImportArgs, RandomArgs, ScopeArgs, WrongArgs};

fn init_tracing() {
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn settings_from(cli: &Cli) -> QuizSettings {
    let settings = QuizSettings::default().with_advance_delay_ms(cli.advance_delay_ms);
    match cli.batch_size {
        Some(size) => settings.with_random_batch_size(size),
        None => settings,
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let location = db::DbLocation::parse(&cli.db)?;
    location.ensure_parent_dir()?;
    let db_url = location.url();
    let storage = Storage::sqlite(&db_url).await?;
    info!(db = %db_url, "storage ready");

    let mut service = QuizService::load(storage.snapshots, Clock::system(), settings_from(&cli)).await?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Import(args) => import(&mut service, args, &mut input, &mut out).await?,
        Command::Categories => categories(&service, &mut out)?,
        Command::Study(args) => {
            let session = start_scoped(&mut service, args, SessionKind::Study)?;
            interactive::run_session(&mut service, session, &mut input, &mut out).await?;
        }
        Command::Exam(args) => {
            let session = start_scoped(&mut service, args, SessionKind::SequentialExam)?;
            interactive::run_session(&mut service, session, &mut input, &mut out).await?;
        }
        Command::Random(args) => {
            if let Some(session) = start_random(&mut service, args, &mut input, &mut out).await? {
                interactive::run_session(&mut service, session, &mut input, &mut out).await?;
            }
        }
        Command::ResetProgress { category } => {
            service.reset_progress(&category).await?;
            writeln!(out, "进度已重置")?;
        }
        Command::Wrong(args) => wrong(&mut service, args, &mut input, &mut out).await?,
        Command::Master { question } => {
            if service.master_question(&question).await? {
                writeln!(out, "已移出错题本: {question}")?;
            } else {
                writeln!(out, "不在错题本中: {question}")?;
            }
        }
        Command::DeleteCategory { category } => {
            let removed = service.delete_category(&category).await?;
            writeln!(out, "已删除分类 {category} 及 {removed} 道题目")?;
        }
        Command::DeleteQuestion { question } => {
            let removed = service.delete_question(&question).await?;
            writeln!(out, "已删除题目 {}", removed.id)?;
        }
        Command::Search { query, study } => {
            if study {
                let session = service.context_mut().start_search_study(&query)?;
                interactive::run_session(&mut service, session, &mut input, &mut out).await?;
            } else {
                let found = service.context().search(&query);
                for question in &found {
                    render::question_line(&mut out, question)?;
                }
                writeln!(out, "共 {} 题", found.len())?;
            }
        }
        Command::History => {
            let history = service.context().exam_history();
            if history.is_empty() {
                writeln!(out, "暂无考试记录")?;
            }
            for record in history {
                render::exam_record(&mut out, record)?;
            }
        }
    }
    Ok(())
}

async fn import(
    service: &mut QuizService,
    args: ImportArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            input.read_to_string(&mut text)?;
            text
        }
    };
    let target = match (args.new_category, args.category) {
        (_, Some(id)) => ImportTarget::Existing(id),
        (Some(name), None) => ImportTarget::NewCategory(name),
        (None, None) => ImportTarget::NewCategory(String::new()),
    };
    let report = service.import(&text, target).await?;
    render::import_report(out, &report)?;
    Ok(())
}

fn categories(service: &QuizService, out: &mut impl Write) -> Result<(), Box<dyn std::error::Error>> {
    let context = service.context();
    for category in context.categories() {
        let progress = context.category_progress(&category.id)?;
        let groups = context.type_groups(&QuestionScope::Category(category.id.clone()))?;
        render::category_line(out, category, &progress, &groups)?;
    }
    Ok(())
}

fn start_scoped(
    service: &mut QuizService,
    args: ScopeArgs,
    kind: SessionKind,
) -> Result<QuizSession, Box<dyn std::error::Error>> {
    let scope = args
        .category
        .map_or(QuestionScope::Library, QuestionScope::Category);
    Ok(service
        .context_mut()
        .start_grouped(&scope, args.question_type, kind)?)
}

async fn start_random(
    service: &mut QuizService,
    args: RandomArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<QuizSession>, Box<dyn std::error::Error>> {
    let Some(category) = args.category else {
        return Ok(Some(service.context_mut().start_full_mock_exam()?));
    };

    match service
        .context_mut()
        .start_random_exam(&category, args.question_type)?
    {
        RandomStart::Started(session) => Ok(Some(session)),
        RandomStart::Exhausted { .. } => {
            if args.reset_if_exhausted || interactive::confirm_reset(input, out)? {
                let session = service
                    .restart_random_exam(&category, args.question_type)
                    .await?;
                Ok(Some(session))
            } else {
                Ok(None)
            }
        }
    }
}

async fn wrong(
    service: &mut QuizService,
    args: WrongArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.clear {
        let category: CategoryId = args.category.ok_or("--clear needs --category")?;
        let removed = service.clear_wrong(&category, args.question_type).await?;
        writeln!(out, "已清除 {removed} 道错题")?;
        return Ok(());
    }
    if args.study {
        let session = service
            .context_mut()
            .start_wrong_review(args.category.as_ref())?;
        interactive::run_session(service, session, input, out).await?;
        return Ok(());
    }
    render::wrong_stats(out, &service.context().wrong_stats())?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}
