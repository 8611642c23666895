use std::io::{self, Write};

use quiz_core::model::{Category, ExamRecord, ExamMode, Question};
use services::{
    CategoryProgress, ImportReport, OptionState, QuestionView, SubmissionOutcome, TypeGroup,
    WrongStats,
};

pub fn question_view(out: &mut impl Write, view: &QuestionView) -> io::Result<()> {
    write!(
        out,
        "\n[{}/{}] {}",
        view.position,
        view.total,
        view.question_type.label()
    )?;
    if let Some(name) = &view.category_name {
        write!(out, " · {name}")?;
    }
    if view.is_wrong_before() {
        write!(out, "  (错 {} 次)", view.wrong_count)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", view.content)?;

    for choice in &view.choices {
        let mark = match choice.state {
            OptionState::Neutral => " ",
            OptionState::Selected => "*",
            OptionState::Correct => "✓",
            OptionState::Incorrect => "✗",
        };
        writeln!(out, "  [{mark}] {}. {}", choice.key, choice.text)?;
    }
    if view.choices.is_empty() {
        if let Some(answer) = &view.user_answer {
            writeln!(out, "  你的答案: {answer}")?;
        }
    }

    if let Some(reference) = &view.reference_answer {
        let verdict = match view.is_correct {
            Some(true) => "正确",
            Some(false) => "错误",
            None => "",
        };
        writeln!(out, "参考答案: {reference}  {verdict}")?;
    }
    if let Some(explanation) = &view.explanation {
        writeln!(out, "解析: {explanation}")?;
    }
    Ok(())
}

pub fn submission(out: &mut impl Write, outcome: &SubmissionOutcome) -> io::Result<()> {
    writeln!(
        out,
        "\n交卷完成: {}/{} 正确, {} 题答错",
        outcome.score,
        outcome.total,
        outcome.wrong_ids.len()
    )
}

pub fn import_report(out: &mut impl Write, report: &ImportReport) -> io::Result<()> {
    let verb = if report.merged { "合并导入" } else { "导入" };
    writeln!(
        out,
        "成功{verb} {} 题到 \"{}\" ({})",
        report.imported, report.category_name, report.category_id
    )
}

pub fn category_line(
    out: &mut impl Write,
    category: &Category,
    progress: &CategoryProgress,
    groups: &[TypeGroup],
) -> io::Result<()> {
    write!(
        out,
        "{}  {}  {} 题, 随机进度 {}/{}",
        category.id, category.name, progress.total, progress.served, progress.total
    )?;
    if !groups.is_empty() {
        let parts: Vec<String> = groups
            .iter()
            .map(|g| format!("{} {}", g.label, g.count))
            .collect();
        write!(out, "  [{}]", parts.join(", "))?;
    }
    writeln!(out)
}

pub fn wrong_stats(out: &mut impl Write, stats: &WrongStats) -> io::Result<()> {
    writeln!(out, "全部错题: {} 题", stats.all_wrong.len())?;
    if stats.by_category.is_empty() {
        return writeln!(out, "暂无分类错题数据");
    }
    for entry in &stats.by_category {
        writeln!(out, "  {}  {}  {} 题", entry.category_id, entry.name, entry.count)?;
    }
    Ok(())
}

pub fn question_line(out: &mut impl Write, question: &Question) -> io::Result<()> {
    let first_line = question.content.lines().next().unwrap_or_default();
    writeln!(
        out,
        "{}  [{}]  {}",
        question.id,
        question.question_type.label(),
        first_line
    )
}

pub fn exam_record(out: &mut impl Write, record: &ExamRecord) -> io::Result<()> {
    let mode = match record.mode {
        ExamMode::Random => "随机",
        ExamMode::Sequential => "顺序",
    };
    writeln!(
        out,
        "{}  {}  {}/{} ({}%)",
        record.taken_at.format("%Y-%m-%d %H:%M"),
        mode,
        record.score,
        record.total,
        record.percent()
    )
}
