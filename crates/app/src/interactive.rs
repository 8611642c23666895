use std::io::{BufRead, Write};

use services::{QuizError, QuizService, QuizSession};

use crate::render;

const HELP: &str = "输入答案作答 | n 下一题 | p 上一题 | r 显示答案 | s 交卷 | q 退出";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Next,
    Previous,
    Reveal,
    Submit,
    Quit,
    Help,
    Answer(String),
}

impl Input {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let input = match line {
            "" => return None,
            "n" => Input::Next,
            "p" => Input::Previous,
            "r" => Input::Reveal,
            "s" => Input::Submit,
            "q" => Input::Quit,
            "h" | "?" => Input::Help,
            answer => Input::Answer(answer.to_owned()),
        };
        Some(input)
    }
}

fn confirm(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> std::io::Result<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Asks before resetting an exhausted random pool.
///
/// # Errors
///
/// Returns an I/O error if reading or writing fails.
pub fn confirm_reset(input: &mut impl BufRead, out: &mut impl Write) -> std::io::Result<bool> {
    confirm(input, out, "该类型题目已全部做完！是否重置进度重新开始？")
}

/// Drives one session from line-based input until the user quits or input ends.
///
/// # Errors
///
/// Returns I/O errors and storage failures raised while submitting.
pub async fn run_session(
    service: &mut QuizService,
    mut session: QuizSession,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<QuizSession, Box<dyn std::error::Error>> {
    writeln!(out, "== {} ==", session.title())?;
    writeln!(out, "{HELP}")?;
    let mut dirty = true;

    loop {
        if dirty {
            if let Some(view) = service.context().view(&session) {
                render::question_view(out, &view)?;
            }
            dirty = false;
        }
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // End of input counts as an explicit quit.
            session.discard(true)?;
            return Ok(session);
        }

        // A delayed advance may have come due while waiting for input.
        if service.context().tick(&mut session) {
            if let Some(view) = service.context().view(&session) {
                render::question_view(out, &view)?;
            }
        }
        let Some(command) = Input::parse(&line) else {
            continue;
        };

        dirty = match command {
            Input::Next => service.context().next(&mut session),
            Input::Previous => session.retreat(),
            Input::Reveal => session.reveal(),
            Input::Help => {
                writeln!(out, "{HELP}")?;
                false
            }
            Input::Answer(value) => {
                let accepted = session.answer_current(&value);
                if !accepted {
                    writeln!(out, "已交卷，答案不可修改")?;
                }
                accepted
            }
            Input::Submit => match service.submit(&mut session).await {
                Ok(result) => {
                    render::submission(out, &result.outcome)?;
                    true
                }
                Err(QuizError::Session(err)) => {
                    writeln!(out, "{err}")?;
                    false
                }
                Err(err) => return Err(err.into()),
            },
            Input::Quit => {
                if session.needs_discard_confirmation()
                    && !confirm(input, out, "退出将丢失本次作答，确定退出？")?
                {
                    false
                } else {
                    session.discard(true)?;
                    return Ok(session);
                }
            }
        };
    }
}
