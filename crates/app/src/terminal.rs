//! Line-oriented quiz front-end on stdin/stdout.

use std::io::Write;

use quiz_core::model::{Question, QuizResult};
use services::{AdvanceOutcome, CommandError, DisplaySurface, QuizCommands, SessionState};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const PROGRESS_WIDTH: usize = 20;

/// Renders questions, progress and results as plain text.
#[derive(Debug, Default)]
pub struct TerminalDisplay;

impl DisplaySurface for TerminalDisplay {
    fn render_question(&self, question: &Question, index: usize, total: usize) {
        println!();
        if question.category().is_empty() {
            println!("Question {} of {total}", index + 1);
        } else {
            println!("Question {} of {total} [{}]", index + 1, question.category());
        }
        println!("{}", question.text());
        for (position, option) in question.options().iter().enumerate() {
            println!("  {}) {option}", position + 1);
        }
    }

    fn render_result(&self, score: u32, total: u32, percentage: u32) {
        println!();
        println!("Quiz finished: {score} of {total} correct ({percentage}%)");
    }

    fn render_progress(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let filled = (fraction * PROGRESS_WIDTH as f64).round() as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (fraction * 100.0).round() as u32;
        println!(
            "[{}{}] {percent}%",
            "#".repeat(filled),
            "-".repeat(PROGRESS_WIDTH - filled)
        );
    }
}

/// Outcome of an interactive run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The quiz was finished (and possibly replayed).
    Finished,
    /// The user left mid-quiz; progress stays saved for `resume`.
    Suspended,
}

/// Drive the engine from user input until the quiz ends or the user quits.
///
/// # Errors
///
/// Returns `std::io::Error` if stdin cannot be read.
pub async fn run_quiz(commands: &mut QuizCommands) -> std::io::Result<LoopExit> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        report_warnings(commands);
        match commands.engine().state() {
            SessionState::Idle => return Ok(LoopExit::Finished),
            SessionState::InProgress => {
                let options = commands
                    .engine()
                    .session()
                    .and_then(|session| session.current_question())
                    .map_or(0, |question| question.options().len());
                let Some(line) = prompt(&mut input, &format!("Answer 1-{options} (q to quit): ")).await?
                else {
                    return Ok(LoopExit::Suspended);
                };
                if is_quit(&line) {
                    return Ok(LoopExit::Suspended);
                }
                answer(commands, &line).await;
            }
            SessionState::Answered => {
                let Some(line) = prompt(&mut input, "Enter for next, q to quit: ").await? else {
                    return Ok(LoopExit::Suspended);
                };
                if is_quit(&line) {
                    return Ok(LoopExit::Suspended);
                }
                match commands.next().await {
                    Ok(AdvanceOutcome::Finished(result)) => print_result_details(&result),
                    Ok(AdvanceOutcome::Question { .. }) => {}
                    Err(err) => print_errors(&err),
                }
            }
            SessionState::Finished => {
                let Some(line) = prompt(&mut input, "r to replay, Enter to exit: ").await? else {
                    return Ok(LoopExit::Finished);
                };
                if line.trim().eq_ignore_ascii_case("r") {
                    if let Err(err) = commands.restart().await {
                        print_errors(&err);
                    }
                } else {
                    return Ok(LoopExit::Finished);
                }
            }
        }
    }
}

async fn answer(commands: &mut QuizCommands, line: &str) {
    let Ok(choice) = line.trim().parse::<usize>() else {
        println!("Please enter the number of an option.");
        return;
    };
    let Some(index) = choice.checked_sub(1) else {
        println!("Options start at 1.");
        return;
    };
    if let Err(err) = commands.select(index) {
        print_errors(&err);
        return;
    }

    match commands.submit().await {
        Ok(feedback) => {
            if feedback.record.is_correct {
                println!("Correct!");
            } else {
                let correct_text = commands
                    .engine()
                    .session()
                    .and_then(|session| session.current_question())
                    .and_then(|question| question.options().get(feedback.record.correct_index))
                    .cloned()
                    .unwrap_or_default();
                println!(
                    "Wrong. The answer is {}) {correct_text}",
                    feedback.record.correct_index + 1
                );
            }
            if let Some(explanation) = feedback.explanation {
                println!("{explanation}");
            }
            println!("Score: {}", feedback.score);
            if feedback.is_last {
                println!("That was the last question.");
            }
        }
        Err(err) => print_errors(&err),
    }
}

fn print_result_details(result: &QuizResult) {
    let seconds = result.elapsed().num_seconds();
    println!(
        "{}: finished in {}m {:02}s at {}",
        result.quiz_name,
        seconds / 60,
        seconds % 60,
        result.completed_at.format("%Y-%m-%d %H:%M")
    );
    for (position, record) in result.answers.iter().enumerate() {
        let mark = if record.is_correct { "+" } else { "-" };
        println!("  {mark} {}. {}", position + 1, record.question_text);
    }
}

pub fn print_errors(err: &CommandError) {
    for message in err.messages() {
        eprintln!("error: {message}");
    }
}

fn report_warnings(commands: &mut QuizCommands) {
    for warning in commands.take_storage_warnings() {
        eprintln!("warning: {warning}");
    }
}

fn is_quit(line: &str) -> bool {
    matches!(line.trim(), "q" | "Q" | "quit")
}

async fn prompt(input: &mut Lines<BufReader<Stdin>>, text: &str) -> std::io::Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    input.next_line().await
}
