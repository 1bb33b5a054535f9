//! Line-based terminal front end for a [`QuizController`].

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use quiz_core::model::{ItemSet, QuizMode, SessionSnapshot};
use quiz_core::quiz::Question;
use services::{Answer, FinishReason, QuizController, QuizError, QuizPhase};

pub const QUIT: &str = ":q";

/// How a terminal run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished(FinishReason),
    /// The user quit (or input ended); progress stays resumable.
    Quit,
}

pub struct Driver<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Driver<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Play `set` until it finishes or the user quits.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and on any controller error other than a bad selection.
    pub async fn run(
        &mut self,
        quiz: &mut QuizController,
        set: &ItemSet,
        mode: QuizMode,
    ) -> Result<Outcome> {
        let mut view = quiz.setup_session(set, mode).await?;
        writeln!(
            self.output,
            "{} [{}] · {} · type {QUIT} to stop",
            set.identity(),
            set.level(),
            mode
        )?;

        loop {
            match view.phase {
                QuizPhase::Finished(reason) => {
                    self.print_summary(reason, &view.snapshot)?;
                    return Ok(Outcome::Finished(reason));
                }
                QuizPhase::Feedback => view = quiz.proceed().await?,
                QuizPhase::Loading => bail!("quiz did not finish loading"),
                QuizPhase::Active => {
                    let Some(question) = view.current_question.clone() else {
                        bail!("active quiz has no current question");
                    };
                    self.print_question(&question, &view.snapshot, view.run_length)?;

                    let Some(line) = self.read_line()? else {
                        return Ok(Outcome::Quit);
                    };
                    if line == QUIT {
                        writeln!(self.output, "Progress saved.")?;
                        return Ok(Outcome::Quit);
                    }

                    let Some(answer) = parse_answer(&question, &line) else {
                        if let Question::MultipleChoice(q) = &question {
                            writeln!(self.output, "Choose a number from 1 to {}.", q.options().len())?;
                        }
                        continue;
                    };

                    match quiz.submit_answer(answer).await {
                        Ok(feedback) if feedback.is_correct => writeln!(self.output, "Correct!")?,
                        Ok(feedback) => writeln!(
                            self.output,
                            "Wrong. Answer: {}",
                            feedback.correct_answer_text
                        )?,
                        Err(QuizError::InvalidSelection { options, .. }) => {
                            writeln!(self.output, "Choose a number from 1 to {options}.")?;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                    view = quiz.proceed().await?;
                }
            }
        }
    }

    fn print_question(
        &mut self,
        question: &Question,
        snapshot: &SessionSnapshot,
        run_length: usize,
    ) -> Result<()> {
        writeln!(self.output)?;
        writeln!(
            self.output,
            "[{}/{}] score {}",
            snapshot.current_index + 1,
            run_length,
            snapshot.score
        )?;
        writeln!(self.output, "  {}", question.prompt_text())?;
        if let Question::MultipleChoice(q) = question {
            for (i, option) in q.options().iter().enumerate() {
                writeln!(self.output, "  {}) {option}", i + 1)?;
            }
        }
        write!(self.output, "> ")?;
        self.output.flush()?;
        Ok(())
    }

    fn print_summary(&mut self, reason: FinishReason, snapshot: &SessionSnapshot) -> Result<()> {
        match reason {
            FinishReason::Completed => writeln!(
                self.output,
                "Finished: score {} ({} correct, {} wrong)",
                snapshot.score, snapshot.correct_count, snapshot.incorrect_count
            )?,
            FinishReason::NoAnswerableContent => {
                writeln!(self.output, "Nothing in this set can be asked in this mode.")?;
            }
            FinishReason::EmptySet => writeln!(self.output, "This set has no items.")?,
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Choices are typed 1-based.
fn parse_answer(question: &Question, line: &str) -> Option<Answer> {
    match question {
        Question::MultipleChoice(_) => line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map(Answer::Choice),
        Question::TextInput(_) => Some(Answer::Text(line.to_string())),
    }
}
