use quiz_core::model::{ItemId, SessionSnapshot};
use quiz_core::quiz::Question;

/// A user's response to the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Index into the multiple-choice options.
    Choice(usize),
    /// Free-text response.
    Text(String),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Completed,
    /// Items exist but none could be turned into a question.
    NoAnswerableContent,
    EmptySet,
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Loading,
    Active,
    Feedback,
    Finished(FinishReason),
}

impl QuizPhase {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, QuizPhase::Finished(_))
    }
}

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer_text: String,
    pub source_item_id: ItemId,
}

/// What the presentation layer needs to render the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: QuizPhase,
    pub snapshot: SessionSnapshot,
    pub current_question: Option<Question>,
    /// Questions reachable in this run: `min(total_questions, generated)`.
    pub run_length: usize,
}

impl SessionView {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    #[must_use]
    pub fn finish_reason(&self) -> Option<FinishReason> {
        match self.phase {
            QuizPhase::Finished(reason) => Some(reason),
            _ => None,
        }
    }
}
