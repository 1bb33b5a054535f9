use std::sync::Arc;

use quiz_core::model::{Item, ItemId, ItemSet, QuizMode, QuizSession, SessionSnapshot};
use quiz_core::quiz::{Question, QuestionGenerator};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::view::{Answer, AnswerFeedback, FinishReason, QuizPhase, SessionView};
use crate::error::QuizError;
use crate::progress::{OrderStore, SessionStore};

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one resumable quiz run over a set.
///
/// `Loading → Active ⇄ Feedback → Finished`, with `restart` returning to
/// `Loading`. Progress lives in the [`SessionStore`]; the controller only keeps
/// the generated questions and the last copy of the session it was handed.
/// A failed answer or proceed leaves the controller as it was.
pub struct QuizController<R = StdRng> {
    sessions: Arc<SessionStore>,
    orders: Arc<OrderStore>,
    generator: QuestionGenerator,
    rng: R,
    phase: QuizPhase,
    set: Option<ItemSet>,
    mode: QuizMode,
    session: Option<QuizSession>,
    questions: Vec<Question>,
    run_length: usize,
    last_feedback: Option<AnswerFeedback>,
}

impl QuizController<StdRng> {
    /// Controller with an OS-seeded RNG.
    #[must_use]
    pub fn new(sessions: Arc<SessionStore>, orders: Arc<OrderStore>) -> Self {
        Self::with_rng(sessions, orders, StdRng::from_os_rng())
    }

    /// Controller with a reproducible shuffle, for tests and replays.
    #[must_use]
    pub fn with_seed(sessions: Arc<SessionStore>, orders: Arc<OrderStore>, seed: u64) -> Self {
        Self::with_rng(sessions, orders, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QuizController<R> {
    #[must_use]
    pub fn with_rng(sessions: Arc<SessionStore>, orders: Arc<OrderStore>, rng: R) -> Self {
        let generator = QuestionGenerator::new(&sessions.policy());
        Self {
            sessions,
            orders,
            generator,
            rng,
            phase: QuizPhase::Loading,
            set: None,
            mode: QuizMode::MultipleChoice,
            session: None,
            questions: Vec::new(),
            run_length: 0,
            last_feedback: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn run_length(&self) -> usize {
        self.run_length
    }

    #[must_use]
    pub fn last_feedback(&self) -> Option<&AnswerFeedback> {
        self.last_feedback.as_ref()
    }

    /// The question awaiting an answer, or the one just answered while in feedback.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            QuizPhase::Active | QuizPhase::Feedback => {
                self.session.as_ref().and_then(|s| self.questions.get(index_of(s)))
            }
            QuizPhase::Loading | QuizPhase::Finished(_) => None,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session
            .as_ref()
            .map(QuizSession::snapshot)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            snapshot: self.snapshot(),
            current_question: self.current_question().cloned(),
            run_length: self.run_length,
        }
    }

    /// Resolve the session and its order, then generate this run's questions.
    ///
    /// A saved order that still matches the set is resumed; otherwise a fresh
    /// shuffle is persisted first. Progress carried over from a discarded
    /// order is reset.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if any store call fails; the
    /// controller is left in `Loading`.
    pub async fn setup_session(
        &mut self,
        set: &ItemSet,
        mode: QuizMode,
    ) -> Result<SessionView, QuizError> {
        self.phase = QuizPhase::Loading;
        self.set = Some(set.clone());
        self.mode = mode;
        self.session = None;
        self.questions.clear();
        self.run_length = 0;
        self.last_feedback = None;

        let mut session = self
            .sessions
            .get_or_create(&set.identity(), mode, set.len())
            .await?;

        if set.is_empty() {
            self.session = Some(session);
            self.phase = QuizPhase::Finished(FinishReason::EmptySet);
            return Ok(self.view());
        }

        let ordered = match self.orders.load(session.id(), set.items()).await? {
            Some(items) => {
                debug!(session = %session.id(), "resuming saved question order");
                items
            }
            None => {
                if session.has_progress() {
                    info!(session = %session.id(), "order went stale; resetting progress");
                    session = self.sessions.restart(session.id()).await?;
                }
                let mut items = set.items().to_vec();
                items.shuffle(&mut self.rng);
                let ids: Vec<ItemId> = items.iter().map(Item::id).collect();
                self.orders.save(session.id(), ids).await?;
                session.set_order_saved(true);
                items
            }
        };

        let batch = self
            .generator
            .batch_for_mode(mode, &ordered, set.items(), &mut self.rng);
        for skipped in &batch.skipped {
            debug!(session = %session.id(), reason = %skipped, "skipping item");
        }

        let total = usize::try_from(session.total_questions()).unwrap_or(usize::MAX);
        self.run_length = total.min(batch.questions.len());
        self.questions = batch.questions;

        self.phase = if self.questions.is_empty() {
            info!(session = %session.id(), items = set.len(), "no answerable items in set");
            QuizPhase::Finished(FinishReason::NoAnswerableContent)
        } else if index_of(&session) >= self.run_length {
            QuizPhase::Finished(FinishReason::Completed)
        } else {
            QuizPhase::Active
        };
        self.session = Some(session);
        Ok(self.view())
    }

    /// Grade `answer` against the current question and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotAwaitingAnswer` outside `Active`,
    /// `QuizError::InvalidSelection` or `QuizError::WrongAnswerKind` for a
    /// malformed answer, and `QuizError::Persistence` if the write fails.
    /// State is unchanged on every error.
    pub async fn submit_answer(&mut self, answer: Answer) -> Result<AnswerFeedback, QuizError> {
        if self.phase != QuizPhase::Active {
            return Err(QuizError::NotAwaitingAnswer);
        }
        let session = self.session.as_ref().ok_or(QuizError::NoSession)?;
        let question = self
            .questions
            .get(index_of(session))
            .ok_or(QuizError::NotAwaitingAnswer)?;

        let is_correct = match (question, &answer) {
            (Question::MultipleChoice(q), Answer::Choice(index)) => {
                if *index >= q.options().len() {
                    return Err(QuizError::InvalidSelection {
                        index: *index,
                        options: q.options().len(),
                    });
                }
                q.is_correct_choice(*index)
            }
            (Question::TextInput(q), Answer::Text(text)) => q.is_correct(text),
            _ => return Err(QuizError::WrongAnswerKind),
        };

        let source_item_id = question.source_item_id();
        let updated = self
            .sessions
            .record_graded_answer(session.id(), source_item_id, is_correct)
            .await?;

        let feedback = AnswerFeedback {
            is_correct,
            correct_answer_text: question.correct_answer_text().to_string(),
            source_item_id,
        };
        self.session = Some(updated);
        self.phase = QuizPhase::Feedback;
        self.last_feedback = Some(feedback.clone());
        Ok(feedback)
    }

    /// Leave feedback: load the next question or finish the run.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotAwaitingProceed` outside `Feedback` and
    /// `QuizError::Persistence` if the write fails.
    pub async fn proceed(&mut self) -> Result<SessionView, QuizError> {
        if self.phase != QuizPhase::Feedback {
            return Err(QuizError::NotAwaitingProceed);
        }
        let session = self.session.as_ref().ok_or(QuizError::NoSession)?;

        if index_of(session) + 1 >= self.run_length {
            let updated = self.sessions.complete(session.id()).await?;
            info!(
                session = %updated.id(),
                score = updated.score(),
                correct = updated.correct_count(),
                incorrect = updated.incorrect_count(),
                "quiz run completed"
            );
            self.session = Some(updated);
            self.phase = QuizPhase::Finished(FinishReason::Completed);
        } else {
            let updated = self.sessions.advance(session.id()).await?;
            self.session = Some(updated);
            self.phase = QuizPhase::Active;
        }
        self.last_feedback = None;
        Ok(self.view())
    }

    /// Zero the session's progress, drop its order, and set up again with a fresh shuffle.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSession` before the first setup and
    /// `QuizError::Persistence` if any store call fails.
    pub async fn restart(&mut self) -> Result<SessionView, QuizError> {
        let session = self.session.as_ref().ok_or(QuizError::NoSession)?;
        let set = self.set.clone().ok_or(QuizError::NoSession)?;

        self.sessions.restart(session.id()).await?;
        info!(session = %session.id(), "restarting quiz");

        let mode = self.mode;
        self.setup_session(&set, mode).await
    }
}

fn index_of(session: &QuizSession) -> usize {
    usize::try_from(session.current_index()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn controller(repo: &InMemoryRepository) -> QuizController {
        let sessions = Arc::new(SessionStore::new(fixed_clock(), Arc::new(repo.clone())));
        let orders = Arc::new(OrderStore::new(Arc::new(repo.clone()), Arc::new(repo.clone())));
        QuizController::with_seed(sessions, orders, 11)
    }

    fn text_set() -> ItemSet {
        let items = ["一", "二"]
            .iter()
            .enumerate()
            .map(|(i, prompt)| {
                Item::new(ItemId::random(), *prompt, format!("r{i}"), format!("m{i}")).unwrap()
            })
            .collect();
        ItemSet::new("N5", "numbers", items).unwrap()
    }

    #[tokio::test]
    async fn submit_before_setup_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut quiz = controller(&repo);
        let err = quiz.submit_answer(Answer::Choice(0)).await.unwrap_err();
        assert!(matches!(err, QuizError::NotAwaitingAnswer));
        assert!(matches!(quiz.restart().await.unwrap_err(), QuizError::NoSession));
    }

    #[tokio::test]
    async fn wrong_answer_kind_leaves_state_unchanged() {
        let repo = InMemoryRepository::new();
        let mut quiz = controller(&repo);
        quiz.setup_session(&text_set(), QuizMode::TextInput).await.unwrap();

        let before = quiz.view();
        let err = quiz.submit_answer(Answer::Choice(0)).await.unwrap_err();
        assert!(matches!(err, QuizError::WrongAnswerKind));
        assert_eq!(quiz.view(), before);
    }

    #[tokio::test]
    async fn proceed_requires_feedback() {
        let repo = InMemoryRepository::new();
        let mut quiz = controller(&repo);
        quiz.setup_session(&text_set(), QuizMode::TextInput).await.unwrap();

        let err = quiz.proceed().await.unwrap_err();
        assert!(matches!(err, QuizError::NotAwaitingProceed));
        assert_eq!(quiz.phase(), QuizPhase::Active);
    }

    #[tokio::test]
    async fn feedback_keeps_the_answered_question_visible() {
        let repo = InMemoryRepository::new();
        let mut quiz = controller(&repo);
        quiz.setup_session(&text_set(), QuizMode::TextInput).await.unwrap();

        let asked = quiz.current_question().cloned().unwrap();
        let feedback = quiz
            .submit_answer(Answer::Text(asked.correct_answer_text().to_uppercase()))
            .await
            .unwrap();

        assert!(feedback.is_correct);
        assert_eq!(feedback.source_item_id, asked.source_item_id());
        assert_eq!(quiz.phase(), QuizPhase::Feedback);
        assert_eq!(quiz.current_question(), Some(&asked));
        assert_eq!(quiz.last_feedback(), Some(&feedback));
    }
}
