use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use thiserror::Error;

use crate::model::{Item, ItemId, QuizMode, is_blank};
use crate::policy::QuizPolicy;
use crate::quiz::question::{
    MultipleChoiceKind, MultipleChoiceQuestion, Question, TextInputKind, TextInputQuestion,
};

/// Reasons an item could not be turned into a question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("item {item} has neither reading nor meaning to ask about")]
    Ungradeable { item: ItemId },

    #[error("question kind {kind} cannot be asked for item {item}")]
    IneligibleKind { item: ItemId, kind: &'static str },

    #[error("no usable distractors for item {item}")]
    NotEnoughDistractors { item: ItemId },

    #[error("correct answer lost while shuffling options for item {item}")]
    CorrectAnswerMissing { item: ItemId },
}

/// Questions produced from an ordered item list, plus the items that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedBatch<Q> {
    pub questions: Vec<Q>,
    pub skipped: Vec<GenerateError>,
}

impl<Q> Default for GeneratedBatch<Q> {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Builds ephemeral questions from items.
///
/// Pure: output depends only on the inputs and the injected RNG.
#[derive(Debug, Clone, Copy)]
pub struct QuestionGenerator {
    max_options: usize,
}

impl Default for QuestionGenerator {
    fn default() -> Self {
        Self::new(&QuizPolicy::default())
    }
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(policy: &QuizPolicy) -> Self {
        Self {
            max_options: policy.max_options(),
        }
    }

    /// Build a multiple-choice question for `item`, drawing distractors from `pool`.
    ///
    /// `pool` may contain `item` itself; it is never used as its own distractor.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError` when the item lacks the needed attributes, the
    /// forced kind is not eligible, or no distinct distractor exists.
    pub fn multiple_choice<R: Rng + ?Sized>(
        &self,
        item: &Item,
        pool: &[Item],
        forced: Option<MultipleChoiceKind>,
        rng: &mut R,
    ) -> Result<MultipleChoiceQuestion, GenerateError> {
        let eligible: Vec<MultipleChoiceKind> = MultipleChoiceKind::ALL
            .into_iter()
            .filter(|kind| kind.is_eligible(item))
            .collect();
        let kind = pick_kind(item, &eligible, forced, MultipleChoiceKind::as_str, rng)?;

        let correct = kind.answer(item);
        let mut candidates: Vec<&Item> = pool
            .iter()
            .filter(|other| {
                let value = kind.answer(other);
                other.id() != item.id() && value != correct && !is_blank(value)
            })
            .collect();
        candidates.shuffle(rng);

        let mut options = vec![correct.to_owned()];
        for candidate in candidates {
            if options.len() >= self.max_options {
                break;
            }
            let value = kind.answer(candidate);
            if !options.iter().any(|o| o == value) {
                options.push(value.to_owned());
            }
        }

        if options.len() < 2 {
            return Err(GenerateError::NotEnoughDistractors { item: item.id() });
        }

        options.shuffle(rng);
        let correct_index = options
            .iter()
            .position(|o| o == correct)
            .ok_or(GenerateError::CorrectAnswerMissing { item: item.id() })?;

        Ok(MultipleChoiceQuestion::new(
            item.id(),
            kind.cue(item).to_owned(),
            options,
            correct_index,
            kind,
        ))
    }

    /// Build a free-text question for `item`.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError` when the item lacks the needed attributes or the
    /// forced kind is not eligible.
    pub fn text_input<R: Rng + ?Sized>(
        &self,
        item: &Item,
        forced: Option<TextInputKind>,
        rng: &mut R,
    ) -> Result<TextInputQuestion, GenerateError> {
        let eligible: Vec<TextInputKind> = TextInputKind::ALL
            .into_iter()
            .filter(|kind| kind.is_eligible(item))
            .collect();
        let kind = pick_kind(item, &eligible, forced, TextInputKind::as_str, rng)?;

        Ok(TextInputQuestion::new(
            item.id(),
            item.prompt().to_owned(),
            kind.answer(item).to_owned(),
            kind,
        ))
    }

    /// Generate one multiple-choice question per item, skipping items that fail.
    pub fn multiple_choice_batch<R: Rng + ?Sized>(
        &self,
        items: &[Item],
        pool: &[Item],
        rng: &mut R,
    ) -> GeneratedBatch<MultipleChoiceQuestion> {
        let mut batch = GeneratedBatch::default();
        for item in items {
            match self.multiple_choice(item, pool, None, rng) {
                Ok(q) => batch.questions.push(q),
                Err(e) => batch.skipped.push(e),
            }
        }
        batch
    }

    /// Generate one text-input question per item, skipping items that fail.
    pub fn text_input_batch<R: Rng + ?Sized>(
        &self,
        items: &[Item],
        rng: &mut R,
    ) -> GeneratedBatch<TextInputQuestion> {
        let mut batch = GeneratedBatch::default();
        for item in items {
            match self.text_input(item, None, rng) {
                Ok(q) => batch.questions.push(q),
                Err(e) => batch.skipped.push(e),
            }
        }
        batch
    }

    /// Batch generation for a session mode.
    ///
    /// The returned question count is the ground truth for the run's length;
    /// it can be shorter than `items`.
    pub fn batch_for_mode<R: Rng + ?Sized>(
        &self,
        mode: QuizMode,
        items: &[Item],
        pool: &[Item],
        rng: &mut R,
    ) -> GeneratedBatch<Question> {
        match mode {
            QuizMode::MultipleChoice => {
                let batch = self.multiple_choice_batch(items, pool, rng);
                GeneratedBatch {
                    questions: batch.questions.into_iter().map(Question::from).collect(),
                    skipped: batch.skipped,
                }
            }
            QuizMode::TextInput => {
                let batch = self.text_input_batch(items, rng);
                GeneratedBatch {
                    questions: batch.questions.into_iter().map(Question::from).collect(),
                    skipped: batch.skipped,
                }
            }
        }
    }
}

fn pick_kind<K, R>(
    item: &Item,
    eligible: &[K],
    forced: Option<K>,
    name: fn(K) -> &'static str,
    rng: &mut R,
) -> Result<K, GenerateError>
where
    K: Copy + PartialEq,
    R: Rng + ?Sized,
{
    if eligible.is_empty() {
        return Err(GenerateError::Ungradeable { item: item.id() });
    }
    match forced {
        Some(kind) if eligible.contains(&kind) => Ok(kind),
        Some(kind) => Err(GenerateError::IneligibleKind {
            item: item.id(),
            kind: name(kind),
        }),
        None => eligible
            .choose(rng)
            .copied()
            .ok_or(GenerateError::Ungradeable { item: item.id() }),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn item(prompt: &str, reading: &str, meaning: &str) -> Item {
        Item::new(ItemId::random(), prompt, reading, meaning).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn pool() -> Vec<Item> {
        vec![
            item("食べる", "たべる", "eat"),
            item("飲む", "のむ", "drink"),
            item("見る", "みる", "see"),
            item("聞く", "きく", "hear"),
            item("話す", "はなす", "speak"),
            item("読む", "よむ", "read"),
        ]
    }

    fn assert_well_formed(q: &MultipleChoiceQuestion) {
        let unique: HashSet<&String> = q.options().iter().collect();
        assert_eq!(unique.len(), q.options().len(), "options must be distinct");
        assert!(q.options().len() >= 2);
        let correct = q.correct_answer();
        assert_eq!(q.options().iter().filter(|o| *o == correct).count(), 1);
    }

    #[test]
    fn options_are_distinct_and_capped() {
        let pool = pool();
        let generator = QuestionGenerator::default();
        let mut rng = rng();
        for source in &pool {
            for kind in MultipleChoiceKind::ALL {
                let q = generator
                    .multiple_choice(source, &pool, Some(kind), &mut rng)
                    .unwrap();
                assert_well_formed(&q);
                assert_eq!(q.options().len(), 4);
                assert_eq!(q.correct_answer(), kind.answer(source));
                assert_eq!(q.source_item_id(), source.id());
            }
        }
    }

    #[test]
    fn duplicate_distractor_values_are_collapsed() {
        let pool = vec![
            item("一", "いち", "one"),
            item("壱", "いち", "one"),
            item("弌", "いち", "one"),
            item("二", "に", "two"),
        ];
        let q = QuestionGenerator::default()
            .multiple_choice(&pool[3], &pool, Some(MultipleChoiceKind::ItemToMeaning), &mut rng())
            .unwrap();
        assert_well_formed(&q);
        assert_eq!(q.options().len(), 2);
    }

    #[test]
    fn blank_reading_excludes_reading_questions() {
        let pool = vec![
            item("A", "あ", "a"),
            item("B", "い", "b"),
            item("C", "", "c"),
        ];
        let generator = QuestionGenerator::default();
        let mut rng = rng();

        let err = generator
            .multiple_choice(&pool[2], &pool, Some(MultipleChoiceKind::ItemToReading), &mut rng)
            .unwrap_err();
        assert!(matches!(err, GenerateError::IneligibleKind { .. }));

        for _ in 0..20 {
            let q = generator.multiple_choice(&pool[2], &pool, None, &mut rng).unwrap();
            assert_ne!(q.kind(), MultipleChoiceKind::ItemToReading);
        }

        let q = generator
            .multiple_choice(&pool[2], &pool, Some(MultipleChoiceKind::ItemToMeaning), &mut rng)
            .unwrap();
        assert_eq!(q.options().len(), 3);
        assert_eq!(q.prompt_text(), "C");
        assert_eq!(q.correct_answer(), "c");
        assert_well_formed(&q);
    }

    #[test]
    fn item_without_reading_or_meaning_is_ungradeable() {
        let pool = vec![item("X", " ", ""), item("Y", "わい", "why")];
        let generator = QuestionGenerator::default();
        let mut rng = rng();

        assert!(matches!(
            generator.multiple_choice(&pool[0], &pool, None, &mut rng),
            Err(GenerateError::Ungradeable { .. })
        ));
        assert!(matches!(
            generator.text_input(&pool[0], None, &mut rng),
            Err(GenerateError::Ungradeable { .. })
        ));
        for kind in TextInputKind::ALL {
            assert!(generator.text_input(&pool[0], Some(kind), &mut rng).is_err());
        }
    }

    #[test]
    fn lone_item_has_no_distractors() {
        let pool = vec![item("一", "いち", "one")];
        let err = QuestionGenerator::default()
            .multiple_choice(&pool[0], &pool, None, &mut rng())
            .unwrap_err();
        assert!(matches!(err, GenerateError::NotEnoughDistractors { .. }));
    }

    #[test]
    fn distractors_skip_blank_and_equal_values() {
        let pool = vec![
            item("一", "いち", "one"),
            item("壱", "", "one"),
            item("二", "", "two"),
        ];
        // Only "two" differs from "one" and is non-blank.
        let q = QuestionGenerator::default()
            .multiple_choice(&pool[0], &pool, Some(MultipleChoiceKind::ItemToMeaning), &mut rng())
            .unwrap();
        let mut options = q.options().to_vec();
        options.sort();
        assert_eq!(options, vec!["one".to_string(), "two".to_string()]);

        // No other item has a reading.
        let err = QuestionGenerator::default()
            .multiple_choice(&pool[0], &pool, Some(MultipleChoiceKind::ItemToReading), &mut rng())
            .unwrap_err();
        assert!(matches!(err, GenerateError::NotEnoughDistractors { .. }));
    }

    #[test]
    fn policy_controls_option_count() {
        let policy = QuizPolicy::new(10, 2).unwrap();
        let pool = pool();
        let q = QuestionGenerator::new(&policy)
            .multiple_choice(&pool[0], &pool, None, &mut rng())
            .unwrap();
        assert_eq!(q.options().len(), 2);
    }

    #[test]
    fn same_seed_same_question() {
        let pool = pool();
        let generator = QuestionGenerator::default();
        let a = generator.multiple_choice(&pool[1], &pool, None, &mut rng()).unwrap();
        let b = generator.multiple_choice(&pool[1], &pool, None, &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_drops_ungradeable_items_and_keeps_order() {
        let pool = vec![
            item("A", "あ", "a"),
            item("Z", "", ""),
            item("B", "い", "b"),
        ];
        let batch = QuestionGenerator::default().batch_for_mode(
            QuizMode::TextInput,
            &pool,
            &pool,
            &mut rng(),
        );
        assert_eq!(batch.questions.len(), 2);
        assert_eq!(batch.questions[0].source_item_id(), pool[0].id());
        assert_eq!(batch.questions[1].source_item_id(), pool[2].id());
        assert_eq!(batch.skipped, vec![GenerateError::Ungradeable { item: pool[1].id() }]);
    }

    #[test]
    fn typed_batches_start_empty_and_collect_per_item() {
        let empty: GeneratedBatch<MultipleChoiceQuestion> = GeneratedBatch::default();
        assert!(empty.questions.is_empty());
        assert!(empty.skipped.is_empty());

        let pool = pool();
        let generator = QuestionGenerator::default();
        let mc = generator.multiple_choice_batch(&pool, &pool, &mut rng());
        assert_eq!(mc.questions.len(), pool.len());
        assert!(mc.skipped.is_empty());

        let text = generator.text_input_batch(&[], &mut rng());
        assert!(text.questions.is_empty());
        assert!(text.skipped.is_empty());
    }

    #[test]
    fn text_input_prompts_with_item() {
        let it = item("読む", "", "read");
        let q = QuestionGenerator::default().text_input(&it, None, &mut rng()).unwrap();
        assert_eq!(q.kind(), TextInputKind::ItemToMeaningInput);
        assert_eq!(q.prompt_text(), "読む");
        assert!(q.is_correct(" READ "));
    }
}
