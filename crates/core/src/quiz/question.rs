use crate::model::{Item, ItemId};

//
// ─── QUESTION KINDS ────────────────────────────────────────────────────────────
//

/// What a multiple-choice question shows and what it asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultipleChoiceKind {
    /// Show the prompt, pick the meaning.
    ItemToMeaning,
    /// Show the meaning, pick the prompt.
    MeaningToItem,
    /// Show the prompt, pick the reading.
    ItemToReading,
}

impl MultipleChoiceKind {
    pub const ALL: [MultipleChoiceKind; 3] = [
        MultipleChoiceKind::ItemToMeaning,
        MultipleChoiceKind::MeaningToItem,
        MultipleChoiceKind::ItemToReading,
    ];

    #[must_use]
    pub fn is_eligible(self, item: &Item) -> bool {
        match self {
            MultipleChoiceKind::ItemToMeaning | MultipleChoiceKind::MeaningToItem => {
                item.has_meaning()
            }
            MultipleChoiceKind::ItemToReading => item.has_reading(),
        }
    }

    /// The attribute displayed as the cue.
    #[must_use]
    pub fn cue(self, item: &Item) -> &str {
        match self {
            MultipleChoiceKind::ItemToMeaning | MultipleChoiceKind::ItemToReading => item.prompt(),
            MultipleChoiceKind::MeaningToItem => item.meaning(),
        }
    }

    /// The attribute that forms both the correct answer and the distractors.
    #[must_use]
    pub fn answer(self, item: &Item) -> &str {
        match self {
            MultipleChoiceKind::ItemToMeaning => item.meaning(),
            MultipleChoiceKind::MeaningToItem => item.prompt(),
            MultipleChoiceKind::ItemToReading => item.reading(),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MultipleChoiceKind::ItemToMeaning => "item_to_meaning",
            MultipleChoiceKind::MeaningToItem => "meaning_to_item",
            MultipleChoiceKind::ItemToReading => "item_to_reading",
        }
    }
}

/// What a free-text question expects the user to type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextInputKind {
    ItemToReadingInput,
    ItemToMeaningInput,
}

impl TextInputKind {
    pub const ALL: [TextInputKind; 2] = [
        TextInputKind::ItemToReadingInput,
        TextInputKind::ItemToMeaningInput,
    ];

    #[must_use]
    pub fn is_eligible(self, item: &Item) -> bool {
        match self {
            TextInputKind::ItemToReadingInput => item.has_reading(),
            TextInputKind::ItemToMeaningInput => item.has_meaning(),
        }
    }

    #[must_use]
    pub fn answer(self, item: &Item) -> &str {
        match self {
            TextInputKind::ItemToReadingInput => item.reading(),
            TextInputKind::ItemToMeaningInput => item.meaning(),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TextInputKind::ItemToReadingInput => "item_to_reading_input",
            TextInputKind::ItemToMeaningInput => "item_to_meaning_input",
        }
    }
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// A generated multiple-choice question.
///
/// Options are pairwise distinct and the correct answer sits at
/// `correct_option_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleChoiceQuestion {
    source_item_id: ItemId,
    prompt_text: String,
    options: Vec<String>,
    correct_option_index: usize,
    kind: MultipleChoiceKind,
}

impl MultipleChoiceQuestion {
    pub(crate) fn new(
        source_item_id: ItemId,
        prompt_text: String,
        options: Vec<String>,
        correct_option_index: usize,
        kind: MultipleChoiceKind,
    ) -> Self {
        Self {
            source_item_id,
            prompt_text,
            options,
            correct_option_index,
            kind,
        }
    }

    #[must_use]
    pub fn source_item_id(&self) -> ItemId {
        self.source_item_id
    }

    #[must_use]
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option_index(&self) -> usize {
        self.correct_option_index
    }

    #[must_use]
    pub fn kind(&self) -> MultipleChoiceKind {
        self.kind
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_option_index]
    }

    #[must_use]
    pub fn is_correct_choice(&self, index: usize) -> bool {
        index == self.correct_option_index
    }
}

/// A generated free-text question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInputQuestion {
    source_item_id: ItemId,
    prompt_text: String,
    correct_answer_text: String,
    kind: TextInputKind,
}

impl TextInputQuestion {
    pub(crate) fn new(
        source_item_id: ItemId,
        prompt_text: String,
        correct_answer_text: String,
        kind: TextInputKind,
    ) -> Self {
        Self {
            source_item_id,
            prompt_text,
            correct_answer_text,
            kind,
        }
    }

    #[must_use]
    pub fn source_item_id(&self) -> ItemId {
        self.source_item_id
    }

    #[must_use]
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    #[must_use]
    pub fn correct_answer_text(&self) -> &str {
        &self.correct_answer_text
    }

    #[must_use]
    pub fn kind(&self) -> TextInputKind {
        self.kind
    }

    /// Trimmed, case-insensitive exact match.
    #[must_use]
    pub fn is_correct(&self, input: &str) -> bool {
        input.trim().to_lowercase() == self.correct_answer_text.trim().to_lowercase()
    }
}

/// Either question variant, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    MultipleChoice(MultipleChoiceQuestion),
    TextInput(TextInputQuestion),
}

impl Question {
    #[must_use]
    pub fn source_item_id(&self) -> ItemId {
        match self {
            Question::MultipleChoice(q) => q.source_item_id(),
            Question::TextInput(q) => q.source_item_id(),
        }
    }

    #[must_use]
    pub fn prompt_text(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => q.prompt_text(),
            Question::TextInput(q) => q.prompt_text(),
        }
    }

    #[must_use]
    pub fn correct_answer_text(&self) -> &str {
        match self {
            Question::MultipleChoice(q) => q.correct_answer(),
            Question::TextInput(q) => q.correct_answer_text(),
        }
    }
}

impl From<MultipleChoiceQuestion> for Question {
    fn from(q: MultipleChoiceQuestion) -> Self {
        Question::MultipleChoice(q)
    }
}

impl From<TextInputQuestion> for Question {
    fn from(q: TextInputQuestion) -> Self {
        Question::TextInput(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: &str) -> TextInputQuestion {
        TextInputQuestion::new(
            ItemId::random(),
            "読む".into(),
            answer.into(),
            TextInputKind::ItemToMeaningInput,
        )
    }

    #[test]
    fn text_answer_ignores_case_and_surrounding_space() {
        let q = question("Read");
        assert!(q.is_correct("  read\n"));
        assert!(q.is_correct("READ"));
    }

    #[test]
    fn text_answer_has_no_partial_matching() {
        let q = question("to read");
        assert!(!q.is_correct("read"));
        assert!(!q.is_correct("to  read"));
    }

    #[test]
    fn kinds_pick_expected_attributes() {
        let item = Item::new(ItemId::random(), "読む", "よむ", "read").unwrap();
        assert_eq!(MultipleChoiceKind::MeaningToItem.cue(&item), "read");
        assert_eq!(MultipleChoiceKind::MeaningToItem.answer(&item), "読む");
        assert_eq!(MultipleChoiceKind::ItemToReading.answer(&item), "よむ");
        assert_eq!(TextInputKind::ItemToReadingInput.answer(&item), "よむ");
    }
}
