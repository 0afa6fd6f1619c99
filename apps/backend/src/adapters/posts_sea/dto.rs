//! DTOs for posts_sea adapter.

use time::OffsetDateTime;

/// A new post row. Without `submitted_at` the row is a draft.
#[derive(Debug, Clone)]
pub struct PostCreate {
    pub scene_id: i64,
    pub user_id: i64,
    pub character_id: Option<i64>,
    pub blocks: serde_json::Value,
    pub ooc_text: Option<String>,
    pub witnesses: serde_json::Value,
    pub is_hidden: bool,
    pub awaiting_reveal: bool,
    pub intention: Option<String>,
    pub modifier: Option<i32>,
    pub submitted_at: Option<OffsetDateTime>,
}

impl PostCreate {
    pub fn new(scene_id: i64, user_id: i64, blocks: serde_json::Value) -> Self {
        Self {
            scene_id,
            user_id,
            character_id: None,
            blocks,
            ooc_text: None,
            witnesses: serde_json::Value::Array(Vec::new()),
            is_hidden: false,
            awaiting_reveal: false,
            intention: None,
            modifier: None,
            submitted_at: None,
        }
    }

    pub fn with_character(mut self, character_id: Option<i64>) -> Self {
        self.character_id = character_id;
        self
    }

    pub fn with_ooc_text(mut self, ooc_text: Option<String>) -> Self {
        self.ooc_text = ooc_text;
        self
    }

    pub fn with_witnesses(mut self, witnesses: serde_json::Value) -> Self {
        self.witnesses = witnesses;
        self
    }

    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    pub fn awaiting_reveal(mut self, awaiting: bool) -> Self {
        self.awaiting_reveal = awaiting;
        self
    }

    pub fn with_roll_context(mut self, intention: Option<String>, modifier: Option<i32>) -> Self {
        self.intention = intention;
        self.modifier = modifier;
        self
    }

    pub fn submitted(mut self, at: OffsetDateTime) -> Self {
        self.submitted_at = Some(at);
        self
    }
}

/// Partial update. Nullable columns are three-state (`Some(None)` clears).
/// Setting `submitted_at` also turns a draft into a submitted post.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub character_id: Option<Option<i64>>,
    pub blocks: Option<serde_json::Value>,
    pub ooc_text: Option<Option<String>>,
    pub witnesses: Option<serde_json::Value>,
    pub is_hidden: Option<bool>,
    pub awaiting_reveal: Option<bool>,
    pub intention: Option<Option<String>>,
    pub modifier: Option<Option<i32>>,
    pub submitted_at: Option<OffsetDateTime>,
}

impl PostUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(mut self, character_id: Option<i64>) -> Self {
        self.character_id = Some(character_id);
        self
    }

    pub fn with_content(mut self, blocks: serde_json::Value, ooc_text: Option<String>) -> Self {
        self.blocks = Some(blocks);
        self.ooc_text = Some(ooc_text);
        self
    }

    pub fn with_witnesses(mut self, witnesses: serde_json::Value) -> Self {
        self.witnesses = Some(witnesses);
        self
    }

    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = Some(is_hidden);
        self
    }

    pub fn awaiting_reveal(mut self, awaiting: bool) -> Self {
        self.awaiting_reveal = Some(awaiting);
        self
    }

    pub fn with_roll_context(mut self, intention: Option<String>, modifier: Option<i32>) -> Self {
        self.intention = Some(intention);
        self.modifier = Some(modifier);
        self
    }

    pub fn submitted(mut self, at: OffsetDateTime) -> Self {
        self.submitted_at = Some(at);
        self
    }
}
