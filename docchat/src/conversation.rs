use crate::models::ConversationTurn;

/// Append-only chat history, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    turns: Vec<ConversationTurn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn list(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
