use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type TableId = u64;
pub type DeckId = u64;
pub type SeatIndex = usize;
pub type CardIndex = usize;

/// Identifies one player's persisted secrets at one table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey {
    pub address: String,
    pub table_id: TableId,
}

impl TableKey {
    pub fn new(address: impl Into<String>, table_id: TableId) -> Self {
        Self {
            address: address.into(),
            table_id,
        }
    }
}

/// Everything one player's process knows about a table it is seated at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSession {
    pub address: String,
    pub table_id: TableId,
    pub deck_id: DeckId,
    pub seat_index: SeatIndex,
    pub verif_rounds: usize,
    /// Recipient seat of each drawn card.
    #[serde(default)]
    pub draw_index: BTreeMap<CardIndex, SeatIndex>,
}

impl TableSession {
    pub fn new(
        address: impl Into<String>,
        table_id: TableId,
        deck_id: DeckId,
        seat_index: SeatIndex,
        verif_rounds: usize,
    ) -> Self {
        Self {
            address: address.into(),
            table_id,
            deck_id,
            seat_index,
            verif_rounds,
            draw_index: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> TableKey {
        TableKey::new(self.address.clone(), self.table_id)
    }

    pub fn assign_draw(&mut self, card_index: CardIndex, recipient: SeatIndex) {
        self.draw_index.insert(card_index, recipient);
    }

    pub fn owns_card(&self, card_index: CardIndex) -> bool {
        self.draw_index.get(&card_index) == Some(&self.seat_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_follows_draw_index() {
        let mut session = TableSession::new("0xabc", 4, 9, 1, 5);
        session.assign_draw(3, 1);
        session.assign_draw(4, 0);
        assert!(session.owns_card(3));
        assert!(!session.owns_card(4));
        assert!(!session.owns_card(5));
        assert_eq!(session.key(), TableKey::new("0xabc", 4));
    }
}
