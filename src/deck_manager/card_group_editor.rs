use log::debug;

use super::{deck_manager::DeckManager, state::State};
use crate::card_blob::card_blob_service::CardBlobService;
use crate::card_grouper::card_grouper::GroupBy;
use crate::cards::{
    card::{Card, CardGroup, CardView},
    deck::{CardGroupId, CardGroupPatch},
};

/// Text editing session for one card group of the open deck.
///
/// The group is shown as a card blob in the selected grouping. Edits are
/// kept locally until applied, then parsed and written back to the deck.
#[derive(Debug, Clone)]
pub struct CardGroupEditor {
    group_id: CardGroupId,
    group_by: GroupBy,
    initial_blob: Option<String>,
    blob: Option<String>,
}

impl CardGroupEditor {
    pub fn new(group_id: CardGroupId, group_by: GroupBy) -> Self {
        CardGroupEditor {
            group_id,
            group_by,
            initial_blob: None,
            blob: None,
        }
    }

    /// A brand new deck that nobody touched yet opens straight into editing.
    pub fn starts_in_edit_mode(state: &State) -> bool {
        state.is_new && !state.is_dirty && state.can_edit
    }

    pub fn group_id(&self) -> CardGroupId {
        self.group_id
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn set_group_by(&mut self, group_by: GroupBy) {
        self.group_by = group_by;
    }

    /// The group as text, or None when the open deck has no such group.
    /// Section headers are only emitted when the parser skips comment lines.
    pub fn card_blob(&self, state: &State, blob_service: &CardBlobService) -> Option<String> {
        let group = state.deck.as_ref()?.card_group(self.group_id)?;
        Some(self.render(group, blob_service))
    }

    pub fn is_editing(&self, state: &State) -> bool {
        self.blob.is_some() && state.can_edit
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    pub fn start_editing(&mut self, manager: &DeckManager, blob_service: &CardBlobService) -> bool {
        let state = manager.current();
        if !state.can_edit {
            debug!("Not editing card group {}, deck is read-only", self.group_id);
            return false;
        }
        let Some(blob) = self.card_blob(&state, blob_service) else {
            return false;
        };

        self.initial_blob = Some(blob.clone());
        self.blob = Some(blob);
        true
    }

    pub fn update_blob(&mut self, blob: &str) {
        if self.blob.is_some() {
            self.blob = Some(blob.to_string());
        }
    }

    /// Parses the edited text into the group and ends the session.
    /// Returns true when the deck was changed.
    pub fn apply_changes(&mut self, manager: &DeckManager, blob_service: &CardBlobService) -> bool {
        let initial_blob = self.initial_blob.take();
        let Some(blob) = self.blob.take() else {
            return false;
        };
        if initial_blob.as_deref() == Some(blob.as_str()) {
            return false;
        }

        let parsed = blob_service.parse(&blob);
        manager.patch_card_group(
            self.group_id,
            CardGroupPatch {
                cards: Some(parsed.cards),
                invalid_cards: Some(parsed.invalid_cards),
                ..CardGroupPatch::default()
            },
        )
    }

    pub fn discard_changes(&mut self) {
        self.initial_blob = None;
        self.blob = None;
    }

    /// Drops the session once the deck becomes read-only, e.g. after log out.
    pub fn sync_permissions(&mut self, state: &State) {
        if !state.can_edit && self.blob.is_some() {
            debug!("Discarding edits to card group {}", self.group_id);
            self.discard_changes();
        }
    }

    fn render(&self, group: &CardGroup, blob_service: &CardBlobService) -> String {
        let mut views = self.group_by.group(&group.cards);
        // Keyed groupings leave out unknown types and colours, those cards
        // still have to be in the text or applying it would delete them.
        let ungrouped: Vec<Card> = group
            .cards
            .iter()
            .filter(|card| {
                !views.iter().any(|view| {
                    view.cards
                        .iter()
                        .any(|shown| shown.definition.name == card.definition.name)
                })
            })
            .cloned()
            .collect();
        if !ungrouped.is_empty() {
            views.push(CardView::unlabeled(ungrouped));
        }

        if blob_service.skips_comment_lines() {
            CardBlobService::stringify_grouped(&views, &group.invalid_cards)
        } else {
            let cards: Vec<Card> = views.into_iter().flat_map(|view| view.cards).collect();
            CardBlobService::stringify(&cards, &group.invalid_cards)
        }
    }
}
