use crate::cards::deck::Deck;
use crate::services::identity::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Everything the UI needs to know about the open deck.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct State {
    pub can_edit: bool,
    pub can_save: bool,
    pub is_deleted: bool,
    pub is_dirty: bool,
    pub is_new: bool,
    pub is_saving: bool,
    pub load_status: LoadStatus,
    pub deck: Option<Deck>,
    pub user: User,
    /// Bumped by every change that needs persisting.
    pub(crate) revision: u64,
    /// Bumped whenever a different deck is opened.
    pub(crate) generation: u64,
    /// Revision whose persist failed; it is not retried until something changes.
    pub(crate) failed_revision: Option<u64>,
}

impl State {
    pub fn is_loading(&self) -> bool {
        self.load_status == LoadStatus::Loading
    }

    /// True when the save loop still has work to do for this state.
    pub fn has_pending_save(&self) -> bool {
        self.deck.is_some()
            && self.is_dirty
            && self.can_save
            && self.failed_revision != Some(self.revision)
    }

    /// Recomputes the flags derived from the deck and the current user.
    pub(crate) fn refresh_permissions(&mut self) {
        let is_new = self.deck.as_ref().is_some_and(Deck::is_new);
        let is_owner = is_new
            || self
                .deck
                .as_ref()
                .is_some_and(|deck| deck.is_owned_by(&self.user.id));

        self.is_new = is_new;
        self.can_edit = is_owner && !self.is_deleted;
        self.can_save = is_owner && self.user.is_authenticated;
    }

    /// A fresh state for a newly opened deck, keeping the user and any
    /// save of the previous deck that is still running.
    pub(crate) fn opened(&self, deck: Option<Deck>, load_status: LoadStatus) -> State {
        let mut next = State {
            deck,
            load_status,
            is_saving: self.is_saving,
            user: self.user.clone(),
            revision: self.revision + 1,
            generation: self.generation + 1,
            ..State::default()
        };
        next.refresh_permissions();
        next
    }
}
