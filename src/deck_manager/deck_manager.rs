use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, Weak,
};

use log::{debug, error, info, warn};
use tokio::{sync::watch, task::JoinHandle};

use super::state::{LoadStatus, State};
use crate::cards::{
    card::CardGroup,
    deck::{CardGroupId, CardGroupPatch, Deck, DeckPatch},
};
use crate::services::{
    deck_service::DeckRepository,
    identity::{IdentityProvider, User},
    local_storage::{PreferenceStore, TagState},
    ServiceResult,
};
use crate::utilities::constants::{NEW_DECK_ID, TAGS_KEY};

type Observer = Arc<dyn Fn(&State) + Send + Sync>;

enum Persisted {
    Created(String),
    Updated,
    Deleted,
    Discarded,
}

struct Inner {
    state: watch::Sender<State>,
    repository: Arc<dyn DeckRepository>,
    preferences: Option<Arc<PreferenceStore>>,
    observers: Mutex<Vec<(u64, Observer)>>,
    next_observer_id: AtomicU64,
}

impl Inner {
    /// Runs `func` against the state. Observers are told about the new state
    /// unless `func` returns false, in which case it must not have changed anything.
    fn modify<F: FnOnce(&mut State) -> bool>(&self, func: F) -> bool {
        let mut snapshot = None;
        let modified = self.state.send_if_modified(|state| {
            let could_edit = state.can_edit;
            if !func(state) {
                return false;
            }
            state.refresh_permissions();
            if state.can_edit != could_edit {
                debug!(
                    "Edit permission for user {:?} changed to {}",
                    state.user.id, state.can_edit
                );
            }
            snapshot = Some(state.clone());
            true
        });

        if let Some(state) = snapshot {
            self.notify(&state);
        }
        modified
    }

    /// Replaces the open deck with `func(deck)`, marking the state dirty.
    /// Returning None from `func` leaves everything untouched.
    fn edit_deck<F: FnOnce(&Deck) -> Option<Deck>>(&self, action: &str, func: F) -> bool {
        self.modify(|state| {
            let Some(deck) = state.deck.as_ref() else {
                warn!("Cannot {} without an open deck", action);
                return false;
            };
            if !state.can_edit {
                warn!(
                    "Rejected {} on deck {:?}, user {:?} may not edit it",
                    action, deck.id, state.user.id
                );
                return false;
            }
            let Some(next) = func(deck) else {
                return false;
            };

            state.deck = Some(next);
            state.is_dirty = true;
            state.revision += 1;
            true
        })
    }

    fn notify(&self, state: &State) {
        let observers: Vec<Observer> = self
            .lock_observers()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(state);
        }
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(u64, Observer)>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist(&self, snapshot: State) {
        let Some(deck) = snapshot.deck.as_ref() else {
            return;
        };

        self.modify(|state| {
            state.is_saving = true;
            true
        });
        let result = self.write(deck, snapshot.is_deleted).await;

        match &result {
            Ok(Persisted::Created(id)) => info!("Created deck {} named {:?}", id, deck.name),
            Ok(Persisted::Updated) => debug!("Saved deck {:?}", deck.id),
            Ok(Persisted::Deleted) => info!("Deleted deck {:?}", deck.id),
            Ok(Persisted::Discarded) => debug!("Discarded unsaved deck {:?}", deck.name),
            Err(e) => error!("Failed to save deck {:?}: {}", deck.id, e),
        }

        self.modify(|state| {
            state.is_saving = false;
            if state.generation != snapshot.generation {
                return true;
            }
            match result {
                Ok(outcome) => {
                    if let Persisted::Created(id) = outcome {
                        // Edits made while the create was in flight stay on the deck
                        // and go out as an update on the next pass.
                        if let Some(current) = state.deck.as_mut().filter(|deck| deck.is_new()) {
                            current.id = Some(id);
                            current.owners = vec![snapshot.user.id.clone()];
                        }
                    }
                    if state.revision == snapshot.revision {
                        state.is_dirty = false;
                    }
                    state.failed_revision = None;
                }
                Err(_) => state.failed_revision = Some(snapshot.revision),
            }
            true
        });
    }

    async fn write(&self, deck: &Deck, is_deleted: bool) -> ServiceResult<Persisted> {
        match (&deck.id, is_deleted) {
            (Some(id), true) => {
                self.repository.delete_deck(id).await?;
                Ok(Persisted::Deleted)
            }
            (None, true) => Ok(Persisted::Discarded),
            (Some(_), false) => {
                self.repository.update_deck(deck).await?;
                Ok(Persisted::Updated)
            }
            (None, false) => Ok(Persisted::Created(
                self.repository.create_deck(deck).await?,
            )),
        }
    }
}

/// Persists the open deck whenever it is dirty and saveable. Only the newest
/// state is written, states that change during a write are collapsed.
async fn run_save_loop(inner: Arc<Inner>, mut receiver: watch::Receiver<State>) {
    loop {
        let pending = {
            let state = receiver.borrow_and_update();
            state.has_pending_save().then(|| state.clone())
        };
        match pending {
            Some(snapshot) => inner.persist(snapshot).await,
            None => {
                if receiver.changed().await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn follow_identity(inner: Arc<Inner>, mut users: watch::Receiver<User>) {
    while users.changed().await.is_ok() {
        let user = users.borrow_and_update().clone();
        inner.modify(|state| {
            if state.user == user {
                return false;
            }
            state.user = user;
            true
        });
    }
}

/// Handle returned by [`DeckManager::on_change`]. Dropping it stops the callbacks.
pub struct Unsubscribe {
    inner: Weak<Inner>,
    id: u64,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {}
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock_observers().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Owns the deck being edited, the permissions of the current user on it,
/// and the background task that saves it.
///
/// Must be created inside a tokio runtime. Background tasks stop when the
/// manager is closed or dropped.
pub struct DeckManager {
    inner: Arc<Inner>,
    tasks: Vec<JoinHandle<()>>,
}

impl DeckManager {
    pub fn new(
        repository: Arc<dyn DeckRepository>,
        identity: &IdentityProvider,
        preferences: Option<Arc<PreferenceStore>>,
    ) -> Self {
        let (state, receiver) = watch::channel(State {
            user: identity.current(),
            ..State::default()
        });
        let inner = Arc::new(Inner {
            state,
            repository,
            preferences,
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(0),
        });

        let tasks = vec![
            tokio::spawn(run_save_loop(inner.clone(), receiver)),
            tokio::spawn(follow_identity(inner.clone(), identity.subscribe())),
        ];

        DeckManager { inner, tasks }
    }

    pub fn current(&self) -> State {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.inner.state.subscribe()
    }

    /// Calls `callback` with every new state until the returned handle is dropped.
    pub fn on_change<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        let id = self.inner.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock_observers().push((id, Arc::new(callback)));
        Unsubscribe {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Opens deck `id`, or a fresh unsaved deck for the id `new`.
    pub async fn load(&self, id: &str) -> ServiceResult<()> {
        if id == NEW_DECK_ID {
            self.create_new();
            return Ok(());
        }

        let mut generation = 0;
        self.inner.modify(|state| {
            *state = state.opened(None, LoadStatus::Loading);
            generation = state.generation;
            true
        });
        info!("Loading deck {}", id);

        let (deck, outcome) = match self.inner.repository.get_by_id(id).await {
            Ok(deck) => (Some(deck), Ok(())),
            Err(e) => {
                error!("Failed to load deck {}: {}", id, e);
                (None, Err(e))
            }
        };
        let load_status = if deck.is_some() {
            LoadStatus::Ready
        } else {
            LoadStatus::Failed
        };

        self.inner.modify(|state| {
            if state.generation != generation {
                debug!("Discarding deck {}, another deck was opened meanwhile", id);
                return false;
            }
            state.deck = deck;
            state.load_status = load_status;
            true
        });
        outcome
    }

    /// Opens an unsaved deck tagged with the last tag the user filtered by.
    pub fn create_new(&self) {
        let tags = self
            .inner
            .preferences
            .as_ref()
            .and_then(|preferences| preferences.get_object::<TagState>(TAGS_KEY))
            .and_then(|tag_state| tag_state.current)
            .into_iter()
            .collect();
        let deck = Deck::new_default(tags);

        self.inner.modify(|state| {
            *state = state.opened(Some(deck), LoadStatus::Ready);
            true
        });
    }

    pub fn update_deck<F: FnOnce(&Deck) -> Deck>(&self, func: F) -> bool {
        self.inner
            .edit_deck("update the deck", |deck| Some(func(deck)))
    }

    pub fn patch_deck(&self, patch: DeckPatch) -> bool {
        self.inner
            .edit_deck("patch the deck", |deck| Some(patch.apply(deck)))
    }

    /// Replaces card group `id` with `func(group)`. False if there is no such group.
    pub fn update_card_group<F: FnOnce(&CardGroup) -> CardGroup>(
        &self,
        id: CardGroupId,
        func: F,
    ) -> bool {
        self.inner.edit_deck("update a card group", |deck| {
            let group = func(deck.card_group(id)?);
            let mut next = deck.clone();
            next.card_groups.insert(id, group);
            Some(next)
        })
    }

    pub fn patch_card_group(&self, id: CardGroupId, patch: CardGroupPatch) -> bool {
        self.update_card_group(id, |group| patch.apply(group))
    }

    /// Appends an empty card group and returns its id.
    pub fn add_card_group(&self) -> Option<CardGroupId> {
        let mut added = None;
        self.inner.edit_deck("add a card group", |deck| {
            let id = deck.next_card_group_id();
            let mut next = deck.clone();
            next.card_groups
                .insert(id, CardGroup::new(deck.default_card_group_name()));
            next.card_group_order.push(id);
            added = Some(id);
            Some(next)
        });
        added
    }

    pub fn remove_card_groups(&self, ids: &[CardGroupId]) -> bool {
        self.inner.edit_deck("remove card groups", |deck| {
            if !ids.iter().any(|id| deck.card_groups.contains_key(id)) {
                return None;
            }
            let mut next = deck.clone();
            next.card_groups.retain(|id, _| !ids.contains(id));
            next.card_group_order.retain(|id| !ids.contains(id));
            Some(next)
        })
    }

    /// Moves the card group at display position `from` to position `to`.
    /// Positions past the end are clamped to the last group.
    pub fn move_card_group(&self, from: usize, to: usize) -> bool {
        self.inner.edit_deck("move a card group", |deck| {
            let last = deck.card_group_order.len().checked_sub(1)?;
            let (from, to) = (from.min(last), to.min(last));
            if from == to {
                return None;
            }
            let mut next = deck.clone();
            let id = next.card_group_order.remove(from);
            next.card_group_order.insert(to, id);
            Some(next)
        })
    }

    /// Marks the open deck for deletion. The deck stays visible but read-only.
    pub fn delete_deck(&self) -> bool {
        self.inner.modify(|state| {
            if state.deck.is_none() || !state.can_edit {
                warn!("Rejected deleting deck, user {:?} may not edit it", state.user.id);
                return false;
            }
            state.is_deleted = true;
            state.is_dirty = true;
            state.revision += 1;
            true
        })
    }

    /// Retries a save that failed, without waiting for the next edit.
    pub fn save_now(&self) {
        self.inner.modify(|state| {
            state.failed_revision = None;
            true
        });
    }

    /// Resolves once nothing is being saved and nothing is waiting to be.
    pub async fn flushed(&self) {
        let mut receiver = self.inner.state.subscribe();
        let _ = receiver
            .wait_for(|state| !state.is_saving && !state.has_pending_save())
            .await;
    }

    pub fn close(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for DeckManager {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::deck::QueriedDeck;
    use crate::services::deck_query::DeckQuery;
    use crate::services::deck_service::MockDeckRepository;
    use crate::test::helpers::card;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::{Notify, Semaphore};
    use tokio::time::timeout;

    fn stored_deck() -> Deck {
        let mut mainboard = CardGroup::new("Mainboard");
        mainboard.cards = vec![card("Llanowar Elves", 4), card("Forest", 20)];
        Deck::from_ordered_groups(
            Some("d1".to_string()),
            "Elves".to_string(),
            vec!["u1".to_string()],
            String::new(),
            vec!["modern".to_string()],
            vec![mainboard, CardGroup::new("Sideboard")],
        )
    }

    fn rename(name: &str) -> DeckPatch {
        DeckPatch {
            name: Some(name.to_string()),
            ..DeckPatch::default()
        }
    }

    /// Records each write and blocks it until the test hands out a permit.
    struct GatedRepository {
        calls: Mutex<Vec<String>>,
        started: Notify,
        gate: Semaphore,
    }

    impl GatedRepository {
        fn new() -> Self {
            GatedRepository {
                calls: Mutex::new(Vec::new()),
                started: Notify::new(),
                gate: Semaphore::new(0),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn record(&self, action: &str, deck: &Deck) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{} {}", action, deck.name));
            self.started.notify_one();
            self.gate.acquire().await.unwrap().forget();
        }
    }

    #[async_trait]
    impl DeckRepository for GatedRepository {
        async fn get_by_id(&self, _id: &str) -> ServiceResult<Deck> {
            Ok(stored_deck())
        }

        async fn get_by_query(&self, _query: &DeckQuery) -> ServiceResult<Vec<QueriedDeck>> {
            Ok(Vec::new())
        }

        async fn create_deck(&self, deck: &Deck) -> ServiceResult<String> {
            self.record("create", deck).await;
            Ok("created-1".to_string())
        }

        async fn update_deck(&self, deck: &Deck) -> ServiceResult<()> {
            self.record("update", deck).await;
            Ok(())
        }

        async fn delete_deck(&self, _id: &str) -> ServiceResult<()> {
            Ok(())
        }
    }

    struct TestContext {
        manager: DeckManager,
        identity: IdentityProvider,
    }

    impl TestContext {
        fn new(repository: Arc<dyn DeckRepository>, user: Option<&str>) -> Self {
            let _ = env_logger::builder().is_test(true).try_init();
            let identity = IdentityProvider::new();
            if let Some(user) = user {
                identity.log_in(user);
            }
            let manager = DeckManager::new(repository, &identity, None);
            TestContext { manager, identity }
        }

        async fn with_stored_deck(repository: Arc<dyn DeckRepository>, user: &str) -> Self {
            let context = TestContext::new(repository, Some(user));
            context.manager.load("d1").await.unwrap();
            context
        }

        async fn settle(&self) {
            timeout(Duration::from_secs(5), self.manager.flushed())
                .await
                .expect("deck manager did not settle");
        }

        async fn wait_for<F: FnMut(&State) -> bool>(&self, predicate: F) -> State {
            let mut receiver = self.manager.subscribe();
            let state = timeout(Duration::from_secs(5), receiver.wait_for(predicate))
                .await
                .expect("state never matched")
                .unwrap()
                .clone();
            state
        }
    }

    fn loading_mock() -> MockDeckRepository {
        let mut mock = MockDeckRepository::new();
        mock.expect_get_by_id()
            .withf(|id| id == "d1")
            .returning(|_| Ok(stored_deck()));
        mock
    }

    #[tokio::test]
    async fn load_opens_a_clean_editable_deck() {
        let context = TestContext::with_stored_deck(Arc::new(loading_mock()), "u1").await;
        let state = context.manager.current();

        assert_eq!(state.load_status, LoadStatus::Ready);
        assert_eq!(state.deck, Some(stored_deck()));
        assert!(!state.is_dirty);
        assert!(!state.is_new);
        assert!(state.can_edit);
        assert!(state.can_save);
    }

    #[tokio::test]
    async fn load_failure_is_returned_and_recorded() {
        let mut mock = MockDeckRepository::new();
        mock.expect_get_by_id()
            .returning(|_| Err("deck not found".into()));
        let context = TestContext::new(Arc::new(mock), Some("u1"));

        let result = context.manager.load("missing").await;

        assert!(result.is_err());
        let state = context.manager.current();
        assert_eq!(state.load_status, LoadStatus::Failed);
        assert_eq!(state.deck, None);
    }

    #[tokio::test]
    async fn loading_new_uses_the_remembered_tag() {
        let preferences = Arc::new(PreferenceStore::in_memory());
        preferences
            .set_object(
                TAGS_KEY,
                &TagState {
                    all: vec!["edh".to_string(), "modern".to_string()],
                    current: Some("edh".to_string()),
                },
            )
            .unwrap();
        let identity = IdentityProvider::new();
        let manager = DeckManager::new(
            Arc::new(MockDeckRepository::new()),
            &identity,
            Some(preferences),
        );

        manager.load(NEW_DECK_ID).await.unwrap();

        let state = manager.current();
        let deck = state.deck.unwrap();
        assert_eq!(deck.tags, vec!["edh"]);
        assert_eq!(deck.name, "New Deck");
        assert!(state.is_new);
        assert!(state.can_edit);
        assert!(!state.can_save);
        assert!(!state.is_dirty);
    }

    #[tokio::test]
    async fn edits_made_during_a_save_are_collapsed_into_one_more_save() {
        let repository = Arc::new(GatedRepository::new());
        let context = TestContext::with_stored_deck(repository.clone(), "u1").await;

        assert!(context.manager.patch_deck(rename("A")));
        repository.started.notified().await;
        assert!(context.manager.patch_deck(rename("B")));
        assert!(context.manager.patch_deck(rename("C")));
        repository.gate.add_permits(10);
        context.settle().await;

        assert_eq!(repository.calls(), vec!["update A", "update C"]);
        let state = context.manager.current();
        assert!(!state.is_dirty);
        assert_eq!(state.deck.unwrap().name, "C");
    }

    #[tokio::test]
    async fn edits_issued_together_are_saved_once() {
        let repository = Arc::new(GatedRepository::new());
        repository.gate.add_permits(10);
        let context = TestContext::with_stored_deck(repository.clone(), "u1").await;

        assert!(context.manager.patch_deck(rename("A")));
        assert!(context.manager.patch_deck(rename("B")));
        context.settle().await;

        assert_eq!(repository.calls(), vec!["update B"]);
        assert!(!context.manager.current().is_dirty);
    }

    #[tokio::test]
    async fn opening_another_deck_waits_for_the_running_save() {
        let repository = Arc::new(GatedRepository::new());
        let context = TestContext::with_stored_deck(repository.clone(), "u1").await;

        assert!(context.manager.patch_deck(rename("A")));
        repository.started.notified().await;
        context.manager.create_new();

        assert!(context.manager.current().is_saving);
        assert!(
            timeout(Duration::from_millis(50), context.manager.flushed())
                .await
                .is_err()
        );

        repository.gate.add_permits(10);
        context.settle().await;

        let state = context.manager.current();
        assert_eq!(repository.calls(), vec!["update A"]);
        assert!(!state.is_saving);
        assert!(state.is_new);
    }

    #[tokio::test]
    async fn first_save_of_a_new_deck_assigns_id_and_owner() {
        let repository = Arc::new(GatedRepository::new());
        repository.gate.add_permits(10);
        let context = TestContext::new(repository.clone(), Some("u1"));
        context.manager.create_new();

        assert!(context.manager.patch_deck(rename("Fresh")));
        context.settle().await;

        let state = context.manager.current();
        let deck = state.deck.unwrap();
        assert_eq!(repository.calls(), vec!["create Fresh"]);
        assert_eq!(deck.id.as_deref(), Some("created-1"));
        assert_eq!(deck.owners, vec!["u1"]);
        assert!(!state.is_new);
        assert!(!state.is_dirty);
        assert!(state.can_edit);
    }

    #[tokio::test]
    async fn edits_during_create_are_kept_and_saved_as_an_update() {
        let repository = Arc::new(GatedRepository::new());
        let context = TestContext::new(repository.clone(), Some("u1"));
        context.manager.create_new();

        assert!(context.manager.patch_deck(rename("A")));
        repository.started.notified().await;
        assert!(context.manager.patch_deck(rename("B")));
        repository.gate.add_permits(10);
        context.settle().await;

        assert_eq!(repository.calls(), vec!["create A", "update B"]);
        let deck = context.manager.current().deck.unwrap();
        assert_eq!(deck.id.as_deref(), Some("created-1"));
        assert_eq!(deck.name, "B");
    }

    #[tokio::test]
    async fn anonymous_edits_are_saved_after_log_in() {
        let mut mock = MockDeckRepository::new();
        mock.expect_create_deck()
            .withf(|deck| deck.name == "Draft")
            .times(1)
            .returning(|_| Ok("created-2".to_string()));
        let context = TestContext::new(Arc::new(mock), None);
        context.manager.create_new();

        assert!(context.manager.patch_deck(rename("Draft")));
        let state = context.manager.current();
        assert!(state.is_dirty);
        assert!(!state.can_save);

        context.identity.log_in("u7");
        let state = context
            .wait_for(|state| state.deck.as_ref().is_some_and(|deck| !deck.is_new()))
            .await;
        context.settle().await;

        assert_eq!(state.deck.unwrap().owners, vec!["u7"]);
        assert!(!context.manager.current().is_dirty);
    }

    #[tokio::test]
    async fn log_out_revokes_edit_permission() {
        let context = TestContext::with_stored_deck(Arc::new(loading_mock()), "u1").await;
        assert!(context.manager.current().can_edit);

        context.identity.log_out();
        let state = context.wait_for(|state| !state.can_edit).await;

        assert!(!state.can_save);
        assert!(!context.manager.patch_deck(rename("Hijacked")));
        assert_eq!(context.manager.current().deck.unwrap().name, "Elves");
    }

    #[tokio::test]
    async fn other_users_cannot_edit() {
        let context = TestContext::with_stored_deck(Arc::new(loading_mock()), "u2").await;
        let state = context.manager.current();

        assert!(!state.can_edit);
        assert!(!state.can_save);
        assert_eq!(context.manager.add_card_group(), None);
        assert!(!context.manager.delete_deck());
        assert!(!context.manager.current().is_dirty);
    }

    #[tokio::test]
    async fn failed_save_keeps_deck_dirty_until_next_edit() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let mut mock = loading_mock();
        mock.expect_update_deck().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("server unavailable".into())
            } else {
                Ok(())
            }
        });
        let context = TestContext::with_stored_deck(Arc::new(mock), "u1").await;

        context.manager.patch_deck(rename("A"));
        context.settle().await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(context.manager.current().is_dirty);

        context.manager.patch_deck(rename("B"));
        context.settle().await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!context.manager.current().is_dirty);
    }

    #[tokio::test]
    async fn save_now_retries_a_failed_save() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let mut mock = loading_mock();
        mock.expect_update_deck().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("timeout".into())
            } else {
                Ok(())
            }
        });
        let context = TestContext::with_stored_deck(Arc::new(mock), "u1").await;

        context.manager.patch_deck(rename("A"));
        context.settle().await;
        context.manager.save_now();
        context.settle().await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!context.manager.current().is_dirty);
    }

    #[tokio::test]
    async fn delete_removes_the_stored_deck() {
        let mut mock = loading_mock();
        mock.expect_delete_deck()
            .withf(|id| id == "d1")
            .times(1)
            .returning(|_| Ok(()));
        let context = TestContext::with_stored_deck(Arc::new(mock), "u1").await;

        assert!(context.manager.delete_deck());
        context.settle().await;

        let state = context.manager.current();
        assert!(state.is_deleted);
        assert!(!state.is_dirty);
        assert!(!state.can_edit);
        assert!(!context.manager.patch_deck(rename("Ghost")));
    }

    #[tokio::test]
    async fn deleting_an_unsaved_deck_never_reaches_the_store() {
        let context = TestContext::new(Arc::new(MockDeckRepository::new()), Some("u1"));
        context.manager.create_new();

        assert!(context.manager.patch_deck(rename("Scratch")));
        assert!(context.manager.delete_deck());
        context.settle().await;

        let state = context.manager.current();
        assert!(state.is_deleted);
        assert!(!state.is_dirty);
    }

    #[tokio::test]
    async fn card_groups_can_be_added_moved_and_removed() {
        let repository = Arc::new(GatedRepository::new());
        repository.gate.add_permits(100);
        let context = TestContext::with_stored_deck(repository, "u1").await;
        let manager = &context.manager;

        let added = manager.add_card_group();
        assert_eq!(added, Some(2));
        let deck = manager.current().deck.unwrap();
        assert_eq!(deck.card_group(2).unwrap().name, "Maybeboard");
        assert_eq!(deck.card_group_order, vec![0, 1, 2]);

        assert!(manager.move_card_group(2, 0));
        assert_eq!(manager.current().deck.unwrap().card_group_order, vec![2, 0, 1]);
        assert!(!manager.move_card_group(5, 9));

        assert!(manager.remove_card_groups(&[1, 2]));
        let deck = manager.current().deck.unwrap();
        assert_eq!(deck.card_group_order, vec![0]);
        assert!(deck.card_group(1).is_none());
        assert!(!manager.remove_card_groups(&[7]));
        context.settle().await;
    }

    #[tokio::test]
    async fn card_group_patches_apply_to_the_named_group() {
        let repository = Arc::new(GatedRepository::new());
        repository.gate.add_permits(100);
        let context = TestContext::with_stored_deck(repository, "u1").await;

        let patched = context.manager.patch_card_group(
            1,
            CardGroupPatch {
                cards: Some(vec![card("Counterspell", 2)]),
                invalid_cards: Some(vec!["Blck Lotus".to_string()]),
                ..CardGroupPatch::default()
            },
        );

        assert!(patched);
        let deck = context.manager.current().deck.unwrap();
        let sideboard = deck.card_group(1).unwrap();
        assert_eq!(sideboard.name, "Sideboard");
        assert_eq!(sideboard.count(), 2);
        assert_eq!(sideboard.invalid_cards, vec!["Blck Lotus"]);
        assert!(!context.manager.patch_card_group(9, CardGroupPatch::default()));
        context.settle().await;
    }

    #[tokio::test]
    async fn observers_see_changes_until_unsubscribed() {
        let repository = Arc::new(GatedRepository::new());
        repository.gate.add_permits(100);
        let context = TestContext::with_stored_deck(repository, "u1").await;
        let names = Arc::new(Mutex::new(Vec::new()));
        let seen = names.clone();

        let subscription = context.manager.on_change(move |state| {
            if let Some(deck) = &state.deck {
                seen.lock().unwrap().push(deck.name.clone());
            }
        });
        context.manager.patch_deck(rename("Seen"));
        context.settle().await;
        subscription.unsubscribe();
        context.manager.patch_deck(rename("Unseen"));
        context.settle().await;

        let names = names.lock().unwrap();
        assert!(names.contains(&"Seen".to_string()));
        assert!(!names.contains(&"Unseen".to_string()));
    }
}
