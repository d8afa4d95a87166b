//! In-memory backend and fixtures shared by the store tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::api::Backend;
use crate::db::SessionDb;
use crate::store::SessionStore;
use crate::types::{
    Achievement, InventoryEntry, Item, ItemRarity, LoginRequest, PersonRef, ProfileUpdate,
    QuestError, RegisterRequest, Result, ShopListing, Task, TaskDraft, TaskPriority, TaskStatus,
    User,
};

pub const PASSWORD: &str = "secret1";

pub fn sample_user(id: i64) -> User {
    User {
        id,
        name: format!("User {}", id),
        email: format!("user{}@example.com", id),
        level: 1,
        xp: 0,
        currency: 100,
        avatar: None,
    }
}

pub fn sample_task(id: i64, title: &str) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: String::new(),
        sphere: None,
        status: TaskStatus::New,
        priority: TaskPriority::Normal,
        difficulty: None,
        deadline: None,
        duration: None,
        reward_xp: 10,
        reward_currency: 5,
        fast_done_bonus: 0,
        combo: 0,
        author: Some(PersonRef { id: 1, name: "User 1".into() }),
        executor: Some(PersonRef { id: 1, name: "User 1".into() }),
        update_date: Some("2026-01-01T00:00:00Z".into()),
    }
}

pub fn sample_item(id: i64, name: &str) -> Item {
    Item {
        id,
        name: name.to_string(),
        description: String::new(),
        rarity: ItemRarity::Common,
        xp_multiplier: 1.5,
        currency_multiplier: 1.0,
        duration: Some(3600),
        icon_url: None,
    }
}

pub fn temp_session_db() -> (tempfile::TempDir, Arc<SessionDb>) {
    let dir = tempfile::tempdir().unwrap();
    let db = SessionDb::open(dir.path().join("session.redb")).unwrap();
    (dir, Arc::new(db))
}

/// Session logged in as user 1
pub async fn logged_in_session(backend: Arc<FakeBackend>) -> (tempfile::TempDir, Arc<SessionStore>) {
    let (dir, db) = temp_session_db();
    let session = Arc::new(SessionStore::new(backend, db));
    session.login("user1@example.com", PASSWORD).await.unwrap();
    (dir, session)
}

#[derive(Default)]
struct FakeState {
    users: HashMap<i64, User>,
    tasks: Vec<Task>,
    listings: Vec<ShopListing>,
    items: HashMap<i64, Item>,
    inventory: HashMap<i64, Vec<InventoryEntry>>,
    achievements: Vec<Achievement>,
    user_achievements: HashMap<i64, Vec<Achievement>>,
    next_id: i64,
    update_response: Option<Task>,
    last_task_update: Option<Task>,
    fail_next: Option<QuestError>,
    update_failures: HashMap<i64, QuestError>,
}

/// In-memory stand-in for the REST backend
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    calls: AtomicUsize,
    update_gate: Mutex<Option<Arc<Notify>>>,
    task_gates: Mutex<HashMap<i64, Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state().next_id = 1000;
        backend
    }

    pub fn with_user(user: User) -> Self {
        let backend = Self::new();
        backend.state().users.insert(user.id, user);
        backend
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Count the call and fail it if a failure was queued
    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.state().fail_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, status: u16, message: &str) {
        self.state().fail_next = Some(QuestError::Api {
            status,
            message: message.to_string(),
        });
    }

    pub fn user(&self, user_id: i64) -> Option<User> {
        self.state().users.get(&user_id).cloned()
    }

    pub fn seed_tasks(&self, tasks: Vec<Task>) {
        self.state().tasks = tasks;
    }

    pub fn seed_listings(&self, listings: Vec<ShopListing>) {
        self.state().listings = listings;
    }

    pub fn seed_items(&self, items: Vec<Item>) {
        let mut state = self.state();
        for item in items {
            state.items.insert(item.id, item);
        }
    }

    pub fn seed_inventory(&self, user_id: i64, entries: Vec<InventoryEntry>) {
        self.state().inventory.insert(user_id, entries);
    }

    pub fn seed_achievements(&self, global: Vec<Achievement>, user_id: i64, mine: Vec<Achievement>) {
        let mut state = self.state();
        state.achievements = global;
        state.user_achievements.insert(user_id, mine);
    }

    pub fn inventory_of(&self, user_id: i64) -> Vec<InventoryEntry> {
        self.state().inventory.get(&user_id).cloned().unwrap_or_default()
    }

    /// Answer every task update with this record
    pub fn respond_to_updates_with(&self, task: Task) {
        self.state().update_response = Some(task);
    }

    pub fn last_task_update(&self) -> Option<Task> {
        self.state().last_task_update.clone()
    }

    /// Park task updates until the returned notifier fires (once per update)
    pub fn hold_task_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.update_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn release_task_updates(&self) {
        *self.update_gate.lock().unwrap() = None;
    }

    /// Park the next update of one task until the returned notifier fires
    pub fn hold_update_of(&self, task_id: i64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.task_gates.lock().unwrap().insert(task_id, gate.clone());
        gate
    }

    /// Fail the next update of one task, after any hold on it is released
    pub fn fail_update_of(&self, task_id: i64, status: u16, message: &str) {
        self.state().update_failures.insert(
            task_id,
            QuestError::Api {
                status,
                message: message.to_string(),
            },
        );
    }

    /// The backend's copy of a task
    pub fn server_task(&self, task_id: i64) -> Option<Task> {
        self.state().tasks.iter().find(|t| t.id == task_id).cloned()
    }

    fn not_found(what: &str, id: i64) -> QuestError {
        QuestError::Api {
            status: 404,
            message: format!("{} {} not found", what, id),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_user(&self, user_id: i64) -> Result<User> {
        self.enter()?;
        self.user(user_id).ok_or_else(|| Self::not_found("User", user_id))
    }

    async fn authenticate(&self, credentials: &LoginRequest) -> Result<User> {
        self.enter()?;
        let state = self.state();
        state
            .users
            .values()
            .find(|u| u.email == credentials.email && credentials.password == PASSWORD)
            .cloned()
            .ok_or_else(|| QuestError::Api {
                status: 401,
                message: "Invalid email or password".into(),
            })
    }

    async fn register_user(&self, registration: &RegisterRequest) -> Result<User> {
        self.enter()?;
        let mut state = self.state();
        if state.users.values().any(|u| u.email == registration.email) {
            return Err(QuestError::Api {
                status: 409,
                message: "Email already registered".into(),
            });
        }
        state.next_id += 1;
        let user = User {
            id: state.next_id,
            name: registration.name.clone(),
            email: registration.email.clone(),
            level: 1,
            xp: 0,
            currency: 0,
            avatar: None,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user_id: i64, changes: &ProfileUpdate) -> Result<User> {
        self.enter()?;
        let mut state = self.state();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Self::not_found("User", user_id))?;
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(avatar) = &changes.avatar {
            user.avatar = Some(avatar.clone());
        }
        Ok(user.clone())
    }

    async fn list_tasks(&self, _user_id: i64) -> Result<Vec<Task>> {
        self.enter()?;
        Ok(self.state().tasks.clone())
    }

    async fn create_task(&self, author_id: i64, executor_id: i64, draft: &TaskDraft) -> Result<Task> {
        self.enter()?;
        let mut state = self.state();
        let person = |id: i64| {
            state.users.get(&id).map(PersonRef::from).unwrap_or(PersonRef {
                id,
                name: format!("User {}", id),
            })
        };
        let author = person(author_id);
        let executor = person(executor_id);
        state.next_id += 1;
        let task = Task {
            id: state.next_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            sphere: draft.sphere.clone(),
            status: draft.status,
            priority: draft.priority,
            difficulty: draft.difficulty.clone(),
            deadline: draft.deadline.clone(),
            duration: draft.duration,
            reward_xp: 10,
            reward_currency: 5,
            fast_done_bonus: 0,
            combo: 0,
            author: Some(author),
            executor: Some(executor),
            update_date: Some(chrono::Utc::now().to_rfc3339()),
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, _user_id: i64, task: &Task) -> Result<Task> {
        self.enter()?;
        self.state().last_task_update = Some(task.clone());

        let gate = self.update_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let task_gate = self.task_gates.lock().unwrap().remove(&task.id);
        if let Some(gate) = task_gate {
            gate.notified().await;
        }

        let mut state = self.state();
        if let Some(e) = state.update_failures.remove(&task.id) {
            return Err(e);
        }
        let saved = state.update_response.clone().unwrap_or_else(|| task.clone());
        match state.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = saved.clone(),
            None => return Err(Self::not_found("Task", task.id)),
        }
        Ok(saved)
    }

    async fn delete_task(&self, _user_id: i64, task_id: i64) -> Result<()> {
        self.enter()?;
        let mut state = self.state();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != task_id);
        if state.tasks.len() == before {
            return Err(Self::not_found("Task", task_id));
        }
        Ok(())
    }

    async fn list_shop(&self) -> Result<Vec<ShopListing>> {
        self.enter()?;
        Ok(self.state().listings.clone())
    }

    async fn buy_listing(&self, user_id: i64, listing_id: i64) -> Result<()> {
        self.enter()?;
        let mut state = self.state();
        let listing = state
            .listings
            .iter()
            .find(|l| l.id == listing_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Listing", listing_id))?;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Self::not_found("User", user_id))?;
        if user.currency < listing.cost {
            return Err(QuestError::Api {
                status: 400,
                message: "Not enough currency".into(),
            });
        }
        user.currency -= listing.cost;

        if let Some(l) = state.listings.iter_mut().find(|l| l.id == listing_id) {
            l.availability -= 1;
        }
        state.next_id += 1;
        let entry_id = state.next_id;
        let entries = state.inventory.entry(user_id).or_default();
        match entries.iter_mut().find(|e| e.item_id == listing.item_id) {
            Some(entry) => entry.amount += 1,
            None => entries.push(InventoryEntry {
                id: entry_id,
                item_id: listing.item_id,
                amount: 1,
                acquire_date: Some(chrono::Utc::now().to_rfc3339()),
            }),
        }
        Ok(())
    }

    async fn fetch_item(&self, item_id: i64) -> Result<Item> {
        self.enter()?;
        self.state()
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Item", item_id))
    }

    async fn list_inventory(&self, user_id: i64) -> Result<Vec<InventoryEntry>> {
        self.enter()?;
        Ok(self.inventory_of(user_id))
    }

    async fn sell_item(&self, user_id: i64, item_id: i64) -> Result<()> {
        self.enter()?;
        let mut state = self.state();
        let entries = state.inventory.entry(user_id).or_default();
        let Some(pos) = entries.iter().position(|e| e.item_id == item_id) else {
            return Err(Self::not_found("Inventory item", item_id));
        };
        if entries[pos].amount <= 1 {
            entries.remove(pos);
        } else {
            entries[pos].amount -= 1;
        }
        if let Some(user) = state.users.get_mut(&user_id) {
            user.currency += 10;
        }
        Ok(())
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        self.enter()?;
        Ok(self.state().achievements.clone())
    }

    async fn list_user_achievements(&self, user_id: i64) -> Result<Vec<Achievement>> {
        self.enter()?;
        Ok(self
            .state()
            .user_achievements
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}
