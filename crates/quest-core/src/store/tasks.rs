//! ============================================================================
//! Task Store - the current user's task list
//! ============================================================================
//! Create/update/delete are pessimistic: the request goes first and local
//! state changes only once the server confirms.
//!
//! Status toggle is optimistic:
//! ```text
//! Idle -> Optimistic (flip status + stamp updateDate locally)
//!      -> Reconciling (PUT full task)
//!      -> Committed (replace with server object, re-sort)
//!       | RolledBack (restore the whole pre-toggle list)
//! ```
//! At most one toggle per task id is in flight; a second one is rejected
//! with `TaskBusy`. Toggles on different tasks run independently: a
//! rollback keeps every task whose change the server confirmed while the
//! failed toggle was in flight.
//! ============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::{read_lock, write_lock, SessionStore, UiState};
use crate::api::Backend;
use crate::types::{QuestError, Result, Task, TaskDraft, TaskStatus, User};
use crate::validate;

pub struct TaskStore {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    ui: Arc<UiState>,
    tasks: RwLock<Vec<Task>>,
    in_flight: Mutex<HashSet<i64>>,
    changes: Mutex<ChangeLog>,
    last_error: RwLock<Option<QuestError>>,
}

/// Sequence of server-confirmed changes to the local list
#[derive(Debug, Default)]
struct ChangeLog {
    seq: u64,
    /// Task id -> sequence number of its latest confirmed change
    touched: HashMap<i64, u64>,
    /// Sequence number of the latest wholesale reload or clear
    reset_at: u64,
}

impl ChangeLog {
    fn touch(&mut self, task_id: i64) {
        self.seq += 1;
        self.touched.insert(task_id, self.seq);
    }

    fn reset(&mut self) {
        self.seq += 1;
        self.reset_at = self.seq;
        self.touched.clear();
    }

    fn touched_since(&self, mark: u64) -> HashSet<i64> {
        self.touched
            .iter()
            .filter(|(_, seq)| **seq > mark)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Holds a task id in the in-flight set until dropped
struct ToggleGuard<'a> {
    in_flight: &'a Mutex<HashSet<i64>>,
    task_id: i64,
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.task_id);
    }
}

/// Newest first. Stable, so equal timestamps keep their relative order;
/// tasks without a timestamp go last.
fn sort_by_update_date(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.update_date.cmp(&a.update_date));
}

impl TaskStore {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>, ui: Arc<UiState>) -> Self {
        Self {
            backend,
            session,
            ui,
            tasks: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
            changes: Mutex::new(ChangeLog::default()),
            last_error: RwLock::new(None),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn tasks(&self) -> Vec<Task> {
        read_lock(&self.tasks).clone()
    }

    pub fn get(&self, task_id: i64) -> Option<Task> {
        read_lock(&self.tasks).iter().find(|t| t.id == task_id).cloned()
    }

    pub fn by_status(&self, status: TaskStatus) -> Vec<Task> {
        read_lock(&self.tasks)
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        read_lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.tasks).is_empty()
    }

    pub fn last_error(&self) -> Option<QuestError> {
        read_lock(&self.last_error).clone()
    }

    /// Whether a status toggle for this task is awaiting the server
    pub fn is_toggling(&self, task_id: i64) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&task_id)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Replace the local list with the server's
    pub async fn load(&self) -> Result<usize> {
        let actor = self.actor()?;
        let mut fetched = self
            .backend
            .list_tasks(actor.id)
            .await
            .map_err(|e| self.record(e))?;
        sort_by_update_date(&mut fetched);

        let count = fetched.len();
        {
            let mut tasks = write_lock(&self.tasks);
            *tasks = fetched;
            self.changes().reset();
        }
        self.clear_error();
        debug!("Loaded {} tasks for user {}", count, actor.id);
        Ok(count)
    }

    /// Forget all tasks (e.g. after logout)
    pub fn clear(&self) {
        let mut tasks = write_lock(&self.tasks);
        tasks.clear();
        self.changes().reset();
        drop(tasks);
        self.clear_error();
    }

    pub async fn add(&self, draft: TaskDraft) -> Result<Task> {
        validate::validate_draft(&draft).map_err(|e| self.record(e))?;
        let actor = self.actor()?;
        let executor_id = draft.executor_id.unwrap_or(actor.id);

        let created = self
            .backend
            .create_task(actor.id, executor_id, &draft)
            .await
            .map_err(|e| self.record(e))?;

        {
            let mut tasks = write_lock(&self.tasks);
            tasks.retain(|t| t.id != created.id);
            tasks.insert(0, created.clone());
            sort_by_update_date(&mut tasks);
            self.changes().touch(created.id);
        }
        self.clear_error();
        info!("Created task {} '{}'", created.id, created.title);
        Ok(created)
    }

    /// Send a full updated task; the server's copy replaces the local one
    pub async fn update(&self, task: Task) -> Result<Task> {
        validate::validate_title(&task.title)
            .and_then(|_| validate::validate_deadline(task.deadline.as_deref()))
            .map_err(|e| self.record(e))?;
        let actor = self.actor()?;
        self.require_local(task.id)?;

        let saved = self
            .backend
            .update_task(actor.id, &task)
            .await
            .map_err(|e| self.record(e))?;

        self.replace(saved.clone());
        self.clear_error();
        info!("Updated task {}", saved.id);
        Ok(saved)
    }

    /// Delete a task, then close any modal that targets it
    pub async fn delete(&self, task_id: i64) -> Result<()> {
        let actor = self.actor()?;
        self.require_local(task_id)?;

        self.backend
            .delete_task(actor.id, task_id)
            .await
            .map_err(|e| self.record(e))?;

        {
            let mut tasks = write_lock(&self.tasks);
            tasks.retain(|t| t.id != task_id);
            self.changes().touch(task_id);
        }
        self.ui.close_if_editing(task_id);
        self.clear_error();
        info!("Deleted task {}", task_id);
        Ok(())
    }

    /// Flip a task between `done` and `new`, optimistically
    pub async fn toggle_status(&self, task_id: i64) -> Result<Task> {
        let actor = self.actor()?;
        let _guard = self.claim_toggle(task_id)?;

        // Optimistic phase: snapshot the whole list, then mutate
        let (snapshot, mark, optimistic) = {
            let mut tasks = write_lock(&self.tasks);
            let snapshot = tasks.clone();
            let mark = self.changes().seq;
            let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
                return Err(self.record(QuestError::TaskNotFound(task_id)));
            };
            task.status = task.status.toggled();
            task.update_date = Some(chrono::Utc::now().to_rfc3339());
            (snapshot, mark, task.clone())
        };
        debug!("Task {} optimistically set to {}", task_id, optimistic.status);

        // Reconcile
        match self.backend.update_task(actor.id, &optimistic).await {
            Ok(confirmed) => {
                self.replace(confirmed.clone());
                self.clear_error();
                info!("Task {} status committed as {}", confirmed.id, confirmed.status);
                Ok(confirmed)
            }
            Err(e) => {
                warn!("Toggle of task {} failed, rolling back: {}", task_id, e);
                self.roll_back(task_id, snapshot, mark);
                Err(self.record(e))
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn actor(&self) -> Result<User> {
        self.session.require_user().map_err(|e| self.record(e))
    }

    fn require_local(&self, task_id: i64) -> Result<()> {
        if read_lock(&self.tasks).iter().any(|t| t.id == task_id) {
            Ok(())
        } else {
            Err(self.record(QuestError::TaskNotFound(task_id)))
        }
    }

    fn changes(&self) -> MutexGuard<'_, ChangeLog> {
        self.changes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Restore the pre-toggle list. Tasks the server confirmed changes for
    /// after `mark`, and other toggles still in flight, keep their current
    /// state.
    fn roll_back(&self, task_id: i64, snapshot: Vec<Task>, mark: u64) {
        let mut tasks = write_lock(&self.tasks);
        let mut changes = self.changes();
        if changes.reset_at > mark {
            debug!("Task list reloaded during toggle of {}, keeping it", task_id);
            return;
        }

        let mut keep = changes.touched_since(mark);
        keep.extend(
            self.in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .iter()
                .filter(|id| **id != task_id),
        );

        if keep.is_empty() {
            *tasks = snapshot;
        } else {
            let mut restored: Vec<Task> = snapshot
                .into_iter()
                .filter(|t| !keep.contains(&t.id))
                .collect();
            restored.extend(tasks.iter().filter(|t| keep.contains(&t.id)).cloned());
            sort_by_update_date(&mut restored);
            debug!("Rollback of task {} kept {} other tasks as they are", task_id, keep.len());
            *tasks = restored;
        }
        // The restored copy is what the server still holds
        changes.touch(task_id);
    }

    fn claim_toggle(&self, task_id: i64) -> Result<ToggleGuard<'_>> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(task_id);
        if !inserted {
            return Err(self.record(QuestError::TaskBusy(task_id)));
        }
        Ok(ToggleGuard {
            in_flight: &self.in_flight,
            task_id,
        })
    }

    /// Swap in the server's copy of a task and re-sort
    fn replace(&self, task: Task) {
        let mut tasks = write_lock(&self.tasks);
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                self.changes().touch(task.id);
                *slot = task;
            }
            None => debug!("Task {} no longer in list, not re-adding", task.id),
        }
        sort_by_update_date(&mut tasks);
    }

    fn record(&self, error: QuestError) -> QuestError {
        *write_lock(&self.last_error) = Some(error.clone());
        error
    }

    fn clear_error(&self) {
        *write_lock(&self.last_error) = None;
    }
}
