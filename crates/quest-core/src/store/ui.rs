//! ============================================================================
//! UI State - open modal and task edit buffers
//! ============================================================================
//! Stores signal the UI through this object instead of passing open/close
//! callbacks around: deleting a task closes an edit or confirm modal that
//! targets it.
//! ============================================================================

use std::sync::RwLock;
use tracing::debug;

use super::{read_lock, write_lock};
use crate::types::{Task, TaskPriority};

/// The single modal that may be open at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    CreateTask,
    EditTask(i64),
    ConfirmDelete(i64),
    ItemDetail(i64),
}

impl Modal {
    /// Task this modal is about, if any
    pub fn task_id(&self) -> Option<i64> {
        match self {
            Modal::EditTask(id) | Modal::ConfirmDelete(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct UiState {
    modal: RwLock<Modal>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(&self) -> Modal {
        *read_lock(&self.modal)
    }

    /// Open a modal, replacing whatever was open
    pub fn open(&self, modal: Modal) {
        debug!("Opening modal {:?}", modal);
        *write_lock(&self.modal) = modal;
    }

    pub fn close(&self) {
        *write_lock(&self.modal) = Modal::None;
    }

    /// Close the modal if it targets `task_id`. Returns whether it closed.
    pub fn close_if_editing(&self, task_id: i64) -> bool {
        let mut modal = write_lock(&self.modal);
        if modal.task_id() == Some(task_id) {
            debug!("Closing {:?} for removed task", *modal);
            *modal = Modal::None;
            true
        } else {
            false
        }
    }
}

/// Local edit buffer for one task. Resets when the source record changes
/// or the edit is cancelled.
#[derive(Debug, Clone, Default)]
pub struct TaskEditBuffer {
    source: Option<Task>,
    edited: Option<Task>,
}

impl TaskEditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, task: &Task) {
        self.source = Some(task.clone());
        self.edited = Some(task.clone());
    }

    pub fn is_editing(&self) -> bool {
        self.edited.is_some()
    }

    pub fn editing_id(&self) -> Option<i64> {
        self.source.as_ref().map(|t| t.id)
    }

    pub fn current(&self) -> Option<&Task> {
        self.edited.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.edited != self.source
    }

    pub fn set_title(&mut self, title: &str) {
        if let Some(task) = self.edited.as_mut() {
            task.title = title.to_string();
        }
    }

    pub fn set_description(&mut self, description: &str) {
        if let Some(task) = self.edited.as_mut() {
            task.description = description.to_string();
        }
    }

    pub fn set_priority(&mut self, priority: TaskPriority) {
        if let Some(task) = self.edited.as_mut() {
            task.priority = priority;
        }
    }

    pub fn set_deadline(&mut self, deadline: Option<String>) {
        if let Some(task) = self.edited.as_mut() {
            task.deadline = deadline;
        }
    }

    pub fn cancel(&mut self) {
        self.source = None;
        self.edited = None;
    }

    /// Re-base on a newer copy of the record. Unsaved edits are discarded
    /// when the record changed. Returns whether a reset happened.
    pub fn sync_source(&mut self, latest: &Task) -> bool {
        match &self.source {
            Some(source) if source.id == latest.id && source != latest => {
                self.begin(latest);
                true
            }
            _ => false,
        }
    }

    /// The edited task, ready to send as an update
    pub fn finish(&mut self) -> Option<Task> {
        let edited = self.edited.take();
        self.source = None;
        edited
    }
}
