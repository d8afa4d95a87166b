//! ============================================================================
//! Core Types for the TaskQuest Client
//! ============================================================================
//! Wire records exchanged with the TaskQuest backend (camelCase JSON), the
//! canonical status/priority enumerations, and the client error type.
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias used throughout the core crate
pub type Result<T> = std::result::Result<T, QuestError>;

// ============================================================================
// Users
// ============================================================================

/// Authenticated user profile, as returned by `/users/*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub currency: i64,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Credentials for `POST /users/auth`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for `POST /users/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Partial profile update for `PUT /users/{id}`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.avatar.is_none() && self.password.is_none()
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// Task lifecycle status. Sent to the server as lowercase snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    New,
    Pending,
    InProgress,
    WaitingReview,
    Done,
}

/// Display labels, one row per status
const STATUS_LABELS: [(TaskStatus, &str, &str); 5] = [
    (TaskStatus::New, "new", "New"),
    (TaskStatus::Pending, "pending", "Pending"),
    (TaskStatus::InProgress, "in_progress", "In progress"),
    (TaskStatus::WaitingReview, "waiting_review", "Waiting for review"),
    (TaskStatus::Done, "done", "Done"),
];

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::New,
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::WaitingReview,
        TaskStatus::Done,
    ];

    /// Parse a status, ignoring case ("DONE", "In_Progress" are accepted)
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        STATUS_LABELS
            .iter()
            .find(|(_, wire, _)| *wire == wanted)
            .map(|(status, _, _)| *status)
    }

    pub fn as_str(self) -> &'static str {
        STATUS_LABELS
            .iter()
            .find(|(status, _, _)| *status == self)
            .map(|(_, wire, _)| *wire)
            .unwrap_or("new")
    }

    pub fn label(self) -> &'static str {
        STATUS_LABELS
            .iter()
            .find(|(status, _, _)| *status == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("New")
    }

    pub fn is_done(self) -> bool {
        self == TaskStatus::Done
    }

    /// Status a completion toggle moves to
    pub fn toggled(self) -> Self {
        if self.is_done() {
            TaskStatus::New
        } else {
            TaskStatus::Done
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. Sent to the server as lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Optional,
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

const PRIORITY_LABELS: [(TaskPriority, &str, &str); 5] = [
    (TaskPriority::Optional, "optional", "Optional"),
    (TaskPriority::Low, "low", "Low"),
    (TaskPriority::Normal, "normal", "Normal"),
    (TaskPriority::High, "high", "High"),
    (TaskPriority::Critical, "critical", "Critical"),
];

impl TaskPriority {
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        PRIORITY_LABELS
            .iter()
            .find(|(_, wire, _)| *wire == wanted)
            .map(|(priority, _, _)| *priority)
    }

    pub fn as_str(self) -> &'static str {
        PRIORITY_LABELS
            .iter()
            .find(|(priority, _, _)| *priority == self)
            .map(|(_, wire, _)| *wire)
            .unwrap_or("normal")
    }

    pub fn label(self) -> &'static str {
        PRIORITY_LABELS
            .iter()
            .find(|(priority, _, _)| *priority == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Normal")
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author/executor reference embedded in a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: i64,
    pub name: String,
}

impl From<&User> for PersonRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// A task as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sphere: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// RFC 3339 timestamp, if the task has a deadline
    #[serde(default)]
    pub deadline: Option<String>,
    /// Expected duration in seconds
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub reward_xp: i64,
    #[serde(default)]
    pub reward_currency: i64,
    #[serde(default)]
    pub fast_done_bonus: i64,
    #[serde(default)]
    pub combo: i64,
    #[serde(default)]
    pub author: Option<PersonRef>,
    #[serde(default)]
    pub executor: Option<PersonRef>,
    #[serde(default)]
    pub update_date: Option<String>,
}

/// Fields the user fills in to create a task. The server assigns the id
/// and computes rewards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sphere: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Defaults to the author when unset
    #[serde(skip)]
    pub executor_id: Option<i64>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Shop, Items, Inventory
// ============================================================================

/// Item rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    #[serde(other)]
    Unknown,
}

impl ItemRarity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
            Self::Unknown => "Unknown",
        }
    }
}

/// Item definition shared by shop listings and inventory entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "rarity_any_case")]
    pub rarity: ItemRarity,
    #[serde(default = "one")]
    pub xp_multiplier: f64,
    #[serde(default = "one")]
    pub currency_multiplier: f64,
    /// Effect duration in seconds
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

fn one() -> f64 {
    1.0
}

/// The backend has shipped rarity in both cases; fold to lowercase first
fn rarity_any_case<'de, D>(deserializer: D) -> std::result::Result<ItemRarity, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        Some(s) => serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
            .unwrap_or(ItemRarity::Unknown),
        None => ItemRarity::default(),
    })
}

/// A shop's sellable reference to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopListing {
    pub id: i64,
    pub item_id: i64,
    pub cost: i64,
    #[serde(default)]
    pub availability: i64,
}

/// Listing joined with its item, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopOffer {
    pub listing: ShopListing,
    pub item: Item,
}

impl ShopOffer {
    pub fn in_stock(&self) -> bool {
        self.listing.availability > 0
    }
}

/// An owned quantity of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub id: i64,
    pub item_id: i64,
    pub amount: u32,
    #[serde(default)]
    pub acquire_date: Option<String>,
}

/// Inventory entry joined with its item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedItem {
    pub entry: InventoryEntry,
    pub item: Item,
}

// ============================================================================
// Achievements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub is_achieved: Option<bool>,
    #[serde(default)]
    pub required_xp: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Achievement {
    pub fn achieved(&self) -> bool {
        self.is_achieved.unwrap_or(false)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error types for the client. Every variant is recoverable at the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum QuestError {
    #[error("No active user session")]
    NoActiveUser,

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Shop listing not found: {0}")]
    ListingNotFound(i64),

    #[error("Inventory entry not found for item {0}")]
    InventoryEntryNotFound(i64),

    #[error("Task {0} already has a status change in flight")]
    TaskBusy(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Local storage error: {0}")]
    Storage(String),
}

impl QuestError {
    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            QuestError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend reported the session's user as unknown/unauthorized
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403) | Some(404))
    }
}
