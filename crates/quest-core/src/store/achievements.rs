//! Achievement Store - read-only lists, global or for the current user.

use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::debug;

use super::{read_lock, write_lock, SessionStore};
use crate::api::Backend;
use crate::types::{Achievement, Result};

/// Which achievement list to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementScope {
    All,
    ForCurrentUser,
}

/// A locked achievement and the XP still needed for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementProgress {
    pub achievement: Achievement,
    pub remaining_xp: i64,
}

pub struct AchievementStore {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    achievements: RwLock<Vec<Achievement>>,
}

impl AchievementStore {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self {
            backend,
            session,
            achievements: RwLock::new(Vec::new()),
        }
    }

    pub async fn load(&self, scope: AchievementScope) -> Result<usize> {
        let fetched = match scope {
            AchievementScope::All => self.backend.list_achievements().await?,
            AchievementScope::ForCurrentUser => {
                let user = self.session.require_user()?;
                self.backend.list_user_achievements(user.id).await?
            }
        };
        let count = fetched.len();
        *write_lock(&self.achievements) = fetched;
        debug!("Loaded {} achievements ({:?})", count, scope);
        Ok(count)
    }

    pub fn clear(&self) {
        write_lock(&self.achievements).clear();
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        read_lock(&self.achievements).clone()
    }

    pub fn unlocked(&self) -> Vec<Achievement> {
        read_lock(&self.achievements)
            .iter()
            .filter(|a| a.achieved())
            .cloned()
            .collect()
    }

    /// Locked XP-based achievements, closest first
    pub fn progress_towards(&self, xp: i64) -> Vec<AchievementProgress> {
        let mut progress: Vec<AchievementProgress> = read_lock(&self.achievements)
            .iter()
            .filter(|a| !a.achieved())
            .filter_map(|a| {
                let required = a.required_xp?;
                Some(AchievementProgress {
                    achievement: a.clone(),
                    remaining_xp: (required - xp).max(0),
                })
            })
            .collect();
        progress.sort_by_key(|p| p.remaining_xp);
        progress
    }
}
