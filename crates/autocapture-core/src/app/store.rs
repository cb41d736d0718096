//! WorldStore - エンジンと定期リフレッシュが共有する状態
//!
//! The main loop and the background refreshes all read and write the area
//! list and the player status. Writers never patch in place: they build the
//! next value and swap it in under the write lock, so readers always hold a
//! consistent `Arc` snapshot and concurrent writers are serialized.
//! Network calls happen before the lock is taken; a write guard is never
//! held across an `.await` on the service.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{Area, AreaId, JoinState, PlayerStatus};

#[derive(Default)]
pub struct WorldStore {
    areas: RwLock<Arc<Vec<Area>>>,
    player: RwLock<Option<Arc<PlayerStatus>>>,
}

impl WorldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn areas(&self) -> Arc<Vec<Area>> {
        Arc::clone(&*self.areas.read().await)
    }

    pub async fn area(&self, id: &AreaId) -> Option<Area> {
        self.areas.read().await.iter().find(|a| &a.id == id).cloned()
    }

    pub async fn player(&self) -> Option<Arc<PlayerStatus>> {
        self.player.read().await.clone()
    }

    /// Full refresh: `list` replaces the previous list wholesale, then each
    /// detailed record replaces its list entry.
    pub async fn publish_full(&self, list: Vec<Area>, details: Vec<Area>) {
        let mut next = list;
        merge_details(&mut next, details);
        *self.areas.write().await = Arc::new(next);
    }

    /// Active-only refresh: every non-captured area is first marked
    /// inactive, then the fresh details replace (or extend) the list.
    pub async fn publish_active(&self, details: Vec<Area>) {
        let mut guard = self.areas.write().await;
        let mut next: Vec<Area> = (**guard).clone();
        for area in next.iter_mut().filter(|a| !a.state.captured) {
            area.state.active = false;
        }
        merge_details(&mut next, details);
        *guard = Arc::new(next);
    }

    /// Local correction after the service refused a subarea as no longer
    /// open. The next refresh overwrites it with the remote view.
    pub async fn mark_subarea_captured(&self, area: &AreaId, position: u32) {
        let mut guard = self.areas.write().await;
        let mut next: Vec<Area> = (**guard).clone();
        let Some(subarea) = next
            .iter_mut()
            .find(|a| &a.id == area)
            .and_then(|a| a.subareas.iter_mut().find(|s| s.position == position))
        else {
            return;
        };
        subarea.captured = true;
        *guard = Arc::new(next);
    }

    pub async fn publish_player(&self, status: PlayerStatus) {
        *self.player.write().await = Some(Arc::new(status));
    }

    /// Rewrite the joined fields of the current player status, if any.
    pub async fn project_join(&self, join: &JoinState) {
        let mut guard = self.player.write().await;
        let Some(mut next) = guard.as_ref().map(|current| (**current).clone()) else {
            return;
        };
        next.project(join);
        *guard = Some(Arc::new(next));
    }
}

fn merge_details(list: &mut Vec<Area>, details: Vec<Area>) {
    for detail in details {
        match list.iter_mut().find(|a| a.id == detail.id) {
            Some(slot) => *slot = detail,
            None => list.push(detail),
        }
    }
}
