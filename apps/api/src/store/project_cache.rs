//! In-process map of fetched project rows, keyed by id. Read-through in the
//! projects handlers; entries are replaced on update and dropped on delete.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::models::project::ProjectRow;

#[derive(Default)]
pub struct ProjectCache {
    inner: RwLock<HashMap<Uuid, ProjectRow>>,
}

impl ProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<ProjectRow> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(&id).cloned()
    }

    pub fn insert(&self, project: ProjectRow) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(project.id, project);
    }

    pub fn remove(&self, id: Uuid) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{STATUS_GENERATING, STATUS_READY};
    use chrono::Utc;

    fn project(status: &str) -> ProjectRow {
        ProjectRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Test Project".to_string(),
            description: None,
            project_type: "website".to_string(),
            status: status.to_string(),
            model: "sonnet-4.5".to_string(),
            github_repo: None,
            publish_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn insert_then_get_returns_the_row() {
        let cache = ProjectCache::new();
        let p = project(STATUS_GENERATING);
        let id = p.id;
        cache.insert(p);
        assert_eq!(cache.get(id).unwrap().status, STATUS_GENERATING);
    }

    #[test]
    fn insert_replaces_an_existing_entry() {
        let cache = ProjectCache::new();
        let mut p = project(STATUS_GENERATING);
        let id = p.id;
        cache.insert(p.clone());
        p.status = STATUS_READY.to_string();
        cache.insert(p);
        assert_eq!(cache.get(id).unwrap().status, STATUS_READY);
    }

    #[test]
    fn remove_drops_the_entry() {
        let cache = ProjectCache::new();
        let p = project(STATUS_READY);
        let id = p.id;
        cache.insert(p);
        cache.remove(id);
        assert!(cache.get(id).is_none());
    }
}
