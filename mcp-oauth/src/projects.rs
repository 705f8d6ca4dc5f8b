//! Project page lookup used after logout

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProjectLookupError {
    #[error("project not found: {0}")]
    NotFound(Uuid),

    #[error("project lookup failed: {0}")]
    Backend(String),
}

/// Resolves where a browser should land for a project
#[async_trait]
pub trait ProjectLookup: Send + Sync {
    async fn page_url(&self, project_id: Uuid) -> Result<String, ProjectLookupError>;
}

/// Lookup backed by the static `projects` configuration table
#[derive(Debug, Clone, Default)]
pub struct StaticProjectLookup {
    pages: HashMap<Uuid, String>,
}

impl StaticProjectLookup {
    pub fn new(pages: HashMap<Uuid, String>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl ProjectLookup for StaticProjectLookup {
    async fn page_url(&self, project_id: Uuid) -> Result<String, ProjectLookupError> {
        self.pages
            .get(&project_id)
            .cloned()
            .ok_or(ProjectLookupError::NotFound(project_id))
    }
}
