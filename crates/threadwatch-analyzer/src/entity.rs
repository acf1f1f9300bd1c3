use std::collections::HashSet;
use std::sync::Arc;

use threadwatch_persist::{PersistError, PersistenceClient};
use threadwatch_types::project::AUTO_DETECTED_DESCRIPTION;
use threadwatch_types::{Project, ProjectMention};

/// Links a project mention to a stored project, creating one when nothing matches.
///
/// Matching is a loose case-insensitive substring test on names and keywords,
/// so it errs toward merging distinct projects.
#[derive(Clone)]
pub struct EntityResolver {
    store: Arc<dyn PersistenceClient>,
}

impl EntityResolver {
    pub fn new(store: Arc<dyn PersistenceClient>) -> Self {
        Self { store }
    }

    /// Stored projects matching the mention's name, then each keyword,
    /// de-duplicated by id in first-seen order.
    pub async fn candidates(&self, mention: &ProjectMention) -> Result<Vec<Project>, PersistError> {
        let mut found = self.store.search_projects(&mention.project_name).await?;
        for keyword in &mention.keywords {
            found.extend(self.store.search_projects(keyword).await?);
        }

        let mut seen = HashSet::new();
        found.retain(|p| seen.insert(p.project_id.clone()));
        Ok(found)
    }

    pub async fn resolve(&self, mention: &ProjectMention) -> Result<Project, PersistError> {
        let candidates = self.candidates(mention).await?;
        let matches = candidates.len();
        if let Some(existing) = candidates.into_iter().next() {
            tracing::info!(
                mention = %mention.project_name,
                project = %existing.project_name,
                matches,
                "Matched existing project"
            );
            return Ok(existing);
        }

        let project = Project::new(
            mention.project_name.clone(),
            AUTO_DETECTED_DESCRIPTION,
            mention.keywords.clone(),
        );
        self.store.save_project(&project).await?;
        tracing::info!(project = %project.project_name, id = %project.project_id, "Created new project");
        Ok(project)
    }
}

impl std::fmt::Debug for EntityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityResolver").finish_non_exhaustive()
    }
}
