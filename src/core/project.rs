//! Projects: named, independent idea sets.

use super::error::{Result, ThinktreeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name given to the project created when none exist.
pub const DEFAULT_PROJECT_NAME: &str = "My First Project";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u32);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The ordered list of projects and the rules for changing it.
///
/// At least one project must remain: removing the last one is refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl ProjectCatalog {
    #[must_use]
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub fn into_projects(self) -> Vec<Project> {
        self.projects
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Project> {
        self.projects.first()
    }

    #[must_use]
    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Finds a project by numeric id, falling back to an exact name match.
    ///
    /// # Errors
    /// Returns a `project_not_found` user error if nothing matches.
    pub fn resolve(&self, id_or_name: &str) -> Result<&Project> {
        let by_id = id_or_name
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|id| self.get(ProjectId(id)));

        by_id
            .or_else(|| self.projects.iter().find(|p| p.name == id_or_name))
            .ok_or_else(|| {
                ThinktreeError::user(
                    "project_not_found",
                    format!("Project '{id_or_name}' not found"),
                    "project:resolve",
                )
                .with_hint("Use 'thinktree project list' to see available projects")
            })
    }

    /// Appends a project with the next free id (largest id + 1).
    ///
    /// # Errors
    /// Returns `invalid_project_name` if the trimmed name is empty.
    pub fn create(&mut self, name: &str, now: DateTime<Utc>) -> Result<Project> {
        let name = validated_name(name, "project:create")?;
        let next = self.projects.iter().map(|p| p.id.0).max().unwrap_or(0) + 1;
        let project = Project {
            id: ProjectId(next),
            name,
            created_at: now,
        };
        self.projects.push(project.clone());
        Ok(project)
    }

    /// # Errors
    /// Returns `invalid_project_name` for a blank name, `project_not_found`
    /// for an unknown id.
    pub fn rename(&mut self, id: ProjectId, name: &str) -> Result<Project> {
        let name = validated_name(name, "project:rename")?;
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id, "project:rename"))?;
        project.name = name;
        Ok(project.clone())
    }

    /// Removes a project, refusing to remove the only one.
    ///
    /// # Errors
    /// Returns a capacity error (`last_project`) when `id` is the only
    /// project, `project_not_found` for an unknown id.
    pub fn remove(&mut self, id: ProjectId) -> Result<Project> {
        let position = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found(id, "project:remove"))?;
        if self.projects.len() <= 1 {
            return Err(ThinktreeError::capacity(
                "last_project",
                "You can't delete your only project",
                "project:remove",
            )
            .with_context("project", id.to_string())
            .with_hint("Create another project first"));
        }
        Ok(self.projects.remove(position))
    }
}

fn validated_name(name: &str, origin: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ThinktreeError::user(
            "invalid_project_name",
            "Project name cannot be empty",
            origin,
        )
        .with_hint("Provide a non-empty project name"));
    }
    Ok(name.to_string())
}

fn not_found(id: ProjectId, origin: &str) -> ThinktreeError {
    ThinktreeError::user(
        "project_not_found",
        format!("Project {id} not found"),
        origin,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCategory;

    fn catalog(names: &[&str]) -> ProjectCatalog {
        let mut catalog = ProjectCatalog::default();
        for name in names {
            catalog.create(name, Utc::now()).unwrap();
        }
        catalog
    }

    #[test]
    fn ids_are_max_plus_one() {
        let mut catalog = catalog(&["a", "b", "c"]);
        catalog.remove(ProjectId(2)).unwrap();
        let d = catalog.create("d", Utc::now()).unwrap();
        assert_eq!(d.id, ProjectId(4));

        catalog.remove(ProjectId(4)).unwrap();
        let e = catalog.create("e", Utc::now()).unwrap();
        assert_eq!(e.id, ProjectId(4));
    }

    #[test]
    fn create_and_rename_trim_names() {
        let mut catalog = catalog(&["  spaced  "]);
        assert_eq!(catalog.projects()[0].name, "spaced");

        let renamed = catalog.rename(ProjectId(1), "  new name ").unwrap();
        assert_eq!(renamed.name, "new name");
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut catalog = catalog(&["a"]);
        let err = catalog.create("   ", Utc::now()).unwrap_err();
        assert_eq!(err.code, "invalid_project_name");
        let err = catalog.rename(ProjectId(1), "").unwrap_err();
        assert_eq!(err.code, "invalid_project_name");
        assert_eq!(catalog.projects()[0].name, "a");
    }

    #[test]
    fn removing_last_project_is_refused() {
        let mut catalog = catalog(&["only"]);
        let err = catalog.remove(ProjectId(1)).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Capacity);
        assert_eq!(err.code, "last_project");
        assert_eq!(catalog.projects().len(), 1);
    }

    #[test]
    fn resolve_by_id_or_name() {
        let catalog = catalog(&["alpha", "beta"]);
        assert_eq!(catalog.resolve("2").unwrap().name, "beta");
        assert_eq!(catalog.resolve("alpha").unwrap().id, ProjectId(1));
        let err = catalog.resolve("gamma").unwrap_err();
        assert_eq!(err.code, "project_not_found");
    }

    #[test]
    fn serializes_created_at_in_camel_case() {
        let catalog = catalog(&["a"]);
        let json = serde_json::to_value(&catalog.projects()[0]).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["id"], 1);
    }
}
