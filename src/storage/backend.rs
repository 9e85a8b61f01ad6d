//! `Storage` trait and implementations.
//!
//! Storage persists the project list and one idea set per project. Every
//! write replaces the whole document; there is no partial update.

use crate::core::idea::Idea;
use crate::core::project::{Project, ProjectId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Errors that can occur in a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for storage backends.
pub trait Storage: Send + Sync {
    /// Reads the project list; empty when nothing was saved yet.
    fn load_projects(&self) -> Result<Vec<Project>>;

    fn save_projects(&self, projects: &[Project]) -> Result<()>;

    /// Reads the ideas of one project; empty when the project has none.
    fn load_ideas(&self, project: ProjectId) -> Result<Vec<Idea>>;

    fn save_ideas(&self, project: ProjectId, ideas: &[Idea]) -> Result<()>;

    /// Drops a project's ideas. Missing data is not an error.
    fn remove_ideas(&self, project: ProjectId) -> Result<()>;

    /// Ideas saved before projects existed, if any are still around.
    fn load_legacy_ideas(&self) -> Result<Option<Vec<Idea>>> {
        Ok(None)
    }

    /// Forgets the legacy idea set once it has been moved into a project.
    fn clear_legacy_ideas(&self) -> Result<()> {
        Ok(())
    }
}

/// Thread-safe handle to any storage backend.
pub type SharedStorage = Arc<dyn Storage>;

/// In-memory storage for testing.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    projects: RwLock<Vec<Project>>,
    ideas: RwLock<HashMap<ProjectId, Vec<Idea>>>,
    legacy: RwLock<Option<Vec<Idea>>>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a legacy idea set, as left behind by an old data directory.
    #[must_use]
    pub fn with_legacy(ideas: Vec<Idea>) -> Self {
        Self {
            legacy: RwLock::new(Some(ideas)),
            ..Self::default()
        }
    }
}

impl Storage for InMemoryStorage {
    fn load_projects(&self) -> Result<Vec<Project>> {
        Ok(self.projects.read().expect("lock poisoned").clone())
    }

    fn save_projects(&self, projects: &[Project]) -> Result<()> {
        *self.projects.write().expect("lock poisoned") = projects.to_vec();
        Ok(())
    }

    fn load_ideas(&self, project: ProjectId) -> Result<Vec<Idea>> {
        let ideas = self.ideas.read().expect("lock poisoned");
        Ok(ideas.get(&project).cloned().unwrap_or_default())
    }

    fn save_ideas(&self, project: ProjectId, ideas: &[Idea]) -> Result<()> {
        self.ideas
            .write()
            .expect("lock poisoned")
            .insert(project, ideas.to_vec());
        Ok(())
    }

    fn remove_ideas(&self, project: ProjectId) -> Result<()> {
        self.ideas.write().expect("lock poisoned").remove(&project);
        Ok(())
    }

    fn load_legacy_ideas(&self) -> Result<Option<Vec<Idea>>> {
        Ok(self.legacy.read().expect("lock poisoned").clone())
    }

    fn clear_legacy_ideas(&self) -> Result<()> {
        *self.legacy.write().expect("lock poisoned") = None;
        Ok(())
    }
}

/// File-based storage: pretty-printed JSON documents under a data directory.
///
/// ```text
/// <root>/projects.json
/// <root>/ideas/<project-id>.json
/// <root>/ideas.json            (legacy, pre-project data)
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens storage rooted at `root`, creating the directories it needs.
    ///
    /// # Errors
    /// Returns an error if the directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("ideas"))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn projects_path(&self) -> PathBuf {
        self.root.join("projects.json")
    }

    #[must_use]
    pub fn ideas_path(&self, project: ProjectId) -> PathBuf {
        self.root.join("ideas").join(format!("{project}.json"))
    }

    #[must_use]
    pub fn legacy_path(&self) -> PathBuf {
        self.root.join("ideas.json")
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}

/// Writes to a sibling temp file and renames it over the target, so readers
/// never observe a half-written document.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl Storage for FileStorage {
    fn load_projects(&self) -> Result<Vec<Project>> {
        Ok(read_json(&self.projects_path())?.unwrap_or_default())
    }

    fn save_projects(&self, projects: &[Project]) -> Result<()> {
        write_json(&self.projects_path(), projects)
    }

    fn load_ideas(&self, project: ProjectId) -> Result<Vec<Idea>> {
        Ok(read_json(&self.ideas_path(project))?.unwrap_or_default())
    }

    fn save_ideas(&self, project: ProjectId, ideas: &[Idea]) -> Result<()> {
        write_json(&self.ideas_path(project), ideas)
    }

    fn remove_ideas(&self, project: ProjectId) -> Result<()> {
        remove_if_exists(&self.ideas_path(project))
    }

    fn load_legacy_ideas(&self) -> Result<Option<Vec<Idea>>> {
        read_json(&self.legacy_path())
    }

    fn clear_legacy_ideas(&self) -> Result<()> {
        remove_if_exists(&self.legacy_path())
    }
}
