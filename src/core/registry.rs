//! Registry for projects and their ideas.
//!
//! The registry is the single entry point for the command line: it resolves
//! projects, loads an idea set through the storage layer, applies one
//! [`IdeaStore`] mutation and writes the set back when it changed.

use crate::core::config::ThinktreeConfig;
use crate::core::error::{Result, ThinktreeError};
use crate::core::guided::GuidedSession;
use crate::core::idea::{Idea, IdeaId};
use crate::core::project::{Project, ProjectCatalog, ProjectId, DEFAULT_PROJECT_NAME};
use crate::core::store::{IdeaStore, Mutation, NoopReason};
use crate::core::tags::all_tags;
use crate::core::view::{render, RenderedView, ViewState};
use crate::storage::{FileStorage, SharedStorage, StorageError};
use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base directory for thinktree data.
    pub data_dir: PathBuf,
}

impl RegistryConfig {
    /// Creates a new config with default data directory.
    #[must_use]
    pub fn default_dir() -> Self {
        if let Ok(data_dir) = env::var("THINKTREE_DATA_DIR") {
            return Self {
                data_dir: PathBuf::from(data_dir),
            };
        }

        let data_dir = dirs::home_dir()
            .map_or_else(|| PathBuf::from(".thinktree"), |h| h.join(".thinktree"));
        Self { data_dir }
    }

    /// Creates a config with custom data directory.
    #[must_use]
    pub fn with_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the path to the optional settings file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.yaml")
    }

    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(".lock")
    }
}

/// Result of an idea command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdeaChange {
    pub project: ProjectId,
    #[serde(flatten)]
    pub outcome: Mutation,
    /// The idea after the change (before it, for deletions).
    pub idea: Option<Idea>,
}

/// The registry manages projects and ideas on top of a storage backend.
pub struct Registry {
    storage: SharedStorage,
    config: RegistryConfig,
    settings: ThinktreeConfig,
}

fn storage_error(e: &StorageError, origin: &'static str) -> ThinktreeError {
    ThinktreeError::system("storage_failed", e.to_string(), origin)
}

impl Registry {
    /// Opens or creates a registry at the default location.
    ///
    /// # Errors
    /// Returns an error if the data directory or settings cannot be read.
    pub fn open() -> Result<Self> {
        Self::open_with_config(RegistryConfig::default_dir())
    }

    /// Opens or creates a registry with custom config.
    ///
    /// # Errors
    /// Returns an error if the data directory or settings cannot be read.
    pub fn open_with_config(config: RegistryConfig) -> Result<Self> {
        let storage = FileStorage::open(&config.data_dir).map_err(|e| {
            ThinktreeError::system("store_open_failed", e.to_string(), "registry:open")
                .with_context("data_dir", config.data_dir.display().to_string())
        })?;
        let settings = ThinktreeConfig::load(&config.config_path())?;

        Ok(Self {
            storage: Arc::new(storage),
            config,
            settings,
        })
    }

    /// Creates a registry with a custom storage backend (for testing).
    #[must_use]
    pub fn with_storage(storage: SharedStorage, config: RegistryConfig) -> Self {
        Self {
            storage,
            config,
            settings: ThinktreeConfig::default(),
        }
    }

    #[must_use]
    pub fn with_settings(self, settings: ThinktreeConfig) -> Self {
        Self { settings, ..self }
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn settings(&self) -> &ThinktreeConfig {
        &self.settings
    }

    /// Takes the data directory lock. Released when the returned file drops.
    fn lock(&self, origin: &'static str) -> Result<File> {
        fs::create_dir_all(&self.config.data_dir)
            .map_err(|e| ThinktreeError::system("create_dir_failed", e.to_string(), origin))?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.config.lock_path())
            .map_err(|e| ThinktreeError::system("lock_open_failed", e.to_string(), origin))?;

        file.lock_exclusive().map_err(|e| {
            ThinktreeError::system("lock_failed", e.to_string(), origin)
                .with_context("path", self.config.lock_path().display().to_string())
        })?;
        Ok(file)
    }

    /// Loads the project catalog, creating the default project (and moving
    /// any legacy idea set into it) when none exist. Caller holds the lock.
    fn catalog(&self, origin: &'static str) -> Result<ProjectCatalog> {
        let projects = self
            .storage
            .load_projects()
            .map_err(|e| storage_error(&e, origin))?;
        if !projects.is_empty() {
            return Ok(ProjectCatalog::new(projects));
        }

        let mut catalog = ProjectCatalog::default();
        let project = catalog.create(DEFAULT_PROJECT_NAME, Utc::now())?;
        tracing::debug!(project = %project.id, "created default project");

        if let Some(legacy) = self
            .storage
            .load_legacy_ideas()
            .map_err(|e| storage_error(&e, origin))?
        {
            tracing::debug!(project = %project.id, ideas = legacy.len(), "migrating legacy ideas");
            self.storage
                .save_ideas(project.id, &legacy)
                .map_err(|e| storage_error(&e, origin))?;
            self.storage
                .clear_legacy_ideas()
                .map_err(|e| storage_error(&e, origin))?;
        }

        self.storage
            .save_projects(catalog.projects())
            .map_err(|e| storage_error(&e, origin))?;
        Ok(catalog)
    }

    fn save_catalog(&self, catalog: &ProjectCatalog, origin: &'static str) -> Result<()> {
        self.storage
            .save_projects(catalog.projects())
            .map_err(|e| storage_error(&e, origin))
    }

    /// Resolves `id_or_name`, or the first project when `None`.
    fn resolve_in(
        catalog: &ProjectCatalog,
        id_or_name: Option<&str>,
        origin: &'static str,
    ) -> Result<Project> {
        match id_or_name {
            Some(id_or_name) => catalog.resolve(id_or_name).cloned(),
            None => catalog.first().cloned().ok_or_else(|| {
                ThinktreeError::system("no_projects", "No projects available", origin)
            }),
        }
    }

    fn load_store(&self, project: ProjectId, origin: &'static str) -> Result<IdeaStore> {
        let ideas = self
            .storage
            .load_ideas(project)
            .map_err(|e| storage_error(&e, origin))?;
        Ok(IdeaStore::from_ideas(ideas))
    }

    /// Lists all projects in creation order.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let _lock = self.lock("registry:list_projects")?;
        Ok(self.catalog("registry:list_projects")?.into_projects())
    }

    /// Gets a project by id or name; `None` selects the first project.
    ///
    /// # Errors
    /// Returns an error if the project is not found.
    pub fn get_project(&self, id_or_name: Option<&str>) -> Result<Project> {
        let _lock = self.lock("registry:get_project")?;
        let catalog = self.catalog("registry:get_project")?;
        Self::resolve_in(&catalog, id_or_name, "registry:get_project")
    }

    /// Creates a new project.
    ///
    /// # Errors
    /// Returns an error if the name is blank or storage fails.
    pub fn create_project(&self, name: &str) -> Result<Project> {
        let origin = "registry:create_project";
        let _lock = self.lock(origin)?;
        let mut catalog = self.catalog(origin)?;
        let project = catalog.create(name, Utc::now())?;
        self.save_catalog(&catalog, origin)?;
        tracing::debug!(project = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    /// Renames a project.
    ///
    /// # Errors
    /// Returns an error if the project is not found or the name is blank.
    pub fn rename_project(&self, id_or_name: &str, name: &str) -> Result<Project> {
        let origin = "registry:rename_project";
        let _lock = self.lock(origin)?;
        let mut catalog = self.catalog(origin)?;
        let id = catalog.resolve(id_or_name)?.id;
        let project = catalog.rename(id, name)?;
        self.save_catalog(&catalog, origin)?;
        tracing::debug!(project = %project.id, name = %project.name, "project renamed");
        Ok(project)
    }

    /// Deletes a project and its ideas.
    ///
    /// # Errors
    /// Returns a capacity error when this is the only project.
    pub fn delete_project(&self, id_or_name: &str) -> Result<Project> {
        let origin = "registry:delete_project";
        let _lock = self.lock(origin)?;
        let mut catalog = self.catalog(origin)?;
        let id = catalog.resolve(id_or_name)?.id;
        let project = catalog.remove(id)?;
        self.save_catalog(&catalog, origin)?;
        self.storage
            .remove_ideas(project.id)
            .map_err(|e| storage_error(&e, origin))?;
        tracing::debug!(project = %project.id, "project deleted");
        Ok(project)
    }

    /// Returns the ideas of a project in storage order.
    ///
    /// # Errors
    /// Returns an error if the project is not found or storage fails.
    pub fn ideas(&self, project: Option<&str>) -> Result<(Project, Vec<Idea>)> {
        let origin = "registry:ideas";
        let _lock = self.lock(origin)?;
        let catalog = self.catalog(origin)?;
        let project = Self::resolve_in(&catalog, project, origin)?;
        let store = self.load_store(project.id, origin)?;
        Ok((project, store.into_ideas()))
    }

    /// Gets one idea.
    ///
    /// # Errors
    /// Returns `idea_not_found` if the project has no idea with this id.
    pub fn get_idea(&self, project: Option<&str>, id: IdeaId) -> Result<Idea> {
        let (project, ideas) = self.ideas(project)?;
        ideas
            .into_iter()
            .find(|idea| idea.id == id)
            .ok_or_else(|| idea_not_found(project.id, id, "registry:get_idea"))
    }

    /// Every tag used in a project, sorted.
    ///
    /// # Errors
    /// Returns an error if the project is not found or storage fails.
    pub fn tags(&self, project: Option<&str>) -> Result<Vec<String>> {
        let (_, ideas) = self.ideas(project)?;
        Ok(all_tags(&ideas))
    }

    /// Renders the project named by `state`.
    ///
    /// # Errors
    /// Returns an error if the project does not exist or storage fails.
    pub fn view(&self, state: &ViewState) -> Result<RenderedView> {
        let origin = "registry:view";
        let _lock = self.lock(origin)?;
        let catalog = self.catalog(origin)?;
        if catalog.get(state.project).is_none() {
            return Err(ThinktreeError::user(
                "project_not_found",
                format!("Project {} not found", state.project),
                origin,
            ));
        }
        let store = self.load_store(state.project, origin)?;
        Ok(render(state, store.ideas(), &self.settings))
    }

    /// Loads a project's idea set, applies `apply` and saves the set if the
    /// mutation changed it. `target` ids must exist in the set.
    fn mutate(
        &self,
        project: Option<&str>,
        targets: &[IdeaId],
        origin: &'static str,
        apply: impl FnOnce(&mut IdeaStore) -> (Mutation, Option<Idea>),
    ) -> Result<IdeaChange> {
        let _lock = self.lock(origin)?;
        let catalog = self.catalog(origin)?;
        let project = Self::resolve_in(&catalog, project, origin)?;
        let mut store = self.load_store(project.id, origin)?;

        if let Some(missing) = targets.iter().find(|id| !store.contains(**id)) {
            return Err(idea_not_found(project.id, *missing, origin));
        }

        let (outcome, idea) = apply(&mut store);
        if outcome.is_applied() {
            self.storage
                .save_ideas(project.id, store.ideas())
                .map_err(|e| storage_error(&e, origin))?;
            tracing::debug!(project = %project.id, origin, "ideas saved");
        } else {
            tracing::debug!(project = %project.id, origin, ?outcome, "mutation left ideas unchanged");
        }

        Ok(IdeaChange {
            project: project.id,
            outcome,
            idea,
        })
    }

    /// Captures a new idea. Blank text leaves the project unchanged.
    ///
    /// # Errors
    /// Returns an error if the project is not found or storage fails.
    pub fn add_idea(&self, project: Option<&str>, text: &str) -> Result<IdeaChange> {
        self.mutate(project, &[], "registry:add_idea", |store| {
            match store.create(text) {
                Some(idea) => (Mutation::Applied, Some(idea)),
                None => (Mutation::Unchanged(NoopReason::EmptyText), None),
            }
        })
    }

    /// Replaces an idea's text.
    ///
    /// # Errors
    /// Returns `idea_not_found` for an unknown id.
    pub fn edit_idea(&self, project: Option<&str>, id: IdeaId, text: &str) -> Result<IdeaChange> {
        self.mutate(project, &[id], "registry:edit_idea", |store| {
            let outcome = store.update_text(id, text);
            (outcome, store.get(id).cloned())
        })
    }

    /// Records that `child` builds on `parent`.
    ///
    /// # Errors
    /// Returns `idea_not_found` if either id is unknown.
    pub fn link_ideas(
        &self,
        project: Option<&str>,
        child: IdeaId,
        parent: IdeaId,
    ) -> Result<IdeaChange> {
        self.mutate(project, &[child, parent], "registry:link_ideas", |store| {
            let outcome = store.set_link(child, parent);
            (outcome, store.get(child).cloned())
        })
    }

    /// # Errors
    /// Returns `idea_not_found` for an unknown id.
    pub fn unlink_idea(&self, project: Option<&str>, id: IdeaId) -> Result<IdeaChange> {
        self.mutate(project, &[id], "registry:unlink_idea", |store| {
            let outcome = store.clear_link(id);
            (outcome, store.get(id).cloned())
        })
    }

    /// Toggles the trunk designation of an idea.
    ///
    /// # Errors
    /// Returns `idea_not_found` for an unknown id.
    pub fn toggle_trunk(&self, project: Option<&str>, id: IdeaId) -> Result<IdeaChange> {
        self.mutate(project, &[id], "registry:toggle_trunk", |store| {
            let outcome = store.set_trunk(id);
            (outcome, store.get(id).cloned())
        })
    }

    /// Deletes an idea; ideas built on it become roots.
    ///
    /// # Errors
    /// Returns `idea_not_found` for an unknown id.
    pub fn delete_idea(&self, project: Option<&str>, id: IdeaId) -> Result<IdeaChange> {
        self.mutate(project, &[id], "registry:delete_idea", |store| {
            let removed = store.get(id).cloned();
            (store.delete(id), removed)
        })
    }

    /// Saves a finished guided session: the core answer becomes the trunk and
    /// every other answer builds on it.
    ///
    /// # Errors
    /// Returns a user error if the answers do not complete the session.
    pub fn guided(&self, project: Option<&str>, answers: &[String]) -> Result<Vec<Idea>> {
        let mut session = GuidedSession::new();
        session.answer_all(answers)?;
        let texts = session.finish()?;

        let origin = "registry:guided";
        let _lock = self.lock(origin)?;
        let catalog = self.catalog(origin)?;
        let project = Self::resolve_in(&catalog, project, origin)?;
        let mut store = self.load_store(project.id, origin)?;

        let created = store.add_guided(&texts, Utc::now());
        if !created.is_empty() {
            self.storage
                .save_ideas(project.id, store.ideas())
                .map_err(|e| storage_error(&e, origin))?;
        }
        tracing::debug!(project = %project.id, created = created.len(), "guided capture saved");
        Ok(created)
    }
}

fn idea_not_found(project: ProjectId, id: IdeaId, origin: &'static str) -> ThinktreeError {
    ThinktreeError::user("idea_not_found", format!("Idea {id} not found"), origin)
        .with_context("project", project.to_string())
        .with_hint("Use 'thinktree idea list' to see idea ids")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorCategory;
    use crate::core::view::{TagFilter, ViewBody, ViewMode};
    use crate::storage::{InMemoryStorage, Storage};
    use tempfile::TempDir;

    fn test_registry() -> (TempDir, Registry) {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig::with_dir(dir.path().to_path_buf());
        let registry = Registry::with_storage(Arc::new(InMemoryStorage::new()), config);
        (dir, registry)
    }

    fn added(registry: &Registry, text: &str) -> IdeaId {
        registry.add_idea(None, text).unwrap().idea.unwrap().id
    }

    #[test]
    fn default_project_is_created_on_first_use() {
        let (_dir, registry) = test_registry();
        let projects = registry.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, ProjectId(1));
        assert_eq!(projects[0].name, DEFAULT_PROJECT_NAME);
    }

    #[test]
    fn legacy_ideas_move_into_first_project() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = vec![Idea::new(IdeaId(42), "old #note", Utc::now())];
        let storage = Arc::new(InMemoryStorage::with_legacy(legacy.clone()));
        let registry = Registry::with_storage(
            storage.clone(),
            RegistryConfig::with_dir(dir.path().to_path_buf()),
        );

        let (project, ideas) = registry.ideas(None).unwrap();
        assert_eq!(project.id, ProjectId(1));
        assert_eq!(ideas, legacy);
        assert!(storage.load_legacy_ideas().unwrap().is_none());
    }

    #[test]
    fn create_rename_and_delete_projects() {
        let (_dir, registry) = test_registry();
        let project = registry.create_project("Side quest").unwrap();
        assert_eq!(project.id, ProjectId(2));

        let renamed = registry.rename_project("Side quest", " Main quest ").unwrap();
        assert_eq!(renamed.name, "Main quest");

        registry.add_idea(Some("2"), "scoped").unwrap();
        registry.delete_project("2").unwrap();
        assert_eq!(registry.list_projects().unwrap().len(), 1);
        assert!(registry.get_project(Some("2")).is_err());
    }

    #[test]
    fn deleting_only_project_is_refused() {
        let (_dir, registry) = test_registry();
        let err = registry.delete_project("1").unwrap_err();
        assert_eq!(err.category, ErrorCategory::Capacity);
        assert_eq!(err.code, "last_project");
        assert_eq!(registry.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn projects_keep_separate_ideas() {
        let (_dir, registry) = test_registry();
        registry.create_project("other").unwrap();
        registry.add_idea(None, "first #a").unwrap();
        registry.add_idea(Some("other"), "second #b").unwrap();

        assert_eq!(registry.tags(None).unwrap(), vec!["a"]);
        assert_eq!(registry.tags(Some("other")).unwrap(), vec!["b"]);
    }

    #[test]
    fn blank_idea_is_not_saved() {
        let (_dir, registry) = test_registry();
        let change = registry.add_idea(None, "   ").unwrap();
        assert_eq!(change.outcome, Mutation::Unchanged(NoopReason::EmptyText));
        assert!(change.idea.is_none());
        assert!(registry.ideas(None).unwrap().1.is_empty());
    }

    #[test]
    fn link_trunk_and_delete_flow() {
        let (_dir, registry) = test_registry();
        let parent = added(&registry, "Build a #widget");
        let child = added(&registry, "Test the #widget #qa");

        let change = registry.link_ideas(None, child, parent).unwrap();
        assert!(change.outcome.is_applied());
        assert_eq!(change.idea.unwrap().linked_to, Some(parent));

        registry.toggle_trunk(None, parent).unwrap();
        assert!(registry.get_idea(None, parent).unwrap().is_trunk);

        let removed = registry.delete_idea(None, parent).unwrap();
        assert_eq!(removed.idea.unwrap().id, parent);
        assert!(registry.get_idea(None, child).unwrap().linked_to.is_none());
    }

    #[test]
    fn self_link_is_reported_unchanged() {
        let (_dir, registry) = test_registry();
        let id = added(&registry, "loop");
        let change = registry.link_ideas(None, id, id).unwrap();
        assert_eq!(change.outcome, Mutation::Unchanged(NoopReason::SelfLink(id)));
    }

    #[test]
    fn unknown_idea_is_a_user_error() {
        let (_dir, registry) = test_registry();
        let err = registry.toggle_trunk(None, IdeaId(9)).unwrap_err();
        assert_eq!(err.category, ErrorCategory::User);
        assert_eq!(err.code, "idea_not_found");
    }

    #[test]
    fn view_renders_tree_of_project() {
        let (_dir, registry) = test_registry();
        let parent = added(&registry, "root #x");
        let child = added(&registry, "leaf #x");
        registry.link_ideas(None, child, parent).unwrap();

        let state = ViewState::new(ProjectId(1))
            .with_mode(ViewMode::Tree)
            .with_filter(TagFilter::Tag("x".into()));
        let view = registry.view(&state).unwrap();
        let ViewBody::Tree { forest } = view.body else {
            panic!("expected tree view");
        };
        assert_eq!(forest.trees.len(), 1);
        assert_eq!(forest.trees[0].nodes.len(), 2);

        let missing = ViewState::new(ProjectId(5));
        assert_eq!(
            registry.view(&missing).unwrap_err().code,
            "project_not_found"
        );
    }

    #[test]
    fn guided_capture_replaces_trunk() {
        let (_dir, registry) = test_registry();
        let old = added(&registry, "old core");
        registry.toggle_trunk(None, old).unwrap();

        let answers: Vec<String> = ["a spark", "", "makers", "", "", "the core"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let created = registry.guided(None, &answers).unwrap();

        assert_eq!(created.len(), 3);
        let trunk = created.last().unwrap();
        assert_eq!(trunk.text, "the core #core");
        assert!(trunk.is_trunk);
        assert!(!registry.get_idea(None, old).unwrap().is_trunk);
        assert_eq!(created[1].tags, vec!["audience"]);
    }

    #[test]
    fn guided_capture_requires_six_answers() {
        let (_dir, registry) = test_registry();
        let err = registry.guided(None, &["only".to_string()]).unwrap_err();
        assert_eq!(err.code, "guided_incomplete");
        assert!(registry.ideas(None).unwrap().1.is_empty());
    }

    #[test]
    fn file_backed_registry_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig::with_dir(dir.path().to_path_buf());
        {
            let registry = Registry::open_with_config(config.clone()).unwrap();
            registry.add_idea(None, "kept #yes").unwrap();
        }
        let registry = Registry::open_with_config(config).unwrap();
        assert_eq!(registry.tags(None).unwrap(), vec!["yes"]);
        assert!(dir.path().join("ideas").join("1.json").exists());
    }

    #[test]
    fn settings_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.yaml"), "preview_chars: 12\n").unwrap();
        let registry =
            Registry::open_with_config(RegistryConfig::with_dir(dir.path().to_path_buf())).unwrap();
        assert_eq!(registry.settings().preview_chars, 12);
    }
}
