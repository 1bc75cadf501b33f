//! Agent template store.
//!
//! Built-in templates are seeded first, then overlaid with the persisted
//! collection if one exists. Every mutation works on a copy of the state,
//! persists the copy, and only then commits it, so a failed write leaves
//! the store unchanged. The write lock is held across the whole cycle.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    create_builtin_templates, AgentTemplate, AgentTemplateType, CreateTemplateRequest,
    TemplateCollection, UpdateTemplateRequest,
};

#[derive(Debug, Clone, Default)]
struct StoreState {
    templates: Vec<AgentTemplate>,
    active: Vec<String>,
}

impl StoreState {
    fn seeded() -> Self {
        let templates = create_builtin_templates();
        let active = templates.iter().map(|t| t.id.clone()).collect();
        Self { templates, active }
    }

    fn get(&self, id: &str) -> Option<&AgentTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut AgentTemplate> {
        self.templates.iter_mut().find(|t| t.id == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn upsert(&mut self, template: AgentTemplate) {
        match self.get_mut(&template.id) {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    /// Make the `is_active` flags agree with the active list.
    fn sync_flags(&mut self) {
        for t in &mut self.templates {
            t.is_active = self.active.contains(&t.id);
        }
    }

    fn activate(&mut self, id: &str) {
        if !self.active.iter().any(|a| a == id) {
            self.active.push(id.to_string());
        }
    }

    fn deactivate(&mut self, id: &str) {
        self.active.retain(|a| a != id);
    }

    fn fresh_id(&self, template_type: AgentTemplateType) -> String {
        let base = format!("{}_{}", template_type, Utc::now().timestamp_millis());
        let mut candidate = base.clone();
        let mut n = 1;
        while self.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        candidate
    }

    fn check_dependencies(&self, id: Option<&str>, deps: &[String]) -> DomainResult<()> {
        for dep in deps {
            if Some(dep.as_str()) == id {
                return Err(DomainError::ValidationFailed(format!(
                    "Template {dep} cannot depend on itself"
                )));
            }
            if !self.contains(dep) {
                return Err(DomainError::ValidationFailed(format!(
                    "Unknown dependency: {dep}"
                )));
            }
        }
        Ok(())
    }

    fn collection(&self) -> TemplateCollection {
        TemplateCollection {
            templates: self.templates.clone(),
            active_templates: self.active.clone(),
        }
    }
}

/// Store of agent templates, optionally persisted to a JSON file.
pub struct TemplateStore {
    state: RwLock<StoreState>,
    path: Option<PathBuf>,
}

impl TemplateStore {
    /// In-memory store holding only the built-ins.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::seeded()),
            path: None,
        }
    }

    /// In-memory store with additional templates, all active.
    pub fn with_templates(templates: impl IntoIterator<Item = AgentTemplate>) -> Self {
        let mut state = StoreState::seeded();
        for template in templates {
            let id = template.id.clone();
            let active = template.is_active;
            state.upsert(template);
            if active {
                state.activate(&id);
            }
        }
        Self {
            state: RwLock::new(state),
            path: None,
        }
    }

    /// Seed built-ins and overlay the collection at `path` if it exists.
    ///
    /// An unreadable or malformed file is logged and ignored.
    pub async fn load(path: impl Into<PathBuf>) -> DomainResult<Self> {
        let path = path.into();
        let mut state = StoreState::seeded();

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            match read_collection(&path).await {
                Ok(collection) => {
                    let count = collection.templates.len();
                    for template in collection.templates {
                        state.upsert(template);
                    }
                    let active: Vec<String> = collection
                        .active_templates
                        .into_iter()
                        .filter(|id| state.contains(id))
                        .collect();
                    state.active = active;
                    state.sync_flags();
                    tracing::info!(path = %path.display(), templates = count, "loaded agent templates");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable template file");
                }
            }
        }

        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    pub async fn collection(&self) -> TemplateCollection {
        self.state.read().await.collection()
    }

    pub async fn list(&self) -> Vec<AgentTemplate> {
        self.state.read().await.templates.clone()
    }

    /// Active templates in activation order.
    pub async fn active(&self) -> Vec<AgentTemplate> {
        let state = self.state.read().await;
        state
            .active
            .iter()
            .filter_map(|id| state.get(id).cloned())
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<AgentTemplate> {
        self.state.read().await.get(id).cloned()
    }

    /// Resolve several ids at once, failing on the first unknown one.
    pub async fn get_many(&self, ids: &[String]) -> DomainResult<Vec<AgentTemplate>> {
        let state = self.state.read().await;
        ids.iter()
            .map(|id| {
                state
                    .get(id)
                    .cloned()
                    .ok_or_else(|| DomainError::TemplateNotFound(id.clone()))
            })
            .collect()
    }

    /// First active template of the given type.
    pub async fn get_by_type(&self, template_type: AgentTemplateType) -> Option<AgentTemplate> {
        let state = self.state.read().await;
        state
            .active
            .iter()
            .filter_map(|id| state.get(id))
            .find(|t| t.template_type == template_type)
            .cloned()
    }

    pub async fn create(&self, request: CreateTemplateRequest) -> DomainResult<AgentTemplate> {
        if request.name.trim().is_empty() {
            return Err(DomainError::ValidationFailed("Template name cannot be empty".to_string()));
        }
        if request.prompt.trim().is_empty() {
            return Err(DomainError::ValidationFailed("Template prompt cannot be empty".to_string()));
        }

        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        next.check_dependencies(None, &request.depends_on)?;

        let id = next.fresh_id(request.template_type);
        let mut template = AgentTemplate::new(&id, request.name, request.template_type)
            .with_description(request.description)
            .with_prompt(request.prompt)
            .with_dependencies(request.depends_on)
            .custom();
        if let Some(color) = request.color {
            template.color = color;
        }
        if let Some(icon) = request.icon {
            template.icon = icon;
        }

        next.templates.push(template.clone());
        next.activate(&id);
        self.commit(&mut guard, next).await?;

        tracing::info!(template_id = %id, "created agent template");
        Ok(template)
    }

    pub async fn update(&self, id: &str, request: UpdateTemplateRequest) -> DomainResult<AgentTemplate> {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();

        if let Some(deps) = &request.depends_on {
            next.check_dependencies(Some(id), deps)?;
        }

        let template = next
            .get_mut(id)
            .ok_or_else(|| DomainError::TemplateNotFound(id.to_string()))?;

        if let Some(name) = request.name {
            template.name = name;
        }
        if let Some(description) = request.description {
            template.description = description;
        }
        if let Some(prompt) = request.prompt {
            template.prompt = prompt;
        }
        if let Some(color) = request.color {
            template.color = color;
        }
        if let Some(icon) = request.icon {
            template.icon = icon;
        }
        if let Some(deps) = request.depends_on {
            template.depends_on = deps;
        }
        template.updated_at = Utc::now();

        match request.is_active {
            Some(true) => next.activate(id),
            Some(false) => next.deactivate(id),
            None => {}
        }
        next.sync_flags();

        let updated = next
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::TemplateNotFound(id.to_string()))?;
        self.commit(&mut guard, next).await?;
        Ok(updated)
    }

    /// Delete a custom template. Built-ins are protected.
    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        let mut guard = self.state.write().await;
        let template = guard
            .get(id)
            .ok_or_else(|| DomainError::TemplateNotFound(id.to_string()))?;
        if !template.is_custom {
            return Err(DomainError::BuiltinTemplate(id.to_string()));
        }

        let mut next = guard.clone();
        next.templates.retain(|t| t.id != id);
        next.deactivate(id);
        self.commit(&mut guard, next).await?;

        tracing::info!(template_id = %id, "deleted agent template");
        Ok(())
    }

    /// Replace the active set. Returns `false` and changes nothing if any
    /// id is unknown.
    pub async fn set_active(&self, ids: &[String]) -> DomainResult<bool> {
        let mut guard = self.state.write().await;
        if let Some(unknown) = ids.iter().find(|id| !guard.contains(id)) {
            tracing::warn!(template_id = %unknown, "cannot activate unknown template");
            return Ok(false);
        }

        let mut next = guard.clone();
        next.active.clear();
        for id in ids {
            next.activate(id);
        }
        next.sync_flags();
        self.commit(&mut guard, next).await?;
        Ok(true)
    }

    /// Copy a template as a new active custom template.
    pub async fn duplicate(&self, id: &str, new_name: Option<String>) -> DomainResult<AgentTemplate> {
        let mut guard = self.state.write().await;
        let original = guard
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::TemplateNotFound(id.to_string()))?;

        let mut next = guard.clone();
        let new_id = next.fresh_id(original.template_type);
        let now = Utc::now();
        let copy = AgentTemplate {
            id: new_id.clone(),
            name: new_name.unwrap_or_else(|| format!("{} (Copy)", original.name)),
            is_active: true,
            is_custom: true,
            created_at: now,
            updated_at: now,
            ..original
        };

        next.templates.push(copy.clone());
        next.activate(&new_id);
        self.commit(&mut guard, next).await?;
        Ok(copy)
    }

    async fn commit(&self, guard: &mut StoreState, next: StoreState) -> DomainResult<()> {
        if let Some(path) = &self.path {
            write_collection(path, &next.collection()).await?;
        }
        *guard = next;
        Ok(())
    }
}

async fn read_collection(path: &Path) -> DomainResult<TemplateCollection> {
    let raw = tokio::fs::read_to_string(path).await?;
    let raw = raw.trim_start_matches('\u{feff}');
    Ok(serde_json::from_str(raw)?)
}

async fn write_collection(path: &Path, collection: &TemplateCollection) -> DomainResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(collection)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(name: &str) -> CreateTemplateRequest {
        CreateTemplateRequest {
            name: name.to_string(),
            template_type: AgentTemplateType::Developer,
            description: "custom".to_string(),
            prompt: "You are a reviewer.".to_string(),
            color: None,
            icon: Some("🦀".to_string()),
            depends_on: vec![],
        }
    }

    #[tokio::test]
    async fn test_builtins_seeded_and_active() {
        let store = TemplateStore::in_memory();
        let collection = store.collection().await;
        assert_eq!(collection.templates.len(), AgentTemplateType::ALL.len());
        assert_eq!(collection.active_templates.len(), collection.templates.len());
    }

    #[tokio::test]
    async fn test_create_is_custom_and_active() {
        let store = TemplateStore::in_memory();
        let created = store.create(create_request("Reviewer")).await.unwrap();

        assert!(created.is_custom);
        assert!(created.is_active);
        assert!(created.id.starts_with("developer_"));
        assert_eq!(created.icon, "🦀");
        assert!(store.collection().await.active_templates.contains(&created.id));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_dependency() {
        let store = TemplateStore::in_memory();
        let mut request = create_request("Reviewer");
        request.depends_on = vec!["nope".to_string()];
        assert!(matches!(
            store.create(request).await,
            Err(DomainError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_update_deactivates() {
        let store = TemplateStore::in_memory();
        let updated = store
            .update(
                "coach_default",
                UpdateTemplateRequest {
                    is_active: Some(false),
                    name: Some("Mentor".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Mentor");
        assert!(!updated.is_active);
        assert!(!store
            .collection()
            .await
            .active_templates
            .contains(&"coach_default".to_string()));
    }

    #[tokio::test]
    async fn test_update_rejects_self_dependency() {
        let store = TemplateStore::in_memory();
        let result = store
            .update(
                "coach_default",
                UpdateTemplateRequest {
                    depends_on: Some(vec!["coach_default".to_string()]),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_builtin_cannot_be_deleted() {
        let store = TemplateStore::in_memory();
        assert!(matches!(
            store.delete("developer_default").await,
            Err(DomainError::BuiltinTemplate(_))
        ));
        assert!(store.get("developer_default").await.is_some());
    }

    #[tokio::test]
    async fn test_delete_custom() {
        let store = TemplateStore::in_memory();
        let created = store.create(create_request("Temp")).await.unwrap();
        store.delete(&created.id).await.unwrap();
        assert!(store.get(&created.id).await.is_none());
        assert!(matches!(
            store.delete(&created.id).await,
            Err(DomainError::TemplateNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_active_rejects_unknown_ids() {
        let store = TemplateStore::in_memory();
        let ok = store
            .set_active(&["developer_default".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(store.active().await.len(), AgentTemplateType::ALL.len());
    }

    #[tokio::test]
    async fn test_set_active_replaces_set() {
        let store = TemplateStore::in_memory();
        assert!(store.set_active(&["developer_default".to_string()]).await.unwrap());

        let active = store.active().await;
        assert_eq!(active.len(), 1);
        assert!(store.get_by_type(AgentTemplateType::Coach).await.is_none());
        assert!(!store.get("coach_default").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_get_by_type_follows_active_order() {
        let store = TemplateStore::in_memory();
        let custom = store.create(create_request("Second Dev")).await.unwrap();
        store
            .set_active(&[custom.id.clone(), "developer_default".to_string()])
            .await
            .unwrap();

        let found = store.get_by_type(AgentTemplateType::Developer).await.unwrap();
        assert_eq!(found.id, custom.id);
    }

    #[tokio::test]
    async fn test_duplicate() {
        let store = TemplateStore::in_memory();
        let copy = store.duplicate("critique_default", None).await.unwrap();
        assert_eq!(copy.name, "Critique (Copy)");
        assert!(copy.is_custom);
        assert_ne!(copy.id, "critique_default");
        assert_eq!(copy.template_type, AgentTemplateType::Critique);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("templates.json");

        let store = TemplateStore::load(&path).await.unwrap();
        let created = store.create(create_request("Persisted")).await.unwrap();
        store
            .set_active(&[created.id.clone(), "ui_designer_default".to_string()])
            .await
            .unwrap();

        let reloaded = TemplateStore::load(&path).await.unwrap();
        let collection = reloaded.collection().await;
        assert_eq!(
            collection.active_templates,
            vec![created.id.clone(), "ui_designer_default".to_string()]
        );
        assert_eq!(reloaded.get(&created.id).await.unwrap().name, "Persisted");
        assert!(!reloaded.get("coach_default").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = TemplateStore::load(&path).await.unwrap();
        assert_eq!(store.list().await.len(), AgentTemplateType::ALL.len());
    }
}
