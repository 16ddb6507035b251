//! Profile store
//!
//! Owns the configuration document and the current-profile pointer. All
//! button changes go through [`ProfileStore::mutate_buttons`]; the UI thread is
//! the only writer.

pub mod fallback;
pub mod mutation;
pub mod storage;

use tracing::{debug, info, warn};

pub use fallback::FallbackSource;
pub use mutation::ButtonMutation;
pub use storage::{FileStore, KeyValueStore};

use crate::config::profile::{Button, ConfigDocument, Profile};
use crate::connection::{Outbound, Upstream};
use crate::constants::storage::DOCUMENT_KEY;
use crate::error::{LoadError, MutationError, SendFailure};

/// Where the loaded document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Local,
    Fallback,
}

/// Effect of a document swap on the current-profile pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentChange {
    Kept,
    /// Previous profile vanished (or none was selected); now the first one, or none
    FellBack(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamSave {
    Sent,
    LocalOnly(SendFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub persisted: bool,
    pub upstream: UpstreamSave,
}

impl SaveOutcome {
    /// Short notice for the user, if the save was not a clean round trip
    pub fn notice(&self) -> Option<&'static str> {
        match (&self.upstream, self.persisted) {
            (UpstreamSave::Sent, true) => None,
            (UpstreamSave::Sent, false) => Some("Sent to relay, local cache not updated"),
            (UpstreamSave::LocalOnly(_), true) => Some("Saved locally (offline)"),
            (UpstreamSave::LocalOnly(_), false) => Some("Save failed"),
        }
    }
}

pub struct ProfileStore {
    document: ConfigDocument,
    current: Option<String>,
    storage: Box<dyn KeyValueStore>,
    fallback: FallbackSource,
}

impl ProfileStore {
    pub fn new(storage: Box<dyn KeyValueStore>, fallback: FallbackSource) -> Self {
        Self {
            document: ConfigDocument::default(),
            current: None,
            storage,
            fallback,
        }
    }

    /// Local snapshot first, then the fallback source
    pub async fn load(&mut self) -> Result<LoadSource, LoadError> {
        let source = match self.read_local() {
            Some(document) => {
                self.document = document;
                LoadSource::Local
            }
            None => {
                self.document = self.fallback.fetch().await?;
                LoadSource::Fallback
            }
        };
        self.ensure_selection();

        info!(
            source = ?source,
            profiles = self.document.profiles.len(),
            current = self.current.as_deref().unwrap_or("<none>"),
            "Loaded configuration"
        );
        Ok(source)
    }

    fn read_local(&self) -> Option<ConfigDocument> {
        match self.storage.get(DOCUMENT_KEY) {
            Ok(Some(text)) => match ConfigDocument::from_json(&text) {
                Ok(document) => Some(document),
                Err(err) => {
                    warn!(error = %err, "Local snapshot is invalid, ignoring it");
                    None
                }
            },
            Ok(None) => {
                debug!("No local snapshot");
                None
            }
            Err(err) => {
                warn!(error = %err, "Failed to read local snapshot");
                None
            }
        }
    }

    fn ensure_selection(&mut self) -> CurrentChange {
        if let Some(id) = &self.current {
            if self.document.contains(id) {
                return CurrentChange::Kept;
            }
        }
        let fallback = self.document.profiles.first().map(|p| p.id.clone());
        self.current = fallback.clone();
        CurrentChange::FellBack(fallback)
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn all_profiles(&self) -> &[Profile] {
        &self.document.profiles
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_profile(&self) -> Option<&Profile> {
        self.current.as_deref().and_then(|id| self.document.profile(id))
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.document.profile(id)
    }

    pub fn button(&self, profile_id: &str, index: usize) -> Option<&Button> {
        self.profile(profile_id).and_then(|p| p.buttons.get(index))
    }

    /// Unknown ids leave the selection unchanged
    pub fn switch_profile(&mut self, id: &str) -> bool {
        if !self.document.contains(id) {
            debug!(profile = %id, "Ignoring switch to unknown profile");
            return false;
        }
        if self.current.as_deref() != Some(id) {
            info!(profile = %id, "Switched profile");
            self.current = Some(id.to_string());
        }
        true
    }

    pub fn mutate_buttons<R>(
        &mut self,
        profile_id: &str,
        f: impl FnOnce(&mut Vec<Button>) -> R,
    ) -> Result<R, MutationError> {
        let profile = self
            .document
            .profile_mut(profile_id)
            .ok_or_else(|| MutationError::UnknownProfile(profile_id.to_string()))?;
        Ok(f(&mut profile.buttons))
    }

    pub fn apply(&mut self, profile_id: &str, mutation: ButtonMutation) -> Result<(), MutationError> {
        debug!(profile = %profile_id, mutation = mutation_name(&mutation), "Applying button mutation");
        self.mutate_buttons(profile_id, |buttons| mutation.apply(buttons))?
    }

    /// Append a profile with a fresh id derived from `label`; returns the id
    pub fn add_profile(&mut self, label: &str, cols: u32) -> String {
        let id = self.document.unique_profile_id(label);
        self.document
            .profiles
            .push(Profile::new(id.clone(), label.trim(), cols));
        info!(profile = %id, "Added profile");
        id
    }

    /// Best-effort write of the whole document to local storage
    pub fn persist_local(&mut self) -> bool {
        let json = match self.document.to_json() {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "Failed to serialize document");
                return false;
            }
        };
        match self.storage.set(DOCUMENT_KEY, &json) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Failed to persist document locally");
                false
            }
        }
    }

    pub fn request_upstream_save(&self, upstream: &dyn Upstream) -> UpstreamSave {
        match upstream.push(&Outbound::save_config(self.document.clone())) {
            Ok(()) => UpstreamSave::Sent,
            Err(failure) => {
                debug!(reason = %failure, "Save kept local only");
                UpstreamSave::LocalOnly(failure)
            }
        }
    }

    /// Local persist plus upstream request, run after every local edit
    pub fn save(&mut self, upstream: &dyn Upstream) -> SaveOutcome {
        SaveOutcome {
            persisted: self.persist_local(),
            upstream: self.request_upstream_save(upstream),
        }
    }

    /// Swap in a new document wholesale and re-resolve the current profile
    pub fn replace_document(&mut self, document: ConfigDocument) -> CurrentChange {
        self.document = document;
        self.ensure_selection()
    }

    /// Drop the local snapshot so the next load uses the fallback source
    pub fn reset_cache(&mut self) -> bool {
        match self.storage.remove(DOCUMENT_KEY) {
            Ok(()) => {
                info!("Cleared local snapshot");
                true
            }
            Err(err) => {
                warn!(error = %err, "Failed to clear local snapshot");
                false
            }
        }
    }

    /// Source polled by the optional auto-sync refetch
    pub fn fallback_source(&self) -> &FallbackSource {
        &self.fallback
    }
}

fn mutation_name(mutation: &ButtonMutation) -> &'static str {
    match mutation {
        ButtonMutation::Push(_) => "push",
        ButtonMutation::Remove(_) => "remove",
        ButtonMutation::Replace { .. } => "replace",
        ButtonMutation::Move { .. } => "move",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::storage::memory::MemoryStore;
    use super::*;
    use crate::config::profile::{Action, ActionKind};
    use crate::connection::testing::RecordingUpstream;

    pub(crate) fn sample_document() -> ConfigDocument {
        let mut a = Profile::new("A", "Alpha", 3);
        a.buttons = vec![
            Button::new("b0", Action::new(ActionKind::Keys, "CTRL+C")),
            Button::new("b1", Action::new(ActionKind::Run, "notepad.exe")),
            Button::new("b2", Action::new(ActionKind::Shell, "shutdown /s")),
        ];
        let b = Profile::new("B", "Beta", 4);
        ConfigDocument {
            profiles: vec![a, b],
            ..Default::default()
        }
    }

    pub(crate) fn loaded_store() -> ProfileStore {
        let mut store = ProfileStore::new(Box::<MemoryStore>::default(), FallbackSource::None);
        store.replace_document(sample_document());
        store
    }

    fn store_with_snapshot(text: &str, fallback: FallbackSource) -> ProfileStore {
        let mut memory = MemoryStore::default();
        memory.entries.insert(DOCUMENT_KEY.to_string(), text.to_string());
        ProfileStore::new(Box::new(memory), fallback)
    }

    #[tokio::test]
    async fn test_load_prefers_local_snapshot() {
        let text = sample_document().to_json().unwrap();
        let mut store = store_with_snapshot(&text, FallbackSource::None);

        assert_eq!(store.load().await.unwrap(), LoadSource::Local);
        assert_eq!(store.current_id(), Some("A"));
        assert_eq!(store.all_profiles().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_snapshot_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, r#"{"profiles":[{"id":"main"}]}"#).unwrap();

        let mut store = store_with_snapshot("{broken", FallbackSource::File(path));
        assert_eq!(store.load().await.unwrap(), LoadSource::Fallback);
        assert_eq!(store.current_id(), Some("main"));
    }

    #[tokio::test]
    async fn test_load_without_any_source_fails() {
        let mut store = ProfileStore::new(Box::<MemoryStore>::default(), FallbackSource::None);
        assert!(matches!(store.load().await, Err(LoadError::NoSource)));
        assert!(store.current_profile().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("storage");

        let mut store = ProfileStore::new(Box::new(FileStore::new(&storage)), FallbackSource::None);
        let mut document = sample_document();
        document.profiles[0].buttons[1].image = Some("data:image/png;base64,AAAA".into());
        document.extra.insert("version".into(), serde_json::json!(2));
        store.replace_document(document.clone());
        assert!(store.persist_local());

        let mut reloaded = ProfileStore::new(Box::new(FileStore::new(&storage)), FallbackSource::None);
        assert_eq!(reloaded.load().await.unwrap(), LoadSource::Local);
        assert_eq!(reloaded.document(), &document);
    }

    #[test]
    fn test_switch_to_unknown_profile_is_noop() {
        let mut store = loaded_store();
        assert!(!store.switch_profile("missing"));
        assert_eq!(store.current_id(), Some("A"));
        assert!(store.switch_profile("B"));
        assert_eq!(store.current_profile().map(|p| p.label.as_str()), Some("Beta"));
    }

    #[test]
    fn test_mutations_go_through_profile() {
        let mut store = loaded_store();
        store
            .apply("A", ButtonMutation::Move { from: 0, to: 2 })
            .unwrap();
        let labels: Vec<_> = store.profile("A").unwrap().buttons.iter().map(|b| b.label.clone()).collect();
        assert_eq!(labels, vec!["b1", "b2", "b0"]);

        assert_eq!(
            store.apply("Z", ButtonMutation::Remove(0)),
            Err(MutationError::UnknownProfile("Z".into()))
        );
        assert_eq!(
            store.apply("B", ButtonMutation::Remove(0)),
            Err(MutationError::OutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_add_profile_keeps_ids_unique() {
        let mut store = loaded_store();
        let id = store.add_profile("A", 5);
        assert_eq!(id, "a");
        let again = store.add_profile("a", 5);
        assert_eq!(again, "a-2");
        assert!(store.document().validate().is_ok());
    }

    #[test]
    fn test_save_reports_local_only_when_offline() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::default();

        let outcome = store.save(&upstream);
        assert!(outcome.persisted);
        assert_eq!(outcome.upstream, UpstreamSave::LocalOnly(SendFailure::NotConnected));
        assert_eq!(outcome.notice(), Some("Saved locally (offline)"));

        upstream.open.set(true);
        let outcome = store.save(&upstream);
        assert_eq!(outcome.upstream, UpstreamSave::Sent);
        assert_eq!(outcome.notice(), None);
        assert!(matches!(
            upstream.sent.borrow().as_slice(),
            [Outbound::SaveConfig { config }] if config == store.document()
        ));
    }

    #[test]
    fn test_persist_failure_is_reported_not_raised() {
        let memory = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let mut store = ProfileStore::new(Box::new(memory), FallbackSource::None);
        store.replace_document(sample_document());
        assert!(!store.persist_local());
    }

    #[test]
    fn test_replace_document_re_resolves_current() {
        let mut store = loaded_store();
        store.switch_profile("B");

        let mut next = sample_document();
        next.profiles[1].label = "Beta 2".into();
        assert_eq!(store.replace_document(next), CurrentChange::Kept);
        assert_eq!(store.current_id(), Some("B"));

        let mut next = sample_document();
        next.profiles.remove(1);
        assert_eq!(
            store.replace_document(next),
            CurrentChange::FellBack(Some("A".into()))
        );

        assert_eq!(
            store.replace_document(ConfigDocument::default()),
            CurrentChange::FellBack(None)
        );
        assert!(store.current_profile().is_none());
    }

    #[test]
    fn test_reset_cache_removes_snapshot() {
        let mut store = loaded_store();
        assert!(store.persist_local());
        assert!(store.reset_cache());
        assert!(store.read_local().is_none());
    }
}
