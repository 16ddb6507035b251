//! Sync reconciler
//!
//! Merges server-pushed (or polled) documents into the profile store. The
//! relay is authoritative, so a changed document replaces the local one
//! wholesale; what this module protects is the local interaction state
//! around it: current profile, open editor and in-flight drag. Identical
//! documents are detected by fingerprint and cause no work at all.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::profile::ConfigDocument;
use crate::controller::{Controller, Revalidation};
use crate::render::RenderEngine;
use crate::store::{CurrentChange, ProfileStore};

pub type Fingerprint = [u8; 32];

/// SHA-256 of the canonical JSON form (object keys sorted)
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Fingerprint {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    Sha256::digest(&bytes).into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Unchanged,
    Applied {
        current: CurrentChange,
        invalidated: Revalidation,
        selector_rendered: bool,
        grid_rendered: bool,
    },
}

#[derive(Debug, Default)]
pub struct Reconciler {
    applied: u64,
    skipped: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(
        &mut self,
        incoming: ConfigDocument,
        store: &mut ProfileStore,
        controller: &mut Controller,
        render: &mut RenderEngine,
    ) -> ReconcileOutcome {
        if fingerprint(&incoming) == fingerprint(store.document()) {
            self.skipped += 1;
            debug!(skipped = self.skipped, "Incoming document unchanged");
            return ReconcileOutcome::Unchanged;
        }

        let current = store.replace_document(incoming);
        store.persist_local();
        let invalidated = controller.revalidate(store);

        let selector_rendered = render.refresh_selector(store.all_profiles());
        let grid_rendered = render.refresh_grid(store.current_profile(), controller.mode());

        self.applied += 1;
        info!(
            profiles = store.all_profiles().len(),
            current = store.current_id().unwrap_or("<none>"),
            editor_closed = invalidated.editor_closed,
            drag_cancelled = invalidated.drag_cancelled,
            grid_rendered = grid_rendered,
            "Applied remote document"
        );

        ReconcileOutcome::Applied {
            current,
            invalidated,
            selector_rendered,
            grid_rendered,
        }
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::{Action, Button, Profile};
    use crate::connection::testing::{RecordingUpstream, detached_manager};
    use crate::connection::LinkState;
    use crate::controller::{DragVia, Mode};
    use crate::store::tests::{loaded_store, sample_document};
    use std::time::{Duration, Instant};

    struct Pad {
        store: ProfileStore,
        controller: Controller,
        render: RenderEngine,
        reconciler: Reconciler,
    }

    fn pad() -> Pad {
        let store = loaded_store();
        let controller = Controller::new("BureauMSI", None);
        let mut render = RenderEngine::new();
        render.refresh_selector(store.all_profiles());
        render.refresh_grid(store.current_profile(), controller.mode());
        Pad {
            store,
            controller,
            render,
            reconciler: Reconciler::new(),
        }
    }

    impl Pad {
        fn push(&mut self, document: ConfigDocument) -> ReconcileOutcome {
            self.reconciler.reconcile(
                document,
                &mut self.store,
                &mut self.controller,
                &mut self.render,
            )
        }
    }

    #[test]
    fn test_fingerprint_is_key_order_independent() {
        let a: serde_json::Value = serde_json::from_str(r#"{"x":1,"y":[1,2]}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"y":[1,2],"x":1}"#).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_identical_document_triggers_no_render() {
        let mut pad = pad();
        let renders = pad.render.renders();

        assert_eq!(pad.push(sample_document()), ReconcileOutcome::Unchanged);
        assert_eq!(pad.render.renders(), renders);
        assert_eq!(pad.reconciler.skipped(), 1);
        assert_eq!(pad.reconciler.applied(), 0);
    }

    #[test]
    fn test_change_elsewhere_does_not_rerender_grid() {
        let mut pad = pad();
        let mut next = sample_document();
        next.profiles[1]
            .buttons
            .push(Button::new("Other", Action::default()));

        match pad.push(next) {
            ReconcileOutcome::Applied {
                current,
                selector_rendered,
                grid_rendered,
                ..
            } => {
                assert_eq!(current, CurrentChange::Kept);
                assert!(!selector_rendered);
                assert!(!grid_rendered);
            }
            other => panic!("expected applied, got {other:?}"),
        }
        assert_eq!(pad.store.profile("B").unwrap().buttons.len(), 1);
    }

    #[test]
    fn test_missing_current_profile_falls_back() {
        let mut pad = pad();
        assert!(pad.store.switch_profile("B"));

        let mut next = sample_document();
        next.profiles.retain(|p| p.id != "B");
        pad.push(next);
        assert_eq!(pad.store.current_id(), Some("A"));

        pad.push(ConfigDocument::default());
        assert_eq!(pad.store.current_id(), None);
        assert!(pad.render.grid().is_none());
    }

    #[test]
    fn test_stale_editor_is_invalidated() {
        let mut pad = pad();
        let upstream = RecordingUpstream::open();
        pad.controller.set_mode(Mode::Edit);
        pad.controller.tap(&pad.store, &upstream, &[], 2);
        assert!(pad.controller.editor().is_some());

        let mut next = sample_document();
        next.profiles[0].buttons.truncate(1);
        match pad.push(next) {
            ReconcileOutcome::Applied { invalidated, .. } => assert!(invalidated.editor_closed),
            other => panic!("expected applied, got {other:?}"),
        }
        assert!(pad.controller.editor().is_none());
    }

    #[test]
    fn test_editor_survives_when_index_still_resolves() {
        let mut pad = pad();
        let upstream = RecordingUpstream::open();
        pad.controller.set_mode(Mode::Edit);
        pad.controller.tap(&pad.store, &upstream, &[], 0);

        let mut next = sample_document();
        next.profiles[0].buttons[2].label = "changed remotely".into();
        pad.push(next);
        assert_eq!(pad.controller.editor().map(|s| s.button_index), Some(0));
    }

    #[test]
    fn test_drag_survives_close_and_unrelated_push() {
        let mut pad = pad();
        let (mut manager, harness) = detached_manager(Duration::from_secs(7));
        harness.open_socket();
        manager.poll(Instant::now());

        pad.controller.set_mode(Mode::Reorganize);
        assert!(pad.controller.begin_drag(&pad.store, 0, DragVia::Touch));
        pad.controller.hover(Some(2));

        harness.close_socket("reset");
        manager.poll(Instant::now());
        assert_ne!(manager.state(), LinkState::Open);

        let mut next = sample_document();
        next.profiles.push(Profile::new("C", "Gamma", 2));
        pad.push(next);

        assert_eq!(pad.store.current_id(), Some("A"));
        let drag = pad.controller.drag().unwrap();
        assert_eq!((drag.from, drag.hover), (0, Some(2)));

        let outcome = pad.controller.drop_on(&mut pad.store, &manager, 2);
        assert!(matches!(
            outcome,
            crate::controller::DropOutcome::Moved { from: 0, to: 2, .. }
        ));
        let labels: Vec<_> = pad.store.profile("A").unwrap().buttons.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["b1", "b2", "b0"]);
    }

    #[test]
    fn test_drag_cancelled_when_source_disappears() {
        let mut pad = pad();
        pad.controller.set_mode(Mode::Reorganize);
        assert!(pad.controller.begin_drag(&pad.store, 2, DragVia::Pointer));

        let mut next = sample_document();
        next.profiles[0].buttons.truncate(2);
        match pad.push(next) {
            ReconcileOutcome::Applied { invalidated, .. } => assert!(invalidated.drag_cancelled),
            other => panic!("expected applied, got {other:?}"),
        }
        assert!(pad.controller.drag().is_none());
    }
}
