//! Interaction and edit controller
//!
//! Mode machine (Normal / Edit / Reorganize), command dispatch, the button
//! editor lifecycle and drag-reorder. Both reorder input paths (index-based
//! pointer drops and coordinate-based touch gestures) end in [`Controller::reorder`].

pub mod drag;
pub mod editor;
pub mod keys;

use egui::Pos2;
use serde::Serialize;
use tracing::{debug, info};

pub use drag::{DragState, DragVia};
pub use editor::EditingSession;
pub use keys::KeyChord;

use crate::config::profile::Button;
use crate::connection::protocol::CommandFrame;
use crate::connection::{Outbound, Upstream, WireCommand};
use crate::error::{MutationError, SendFailure};
use crate::render::GridGeometry;
use crate::store::{ButtonMutation, ProfileStore, SaveOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    #[default]
    Normal,
    Edit,
    Reorganize,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "Normal",
            Mode::Edit => "Edit",
            Mode::Reorganize => "Reorganize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    Sent { target: String, id: String },
    /// Noop action, nothing sent
    NoAction,
    NotSent(SendFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    Executed(ExecuteOutcome),
    EditorOpened,
    /// Taps do nothing while reorganizing
    ReorganizeHint,
    /// No button at that index in the current profile
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Moved {
        from: usize,
        to: usize,
        save: SaveOutcome,
    },
    /// Dropped on its own cell or outside the grid
    Unchanged,
    NoDrag,
    Failed(MutationError),
}

/// What a document swap invalidated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revalidation {
    pub editor_closed: bool,
    pub drag_cancelled: bool,
}

pub struct Controller {
    mode: Mode,
    editor: Option<EditingSession>,
    drag: Option<DragState>,
    default_host: String,
    target_override: Option<String>,
}

impl Controller {
    pub fn new(default_host: impl Into<String>, target_override: Option<String>) -> Self {
        Self {
            mode: Mode::Normal,
            editor: None,
            drag: None,
            default_host: default_host.into(),
            target_override,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Enter `mode`, or return to Normal if it is already active
    pub fn toggle(&mut self, mode: Mode) -> Mode {
        let next = if self.mode == mode { Mode::Normal } else { mode };
        self.set_mode(next);
        next
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        if self.mode == Mode::Edit {
            self.editor = None;
        }
        if self.mode == Mode::Reorganize {
            self.drag = None;
        }
        info!(from = self.mode.label(), to = mode.label(), "Mode changed");
        self.mode = mode;
    }

    /// Explicit override, else the single online host, else the default host
    pub fn resolve_target(&self, online_hosts: &[String]) -> String {
        if let Some(host) = &self.target_override {
            return host.clone();
        }
        match online_hosts {
            [only] => only.clone(),
            _ => self.default_host.clone(),
        }
    }

    pub fn tap(
        &mut self,
        store: &ProfileStore,
        upstream: &dyn Upstream,
        online_hosts: &[String],
        index: usize,
    ) -> TapOutcome {
        let Some(profile_id) = store.current_id().map(str::to_string) else {
            return TapOutcome::Ignored;
        };
        let Some(button) = store.button(&profile_id, index) else {
            return TapOutcome::Ignored;
        };

        match self.mode {
            Mode::Normal => {
                TapOutcome::Executed(self.execute_action(button, upstream, online_hosts))
            }
            Mode::Edit => {
                self.editor = Some(EditingSession::new(profile_id, index, button));
                TapOutcome::EditorOpened
            }
            Mode::Reorganize => TapOutcome::ReorganizeHint,
        }
    }

    pub fn execute_action(
        &self,
        button: &Button,
        upstream: &dyn Upstream,
        online_hosts: &[String],
    ) -> ExecuteOutcome {
        let Some(command) = WireCommand::from_action(&button.action) else {
            debug!(label = %button.label, "Noop action, nothing sent");
            return ExecuteOutcome::NoAction;
        };

        let target = self.resolve_target(online_hosts);
        let frame = CommandFrame::new(target.clone(), command);
        let id = frame.id.clone();
        match upstream.push(&Outbound::Cmd(frame)) {
            Ok(()) => {
                info!(label = %button.label, target = %target, id = %id, "Command sent");
                ExecuteOutcome::Sent { target, id }
            }
            Err(failure) => {
                debug!(label = %button.label, reason = %failure, "Command not sent");
                ExecuteOutcome::NotSent(failure)
            }
        }
    }

    // --- Editor ---

    pub fn editor(&self) -> Option<&EditingSession> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditingSession> {
        self.editor.as_mut()
    }

    pub fn open_editor(&mut self, store: &ProfileStore, profile_id: &str, index: usize) -> bool {
        match store.button(profile_id, index) {
            Some(button) => {
                self.editor = Some(EditingSession::new(profile_id, index, button));
                true
            }
            None => false,
        }
    }

    /// Append a placeholder to the current profile, save, and edit it
    pub fn add_button(
        &mut self,
        store: &mut ProfileStore,
        upstream: &dyn Upstream,
    ) -> Result<SaveOutcome, MutationError> {
        let profile_id = store
            .current_id()
            .map(str::to_string)
            .ok_or_else(|| MutationError::UnknownProfile(String::new()))?;
        store.apply(&profile_id, ButtonMutation::Push(Button::placeholder()))?;
        let index = store.mutate_buttons(&profile_id, |buttons| buttons.len() - 1)?;
        let outcome = store.save(upstream);
        self.open_editor(store, &profile_id, index);
        Ok(outcome)
    }

    /// Replace the edited button with the draft and close the editor
    pub fn save_editor(
        &mut self,
        store: &mut ProfileStore,
        upstream: &dyn Upstream,
    ) -> Option<Result<SaveOutcome, MutationError>> {
        let session = self.editor.take()?;
        Some(save_session(store, upstream, &session))
    }

    pub fn delete_editor_button(
        &mut self,
        store: &mut ProfileStore,
        upstream: &dyn Upstream,
    ) -> Option<Result<SaveOutcome, MutationError>> {
        let session = self.editor.take()?;
        let result = store
            .apply(&session.profile_id, ButtonMutation::Remove(session.button_index))
            .map(|()| store.save(upstream));
        Some(result)
    }

    pub fn cancel_editor(&mut self) {
        self.editor = None;
    }

    // --- Reorder ---

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    /// Start a gesture on `index` of the current profile (Reorganize mode only)
    pub fn begin_drag(&mut self, store: &ProfileStore, index: usize, via: DragVia) -> bool {
        if self.mode != Mode::Reorganize {
            return false;
        }
        let Some(profile_id) = store.current_id() else {
            return false;
        };
        if store.button(profile_id, index).is_none() {
            return false;
        }
        debug!(profile = %profile_id, from = index, "Drag started");
        self.drag = Some(DragState::new(profile_id, index, via));
        true
    }

    pub fn hover(&mut self, index: Option<usize>) {
        if let Some(drag) = &mut self.drag {
            drag.hover = index;
        }
    }

    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            debug!("Drag cancelled");
        }
    }

    /// Pointer path: the drop target index is known
    pub fn drop_on(
        &mut self,
        store: &mut ProfileStore,
        upstream: &dyn Upstream,
        to: usize,
    ) -> DropOutcome {
        let Some(drag) = self.drag.take() else {
            return DropOutcome::NoDrag;
        };
        self.reorder(store, upstream, &drag.profile_id, drag.from, to)
    }

    /// Touch path: start at a screen point
    pub fn touch_start(&mut self, store: &ProfileStore, geometry: &GridGeometry, point: Pos2) -> bool {
        match geometry.index_at(point) {
            Some(index) => self.begin_drag(store, index, DragVia::Touch),
            None => false,
        }
    }

    pub fn touch_move(&mut self, geometry: &GridGeometry, point: Pos2) {
        self.hover(geometry.index_at(point));
    }

    pub fn touch_end(
        &mut self,
        store: &mut ProfileStore,
        upstream: &dyn Upstream,
        geometry: &GridGeometry,
        point: Pos2,
    ) -> DropOutcome {
        let Some(drag) = self.drag.take() else {
            return DropOutcome::NoDrag;
        };
        match geometry.index_at(point) {
            Some(to) => self.reorder(store, upstream, &drag.profile_id, drag.from, to),
            None => DropOutcome::Unchanged,
        }
    }

    /// Insertion reorder shared by both input paths
    pub fn reorder(
        &mut self,
        store: &mut ProfileStore,
        upstream: &dyn Upstream,
        profile_id: &str,
        from: usize,
        to: usize,
    ) -> DropOutcome {
        if from == to {
            return DropOutcome::Unchanged;
        }
        match store.apply(profile_id, ButtonMutation::Move { from, to }) {
            Ok(()) => {
                info!(profile = %profile_id, from = from, to = to, "Buttons reordered");
                DropOutcome::Moved {
                    from,
                    to,
                    save: store.save(upstream),
                }
            }
            Err(err) => DropOutcome::Failed(err),
        }
    }

    /// Close the editor or cancel the drag if the new document no longer has their target
    pub fn revalidate(&mut self, store: &ProfileStore) -> Revalidation {
        let mut result = Revalidation::default();

        if let Some(session) = &self.editor {
            if store.button(&session.profile_id, session.button_index).is_none() {
                info!(
                    profile = %session.profile_id,
                    index = session.button_index,
                    "Edited button no longer exists, closing editor"
                );
                self.editor = None;
                result.editor_closed = true;
            }
        }

        if let Some(drag) = &self.drag {
            let still_current = store.current_id() == Some(drag.profile_id.as_str());
            let source_exists = store.button(&drag.profile_id, drag.from).is_some();
            if !still_current || !source_exists {
                info!(profile = %drag.profile_id, from = drag.from, "Drag source gone, cancelling drag");
                self.drag = None;
                result.drag_cancelled = true;
            } else if let Some(hover) = drag.hover {
                let len = store.profile(&drag.profile_id).map_or(0, |p| p.buttons.len());
                if hover >= len {
                    self.hover(None);
                }
            }
        }

        result
    }
}

fn save_session(
    store: &mut ProfileStore,
    upstream: &dyn Upstream,
    session: &EditingSession,
) -> Result<SaveOutcome, MutationError> {
    let Some(original) = store.button(&session.profile_id, session.button_index) else {
        let len = store
            .profile(&session.profile_id)
            .ok_or_else(|| MutationError::UnknownProfile(session.profile_id.clone()))?
            .buttons
            .len();
        return Err(MutationError::OutOfRange {
            index: session.button_index,
            len,
        });
    };
    let button = session.build_button(original);
    store.apply(
        &session.profile_id,
        ButtonMutation::Replace {
            index: session.button_index,
            button,
        },
    )?;
    Ok(store.save(upstream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile::{Action, ActionKind};
    use crate::connection::testing::RecordingUpstream;
    use crate::store::tests::loaded_store;
    use egui::Vec2;

    fn labels(store: &ProfileStore, id: &str) -> Vec<String> {
        store
            .profile(id)
            .unwrap()
            .buttons
            .iter()
            .map(|b| b.label.clone())
            .collect()
    }

    fn controller() -> Controller {
        Controller::new("BureauMSI", None)
    }

    #[test]
    fn test_mode_transitions() {
        let mut ctrl = controller();
        assert_eq!(ctrl.mode(), Mode::Normal);
        assert_eq!(ctrl.toggle(Mode::Edit), Mode::Edit);
        assert_eq!(ctrl.toggle(Mode::Reorganize), Mode::Reorganize);
        assert_eq!(ctrl.toggle(Mode::Reorganize), Mode::Normal);
    }

    #[test]
    fn test_leaving_modes_clears_transient_state() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();

        ctrl.set_mode(Mode::Edit);
        assert_eq!(ctrl.tap(&mut store, &upstream, &[], 1), TapOutcome::EditorOpened);
        ctrl.set_mode(Mode::Reorganize);
        assert!(ctrl.editor().is_none());

        assert!(ctrl.begin_drag(&store, 0, DragVia::Pointer));
        ctrl.set_mode(Mode::Normal);
        assert!(ctrl.drag().is_none());
    }

    #[test]
    fn test_target_resolution() {
        let ctrl = controller();
        assert_eq!(ctrl.resolve_target(&["H1".to_string()]), "H1");
        assert_eq!(ctrl.resolve_target(&[]), "BureauMSI");
        assert_eq!(
            ctrl.resolve_target(&["H1".to_string(), "H2".to_string()]),
            "BureauMSI"
        );

        let pinned = Controller::new("BureauMSI", Some("Studio".to_string()));
        assert_eq!(pinned.resolve_target(&["H1".to_string()]), "Studio");
    }

    #[test]
    fn test_tap_in_normal_mode_sends_command() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();

        let outcome = ctrl.tap(&mut store, &upstream, &["H1".to_string()], 0);
        assert!(matches!(
            outcome,
            TapOutcome::Executed(ExecuteOutcome::Sent { ref target, .. }) if target == "H1"
        ));
        let sent = upstream.sent.borrow();
        match sent.as_slice() {
            [Outbound::Cmd(frame)] => {
                assert_eq!(frame.target, "H1");
                assert_eq!(
                    frame.command,
                    WireCommand::Keys {
                        keys: "CTRL+C".to_string()
                    }
                );
            }
            other => panic!("unexpected frames {other:?}"),
        }
    }

    #[test]
    fn test_noop_and_offline_commands() {
        let store = loaded_store();
        let ctrl = controller();
        let offline = RecordingUpstream::default();

        let noop = Button::new("Nothing", Action::default());
        assert_eq!(ctrl.execute_action(&noop, &offline, &[]), ExecuteOutcome::NoAction);

        let button = store.button("A", 2).unwrap();
        assert_eq!(
            ctrl.execute_action(button, &offline, &[]),
            ExecuteOutcome::NotSent(SendFailure::NotConnected)
        );
    }

    #[test]
    fn test_reorganize_tap_only_hints() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();
        ctrl.set_mode(Mode::Reorganize);

        assert_eq!(ctrl.tap(&mut store, &upstream, &[], 0), TapOutcome::ReorganizeHint);
        assert_eq!(ctrl.tap(&mut store, &upstream, &[], 9), TapOutcome::Ignored);
        assert!(upstream.sent.borrow().is_empty());
    }

    #[test]
    fn test_drag_zero_to_two_is_insertion() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();
        ctrl.set_mode(Mode::Reorganize);

        assert!(ctrl.begin_drag(&store, 0, DragVia::Pointer));
        let outcome = ctrl.drop_on(&mut store, &upstream, 2);
        assert!(matches!(outcome, DropOutcome::Moved { from: 0, to: 2, .. }));
        assert_eq!(labels(&store, "A"), vec!["b1", "b2", "b0"]);
        assert!(ctrl.drag().is_none());
        assert_eq!(upstream.sent.borrow().len(), 1);
    }

    #[test]
    fn test_touch_path_uses_same_reorder() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();
        ctrl.set_mode(Mode::Reorganize);

        let geometry = GridGeometry {
            origin: Pos2::ZERO,
            cell: Vec2::splat(100.0),
            gap: 10.0,
            cols: 3,
            count: 3,
        };
        assert!(ctrl.touch_start(&store, &geometry, Pos2::new(50.0, 50.0)));
        ctrl.touch_move(&geometry, Pos2::new(160.0, 50.0));
        assert_eq!(ctrl.drag().and_then(DragState::target), Some(1));
        ctrl.touch_move(&geometry, Pos2::new(270.0, 50.0));

        let outcome = ctrl.touch_end(&mut store, &upstream, &geometry, Pos2::new(270.0, 50.0));
        assert!(matches!(outcome, DropOutcome::Moved { from: 0, to: 2, .. }));
        assert_eq!(labels(&store, "A"), vec!["b1", "b2", "b0"]);
    }

    #[test]
    fn test_touch_release_in_gap_changes_nothing() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();
        ctrl.set_mode(Mode::Reorganize);

        let geometry = GridGeometry {
            origin: Pos2::ZERO,
            cell: Vec2::splat(100.0),
            gap: 10.0,
            cols: 3,
            count: 3,
        };
        assert!(ctrl.touch_start(&store, &geometry, Pos2::new(50.0, 50.0)));
        let outcome = ctrl.touch_end(&mut store, &upstream, &geometry, Pos2::new(105.0, 50.0));
        assert_eq!(outcome, DropOutcome::Unchanged);
        assert_eq!(labels(&store, "A"), vec!["b0", "b1", "b2"]);
        assert!(upstream.sent.borrow().is_empty());
    }

    #[test]
    fn test_drag_requires_reorganize_mode() {
        let store = loaded_store();
        let mut ctrl = controller();
        assert!(!ctrl.begin_drag(&store, 0, DragVia::Pointer));
        ctrl.set_mode(Mode::Reorganize);
        assert!(!ctrl.begin_drag(&store, 7, DragVia::Pointer));
    }

    #[test]
    fn test_add_button_opens_editor_on_placeholder() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();
        ctrl.set_mode(Mode::Edit);

        ctrl.add_button(&mut store, &upstream).unwrap();
        assert_eq!(labels(&store, "A").last().map(String::as_str), Some("New"));
        let session = ctrl.editor().unwrap();
        assert_eq!(session.button_index, 3);
        assert_eq!(session.draft.kind, ActionKind::Noop);
        assert_eq!(upstream.sent.borrow().len(), 1);
    }

    #[test]
    fn test_editor_save_delete_cancel() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();
        ctrl.set_mode(Mode::Edit);

        ctrl.tap(&mut store, &upstream, &[], 1);
        {
            let session = ctrl.editor_mut().unwrap();
            session.draft.label = "Notes".to_string();
            session.draft.kind = ActionKind::Shell;
            session.draft.payload = "notepad".to_string();
        }
        ctrl.save_editor(&mut store, &upstream).unwrap().unwrap();
        let button = store.button("A", 1).unwrap();
        assert_eq!(button.label, "Notes");
        assert_eq!(button.action, Action::new(ActionKind::Shell, "notepad"));
        assert!(ctrl.editor().is_none());

        ctrl.tap(&mut store, &upstream, &[], 0);
        ctrl.editor_mut().unwrap().draft.label = "discarded".to_string();
        ctrl.cancel_editor();
        assert_eq!(labels(&store, "A"), vec!["b0", "Notes", "b2"]);

        ctrl.tap(&mut store, &upstream, &[], 0);
        ctrl.delete_editor_button(&mut store, &upstream).unwrap().unwrap();
        assert_eq!(labels(&store, "A"), vec!["Notes", "b2"]);
        assert!(ctrl.save_editor(&mut store, &upstream).is_none());
    }

    #[test]
    fn test_revalidate_closes_stale_editor() {
        let mut store = loaded_store();
        let upstream = RecordingUpstream::open();
        let mut ctrl = controller();
        ctrl.set_mode(Mode::Edit);
        ctrl.tap(&mut store, &upstream, &[], 2);

        store
            .mutate_buttons("A", |buttons| buttons.truncate(2))
            .unwrap();
        let result = ctrl.revalidate(&store);
        assert!(result.editor_closed);
        assert!(ctrl.editor().is_none());
    }
}
