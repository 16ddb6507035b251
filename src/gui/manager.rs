//! Pad application: wires the relay connection, profile store, controller and
//! renderer into one eframe app driven by the UI thread

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use url::Url;

use super::components::{
    ButtonEditor, EditorAction, GridAction, ProfileAction, ProfileSelector, SleepOverlay,
    StatusAction, StatusView, button_grid, status_bar,
};
use super::constants::*;
use super::images::ImageCache;
use super::toast::{ToastKind, Toasts};
use crate::config::profile::ConfigDocument;
use crate::config::settings::Settings;
use crate::connection::{ConnectionManager, Dispatcher, WakeFn};
use crate::constants::{timing, toast};
use crate::controller::{Controller, DragVia, DropOutcome, ExecuteOutcome, Mode, TapOutcome};
use crate::error::{LoadError, MutationError, SendFailure};
use crate::render::{GridGeometry, RenderEngine};
use crate::store::{FallbackSource, FileStore, ProfileStore, SaveOutcome};
use crate::sync::{ReconcileOutcome, Reconciler};

/// State the inbound frame handlers operate on
struct PadCore {
    store: ProfileStore,
    controller: Controller,
    render: RenderEngine,
    reconciler: Reconciler,
    toasts: Toasts,
    /// Set after local changes; the render cache is refreshed before drawing
    dirty: bool,
}

impl PadCore {
    fn refresh_view(&mut self) {
        self.render.refresh_selector(self.store.all_profiles());
        self.render
            .refresh_grid(self.store.current_profile(), self.controller.mode());
        self.dirty = false;
    }

    fn apply_document(&mut self, document: ConfigDocument, origin: &str) {
        let outcome = self.reconciler.reconcile(
            document,
            &mut self.store,
            &mut self.controller,
            &mut self.render,
        );
        if let ReconcileOutcome::Applied { invalidated, .. } = outcome {
            self.toasts.info("Configuration synced", toast::SHORT_MS);
            if invalidated.editor_closed {
                self.toasts.info("Edited button was removed remotely", toast::LONG_MS);
            }
            debug!(origin = origin, "Document reconciled");
            self.dirty = true;
        }
    }

    fn report_save(&mut self, outcome: &SaveOutcome) {
        if let Some(notice) = outcome.notice() {
            self.toasts.info(notice, toast::ACK_MS);
        }
    }

    fn report_mutation(&mut self, result: Result<SaveOutcome, MutationError>) {
        match result {
            Ok(outcome) => self.report_save(&outcome),
            Err(err) => {
                warn!(error = %err, "Button change rejected");
                self.toasts.error(err.to_string());
            }
        }
        self.dirty = true;
    }
}

fn build_dispatcher() -> Dispatcher<PadCore> {
    let mut dispatcher = Dispatcher::new();
    dispatcher.on_status(|_core: &mut PadCore, status| {
        debug!(online = status.online, hosts = ?status.hosts, "Relay status");
    });
    dispatcher.on_config_updated(|core: &mut PadCore, push| {
        core.apply_document(push.config, "push");
    });
    dispatcher.on_ack(|core: &mut PadCore, notice| {
        let text = notice.message.unwrap_or_else(|| "ACK".to_string());
        core.toasts.info(text, toast::ACK_MS);
    });
    dispatcher.on_error(|core: &mut PadCore, notice| {
        let text = notice.message.unwrap_or_else(|| "unknown error".to_string());
        core.toasts.error(format!("ERR: {text}"));
    });
    dispatcher
}

/// Periodic refetch of the fallback document
struct AutoSync {
    interval: Duration,
    last: Instant,
    pending: Option<oneshot::Receiver<Result<ConfigDocument, LoadError>>>,
}

struct PadApp {
    runtime: Runtime,
    connection: ConnectionManager,
    dispatcher: Dispatcher<PadCore>,
    core: PadCore,
    images: ImageCache,
    selector: ProfileSelector,
    editor: ButtonEditor,
    sleep: SleepOverlay,
    auto_sync: Option<AutoSync>,
    last_watchdog: Instant,
}

impl PadApp {
    fn new(
        cc: &CreationContext<'_>,
        settings: Settings,
        runtime: Runtime,
        endpoint: Url,
        reset_cache: bool,
    ) -> Self {
        info!("Initializing pad UI");

        let mut core = PadCore {
            store: ProfileStore::new(
                Box::new(FileStore::new(Settings::storage_dir())),
                FallbackSource::parse(&settings.pad.fallback_document),
            ),
            controller: Controller::new(
                settings.pad.default_host.clone(),
                settings.pad.target_host.clone(),
            ),
            render: RenderEngine::new(),
            reconciler: Reconciler::new(),
            toasts: Toasts::default(),
            dirty: true,
        };

        if reset_cache && core.store.reset_cache() {
            core.toasts.info("Local cache cleared", toast::ACK_MS);
        }
        if let Err(err) = runtime.block_on(core.store.load()) {
            error!(error = %err, "No configuration available");
            core.toasts.push(
                err.to_string(),
                ToastKind::Error,
                Duration::from_millis(toast::LONG_MS),
            );
        }

        let ctx = cc.egui_ctx.clone();
        let wake: WakeFn = Arc::new(move || ctx.request_repaint());
        let mut connection = ConnectionManager::spawn(
            runtime.handle(),
            endpoint,
            settings.backoff_policy(),
            settings.status_ttl(),
            Some(wake),
        );
        connection.connect();

        let auto_sync = settings.auto_sync_interval().map(|interval| {
            info!(interval_secs = interval.as_secs(), "Auto-sync enabled");
            AutoSync {
                interval,
                last: Instant::now(),
                pending: None,
            }
        });

        Self {
            runtime,
            connection,
            dispatcher: build_dispatcher(),
            core,
            images: ImageCache::default(),
            selector: ProfileSelector::new(),
            editor: ButtonEditor::new(),
            sleep: SleepOverlay::default(),
            auto_sync,
            last_watchdog: Instant::now(),
        }
    }

    fn process_connection(&mut self, now: Instant) {
        for frame in self.connection.poll(now) {
            self.dispatcher.dispatch(&mut self.core, frame);
        }

        if now.duration_since(self.last_watchdog) >= Duration::from_millis(timing::WATCHDOG_INTERVAL_MS) {
            self.last_watchdog = now;
            if self.connection.check_liveness(now) {
                self.core.toasts.error("Relay offline");
            }
        }
    }

    fn process_auto_sync(&mut self, now: Instant) {
        let Some(sync) = &mut self.auto_sync else {
            return;
        };

        if let Some(rx) = &mut sync.pending {
            match rx.try_recv() {
                Ok(Ok(document)) => {
                    sync.pending = None;
                    self.core.apply_document(document, "auto-sync");
                }
                Ok(Err(err)) => {
                    sync.pending = None;
                    warn!(error = %err, "Auto-sync fetch failed");
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => sync.pending = None,
            }
            return;
        }

        if now.duration_since(sync.last) >= sync.interval {
            sync.last = now;
            let source = self.core.store.fallback_source().clone();
            let (tx, rx) = oneshot::channel();
            self.runtime.spawn(async move {
                let _ = tx.send(source.fetch().await);
            });
            sync.pending = Some(rx);
        }
    }

    fn handle_status(&mut self, action: StatusAction) {
        match action {
            StatusAction::None => {}
            StatusAction::ToggleMode(mode) => {
                let mode = self.core.controller.toggle(mode);
                let hint = match mode {
                    Mode::Normal => "Normal mode",
                    Mode::Edit => "Edit mode: tap a button to edit it",
                    Mode::Reorganize => "Reorganize mode: drag buttons to reorder",
                };
                self.core.toasts.info(hint, toast::LONG_MS);
                self.core.dirty = true;
            }
            StatusAction::Sleep => self.sleep.sleep(Instant::now()),
            StatusAction::Reconnect => self.connection.connect(),
        }
    }

    fn handle_profile(&mut self, action: ProfileAction) {
        match action {
            ProfileAction::None => {}
            ProfileAction::Switch(id) => {
                if self.core.store.switch_profile(&id) {
                    self.core.controller.revalidate(&self.core.store);
                    self.core.dirty = true;
                }
            }
            ProfileAction::Create { label, cols } => {
                let id = self.core.store.add_profile(&label, cols);
                self.core.store.switch_profile(&id);
                let outcome = self.core.store.save(&self.connection);
                self.core.report_save(&outcome);
                self.core.dirty = true;
            }
        }
    }

    fn handle_grid(&mut self, actions: Vec<GridAction>, geometry: GridGeometry) {
        let core = &mut self.core;
        let upstream = &self.connection;

        for action in actions {
            match action {
                GridAction::Tap(index) => {
                    let outcome = core
                        .controller
                        .tap(&core.store, upstream, upstream.online_hosts(), index);
                    report_tap(&mut core.toasts, outcome);
                }
                GridAction::Add => {
                    let result = core.controller.add_button(&mut core.store, upstream);
                    core.report_mutation(result);
                }
                GridAction::DragStart(index) => {
                    core.controller.begin_drag(&core.store, index, DragVia::Pointer);
                }
                GridAction::Hover(index) => core.controller.hover(index),
                GridAction::Drop(to) => {
                    let outcome = core.controller.drop_on(&mut core.store, upstream, to);
                    report_drop(core, outcome);
                }
                GridAction::DragEnd => core.controller.cancel_drag(),
                GridAction::TouchStart(point) => {
                    core.controller.touch_start(&core.store, &geometry, point);
                }
                GridAction::TouchMove(point) => core.controller.touch_move(&geometry, point),
                GridAction::TouchEnd(point) => {
                    let outcome =
                        core.controller
                            .touch_end(&mut core.store, upstream, &geometry, point);
                    report_drop(core, outcome);
                }
            }
        }
    }

    fn show_editor(&mut self, ctx: &egui::Context) {
        let core = &mut self.core;
        let Some(session) = core.controller.editor_mut() else {
            return;
        };
        let Some(original) = core
            .store
            .button(&session.profile_id, session.button_index)
            .cloned()
        else {
            core.controller.cancel_editor();
            return;
        };

        match self.editor.ui(ctx, session, &original, &mut self.images) {
            EditorAction::None => {}
            EditorAction::ImageFailed(message) => core.toasts.error(message),
            EditorAction::Cancel => core.controller.cancel_editor(),
            EditorAction::Save => {
                if let Some(result) = core.controller.save_editor(&mut core.store, &self.connection) {
                    core.report_mutation(result);
                }
            }
            EditorAction::Delete => {
                if let Some(result) = core
                    .controller
                    .delete_editor_button(&mut core.store, &self.connection)
                {
                    core.report_mutation(result);
                }
            }
        }
    }

    fn retain_images(&mut self) {
        let uris = self
            .core
            .store
            .all_profiles()
            .iter()
            .flat_map(|profile| profile.buttons.iter())
            .filter_map(|button| button.image_uri());
        self.images.retain_uris(uris);
    }
}

fn report_tap(toasts: &mut Toasts, outcome: TapOutcome) {
    match outcome {
        TapOutcome::Executed(ExecuteOutcome::Sent { target, .. }) => {
            toasts.info(format!("Sent \u{2192} {target}"), toast::SHORT_MS);
        }
        TapOutcome::Executed(ExecuteOutcome::NoAction) => {
            toasts.info("No action assigned", toast::SHORT_MS);
        }
        TapOutcome::Executed(ExecuteOutcome::NotSent(SendFailure::NotConnected)) => {
            toasts.error("Not connected to relay");
        }
        TapOutcome::Executed(ExecuteOutcome::NotSent(failure)) => {
            toasts.error(failure.to_string());
        }
        TapOutcome::ReorganizeHint => {
            toasts.info("Drag to move this button", toast::ACK_MS);
        }
        TapOutcome::EditorOpened | TapOutcome::Ignored => {}
    }
}

fn report_drop(core: &mut PadCore, outcome: DropOutcome) {
    match outcome {
        DropOutcome::Moved { save, .. } => {
            core.report_save(&save);
            core.dirty = true;
        }
        DropOutcome::Failed(err) => {
            warn!(error = %err, "Reorder rejected");
            core.toasts.error(err.to_string());
            core.dirty = true;
        }
        DropOutcome::Unchanged | DropOutcome::NoDrag => {}
    }
}

impl eframe::App for PadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.process_connection(now);
        self.process_auto_sync(now);

        if self.core.dirty {
            self.core.refresh_view();
            self.retain_images();
        }

        // Nothing under the overlay is drawn, so the waking input reaches no widget
        if self.sleep.is_active() {
            self.sleep.ui(ctx);
            ctx.request_repaint_after(Duration::from_millis(REPAINT_INTERVAL_MS));
            return;
        }

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING / 2.0);
            let target = self
                .core
                .controller
                .resolve_target(self.connection.online_hosts());
            let action = status_bar::ui(
                ui,
                &StatusView {
                    link: self.connection.state(),
                    relay_online: self.connection.relay_online(),
                    hosts: self.connection.online_hosts(),
                    target: &target,
                    mode: self.core.controller.mode(),
                },
            );
            ui.add_space(ITEM_SPACING / 2.0);
            self.handle_status(action);
        });

        egui::TopBottomPanel::top("profile_bar").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING / 2.0);
            let editing = self.core.controller.mode() == Mode::Edit;
            let action = self.selector.ui(
                ui,
                self.core.render.selector(),
                self.core.store.current_id(),
                editing,
            );
            ui.add_space(ITEM_SPACING / 2.0);
            self.handle_profile(action);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(PADDING);
            let Some(view) = self.core.render.grid().cloned() else {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("No profiles").color(HINT_TEXT));
                });
                return;
            };

            egui::ScrollArea::vertical().show(ui, |ui| {
                let output = button_grid::ui(ui, &view, self.core.controller.drag(), &mut self.images);
                if !output.actions.is_empty() {
                    self.handle_grid(output.actions, output.geometry);
                }
            });
        });

        self.show_editor(ctx);
        self.core.toasts.show(ctx);

        if self.core.dirty {
            ctx.request_repaint();
        }
        ctx.request_repaint_after(Duration::from_millis(REPAINT_INTERVAL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.connection.disconnect();
        info!(
            synced = self.core.reconciler.applied(),
            unchanged = self.core.reconciler.skipped(),
            renders = self.core.render.renders(),
            "Pad exiting"
        );
    }
}

pub fn run_gui(settings: Settings, reset_cache: bool) -> Result<()> {
    let endpoint = settings.endpoint()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("nexus-pad-io")
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size([settings.window.width, settings.window.height])
        .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
        .with_title("Nexus Pad");
    if settings.window.fullscreen {
        viewport = viewport.with_fullscreen(true);
    }
    let options = NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Nexus Pad",
        options,
        Box::new(move |cc| Ok(Box::new(PadApp::new(cc, settings, runtime, endpoint, reset_cache)))),
    )
    .map_err(|err| anyhow!("Failed to launch pad UI: {err}"))
}
