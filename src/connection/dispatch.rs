//! Typed inbound event dispatch
//!
//! One handler slot per message kind. Registering a handler for a kind that
//! already has one replaces it; frames without a handler are ignored.

use tracing::trace;

use super::protocol::{ConfigPush, Inbound, Notice, StatusFrame};

type Handler<C, T> = Box<dyn FnMut(&mut C, T)>;

/// Routes decoded frames to handlers that receive a mutable context `C`
pub struct Dispatcher<C> {
    on_status: Option<Handler<C, StatusFrame>>,
    on_config_updated: Option<Handler<C, ConfigPush>>,
    on_ack: Option<Handler<C, Notice>>,
    on_error: Option<Handler<C, Notice>>,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self {
            on_status: None,
            on_config_updated: None,
            on_ack: None,
            on_error: None,
        }
    }
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_status(&mut self, handler: impl FnMut(&mut C, StatusFrame) + 'static) {
        self.on_status = Some(Box::new(handler));
    }

    pub fn on_config_updated(&mut self, handler: impl FnMut(&mut C, ConfigPush) + 'static) {
        self.on_config_updated = Some(Box::new(handler));
    }

    pub fn on_ack(&mut self, handler: impl FnMut(&mut C, Notice) + 'static) {
        self.on_ack = Some(Box::new(handler));
    }

    pub fn on_error(&mut self, handler: impl FnMut(&mut C, Notice) + 'static) {
        self.on_error = Some(Box::new(handler));
    }

    /// Hand one frame to its handler; returns false when no handler is registered
    pub fn dispatch(&mut self, ctx: &mut C, frame: Inbound) -> bool {
        let kind = frame.kind();
        let handled = match frame {
            Inbound::Status(status) => call(&mut self.on_status, ctx, status),
            Inbound::ConfigUpdated(push) => call(&mut self.on_config_updated, ctx, push),
            Inbound::Ack(notice) => call(&mut self.on_ack, ctx, notice),
            Inbound::Error(notice) => call(&mut self.on_error, ctx, notice),
        };
        if !handled {
            trace!(kind = %kind, "No handler registered, frame ignored");
        }
        handled
    }
}

fn call<C, T>(slot: &mut Option<Handler<C, T>>, ctx: &mut C, payload: T) -> bool {
    match slot {
        Some(handler) => {
            handler(ctx, payload);
            true
        }
        None => false,
    }
}
