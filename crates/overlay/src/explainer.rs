//! Wires the gesture, popup and conversation together.
//!
//! The explainer never awaits. Handlers return a [`Request`] for the host to
//! run (see [`crate::driver`]); the result comes back through
//! [`Explainer::complete`], which drops it if its popup is gone.

use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::document::{Document, PointerTarget};
use crate::geometry::Point;
use crate::gesture::{GestureDetector, Key, KeyDown};
use crate::popup::{PopupController, SessionId};
use crate::render::{Body, PopupKind};
use shared::conversation::validate_follow_up;
use shared::{Conversation, RequestOutcome};

/// Network work the host must perform on behalf of a popup.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Explain {
        session: SessionId,
        text: String,
    },
    /// `conversation` already ends with the new user turn.
    FollowUp {
        session: SessionId,
        conversation: Conversation,
    },
}

impl Request {
    pub fn session(&self) -> SessionId {
        match self {
            Request::Explain { session, .. } | Request::FollowUp { session, .. } => *session,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Explain { .. } => RequestKind::Explain,
            Request::FollowUp { .. } => RequestKind::FollowUp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Explain,
    FollowUp,
}

/// Finished request, routed back to the popup that issued it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub session: SessionId,
    pub kind: RequestKind,
    pub outcome: RequestOutcome,
}

#[derive(Debug, Default, PartialEq)]
pub struct KeyResponse {
    /// Suppress the browser's default action for this key.
    pub prevent_default: bool,
    pub request: Option<Request>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("message is empty")]
    Empty,
    #[error("no explanation is open")]
    NoChat,
    #[error("a follow-up is already being sent")]
    InFlight,
}

pub struct Explainer<D: Document> {
    doc: D,
    config: OverlayConfig,
    gesture: GestureDetector,
    popup: PopupController,
}

impl<D: Document> Explainer<D> {
    pub fn new(doc: D, config: OverlayConfig) -> Self {
        Self {
            gesture: GestureDetector::new(config.gesture.clone()),
            popup: PopupController::new(config.popup.clone()),
            doc,
            config,
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn on_key_down(&mut self, key: &Key, is_repeat: bool, now: Instant) -> KeyResponse {
        if *key == Key::Escape && self.popup.current().is_some() {
            self.popup.close(&mut self.doc, now);
            return KeyResponse::default();
        }
        match self.gesture.on_key_down(key, is_repeat, now) {
            KeyDown::DoublePress => KeyResponse {
                prevent_default: true,
                request: self.activate(now),
            },
            KeyDown::Counted | KeyDown::Ignored => KeyResponse::default(),
        }
    }

    pub fn on_key_up(&mut self, key: &Key) {
        self.gesture.on_key_up(key);
    }

    /// Explain the current selection, as if the gesture had fired. Also the
    /// entry point for a keyboard-command activation.
    pub fn activate(&mut self, now: Instant) -> Option<Request> {
        let Some(selection) = self.doc.selection() else {
            debug!("activation without selection");
            return None;
        };
        let text = selection.text.trim();
        if text.chars().count() < self.config.min_selection_chars.max(1) {
            debug!(chars = text.chars().count(), "selection too short, ignoring");
            return None;
        }

        let text = text.to_string();
        let session = self.popup.show_loading(
            &mut self.doc,
            selection.rect,
            Conversation::start(text.clone()),
            now,
        );
        info!(%session, chars = text.chars().count(), "explaining selection");
        Some(Request::Explain { session, text })
    }

    pub fn on_mouse_down(&mut self, target: PointerTarget, pointer: Point) -> bool {
        self.popup.mouse_down(&mut self.doc, target, pointer)
    }

    pub fn on_mouse_move(&mut self, pointer: Point) {
        self.popup.mouse_move(&mut self.doc, pointer);
    }

    pub fn on_mouse_up(&mut self) {
        self.popup.mouse_up(&mut self.doc);
    }

    /// Document-level click. Clicks on the close control close the popup;
    /// clicks outside close it unless a drag is involved.
    pub fn on_click(&mut self, target: PointerTarget, now: Instant) {
        if target == PointerTarget::CloseButton {
            self.popup.close(&mut self.doc, now);
            return;
        }
        self.popup.on_outside_click(&mut self.doc, target, now);
    }

    pub fn close(&mut self, now: Instant) {
        self.popup.close(&mut self.doc, now);
    }

    /// Queue a follow-up question from the chat input.
    pub fn submit_follow_up(&mut self, input: &str) -> Result<Request, SubmitRejected> {
        let message = validate_follow_up(input).ok_or(SubmitRejected::Empty)?;
        let id = self
            .popup
            .current()
            .filter(|s| s.handle().kind == PopupKind::Explanation)
            .map(|s| s.id())
            .filter(|id| self.popup.is_current(*id))
            .ok_or(SubmitRejected::NoChat)?;

        let session = self.popup.current_mut().ok_or(SubmitRejected::NoChat)?;
        if session.chat().pending {
            return Err(SubmitRejected::InFlight);
        }
        session.conversation_mut().push_user(message);
        let chat = session.chat_mut();
        chat.pending = true;
        chat.error = None;
        let conversation = session.conversation().clone();

        self.popup.refresh(&mut self.doc);
        debug!(session = %id, turns = conversation.turns().len(), "follow-up queued");
        Ok(Request::FollowUp {
            session: id,
            conversation,
        })
    }

    /// Apply a finished request. Returns false when the result was stale and
    /// dropped without touching the document.
    pub fn complete(&mut self, completion: Completion, now: Instant) -> bool {
        let Completion {
            session: id,
            kind,
            outcome,
        } = completion;
        if !self.popup.is_current(id) {
            debug!(session = %id, ?kind, "dropping stale completion");
            return false;
        }
        let Some(session) = self.popup.current_mut() else {
            return false;
        };

        match kind {
            RequestKind::Explain => {
                let body = match outcome {
                    Ok(text) => {
                        info!(session = %id, "explanation received");
                        session.conversation_mut().set_explanation(text.clone());
                        Body::Explanation { text }
                    }
                    Err(failure) => {
                        warn!(session = %id, %failure, "explanation failed");
                        Body::Error {
                            message: failure.user_message().to_string(),
                        }
                    }
                };
                self.popup.update_content(&mut self.doc, body, now);
            }
            RequestKind::FollowUp => {
                match outcome {
                    Ok(reply) => session.conversation_mut().push_assistant(reply),
                    Err(failure) => {
                        warn!(session = %id, %failure, "follow-up failed");
                        session.chat_mut().error = Some(failure.chat_message().to_string());
                    }
                }
                session.chat_mut().pending = false;
                self.popup.refresh(&mut self.doc);
            }
        }
        true
    }

    /// A request for the current popup is unanswered or its content is
    /// still fading in.
    pub fn awaiting_response(&self) -> bool {
        self.popup.current().is_some_and(|s| s.is_waiting())
    }

    /// Fire due gesture and animation timers.
    pub fn advance(&mut self, now: Instant) {
        self.gesture.advance(now);
        self.popup.advance(&mut self.doc, now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.gesture.next_deadline(), self.popup.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
