//! Popup lifecycle: create, swap content, drag, animated close.
//!
//! The controller owns the single live popup. Every visual transition is a
//! timer-gated state change:
//! - entrance: attached hidden, made visible after `entrance_delay`
//! - content swap: fade out, replace after `fade`, fade in
//! - close: hide, detach after `close_animation`

use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::config::PopupConfig;
use crate::document::{Cursor, Document, PointerTarget};
use crate::geometry::{anchor_below, Point, Rect};
use crate::render::{render, Body, PopupKind};
use crate::timers::{TimerId, Timers};
use shared::Conversation;

/// Identity of one popup. Completions carry it so late responses can be
/// matched against the popup that asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Attached, entrance animation not started yet.
    Opening,
    Open,
    /// Exit animation running; detach is scheduled.
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    pub active: bool,
    /// Pointer position relative to the popup's top-left when the drag began.
    pub grab_offset: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupHandle {
    pub session: SessionId,
    /// Top-left in document coordinates.
    pub position: Point,
    pub kind: PopupKind,
    pub drag: DragState,
}

/// Follow-up chat status for the explanation popup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    /// A follow-up is in flight; the send control is disabled.
    pub pending: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct PopupSession {
    pub(crate) handle: PopupHandle,
    pub(crate) phase: Phase,
    pub(crate) body: Body,
    /// Content waiting for the fade-out to finish.
    pub(crate) pending: Option<Body>,
    pub(crate) conversation: Conversation,
    pub(crate) chat: ChatState,
    /// Swallow the click that trails a drag release.
    suppress_click: bool,
}

impl PopupSession {
    pub fn id(&self) -> SessionId {
        self.handle.session
    }

    pub fn handle(&self) -> &PopupHandle {
        &self.handle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    /// The explanation has not been swapped in yet, or a follow-up is out.
    /// Always false once closing.
    pub fn is_waiting(&self) -> bool {
        self.phase != Phase::Closing
            && (self.body == Body::Loading || self.pending.is_some() || self.chat.pending)
    }

    pub(crate) fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub(crate) fn chat_mut(&mut self) -> &mut ChatState {
        &mut self.chat
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopupTimer {
    Entrance(SessionId),
    SwapContent(SessionId),
    FinishClose(SessionId),
}

impl PopupTimer {
    fn session(self) -> SessionId {
        match self {
            PopupTimer::Entrance(id)
            | PopupTimer::SwapContent(id)
            | PopupTimer::FinishClose(id) => id,
        }
    }
}

pub struct PopupController {
    config: PopupConfig,
    session: Option<PopupSession>,
    timers: Timers<PopupTimer>,
    swap_timer: Option<TimerId>,
}

impl PopupController {
    pub fn new(config: PopupConfig) -> Self {
        Self {
            config,
            session: None,
            timers: Timers::new(),
            swap_timer: None,
        }
    }

    pub fn current(&self) -> Option<&PopupSession> {
        self.session.as_ref()
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut PopupSession> {
        self.session.as_mut()
    }

    /// True while `id` is the live popup and not on its way out.
    pub fn is_current(&self, id: SessionId) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id() == id && s.phase != Phase::Closing)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Tear down any existing popup and attach a new loading popup below
    /// `anchor`. The conversation moves into the new session.
    pub fn show_loading<D: Document>(
        &mut self,
        doc: &mut D,
        anchor: Rect,
        conversation: Conversation,
        now: Instant,
    ) -> SessionId {
        self.teardown(doc);

        let viewport = doc.viewport();
        let id = SessionId::new();
        let position = viewport.clamp(
            anchor_below(anchor, self.config.anchor_margin, &viewport),
            self.config.fallback_size,
            self.config.viewport_inset,
        );
        let mut session = PopupSession {
            handle: PopupHandle {
                session: id,
                position,
                kind: PopupKind::Loading,
                drag: DragState::default(),
            },
            phase: Phase::Opening,
            body: Body::Loading,
            pending: None,
            conversation,
            chat: ChatState::default(),
            suppress_click: false,
        };
        doc.attach(&render(&session));

        // Re-clamp once the host can measure the real box.
        if let Some(size) = doc.popup_size(id) {
            let clamped = viewport.clamp(position, size, self.config.viewport_inset);
            if clamped != position {
                session.handle.position = clamped;
                doc.patch(&render(&session));
            }
        }

        self.session = Some(session);
        self.timers
            .schedule(now + self.config.entrance_delay(), PopupTimer::Entrance(id));
        debug!(session = %id, ?position, "popup attached");
        id
    }

    /// Fade out, swap in `body`, fade in. A later call before the swap
    /// replaces the waiting content; only the latest body is shown.
    pub fn update_content<D: Document>(&mut self, doc: &mut D, body: Body, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase == Phase::Closing {
            return;
        }
        let id = session.id();
        session.pending = Some(body);
        if self.swap_timer.is_none() {
            self.swap_timer = Some(
                self.timers
                    .schedule(now + self.config.fade(), PopupTimer::SwapContent(id)),
            );
        }
        doc.patch(&render(session));
    }

    /// Redraw the current popup after its conversation or chat state changed.
    pub fn refresh<D: Document>(&mut self, doc: &mut D) {
        if let Some(session) = self.session.as_ref() {
            doc.patch(&render(session));
        }
    }

    /// Start the exit animation. No-op without a popup or while already closing.
    pub fn close<D: Document>(&mut self, doc: &mut D, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase == Phase::Closing {
            return;
        }
        let id = session.id();
        let was_dragging = session.handle.drag.active;
        session.phase = Phase::Closing;
        session.handle.drag = DragState::default();
        session.pending = None;
        doc.patch(&render(session));
        if was_dragging {
            doc.set_cursor(Cursor::Default);
        }

        self.timers.cancel_where(|t| t.session() == id);
        self.swap_timer = None;
        self.timers
            .schedule(now + self.config.close_animation(), PopupTimer::FinishClose(id));
        debug!(session = %id, "popup closing");
    }

    /// Close on a click outside the popup, unless a drag is in progress or
    /// just ended.
    pub fn on_outside_click<D: Document>(
        &mut self,
        doc: &mut D,
        target: PointerTarget,
        now: Instant,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.handle.drag.active || session.phase == Phase::Closing {
            return false;
        }
        if std::mem::take(&mut session.suppress_click) || target.is_inside_popup() {
            return false;
        }
        self.close(doc, now);
        true
    }

    /// Begin a drag when the header is grabbed. `pointer` is in client coords.
    pub fn mouse_down<D: Document>(
        &mut self,
        doc: &mut D,
        target: PointerTarget,
        pointer: Point,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.suppress_click = false;
        if target != PointerTarget::Header || session.phase == Phase::Closing {
            return false;
        }
        let top_left = doc.viewport().to_client(session.handle.position);
        session.handle.drag = DragState {
            active: true,
            grab_offset: pointer.offset_from(top_left),
        };
        doc.patch(&render(session));
        doc.set_cursor(Cursor::Grabbing);
        true
    }

    pub fn mouse_move<D: Document>(&mut self, doc: &mut D, pointer: Point) {
        let fallback = self.config.fallback_size;
        let inset = self.config.viewport_inset;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.handle.drag.active {
            return;
        }
        let viewport = doc.viewport();
        let size = doc.popup_size(session.id()).unwrap_or(fallback);
        let wanted = viewport.to_document(pointer.offset_from(session.handle.drag.grab_offset));
        session.handle.position = viewport.clamp(wanted, size, inset);
        doc.patch(&render(session));
    }

    pub fn mouse_up<D: Document>(&mut self, doc: &mut D) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.handle.drag.active {
            return;
        }
        session.handle.drag.active = false;
        session.suppress_click = true;
        doc.patch(&render(session));
        doc.set_cursor(Cursor::Default);
    }

    /// Run animation steps whose deadline has passed.
    pub fn advance<D: Document>(&mut self, doc: &mut D, now: Instant) {
        while let Some((timer_id, timer)) = self.timers.pop_due(now) {
            match timer {
                PopupTimer::Entrance(id) => self.finish_entrance(doc, id),
                PopupTimer::SwapContent(id) => {
                    if self.swap_timer == Some(timer_id) {
                        self.swap_timer = None;
                    }
                    self.swap_content(doc, id);
                }
                PopupTimer::FinishClose(id) => {
                    if self.session.as_ref().is_some_and(|s| s.id() == id) {
                        self.teardown(doc);
                    }
                }
            }
        }
    }

    fn finish_entrance<D: Document>(&mut self, doc: &mut D, id: SessionId) {
        if let Some(session) = self.session.as_mut().filter(|s| s.id() == id) {
            if session.phase == Phase::Opening {
                session.phase = Phase::Open;
                doc.patch(&render(session));
            }
        }
    }

    fn swap_content<D: Document>(&mut self, doc: &mut D, id: SessionId) {
        let Some(session) = self.session.as_mut().filter(|s| s.id() == id) else {
            return;
        };
        let Some(body) = session.pending.take() else {
            return;
        };
        session.handle.kind = body.kind();
        session.body = body;
        debug!(session = %id, kind = ?session.handle.kind, "popup content swapped");
        doc.patch(&render(session));
    }

    /// Detach immediately and drop everything tied to the current popup.
    fn teardown<D: Document>(&mut self, doc: &mut D) {
        let Some(session) = self.session.take() else {
            return;
        };
        let id = session.id();
        self.timers.cancel_where(|t| t.session() == id);
        self.swap_timer = None;
        doc.detach(id);
        doc.set_cursor(Cursor::Default);
        debug!(session = %id, "popup removed");
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    #[cfg(test)]
    fn size_for<D: Document>(&self, doc: &D, id: SessionId) -> crate::geometry::Size {
        doc.popup_size(id).unwrap_or(self.config.fallback_size)
    }
}
