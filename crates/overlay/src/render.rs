//! Pure mapping from popup session state to the tree the host draws.

use serde::Serialize;

use crate::geometry::Point;
use crate::popup::{Phase, PopupSession, SessionId};
use shared::TurnRole;

pub const LOADING_HEADER: &str = "🤔 Loading...";
pub const EXPLANATION_HEADER: &str = "🤖 Sentient AI";
pub const ERROR_HEADER: &str = "⚠️ Error";
pub const THINKING_TEXT: &str = "🤔 Thinking...";
pub const CHAT_PLACEHOLDER: &str = "Ask a follow-up question...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupKind {
    Loading,
    Explanation,
    Error,
}

/// Main content of the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Body {
    Loading,
    Explanation { text: String },
    Error { message: String },
}

impl Body {
    pub fn kind(&self) -> PopupKind {
        match self {
            Body::Loading => PopupKind::Loading,
            Body::Explanation { .. } => PopupKind::Explanation,
            Body::Error { .. } => PopupKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatLineKind {
    User,
    Assistant,
    Error,
    /// Typing indicator while a follow-up is in flight.
    Typing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatLine {
    pub kind: ChatLineKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSection {
    pub lines: Vec<ChatLine>,
    pub placeholder: &'static str,
    pub send_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupTree {
    pub session: SessionId,
    pub position: Point,
    pub header: &'static str,
    pub body: Body,
    pub chat: Option<ChatSection>,
    pub visible: bool,
    pub fading: bool,
    pub dragging: bool,
    pub error: bool,
}

impl PopupTree {
    pub fn kind(&self) -> PopupKind {
        self.body.kind()
    }
}

pub fn render(session: &PopupSession) -> PopupTree {
    let kind = session.body.kind();
    let header = match kind {
        PopupKind::Loading => LOADING_HEADER,
        PopupKind::Explanation => EXPLANATION_HEADER,
        PopupKind::Error => ERROR_HEADER,
    };
    let chat = (kind == PopupKind::Explanation).then(|| render_chat(session));

    PopupTree {
        session: session.handle.session,
        position: session.handle.position,
        header,
        body: session.body.clone(),
        chat,
        visible: session.phase == Phase::Open,
        fading: session.pending.is_some(),
        dragging: session.handle.drag.active,
        error: kind == PopupKind::Error,
    }
}

fn render_chat(session: &PopupSession) -> ChatSection {
    let mut lines: Vec<ChatLine> = session
        .conversation
        .turns()
        .iter()
        .map(|turn| ChatLine {
            kind: match turn.role {
                TurnRole::User => ChatLineKind::User,
                TurnRole::Assistant => ChatLineKind::Assistant,
            },
            text: turn.content.clone(),
        })
        .collect();
    if let Some(err) = &session.chat.error {
        lines.push(ChatLine {
            kind: ChatLineKind::Error,
            text: err.clone(),
        });
    }
    if session.chat.pending {
        lines.push(ChatLine {
            kind: ChatLineKind::Typing,
            text: String::new(),
        });
    }
    ChatSection {
        lines,
        placeholder: CHAT_PLACEHOLDER,
        send_enabled: !session.chat.pending,
    }
}

/// Plain-text rendering for terminal hosts and logs.
pub fn to_text(tree: &PopupTree) -> String {
    let mut out = format!("{}\n", tree.header);
    match &tree.body {
        Body::Loading => out.push_str(THINKING_TEXT),
        Body::Explanation { text } => out.push_str(text),
        Body::Error { message } => out.push_str(message),
    }
    out.push('\n');
    if let Some(chat) = &tree.chat {
        for line in &chat.lines {
            let prefix = match line.kind {
                ChatLineKind::User => "you> ",
                ChatLineKind::Assistant => "ai> ",
                ChatLineKind::Error => "",
                ChatLineKind::Typing => "ai> ...",
            };
            out.push_str(prefix);
            out.push_str(&line.text);
            out.push('\n');
        }
    }
    out
}
