//! Overlay - in-page explainer controller
//!
//! Recognizes a double press of the trigger key on selected text, shows a
//! draggable popup with the model's explanation, and threads a follow-up
//! chat about it. The host page is reached only through [`Document`].

pub mod config;
pub mod document;
pub mod driver;
pub mod explainer;
pub mod geometry;
pub mod gesture;
pub mod popup;
pub mod render;
pub mod timers;

pub use config::{OverlayConfig, PopupConfig};
pub use document::{Cursor, Document, HeadlessDocument, PointerTarget, Selection};
pub use explainer::{Completion, Explainer, KeyResponse, Request, RequestKind, SubmitRejected};
pub use gesture::{GestureConfig, GestureDetector, Key, KeyDown};
pub use popup::{PopupController, SessionId};
