//! Terminal stand-in for the host page: the "selection" is the text given on
//! the command line and the popup is printed instead of drawn.

use overlay::document::{Cursor, Document, HeadlessDocument, Selection};
use overlay::geometry::{Rect, Viewport};
use overlay::render::{to_text, PopupTree};
use overlay::SessionId;

pub struct TerminalDocument {
    inner: HeadlessDocument,
    last_printed: Option<String>,
}

impl TerminalDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let mut inner = HeadlessDocument::new(Viewport::new(1280.0, 800.0));
        inner.select(text, Rect::new(40.0, 40.0, 640.0, 60.0));
        Self {
            inner,
            last_printed: None,
        }
    }

    #[cfg(test)]
    pub fn last_printed(&self) -> Option<&str> {
        self.last_printed.as_deref()
    }

    fn print(&mut self, tree: &PopupTree) {
        let text = to_text(tree);
        if self.last_printed.as_deref() == Some(text.as_str()) {
            return;
        }
        println!("\n{}", text.trim_end());
        self.last_printed = Some(text);
    }
}

impl Document for TerminalDocument {
    fn selection(&self) -> Option<Selection> {
        self.inner.selection()
    }

    fn viewport(&self) -> Viewport {
        self.inner.viewport()
    }

    fn attach(&mut self, tree: &PopupTree) {
        self.inner.attach(tree);
        self.print(tree);
    }

    fn patch(&mut self, tree: &PopupTree) {
        self.inner.patch(tree);
        self.print(tree);
    }

    fn detach(&mut self, session: SessionId) {
        self.inner.detach(session);
        self.last_printed = None;
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.inner.set_cursor(cursor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay::{Explainer, OverlayConfig};
    use std::time::Instant;

    #[test]
    fn test_selection_is_command_line_text() {
        let doc = TerminalDocument::new("  chlorophyll  ");
        assert_eq!(doc.selection().unwrap().text, "  chlorophyll  ");
    }

    #[test]
    fn test_activation_attaches_loading_popup() {
        let mut ex = Explainer::new(TerminalDocument::new("chlorophyll"), OverlayConfig::default());
        assert!(ex.activate(Instant::now()).is_some());
        assert!(ex.document().last_printed().unwrap().contains("Loading"));
    }
}
