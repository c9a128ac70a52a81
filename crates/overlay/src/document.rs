//! Seam to the host page: selection, viewport, element attach/detach.

use crate::geometry::{Rect, Size, Viewport};
use crate::popup::SessionId;
use crate::render::PopupTree;

/// The user's current text selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub text: String,
    /// Bounding rectangle of the first range, client coordinates.
    pub rect: Rect,
}

/// Which part of the page a pointer event hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Header,
    CloseButton,
    Content,
    ChatSection,
    Outside,
}

impl PointerTarget {
    pub fn is_inside_popup(self) -> bool {
        self != PointerTarget::Outside
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Grabbing,
}

pub trait Document {
    fn selection(&self) -> Option<Selection>;

    fn viewport(&self) -> Viewport;

    /// Measured size of the attached popup, if the host knows it.
    fn popup_size(&self, _session: SessionId) -> Option<Size> {
        None
    }

    fn attach(&mut self, tree: &PopupTree);

    /// Redraw an attached popup in place.
    fn patch(&mut self, tree: &PopupTree);

    fn detach(&mut self, session: SessionId);

    fn set_cursor(&mut self, cursor: Cursor);
}

/// In-memory document that records what is attached. Backs tests and the
/// terminal host.
#[derive(Debug)]
pub struct HeadlessDocument {
    pub selection: Option<Selection>,
    pub viewport: Viewport,
    pub popup_size: Option<Size>,
    attached: Vec<PopupTree>,
    cursor: Cursor,
    mutations: usize,
}

impl HeadlessDocument {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            selection: None,
            viewport,
            popup_size: None,
            attached: Vec::new(),
            cursor: Cursor::Default,
            mutations: 0,
        }
    }

    pub fn select(&mut self, text: impl Into<String>, rect: Rect) {
        self.selection = Some(Selection {
            text: text.into(),
            rect,
        });
    }

    pub fn attached(&self) -> &[PopupTree] {
        &self.attached
    }

    pub fn current(&self) -> Option<&PopupTree> {
        self.attached.last()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Count of attach/patch/detach/cursor calls so far.
    pub fn mutations(&self) -> usize {
        self.mutations
    }
}

impl Document for HeadlessDocument {
    fn selection(&self) -> Option<Selection> {
        self.selection.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn popup_size(&self, _session: SessionId) -> Option<Size> {
        self.popup_size
    }

    fn attach(&mut self, tree: &PopupTree) {
        self.mutations += 1;
        self.attached.push(tree.clone());
    }

    fn patch(&mut self, tree: &PopupTree) {
        self.mutations += 1;
        if let Some(existing) = self.attached.iter_mut().find(|t| t.session == tree.session) {
            *existing = tree.clone();
        }
    }

    fn detach(&mut self, session: SessionId) {
        self.mutations += 1;
        self.attached.retain(|t| t.session != session);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.mutations += 1;
        self.cursor = cursor;
    }
}
