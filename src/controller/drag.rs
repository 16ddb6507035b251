//! In-flight reorder gesture (client-side only)

/// Which input path started the gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragVia {
    Pointer,
    Touch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    pub profile_id: String,
    pub from: usize,
    pub hover: Option<usize>,
    pub via: DragVia,
}

impl DragState {
    pub fn new(profile_id: impl Into<String>, from: usize, via: DragVia) -> Self {
        Self {
            profile_id: profile_id.into(),
            from,
            hover: Some(from),
            via,
        }
    }

    /// Drop target currently highlighted, if different from the source
    pub fn target(&self) -> Option<usize> {
        self.hover.filter(|&hover| hover != self.from)
    }
}
