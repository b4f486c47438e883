use serde::{Deserialize, Serialize};

/// Position within a scenario's node sequence.
///
/// Cursors are values: moving returns a new cursor and leaves the old one
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowCursor {
  index: usize,
  len: usize,
}

/// Outcome of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
  Moved(FlowCursor),
  /// The cursor was on the last node; the scenario is complete.
  Finished,
}

impl FlowCursor {
  /// Cursor at the start of a sequence of `len` nodes.
  pub fn new(len: usize) -> Self {
    Self { index: 0, len }
  }

  /// Cursor at `index`, if it is in bounds.
  pub fn at(index: usize, len: usize) -> Option<Self> {
    (index < len).then_some(Self { index, len })
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn in_bounds(&self) -> bool {
    self.index < self.len
  }

  pub fn is_first(&self) -> bool {
    self.in_bounds() && self.index == 0
  }

  pub fn is_last(&self) -> bool {
    self.in_bounds() && self.index + 1 == self.len
  }

  pub fn next(self) -> CursorMove {
    if self.index + 1 < self.len {
      CursorMove::Moved(Self {
        index: self.index + 1,
        len: self.len,
      })
    } else {
      CursorMove::Finished
    }
  }

  /// Step back; `None` at the first node (the caller decides whether that
  /// means leaving the flow).
  pub fn previous(self) -> Option<Self> {
    if self.index == 0 || !self.in_bounds() {
      return None;
    }
    Some(Self {
      index: self.index - 1,
      len: self.len,
    })
  }

  pub fn jump(self, index: usize) -> Option<Self> {
    Self::at(index, self.len)
  }
}
