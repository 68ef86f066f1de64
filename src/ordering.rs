// src/ordering.rs

use crate::error::LayoutError;

/// Move the element at `from` to position `to`, shifting the elements in
/// between by one. The set of elements never changes.
pub fn reorder<T>(list: &mut Vec<T>, from: usize, to: usize) -> Result<(), LayoutError> {
    let len = list.len();
    for index in [from, to] {
        if index >= len {
            return Err(LayoutError::IndexOutOfBounds { index, len });
        }
    }
    if from != to {
        let item = list.remove(from);
        list.insert(to, item);
    }
    Ok(())
}

/// Drag-and-drop state for the column ordering list. Each hover over a new
/// row moves the dragged row there immediately, so the list is always a
/// valid permutation mid-gesture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DragGesture {
    dragged: Option<usize>,
}

impl DragGesture {
    pub fn start(&mut self, index: usize) {
        self.dragged = Some(index);
    }

    /// Pointer is over row `index`. Returns true when the list changed.
    pub fn over<T>(&mut self, list: &mut Vec<T>, index: usize) -> Result<bool, LayoutError> {
        let Some(from) = self.dragged else {
            return Ok(false);
        };
        if from == index {
            return Ok(false);
        }
        reorder(list, from, index)?;
        self.dragged = Some(index);
        Ok(true)
    }

    pub fn end(&mut self) {
        self.dragged = None;
    }

    pub fn dragged(&self) -> Option<usize> {
        self.dragged
    }
}
