//! Traversal frames for nested fields
//!
//! Every `push` saves the position of the enclosing container in a
//! [`Frame`]; the matching `pop` restores it. The stack therefore always
//! mirrors the chain of containers between the root field and the current
//! one.

use crate::model::Node;

/// Saved position in an enclosing container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) parent: Option<Node>,
    pub(crate) field_index: usize,
    pub(crate) num_nested: Option<usize>,
    pub(crate) push_marker: usize,
    pub(crate) pop_marker: Option<usize>,
}

/// LIFO stack of [`Frame`]s.
#[derive(Clone, Debug, Default)]
pub(crate) struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    #[inline]
    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame)
    }

    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of containers currently open
    #[inline]
    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn clear(&mut self) {
        self.frames.clear()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lifo() {
        let frame = |i| Frame {
            parent: None,
            field_index: i,
            num_nested: Some(i),
            push_marker: 0,
            pop_marker: None,
        };
        let mut stack = FrameStack::default();
        stack.push(frame(1));
        stack.push(frame(2));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().map(|f| f.field_index), Some(2));
        assert_eq!(stack.pop().map(|f| f.field_index), Some(1));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }
}
