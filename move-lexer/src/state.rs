//! State stack
//!
//!     The tokenizer carries a stack of frames between lines. Each frame names a state of the
//!     rule table and an optional parameter captured when the frame was pushed (the opening
//!     delimiter of a block, the prefix of a string literal). Two stacks are equal exactly when
//!     their frames are equal, which is what lets the line driver stop re-lexing once a line ends
//!     in the same state it ended in before an edit.
//!
//!     The bottom frame is always `root`. Popping a root-only stack is a no-op, and replacing
//!     the top of a root-only stack pushes instead, so no transition can remove `root`.

use crate::rules::{RuleTable, StateId};
use std::fmt::Write as _;
use std::sync::Arc;

/// One entry of the state stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    state: StateId,
    param: Option<Arc<str>>,
}

impl Frame {
    pub fn new(state: StateId, param: Option<Arc<str>>) -> Self {
        Self { state, param }
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }
}

/// Tokenizer state carried from the end of one line to the start of the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateStack {
    frames: Vec<Frame>,
}

impl Default for StateStack {
    fn default() -> Self {
        Self::root()
    }
}

impl StateStack {
    /// The state every document starts in.
    pub fn root() -> Self {
        Self {
            frames: vec![Frame::new(StateId::ROOT, None)],
        }
    }

    /// Builds a stack from explicit frames, with `root` prepended when missing.
    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        let mut stack = Self::root();
        for frame in frames {
            if stack.frames.len() == 1 && frame.state == StateId::ROOT {
                stack.frames[0] = frame;
                continue;
            }
            stack.frames.push(frame);
        }
        stack
    }

    pub fn top(&self) -> &Frame {
        // The root frame is never removed.
        &self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_root(&self) -> bool {
        self.frames.len() == 1
    }

    /// Pushes `frame` unless the stack already holds `max_depth` frames.
    ///
    /// Returns whether the push happened.
    pub(crate) fn push(&mut self, frame: Frame, max_depth: usize) -> bool {
        if self.frames.len() >= max_depth {
            return false;
        }
        self.frames.push(frame);
        true
    }

    pub(crate) fn pop(&mut self) -> bool {
        if self.is_root() {
            return false;
        }
        self.frames.pop();
        true
    }

    pub(crate) fn pop_all(&mut self) {
        self.frames.truncate(1);
    }

    pub(crate) fn replace_top(&mut self, frame: Frame, max_depth: usize) -> bool {
        if self.is_root() {
            return self.push(frame, max_depth);
        }
        let last = self.frames.len() - 1;
        self.frames[last] = frame;
        true
    }

    /// Renders the stack with state names, e.g. `root/moduleBody({)`.
    pub fn describe(&self, table: &RuleTable) -> String {
        let mut out = String::new();
        for (index, frame) in self.frames.iter().enumerate() {
            if index > 0 {
                out.push('/');
            }
            out.push_str(table.state_name(frame.state));
            if let Some(param) = frame.param() {
                let _ = write!(out, "({param})");
            }
        }
        out
    }
}
