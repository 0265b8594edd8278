//! Variable scopes.
//!
//! Frames live in an arena and refer to their parent by index.  A frame is pushed when a block
//! or a function call is entered and popped when it is left, so the arena behaves as a stack
//! whose top is always the current frame.

use std::collections::HashMap;

use tracing::trace;

use crate::eval::{RuntimeError, RuntimeErrorKind};
use crate::natives;
use crate::token::Token;
use crate::value::Value;

/// Index of a frame in the arena.
pub type FrameId = usize;

const GLOBAL: FrameId = 0;

#[derive(Debug, Clone, Default)]
struct Frame {
    values: HashMap<String, Value>,
    parent: Option<FrameId>,
}

/// Chain of frames from the innermost scope to the global one.
#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Frame>,
    current: FrameId,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Creates an environment holding a single empty global frame.
    pub fn new() -> Environment {
        Environment {
            frames: vec![Frame::default()],
            current: GLOBAL,
        }
    }

    /// Creates an environment whose global frame holds the native functions.
    pub fn global() -> Environment {
        let mut env = Environment::new();
        natives::install(&mut env);
        env
    }

    /// Bind `name` in the current frame, replacing any previous binding in that frame.
    pub fn define(&mut self, name: &str, value: Value) {
        self.frames[self.current]
            .values
            .insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        self.lookup(&name.lexeme)
            .cloned()
            .ok_or_else(|| undefined(name))
    }

    /// Rebind `name` in the innermost frame that already binds it.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let id = self.resolve(&name.lexeme).ok_or_else(|| undefined(name))?;
        self.frames[id].values.insert(name.lexeme.clone(), value);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.resolve(name)
            .and_then(|id| self.frames[id].values.get(name))
    }

    /// Enter a new scope nested in the current one.
    pub fn push_frame(&mut self) -> FrameId {
        let id = self.frames.len();
        self.frames.push(Frame {
            values: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = id;
        trace!(frame = id, "push frame");
        id
    }

    /// Leave the current scope.  The global frame is never popped.
    pub fn pop_frame(&mut self) {
        if self.current == GLOBAL {
            return;
        }
        debug_assert_eq!(self.current, self.frames.len() - 1);
        trace!(frame = self.current, "pop frame");
        if let Some(frame) = self.frames.pop() {
            self.current = frame.parent.unwrap_or(GLOBAL);
        }
    }

    /// Number of frames in the chain, the global one included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn resolve(&self, name: &str) -> Option<FrameId> {
        let mut id = Some(self.current);
        while let Some(i) = id {
            let frame = &self.frames[i];
            if frame.values.contains_key(name) {
                return Some(i);
            }
            id = frame.parent;
        }
        None
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(
        name.clone(),
        RuntimeErrorKind::UndefinedVariable(name.lexeme.clone()),
    )
}
