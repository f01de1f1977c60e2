//! Two-Tier Variable Environment
//!
//! Name resolution checks the innermost call-local frame first, then the
//! process-global map. Writes go to whichever tier already binds the
//! name; a fresh name binds globally when no local frame exists, locally
//! otherwise. A name never changes between scalar and array.

use std::collections::HashMap;

use crate::ast::types::Position;
use crate::interpreter::errors::EvalError;
use crate::interpreter::value::Value;

/// The variable environment: process globals plus a stack of per-call
/// local frames, of which only the innermost is visible.
#[derive(Debug, Default)]
pub struct Environment {
    globals: HashMap<String, Value>,
    frames: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a name: innermost locals first, then globals.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.get(name) {
                return Some(value);
            }
        }
        self.globals.get(name)
    }

    /// Mutable lookup with the same resolution order as `get`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        if let Some(frame) = self.frames.last_mut() {
            if frame.contains_key(name) {
                return frame.get_mut(name);
            }
        }
        self.globals.get_mut(name)
    }

    /// Bind `name` to `value` following the write-through rule. Rebinding
    /// a scalar name to an array or vice versa is a type error.
    pub fn set(&mut self, name: &str, value: Value, pos: Position) -> Result<(), EvalError> {
        let slot = self.resolve_write_slot(name);
        if let Some(existing) = slot.get(name) {
            if existing.is_array() != value.is_array() {
                let message = if value.is_array() {
                    format!("cannot use scalar '{}' as an array", name)
                } else {
                    format!("cannot use array '{}' as a scalar", name)
                };
                return Err(EvalError::type_error(pos, message));
            }
        }
        slot.insert(name.to_string(), value);
        Ok(())
    }

    /// The map a write to `name` lands in: the tier that already binds it,
    /// else globals when no local frame exists, else the local frame.
    fn resolve_write_slot(&mut self, name: &str) -> &mut HashMap<String, Value> {
        let in_frame = self
            .frames
            .last()
            .map_or(false, |frame| frame.contains_key(name));
        if in_frame {
            return self.frames.last_mut().unwrap();
        }
        if self.globals.contains_key(name) || self.frames.is_empty() {
            return &mut self.globals;
        }
        self.frames.last_mut().unwrap()
    }

    /// Resolve `name` to its array map, binding a fresh empty array when
    /// the name is unbound. A scalar binding is a type error.
    pub fn ensure_array(&mut self, name: &str, pos: Position) -> Result<&mut Value, EvalError> {
        if self.get(name).is_none() {
            self.set(name, Value::Array(Default::default()), pos)?;
        }
        let value = self.get_mut(name).unwrap();
        if !value.is_array() {
            return Err(EvalError::type_error(
                pos,
                format!("cannot use scalar '{}' as an array", name),
            ));
        }
        Ok(value)
    }

    /// Enter a function call: push its local frame.
    pub fn push_frame(&mut self, frame: HashMap<String, Value>) {
        self.frames.push(frame);
    }

    /// Leave a function call.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// The process-global map, exposed for hosts and tests.
    pub fn globals(&self) -> &HashMap<String, Value> {
        &self.globals
    }
}
