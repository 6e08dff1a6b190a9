//! Environment chain: one frame per block, call, and class body.
//!
//! Frames are shared (`Rc<RefCell<_>>`), never copied.  Every closure created
//! while a frame is active holds the same frame, so writes through one
//! closure are visible through all of them.  Links only point outward, so
//! plain reference counting is enough.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

/// Why a lookup or assignment failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupError {
    /// Name not bound in any frame searched.
    Undefined,
    /// Name declared with `var x;` and read before being assigned.
    Uninitialized,
}

#[derive(Debug, Default)]
pub struct Environment<'a> {
    /// `None` marks a declared‑but‑uninitialized binding (distinct from `nil`).
    values: HashMap<String, Option<Value<'a>>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    /// A root frame (the globals).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> EnvRef<'a> {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<EnvRef<'a>> {
        self.enclosing.clone()
    }

    /// Bind (or rebind) `name` in this frame.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), Some(value));
    }

    /// Bind `name` in this frame without a value.
    pub fn declare(&mut self, name: &str) {
        self.values.insert(name.to_string(), None);
    }

    /// Look `name` up in this frame, then outward.
    pub fn get(&self, name: &str) -> Result<Value<'a>, LookupError> {
        match self.values.get(name) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(LookupError::Uninitialized),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(LookupError::Undefined),
            },
        }
    }

    /// Overwrite an existing binding, searching outward.  Assigning to an
    /// uninitialized binding initializes it.
    pub fn assign(&mut self, name: &str, value: Value<'a>) -> Result<(), LookupError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = Some(value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LookupError::Undefined)
        }
    }

    /// Read `name` from this frame only.
    fn get_here(&self, name: &str) -> Result<Value<'a>, LookupError> {
        match self.values.get(name) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(LookupError::Uninitialized),
            None => Err(LookupError::Undefined),
        }
    }
}

/// Walk `distance` links outward from `env`.
pub fn ancestor<'a>(env: &EnvRef<'a>, distance: usize) -> Option<EnvRef<'a>> {
    let mut current: EnvRef<'a> = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef<'a> = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` from the frame exactly `distance` hops out.  No further
/// searching: the resolver already decided which frame owns the name.
pub fn get_at<'a>(env: &EnvRef<'a>, distance: usize, name: &str) -> Result<Value<'a>, LookupError> {
    match ancestor(env, distance) {
        Some(frame) => frame.borrow().get_here(name),
        None => Err(LookupError::Undefined),
    }
}

/// Write `name` in the frame exactly `distance` hops out.
pub fn assign_at<'a>(
    env: &EnvRef<'a>,
    distance: usize,
    name: &str,
    value: Value<'a>,
) -> Result<(), LookupError> {
    let frame: EnvRef<'a> = ancestor(env, distance).ok_or(LookupError::Undefined)?;
    let mut frame = frame.borrow_mut();

    match frame.values.get_mut(name) {
        Some(slot) => {
            *slot = Some(value);
            Ok(())
        }
        None => Err(LookupError::Undefined),
    }
}
