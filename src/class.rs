//! Classes, instances and method resolution.
//!
//! A class lists zero or more mixins.  Lookups check the class's own table
//! first, then each mixin in declaration order, depth‑first; the first hit
//! wins.  Name collisions between mixins are not diagnosed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::value::{Callable, LoxFunction, Value};

/// Name of the method run on instantiation.
pub const INITIALIZER: &str = "init";

pub type MethodTable<'a> = HashMap<String, Rc<LoxFunction<'a>>>;

pub struct LoxClass<'a> {
    name: String,
    superclasses: Vec<Rc<LoxClass<'a>>>,
    methods: MethodTable<'a>,
    getters: MethodTable<'a>,
    statics: MethodTable<'a>,
}

impl<'a> LoxClass<'a> {
    pub fn new(
        name: impl Into<String>,
        superclasses: Vec<Rc<LoxClass<'a>>>,
        methods: MethodTable<'a>,
        getters: MethodTable<'a>,
        statics: MethodTable<'a>,
    ) -> Self {
        LoxClass {
            name: name.into(),
            superclasses,
            methods,
            getters,
            statics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct mixins, in declaration order.
    pub fn superclasses(&self) -> &[Rc<LoxClass<'a>>] {
        &self.superclasses
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction<'a>>> {
        self.find(name, |class| &class.methods)
    }

    pub fn find_getter(&self, name: &str) -> Option<Rc<LoxFunction<'a>>> {
        self.find(name, |class| &class.getters)
    }

    pub fn find_static(&self, name: &str) -> Option<Rc<LoxFunction<'a>>> {
        self.find(name, |class| &class.statics)
    }

    /// Own table, then each mixin depth‑first in declaration order.
    fn find(
        &self,
        name: &str,
        table: for<'c> fn(&'c LoxClass<'a>) -> &'c MethodTable<'a>,
    ) -> Option<Rc<LoxFunction<'a>>> {
        if let Some(function) = table(self).get(name) {
            return Some(Rc::clone(function));
        }

        self.superclasses
            .iter()
            .find_map(|superclass| superclass.find(name, table))
    }
}

impl<'a> fmt::Debug for LoxClass<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mixins: Vec<&str> = self.superclasses.iter().map(|c| c.name()).collect();

        f.debug_struct("LoxClass")
            .field("name", &self.name)
            .field("mixins", &mixins)
            .finish()
    }
}

impl<'a> Callable<'a> for Rc<LoxClass<'a>> {
    /// Arity of the resolved `init`, or 0 without one.
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |initializer| initializer.arity())
    }

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>> {
        debug!("Instantiating class '{}'", self.name);

        let instance: Value<'a> =
            Value::Instance(Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self)))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

/// What a property read on an instance found.
#[derive(Debug)]
pub enum Property<'a> {
    Field(Value<'a>),
    /// Method bound to the instance, returned as a callable value.
    Method(LoxFunction<'a>),
    /// Getter bound to the instance; the caller invokes it.
    Getter(LoxFunction<'a>),
}

pub struct LoxInstance<'a> {
    class: Rc<LoxClass<'a>>,
    fields: HashMap<String, Value<'a>>,
}

impl<'a> LoxInstance<'a> {
    pub fn new(class: Rc<LoxClass<'a>>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass<'a>> {
        &self.class
    }

    /// Create or overwrite a field.
    pub fn set(&mut self, name: &str, value: Value<'a>) {
        self.fields.insert(name.to_string(), value);
    }

    /// Resolve `name`: own field, then method, then getter.
    pub fn get(instance: &Rc<RefCell<LoxInstance<'a>>>, name: &str) -> Option<Property<'a>> {
        let this: Value<'a> = Value::Instance(Rc::clone(instance));
        let instance = instance.borrow();

        if let Some(value) = instance.fields.get(name) {
            return Some(Property::Field(value.clone()));
        }

        if let Some(method) = instance.class.find_method(name) {
            return Some(Property::Method(method.bind(this)));
        }

        let getter: Option<Rc<LoxFunction<'a>>> = instance.class.find_getter(name);

        getter.map(|getter| Property::Getter(getter.bind(this)))
    }
}

impl<'a> fmt::Debug for LoxInstance<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}
