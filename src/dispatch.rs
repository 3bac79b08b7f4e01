//! The runtime dispatcher.
//!
//! A [`Scheme`] maps a value's concrete type to its generated validator and
//! exposes the two stable entry points: `validate` for CREATE (old is
//! forced absent) and `validate_update` for UPDATE. Registration problems
//! are collected rather than panicking, and returned in preference to
//! running validation so configuration bugs are never masked by a clean
//! validation result.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::validate::path::FieldPath;
use crate::validate::{internal, ErrorList, Operation, OperationContext};

/// The signature of a generated root validator for `T`.
pub type ValidateFn<T> =
    fn(&OperationContext, &FieldPath, Option<&T>, Option<&T>) -> ErrorList;

type ErasedFn = Box<dyn Fn(&OperationContext, &dyn Any, Option<&dyn Any>) -> ErrorList>;

/// A registry of validation functions keyed by value type.
#[derive(Default)]
pub struct Scheme {
    validation_fns: HashMap<TypeId, ErasedFn>,
    registration_errors: ErrorList,
}

impl Scheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validation function for `T`. Last writer wins.
    pub fn add_validation<T: Any>(&mut self, f: ValidateFn<T>) {
        let erased: ErasedFn = Box::new(move |op, new, old| {
            let Some(new) = new.downcast_ref::<T>() else {
                return ErrorList::of(internal(
                    &FieldPath::root(),
                    "dispatcher value type mismatch",
                ));
            };
            let old = old.and_then(|o| o.downcast_ref::<T>());
            f(op, &FieldPath::root(), Some(new), old)
        });
        self.validation_fns.insert(TypeId::of::<T>(), erased);
    }

    /// Runs scheme setup functions, collecting their failures as
    /// registration errors.
    pub fn register(&mut self, setups: &[fn(&mut Scheme) -> Result<(), String>]) {
        for setup in setups {
            if let Err(cause) = setup(self) {
                self.registration_errors.push(internal(
                    &FieldPath::root(),
                    format!("registration error: {cause}"),
                ));
            }
        }
    }

    /// Validates a CREATE of `value`. The old value is forced absent.
    pub fn validate<T: Any>(
        &self,
        options: im::HashSet<String>,
        value: &T,
        subresources: &[String],
    ) -> ErrorList {
        if !self.registration_errors.is_empty() {
            return self.registration_errors.clone();
        }
        let op = OperationContext {
            operation: Operation::Create,
            options,
            subresources: subresources.to_vec(),
        };
        self.dispatch(&op, value, None)
    }

    /// Validates an UPDATE from `old` to `new`.
    pub fn validate_update<T: Any>(
        &self,
        options: im::HashSet<String>,
        new: &T,
        old: &T,
        subresources: &[String],
    ) -> ErrorList {
        if !self.registration_errors.is_empty() {
            return self.registration_errors.clone();
        }
        let op = OperationContext {
            operation: Operation::Update,
            options,
            subresources: subresources.to_vec(),
        };
        self.dispatch(&op, new, Some(old))
    }

    fn dispatch<T: Any>(
        &self,
        op: &OperationContext,
        new: &T,
        old: Option<&T>,
    ) -> ErrorList {
        match self.validation_fns.get(&TypeId::of::<T>()) {
            Some(f) => f(op, new, old.map(|o| o as &dyn Any)),
            None => ErrorList::new(),
        }
    }
}
