//! Type-erased values stored in channels and node parameters.

use std::any::Any;
use std::fmt;

/// A cloneable, comparable value behind a trait object.
pub(crate) trait DynValue: Any + fmt::Debug {
    fn eq_dyn(&self, other: &dyn DynValue) -> bool;
    fn clone_box(&self) -> Box<dyn DynValue>;
    fn as_any(&self) -> &dyn Any;
}

impl<T> DynValue for T
where
    T: Any + Clone + PartialEq + fmt::Debug,
{
    fn eq_dyn(&self, other: &dyn DynValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn clone_box(&self) -> Box<dyn DynValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
