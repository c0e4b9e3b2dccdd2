#![forbid(unsafe_code)]

//! Fake UI element: an id plus a mutable attribute bag.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use vigil_runtime::{BoundElement, ElementRef};

#[derive(Debug, Default)]
pub struct FakeElement {
    id: String,
    attributes: RefCell<BTreeMap<String, String>>,
}

impl FakeElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: RefCell::default(),
        }
    }

    /// Field element bound to `route` via the default `validate-property`
    /// attribute.
    pub fn field(id: impl Into<String>, route: &str) -> Self {
        Self::new(id).with_attribute("validate-property", route)
    }

    #[must_use]
    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.borrow_mut().insert(name.into(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow_mut().remove(name)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn into_ref(self) -> ElementRef {
        Rc::new(self)
    }
}

impl BoundElement for FakeElement {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Id of `element` if it is a [`FakeElement`], else `"?"`.
pub fn element_id(element: &dyn BoundElement) -> String {
    element
        .as_any()
        .downcast_ref::<FakeElement>()
        .map_or_else(|| "?".to_owned(), |fake| fake.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_are_mutable_after_construction() {
        let el = FakeElement::field("name-input", "name");
        assert_eq!(el.attribute("validate-property").as_deref(), Some("name"));
        el.set_attribute("view-strategy", "tooltip");
        assert_eq!(el.remove_attribute("view-strategy").as_deref(), Some("tooltip"));
        assert!(el.attribute("view-strategy").is_none());
    }

    #[test]
    fn element_id_downcasts() {
        let el = FakeElement::new("summary").into_ref();
        assert_eq!(element_id(el.as_ref()), "summary");
    }
}
