#![forbid(unsafe_code)]

//! Bound elements and the readers for their declarative attributes.
//!
//! An element declares what it validates through attributes: the property
//! route it is bound to, the strategy that renders it, and a JSON option bag.
//! Attribute names are configurable through [`ElementAttributes`].

use std::any::Any;
use std::rc::Rc;

use vigil_core::{PropertyRoute, Value};

use crate::strategy::ViewOptions;

/// A UI element a directive is attached to.
pub trait BoundElement {
    /// Raw attribute value, if the attribute is present.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Concrete element, for strategies that render into it.
    fn as_any(&self) -> &dyn Any;
}

pub type ElementRef = Rc<dyn BoundElement>;

/// Attribute names the element readers look at.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "options-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct ElementAttributes {
    pub property_route: String,
    pub view_strategy: String,
    pub view_options: String,
    pub summary_strategy: String,
    pub summary_options: String,
}

impl Default for ElementAttributes {
    fn default() -> Self {
        Self {
            property_route: "validate-property".into(),
            view_strategy: "view-strategy".into(),
            view_options: "view-options".into(),
            summary_strategy: "summary-strategy".into(),
            summary_options: "summary-options".into(),
        }
    }
}

impl ElementAttributes {
    #[must_use]
    pub fn property_route_from(&self, element: &dyn BoundElement) -> Option<PropertyRoute> {
        element
            .attribute(&self.property_route)
            .and_then(|raw| PropertyRoute::parse(&raw))
    }

    #[must_use]
    pub fn view_strategy_from(&self, element: &dyn BoundElement) -> Option<String> {
        non_blank(element.attribute(&self.view_strategy))
    }

    #[must_use]
    pub fn view_options_from(&self, element: &dyn BoundElement) -> ViewOptions {
        parse_options(&self.view_options, element.attribute(&self.view_options))
    }

    #[must_use]
    pub fn summary_strategy_from(&self, element: &dyn BoundElement) -> Option<String> {
        non_blank(element.attribute(&self.summary_strategy))
    }

    #[must_use]
    pub fn summary_options_from(&self, element: &dyn BoundElement) -> ViewOptions {
        parse_options(&self.summary_options, element.attribute(&self.summary_options))
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_options(attribute: &str, raw: Option<String>) -> ViewOptions {
    let Some(raw) = non_blank(raw) else {
        return ViewOptions::new();
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(options)) => options,
        Ok(other) => {
            tracing::warn!(attribute, found = %other, "option bag is not a JSON object; ignoring");
            ViewOptions::new()
        }
        Err(err) => {
            tracing::warn!(attribute, error = %err, "option bag is not valid JSON; ignoring");
            ViewOptions::new()
        }
    }
}
