#![forbid(unsafe_code)]

//! Plugin install: register the directives with a host's directive table.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::config::PluginConfig;
use crate::directives::{Directive, ShowErrorDirective, ValidationSummaryDirective};
use crate::strategy::{SummaryStrategyRegistry, ViewStrategyRegistry};

/// Directive name for field bindings.
pub const SHOW_ERROR: &str = "show-error";

/// Directive name for summaries.
pub const VALIDATION_SUMMARY: &str = "validation-summary";

/// Name → directive table owned by the host framework.
#[derive(Default)]
pub struct DirectiveTable {
    directives: BTreeMap<String, Rc<dyn Directive>>,
}

impl fmt::Debug for DirectiveTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.directives.keys()).finish()
    }
}

impl DirectiveTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, directive: Rc<dyn Directive>) {
        self.directives.insert(name.into(), directive);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<dyn Directive>> {
        self.directives.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }
}

/// The validation plugin: strategy registries plus configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationPlugin {
    config: PluginConfig,
    view_strategies: Rc<ViewStrategyRegistry>,
    summary_strategies: Rc<SummaryStrategyRegistry>,
}

impl ValidationPlugin {
    pub fn new(
        view_strategies: Rc<ViewStrategyRegistry>,
        summary_strategies: Rc<SummaryStrategyRegistry>,
    ) -> Self {
        Self {
            config: PluginConfig::default(),
            view_strategies,
            summary_strategies,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PluginConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    #[must_use]
    pub fn show_error(&self) -> ShowErrorDirective {
        ShowErrorDirective::new(Rc::clone(&self.view_strategies))
            .with_default_strategy(self.config.defaults.view_strategy.clone())
            .with_attributes(self.config.attributes.clone())
    }

    #[must_use]
    pub fn validation_summary(&self) -> ValidationSummaryDirective {
        ValidationSummaryDirective::new(Rc::clone(&self.summary_strategies))
            .with_default_strategy(self.config.defaults.summary_strategy.clone())
            .with_attributes(self.config.attributes.clone())
    }

    /// Register `show-error` and `validation-summary` on `table`.
    pub fn install(&self, table: &mut DirectiveTable) {
        table.register(SHOW_ERROR, Rc::new(self.show_error()));
        table.register(VALIDATION_SUMMARY, Rc::new(self.validation_summary()));
        tracing::debug!(
            view_strategies = self.view_strategies.names().count(),
            summary_strategies = self.summary_strategies.names().count(),
            "validation plugin installed"
        );
    }
}
