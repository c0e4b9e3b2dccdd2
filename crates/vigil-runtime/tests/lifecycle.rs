//! Owner lifecycle: group creation, model read-through, teardown, plugin.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::json;
use vigil_harness::{
    FakeElement, RecordingSummaryStrategy, RecordingViewStrategy, RuleTable, init_test_logging,
    rules, summary_registry, view_registry,
};
use vigil_runtime::{
    BindingValue, ComponentHost, ComponentState, ComputedValues, Directive, DirectiveTable,
    GroupOptions, GroupSettings, ModelSource, PluginConfig, PropertyRoute, SHOW_ERROR,
    VALIDATION_SUMMARY, ValidateWith, ValidationPlugin, VirtualModel,
};

fn host_with_param() -> ComponentState {
    ComponentState::new(BTreeMap::from([("name".to_owned(), json!("Ada"))]))
        .with_props(BTreeMap::from([("age".to_owned(), json!("forty"))]))
}

#[test]
fn params_are_absent_unless_enabled() {
    init_test_logging();
    let host = host_with_param();
    let model = VirtualModel::for_host(&host, &GroupOptions::default());
    assert_eq!(model.get("age"), None);

    // Absent means the number rule has nothing to reject.
    let table = Rc::new(RuleTable::new().rule("age", rules::number("not a number")));
    let _ctx = ValidateWith::new(table.clone())
        .with_options(GroupOptions::default().with_validate_on_start(true))
        .created(&host);
    let group = table.last_group().expect("group built");
    assert_eq!(group.outcome(&PropertyRoute::new("age")), Some(None));
}

#[test]
fn params_are_read_when_enabled() {
    init_test_logging();
    let host = host_with_param();
    let table = Rc::new(RuleTable::new().rule("age", rules::number("not a number")));
    let _ctx = ValidateWith::new(table.clone())
        .with_options(
            GroupOptions::default()
                .with_validate_on_start(true)
                .with_validate_props(true),
        )
        .created(&host);
    let group = table.last_group().expect("group built");
    assert_eq!(
        group.outcome(&PropertyRoute::new("age")),
        Some(Some("not a number".into()))
    );
}

#[test]
fn computed_values_follow_props_in_lookup_order() {
    init_test_logging();
    let host = ComponentState::default()
        .with_props(BTreeMap::from([("label".to_owned(), json!("from props"))]))
        .with_computed(
            ComputedValues::new()
                .with("label", || json!("from computed"))
                .with("total", || json!(3)),
        );
    let all = GroupOptions::default()
        .with_validate_props(true)
        .with_validate_computed(true);
    let model = VirtualModel::for_host(&host, &all);
    assert_eq!(model.get("label"), Some(json!("from props")));
    assert_eq!(model.get("total"), Some(json!(3)));

    let own_only = VirtualModel::for_host(&host, &GroupOptions::default());
    assert_eq!(own_only.get("total"), None);
}

#[test]
fn options_reach_the_engine() {
    init_test_logging();
    let table = Rc::new(RuleTable::new().rule("name", rules::required("required")));
    let host = ComponentState::default();
    let _ctx = ValidateWith::new(table.clone())
        .with_options(
            GroupOptions::default()
                .with_reactive_validation(true)
                .with_validate_on_start(true),
        )
        .created(&host);
    let group = table.last_group().expect("group built");
    assert_eq!(
        group.settings(),
        GroupSettings {
            reactive: true,
            validate_on_start: true
        }
    );
    assert_eq!(
        group.outcome(&PropertyRoute::new("name")),
        Some(Some("required".into()))
    );
}

#[test]
fn model_state_changed_reports_validity_flips() {
    init_test_logging();
    let table = Rc::new(RuleTable::new().rule("name", rules::required("required")));
    let host = ComponentState::default();
    let ctx = ValidateWith::new(table.clone())
        .with_options(GroupOptions::default().with_reactive_validation(true))
        .created(&host);
    let view = Rc::new(RecordingViewStrategy::new());
    let plugin = ValidationPlugin::new(view_registry(&view), Rc::default());
    let el = FakeElement::field("name-input", "name").into_ref();
    plugin.show_error().bind(&el, &BindingValue::None, &ctx);

    let flips = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&flips);
    let _watch = ctx
        .model_state_changed()
        .subscribe(move |change| sink.borrow_mut().push((change.is_valid, change.errors.len())));

    host.set("name", json!(""));
    host.set("name", json!("  "));
    host.set("name", json!("Ada"));
    assert_eq!(*flips.borrow(), vec![(false, 1), (true, 0)]);
}

#[test]
fn teardown_cancels_everything_then_releases_once() {
    init_test_logging();
    let table = Rc::new(RuleTable::new().rule("name", rules::required("required")));
    let host = ComponentState::default();
    let ctx = ValidateWith::new(table.clone())
        .with_options(GroupOptions::default().with_reactive_validation(true))
        .created(&host);
    let group = table.last_group().expect("group built");

    let view = Rc::new(RecordingViewStrategy::new());
    let summary = Rc::new(RecordingSummaryStrategy::new());
    let plugin = ValidationPlugin::new(view_registry(&view), summary_registry(&summary));
    let field = FakeElement::field("name-input", "name").into_ref();
    let container = FakeElement::new("summary").into_ref();
    plugin.show_error().bind(&field, &BindingValue::None, &ctx);
    plugin
        .validation_summary()
        .bind(&container, &BindingValue::None, &ctx);
    assert_eq!(ctx.outstanding_subscriptions(), 2);

    assert!(ctx.destroy());
    assert!(!ctx.destroy());
    assert_eq!(ctx.outstanding_subscriptions(), 0);
    assert_eq!(group.release_calls(), 1);
    assert_eq!(group.subscriber_count(), 0);

    host.set("name", json!(""));
    assert!(view.is_empty());
    assert_eq!(summary.len(), 1, "only the setup call");

    drop(ctx);
    assert_eq!(group.release_calls(), 1);
}

#[test]
fn dropping_the_context_tears_down() {
    init_test_logging();
    let table = Rc::new(RuleTable::new().rule("name", rules::required("required")));
    let host = ComponentState::default();
    let ctx = ValidateWith::new(table.clone()).created(&host);
    let group = table.last_group().expect("group built");
    drop(ctx);
    assert_eq!(group.release_calls(), 1);
}

#[test]
fn plugin_installs_directives_with_configured_defaults() {
    init_test_logging();
    let view = Rc::new(RecordingViewStrategy::new());
    let mut config = PluginConfig::default();
    config.defaults.view_strategy = "tooltip".into();
    config.attributes.property_route = "data-route".into();
    let registry = Rc::new(
        vigil_runtime::ViewStrategyRegistry::new()
            .with("tooltip", Rc::clone(&view) as Rc<dyn vigil_runtime::ViewStrategy>),
    );
    let plugin = ValidationPlugin::new(registry, Rc::default()).with_config(config);

    let mut table = DirectiveTable::new();
    plugin.install(&mut table);
    assert!(table.get(SHOW_ERROR).is_some());
    assert!(table.get(VALIDATION_SUMMARY).is_some());

    let engine = Rc::new(RuleTable::new().rule("name", rules::required("required")));
    let host = ComponentState::default();
    let ctx = ValidateWith::new(engine.clone()).created(&host);
    let show_error = table.get(SHOW_ERROR).expect("installed");
    let el = FakeElement::new("name-input")
        .with_attribute("data-route", "name")
        .into_ref();
    assert!(show_error.bind(&el, &BindingValue::None, &ctx).is_bound());

    engine.last_group().expect("group built").validate();
    assert_eq!(view.len(), 1);
}

#[test]
fn component_without_the_mixin_can_still_summarise() {
    init_test_logging();
    let table = RuleTable::new().rule("name", rules::required("required"));
    let host = ComponentState::default();
    let group = table.group(host.own_state(), GroupSettings::default());
    let summary = Rc::new(RecordingSummaryStrategy::new());
    let plugin = ValidationPlugin::new(Rc::default(), summary_registry(&summary));
    let ctx = vigil_runtime::ValidationContext::detached();
    let container = FakeElement::new("summary").into_ref();

    plugin
        .validation_summary()
        .bind(&container, &BindingValue::Group(group.clone()), &ctx);
    group.validate();
    assert_eq!(summary.len(), 2);
    drop(ctx);
    assert_eq!(group.subscriber_count(), 0);
    assert_eq!(group.release_calls(), 0, "a borrowed group is not released");
}
