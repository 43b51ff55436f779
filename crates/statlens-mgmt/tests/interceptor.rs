#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use statlens_core::{CounterSpec, RecordingSpec, WindowKind};
use statlens_mgmt::{IncrementSite, Outcome, StatisticsCatalog, TargetType, Trigger};

fn target() -> TargetType {
    TargetType::named("mail::Sender")
}

#[test]
fn always_trigger_counts_every_outcome() {
    let catalog = StatisticsCatalog::new();
    let site = IncrementSite::new(target(), "Calls");

    assert!(site.hit(&catalog, Outcome::Returned, true, None));
    assert!(site.hit(&catalog, Outcome::Failed("Timeout"), true, None));
    assert_eq!(catalog.registry(&target()).unwrap().count("Calls"), Some(2));
}

#[test]
fn false_condition_skips() {
    let catalog = StatisticsCatalog::new();
    let site = IncrementSite::new(target(), "Calls");
    site.register(&catalog);

    assert!(!site.hit(&catalog, Outcome::Returned, false, None));
    assert_eq!(catalog.registry(&target()).unwrap().count("Calls"), Some(0));
}

#[test]
fn error_trigger_matches_kind() {
    let catalog = StatisticsCatalog::new();
    let site = IncrementSite::new(target(), "Timeouts").trigger(Trigger::OnError("Timeout".into()));

    assert!(!site.hit(&catalog, Outcome::Returned, true, None));
    assert!(!site.hit(&catalog, Outcome::Failed("Refused"), true, None));
    assert!(site.hit(&catalog, Outcome::Failed("Timeout"), true, None));
    assert_eq!(catalog.registry(&target()).unwrap().count("Timeouts"), Some(1));
}

#[test]
fn site_spec_shapes_new_counter() {
    let catalog = StatisticsCatalog::new();
    let spec = CounterSpec::new()
        .window(WindowKind::Minute)
        .recording(RecordingSpec::new("recipient"));
    let site = IncrementSite::new(target(), "Sent").spec(spec).amount(2);

    site.hit(&catalog, Outcome::Returned, true, Some(json!("a@example.com")));

    let stat = catalog.registry(&target()).unwrap().statistic("Sent").unwrap();
    assert_eq!(stat.count(), 2);
    assert!(stat.as_rolling().is_some());
    assert_eq!(stat.counter().recorded_history(), vec![json!("a@example.com")]);
}

#[test]
fn sites_on_one_target_share_a_registry() {
    let catalog = StatisticsCatalog::new();
    IncrementSite::new(target(), "Sent").register(&catalog);
    IncrementSite::new(target(), "Bounced").register(&catalog);

    assert_eq!(catalog.registries().len(), 1);
    assert_eq!(catalog.registry(&target()).unwrap().len(), 2);
}
