#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use statlens_core::{Counter, CounterSpec, LogLevel, RecordingSpec, RollingWindowCounter, WindowKind};
use statlens_mgmt::{ManagementRegistry, TargetType};

fn registry() -> ManagementRegistry {
    let target = TargetType::named("billing::Invoice");
    let address = target.default_address(".stats");
    ManagementRegistry::new(target, address)
}

#[test]
fn reset_all_then_reset_one() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());
    reg.add_counter("B", Counter::new("B").into());

    reg.increment("A", 2, None);
    reg.increment("B", 3, None);
    reg.reset_all();
    assert_eq!(reg.count("A"), Some(0));
    assert_eq!(reg.count("B"), Some(0));

    reg.increment("A", 1, None);
    reg.increment("B", 1, None);
    reg.reset("A").unwrap();
    assert_eq!(reg.count("A"), Some(0));
    assert_eq!(reg.count("B"), Some(1));
}

#[test]
fn duplicate_add_keeps_first() {
    let reg = registry();
    assert!(reg.add_counter("A", Counter::new("A").into()));
    reg.increment("A", 5, None);
    assert!(!reg.add_counter("A", Counter::new("A").into()));
    assert_eq!(reg.count("A"), Some(5));
    assert_eq!(reg.len(), 1);
    assert_eq!(reg.names(), vec!["A".to_string()]);
}

#[test]
fn unknown_names_are_not_found() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());

    assert_eq!(reg.increment("missing", 1, None), None);
    assert_eq!(reg.reset("missing").unwrap_err().code().as_str(), "NOT_FOUND");
    assert_eq!(reg.attribute("missing").unwrap_err().code().as_str(), "NOT_FOUND");
    assert_eq!(
        reg.invoke("Reset: missing", &[]).unwrap_err().code().as_str(),
        "NOT_FOUND"
    );
    assert_eq!(reg.invoke("Explode All", &[]).unwrap_err().code().as_str(), "NOT_FOUND");
}

#[test]
fn attributes_by_composed_name() {
    let reg = registry();
    let spec = CounterSpec::new()
        .window(WindowKind::Minute)
        .log_level(LogLevel::Info)
        .recording(RecordingSpec::new("amount"));
    reg.add_counter("Created", spec.build("Created", None));

    reg.increment("Created", 1, Some(json!(12.5)));
    reg.increment("Created", 1, Some(json!(7)));

    assert_eq!(reg.attribute("Created").unwrap().as_u64(), Some(2));
    assert_eq!(reg.attribute("Created: Logging Level").unwrap().as_str(), Some("INFO"));
    assert_eq!(reg.attribute("Created: Rolling Avg Window").unwrap().as_str(), Some("1m"));
    assert_eq!(reg.attribute("Created: Rolling Avg").unwrap().as_u64(), Some(2));

    let recorded = reg.attribute("Created: Recorded (amount)").unwrap();
    assert_eq!(
        serde_json::to_value(&recorded).unwrap(),
        json!([12.5, 7])
    );
}

#[test]
fn plain_counter_lists_no_rolling_descriptors() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());
    let info = reg.info();

    assert!(info.has_attribute("A"));
    assert!(!info.has_attribute("A: Logging Level"));
    assert!(!info.has_attribute("A: Rolling Avg"));
    assert!(info.has_operation("Reset: A"));
    assert!(info.has_operation("Disable: A"));
    assert!(!info.has_operation("Enable: A"));
    assert!(info.has_operation("Enable Logging: A"));
    assert!(!info.has_operation("Set Time Window: A"));
    assert!(!info.has_operation("Disable Rolling: A"));
    for bulk in ["Reset All", "Enable All", "Disable All", "Set Time Window For All"] {
        assert!(info.has_operation(bulk), "{bulk} must always be listed");
    }
}

#[test]
fn disable_hides_count_and_flips_operations() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());

    reg.invoke("Disable: A", &[]).unwrap();
    let info = reg.info();
    assert!(!info.has_attribute("A"));
    assert!(info.has_operation("Enable: A"));
    assert!(!info.has_operation("Disable: A"));
    assert_eq!(reg.increment("A", 1, None), Some(0));

    reg.invoke("Enable: A", &[]).unwrap();
    let info = reg.info();
    assert!(info.has_attribute("A"));
    assert!(info.has_operation("Disable: A"));
}

#[test]
fn logging_operations_flip_visibility() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());

    reg.invoke("Enable Logging: A", &[]).unwrap();
    let info = reg.info();
    assert!(info.has_attribute("A: Logging Level"));
    assert!(info.has_operation("Disable Logging: A"));
    assert!(!info.has_operation("Enable Logging: A"));
    assert_eq!(reg.attribute("A: Logging Level").unwrap().as_str(), Some("DEBUG"));

    reg.invoke("Disable All Logging", &[]).unwrap();
    assert!(!reg.info().has_attribute("A: Logging Level"));
}

#[test]
fn rolling_operations_follow_the_window() {
    let reg = registry();
    reg.add_counter("R", RollingWindowCounter::new("R", WindowKind::None).into());

    let info = reg.info();
    assert!(info.has_operation("Enable Rolling: R"));
    assert!(!info.has_operation("Disable Rolling: R"));
    assert!(info.has_operation("Set Time Window: R"));
    assert!(!info.has_attribute("R: Rolling Avg"));

    reg.invoke("Set Time Window: R", &[json!(90)]).unwrap();
    let info = reg.info();
    assert!(info.has_operation("Disable Rolling: R"));
    assert!(!info.has_operation("Enable Rolling: R"));
    assert!(info.has_attribute("R: Rolling Avg"));
    assert_eq!(reg.attribute("R: Rolling Avg Window").unwrap().as_str(), Some("1m 30s"));

    let r = reg.statistic("R").unwrap();
    assert!(r.as_rolling().unwrap().is_rolling());

    reg.invoke("Disable Rolling: R", &[]).unwrap();
    assert!(!reg.info().has_attribute("R: Rolling Avg"));
}

#[test]
fn wrong_arguments_are_rejected_without_effect() {
    let reg = registry();
    reg.add_counter("R", RollingWindowCounter::new("R", WindowKind::Hour).into());
    reg.increment("R", 4, None);

    let err = reg.invoke("Set Time Window: R", &[]).unwrap_err();
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    let err = reg.invoke("Set Time Window: R", &[json!("ten")]).unwrap_err();
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    let err = reg.invoke("Reset: R", &[json!(1)]).unwrap_err();
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");
    let err = reg.invoke("Set Time Window For All", &[json!(1), json!(2)]).unwrap_err();
    assert_eq!(err.code().as_str(), "INVALID_ARGUMENT");

    assert_eq!(reg.count("R"), Some(4));
    let r = reg.statistic("R").unwrap();
    assert_eq!(r.as_rolling().unwrap().rolling_time_window(), 3_600_000);
}

#[test]
fn set_time_window_for_all_skips_plain_counters() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());
    reg.add_counter("R", RollingWindowCounter::new("R", WindowKind::Hour).into());

    reg.invoke("Set Time Window For All", &[json!(60)]).unwrap();
    let r = reg.statistic("R").unwrap();
    assert_eq!(r.as_rolling().unwrap().rolling_time_window(), 60_000);
    assert!(reg.statistic("A").unwrap().as_rolling().is_none());
}

#[test]
fn bulk_enable_and_disable() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());
    reg.add_counter("B", Counter::new("B").into());
    reg.increment("A", 1, None);

    reg.invoke("Disable All", &[]).unwrap();
    assert_eq!(reg.count("A"), Some(0));
    assert!(reg.info().has_operation("Enable: B"));

    reg.invoke("Enable All", &[]).unwrap();
    assert_eq!(reg.increment("B", 1, None), Some(1));
    assert!(reg.info().has_operation("Disable: B"));
}

#[test]
fn update_rolling_for_all_recomputes_averages() {
    let reg = registry();
    let r = RollingWindowCounter::new("R", WindowKind::Hour);
    reg.add_counter("R", r.clone().into());
    reg.add_counter("A", Counter::new("A").into());

    let t = r.start_time_millis();
    r.increment_at(t + 10, 6, None);
    assert_eq!(r.rolling_average(), 6);

    r.calculate_average(t + 3 * 3_600_000 + 10);
    assert_eq!(r.rolling_average(), 2);

    // Still inside the first hour of wall-clock time.
    reg.update_rolling_for_all();
    assert_eq!(r.rolling_average(), 6);
    assert_eq!(r.historic_values(), vec![6]);
}

#[test]
fn direct_bulk_calls_refresh_the_listing() {
    let reg = registry();
    reg.add_counter("A", Counter::new("A").into());
    reg.add_counter("R", RollingWindowCounter::new("R", WindowKind::None).into());

    reg.disable_all();
    reg.enable_all_logging();
    let info = reg.info();
    assert!(!info.has_attribute("A"));
    assert!(info.has_operation("Enable: A"));
    assert!(!info.has_operation("Disable: A"));
    assert!(info.has_attribute("A: Logging Level"));
    assert!(info.has_operation("Disable Logging: A"));

    reg.enable_all();
    reg.disable_all_logging();
    let info = reg.info();
    assert!(info.has_attribute("A"));
    assert!(info.has_operation("Disable: A"));
    assert!(!info.has_attribute("A: Logging Level"));

    reg.set_time_window_for_all(30);
    let info = reg.info();
    assert!(info.has_operation("Disable Rolling: R"));
    assert!(!info.has_operation("Enable Rolling: R"));
}

#[test]
fn concurrent_adds_keep_one_counter() {
    let reg = std::sync::Arc::new(registry());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let reg = std::sync::Arc::clone(&reg);
            std::thread::spawn(move || {
                reg.add_counter("A", Counter::new("A").into());
                for _ in 0..100 {
                    reg.increment("A", 1, None);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(reg.len(), 1);
    assert_eq!(reg.count("A"), Some(800));
    assert!(reg.info().has_attribute("A"));
}
