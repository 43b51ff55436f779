#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use statlens_core::{LogLevel, WindowKind};
use statlens_mgmt::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
counters:
  - target: "billing::Invoice"
    name: "Created"
    windwo: hour # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert!(cfg.catalog.background_worker);
    assert_eq!(cfg.catalog.log_format, "Statistic logging: {name} = {state}");
    assert_eq!(cfg.catalog.address_suffix, ".stats");
    assert_eq!(cfg.catalog.refresh_interval(), None);
    assert_eq!(cfg.console.listen, "127.0.0.1:9810");
    assert!(cfg.counters.is_empty());
}

#[test]
fn seed_counters_parse_into_specs() {
    let ok = r#"
version: 1
catalog:
  refresh_interval_ms: 500
counters:
  - target: "billing::Invoice"
    name: "Created"
    window: hour
    log_level: info
    record: "amount"
    max_recordings: 10
  - target: "billing::Invoice"
    name: "Voided"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.catalog.refresh_interval(), Some(Duration::from_millis(500)));

    let created = &cfg.counters[0];
    assert_eq!(created.target_type().simple_name(), "Invoice");
    let spec = created.spec();
    assert_eq!(spec.window, WindowKind::Hour);
    assert_eq!(spec.log_level, LogLevel::Info);
    let rec = spec.recording.expect("recording configured");
    assert_eq!(rec.label, "amount");
    assert_eq!(rec.capacity, 10);

    let voided = cfg.counters[1].spec();
    assert_eq!(voided.window, WindowKind::None);
    assert_eq!(voided.log_level, LogLevel::None);
    assert!(voided.recording.is_none());
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn log_format_needs_placeholders() {
    let bad = r#"
version: 1
catalog:
  log_format: "counter changed"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn out_of_range_values() {
    for bad in [
        "version: 1\ncatalog:\n  refresh_interval_ms: 50\n",
        "version: 1\ncounters:\n  - target: \"a::B\"\n    name: \"C\"\n    max_recordings: 0\n",
        "version: 1\ncounters:\n  - target: \"\"\n    name: \"C\"\n",
        "version: 1\ncounters:\n  - target: \"a::B\"\n    name: \"C\"\n    window: fortnight\n",
    ] {
        let err = config::load_from_str(bad).expect_err("must fail");
        assert_eq!(err.code().as_str(), "BAD_CONFIG", "{bad}");
    }
}

#[test]
fn missing_file_names_the_path() {
    let err = config::load_from_file("/nonexistent/statlens.yaml").expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
    assert!(err.to_string().contains("/nonexistent/statlens.yaml"));
}
