use std::io::Write;

use super::*;

#[test]
fn defaults_apply_when_nothing_is_configured() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.default_ttl, Duration::from_secs(60));
    assert_eq!(settings.cache.backend_timeout, Duration::from_millis(250));
    assert_eq!(settings.cache.max_entries.get(), 10_000);
    assert!(settings.cache.policy_ttls.is_empty());
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.cache.default_ttl_seconds = Some(600);
    raw.cache.enabled = Some(true);

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        cache_default_ttl_seconds: Some(5),
        cache_disabled: true,
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
    assert_eq!(settings.cache.default_ttl, Duration::from_secs(5));
    assert!(!settings.cache.enabled);
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero ttl");
    match err {
        LoadError::Invalid { key, .. } => assert_eq!(key, "cache.default_ttl_seconds"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_policy_ttl_names_the_operation() {
    let mut raw = RawSettings::default();
    raw.cache.policy_ttl_seconds.insert(
        "supplier".to_string(),
        HashMap::from([("find_all".to_string(), 0)]),
    );

    let err = Settings::from_raw(raw).expect_err("zero policy ttl");
    match err {
        LoadError::Invalid { key, .. } => {
            assert_eq!(key, "cache.policy_ttl_seconds.supplier.find_all")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn config_file_supplies_policy_ttls() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        r#"
[cache]
max_entries = 32

[cache.policy_ttl_seconds.supplier]
find_all = 120
get_by_status = 15
"#
    )
    .expect("write config");

    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from(["aerocache", "--config-file", path.as_str(), "policies"]);
    let settings = load(&args).expect("settings");

    assert_eq!(settings.cache.max_entries.get(), 32);
    assert_eq!(
        settings.cache.policy_ttls.get("supplier.find_all"),
        Some(&Duration::from_secs(120))
    );
    assert_eq!(
        settings.cache.policy_ttls.get("supplier.get_by_status"),
        Some(&Duration::from_secs(15))
    );
}

#[test]
fn default_command_is_absent() {
    let args = CliArgs::parse_from(["aerocache"]);
    assert!(args.command.is_none());
    assert!(!args.overrides.cache_disabled);
}

#[test]
fn global_flags_parse_after_subcommand() {
    let args = CliArgs::parse_from([
        "aerocache",
        "scenario",
        "--json",
        "--cache-disabled",
        "--log-json",
        "true",
        "--cache-default-ttl-seconds",
        "30",
    ]);

    match args.command.expect("scenario command") {
        Command::Scenario(scenario) => assert!(scenario.json),
        other => panic!("wrong command parsed: {other:?}"),
    }
    assert!(args.overrides.cache_disabled);
    assert_eq!(args.overrides.log_json, Some(true));
    assert_eq!(args.overrides.cache_default_ttl_seconds, Some(30));
}
