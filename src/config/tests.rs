use std::time::Duration;

use super::*;

fn raw_with_url() -> RawSettings {
    RawSettings {
        database: RawDatabaseSettings {
            url: Some("postgres://localhost/vellum".into()),
            ..RawDatabaseSettings::default()
        },
        ..RawSettings::default()
    }
}

#[test]
fn defaults_fill_everything_but_the_url() {
    let settings = Settings::from_raw(raw_with_url()).unwrap();

    assert_eq!(settings.database.url, "postgres://localhost/vellum");
    assert_eq!(settings.database.max_connections.get(), 15);
    assert_eq!(settings.database.min_connections, 2);
    assert_eq!(settings.database.idle_timeout, Duration::from_secs(600));
    assert_eq!(settings.database.max_lifetime, Duration::from_secs(1800));
    assert_eq!(settings.database.acquire_timeout, Duration::from_secs(30));

    assert_eq!(settings.document_store.uri, "mongodb://127.0.0.1:27017");
    assert_eq!(settings.document_store.database, "vellum");

    assert_eq!(settings.cache.post_limit, 500);
    assert_eq!(settings.cache.user_limit, 1000);
    assert_eq!(settings.cache.post_ttl_secs, 600);
    assert_eq!(settings.cache.user_ttl_secs, 1800);

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn missing_database_url_is_rejected() {
    let err = Settings::from_raw(RawSettings::default()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.url",
            ..
        }
    ));
}

#[test]
fn blank_database_url_is_rejected() {
    let mut raw = raw_with_url();
    raw.database.url = Some("   ".into());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn unparsable_log_level_is_rejected() {
    let mut raw = raw_with_url();
    raw.logging.level = Some("chatty".into());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
fn json_flag_selects_json_format() {
    let mut raw = raw_with_url();
    raw.logging.json = Some(true);
    let settings = Settings::from_raw(raw).unwrap();
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_pool_bounds_are_rejected() {
    let mut raw = raw_with_url();
    raw.database.max_connections = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = raw_with_url();
    raw.database.acquire_timeout_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn min_connections_may_not_exceed_max() {
    let mut raw = raw_with_url();
    raw.database.max_connections = Some(4);
    raw.database.min_connections = Some(5);
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.min_connections",
            ..
        }
    ));
}

#[test]
fn zero_cache_ttls_are_rejected() {
    let mut raw = raw_with_url();
    raw.cache.post_ttl_secs = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = raw_with_url();
    raw.cache.user_ttl_secs = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}
