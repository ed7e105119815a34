//! Unit tests for config module
//!
//! Tests configuration types, defaults, and serialization.
//! No filesystem dependencies - all in-memory.

use super::daemon::resolve_ipc_path;
use crate::AppError;
use crate::config::{Config, LogLevel};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert!(!config.general.log_to_file);
    assert_eq!(config.daemon.client_name, "MPRIS2_bridge");
    assert_eq!(config.daemon.ipc_path, None);
    assert_eq!(config.mpris.bus_suffix, "xmms2");
    assert_eq!(config.mpris.identity, "Xmms2");
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config::default();

    let toml_str = toml::to_string(&original).unwrap();
    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[mpris]"));

    let deserialized = Config::parse(&toml_str, None).unwrap();
    assert_eq!(original, deserialized);
}

#[test]
fn config_minimal_toml() {
    let config = Config::parse("[general]\n", None).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = Config::parse(
        r#"
        [mpris]
        identity = "Living room"
        can_quit = false
        "#,
        None,
    )
    .unwrap();

    assert_eq!(config.mpris.identity, "Living room");
    assert!(!config.mpris.can_quit);
    assert_eq!(config.mpris.bus_suffix, "xmms2");
    assert_eq!(config.mpris.supported_uri_schemes, ["file", "http", "rtsp"]);
}

#[test]
fn app_identity_follows_mpris_section() {
    let config = Config::parse("[mpris]\ncan_quit = false\n", None).unwrap();

    let identity = config.mpris.app_identity();

    assert!(!identity.can_quit);
    assert!(!identity.has_track_list);
}

#[test]
fn raise_cannot_be_advertised() {
    let config = Config::parse("[mpris]\ncan_raise = true\n", None).unwrap();

    let identity = config.mpris.app_identity();

    assert!(!identity.can_raise);
    assert!(!identity.has_track_list);
}

#[test]
fn invalid_log_level_is_a_parse_error() {
    let error = Config::parse("[general]\nlog_level = \"loud\"\n", None).unwrap_err();

    match error {
        AppError::TomlParse { location, .. } => assert_eq!(location, "string"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn client_name_must_be_a_plain_identifier() {
    let error = Config::parse("[daemon]\nclient_name = \"my bridge\"\n", None).unwrap_err();

    assert!(matches!(
        error,
        AppError::Config {
            field: "daemon.client_name",
            ..
        }
    ));
}

#[test]
fn bus_suffix_must_form_a_bus_name() {
    for suffix in ["", "2xmms", "xmms2..b", "xmms 2"] {
        let toml = format!("[mpris]\nbus_suffix = {suffix:?}\n");
        assert!(
            matches!(Config::parse(&toml, None), Err(AppError::Config { .. })),
            "{suffix:?} accepted"
        );
    }

    assert!(Config::parse("[mpris]\nbus_suffix = \"xmms2.instance_1\"\n", None).is_ok());
}

#[test]
fn ipc_path_prefers_config_then_environment() {
    assert_eq!(
        resolve_ipc_path(Some("unix:///run/xmms"), Some("unix:///env".into()), None),
        "unix:///run/xmms"
    );
    assert_eq!(
        resolve_ipc_path(None, Some("unix:///env".into()), Some("alice".into())),
        "unix:///env"
    );
    assert_eq!(
        resolve_ipc_path(None, None, Some("alice".into())),
        "unix:///tmp/xmms-ipc-alice"
    );
    assert_eq!(
        resolve_ipc_path(Some(""), Some(String::new()), Some("bob".into())),
        "unix:///tmp/xmms-ipc-bob"
    );
}
