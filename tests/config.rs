//! Integration tests for configuration loading from disk.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use xmms2_mpris::{
    AppError,
    config::{Config, ConfigPaths, LogLevel},
};

fn write_config(temp_dir: &TempDir, content: &str) -> PathBuf {
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

mod loading {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();

        let config = Config::load_from(&temp.path().join("absent.toml")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
[general]
log_level = "debug"
log_to_file = true

[daemon]
ipc_path = "unix:///run/user/1000/xmms-ipc"
client_name = "desk_bridge"

[mpris]
bus_suffix = "xmms2.desk"
supported_mime_types = ["audio/flac"]
"#,
        );

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert!(config.general.log_to_file);
        assert_eq!(
            config.daemon.ipc_path.as_deref(),
            Some("unix:///run/user/1000/xmms-ipc")
        );
        assert_eq!(config.daemon.resolved_ipc_path(), "unix:///run/user/1000/xmms-ipc");
        assert_eq!(config.daemon.client_name, "desk_bridge");
        assert_eq!(config.mpris.bus_suffix, "xmms2.desk");
        assert_eq!(config.mpris.supported_mime_types, ["audio/flac"]);
        assert_eq!(config.mpris.identity, "Xmms2");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");

        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}

mod errors {
    use super::*;

    #[test]
    fn parse_error_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[general\nlog_level = \"info\"\n");

        let error = Config::load_from(&path).unwrap_err();

        match error {
            AppError::TomlParse { location, details } => {
                assert!(location.ends_with("config.toml"), "location was {location}");
                assert!(!details.is_empty());
            }
            other => panic!("expected TomlParse, got {other:?}"),
        }
    }

    #[test]
    fn wrong_value_type_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[mpris]\ncan_quit = \"yes\"\n");

        assert!(matches!(
            Config::load_from(&path),
            Err(AppError::TomlParse { .. })
        ));
    }

    #[test]
    fn directory_instead_of_file_is_an_io_error() {
        let temp = TempDir::new().unwrap();

        assert!(matches!(
            Config::load_from(temp.path()),
            Err(AppError::IoError { .. })
        ));
    }
}

mod default_location {
    use super::*;

    #[test]
    fn follows_xdg_config_home() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("xmms2-mpris");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "[mpris]\nidentity = \"Kitchen\"\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp.path());
        }

        assert_eq!(ConfigPaths::main_config().unwrap(), config_dir.join("config.toml"));
        assert_eq!(Config::load().unwrap().mpris.identity, "Kitchen");
    }
}
