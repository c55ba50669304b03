use std::{collections::HashMap, fs, path::PathBuf};

use tracing::warn;

#[derive(Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub static_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".into(),
            static_dir: "./public".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("relay.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.bind_addr = v.clone();
            }
            if let Some(v) = file_cfg.get("static_dir") {
                settings.static_dir = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("RELAY_BIND") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Ok(v) = std::env::var("RELAY_STATIC_DIR") {
        settings.static_dir = v;
    }
    if let Ok(v) = std::env::var("APP__STATIC_DIR") {
        settings.static_dir = v;
    }

    settings
}

/// Resolves the static asset directory. A missing directory is tolerated:
/// requests for its files simply come back 404.
pub fn prepare_static_dir(raw_static_dir: &str) -> PathBuf {
    let raw_static_dir = raw_static_dir.trim();

    let dir = if raw_static_dir.is_empty() {
        PathBuf::from(Settings::default().static_dir)
    } else {
        PathBuf::from(raw_static_dir)
    };

    if !dir.is_dir() {
        warn!(static_dir = %dir.display(), "static asset directory does not exist");
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_the_local_relay_port() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr, "127.0.0.1:3001");
        assert_eq!(settings.static_dir, "./public");
    }

    #[test]
    fn blank_static_dir_falls_back_to_default() {
        assert_eq!(prepare_static_dir("   "), PathBuf::from("./public"));
    }

    #[test]
    fn missing_static_dir_is_kept_as_configured() {
        let dir = prepare_static_dir("./no-such-assets-dir");
        assert_eq!(dir, PathBuf::from("./no-such-assets-dir"));
    }
}
