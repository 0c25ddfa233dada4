use std::{collections::HashMap, fs};

use crate::geocode::DEFAULT_GEOCODE_URL;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub geocode_url: String,
    pub token_db_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3030".into(),
            geocode_url: DEFAULT_GEOCODE_URL.into(),
            token_db_url: "sqlite://./data/console-tokens.db".into(),
        }
    }
}

/// Defaults, then `console.toml`, then environment overrides.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("console.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_url") {
                settings.api_url = v.clone();
            }
            if let Some(v) = file_cfg.get("geocode_url") {
                settings.geocode_url = v.clone();
            }
            if let Some(v) = file_cfg.get("token_db_url") {
                settings.token_db_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("API_URL") {
        settings.api_url = v;
    }
    if let Ok(v) = std::env::var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Ok(v) = std::env::var("GEOCODE_URL") {
        settings.geocode_url = v;
    }
    if let Ok(v) = std::env::var("APP__GEOCODE_URL") {
        settings.geocode_url = v;
    }

    if let Ok(v) = std::env::var("TOKEN_DB_URL") {
        settings.token_db_url = v;
    }
    if let Ok(v) = std::env::var("APP__TOKEN_DB_URL") {
        settings.token_db_url = v;
    }

    settings
}
