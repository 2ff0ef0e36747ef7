use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ShelfError};

/// Catalog endpoint and its query-parameter contract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub collection: String,
    pub categories_path: String,
    pub page_size: u32,
    pub page_param: String,
    pub limit_param: String,
    pub sort_param: String,
    pub order_param: String,
    pub search_param: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            collection: "stores".to_string(),
            categories_path: "categories".to_string(),
            page_size: 20,
            page_param: "_page".to_string(),
            limit_param: "_limit".to_string(),
            sort_param: "_sort".to_string(),
            order_param: "_order".to_string(),
            search_param: "q".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub search_debounce_ms: u64,
    /// Rows from the end of the list that count as "the tail" for load-more.
    pub prefetch_distance: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
            prefetch_distance: 0,
        }
    }
}

impl UiConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub key: String,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            key: "favoriteStores".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub favorites: FavoritesConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("shelf").join("config.toml"))
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), "ignoring config: {}", e);
                }
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str::<Config>(content).map_err(|e| ShelfError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.catalog.page_size == 0 {
            return Err(ShelfError::Config("catalog.page_size must be at least 1".into()));
        }
        if self.catalog.base_url.trim().is_empty() {
            return Err(ShelfError::Config("catalog.base_url is empty".into()));
        }
        Ok(())
    }
}
