//! Board configuration service.
//!
//! The taxonomy (statuses, priorities, effort sizes, product areas, team
//! members) lives in a JSON file under the asset directory and is handed to
//! callers as an explicit value, never reached into as a global.

use std::{path::PathBuf, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use ts_rs::TS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Failed to parse board config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("{0} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub name: String,
    #[serde(default)]
    pub wip_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct NamedColor {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub statuses: Vec<StatusEntry>,
    pub priorities: Vec<NamedColor>,
    pub product_areas: Vec<String>,
    pub effort_sizes: Vec<String>,
    pub team_members: Vec<NamedColor>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let status = |name: &str, wip_limit: Option<u32>| StatusEntry {
            name: name.to_string(),
            wip_limit,
        };
        let priority = |name: &str, color: &str| NamedColor {
            name: name.to_string(),
            color: color.to_string(),
        };
        Self {
            statuses: vec![
                status("New", None),
                status("Backlog", None),
                status("To Do", Some(5)),
                status("In Progress", Some(3)),
                status("In Review", Some(2)),
                status("Done", None),
                status("Completed", None),
            ],
            priorities: vec![
                priority("Highest", "bg-red-500"),
                priority("High", "bg-orange-500"),
                priority("Medium", "bg-yellow-500"),
                priority("Low", "bg-green-500"),
            ],
            product_areas: vec![
                "Core Platform".to_string(),
                "User Interface".to_string(),
                "API".to_string(),
            ],
            effort_sizes: vec![
                "XS".to_string(),
                "S".to_string(),
                "M".to_string(),
                "L".to_string(),
                "XL".to_string(),
            ],
            team_members: vec![],
        }
    }
}

impl BoardConfig {
    /// The lane new tasks land in when the request does not name one.
    pub fn default_status(&self) -> &str {
        self.statuses
            .first()
            .map(|s| s.name.as_str())
            .unwrap_or("New")
    }

    pub fn default_priority(&self) -> &str {
        "Medium"
    }

    pub fn add_status(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.statuses.iter().any(|s| s.name == name) {
            return Err(ConfigError::AlreadyExists(format!("Status \"{name}\"")));
        }
        self.statuses.push(StatusEntry {
            name: name.to_string(),
            wip_limit: None,
        });
        Ok(())
    }

    pub fn remove_status(&mut self, name: &str) -> Result<(), ConfigError> {
        let before = self.statuses.len();
        self.statuses.retain(|s| s.name != name);
        if self.statuses.len() == before {
            return Err(ConfigError::NotFound(format!("Status \"{name}\"")));
        }
        Ok(())
    }

    pub fn add_priority(&mut self, entry: NamedColor) -> Result<(), ConfigError> {
        if self.priorities.iter().any(|p| p.name == entry.name) {
            return Err(ConfigError::AlreadyExists(format!(
                "Priority \"{}\"",
                entry.name
            )));
        }
        self.priorities.push(entry);
        Ok(())
    }

    pub fn remove_priority(&mut self, name: &str) -> Result<(), ConfigError> {
        let before = self.priorities.len();
        self.priorities.retain(|p| p.name != name);
        if self.priorities.len() == before {
            return Err(ConfigError::NotFound(format!("Priority \"{name}\"")));
        }
        Ok(())
    }

    pub fn add_product_area(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.product_areas.iter().any(|a| a == name) {
            return Err(ConfigError::AlreadyExists(format!(
                "Product area \"{name}\""
            )));
        }
        self.product_areas.push(name.to_string());
        Ok(())
    }

    pub fn remove_product_area(&mut self, name: &str) -> Result<(), ConfigError> {
        let before = self.product_areas.len();
        self.product_areas.retain(|a| a != name);
        if self.product_areas.len() == before {
            return Err(ConfigError::NotFound(format!("Product area \"{name}\"")));
        }
        Ok(())
    }

    pub fn add_effort_size(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.effort_sizes.iter().any(|e| e == name) {
            return Err(ConfigError::AlreadyExists(format!("Effort size \"{name}\"")));
        }
        self.effort_sizes.push(name.to_string());
        Ok(())
    }

    pub fn remove_effort_size(&mut self, name: &str) -> Result<(), ConfigError> {
        let before = self.effort_sizes.len();
        self.effort_sizes.retain(|e| e != name);
        if self.effort_sizes.len() == before {
            return Err(ConfigError::NotFound(format!("Effort size \"{name}\"")));
        }
        Ok(())
    }

    pub fn add_team_member(&mut self, entry: NamedColor) -> Result<(), ConfigError> {
        if self.team_members.iter().any(|m| m.name == entry.name) {
            return Err(ConfigError::AlreadyExists(format!(
                "Team member \"{}\"",
                entry.name
            )));
        }
        self.team_members.push(entry);
        Ok(())
    }

    pub fn remove_team_member(&mut self, name: &str) -> Result<(), ConfigError> {
        let before = self.team_members.len();
        self.team_members.retain(|m| m.name != name);
        if self.team_members.len() == before {
            return Err(ConfigError::NotFound(format!("Team member \"{name}\"")));
        }
        Ok(())
    }
}

/// Shared handle over the persisted board configuration.
#[derive(Clone)]
pub struct ConfigService {
    inner: Arc<RwLock<BoardConfig>>,
    path: PathBuf,
}

impl ConfigService {
    /// Load the config file, falling back to defaults (and writing them out)
    /// when the file does not exist yet.
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            let defaults = BoardConfig::default();
            std::fs::write(&path, serde_json::to_string_pretty(&defaults)?)?;
            tracing::info!("Wrote default board config to {}", path.display());
            defaults
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(config)),
            path,
        })
    }

    pub async fn snapshot(&self) -> BoardConfig {
        self.inner.read().await.clone()
    }

    /// Apply a mutation and persist the result. The lock is held across the
    /// file write so concurrent mutations cannot interleave stale state.
    pub async fn mutate<F>(&self, mutation: F) -> Result<BoardConfig, ConfigError>
    where
        F: FnOnce(&mut BoardConfig) -> Result<(), ConfigError>,
    {
        let mut guard = self.inner.write().await;
        mutation(&mut guard)?;
        std::fs::write(&self.path, serde_json::to_string_pretty(&*guard)?)?;
        Ok(guard.clone())
    }
}
