//! Persisted connection profiles (§6): a small `serde_json`-backed store at
//! `<home>/.pgmeta/config.json`. The engine never reads this file directly;
//! only the CLI layer resolves a profile to a connection URL before calling
//! into `engine::facade::export`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileStore {
    #[serde(default)]
    pub connections: Vec<ConnectionProfile>,
}

impl ProfileStore {
    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {} as JSON", path.display()))
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn create(&mut self, name: String, url: String, make_default: bool) -> Result<()> {
        if self.connections.iter().any(|c| c.name == name) {
            bail!("a connection named '{name}' already exists");
        }
        if make_default || self.connections.is_empty() {
            for existing in &mut self.connections {
                existing.is_default = false;
            }
        }
        self.connections.push(ConnectionProfile {
            name,
            url,
            is_default: make_default || self.connections.is_empty(),
        });
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let before = self.connections.len();
        self.connections.retain(|c| c.name != name);
        if self.connections.len() == before {
            bail!("no connection named '{name}'");
        }
        Ok(())
    }

    pub fn make_default(&mut self, name: &str) -> Result<()> {
        if !self.connections.iter().any(|c| c.name == name) {
            bail!("no connection named '{name}'");
        }
        for connection in &mut self.connections {
            connection.is_default = connection.name == name;
        }
        Ok(())
    }

    /// Resolves a connection URL for `export`: an explicit `--connection`
    /// name wins; otherwise the profile marked default; otherwise, if
    /// exactly one profile exists, that one; otherwise an error naming the
    /// ambiguity (§6).
    pub fn resolve(&self, requested: Option<&str>) -> Result<&str> {
        if let Some(name) = requested {
            return self
                .connections
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.url.as_str())
                .ok_or_else(|| anyhow::anyhow!("no connection named '{name}'"));
        }

        if let Some(default) = self.connections.iter().find(|c| c.is_default) {
            return Ok(default.url.as_str());
        }

        match self.connections.as_slice() {
            [] => bail!("no connections configured; run `pgmeta connection create` first"),
            [only] => Ok(only.url.as_str()),
            _ => bail!(
                "multiple connections configured and none is marked default; pass --connection or run `connection make-default`"
            ),
        }
    }
}

/// `<home>/.pgmeta/config.json`, resolved via the `dirs` crate so it works
/// the same on Linux, macOS, and Windows.
pub fn default_store_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".pgmeta").join("config.json"))
}

pub fn load() -> Result<ProfileStore> {
    ProfileStore::load_from(&default_store_path()?)
}

pub fn save(store: &ProfileStore) -> Result<()> {
    store.save_to(&default_store_path()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, is_default: bool) -> ConnectionProfile {
        ConnectionProfile {
            name: name.to_string(),
            url: format!("postgres://localhost/{name}"),
            is_default,
        }
    }

    #[test]
    fn first_connection_created_becomes_default() {
        let mut store = ProfileStore::default();
        store.create("dev".to_string(), "postgres://localhost/dev".to_string(), false).unwrap();
        assert!(store.connections[0].is_default);
    }

    #[test]
    fn creating_with_default_flag_clears_previous_default() {
        let mut store = ProfileStore {
            connections: vec![profile("dev", true)],
        };
        store.create("prod".to_string(), "postgres://localhost/prod".to_string(), true).unwrap();
        assert!(!store.connections[0].is_default);
        assert!(store.connections[1].is_default);
    }

    #[test]
    fn creating_a_duplicate_name_errors() {
        let mut store = ProfileStore {
            connections: vec![profile("dev", true)],
        };
        assert!(store
            .create("dev".to_string(), "postgres://localhost/other".to_string(), false)
            .is_err());
    }

    #[test]
    fn delete_removes_named_profile() {
        let mut store = ProfileStore {
            connections: vec![profile("dev", true), profile("prod", false)],
        };
        store.delete("prod").unwrap();
        assert_eq!(store.connections.len(), 1);
        assert_eq!(store.connections[0].name, "dev");
    }

    #[test]
    fn delete_unknown_profile_errors() {
        let mut store = ProfileStore {
            connections: vec![profile("dev", true)],
        };
        assert!(store.delete("ghost").is_err());
    }

    #[test]
    fn make_default_flips_exactly_one_flag() {
        let mut store = ProfileStore {
            connections: vec![profile("dev", true), profile("prod", false)],
        };
        store.make_default("prod").unwrap();
        assert!(!store.connections[0].is_default);
        assert!(store.connections[1].is_default);
    }

    #[test]
    fn resolve_prefers_explicit_name() {
        let store = ProfileStore {
            connections: vec![profile("dev", true), profile("prod", false)],
        };
        assert_eq!(store.resolve(Some("prod")).unwrap(), "postgres://localhost/prod");
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let store = ProfileStore {
            connections: vec![profile("dev", false), profile("prod", true)],
        };
        assert_eq!(store.resolve(None).unwrap(), "postgres://localhost/prod");
    }

    #[test]
    fn resolve_falls_back_to_single_profile() {
        let store = ProfileStore {
            connections: vec![profile("dev", false)],
        };
        assert_eq!(store.resolve(None).unwrap(), "postgres://localhost/dev");
    }

    #[test]
    fn resolve_errors_when_ambiguous() {
        let store = ProfileStore {
            connections: vec![profile("dev", false), profile("prod", false)],
        };
        assert!(store.resolve(None).is_err());
    }

    #[test]
    fn resolve_errors_when_empty() {
        let store = ProfileStore::default();
        assert!(store.resolve(None).is_err());
    }

    #[test]
    fn store_round_trips_through_json() {
        let store = ProfileStore {
            connections: vec![profile("dev", true)],
        };
        let json = serde_json::to_string(&store).unwrap();
        let parsed: ProfileStore = serde_json::from_str(&json).unwrap();
        assert_eq!(store, parsed);
    }
}
