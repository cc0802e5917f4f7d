//! Configuration loading (`sphere.toml` + environment overrides).

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{SphereError, SphereResult};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sphere.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub graph: GraphConfig,
    pub directory: DirectoryConfig,
    pub inference: InferenceConfig,
    pub server: ServerConfig,
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
            max_connections: 4,
        }
    }
}

/// External contact directory (Google People API) settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub page_size: u32,
    pub person_fields: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://people.googleapis.com/v1".to_string(),
            page_size: 200,
            person_fields: "names,emailAddresses,organizations,addresses,birthdays,phoneNumbers,photos,biographies,metadata"
                .to_string(),
            access_token: None,
            timeout_secs: 30,
        }
    }
}

/// Tuning for the relationship inference rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Free consumer mail domains that never produce `domain-mate` edges.
    pub consumer_domains: BTreeSet<String>,
    /// An organization name containing one of these counts as a school.
    pub school_keywords: Vec<String>,
    /// Well-known institutions recognized by name, matched as whole words.
    pub known_schools: BTreeSet<String>,
    /// Buckets with more members than this produce no edges for their rule.
    pub max_group_size: Option<usize>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        let consumer_domains = [
            "gmail.com",
            "googlemail.com",
            "yahoo.com",
            "outlook.com",
            "hotmail.com",
            "icloud.com",
            "me.com",
            "live.com",
            "msn.com",
            "aol.com",
            "web.de",
            "gmx.com",
            "gmx.de",
            "yandex.com",
            "mail.ru",
            "t-online.de",
            "proton.me",
            "protonmail.com",
        ];
        let school_keywords = ["university", "college", "school", "institute", "academy"];
        let known_schools = [
            "mit",
            "stanford",
            "harvard",
            "caltech",
            "ucla",
            "usc",
            "berkeley",
            "oxford",
            "cambridge",
            "yale",
            "princeton",
            "columbia",
            "cornell",
        ];

        Self {
            consumer_domains: consumer_domains.iter().map(|d| d.to_string()).collect(),
            school_keywords: school_keywords.iter().map(|k| k.to_string()).collect(),
            known_schools: known_schools.iter().map(|s| s.to_string()).collect(),
            max_group_size: None,
        }
    }
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl SphereConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `sphere.toml` in the
    /// working directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> SphereResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML file.
    pub fn from_file(path: &Path) -> SphereResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> SphereResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `NEO4J_*`, `GOOGLE_ACCESS_TOKEN` and `SPHERE_PORT` overrides.
    pub fn apply_env<F>(&mut self, lookup: F) -> SphereResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.graph.password = password;
        }
        if let Some(token) = lookup("GOOGLE_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                self.directory.access_token = Some(token.trim().to_string());
            }
        }
        if let Some(port) = lookup("SPHERE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| SphereError::Config(format!("SPHERE_PORT is not a port: {}", port)))?;
        }
        Ok(())
    }

    /// Normalize and sanity-check values.
    pub fn validate(&mut self) -> SphereResult<()> {
        self.directory.page_size = self.directory.page_size.clamp(1, 1000);
        self.inference.consumer_domains = self
            .inference
            .consumer_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self.inference.school_keywords = self
            .inference
            .school_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.inference.known_schools = self
            .inference
            .known_schools
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if self.graph.uri.trim().is_empty() {
            return Err(SphereError::Config("graph.uri must not be empty".to_string()));
        }
        if self.inference.max_group_size == Some(0) {
            return Err(SphereError::Config(
                "inference.max_group_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SphereConfig::default();
        assert_eq!(config.graph.uri, "bolt://localhost:7687");
        assert_eq!(config.directory.page_size, 200);
        assert!(config.inference.consumer_domains.contains("gmail.com"));
        assert!(config.inference.max_group_size.is_none());
        assert!(config.inference.known_schools.contains("stanford"));
        assert!(config.inference.known_schools.contains("oxford"));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [graph]
            uri = "bolt://graph.internal:7687"

            [inference]
            consumer_domains = ["Example.COM "]
            known_schools = [" EPFL", ""]
            max_group_size = 40
        "#;
        let mut config = SphereConfig::from_toml(text).unwrap();
        config.validate().unwrap();

        assert_eq!(config.graph.uri, "bolt://graph.internal:7687");
        assert_eq!(config.graph.user, "neo4j");
        assert_eq!(config.inference.max_group_size, Some(40));
        assert_eq!(config.inference.consumer_domains.len(), 1);
        assert!(config.inference.consumer_domains.contains("example.com"));
        assert_eq!(config.inference.known_schools.len(), 1);
        assert!(config.inference.known_schools.contains("epfl"));
        assert_eq!(config.directory.base_url, "https://people.googleapis.com/v1");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NEO4J_URI", "bolt://other:7687"),
            ("GOOGLE_ACCESS_TOKEN", " ya29.token "),
            ("SPHERE_PORT", "9001"),
        ]
        .into_iter()
        .collect();

        let mut config = SphereConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.graph.uri, "bolt://other:7687");
        assert_eq!(config.directory.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.server.port, 9001);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut config = SphereConfig::default();
        let result = config.apply_env(|key| (key == "SPHERE_PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(SphereError::Config(_))));
    }

    #[test]
    fn test_page_size_clamped() {
        let mut config = SphereConfig::from_toml("[directory]\npage_size = 5000").unwrap();
        config.validate().unwrap();
        assert_eq!(config.directory.page_size, 1000);
    }
}
