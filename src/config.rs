//! Configuration loader and validator for the activity client.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const GATEWAY_URL_ENV: &str = "ACTFOLIO_GATEWAY_URL";
pub const RECOMMEND_URL_ENV: &str = "ACTFOLIO_RECOMMEND_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub api: Api,
    pub navigation: Navigation,
    pub resources: BTreeMap<String, ResourceEndpoints>,
}

/// Where the bearer token travels on the "set" POSTs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenPlacement {
    /// `Authorization: Bearer …` header on every authenticated call.
    #[default]
    Header,
    /// Old mobile wire shape: POSTs carry `{"headers":{"Authorization":…}}`
    /// as their JSON body and no header.
    LegacyBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub gateway_url: String,
    pub recommend_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub token_placement: TokenPlacement,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Navigation {
    pub max_depth: usize,
}

/// Path templates for one activity-like resource. `{id}` is substituted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceEndpoints {
    pub detail_route: String,
    pub list_route: String,
    pub detail: String,
    pub like: String,
    pub unlike: String,
    pub attend: String,
    pub unattend: String,
    pub recommendations: String,
}

fn default_user_agent() -> String {
    "actfolio/0.1".to_string()
}

impl ResourceEndpoints {
    /// Endpoints of the external-activity board.
    pub fn external() -> Self {
        Self {
            detail_route: "Activity".into(),
            list_route: "ActList".into(),
            detail: "notice/externalact/id?id={id}".into(),
            like: "notice/externalact/like?actId={id}".into(),
            unlike: "notice/externalact/likecancel?id={id}".into(),
            attend: "notice/externalact/check?actId={id}".into(),
            unattend: "notice/externalact/check-cancel?id={id}".into(),
            recommendations: "external?id={id}".into(),
        }
    }

    fn templates(&self) -> [(&'static str, &str); 6] {
        [
            ("detail", self.detail.as_str()),
            ("like", self.like.as_str()),
            ("unlike", self.unlike.as_str()),
            ("attend", self.attend.as_str()),
            ("unattend", self.unattend.as_str()),
            ("recommendations", self.recommendations.as_str()),
        ]
    }
}

impl Config {
    /// Look up a configured resource kind by name.
    pub fn resource(&self, name: &str) -> Result<&ResourceEndpoints, ConfigError> {
        self.resources
            .get(name)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown resource '{}'", name)))
    }

    /// Apply `ACTFOLIO_GATEWAY_URL` / `ACTFOLIO_RECOMMEND_URL` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(GATEWAY_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.gateway_url = url;
            }
        }
        if let Ok(url) = std::env::var(RECOMMEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.recommend_url = url;
            }
        }
    }
}

/// Load configuration from a YAML file, apply env overrides and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    cfg.apply_env_overrides();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    check_url("api.gateway_url", &cfg.api.gateway_url)?;
    check_url("api.recommend_url", &cfg.api.recommend_url)?;
    if cfg.api.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("api.user_agent must be non-empty".into()));
    }

    // Root plus at least one screen on top of it.
    if cfg.navigation.max_depth < 2 {
        return Err(ConfigError::Invalid("navigation.max_depth must be >= 2".into()));
    }

    if cfg.resources.is_empty() {
        return Err(ConfigError::Invalid("resources must define at least one entry".into()));
    }
    for (name, res) in &cfg.resources {
        if res.detail_route.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "resources.{}.detail_route must be non-empty",
                name
            )));
        }
        if res.list_route.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "resources.{}.list_route must be non-empty",
                name
            )));
        }
        for (field, template) in res.templates() {
            if !template.contains("{id}") {
                return Err(ConfigError::Invalid(format!(
                    "resources.{}.{} must contain {{id}}",
                    name, field
                )));
            }
        }
    }

    Ok(())
}

fn check_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|err| ConfigError::Invalid(format!("{} is not a valid URL: {}", field, err)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"api:
  gateway_url: "https://gateway.example.com/"
  recommend_url: "https://recommend.example.com/"
  user_agent: "actfolio/0.1"
  token_placement: header

navigation:
  max_depth: 32

resources:
  external:
    detail_route: "Activity"
    list_route: "ActList"
    detail: "notice/externalact/id?id={id}"
    like: "notice/externalact/like?actId={id}"
    unlike: "notice/externalact/likecancel?id={id}"
    attend: "notice/externalact/check?actId={id}"
    unattend: "notice/externalact/check-cancel?id={id}"
    recommendations: "external?id={id}"
"#
}
