//! Route and application configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Method};

/// Configuration for a single route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route pattern (e.g., "/products/:id").
    pub pattern: String,
    /// Handler name this route dispatches to.
    pub handler: String,
    /// HTTP methods this route accepts.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    /// Whether this route produces its response by streaming.
    ///
    /// A streaming route's handler returns immediately with a deferred
    /// sentinel; the body is delivered later through the host server's
    /// async-response facility.
    #[serde(default)]
    pub stream: bool,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

impl RouteConfig {
    /// Create a new route configuration.
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            methods: default_methods(),
            stream: false,
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(String::from).collect();
        self
    }

    /// Mark this route as streaming.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Parse the configured method names into typed methods.
    pub fn parsed_methods(&self) -> Result<Vec<Method>, ConfigError> {
        self.methods
            .iter()
            .map(|m| {
                Method::parse(m)
                    .ok_or_else(|| ConfigError::UnknownMethod(m.clone(), self.pattern.clone()))
            })
            .collect()
    }
}

/// Application configuration - a named set of routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name.
    pub name: String,
    /// Routes this application serves.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl AppConfig {
    /// Create a new application configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
        }
    }

    /// Add a route.
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Load from a TOML document.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        for route in &config.routes {
            route.parsed_methods()?;
        }
        Ok(config)
    }
}
