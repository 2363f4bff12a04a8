//! Route patterns and the route registry.

use rill_core::{Method, RouteConfig, RouteParams};

/// One registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Pattern, e.g. `/products/:id`.
    pub pattern: String,
    /// Methods this route accepts.
    pub methods: Vec<Method>,
    /// Whether this route streams its response.
    pub stream: bool,
}

impl RouteEntry {
    /// Create a GET route.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            methods: vec![Method::Get],
            stream: false,
        }
    }

    /// Set accepted methods.
    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = methods;
        self
    }

    /// Mark this route as streaming.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Build from a parsed [`RouteConfig`].
    pub fn from_config(config: &RouteConfig) -> Result<Self, rill_core::ConfigError> {
        Ok(Self {
            pattern: config.pattern.clone(),
            methods: config.parsed_methods()?,
            stream: config.stream,
        })
    }

    /// Match a method and path against this route.
    ///
    /// `:name` segments capture into the returned params; a trailing `*name`
    /// segment captures the rest of the path.
    pub fn matches(&self, method: Method, path: &str) -> Option<RouteParams> {
        if !self.methods.contains(&method) {
            return None;
        }
        match_pattern(&self.pattern, path)
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<RouteParams> {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut params = RouteParams::new();
    let mut path_iter = path_segments.iter();

    for (i, seg) in pattern_segments.iter().enumerate() {
        if let Some(name) = seg.strip_prefix('*') {
            // Wildcard swallows the remainder, empty included.
            let rest: Vec<&str> = path_iter.as_slice().iter().copied().collect();
            params.insert(name.to_string(), rest.join("/"));
            debug_assert_eq!(i, pattern_segments.len() - 1);
            return Some(params);
        }
        let actual = path_iter.next()?;
        if let Some(name) = seg.strip_prefix(':') {
            params.insert(name.to_string(), (*actual).to_string());
        } else if seg != actual {
            return None;
        }
    }

    if path_iter.next().is_some() {
        return None;
    }
    Some(params)
}

/// Ordered collection of routes; first match wins.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteEntry>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    pub fn register(&mut self, entry: RouteEntry) {
        self.routes.push(entry);
    }

    /// All registered routes.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Find the first route matching `method` and `path`.
    pub fn match_route(&self, method: Method, path: &str) -> Option<(usize, RouteParams)> {
        self.routes
            .iter()
            .enumerate()
            .find_map(|(i, entry)| entry.matches(method, path).map(|params| (i, params)))
    }

    /// Whether the route at `index` is a streaming route.
    pub fn is_streaming(&self, index: usize) -> bool {
        self.routes.get(index).map(|e| e.stream).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Pattern Matching Tests ===

    #[test]
    fn test_static_match() {
        let route = RouteEntry::new("/health");
        assert!(route.matches(Method::Get, "/health").is_some());
        assert!(route.matches(Method::Get, "/healthz").is_none());
        assert!(route.matches(Method::Post, "/health").is_none());
    }

    #[test]
    fn test_param_capture() {
        let route = RouteEntry::new("/products/:id");
        let params = route.matches(Method::Get, "/products/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_param_requires_segment() {
        let route = RouteEntry::new("/products/:id");
        assert!(route.matches(Method::Get, "/products").is_none());
        assert!(route.matches(Method::Get, "/products/1/reviews").is_none());
    }

    #[test]
    fn test_wildcard_captures_rest() {
        let route = RouteEntry::new("/blog/*slug");
        let params = route.matches(Method::Get, "/blog/2024/streaming").unwrap();
        assert_eq!(
            params.get("slug").map(String::as_str),
            Some("2024/streaming")
        );
    }

    #[test]
    fn test_trailing_slash_insensitive() {
        let route = RouteEntry::new("/about");
        assert!(route.matches(Method::Get, "/about/").is_some());
    }

    #[test]
    fn test_multiple_methods() {
        let route = RouteEntry::new("/orders").with_methods(vec![Method::Get, Method::Post]);
        assert!(route.matches(Method::Post, "/orders").is_some());
        assert!(route.matches(Method::Delete, "/orders").is_none());
    }

    // === Registry Tests ===

    #[test]
    fn test_registry_first_match_wins() {
        let mut registry = RouteRegistry::new();
        registry.register(RouteEntry::new("/feed").with_stream(true));
        registry.register(RouteEntry::new("/:page"));

        let (index, _) = registry.match_route(Method::Get, "/feed").unwrap();
        assert_eq!(index, 0);
        assert!(registry.is_streaming(index));

        let (index, params) = registry.match_route(Method::Get, "/about").unwrap();
        assert_eq!(index, 1);
        assert!(!registry.is_streaming(index));
        assert_eq!(params.get("page").map(String::as_str), Some("about"));
    }

    #[test]
    fn test_registry_no_match() {
        let registry = RouteRegistry::new();
        assert!(registry.match_route(Method::Get, "/anything").is_none());
    }

    #[test]
    fn test_entry_from_config() {
        let config = RouteConfig::new("/ticks", "ticks").with_stream(true);
        let entry = RouteEntry::from_config(&config).unwrap();
        assert!(entry.stream);
        assert_eq!(entry.methods, vec![Method::Get]);
    }
}
