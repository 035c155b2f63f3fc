//! Path patterns and upstream route selection.

use super::config::RouteConfig;
use super::error::{HttpError, HttpResult};
use std::sync::Arc;

/// Compiled path pattern.
///
/// Supported forms: literal segments, `*` for exactly one segment, and a
/// trailing `/**` for any remainder, including none (`/actuator/**`
/// matches `/actuator`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pattern: String,
    segments: Vec<PathSegment>,
    has_trailing_globstar: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Wildcard,
}

impl PathPattern {
    /// Compile a path pattern.
    pub fn compile(pattern: &str) -> HttpResult<Self> {
        if !pattern.starts_with('/') {
            return Err(HttpError::Config(format!(
                "pattern '{pattern}' must start with '/'"
            )));
        }

        let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut has_trailing_globstar = false;

        for (idx, part) in parts.iter().enumerate() {
            match *part {
                "**" if idx == parts.len() - 1 => has_trailing_globstar = true,
                "**" => {
                    return Err(HttpError::Config(format!(
                        "pattern '{pattern}': '**' is only allowed as the last segment"
                    )));
                },
                "*" => segments.push(PathSegment::Wildcard),
                s => segments.push(PathSegment::Literal(s.to_string())),
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            has_trailing_globstar,
        })
    }

    /// Get the source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check if the pattern matches a path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if path_parts.len() < self.segments.len() {
            return false;
        }
        if !self.has_trailing_globstar && path_parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&path_parts)
            .all(|(segment, part)| match segment {
                PathSegment::Literal(lit) => lit == part,
                PathSegment::Wildcard => true,
            })
    }

    /// Strip the segments matched before `**` from a path.
    #[must_use]
    pub fn strip_prefix(&self, path: &str) -> String {
        let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let prefix_len = self.segments.len();

        if prefix_len >= path_parts.len() {
            "/".to_string()
        } else {
            format!("/{}", path_parts[prefix_len..].join("/"))
        }
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// A compiled upstream route.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    pattern: PathPattern,
    upstream: String,
    strip_prefix: bool,
}

impl Route {
    /// Create a route from configuration.
    pub fn from_config(config: &RouteConfig) -> HttpResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            pattern: PathPattern::compile(&config.path)?,
            upstream: config.upstream.clone(),
            strip_prefix: config.strip_prefix,
        })
    }

    /// Get the route name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the upstream address.
    #[must_use]
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Check if this route matches a path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    /// Compute the path sent upstream.
    #[must_use]
    pub fn transform_path(&self, path: &str) -> String {
        if self.strip_prefix {
            self.pattern.strip_prefix(path)
        } else {
            path.to_string()
        }
    }
}

/// Ordered route table. The first matching route wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Arc<Route>>,
}

impl Router {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router from route configurations.
    pub fn from_configs(configs: &[RouteConfig]) -> HttpResult<Self> {
        let routes = configs
            .iter()
            .map(|c| Route::from_config(c).map(Arc::new))
            .collect::<HttpResult<_>>()?;

        Ok(Self { routes })
    }

    /// Find the route for a path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<Arc<Route>> {
        self.routes.iter().find(|r| r.matches(path)).cloned()
    }

    /// Get the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the router has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
