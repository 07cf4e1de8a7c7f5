//! Request classification.
//!
//! Requests are matched against an ordered list of rules; the first rule
//! that matches decides the route class and anything left over is
//! [`RouteClass::Default`]. Classification is pure and never fails.
//!
//! Precedence:
//!
//! 1. `IconAsset`: same origin, path matches the icon pattern
//! 2. `CdnAsset`: host and path contain the configured CDN substrings
//! 3. `Ignored`: any other cross-origin request
//! 4. `Navigation`: navigate mode, or a GET that accepts `text/html`
//! 5. `ShellAsset`: path ends with an app shell manifest entry
//! 6. `Default`

use offgrid_core::{AppConfig, ConfigError};
use regex::Regex;
use reqwest::Method;
use url::Url;

use crate::request::{InterceptedRequest, RequestMode};

/// Routing class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    IconAsset,
    CdnAsset,
    Ignored,
    Navigation,
    ShellAsset,
    Default,
}

impl RouteClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::IconAsset => "icon_asset",
            RouteClass::CdnAsset => "cdn_asset",
            RouteClass::Ignored => "ignored",
            RouteClass::Navigation => "navigation",
            RouteClass::ShellAsset => "shell_asset",
            RouteClass::Default => "default",
        }
    }
}

impl std::fmt::Display for RouteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

trait Rule: Send + Sync {
    fn matches(&self, request: &InterceptedRequest) -> bool;
}

struct IconRule {
    origin: Url,
    pattern: Regex,
}

impl Rule for IconRule {
    fn matches(&self, request: &InterceptedRequest) -> bool {
        request.is_same_origin(&self.origin) && self.pattern.is_match(request.url.path())
    }
}

struct CdnRule {
    host: String,
    path: String,
}

impl Rule for CdnRule {
    fn matches(&self, request: &InterceptedRequest) -> bool {
        let host = request.url.host_str().unwrap_or("");
        host.contains(&self.host) && request.url.path().contains(&self.path)
    }
}

struct CrossOriginRule {
    origin: Url,
}

impl Rule for CrossOriginRule {
    fn matches(&self, request: &InterceptedRequest) -> bool {
        !request.is_same_origin(&self.origin)
    }
}

struct NavigationRule;

impl Rule for NavigationRule {
    fn matches(&self, request: &InterceptedRequest) -> bool {
        request.mode == RequestMode::Navigate
            || (request.method == Method::GET && request.accept().is_some_and(|a| a.contains("text/html")))
    }
}

struct ShellRule {
    tails: Vec<String>,
}

impl ShellRule {
    fn new(app_shell: &[String]) -> Self {
        Self { tails: app_shell.iter().map(|entry| shell_tail(entry)).collect() }
    }
}

impl Rule for ShellRule {
    fn matches(&self, request: &InterceptedRequest) -> bool {
        let path = request.url.path();
        self.tails.iter().any(|tail| path.ends_with(tail.as_str()))
    }
}

/// Manifest entry as a path suffix: `./app.js` becomes `/app.js`.
fn shell_tail(entry: &str) -> String {
    let entry = entry.trim();
    match entry.strip_prefix("./") {
        Some(rest) => format!("/{rest}"),
        None => entry.to_string(),
    }
}

/// Ordered rule table mapping requests to route classes.
pub struct Classifier {
    rules: Vec<(Box<dyn Rule>, RouteClass)>,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rules.iter().map(|(_, class)| *class).collect::<Vec<_>>())
            .finish()
    }
}

impl Classifier {
    /// Build the rule table.
    pub fn new(origin: Url, icon_pattern: Regex, cdn_host: &str, cdn_path: &str, app_shell: &[String]) -> Self {
        let rules: Vec<(Box<dyn Rule>, RouteClass)> = vec![
            (Box::new(IconRule { origin: origin.clone(), pattern: icon_pattern }), RouteClass::IconAsset),
            (Box::new(CdnRule { host: cdn_host.to_string(), path: cdn_path.to_string() }), RouteClass::CdnAsset),
            (Box::new(CrossOriginRule { origin }), RouteClass::Ignored),
            (Box::new(NavigationRule), RouteClass::Navigation),
            (Box::new(ShellRule::new(app_shell)), RouteClass::ShellAsset),
        ];
        Self { rules }
    }

    /// Build the rule table from application configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or icon pattern is malformed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let origin = config.origin_url()?;
        let icon_pattern = Regex::new(&config.icon_pattern)
            .map_err(|e| ConfigError::Invalid { field: "icon_pattern".into(), reason: e.to_string() })?;
        Ok(Self::new(origin, icon_pattern, &config.cdn_host, &config.cdn_path, &config.app_shell))
    }

    /// Assign `request` to exactly one route class.
    pub fn classify(&self, request: &InterceptedRequest) -> RouteClass {
        self.rules
            .iter()
            .find(|(rule, _)| rule.matches(request))
            .map(|(_, class)| *class)
            .unwrap_or(RouteClass::Default)
    }
}
