// Session module - public resolution API
//
// Strategy:
// 1. Normalize the URL scheme (bare hosts become https://)
// 2. Answer from the decision cache when possible
// 3. Follow redirects through the HTTP collaborator (resolve_url only)
// 4. Pick the highest-priority plugin, first registered among equals
// 5. Cache the decision and bind a fresh plugin instance to the URL

mod cache;
mod config;
mod errors;
mod http;
mod resolver;
mod url;

pub use cache::{CacheInfo, CacheKey, Decision, ResolutionCache};
pub use config::{SessionConfig, DEFAULT_USER_AGENT};
pub use errors::{HttpError, SessionError};
pub use http::{build_client, HttpRedirectResolver, RedirectResolver};
pub use resolver::DeprecationNotices;
pub use url::update_scheme;

use std::sync::Arc;
use tracing::debug;

use crate::plugins::{PluginClass, PluginInput, PluginRegistry, ResolvedPlugin};

/// Entry point: owns the plugin registry and resolves URLs to plugins.
///
/// Registry changes do not invalidate cached decisions; call
/// `cache_clear()` after mutating the registry.
pub struct Session {
    config: SessionConfig,
    client: reqwest::Client,
    redirects: Arc<dyn RedirectResolver>,
    registry: PluginRegistry,
    cache: ResolutionCache,
    notices: DeprecationNotices,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let client = build_client(&config)?;
        let redirects = Arc::new(HttpRedirectResolver::new(client.clone()));
        Ok(Self {
            cache: ResolutionCache::new(config.cache_capacity),
            config,
            client,
            redirects,
            registry: PluginRegistry::new(),
            notices: DeprecationNotices::default(),
        })
    }

    /// Replace the HTTP collaborator used for redirect resolution
    pub fn with_redirect_resolver(mut self, resolver: Arc<dyn RedirectResolver>) -> Self {
        self.redirects = resolver;
        self
    }

    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared HTTP client handed to plugins
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn register(&mut self, plugin: PluginClass) -> Option<Arc<PluginClass>> {
        self.registry.register(plugin)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<PluginClass>> {
        self.registry.unregister(name)
    }

    pub fn plugin(&self, name: &str) -> Option<Arc<PluginClass>> {
        self.registry.get(name)
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Resolve `url`, following redirects first
    pub async fn resolve_url(&self, url: &str) -> Result<ResolvedPlugin, SessionError> {
        self.resolve(url, true).await
    }

    /// Resolve `url` exactly as given
    pub async fn resolve_url_no_redirect(&self, url: &str) -> Result<ResolvedPlugin, SessionError> {
        self.resolve(url, false).await
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.info()
    }

    pub fn cache_clear(&self) {
        self.cache.clear();
    }

    /// Legacy plugins that have been announced as deprecated so far
    pub fn deprecation_notices(&self) -> Vec<String> {
        self.notices.announced()
    }

    async fn resolve(&self, url: &str, follow_redirects: bool) -> Result<ResolvedPlugin, SessionError> {
        let url = update_scheme("https://", url);
        let key = CacheKey {
            url: url.clone(),
            follow_redirects,
        };

        let decision = match self.cache.get(&key) {
            Some(decision) => {
                debug!(url = %url, follow_redirects, "Resolution cache hit");
                decision
            }
            None => {
                let target = if follow_redirects {
                    self.redirects.resolve(&url).await?
                } else {
                    url
                };
                let decision = resolver::select(&self.registry, &target, &self.notices);
                self.cache.insert(key, decision.clone());
                decision
            }
        };

        self.bind(decision)
    }

    fn bind(&self, decision: Decision) -> Result<ResolvedPlugin, SessionError> {
        match decision {
            Decision::Resolved { class, url, matcher } => {
                let groups = class.strategy().groups(&url, matcher);
                debug!(plugin = class.name(), url = %url, "Resolved plugin");

                let input = PluginInput {
                    url: url.clone(),
                    groups,
                    http: self.client.clone(),
                };
                Ok(ResolvedPlugin::new(class.name(), url, class.instantiate(input)))
            }
            Decision::NoMatch { url } => Err(SessionError::NoPlugin(url)),
        }
    }
}
