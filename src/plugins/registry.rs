use std::fmt;
use std::sync::Arc;

use super::matcher::{LegacyPredicate, MatchStrategy, Matcher};
use super::traits::{Plugin, PluginInput};

/// Builds a plugin instance bound to a resolved URL
pub type PluginFactory = Arc<dyn Fn(PluginInput) -> Box<dyn Plugin> + Send + Sync>;

/// A registered plugin: name, how it claims URLs, how to build it
#[derive(Clone)]
pub struct PluginClass {
    name: String,
    strategy: MatchStrategy,
    factory: PluginFactory,
}

impl PluginClass {
    /// Matcher-based plugin
    pub fn new<F>(name: impl Into<String>, matchers: Vec<Matcher>, factory: F) -> Self
    where
        F: Fn(PluginInput) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            strategy: MatchStrategy::Matchers(matchers),
            factory: Arc::new(factory),
        }
    }

    /// Plugin still using the deprecated predicate API
    pub fn legacy<F>(name: impl Into<String>, predicate: LegacyPredicate, factory: F) -> Self
    where
        F: Fn(PluginInput) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            strategy: MatchStrategy::Legacy(predicate),
            factory: Arc::new(factory),
        }
    }

    /// Same class registered under another name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &MatchStrategy {
        &self.strategy
    }

    pub fn instantiate(&self, input: PluginInput) -> Box<dyn Plugin> {
        (self.factory)(input)
    }
}

impl fmt::Debug for PluginClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginClass")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Insertion-ordered set of plugin classes.
///
/// Iteration order is registration order; it decides ties between plugins
/// of equal priority.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<PluginClass>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. An existing plugin with the same name is replaced
    /// in place and returned.
    pub fn register(&mut self, plugin: PluginClass) -> Option<Arc<PluginClass>> {
        let plugin = Arc::new(plugin);
        match self.position(plugin.name()) {
            Some(index) => Some(std::mem::replace(&mut self.plugins[index], plugin)),
            None => {
                self.plugins.push(plugin);
                None
            }
        }
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<PluginClass>> {
        self.position(name).map(|index| self.plugins.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<Arc<PluginClass>> {
        self.position(name).map(|index| self.plugins[index].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PluginClass>> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn clear(&mut self) {
        self.plugins.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }
}

impl FromIterator<PluginClass> for PluginRegistry {
    fn from_iter<T: IntoIterator<Item = PluginClass>>(iter: T) -> Self {
        let mut registry = Self::new();
        for plugin in iter {
            registry.register(plugin);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::traits::PluginError;
    use crate::stream::RawStreams;
    use async_trait::async_trait;

    struct Empty;

    #[async_trait]
    impl Plugin for Empty {
        async fn get_streams(&self) -> Result<RawStreams, PluginError> {
            Ok(Vec::new())
        }
    }

    fn make_class(name: &str, pattern: &str) -> PluginClass {
        PluginClass::new(name, vec![Matcher::normal(pattern).unwrap()], |_| Box::new(Empty))
    }

    #[test]
    fn test_registration_order() {
        let registry: PluginRegistry = ["a", "b", "c"]
            .into_iter()
            .map(|name| make_class(name, "https://x"))
            .collect();

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = PluginRegistry::new();
        registry.register(make_class("a", "https://a"));
        registry.register(make_class("b", "https://b"));

        let replaced = registry.register(make_class("a", "https://override"));

        assert_eq!(replaced.map(|p| p.name().to_string()), Some("a".to_string()));
        assert_eq!(registry.names(), vec!["a", "b"]);
        let current = registry.get("a").unwrap();
        assert!(current.strategy().matches("https://override"));
    }

    #[test]
    fn test_unregister() {
        let mut registry = PluginRegistry::new();
        registry.register(make_class("a", "https://a"));

        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert!(registry.is_empty());
    }
}
