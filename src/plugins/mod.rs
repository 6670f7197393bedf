// Plugin module - how site plugins describe themselves to the session
//
// Provides:
// - Priority levels and URL matchers
// - The legacy predicate shim for plugins without matchers
// - PluginRegistry, iterated in registration order
// - ResolvedPlugin, the bound instance exposing streams()

mod matcher;
mod priority;
mod registry;
mod resolved;
mod traits;

pub use matcher::{Claim, LegacyPredicate, MatchStrategy, Matcher, PriorityFn, UrlTest};
pub use priority::Priority;
pub use registry::{PluginClass, PluginFactory, PluginRegistry};
pub use resolved::{ResolvedPlugin, StreamOptions};
pub use traits::{Plugin, PluginError, PluginInput};
