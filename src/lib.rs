pub mod plugins;
pub mod session;
pub mod stream;
pub mod websocket;

pub use plugins::{
    LegacyPredicate, Matcher, Plugin, PluginClass, PluginError, PluginInput, PluginRegistry,
    Priority, ResolvedPlugin, StreamOptions,
};
pub use session::{CacheInfo, HttpError, RedirectResolver, Session, SessionConfig, SessionError};
pub use stream::{
    weigh, ExclusionRule, Exclusions, QualityWeight, Stream, StreamHandle, StreamMap,
    StreamSelector, WeightClass,
};
pub use websocket::{SocketConfig, SocketError, SocketHandler, SocketState, WebsocketClient};
