// Stream module - quality weighting and best/worst selection
//
// Plugins hand back raw (name, handle) pairs; this module merges them by
// transport type and adds the best / worst synonyms.

mod errors;
mod exclusion;
mod selector;
mod traits;
mod weight;

pub use errors::StreamError;
pub use exclusion::{CompareOp, ExclusionRule, Exclusions, NamePredicate};
pub use selector::{
    StreamSelector, ANY_STREAM_TYPE, BEST, BEST_UNFILTERED, DEFAULT_STREAM_TYPES, WORST,
    WORST_UNFILTERED,
};
pub use traits::{RawStreams, Stream, StreamHandle, StreamMap, UrlStream};
pub use weight::{weigh, QualityWeight, WeightClass};
