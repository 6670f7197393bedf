// Candidate selection - picks exactly one plugin for a URL
//
// Every plugin may claim every URL. Claims go into a flat list in
// registration order, which is then stably sorted by priority, so the
// first registered plugin wins among equals.

use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::cache::Decision;
use crate::plugins::{Claim, PluginClass, PluginRegistry};

struct Candidate {
    claim: Claim,
    class: Arc<PluginClass>,
}

/// Remembers which legacy plugins were already announced
#[derive(Default)]
pub struct DeprecationNotices {
    announced: Mutex<HashSet<String>>,
}

impl DeprecationNotices {
    /// Log once per plugin name; returns whether this call logged
    pub fn announce(&self, name: &str) -> bool {
        let first = self.announced.lock().insert(name.to_string());
        if first {
            info!(plugin = name, "Resolved plugin {} with deprecated predicate matching", name);
        }
        first
    }

    pub fn announced(&self) -> Vec<String> {
        let mut names: Vec<String> = self.announced.lock().iter().cloned().collect();
        names.sort();
        names
    }
}

/// Select the plugin responsible for `url`
pub fn select(registry: &PluginRegistry, url: &str, notices: &DeprecationNotices) -> Decision {
    let mut candidates: Vec<Candidate> = registry
        .iter()
        .filter_map(|class| {
            let claim = class.strategy().claim(url)?;
            if class.strategy().is_legacy() {
                notices.announce(class.name());
            }
            Some(Candidate {
                claim,
                class: class.clone(),
            })
        })
        .collect();

    // sort_by_key is stable
    candidates.sort_by_key(|candidate| Reverse(candidate.claim.priority));

    match candidates.into_iter().next() {
        Some(winner) => Decision::Resolved {
            class: winner.class,
            url: url.to_string(),
            matcher: winner.claim.matcher,
        },
        None => Decision::NoMatch {
            url: url.to_string(),
        },
    }
}
