// StreamSelector - turns raw plugin streams into the final mapping
//
// Handles:
// - Transport type preference (merge duplicated names by stream type)
// - Name normalization (_alt suffixes, invalid characters, lowercase)
// - best / worst synonyms over the filtered sortable set
// - best-unfiltered / worst-unfiltered over every sortable stream

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::exclusion::Exclusions;
use super::traits::{RawStreams, StreamHandle, StreamMap};
use super::weight::weigh;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_+]+").unwrap();
}

pub const BEST: &str = "best";
pub const WORST: &str = "worst";
pub const BEST_UNFILTERED: &str = "best-unfiltered";
pub const WORST_UNFILTERED: &str = "worst-unfiltered";

/// Transport types preferred when none are requested
pub const DEFAULT_STREAM_TYPES: [&str; 4] = ["rtmp", "hls", "hds", "http"];

/// Wildcard matching any transport type
pub const ANY_STREAM_TYPE: &str = "*";

/// Priority used for types missing from the list (and no wildcard)
const UNLISTED_PRIORITY: usize = 99;

/// More alternates than this are dropped
const MAX_ALTERNATES: usize = 2;

/// Stream selector
pub struct StreamSelector;

impl StreamSelector {
    /// Default type order: the well-known transports, then anything else
    /// in order of first appearance
    pub fn default_stream_types(raw: &RawStreams) -> Vec<String> {
        let mut types: Vec<String> = DEFAULT_STREAM_TYPES.iter().map(|t| t.to_string()).collect();
        for (_, stream) in raw {
            let kind = stream.shortname();
            if !types.iter().any(|t| t == kind) {
                types.push(kind.to_string());
            }
        }
        types
    }

    /// Merge raw streams into uniquely named entries, preferring
    /// transport types that come first in `stream_types`
    pub fn merge(raw: RawStreams, stream_types: Option<&[String]>) -> StreamMap {
        let stream_types = match stream_types {
            Some(types) => types.to_vec(),
            None => Self::default_stream_types(&raw),
        };
        let wildcard = stream_types.iter().any(|t| t == ANY_STREAM_TYPE);

        let mut ordered = raw;
        // stable: equal priorities keep plugin order
        ordered.sort_by_key(|(_, stream)| Self::type_priority(&stream_types, stream.shortname()));

        let mut streams = StreamMap::new();
        for (name, stream) in ordered {
            let kind = stream.shortname().to_string();
            if !wildcard && !stream_types.iter().any(|t| *t == kind) {
                continue;
            }

            let mut name = name.strip_suffix("_alt").unwrap_or(&name).to_string();

            if let Some(existing) = streams.get(&name) {
                if existing.shortname() != kind {
                    name = format!("{}_{}", name, kind);
                }

                if streams.contains_key(&name) {
                    name = format!("{}_alt", name);
                    let alternates = streams.keys().filter(|n| n.starts_with(&name)).count();
                    if alternates >= MAX_ALTERNATES {
                        continue;
                    } else if alternates > 0 {
                        name = format!("{}{}", name, alternates + 1);
                    }
                }
            }

            let Some(valid) = NAME_RE.find(&name) else {
                debug!(name = %name, "Stream ignored since it is badly named");
                continue;
            };

            streams.insert(valid.as_str().to_lowercase(), stream);
        }

        streams
    }

    /// Add the best/worst synonyms to `streams`
    pub fn select(mut streams: StreamMap, exclusions: &Exclusions) -> StreamMap {
        let sortable: Vec<(&String, (u8, u64))> = streams
            .iter()
            .filter_map(|(name, _)| weigh(name).sort_key().map(|key| (name, key)))
            .collect();

        let unfiltered = Self::extremes(sortable.iter().copied());
        let filtered = Self::extremes(
            sortable
                .iter()
                .copied()
                .filter(|(name, _)| !exclusions.excludes(name)),
        );

        let mut synonyms: Vec<(String, StreamHandle)> = Vec::with_capacity(4);
        if let Some((worst, best)) = unfiltered {
            synonyms.push((WORST_UNFILTERED.to_string(), streams[worst].clone()));
            synonyms.push((BEST_UNFILTERED.to_string(), streams[best].clone()));
        }
        if let Some((worst, best)) = filtered {
            synonyms.push((WORST.to_string(), streams[worst].clone()));
            synonyms.push((BEST.to_string(), streams[best].clone()));
        }

        streams.extend(synonyms);
        streams
    }

    /// Merge then select, the full `streams()` pipeline
    pub fn build(raw: RawStreams, stream_types: Option<&[String]>, exclusions: &Exclusions) -> StreamMap {
        if raw.is_empty() {
            return StreamMap::new();
        }
        Self::select(Self::merge(raw, stream_types), exclusions)
    }

    /// (worst, best) names. Ties: best keeps the last maximum in scan
    /// order, worst keeps the first minimum.
    fn extremes<'a, I>(candidates: I) -> Option<(&'a String, &'a String)>
    where
        I: Iterator<Item = (&'a String, (u8, u64))> + Clone,
    {
        let best = candidates.clone().max_by_key(|(_, key)| *key)?.0;
        let worst = candidates.min_by_key(|(_, key)| *key)?.0;
        Some((worst, best))
    }

    fn type_priority(stream_types: &[String], kind: &str) -> usize {
        let position = |wanted: &str| stream_types.iter().position(|t| t == wanted);
        position(kind)
            .or_else(|| position(ANY_STREAM_TYPE))
            .unwrap_or(UNLISTED_PRIORITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::exclusion::ExclusionRule;
    use crate::stream::traits::UrlStream;
    use std::sync::Arc;

    fn make_stream(kind: &str, name: &str) -> StreamHandle {
        UrlStream::new(kind, format!("https://cdn.example/{}", name)).into_handle()
    }

    fn make_quality_map() -> StreamMap {
        ["1080p", "1500k", "3000k", "350k"]
            .into_iter()
            .map(|name| (name.to_string(), make_stream("http", name)))
            .collect()
    }

    fn same(streams: &StreamMap, alias: &str, name: &str) -> bool {
        Arc::ptr_eq(&streams[alias], &streams[name])
    }

    #[test]
    fn test_select_without_exclusions() {
        let streams = StreamSelector::select(make_quality_map(), &Exclusions::none());

        assert!(same(&streams, BEST, "1080p"));
        assert!(same(&streams, WORST, "350k"));
        assert!(same(&streams, BEST_UNFILTERED, "1080p"));
        assert!(same(&streams, WORST_UNFILTERED, "350k"));
        assert_eq!(streams.len(), 8);
    }

    #[test]
    fn test_select_with_name_exclusions() {
        let exclusions = Exclusions::parse(&["1080p", "3000k"]).unwrap();
        let streams = StreamSelector::select(make_quality_map(), &exclusions);

        assert!(same(&streams, BEST, "1500k"));
        assert!(same(&streams, WORST, "350k"));
        assert!(streams.contains_key("1080p"));
    }

    #[test]
    fn test_select_with_comparison_exclusions() {
        let exclusions = Exclusions::parse(&[">=1080p", ">1500k"]).unwrap();
        let streams = StreamSelector::select(make_quality_map(), &exclusions);

        assert!(same(&streams, BEST, "1500k"));
    }

    #[test]
    fn test_select_with_predicate() {
        let exclusions = Exclusions::from_predicate(|name| name.ends_with('p'));
        let streams = StreamSelector::select(make_quality_map(), &exclusions);

        assert!(same(&streams, BEST, "3000k"));
        assert!(same(&streams, WORST, "350k"));
    }

    #[test]
    fn test_select_excluding_everything_keeps_unfiltered() {
        let exclusions = Exclusions::from_predicate(|_| true);
        let streams = StreamSelector::select(make_quality_map(), &exclusions);

        assert!(!streams.contains_key(BEST));
        assert!(!streams.contains_key(WORST));
        assert!(same(&streams, BEST_UNFILTERED, "1080p"));
        assert!(same(&streams, WORST_UNFILTERED, "350k"));
    }

    #[test]
    fn test_select_unsortable_only() {
        let map: StreamMap = ["vod", "vod_alt"]
            .into_iter()
            .map(|name| (name.to_string(), make_stream("http", name)))
            .collect();

        let streams = StreamSelector::select(map, &Exclusions::none());

        assert_eq!(streams.len(), 2);
        assert!(streams.contains_key("vod"));
        assert!(streams.contains_key("vod_alt"));
    }

    #[test]
    fn test_select_tie_break() {
        // "0720p" and "720p" weigh the same
        let map: StreamMap = ["0720p", "720p", "360p"]
            .into_iter()
            .map(|name| (name.to_string(), make_stream("http", name)))
            .collect();

        let streams = StreamSelector::select(map, &Exclusions::none());

        assert!(same(&streams, BEST, "720p"));
        assert!(same(&streams, WORST, "360p"));

        let map: StreamMap = ["0360p", "360p"]
            .into_iter()
            .map(|name| (name.to_string(), make_stream("http", name)))
            .collect();
        let streams = StreamSelector::select(map, &Exclusions::none());

        assert!(same(&streams, WORST, "0360p"));
        assert!(same(&streams, BEST, "360p"));
    }

    #[test]
    fn test_merge_prefers_listed_type_order() {
        let raw = || -> RawStreams {
            vec![
                ("480p".to_string(), make_stream("http", "480p-http")),
                ("480p".to_string(), make_stream("rtmp", "480p-rtmp")),
            ]
        };

        let http_first = vec!["http".to_string(), "rtmp".to_string()];
        let streams = StreamSelector::merge(raw(), Some(&http_first));
        assert_eq!(streams["480p"].shortname(), "http");
        assert_eq!(streams["480p_rtmp"].shortname(), "rtmp");

        let rtmp_first = vec!["rtmp".to_string(), "http".to_string()];
        let streams = StreamSelector::merge(raw(), Some(&rtmp_first));
        assert_eq!(streams["480p"].shortname(), "rtmp");
        assert_eq!(streams["480p_http"].shortname(), "http");
    }

    #[test]
    fn test_merge_drops_unlisted_types_without_wildcard() {
        let raw: RawStreams = vec![
            ("720p".to_string(), make_stream("hls", "720p")),
            ("live".to_string(), make_stream("dash", "live")),
        ];

        let only_hls = vec!["hls".to_string()];
        let streams = StreamSelector::merge(raw.clone(), Some(&only_hls));
        assert_eq!(streams.len(), 1);

        let with_wildcard = vec!["hls".to_string(), ANY_STREAM_TYPE.to_string()];
        let streams = StreamSelector::merge(raw, Some(&with_wildcard));
        assert_eq!(streams.len(), 2);
    }

    #[test]
    fn test_merge_alternate_naming() {
        let raw: RawStreams = vec![
            ("vod".to_string(), make_stream("http", "a")),
            ("vod_alt".to_string(), make_stream("http", "b")),
            ("vod".to_string(), make_stream("http", "c")),
            ("vod".to_string(), make_stream("http", "d")),
        ];

        let streams = StreamSelector::merge(raw, None);

        assert_eq!(
            streams.keys().cloned().collect::<Vec<_>>(),
            vec!["vod", "vod_alt", "vod_alt2"]
        );
        assert_eq!(streams["vod_alt2"].url(), Some("https://cdn.example/c"));
    }

    #[test]
    fn test_merge_normalizes_names() {
        let raw: RawStreams = vec![
            ("HD Stream".to_string(), make_stream("hls", "hd")),
            ("???".to_string(), make_stream("hls", "bad")),
            ("720p+".to_string(), make_stream("hls", "plus")),
        ];

        let streams = StreamSelector::merge(raw, None);

        assert!(streams.contains_key("hd"));
        assert!(streams.contains_key("720p+"));
        assert_eq!(streams.len(), 2);
    }

    #[test]
    fn test_default_stream_types_appends_unknown() {
        let raw: RawStreams = vec![
            ("a".to_string(), make_stream("dash", "a")),
            ("b".to_string(), make_stream("hls", "b")),
            ("c".to_string(), make_stream("akamaihd", "c")),
        ];

        assert_eq!(
            StreamSelector::default_stream_types(&raw),
            vec!["rtmp", "hls", "hds", "http", "dash", "akamaihd"]
        );
    }

    #[test]
    fn test_build_empty_has_no_synonyms() {
        let streams = StreamSelector::build(Vec::new(), None, &Exclusions::none());
        assert!(streams.is_empty());
    }

    #[test]
    fn test_build_with_rule_list() {
        let raw: RawStreams = make_quality_map().into_iter().collect();
        let exclusions = Exclusions::new(vec![ExclusionRule::name("1080p")]);

        let streams = StreamSelector::build(raw, None, &exclusions);

        assert!(same(&streams, BEST, "3000k"));
        assert!(same(&streams, BEST_UNFILTERED, "1080p"));
    }
}
