use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use serde::Serialize;

use crate::error::{CaptionError, Result};

/// One segment's transcript with its time offset and per-language
/// translation cache.
#[derive(Debug, Clone)]
pub struct CaptionEntry {
    /// Start time of the segment this entry covers, in seconds.
    pub time: f64,
    /// Base-language transcript. May be empty for silent segments.
    pub text: String,
    /// Lazily populated translations, keyed by language code.
    pub translations: HashMap<String, String>,
}

impl CaptionEntry {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
            translations: HashMap::new(),
        }
    }
}

/// A single row returned from a caption query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    pub time: f64,
    pub text: String,
}

/// Captions for one video, keyed by segment index. Entries arrive out of
/// order as recognition calls settle; iteration order is restored by the
/// index key, not by insertion order.
pub type VideoCaptionSet = BTreeMap<u32, CaptionEntry>;

struct StoreInner {
    videos: HashMap<String, VideoCaptionSet>,
    /// Video URLs in the order their sets were created, for eviction.
    order: VecDeque<String>,
    /// URLs currently being processed. A second request for the same URL
    /// is rejected rather than allowed to race the first run's writes.
    in_flight: HashSet<String>,
}

/// Process-wide caption state, keyed by verbatim video URL.
///
/// Holds at most `max_videos` caption sets; creating a set beyond that
/// capacity evicts the oldest completed one.
pub struct CaptionStore {
    inner: RwLock<StoreInner>,
    max_videos: usize,
}

impl CaptionStore {
    pub fn new(max_videos: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                videos: HashMap::new(),
                order: VecDeque::new(),
                in_flight: HashSet::new(),
            }),
            max_videos,
        }
    }

    /// Create a fresh caption set for `video_url`, discarding any prior
    /// set for the same key, and mark the URL as in flight.
    ///
    /// Fails with `ProcessingInProgress` if the URL is already being
    /// processed. Callers must pair this with `finish_video` on every
    /// exit path.
    pub fn begin_video(&self, video_url: &str) -> Result<()> {
        let mut inner = self.inner.write().expect("caption store lock poisoned");

        if inner.in_flight.contains(video_url) {
            return Err(CaptionError::ProcessingInProgress(video_url.to_string()));
        }

        if inner.videos.remove(video_url).is_some() {
            inner.order.retain(|url| url != video_url);
        }

        while inner.videos.len() >= self.max_videos {
            let Some(pos) = inner
                .order
                .iter()
                .position(|url| !inner.in_flight.contains(url))
            else {
                break;
            };
            if let Some(evicted) = inner.order.remove(pos) {
                inner.videos.remove(&evicted);
                tracing::debug!("Evicted caption set for {}", evicted);
            }
        }

        inner.videos.insert(video_url.to_string(), BTreeMap::new());
        inner.order.push_back(video_url.to_string());
        inner.in_flight.insert(video_url.to_string());
        Ok(())
    }

    /// Clear the in-flight mark for `video_url`.
    pub fn finish_video(&self, video_url: &str) {
        let mut inner = self.inner.write().expect("caption store lock poisoned");
        inner.in_flight.remove(video_url);
    }

    /// Insert one entry under its segment index. A no-op if the video's
    /// set no longer exists (evicted while its run was still settling).
    pub fn insert_entry(&self, video_url: &str, index: u32, entry: CaptionEntry) {
        let mut inner = self.inner.write().expect("caption store lock poisoned");
        if let Some(set) = inner.videos.get_mut(video_url) {
            set.insert(index, entry);
        }
    }

    /// Query entries in the half-open window `[start, end)`.
    ///
    /// When `language` is given, each entry's cached translation for that
    /// language replaces the base text; entries without one keep the base
    /// text unchanged. An unknown video yields an empty list.
    pub fn get_captions(
        &self,
        video_url: &str,
        start: f64,
        end: f64,
        language: Option<&str>,
    ) -> Vec<Caption> {
        let inner = self.inner.read().expect("caption store lock poisoned");
        let Some(set) = inner.videos.get(video_url) else {
            return Vec::new();
        };

        set.values()
            .filter(|entry| entry.time >= start && entry.time < end)
            .map(|entry| {
                let text = language
                    .and_then(|lang| entry.translations.get(lang))
                    .unwrap_or(&entry.text)
                    .clone();
                Caption {
                    time: entry.time,
                    text,
                }
            })
            .collect()
    }

    /// Entries of `video_url` still missing a translation for `language`,
    /// as `(index, base text)` pairs in timeline order.
    pub fn untranslated_entries(
        &self,
        video_url: &str,
        language: &str,
    ) -> Result<Vec<(u32, String)>> {
        let inner = self.inner.read().expect("caption store lock poisoned");
        let set = inner
            .videos
            .get(video_url)
            .ok_or_else(|| CaptionError::NotFound(video_url.to_string()))?;

        Ok(set
            .iter()
            .filter(|(_, entry)| !entry.translations.contains_key(language))
            .map(|(index, entry)| (*index, entry.text.clone()))
            .collect())
    }

    /// Memoize a translation for one entry. Overwriting the same key with
    /// the same text is a benign race between concurrent requests.
    pub fn set_translation(&self, video_url: &str, index: u32, language: &str, text: String) {
        let mut inner = self.inner.write().expect("caption store lock poisoned");
        if let Some(entry) = inner
            .videos
            .get_mut(video_url)
            .and_then(|set| set.get_mut(&index))
        {
            entry.translations.insert(language.to_string(), text);
        }
    }

    /// Whether a caption set exists for `video_url`.
    pub fn contains(&self, video_url: &str) -> bool {
        let inner = self.inner.read().expect("caption store lock poisoned");
        inner.videos.contains_key(video_url)
    }

    /// Number of caption sets currently stored.
    pub fn video_count(&self) -> usize {
        let inner = self.inner.read().expect("caption store lock poisoned");
        inner.videos.len()
    }

    /// Number of entries stored for `video_url`, or None if unknown.
    pub fn entry_count(&self, video_url: &str) -> Option<usize> {
        let inner = self.inner.read().expect("caption store lock poisoned");
        inner.videos.get(video_url).map(|set| set.len())
    }
}
