//! Per-client memory of recent generations, used to steer new recipes away
//! from repeats.
//!
//! The tracker is the only process-wide mutable state in the pipeline. It is
//! owned by whoever builds the [`crate::Kitchen`] and passed in, so tests get
//! isolated instances. Every mutation happens under the map's per-key entry
//! guard, so append and eviction for one client are atomic and clients never
//! contend with each other.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::classify::extract::{cuisines_in, techniques_in, CUISINES, TECHNIQUES};

pub const WORD_CAPACITY: usize = 15;
pub const CUISINE_CAPACITY: usize = 10;
pub const TECHNIQUE_CAPACITY: usize = 10;

/// Memory older than this is treated as absent.
pub const DEFAULT_VALIDITY_DAYS: i64 = 7;

/// Items seen at least this often in the window are avoided outright.
const AVOID_THRESHOLD: usize = 2;

const MIN_WORD_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "with", "for", "from", "into", "onto", "over", "under", "your", "our", "its",
    "style", "recipe", "easy", "quick", "simple", "best", "homemade", "classic", "perfect",
    "ultimate", "minute", "minutes", "hour", "one", "pot", "pan", "tray",
];

/// Fixed-capacity FIFO buffer. Pushing into a full buffer evicts the oldest
/// entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: PartialEq> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn count(&self, item: &T) -> usize {
        self.items.iter().filter(|i| *i == item).count()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// What one client has been served recently.
#[derive(Debug, Clone)]
pub struct VarietyMemory {
    pub words: RingBuffer<String>,
    pub cuisines: RingBuffer<String>,
    pub techniques: RingBuffer<String>,
    /// Successful generations since the memory was created or last reset.
    pub generations: u64,
    pub last_seen_at: DateTime<Utc>,
}

impl VarietyMemory {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            words: RingBuffer::new(WORD_CAPACITY),
            cuisines: RingBuffer::new(CUISINE_CAPACITY),
            techniques: RingBuffer::new(TECHNIQUE_CAPACITY),
            generations: 0,
            last_seen_at: now,
        }
    }

    fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }
}

/// Hints for the prompt assembler.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VarietyGuidance {
    pub avoid_words: Vec<String>,
    pub avoid_cuisines: Vec<String>,
    pub avoid_techniques: Vec<String>,
    pub suggest_cuisine: Option<String>,
    pub suggest_technique: Option<String>,
}

impl VarietyGuidance {
    pub fn is_empty(&self) -> bool {
        self.avoid_words.is_empty()
            && self.avoid_cuisines.is_empty()
            && self.avoid_techniques.is_empty()
            && self.suggest_cuisine.is_none()
            && self.suggest_technique.is_none()
    }
}

/// Split a title into lower-case content words.
pub fn title_words(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphabetic())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= MIN_WORD_LEN && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[derive(Debug)]
pub struct VarietyTracker {
    entries: DashMap<String, VarietyMemory>,
    validity: Duration,
}

impl Default for VarietyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VarietyTracker {
    pub fn new() -> Self {
        Self::with_validity(Duration::days(DEFAULT_VALIDITY_DAYS))
    }

    pub fn with_validity(validity: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            validity,
        }
    }

    fn is_stale(&self, memory: &VarietyMemory, now: DateTime<Utc>) -> bool {
        now - memory.last_seen_at > self.validity
    }

    /// Record a successfully generated title for `client_id`.
    pub fn record_title(&self, client_id: &str, title: &str) {
        self.record_title_at(client_id, title, Utc::now());
    }

    pub(crate) fn record_title_at(&self, client_id: &str, title: &str, now: DateTime<Utc>) {
        let mut memory = self
            .entries
            .entry(client_id.to_string())
            .or_insert_with(|| VarietyMemory::new(now));

        if self.is_stale(&memory, now) {
            tracing::debug!(client_id, "Variety memory expired, starting fresh");
            memory.reset(now);
        }

        let lower = title.to_lowercase();
        for word in title_words(title) {
            memory.words.push(word);
        }
        for cuisine in cuisines_in(&lower) {
            memory.cuisines.push(cuisine);
        }
        for technique in techniques_in(&lower) {
            memory.techniques.push(technique);
        }
        memory.generations += 1;
        memory.last_seen_at = now;
    }

    /// Snapshot of the client's memory, or `None` if absent or stale.
    pub fn memory(&self, client_id: &str) -> Option<VarietyMemory> {
        self.memory_at(client_id, Utc::now())
    }

    fn memory_at(&self, client_id: &str, now: DateTime<Utc>) -> Option<VarietyMemory> {
        self.entries
            .get(client_id)
            .filter(|m| !self.is_stale(m, now))
            .map(|m| m.value().clone())
    }

    pub fn recent_words(&self, client_id: &str) -> HashSet<String> {
        self.recent_words_at(client_id, Utc::now())
    }

    pub(crate) fn recent_words_at(&self, client_id: &str, now: DateTime<Utc>) -> HashSet<String> {
        self.memory_at(client_id, now)
            .map(|m| m.words.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Guidance for the next generation for `client_id`.
    ///
    /// `avoid` holds extra items the caller wants avoided; cuisine and
    /// technique names are routed to their lists, anything else is treated
    /// as a title word.
    pub fn variety_guidance(&self, client_id: &str, avoid: &HashSet<String>) -> VarietyGuidance {
        self.variety_guidance_at(client_id, avoid, Utc::now())
    }

    pub(crate) fn variety_guidance_at(
        &self,
        client_id: &str,
        avoid: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> VarietyGuidance {
        let memory = self
            .memory_at(client_id, now)
            .unwrap_or_else(|| VarietyMemory::new(now));

        let mut avoid_words = repeated(&memory.words);
        let mut avoid_cuisines = repeated(&memory.cuisines);
        let mut avoid_techniques = repeated(&memory.techniques);

        for item in avoid {
            let item = item.trim().to_lowercase();
            if item.is_empty() {
                continue;
            }
            if CUISINES.contains(&item.as_str()) {
                avoid_cuisines.insert(item);
            } else if TECHNIQUES.iter().any(|(label, _)| *label == item) {
                avoid_techniques.insert(item);
            } else {
                avoid_words.insert(item);
            }
        }

        let offset = memory.generations as usize;
        let suggest_cuisine = rotate(
            CUISINES.iter().copied(),
            offset,
            &avoid_cuisines,
            &memory.cuisines,
        );
        let suggest_technique = rotate(
            TECHNIQUES.iter().map(|(label, _)| *label),
            offset,
            &avoid_techniques,
            &memory.techniques,
        );

        VarietyGuidance {
            avoid_words: avoid_words.into_iter().collect(),
            avoid_cuisines: avoid_cuisines.into_iter().collect(),
            avoid_techniques: avoid_techniques.into_iter().collect(),
            suggest_cuisine,
            suggest_technique,
        }
    }

    /// Number of clients ever seen.
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}

fn repeated(ring: &RingBuffer<String>) -> BTreeSet<String> {
    ring.iter()
        .filter(|item| ring.count(item) >= AVOID_THRESHOLD)
        .cloned()
        .collect()
}

/// Walk `options` from `offset`, skipping avoided items; prefer one not in
/// `recent`.
fn rotate<'a>(
    options: impl Iterator<Item = &'a str>,
    offset: usize,
    avoided: &BTreeSet<String>,
    recent: &RingBuffer<String>,
) -> Option<String> {
    let options: Vec<&str> = options.collect();
    if options.is_empty() {
        return None;
    }
    let start = offset % options.len();
    let candidates: Vec<&str> = options[start..]
        .iter()
        .chain(&options[..start])
        .copied()
        .filter(|o| !avoided.contains(*o))
        .collect();

    candidates
        .iter()
        .find(|o| !recent.contains(&o.to_string()))
        .or_else(|| candidates.first())
        .map(|o| o.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut ring = RingBuffer::new(3);
        for i in 0..5 {
            ring.push(i);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_title_words_drop_noise() {
        assert_eq!(
            title_words("Easy One-Pot Thai Green Curry with Tofu"),
            vec!["thai", "green", "curry", "tofu"]
        );
    }

    #[test]
    fn test_word_history_is_bounded_fifo() {
        let tracker = VarietyTracker::new();
        for i in 0..20 {
            tracker.record_title("c1", &format!("dish{} {}", ["alpha", "beta"][i % 2], "x"));
        }
        let memory = tracker.memory("c1").unwrap();
        assert!(memory.words.len() <= WORD_CAPACITY);

        let tracker = VarietyTracker::new();
        let words = [
            "apple", "banana", "cherry", "damson", "elder", "fig", "grape", "hazel", "iceberg",
            "jujube", "kale", "lime", "mango", "nectarine", "orange", "papaya", "quince",
        ];
        for word in words {
            tracker.record_title("c1", word);
        }
        let memory = tracker.memory("c1").unwrap();
        let kept: Vec<&str> = memory.words.iter().map(String::as_str).collect();
        assert_eq!(kept.len(), WORD_CAPACITY);
        assert_eq!(kept, words[2..].to_vec());
        assert_eq!(memory.generations, words.len() as u64);
    }

    #[test]
    fn test_repeated_items_are_avoided() {
        let tracker = VarietyTracker::new();
        tracker.record_title("c1", "Thai Basil Chicken");
        tracker.record_title("c1", "Thai Coconut Soup");
        tracker.record_title("c1", "Roast Chicken Thighs");

        let guidance = tracker.variety_guidance("c1", &HashSet::new());
        assert!(guidance.avoid_words.contains(&"chicken".to_string()));
        assert!(guidance.avoid_words.contains(&"thai".to_string()));
        assert_eq!(guidance.avoid_cuisines, vec!["thai"]);
        assert!(!guidance.avoid_words.contains(&"soup".to_string()));
    }

    #[test]
    fn test_caller_avoid_set_is_routed() {
        let tracker = VarietyTracker::new();
        let guidance = tracker.variety_guidance("c1", &set(&["Italian", "roasting", "mushroom"]));
        assert_eq!(guidance.avoid_cuisines, vec!["italian"]);
        assert_eq!(guidance.avoid_techniques, vec!["roasting"]);
        assert_eq!(guidance.avoid_words, vec!["mushroom"]);
        assert_ne!(guidance.suggest_cuisine.as_deref(), Some("italian"));
    }

    #[test]
    fn test_suggestions_never_avoided() {
        let tracker = VarietyTracker::new();
        let titles = [
            "Italian Roast Lamb",
            "Italian Roast Potatoes",
            "French Braised Leeks",
            "French Braised Beef",
            "Korean Grilled Pork",
        ];
        let avoid_sets = [
            set(&[]),
            set(&["italian", "french", "spanish", "greek"]),
            set(&CUISINES.iter().take(CUISINES.len() - 1).copied().collect::<Vec<_>>()),
            set(&["pan-searing", "roasting", "braising"]),
        ];
        for title in titles {
            tracker.record_title("c1", title);
            for avoid in &avoid_sets {
                let g = tracker.variety_guidance("c1", avoid);
                if let Some(c) = &g.suggest_cuisine {
                    assert!(!g.avoid_cuisines.contains(c), "{c} suggested and avoided");
                }
                if let Some(t) = &g.suggest_technique {
                    assert!(!g.avoid_techniques.contains(t), "{t} suggested and avoided");
                }
            }
        }
    }

    #[test]
    fn test_everything_avoided_gives_no_suggestion() {
        let tracker = VarietyTracker::new();
        let g = tracker.variety_guidance("c1", &CUISINES.iter().map(|c| c.to_string()).collect());
        assert_eq!(g.suggest_cuisine, None);
    }

    #[test]
    fn test_suggestion_rotates_with_generation_count() {
        let tracker = VarietyTracker::new();
        let first = tracker.variety_guidance("c1", &HashSet::new());
        assert_eq!(first.suggest_cuisine.as_deref(), Some(CUISINES[0]));

        tracker.record_title("c1", "Plain Toast");
        let second = tracker.variety_guidance("c1", &HashSet::new());
        assert_eq!(second.suggest_cuisine.as_deref(), Some(CUISINES[1]));

        // Same state, same answer.
        assert_eq!(second, tracker.variety_guidance("c1", &HashSet::new()));
    }

    #[test]
    fn test_recently_seen_suggestion_is_skipped() {
        let tracker = VarietyTracker::new();
        // After one generation the rotation starts at CUISINES[1].
        tracker.record_title("c1", &format!("{} Noodles", CUISINES[1]));
        let g = tracker.variety_guidance("c1", &HashSet::new());
        assert_eq!(g.suggest_cuisine.as_deref(), Some(CUISINES[2]));
    }

    #[test]
    fn test_stale_memory_ignored_then_reset() {
        let tracker = VarietyTracker::new();
        let start = Utc::now();
        tracker.record_title_at("c1", "Thai Curry", start);
        tracker.record_title_at("c1", "Thai Salad", start);

        let later = start + Duration::days(DEFAULT_VALIDITY_DAYS + 1);
        assert!(tracker.recent_words_at("c1", later).is_empty());
        let g = tracker.variety_guidance_at("c1", &HashSet::new(), later);
        assert!(g.avoid_cuisines.is_empty());

        tracker.record_title_at("c1", "Greek Salad", later);
        let words = tracker.recent_words_at("c1", later);
        assert_eq!(words, set(&["greek", "salad"]));
        assert_eq!(tracker.tracked_clients(), 1);
    }

    #[test]
    fn test_clients_are_isolated() {
        let tracker = VarietyTracker::new();
        tracker.record_title("a", "Mushroom Risotto");
        assert!(tracker.recent_words("b").is_empty());
        assert!(tracker.recent_words("a").contains("risotto"));
    }
}
