//! Curriculum cache
//!
//! Expiry map keyed by `(course, student or "public", progress, resources)`.
//! Entries older than their TTL read as absent. An optional capacity bound
//! evicts the oldest insert first; there is no LRU bookkeeping.
//!
//! Time comes from `tokio::time::Instant` so tests can drive expiry with a
//! paused clock.

use lms_common::Curriculum;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::types::CurriculumRequest;

/// Audience segment used for anonymous requests
pub const PUBLIC_AUDIENCE: &str = "public";

/// Composite cache key
///
/// Anonymous requests share the `"public"` audience, so a student whose id
/// is literally `public` reads the anonymous entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub course_id: String,
    pub audience: String,
    pub include_progress: bool,
    pub include_resources: bool,
}

impl CacheKey {
    pub fn from_request(request: &CurriculumRequest) -> Self {
        Self {
            course_id: request.course_id.clone(),
            audience: request
                .student_id
                .clone()
                .unwrap_or_else(|| PUBLIC_AUDIENCE.to_string()),
            include_progress: request.include_progress,
            include_resources: request.include_resources,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.course_id,
            self.audience,
            self.include_progress,
            self.include_resources
        )
    }
}

/// Injectable cache interface
#[async_trait::async_trait]
pub trait CurriculumCache: Send + Sync {
    async fn has(&self, key: &CacheKey) -> bool;

    async fn get(&self, key: &CacheKey) -> Option<Arc<Curriculum>>;

    async fn set(&self, key: CacheKey, value: Arc<Curriculum>, ttl: Duration);

    /// Drop every entry, returning how many were removed
    async fn clear(&self) -> usize;

    /// Number of stored entries, expired ones included until pruned
    async fn len(&self) -> usize;
}

struct CacheEntry {
    value: Arc<Curriculum>,
    expires_at: Instant,
    /// Insertion sequence for oldest-first eviction
    seq: u64,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
}

/// In-memory TTL cache
pub struct TtlCache {
    state: RwLock<CacheState>,
    max_entries: Option<usize>,
}

impl TtlCache {
    /// Unbounded cache
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            max_entries: None,
        }
    }

    /// Cache holding at most `max_entries` curricula
    pub fn with_capacity_limit(max_entries: usize) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            max_entries: Some(max_entries.max(1)),
        }
    }

    /// Remove expired entries, returning how many were dropped
    pub async fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_live(now));
        before - state.entries.len()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CurriculumCache for TtlCache {
    async fn has(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        let state = self.state.read().await;
        state.entries.get(key).is_some_and(|entry| entry.is_live(now))
    }

    async fn get(&self, key: &CacheKey) -> Option<Arc<Curriculum>> {
        let now = Instant::now();
        let state = self.state.read().await;
        state
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| Arc::clone(&entry.value))
    }

    async fn set(&self, key: CacheKey, value: Arc<Curriculum>, ttl: Duration) {
        let now = Instant::now();
        let mut state = self.state.write().await;

        if let Some(max) = self.max_entries {
            if !state.entries.contains_key(&key) && state.entries.len() >= max {
                state.entries.retain(|_, entry| entry.is_live(now));
            }
            while !state.entries.contains_key(&key) && state.entries.len() >= max {
                let oldest = state
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.seq)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(oldest) => {
                        debug!(key = %oldest, "Evicting oldest cached curriculum");
                        state.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
                seq,
            },
        );
    }

    async fn clear(&self) -> usize {
        let mut state = self.state.write().await;
        let removed = state.entries.len();
        state.entries.clear();
        removed
    }

    async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleGenerator;

    fn key(course: &str) -> CacheKey {
        CacheKey::from_request(&CurriculumRequest::new(course))
    }

    fn curriculum(course: &str) -> Arc<Curriculum> {
        Arc::new(SampleGenerator::default().generate(course))
    }

    #[test]
    fn test_key_display_uses_public_for_anonymous() {
        assert_eq!(key("c1").to_string(), "c1:public:false:true");

        let student = CacheKey::from_request(
            &CurriculumRequest::new("c1")
                .for_student("s9")
                .with_progress(true),
        );
        assert_eq!(student.to_string(), "c1:s9:true:true");
    }

    #[test]
    fn test_student_named_public_shares_anonymous_key() {
        let named = CacheKey::from_request(&CurriculumRequest::new("c1").for_student(PUBLIC_AUDIENCE));
        assert_eq!(named, key("c1"));
        assert_ne!(CacheKey::from_request(&CurriculumRequest::new("c1").for_student("s1")), key("c1"));
    }

    #[test]
    fn test_key_distinguishes_flags() {
        let a = CacheKey::from_request(&CurriculumRequest::new("c1").with_progress(true));
        let b = CacheKey::from_request(&CurriculumRequest::new("c1").with_progress(false));
        assert_ne!(a, b);

        // Sample fallback is not part of the key
        let c = CacheKey::from_request(&CurriculumRequest::new("c1").with_sample_fallback(false));
        assert_eq!(key("c1"), c);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new();
        let value = curriculum("c1");
        cache.set(key("c1"), Arc::clone(&value), Duration::from_secs(60)).await;

        assert!(cache.has(&key("c1")).await);
        let hit = cache.get(&key("c1")).await.unwrap();
        assert!(Arc::ptr_eq(&hit, &value), "cache returns the stored instance");

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.has(&key("c1")).await);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cache.has(&key("c1")).await);
        assert!(cache.get(&key("c1")).await.is_none());

        assert_eq!(cache.prune_expired().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_clear_reports_removed_count() {
        let cache = TtlCache::new();
        cache.set(key("a"), curriculum("a"), Duration::from_secs(60)).await;
        cache.set(key("b"), curriculum("b"), Duration::from_secs(60)).await;

        assert_eq!(cache.clear().await, 2);
        assert!(!cache.has(&key("a")).await);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_insert() {
        let cache = TtlCache::with_capacity_limit(2);
        cache.set(key("a"), curriculum("a"), Duration::from_secs(60)).await;
        cache.set(key("b"), curriculum("b"), Duration::from_secs(60)).await;
        cache.set(key("c"), curriculum("c"), Duration::from_secs(60)).await;

        assert_eq!(cache.len().await, 2);
        assert!(!cache.has(&key("a")).await);
        assert!(cache.has(&key("b")).await);
        assert!(cache.has(&key("c")).await);
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = TtlCache::with_capacity_limit(2);
        cache.set(key("a"), curriculum("a"), Duration::from_secs(60)).await;
        cache.set(key("b"), curriculum("b"), Duration::from_secs(60)).await;
        cache.set(key("a"), curriculum("a"), Duration::from_secs(60)).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.has(&key("a")).await);
        assert!(cache.has(&key("b")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_make_room_first() {
        let cache = TtlCache::with_capacity_limit(2);
        cache.set(key("short"), curriculum("short"), Duration::from_secs(1)).await;
        cache.set(key("long"), curriculum("long"), Duration::from_secs(600)).await;

        tokio::time::advance(Duration::from_secs(5)).await;
        cache.set(key("new"), curriculum("new"), Duration::from_secs(600)).await;

        assert!(cache.has(&key("long")).await, "live entry survives");
        assert!(cache.has(&key("new")).await);
        assert_eq!(cache.len().await, 2);
    }
}
