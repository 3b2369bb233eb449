//! Curriculum resolver
//!
//! Orchestrates cache → single-flight → source chain → sample fallback.
//!
//! Concurrent callers for the same cache key and fallback flag share one
//! in-flight resolution; the first caller drives it and everyone receives the
//! same `Arc`. The in-flight entry removes itself once the result is cached.

use futures::future::{BoxFuture, FutureExt, Shared};
use lms_common::config::TomlConfig;
use lms_common::{Curriculum, Lesson};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CurriculumCache, TtlCache};
use crate::error::ResolveError;
use crate::lookup::{lesson_with_media, FallbackMedia};
use crate::normalizer::Normalizer;
use crate::sample::SampleGenerator;
use crate::sources::{default_sources, ApiClient};
use crate::types::{CurriculumRequest, CurriculumSource, SourceError};

/// Default cache lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

type Resolution = Result<Arc<Curriculum>, ResolveError>;
type SharedResolution = Shared<BoxFuture<'static, Resolution>>;
type FlightKey = (CacheKey, bool);

struct ResolverInner {
    sources: Vec<Arc<dyn CurriculumSource>>,
    cache: Arc<dyn CurriculumCache>,
    ttl: Duration,
    samples: SampleGenerator,
    media: FallbackMedia,
    fallback_to_sample: bool,
    in_flight: Mutex<HashMap<FlightKey, SharedResolution>>,
    /// Most recent source failure, as `"{source}: {error}"`
    last_source_error: RwLock<Option<String>>,
}

/// Curriculum resolver
///
/// Cheap to clone; clones share cache and in-flight state.
#[derive(Clone)]
pub struct CurriculumResolver {
    inner: Arc<ResolverInner>,
}

impl CurriculumResolver {
    pub fn builder() -> CurriculumResolverBuilder {
        CurriculumResolverBuilder::default()
    }

    /// Resolver wired to the LMS API described by `config`
    pub fn from_config(config: &TomlConfig) -> Result<Self, SourceError> {
        let client = ApiClient::from_config(&config.api)?;
        let media = FallbackMedia::from_config(&config.media);
        let normalizer = Normalizer::new(media.clone());

        let cache: Arc<dyn CurriculumCache> = match config.cache.max_entries() {
            Some(max) => Arc::new(TtlCache::with_capacity_limit(max)),
            None => Arc::new(TtlCache::new()),
        };

        info!(
            base_url = %client.base_url(),
            authenticated = client.has_token(),
            course_types = ?config.api.course_types,
            ttl_secs = config.cache.ttl_secs,
            "Curriculum resolver configured"
        );

        Ok(Self::builder()
            .sources(default_sources(&client, &config.api, &normalizer))
            .cache(cache)
            .ttl(config.cache.ttl())
            .samples(SampleGenerator::from_config(&config.samples, media.clone()))
            .media(media)
            .fallback_to_sample(config.samples.fallback_to_sample)
            .build())
    }

    /// Request for `course_id` with the configured sample-fallback default
    pub fn request(&self, course_id: impl Into<String>) -> CurriculumRequest {
        CurriculumRequest::new(course_id).with_sample_fallback(self.inner.fallback_to_sample)
    }

    pub fn media(&self) -> &FallbackMedia {
        &self.inner.media
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.inner.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve a curriculum
    ///
    /// # Errors
    /// - `InvalidInput` for a blank course id, before any I/O
    /// - `NoCurriculum` when no source has data and sample fallback is off
    pub async fn get_curriculum(&self, mut request: CurriculumRequest) -> Resolution {
        let course_id = request.course_id.trim();
        if course_id.is_empty() {
            return Err(ResolveError::InvalidInput("courseId is required".to_string()));
        }
        request.course_id = course_id.to_string();

        let key = CacheKey::from_request(&request);
        if let Some(hit) = self.inner.cache.get(&key).await {
            debug!(key = %key, "Curriculum cache hit");
            return Ok(hit);
        }

        let flight_key: FlightKey = (key, request.fallback_to_sample);
        let flight = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(&flight_key) {
                Some(existing) => {
                    debug!(key = %flight_key.0, "Joining in-flight curriculum request");
                    existing.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let own_key = flight_key.clone();
                    let flight = async move {
                        let result = inner.resolve_uncached(&request, &own_key.0).await;
                        inner.in_flight.lock().await.remove(&own_key);
                        result
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(flight_key, flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Resolve the curriculum and return one lesson with fallback media applied
    pub async fn lesson(
        &self,
        request: CurriculumRequest,
        lesson_id: &str,
    ) -> Result<Option<Lesson>, ResolveError> {
        if lesson_id.trim().is_empty() {
            return Err(ResolveError::InvalidInput("lessonId is required".to_string()));
        }
        let curriculum = self.get_curriculum(request).await?;
        Ok(lesson_with_media(&curriculum, lesson_id, &self.inner.media))
    }

    /// Drop every cached curriculum, returning how many were removed
    pub async fn clear_cache(&self) -> usize {
        let removed = self.inner.cache.clear().await;
        info!(removed, "Curriculum cache cleared");
        removed
    }

    pub async fn cached_entries(&self) -> usize {
        self.inner.cache.len().await
    }

    /// Most recent source failure, kept after later successes
    pub async fn last_source_error(&self) -> Option<String> {
        self.inner.last_source_error.read().await.clone()
    }

    pub async fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().await.len()
    }
}

impl ResolverInner {
    async fn resolve_uncached(&self, request: &CurriculumRequest, key: &CacheKey) -> Resolution {
        // A flight that finished just before this one started may have filled the cache
        if let Some(hit) = self.cache.get(key).await {
            return Ok(hit);
        }

        for source in &self.sources {
            match source.try_fetch(request).await {
                Ok(Some(curriculum)) if curriculum.has_content() => {
                    info!(
                        course_id = %request.course_id,
                        source = source.name(),
                        origin = curriculum.origin.as_str(),
                        lessons = curriculum.total_lessons,
                        "Curriculum resolved"
                    );
                    let value = Arc::new(curriculum);
                    self.cache.set(key.clone(), Arc::clone(&value), self.ttl).await;
                    return Ok(value);
                }
                Ok(_) => {
                    debug!(course_id = %request.course_id, source = source.name(), "Source has no curriculum");
                }
                Err(e) => {
                    warn!(
                        course_id = %request.course_id,
                        source = source.name(),
                        error = %e,
                        "Curriculum source failed"
                    );
                    *self.last_source_error.write().await = Some(format!("{}: {}", source.name(), e));
                }
            }
        }

        if request.fallback_to_sample {
            info!(course_id = %request.course_id, "No source had curriculum, using sample");
            return Ok(Arc::new(self.samples.generate(&request.course_id)));
        }

        warn!(course_id = %request.course_id, "No curriculum data available");
        Err(ResolveError::NoCurriculum)
    }
}

/// Builder for [`CurriculumResolver`]
pub struct CurriculumResolverBuilder {
    sources: Vec<Arc<dyn CurriculumSource>>,
    cache: Option<Arc<dyn CurriculumCache>>,
    ttl: Duration,
    samples: Option<SampleGenerator>,
    media: Option<FallbackMedia>,
    fallback_to_sample: bool,
}

impl Default for CurriculumResolverBuilder {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            cache: None,
            ttl: DEFAULT_TTL,
            samples: None,
            media: None,
            fallback_to_sample: true,
        }
    }
}

impl CurriculumResolverBuilder {
    /// Append a source to the chain
    pub fn source(mut self, source: Arc<dyn CurriculumSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(mut self, sources: Vec<Arc<dyn CurriculumSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CurriculumCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn samples(mut self, samples: SampleGenerator) -> Self {
        self.samples = Some(samples);
        self
    }

    pub fn media(mut self, media: FallbackMedia) -> Self {
        self.media = Some(media);
        self
    }

    /// Default for requests built with [`CurriculumResolver::request`]
    pub fn fallback_to_sample(mut self, enabled: bool) -> Self {
        self.fallback_to_sample = enabled;
        self
    }

    pub fn build(self) -> CurriculumResolver {
        let media = self.media.unwrap_or_default();
        let samples = self
            .samples
            .unwrap_or_else(|| SampleGenerator::new(true, media.clone()));
        let cache = self.cache.unwrap_or_else(|| Arc::new(TtlCache::new()));

        CurriculumResolver {
            inner: Arc::new(ResolverInner {
                sources: self.sources,
                cache,
                ttl: self.ttl,
                samples,
                media,
                fallback_to_sample: self.fallback_to_sample,
                in_flight: Mutex::new(HashMap::new()),
                last_source_error: RwLock::new(None),
            }),
        }
    }
}
