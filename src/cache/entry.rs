use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};

use crate::image_processing::InlineImage;

/// One staged original artifact awaiting a refinement round.
#[derive(Debug)]
pub struct CacheEntry {
    pub id: String,
    pub payload: InlineImage,
    pub created_at: DateTime<Utc>,
    staged_at: Instant,
}

impl CacheEntry {
    pub(crate) fn new(id: String, payload: InlineImage) -> Self {
        Self {
            id,
            payload,
            created_at: Utc::now(),
            staged_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.staged_at.elapsed()
    }

    pub fn is_expired(&self, retention: Duration) -> bool {
        self.age() > retention
    }
}
