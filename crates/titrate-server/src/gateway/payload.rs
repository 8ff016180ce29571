use serde::{Deserialize, Serialize};

use titrate::constants::{DEFAULT_STALE_AFTER_DAYS, DEFAULT_STALE_MIN_USAGE};
use titrate::{CachedQuestionId, CorrectionSource, InteractionId, Metadata};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct LookupRequest {
    pub question: String,
    #[serde(default)]
    pub image_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheQuestionRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub image_hash: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAnswerRequest {
    pub answer: String,
    #[serde(default = "default_update_source")]
    pub source: CorrectionSource,
}

fn default_update_source() -> CorrectionSource {
    CorrectionSource::ManualCorrection
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionRequest {
    pub text: String,
    #[serde(default)]
    pub with_faq: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkCorrectionRequest {
    pub interaction_ids: Vec<InteractionId>,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForceUpdateRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurgeRequest {
    #[serde(default = "default_stale_days")]
    pub older_than_days: u32,
    #[serde(default = "default_stale_min_usage")]
    pub min_usage: i64,
}

fn default_stale_days() -> u32 {
    DEFAULT_STALE_AFTER_DAYS
}

fn default_stale_min_usage() -> i64 {
    DEFAULT_STALE_MIN_USAGE
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PageQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedResponse {
    pub interaction_id: InteractionId,
    pub cached_question_id: CachedQuestionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub purged: Vec<CachedQuestionId>,
}
