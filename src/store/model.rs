//! Records persisted by a [`QuestionStore`](super::QuestionStore).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CachedQuestionId = i64;
pub type InteractionId = i64;

/// Free-form JSON attached to a cache entry.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Who or what made a cache entry authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionSource {
    ManualCorrection,
    AdminApproval,
    ManualWithFaq,
    BulkCorrection,
    ManualForceUpdate,
}

impl CorrectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionSource::ManualCorrection => "manual_correction",
            CorrectionSource::AdminApproval => "admin_approval",
            CorrectionSource::ManualWithFaq => "manual_with_faq",
            CorrectionSource::BulkCorrection => "bulk_correction",
            CorrectionSource::ManualForceUpdate => "manual_force_update",
        }
    }
}

impl std::fmt::Display for CorrectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrectionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual_correction" => Ok(CorrectionSource::ManualCorrection),
            "admin_approval" => Ok(CorrectionSource::AdminApproval),
            "manual_with_faq" => Ok(CorrectionSource::ManualWithFaq),
            "bulk_correction" => Ok(CorrectionSource::BulkCorrection),
            "manual_force_update" => Ok(CorrectionSource::ManualForceUpdate),
            other => Err(format!("unknown correction source '{other}'")),
        }
    }
}

/// Review state of a cache entry. Only `Approved` entries are ever served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ApprovalState {
    /// Stored speculatively, awaiting human review.
    Pending,
    /// Approved or corrected by an administrator.
    Approved {
        corrected_at: DateTime<Utc>,
        source: CorrectionSource,
    },
}

impl ApprovalState {
    /// Approval stamped with the current time.
    pub fn approved_now(source: CorrectionSource) -> Self {
        ApprovalState::Approved {
            corrected_at: Utc::now(),
            source,
        }
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalState::Approved { .. })
    }

    pub fn source(&self) -> Option<CorrectionSource> {
        match self {
            ApprovalState::Approved { source, .. } => Some(*source),
            ApprovalState::Pending => None,
        }
    }

    pub fn corrected_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ApprovalState::Approved { corrected_at, .. } => Some(*corrected_at),
            ApprovalState::Pending => None,
        }
    }
}

/// A stored question and its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedQuestion {
    pub id: CachedQuestionId,
    pub question_text: String,
    pub fingerprint: String,
    pub answer: String,
    #[serde(skip_serializing, default)]
    pub embedding: Option<Vec<f32>>,
    pub image_hash: Option<String>,
    pub times_used: i64,
    pub last_used: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub approval: ApprovalState,
    pub metadata: Metadata,
}

impl CachedQuestion {
    /// Whether this entry may be served to a user.
    #[inline]
    pub fn is_servable(&self) -> bool {
        self.approval.is_approved()
    }
}

/// Everything needed to insert a cache entry.
///
/// The approval state is set explicitly by the caller; stores never infer it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCachedQuestion {
    pub question_text: String,
    pub fingerprint: String,
    pub answer: String,
    pub embedding: Option<Vec<f32>>,
    pub image_hash: Option<String>,
    pub metadata: Metadata,
    pub approval: ApprovalState,
}

/// User feedback on an interaction, persisted as `-1 / 0 / 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl Feedback {
    pub fn as_i64(&self) -> i64 {
        match self {
            Feedback::Negative => -1,
            Feedback::Neutral => 0,
            Feedback::Positive => 1,
        }
    }

    /// Any negative value is negative feedback, any positive value positive.
    pub fn from_i64(value: i64) -> Self {
        match value.signum() {
            -1 => Feedback::Negative,
            1 => Feedback::Positive,
            _ => Feedback::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    Administrative,
    Scientific,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Administrative => "administrative",
            ChatType::Scientific => "scientific",
        }
    }
}

impl FromStr for ChatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrative" => Ok(ChatType::Administrative),
            "scientific" => Ok(ChatType::Scientific),
            other => Err(format!("unknown chat type '{other}'")),
        }
    }
}

/// Review status derived from an interaction's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Not yet reviewed.
    Pending,
    /// Corrected or approved by an administrator.
    Resolved,
    /// Its approved cache entry was deleted; needs review again.
    Orphaned,
}

/// One question/answer exchange with an end user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub user_input: String,
    pub bot_response: String,
    pub is_corrected: bool,
    /// Point-in-time snapshot of the answer an administrator settled on.
    pub corrected_text: Option<String>,
    pub feedback: Feedback,
    pub chat_type: ChatType,
    pub image_path: Option<String>,
    pub cached_question_id: Option<CachedQuestionId>,
    /// Set when the linked cache entry was deleted out from under it.
    pub cache_link_severed: bool,
}

impl Interaction {
    pub fn review_state(&self) -> ReviewState {
        if self.is_corrected {
            ReviewState::Resolved
        } else if self.cache_link_severed {
            ReviewState::Orphaned
        } else {
            ReviewState::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInteraction {
    pub user_id: i64,
    pub user_input: String,
    pub bot_response: String,
    pub chat_type: ChatType,
    #[serde(default)]
    pub image_path: Option<String>,
    /// Set when the response was served from the cache.
    #[serde(default)]
    pub cached_question_id: Option<CachedQuestionId>,
}

/// Atomic approval/correction of one interaction.
///
/// If the interaction is linked to a cache entry, that entry's answer is
/// overwritten. Otherwise `new_entry` is inserted and linked; a missing
/// `new_entry` in that case is reported as not found.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub answer: String,
    pub source: CorrectionSource,
    pub feedback: Feedback,
    pub new_entry: Option<NewCachedQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopQuestion {
    pub question_text: String,
    pub times_used: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_cached: i64,
    /// Sum of `times_used` over all entries.
    pub total_hits: i64,
    pub corrected_count: i64,
    /// `total_hits / total_cached`, or `0.0` for an empty cache.
    pub hit_rate: f64,
    pub top_questions: Vec<TopQuestion>,
}

impl CacheStatistics {
    pub(crate) fn from_totals(
        total_cached: i64,
        total_hits: i64,
        corrected_count: i64,
        top_questions: Vec<TopQuestion>,
    ) -> Self {
        let hit_rate = if total_cached > 0 {
            total_hits as f64 / total_cached as f64
        } else {
            0.0
        };
        Self {
            total_cached,
            total_hits,
            corrected_count,
            hit_rate,
            top_questions,
        }
    }
}
