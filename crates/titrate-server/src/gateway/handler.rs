use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use titrate::{
    BulkCorrectionReport, CacheStatistics, CachedQuestion, CachedQuestionId, DeletionReport,
    Embedder, Interaction, InteractionId, MatchReport, NewInteraction, QuestionStore,
    TITRATE_STATUS_HEADER, is_image_hash,
};

use crate::gateway::error::GatewayError;
use crate::gateway::payload::{
    BulkCorrectionRequest, CacheQuestionRequest, CorrectionRequest, CreatedResponse,
    ForceUpdateRequest, LookupRequest, PageQuery, PurgeRequest, PurgeResponse, ResolvedResponse,
    UpdateAnswerRequest,
};
use crate::gateway::state::HandlerState;

fn validate_question(question: &str, image_hash: Option<&str>) -> Result<(), GatewayError> {
    if question.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("question is empty".to_string()));
    }
    if let Some(hash) = image_hash
        && !is_image_hash(hash)
    {
        return Err(GatewayError::InvalidRequest(
            "image_hash must be 64 lowercase hex characters".to_string(),
        ));
    }
    Ok(())
}

/// Runs the lookup cascade. The outcome is mirrored in the status header.
#[instrument(skip(state, request), fields(has_image = request.image_hash.is_some()))]
pub async fn lookup_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Json(request): Json<LookupRequest>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    validate_question(&request.question, request.image_hash.as_deref())?;

    let outcome = state
        .engine()
        .find_similar_question(&request.question, request.image_hash.as_deref())
        .await;
    debug!(status = outcome.as_header_value(), "Lookup finished");

    let mut headers = HeaderMap::new();
    headers.insert(
        TITRATE_STATUS_HEADER,
        HeaderValue::from_static(outcome.as_header_value()),
    );
    Ok((StatusCode::OK, headers, Json(outcome)).into_response())
}

#[instrument(skip(state, request))]
pub async fn cache_question_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Json(request): Json<CacheQuestionRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    validate_question(&request.question, request.image_hash.as_deref())?;
    if request.answer.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("answer is empty".to_string()));
    }

    let id = state
        .engine()
        .cache_question(
            &request.question,
            &request.answer,
            request.image_hash.as_deref(),
            request.metadata,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn list_cached_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<CachedQuestion>>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let entries = state
        .workflow
        .list_cached(page.limit(), page.offset())
        .await?;
    Ok(Json(entries))
}

pub async fn get_cached_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<CachedQuestionId>,
) -> Result<Json<CachedQuestion>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Ok(Json(state.workflow.cached_question(id).await?))
}

pub async fn statistics_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
) -> Result<Json<CacheStatistics>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Ok(Json(state.engine().get_statistics().await?))
}

#[instrument(skip(state, request))]
pub async fn update_answer_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<CachedQuestionId>,
    Json(request): Json<UpdateAnswerRequest>,
) -> Result<StatusCode, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    if request.answer.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("answer is empty".to_string()));
    }
    state
        .engine()
        .update_cached_answer(id, request.answer.trim(), request.source)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_cached_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<CachedQuestionId>,
) -> Result<Json<DeletionReport>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Ok(Json(state.workflow.delete_cached(id).await?))
}

pub async fn linked_interactions_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<CachedQuestionId>,
) -> Result<Json<Vec<Interaction>>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Ok(Json(state.workflow.linked_interactions(id).await?))
}

#[instrument(skip(state, request))]
pub async fn purge_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Json(request): Json<PurgeRequest>,
) -> Result<Json<PurgeResponse>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let purged = state
        .workflow
        .purge_stale(request.older_than_days, request.min_usage)
        .await?;
    Ok(Json(PurgeResponse { purged }))
}

#[instrument(skip(state, request))]
pub async fn force_update_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Json(request): Json<ForceUpdateRequest>,
) -> Result<Json<CreatedResponse>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let id = state
        .workflow
        .force_update(&request.question, &request.answer)
        .await?;
    Ok(Json(CreatedResponse { id }))
}

#[instrument(skip(state, request))]
pub async fn record_interaction_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Json(request): Json<NewInteraction>,
) -> Result<(StatusCode, Json<CreatedResponse>), GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let id = state.workflow.record_interaction(request).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn get_interaction_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<InteractionId>,
) -> Result<Json<Interaction>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Ok(Json(state.workflow.interaction(id).await?))
}

pub async fn unapproved_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Interaction>>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Ok(Json(state.workflow.unapproved(page.limit()).await?))
}

#[instrument(skip(state))]
pub async fn delete_interaction_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<InteractionId>,
) -> Result<StatusCode, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    state.workflow.delete_interaction(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn approve_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<InteractionId>,
) -> Result<Json<ResolvedResponse>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let cached_question_id = state.workflow.approve(id).await?;
    Ok(Json(ResolvedResponse {
        interaction_id: id,
        cached_question_id,
    }))
}

#[instrument(skip(state, request))]
pub async fn correct_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<InteractionId>,
    Json(request): Json<CorrectionRequest>,
) -> Result<Json<ResolvedResponse>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let cached_question_id = state
        .workflow
        .correct(id, &request.text, request.with_faq)
        .await?;
    Ok(Json(ResolvedResponse {
        interaction_id: id,
        cached_question_id,
    }))
}

pub async fn dismiss_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<InteractionId>,
) -> Result<StatusCode, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    state.workflow.dismiss_feedback(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn similar_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<InteractionId>,
) -> Result<Json<Vec<Interaction>>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    Ok(Json(state.workflow.similar_uncorrected(id).await?))
}

/// Applies one correction to many interactions. Partial failures still
/// return `200` with the failures listed in the report.
#[instrument(skip(state, request), fields(count = request.interaction_ids.len()))]
pub async fn bulk_correct_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Json(request): Json<BulkCorrectionRequest>,
) -> Result<Json<BulkCorrectionReport>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    let report = state
        .workflow
        .bulk_correct(&request.interaction_ids, &request.text)
        .await?;
    Ok(Json(report))
}

/// Scores the recency pool against a question without serving anything.
pub async fn explain_match_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<MatchReport>, GatewayError>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    validate_question(&request.question, request.image_hash.as_deref())?;
    let report = state
        .engine()
        .explain_match(&request.question, request.image_hash.as_deref())
        .await;
    Ok(Json(report))
}
