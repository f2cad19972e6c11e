//! `/api` routes.
//!
//! Handlers take locks only around synchronous generator calls; the one
//! awaited call, the assistant, manages its own state.

use crate::{ApiError, JsonBody, SharedState, api_error, error_response, null_as_default};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use piste_assistant::ReplySource;
use piste_core::{AiStatus, AssistantMode, ConversationTurn, IntentCategory};
use piste_generators::{
    ActionRecognition, CompetitionResult, Danmaku, DanmakuStats, DanmakuStyle, FrameAnalysis,
    FrameReport, KeyMoment, LearnerProfile, MatchContext, PoseDetection, RankingEntry,
    Recommendation, VideoInfo, VideoScene, ViewingContext, parse_youtube,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tips returned per request.
const TIP_COUNT: usize = 3;
const DEFAULT_DANMAKU_LIMIT: usize = 50;
const DEFAULT_RESULT_LIMIT: usize = 10;
/// Upper bound on any `limit` query parameter.
const MAX_LIMIT: usize = 100;

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route(
            "/chat/history",
            get(history_handler).delete(clear_history_handler),
        )
        .route("/ai/status", get(status_handler))
        .route("/ai/mode", post(mode_handler))
        .route("/ai/test", post(test_connection_handler))
        .route("/tips", get(tips_handler))
        .route("/parse_youtube", post(parse_youtube_handler))
        .route("/generate_danmaku", post(generate_danmaku_handler))
        .route("/contextual_danmaku", post(contextual_danmaku_handler))
        .route("/send_danmaku", post(send_danmaku_handler))
        .route(
            "/get_danmaku",
            get(get_danmaku_handler).delete(clear_danmaku_handler),
        )
        .route("/danmaku/search", get(search_danmaku_handler))
        .route("/danmaku/stats", get(danmaku_stats_handler))
        .route("/fie_data", get(fie_data_handler))
        .route("/fie_rankings", get(fie_rankings_handler))
        .route("/video_analysis", post(video_analysis_handler))
        .route("/detect_key_moments", post(detect_key_moments_handler))
        .route("/analyze_frame", post(analyze_frame_handler))
        .route("/recommend_knowledge", post(recommend_knowledge_handler))
        .route("/recommend_knowledge/viewed", post(mark_viewed_handler))
        .route("/recognize_action", post(recognize_action_handler))
        .route("/detect_pose", post(detect_pose_handler))
}

fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).min(MAX_LIMIT)
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    video_context: String,
}

#[derive(Serialize)]
struct ChatResponse {
    success: bool,
    response: String,
    intent: IntentCategory,
    source: ReplySource,
    timestamp: DateTime<Utc>,
}

async fn chat_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "请提供消息内容"));
    }
    info!(
        message_len = payload.message.len(),
        has_video_context = !payload.video_context.trim().is_empty(),
        "Chat request"
    );

    let reply = state
        .assistant
        .handle(&payload.message, &payload.video_context)
        .await
        .map_err(error_response)?;

    Ok(Json(ChatResponse {
        success: true,
        response: reply.text,
        intent: reply.intent,
        source: reply.source,
        timestamp: reply.timestamp,
    }))
}

#[derive(Serialize)]
struct HistoryResponse {
    success: bool,
    history: Vec<ConversationTurn>,
}

async fn history_handler(State(state): State<SharedState>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        success: true,
        history: state.assistant.history(),
    })
}

#[derive(Serialize)]
struct ClearHistoryResponse {
    success: bool,
    cleared: usize,
}

async fn clear_history_handler(State(state): State<SharedState>) -> Json<ClearHistoryResponse> {
    Json(ClearHistoryResponse {
        success: true,
        cleared: state.assistant.clear_history(),
    })
}

// ── Assistant mode ────────────────────────────────────────────────────────

async fn status_handler(State(state): State<SharedState>) -> Json<AiStatus> {
    Json(state.assistant.status())
}

#[derive(Deserialize)]
struct ModeRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    mode: String,
}

async fn mode_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ModeRequest>,
) -> Result<Json<AiStatus>, ApiError> {
    let mode: AssistantMode = payload.mode.parse().map_err(error_response)?;
    Ok(Json(state.assistant.switch_mode(mode)))
}

#[derive(Serialize)]
struct ConnectionTestResponse {
    available: bool,
}

async fn test_connection_handler(State(state): State<SharedState>) -> Json<ConnectionTestResponse> {
    Json(ConnectionTestResponse {
        available: state.assistant.test_connection().await,
    })
}

#[derive(Serialize)]
struct TipsResponse {
    success: bool,
    tips: Vec<String>,
}

async fn tips_handler(State(state): State<SharedState>) -> Json<TipsResponse> {
    let tips = state
        .assistant
        .responder()
        .tips(TIP_COUNT, &mut *state.rng());
    Json(TipsResponse {
        success: true,
        tips,
    })
}

// ── Video ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ParseYoutubeRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    video_url: String,
}

#[derive(Serialize)]
struct ParseYoutubeResponse {
    success: bool,
    video_info: VideoInfo,
}

async fn parse_youtube_handler(
    JsonBody(payload): JsonBody<ParseYoutubeRequest>,
) -> Result<Json<ParseYoutubeResponse>, ApiError> {
    if payload.video_url.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "请提供YouTube链接"));
    }
    let video_info = parse_youtube(&payload.video_url)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "无法解析YouTube链接"))?;

    debug!(video_id = %video_info.id, "Parsed YouTube link");
    Ok(Json(ParseYoutubeResponse {
        success: true,
        video_info,
    }))
}

#[derive(Deserialize)]
struct VideoAnalysisRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    video_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    current_time: u64,
    /// Video length in seconds, when known
    #[serde(default, deserialize_with = "null_as_default")]
    duration: Option<u64>,
}

#[derive(Serialize)]
struct VideoAnalysisResponse {
    success: bool,
    analysis: String,
    scene: VideoScene,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    key_moments: Vec<KeyMoment>,
}

async fn video_analysis_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<VideoAnalysisRequest>,
) -> Json<VideoAnalysisResponse> {
    let video = &state.generators.video;
    Json(VideoAnalysisResponse {
        success: true,
        analysis: video.analyze_position(payload.current_time),
        scene: video.scene(&payload.video_url, payload.current_time),
        key_moments: payload
            .duration
            .map(|d| video.key_moments(d))
            .unwrap_or_default(),
    })
}

#[derive(Deserialize)]
struct KeyMomentsRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    duration: u64,
}

#[derive(Serialize)]
struct KeyMomentsResponse {
    success: bool,
    key_moments: Vec<KeyMoment>,
}

async fn detect_key_moments_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<KeyMomentsRequest>,
) -> Json<KeyMomentsResponse> {
    Json(KeyMomentsResponse {
        success: true,
        key_moments: state.generators.video.key_moments(payload.duration),
    })
}

#[derive(Deserialize)]
struct AnalyzeFrameRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    video_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    current_time: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    context: String,
}

#[derive(Serialize)]
struct AnalyzeFrameResponse {
    success: bool,
    analysis: FrameReport,
    action_detected: &'static str,
    confidence: f64,
    commentary: String,
    danmaku: String,
}

async fn analyze_frame_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<AnalyzeFrameRequest>,
) -> Json<AnalyzeFrameResponse> {
    let generators = &state.generators;
    let mut rng = state.rng();
    let report = generators.analyze_frame(
        &payload.video_url,
        payload.current_time,
        &payload.context,
        &mut *rng,
    );
    let danmaku =
        generators
            .danmaku
            .contextual(&report.to_frame_analysis(), payload.current_time, &mut *rng);

    Json(AnalyzeFrameResponse {
        success: true,
        action_detected: report.action.action.name(),
        confidence: report.action.confidence,
        commentary: report.action.commentary.clone(),
        danmaku,
        analysis: report,
    })
}

// ── Knowledge ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RecommendRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    video_context: ViewingContext,
    #[serde(default, deserialize_with = "null_as_default")]
    user_id: String,
}

fn learner_id(user_id: &str) -> &str {
    match user_id.trim() {
        "" => "default",
        id => id,
    }
}

#[derive(Serialize)]
struct RecommendResponse {
    success: bool,
    recommendations: Vec<Recommendation>,
}

async fn recommend_knowledge_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<RecommendRequest>,
) -> Json<RecommendResponse> {
    let profile = state.profiles().get(learner_id(&payload.user_id));
    let recommendations = state
        .generators
        .recommender
        .recommend(&payload.video_context, &profile);

    Json(RecommendResponse {
        success: true,
        recommendations,
    })
}

#[derive(Deserialize)]
struct MarkViewedRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    topic_id: String,
    #[serde(default)]
    interest: Option<String>,
}

#[derive(Serialize)]
struct MarkViewedResponse {
    success: bool,
    profile: LearnerProfile,
}

async fn mark_viewed_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<MarkViewedRequest>,
) -> Result<Json<MarkViewedResponse>, ApiError> {
    let topic_id = payload.topic_id.trim();
    if topic_id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "请提供知识点ID"));
    }
    let profile = state
        .profiles()
        .mark_viewed(
            learner_id(&payload.user_id),
            topic_id,
            payload.interest.as_deref(),
        )
        .clone();

    Ok(Json(MarkViewedResponse {
        success: true,
        profile,
    }))
}

// ── Danmaku ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GenerateDanmakuRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    video_context: String,
    #[serde(default, deserialize_with = "null_as_default")]
    user_message: String,
}

#[derive(Serialize)]
struct GenerateDanmakuResponse {
    success: bool,
    danmaku: String,
    category: DanmakuStyle,
    context: MatchContext,
    timestamp: DateTime<Utc>,
}

async fn generate_danmaku_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<GenerateDanmakuRequest>,
) -> Json<GenerateDanmakuResponse> {
    let generated = state.generators.danmaku.generate_ai(
        &payload.video_context,
        &payload.user_message,
        &mut *state.rng(),
    );
    let posted = state.board().add_ai(&generated, &payload.video_context);

    Json(GenerateDanmakuResponse {
        success: true,
        danmaku: generated.text,
        category: generated.style,
        context: generated.context,
        timestamp: posted.timestamp,
    })
}

#[derive(Deserialize)]
struct ContextualDanmakuRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    frame_analysis: FrameAnalysis,
    #[serde(default, deserialize_with = "null_as_default")]
    current_time: u64,
}

#[derive(Serialize)]
struct ContextualDanmakuResponse {
    success: bool,
    danmaku: String,
}

async fn contextual_danmaku_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ContextualDanmakuRequest>,
) -> Json<ContextualDanmakuResponse> {
    let danmaku = state.generators.danmaku.contextual(
        &payload.frame_analysis,
        payload.current_time,
        &mut *state.rng(),
    );
    Json(ContextualDanmakuResponse {
        success: true,
        danmaku,
    })
}

#[derive(Deserialize)]
struct SendDanmakuRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    user_id: String,
}

#[derive(Serialize)]
struct SendDanmakuResponse {
    success: bool,
    danmaku_id: String,
    timestamp: DateTime<Utc>,
}

async fn send_danmaku_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<SendDanmakuRequest>,
) -> Result<Json<SendDanmakuResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "请提供弹幕内容"));
    }
    let category = state.generators.danmaku.categorize(&payload.message);
    let danmaku = state
        .board()
        .add_user(&payload.message, &payload.user_id, category)
        .map_err(error_response)?;

    Ok(Json(SendDanmakuResponse {
        success: true,
        danmaku_id: danmaku.id,
        timestamp: danmaku.timestamp,
    }))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct DanmakuListResponse {
    success: bool,
    danmaku: Vec<Danmaku>,
}

#[derive(Deserialize)]
struct DanmakuQuery {
    limit: Option<usize>,
    /// Style label, e.g. "进攻"
    category: Option<DanmakuStyle>,
}

async fn get_danmaku_handler(
    State(state): State<SharedState>,
    Query(query): Query<DanmakuQuery>,
) -> Json<DanmakuListResponse> {
    let limit = clamp_limit(query.limit, DEFAULT_DANMAKU_LIMIT);
    let board = state.board();
    let danmaku = match query.category {
        Some(category) => board.by_category(category, limit),
        None => board.recent(limit),
    };
    Json(DanmakuListResponse {
        success: true,
        danmaku,
    })
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn search_danmaku_handler(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DanmakuListResponse>, ApiError> {
    let keyword = query.q.trim();
    if keyword.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "请提供搜索关键词"));
    }
    let limit = clamp_limit(query.limit, DEFAULT_DANMAKU_LIMIT);
    Ok(Json(DanmakuListResponse {
        success: true,
        danmaku: state.board().search(keyword, limit),
    }))
}

#[derive(Serialize)]
struct ClearDanmakuResponse {
    success: bool,
    cleared: usize,
}

async fn clear_danmaku_handler(State(state): State<SharedState>) -> Json<ClearDanmakuResponse> {
    let cleared = state.board().clear();
    info!(cleared, "Danmaku board cleared");
    Json(ClearDanmakuResponse {
        success: true,
        cleared,
    })
}

async fn danmaku_stats_handler(State(state): State<SharedState>) -> Json<DanmakuStats> {
    Json(state.board().stats())
}

// ── Competitions ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ResultsResponse {
    success: bool,
    results: Vec<CompetitionResult>,
}

async fn fie_data_handler(
    State(state): State<SharedState>,
    Query(query): Query<LimitQuery>,
) -> Json<ResultsResponse> {
    let limit = clamp_limit(query.limit, DEFAULT_RESULT_LIMIT);
    let results = state
        .generators
        .competitions
        .recent_results(limit, &mut *state.rng());
    Json(ResultsResponse {
        success: true,
        results,
    })
}

#[derive(Deserialize)]
struct RankingsQuery {
    #[serde(default = "default_filter")]
    weapon: String,
    #[serde(default = "default_filter")]
    category: String,
}

fn default_filter() -> String {
    "all".into()
}

#[derive(Serialize)]
struct RankingsResponse {
    success: bool,
    rankings: Vec<RankingEntry>,
}

async fn fie_rankings_handler(
    State(state): State<SharedState>,
    Query(query): Query<RankingsQuery>,
) -> Json<RankingsResponse> {
    let rankings = state.generators.competitions.rankings(
        &query.weapon,
        &query.category,
        &mut *state.rng(),
    );
    Json(RankingsResponse {
        success: true,
        rankings,
    })
}

// ── Action & pose ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RecognizeActionRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    current_time: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    context: String,
    /// Refine the commentary with a pose detection
    #[serde(default, deserialize_with = "null_as_default")]
    with_pose: bool,
}

#[derive(Serialize)]
struct RecognizeActionResponse {
    success: bool,
    action: ActionRecognition,
}

async fn recognize_action_handler(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<RecognizeActionRequest>,
) -> Json<RecognizeActionResponse> {
    let generators = &state.generators;
    let mut rng = state.rng();
    let pose = payload
        .with_pose
        .then(|| generators.pose.detect(&mut *rng).features);
    let action = generators.actions.recognize_with_pose(
        payload.current_time,
        &payload.context,
        pose.as_ref(),
        &mut *rng,
    );

    Json(RecognizeActionResponse {
        success: true,
        action,
    })
}

#[derive(Serialize)]
struct DetectPoseResponse {
    success: bool,
    pose: PoseDetection,
}

async fn detect_pose_handler(State(state): State<SharedState>) -> Json<DetectPoseResponse> {
    let pose = state.generators.pose.detect(&mut *state.rng());
    Json(DetectPoseResponse {
        success: true,
        pose,
    })
}
