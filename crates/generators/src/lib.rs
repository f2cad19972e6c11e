//! Viewer-facing content generators for piste.
//!
//! Everything here is template- or heuristic-driven and takes an injected
//! [`rand::Rng`], so a seeded generator gives repeatable output.

pub mod action;
pub mod competition;
pub mod danmaku;
pub mod frame;
pub mod pose;
pub mod recommend;
pub mod stage;
pub mod video;

pub use action::{ActionRecognition, ActionRecognizer, FencingAction};
pub use competition::{CompetitionFeed, CompetitionResult, RankingEntry};
pub use danmaku::{
    Danmaku, DanmakuBoard, DanmakuGenerator, DanmakuKind, DanmakuStats, DanmakuStyle,
    FrameAnalysis, GeneratedDanmaku, MatchContext,
};
pub use frame::{FrameReport, KnowledgePoint};
pub use pose::{PoseDetection, PoseEstimator, PoseFeatures};
pub use recommend::{
    KnowledgeRecommender, LearnerProfile, LearnerProfiles, Level, Recommendation, ViewingContext,
};
pub use stage::MatchStage;
pub use video::{
    KeyMoment, Thumbnails, VideoAnalyzer, VideoInfo, VideoScene, embed_url, extract_playlist_id,
    extract_video_id, parse_youtube, share_url,
};

/// All generators, built once and shared by the gateway.
#[derive(Default)]
pub struct Generators {
    pub danmaku: DanmakuGenerator,
    pub actions: ActionRecognizer,
    pub pose: PoseEstimator,
    pub competitions: CompetitionFeed,
    pub video: VideoAnalyzer,
    pub recommender: KnowledgeRecommender,
}

impl Generators {
    pub fn new() -> Self {
        Self::default()
    }
}
