//! Local responder: answers from the built-in knowledge store.
//!
//! Each intent owns a topic router. A second keyword match inside the message
//! picks a specific entry; with no match the intent's summary entry is used.

use crate::knowledge::{KnowledgeCategory, KnowledgeStore};
use piste_core::{IntentCategory, KeywordRouter};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Returned when a routed topic is missing from the store.
pub const MISSING_KNOWLEDGE: &str =
    "抱歉，我暂时没有这方面的资料。您可以问我击剑的规则、技术、历史或比赛相关问题。";

const GREETING: &str =
    "您好！我是击剑AI专家，可以为您解答击剑相关问题，包括规则、技术、历史、比赛分析等。请问有什么可以帮助您的吗？";

struct TopicRoute {
    category: KnowledgeCategory,
    topics: KeywordRouter<&'static str>,
}

/// Canned-answer responder. Pure: the same inputs give the same answer.
pub struct LocalResponder {
    store: Arc<KnowledgeStore>,
    routes: HashMap<IntentCategory, TopicRoute>,
}

impl LocalResponder {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        use KnowledgeCategory as K;

        let mut routes = HashMap::new();
        let mut route = |intent, category, topics| {
            routes.insert(intent, TopicRoute { category, topics });
        };

        route(
            IntentCategory::RulesInquiry,
            K::Rule,
            KeywordRouter::new("基本规则")
                .rule("得分规则", ["得分", "计分", "score"])
                .rule("场地规则", ["场地"])
                .rule("装备要求", ["装备"])
                .rule("优先权", ["优先权", "主动权", "right of way"])
                .rule("犯规", ["犯规", "黄牌", "红牌"])
                .rule("裁判规则", ["裁判"]),
        );
        route(
            IntentCategory::TechniqueInquiry,
            K::Technique,
            KeywordRouter::new("技术概述")
                .rule("进攻技术", ["进攻"])
                .rule("防守技术", ["防守"])
                .rule("战术运用", ["战术"])
                .rule("基本动作", ["基本动作", "基本功"]),
        );
        route(
            IntentCategory::HistoryInquiry,
            K::History,
            KeywordRouter::new("概述")
                .rule("起源", ["起源"])
                .rule("中国", ["中国"])
                .rule("奥运会", ["奥运", "olympic"]),
        );
        route(
            IntentCategory::CompetitionAnalysis,
            K::Competition,
            KeywordRouter::new("比赛概述")
                .rule("精彩表现", ["精彩", "漂亮"])
                .rule("战术分析", ["战术"])
                .rule("心理博弈", ["心理"])
                .rule("世锦赛", ["世锦赛"])
                .rule("世界杯", ["世界杯"]),
        );
        route(
            IntentCategory::Terminology,
            K::WeaponType,
            KeywordRouter::new("术语")
                .rule("剑种区别", ["区别", "不同"])
                .rule("花剑", ["花剑", "foil"])
                .rule("重剑", ["重剑", "epee"])
                .rule("佩剑", ["佩剑", "sabre"]),
        );
        route(
            IntentCategory::TrainingInquiry,
            K::Training,
            KeywordRouter::new("训练方法")
                .rule("入门", ["入门", "初学", "新手"])
                .rule("步法", ["步法"])
                .rule("体能", ["体能", "力量"]),
        );
        route(
            IntentCategory::RoleInquiry,
            K::Role,
            KeywordRouter::new("场上角色")
                .rule("裁判员", ["裁判"])
                .rule("教练", ["教练", "coach"]),
        );

        Self { store, routes }
    }

    /// A responder over the built-in knowledge.
    pub fn builtin() -> Self {
        Self::new(Arc::new(KnowledgeStore::builtin()))
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Answer a message of the given intent. Never empty.
    pub fn respond(&self, intent: IntentCategory, message: &str, video_context: &str) -> String {
        let video_context = video_context.trim();

        let Some(route) = self.routes.get(&intent) else {
            return greeting(video_context);
        };

        let topic = route.topics.classify(message);
        let answer = match self.store.get(route.category, topic) {
            Some(entry) => entry.render(),
            None => {
                tracing::warn!(?intent, topic, "Knowledge entry missing, using default answer");
                MISSING_KNOWLEDGE.to_string()
            }
        };

        with_video_note(answer, video_context)
    }

    /// `count` random training tips.
    pub fn tips<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<String> {
        self.store.sample_tips(count, rng)
    }
}

fn greeting(video_context: &str) -> String {
    if video_context.is_empty() {
        GREETING.to_string()
    } else {
        format!(
            "我正在观看{video_context}。作为击剑AI专家，我可以为您解答击剑相关问题，包括规则、技术、历史等方面。请问您想了解什么？"
        )
    }
}

fn with_video_note(answer: String, video_context: &str) -> String {
    if video_context.is_empty() || answer.contains(video_context) {
        answer
    } else {
        format!("{answer}\n\n结合您正在观看的「{video_context}」，可以留意视频中运动员的相关表现。")
    }
}
