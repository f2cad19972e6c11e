//! Knowledge recommendations for what is on screen.
//!
//! A small fixed knowledge base is matched against the weapon, stage and
//! action of the current scene, filtered by the learner's level, with items
//! they have already read left out.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Most items returned per request.
pub const MAX_RECOMMENDATIONS: usize = 5;
/// Weapon-driven technique items per request.
const MAX_WEAPON_ITEMS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    #[serde(rename = "初级")]
    Beginner,
    #[serde(rename = "中级")]
    Intermediate,
    #[serde(rename = "高级")]
    Advanced,
}

impl Level {
    /// Beginners are also shown intermediate material.
    fn admits(self, item: Level) -> bool {
        item == self || (self == Level::Beginner && item == Level::Intermediate)
    }
}

struct KnowledgeItem {
    id: &'static str,
    topic: &'static str,
    title: &'static str,
    content: &'static str,
    level: Level,
}

const KNOWLEDGE_BASE: &[KnowledgeItem] = &[
    KnowledgeItem {
        id: "tech_001",
        topic: "技术",
        title: "直刺技术",
        content: "直刺是击剑最基本的进攻技术，手臂先伸直再弓步前进，剑尖走直线命中有效部位。",
        level: Level::Beginner,
    },
    KnowledgeItem {
        id: "tech_002",
        topic: "技术",
        title: "转移刺技术",
        content: "转移刺是通过改变攻击方向来突破防守，剑尖绕过对手的剑从另一侧刺出。",
        level: Level::Intermediate,
    },
    KnowledgeItem {
        id: "tech_003",
        topic: "技术",
        title: "复合进攻",
        content: "复合进攻是结合多个动作的进攻方式，用假动作引出对手的防守再攻击空当。",
        level: Level::Advanced,
    },
    KnowledgeItem {
        id: "rule_001",
        topic: "规则",
        title: "得分规则",
        content: "击中有效部位得1分，个人赛先得15分者获胜，团体赛先得45分者获胜。",
        level: Level::Beginner,
    },
    KnowledgeItem {
        id: "rule_002",
        topic: "规则",
        title: "优先权规则",
        content: "在花剑和佩剑中，优先权很重要：先发起有效进攻的一方拥有优先权。",
        level: Level::Intermediate,
    },
    KnowledgeItem {
        id: "hist_001",
        topic: "历史",
        title: "击剑历史",
        content: "击剑起源于欧洲的剑术决斗，1896年第一届现代奥运会起就是正式比赛项目。",
        level: Level::Beginner,
    },
    KnowledgeItem {
        id: "train_001",
        topic: "训练",
        title: "基础训练",
        content: "基础训练包括步法移动、实战姿势、弓步和手臂伸展，是所有技术的根基。",
        level: Level::Beginner,
    },
];

fn stage_item(stage: &str) -> Option<(&'static str, &'static str)> {
    match stage {
        "开局" => Some(("比赛开局策略", "比赛开局时，运动员需要试探对手的距离感和反应速度，不要急于进攻。")),
        "中段" => Some(("比赛中期战术", "比赛中期，双方已经熟悉彼此的习惯，可以用预设战术制造得分机会。")),
        "关键分" => Some(("关键分处理", "关键分时，运动员需要保持冷静，选择自己最有把握的动作。")),
        _ => None,
    }
}

/// One recommended item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: String,
    /// "技术", "规则", "战术"...
    #[serde(rename = "type")]
    pub kind: String,
    /// What it was matched on: the weapon, "动作" or the stage.
    pub category: String,
    pub title: String,
    pub content: String,
    pub level: Level,
}

impl Recommendation {
    fn from_item(item: &KnowledgeItem, category: &str) -> Self {
        Self {
            id: item.id.into(),
            kind: item.topic.into(),
            category: category.into(),
            title: item.title.into(),
            content: item.content.into(),
            level: item.level,
        }
    }
}

/// What the viewer is watching right now.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ViewingContext {
    #[serde(default)]
    pub weapon: String,
    #[serde(default)]
    pub stage: String,
    /// Detected action name, if any
    #[serde(default)]
    pub action: Option<String>,
}

/// What the recommender knows about one learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LearnerProfile {
    pub level: Level,
    pub interests: Vec<String>,
    pub viewed: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeRecommender;

impl KnowledgeRecommender {
    pub fn new() -> Self {
        Self
    }

    /// Up to [`MAX_RECOMMENDATIONS`] items for the context, skipping what the
    /// learner has already viewed.
    pub fn recommend(&self, context: &ViewingContext, profile: &LearnerProfile) -> Vec<Recommendation> {
        let level = profile.level;
        let techniques = || {
            KNOWLEDGE_BASE
                .iter()
                .filter(move |item| item.topic == "技术" && level.admits(item.level))
        };

        let mut candidates = Vec::new();

        let weapon = context.weapon.trim();
        if !weapon.is_empty() && weapon != "未知" {
            candidates.extend(
                techniques()
                    .take(MAX_WEAPON_ITEMS)
                    .map(|item| Recommendation::from_item(item, weapon)),
            );
        }

        if let Some(action) = context.action.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            candidates.extend(
                techniques()
                    .find(|item| item.title.contains(action) || action.contains(item.title))
                    .map(|item| Recommendation::from_item(item, "动作")),
            );
        }

        let stage = context.stage.trim();
        if let Some((title, content)) = stage_item(stage) {
            candidates.push(Recommendation {
                id: format!("stage_{stage}"),
                kind: "战术".into(),
                category: stage.into(),
                title: title.into(),
                content: content.into(),
                level,
            });
        }

        let mut seen = profile.viewed.clone();
        candidates
            .into_iter()
            .filter(|rec| seen.insert(rec.id.clone()))
            .take(MAX_RECOMMENDATIONS)
            .collect()
    }
}

/// Learner profiles keyed by user id. Unknown users start as beginners.
#[derive(Debug, Clone, Default)]
pub struct LearnerProfiles {
    profiles: HashMap<String, LearnerProfile>,
}

impl LearnerProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> LearnerProfile {
        self.profiles.get(user_id).cloned().unwrap_or_default()
    }

    /// Record that the learner read `topic_id`, and optionally an interest.
    pub fn mark_viewed(&mut self, user_id: &str, topic_id: &str, interest: Option<&str>) -> &LearnerProfile {
        let profile = self.profiles.entry(user_id.to_string()).or_default();
        profile.viewed.insert(topic_id.to_string());
        if let Some(interest) = interest.map(str::trim).filter(|i| !i.is_empty()) {
            if !profile.interests.iter().any(|i| i == interest) {
                profile.interests.push(interest.to_string());
            }
        }
        profile
    }
}
