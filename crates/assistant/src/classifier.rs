//! Keyword intent classification.
//!
//! Case-insensitive substring matching, tested in a fixed priority order.
//! Role and training questions are checked first because their phrasing
//! usually also contains rule or competition words ("裁判员的职责",
//! "比赛前怎么训练").

use piste_core::{IntentCategory, KeywordRouter};
use std::sync::LazyLock;

static ROUTER: LazyLock<KeywordRouter<IntentCategory>> = LazyLock::new(|| {
    IntentCategory::PRIORITY
        .iter()
        .filter(|intent| **intent != IntentCategory::General)
        .fold(KeywordRouter::new(IntentCategory::General), |router, intent| {
            router.rule(*intent, keywords(*intent).iter().copied())
        })
});

/// Keywords that select an intent. Empty for `General`.
pub fn keywords(intent: IntentCategory) -> &'static [&'static str] {
    match intent {
        IntentCategory::RoleInquiry => &["教练", "角色", "职责", "作用", "裁判员", "coach", "role"],
        IntentCategory::TrainingInquiry => &[
            "训练", "练习", "提高", "入门", "初学", "体能", "步法", "training", "practice",
        ],
        IntentCategory::RulesInquiry => &[
            "规则", "得分", "计分", "场地", "装备", "裁判", "优先权", "犯规", "rule", "score",
        ],
        IntentCategory::TechniqueInquiry => {
            &["技术", "动作", "进攻", "防守", "战术", "技巧", "technique"]
        }
        IntentCategory::HistoryInquiry => {
            &["历史", "起源", "发展", "奥运会", "history", "olympic"]
        }
        IntentCategory::CompetitionAnalysis => &["比赛", "分析", "精彩", "漂亮", "心理", "match"],
        IntentCategory::Terminology => {
            &["花剑", "重剑", "佩剑", "术语", "区别", "foil", "epee", "sabre"]
        }
        IntentCategory::General => &[],
    }
}

/// Classify a message. Never fails; anything unmatched is `General`.
pub fn classify(message: &str) -> IntentCategory {
    ROUTER.classify(message)
}
