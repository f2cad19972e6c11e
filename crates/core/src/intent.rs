//! Intent categories.
//!
//! The closed set of coarse question types the assistant routes on. An intent
//! is derived per message and never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of question the user is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentCategory {
    /// Rules, scoring, venue, equipment, refereeing
    RulesInquiry,
    /// Attacks, defence, tactics
    TechniqueInquiry,
    /// Origins, Olympic history
    HistoryInquiry,
    /// Commentary on a bout
    CompetitionAnalysis,
    /// Weapon names and jargon
    Terminology,
    /// How to practise and improve
    TrainingInquiry,
    /// What coaches, referees and other people on the piste do
    RoleInquiry,
    /// Anything else
    General,
}

impl IntentCategory {
    /// Every category, in classification priority order.
    pub const PRIORITY: [IntentCategory; 8] = [
        IntentCategory::RoleInquiry,
        IntentCategory::TrainingInquiry,
        IntentCategory::RulesInquiry,
        IntentCategory::TechniqueInquiry,
        IntentCategory::HistoryInquiry,
        IntentCategory::CompetitionAnalysis,
        IntentCategory::Terminology,
        IntentCategory::General,
    ];

    /// Stable machine name, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::RulesInquiry => "rules-inquiry",
            IntentCategory::TechniqueInquiry => "technique-inquiry",
            IntentCategory::HistoryInquiry => "history-inquiry",
            IntentCategory::CompetitionAnalysis => "competition-analysis",
            IntentCategory::Terminology => "terminology",
            IntentCategory::TrainingInquiry => "training-inquiry",
            IntentCategory::RoleInquiry => "role-inquiry",
            IntentCategory::General => "general",
        }
    }

    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            IntentCategory::RulesInquiry => "规则询问",
            IntentCategory::TechniqueInquiry => "技术询问",
            IntentCategory::HistoryInquiry => "历史询问",
            IntentCategory::CompetitionAnalysis => "比赛分析",
            IntentCategory::Terminology => "术语解释",
            IntentCategory::TrainingInquiry => "训练询问",
            IntentCategory::RoleInquiry => "角色询问",
            IntentCategory::General => "一般询问",
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
