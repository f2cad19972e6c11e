//! Bout stage buckets by video position.

use serde::{Deserialize, Serialize};

/// Rough phase of a bout, derived from the playback position alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    /// First minute
    Opening,
    /// Up to three minutes
    Middle,
    /// Up to five minutes
    Critical,
    Closing,
}

impl MatchStage {
    pub const ALL: [MatchStage; 4] = [
        MatchStage::Opening,
        MatchStage::Middle,
        MatchStage::Critical,
        MatchStage::Closing,
    ];

    /// Bucket a playback position in seconds.
    pub fn from_secs(secs: u64) -> Self {
        match secs {
            0..60 => MatchStage::Opening,
            60..180 => MatchStage::Middle,
            180..300 => MatchStage::Critical,
            _ => MatchStage::Closing,
        }
    }

    /// Short scene label ("开局", "中段"...).
    pub fn label(&self) -> &'static str {
        match self {
            MatchStage::Opening => "开局",
            MatchStage::Middle => "中段",
            MatchStage::Critical => "关键分",
            MatchStage::Closing => "结束",
        }
    }

    /// One-line description of what is happening on the piste.
    pub fn description(&self) -> &'static str {
        match self {
            MatchStage::Opening => "比赛开始阶段，运动员正在热身和试探",
            MatchStage::Middle => "比赛进行中，双方展开激烈对抗",
            MatchStage::Critical => "比赛进入关键阶段，比分胶着",
            MatchStage::Closing => "比赛接近尾声，运动员全力以赴",
        }
    }
}
