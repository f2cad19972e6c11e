//! Full analysis of one paused frame: pose, action, scene and the
//! knowledge points worth showing next to them.

use crate::Generators;
use crate::action::ActionRecognition;
use crate::danmaku::{DetectedAction, FrameAnalysis, SceneInfo};
use crate::video::{VideoScene, weapon_knowledge};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgePoint {
    /// "技术" or "规则"
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub content: String,
    /// Playback position in seconds.
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub timestamp: u64,
    pub scene: VideoScene,
    pub action: ActionRecognition,
    pub knowledge_points: Vec<KnowledgePoint>,
}

impl FrameReport {
    /// The subset the danmaku generator reads.
    pub fn to_frame_analysis(&self) -> FrameAnalysis {
        FrameAnalysis {
            action: Some(DetectedAction {
                action: self.action.action.name().to_string(),
                analysis: self.action.analysis.clone(),
            }),
            scene: Some(SceneInfo {
                weapon: self.scene.weapon.to_string(),
                stage: self.scene.stage.to_string(),
            }),
        }
    }
}

impl Generators {
    /// Detect a pose, recognize the action with it, read the scene from the
    /// URL and collect knowledge points for the frame at `current_time`.
    pub fn analyze_frame<R: Rng + ?Sized>(
        &self,
        video_url: &str,
        current_time: u64,
        context: &str,
        rng: &mut R,
    ) -> FrameReport {
        let pose = self.pose.detect(rng);
        let action = self
            .actions
            .recognize_with_pose(current_time, context, Some(&pose.features), rng);
        let scene = self.video.scene(video_url, current_time);

        let mut knowledge_points = vec![KnowledgePoint {
            kind: "技术",
            title: action.action.name().to_string(),
            content: action.technique.clone(),
            time: current_time,
        }];
        if let Some(content) = weapon_knowledge(scene.weapon) {
            knowledge_points.push(KnowledgePoint {
                kind: "规则",
                title: format!("{}规则", scene.weapon),
                content: content.to_string(),
                time: current_time,
            });
        }

        FrameReport {
            timestamp: current_time,
            scene,
            action,
            knowledge_points,
        }
    }
}
