//! Heuristic fencing-action recognizer and commentator.
//!
//! Probabilities come from a base table nudged by the playback position and
//! by attack/defence keywords in the caller's context. The most likely action
//! is reported together with its teaching notes and a commentary line.

use crate::pose::PoseFeatures;
use piste_core::TemplateBank;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Actions the recognizer can report, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FencingAction {
    #[serde(rename = "直刺")]
    StraightThrust,
    #[serde(rename = "转移刺")]
    Disengage,
    #[serde(rename = "格挡")]
    Parry,
    #[serde(rename = "闪避")]
    Evasion,
    #[serde(rename = "复合进攻")]
    CompoundAttack,
}

impl FencingAction {
    pub const ALL: [FencingAction; 5] = [
        FencingAction::StraightThrust,
        FencingAction::Disengage,
        FencingAction::Parry,
        FencingAction::Evasion,
        FencingAction::CompoundAttack,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FencingAction::StraightThrust => "直刺",
            FencingAction::Disengage => "转移刺",
            FencingAction::Parry => "格挡",
            FencingAction::Evasion => "闪避",
            FencingAction::CompoundAttack => "复合进攻",
        }
    }

    /// Base likelihood in hundredths.
    fn base_weight(&self) -> u32 {
        match self {
            FencingAction::StraightThrust => 30,
            FencingAction::Disengage => 25,
            FencingAction::Parry => 20,
            FencingAction::Evasion => 15,
            FencingAction::CompoundAttack => 10,
        }
    }

    fn is_thrust(&self) -> bool {
        matches!(self, FencingAction::StraightThrust | FencingAction::Disengage)
    }

    fn profile(&self) -> ActionProfile {
        match self {
            FencingAction::StraightThrust => ActionProfile {
                description: "直刺是击剑最基本的进攻技术，要求动作直接、快速、准确。",
                key_points: &["保持身体平衡", "手臂伸直", "剑尖对准目标", "快速出击"],
                common_mistakes: &["身体前倾过度", "动作不够直接", "时机把握不准"],
                analysis: "这是一个经典的直刺动作，时机把握很好，动作直接有效。",
                tips: &["注意时机把握", "保持动作直接", "剑尖要对准目标"],
            },
            FencingAction::Disengage => ActionProfile {
                description: "转移刺是通过改变攻击方向来突破对手防守的技术。",
                key_points: &["假动作要逼真", "转移要快速", "保持身体稳定", "观察对手反应"],
                common_mistakes: &["假动作不够逼真", "转移速度慢", "失去平衡"],
                analysis: "转移刺运用巧妙，假动作成功迷惑了对手，转移快速果断。",
                tips: &["假动作要逼真", "转移要快速", "观察对手反应"],
            },
            FencingAction::Parry => ActionProfile {
                description: "格挡是防守技术，用于化解对手的进攻。",
                key_points: &["及时反应", "剑身位置正确", "为反击做准备", "保持距离"],
                common_mistakes: &["反应太慢", "格挡位置不对", "没有准备反击"],
                analysis: "格挡及时到位，不仅化解了对手进攻，还为反击创造了机会。",
                tips: &["及时反应", "准备反击", "保持距离"],
            },
            FencingAction::Evasion => ActionProfile {
                description: "闪避是通过身体移动来避开对手攻击的技术。",
                key_points: &["判断准确", "移动快速", "保持平衡", "准备反击"],
                common_mistakes: &["判断失误", "移动太慢", "失去平衡"],
                analysis: "闪避动作灵活，成功避开了对手的攻击，保持了有利位置。",
                tips: &["判断要准确", "移动要快速", "保持平衡"],
            },
            FencingAction::CompoundAttack => ActionProfile {
                description: "复合进攻是结合多个动作的进攻方式，更具迷惑性。",
                key_points: &["动作连贯", "节奏变化", "观察对手", "把握时机"],
                common_mistakes: &["动作不连贯", "节奏单一", "时机把握不准"],
                analysis: "复合进攻运用得当，动作连贯，节奏变化成功迷惑了对手。",
                tips: &["动作要连贯", "节奏要变化", "把握时机"],
            },
        }
    }
}

struct ActionProfile {
    description: &'static str,
    key_points: &'static [&'static str],
    common_mistakes: &'static [&'static str],
    analysis: &'static str,
    tips: &'static [&'static str],
}

/// Result of one recognition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecognition {
    pub action: FencingAction,
    pub confidence: f64,
    /// Playback position in seconds.
    pub timestamp: u64,
    pub technique: String,
    pub key_points: Vec<String>,
    pub analysis: String,
    pub tips: Vec<String>,
    pub common_mistakes: Vec<String>,
    pub commentary: String,
    pub probabilities: BTreeMap<FencingAction, f64>,
}

pub struct ActionRecognizer {
    commentary: TemplateBank<FencingAction>,
}

impl Default for ActionRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRecognizer {
    pub fn new() -> Self {
        use FencingAction::*;

        let commentary = TemplateBank::new("这是一个击剑动作，展现了运动员的技术水平。")
            .with(
                StraightThrust,
                [
                    "这是一个经典的直刺动作，运动员动作直接、快速，剑尖准确对准目标。",
                    "看这个直刺！运动员保持了良好的身体平衡，手臂完全伸展，时机把握精准。",
                    "精彩的直刺！动作干净利落，展现了扎实的基本功。",
                    "这个直刺动作非常标准，身体重心稳定，出剑速度快，展现了专业的技术水平。",
                ],
            )
            .with(
                Disengage,
                [
                    "这是一个经典的转移刺，运动员利用假动作迷惑对手，然后快速转移攻击方向。",
                    "看这个转移刺！假动作非常逼真，成功骗过了对手的防守，转移快速果断。",
                    "精彩的转移刺！运动员观察敏锐，抓住了对手防守的空当，转移时机完美。",
                    "这个转移刺运用巧妙，假动作和真动作的衔接非常流畅，展现了高超的技术。",
                ],
            )
            .with(
                Parry,
                [
                    "这是一个及时的格挡，运动员反应迅速，成功化解了对手的进攻。",
                    "看这个格挡！剑身位置准确，不仅挡住了攻击，还为反击创造了机会。",
                    "精彩的格挡！运动员判断准确，格挡后立即准备反击，展现了良好的防守意识。",
                    "这个格挡非常到位，不仅化解了危险，还保持了有利的防守位置。",
                ],
            )
            .with(
                Evasion,
                [
                    "这是一个灵活的闪避动作，运动员身体移动快速，成功避开了对手的攻击。",
                    "看这个闪避！判断准确，移动迅速，保持了良好的身体平衡。",
                    "精彩的闪避！运动员柔韧性很好，闪避后立即寻找反攻机会。",
                    "这个闪避动作展现了运动员的身体控制能力，成功避开了攻击并保持了有利位置。",
                ],
            )
            .with(
                CompoundAttack,
                [
                    "这是一个复合进攻，运动员结合了多个动作，节奏变化成功迷惑了对手。",
                    "看这个复合进攻！动作连贯流畅，假动作逼真，真动作果断，展现了高超的技术。",
                    "精彩的复合进攻！运动员观察敏锐，动作组合巧妙，成功突破了对手的防守。",
                    "这个复合进攻运用得当，动作之间的衔接非常自然，展现了专业的技术水平。",
                ],
            );

        Self { commentary }
    }

    /// Likelihood of each action, in hundredths.
    fn weights(current_time: u64, context: &str) -> BTreeMap<FencingAction, u32> {
        use FencingAction::*;

        let mut weights: BTreeMap<_, _> = FencingAction::ALL
            .iter()
            .map(|a| (*a, a.base_weight()))
            .collect();

        if current_time < 60 {
            weights.insert(StraightThrust, 40);
        } else if current_time > 180 {
            weights.insert(Disengage, 35);
        }

        let mut bump = |action, delta| {
            if let Some(w) = weights.get_mut(&action) {
                *w += delta;
            }
        };
        if context.contains("进攻") {
            bump(StraightThrust, 20);
            bump(Disengage, 15);
        } else if context.contains("防守") {
            bump(Parry, 20);
            bump(Evasion, 15);
        }

        weights
    }

    /// Estimated probability of each action.
    pub fn probabilities(&self, current_time: u64, context: &str) -> BTreeMap<FencingAction, f64> {
        Self::weights(current_time, context)
            .into_iter()
            .map(|(a, w)| (a, f64::from(w) / 100.0))
            .collect()
    }

    pub fn recognize<R: Rng + ?Sized>(
        &self,
        current_time: u64,
        context: &str,
        rng: &mut R,
    ) -> ActionRecognition {
        self.recognize_with_pose(current_time, context, None, rng)
    }

    /// Like [`recognize`](Self::recognize), with the commentary refined by
    /// pose features when they are available.
    pub fn recognize_with_pose<R: Rng + ?Sized>(
        &self,
        current_time: u64,
        context: &str,
        pose: Option<&PoseFeatures>,
        rng: &mut R,
    ) -> ActionRecognition {
        let weights = Self::weights(current_time, context);

        // first action in tie-break order wins on equal weight
        let mut best = (FencingAction::StraightThrust, 0);
        for action in FencingAction::ALL {
            let weight = weights.get(&action).copied().unwrap_or(0);
            if weight > best.1 {
                best = (action, weight);
            }
        }
        let (action, weight) = best;
        let profile = action.profile();

        let mut commentary = self.commentary.select(&action, rng).to_string();
        if let Some(features) = pose {
            let notes = pose_notes(action, features);
            if !notes.is_empty() {
                commentary.push('，');
                commentary.push_str(&notes.join("，"));
            }
        }

        tracing::debug!(action = action.name(), weight, current_time, "Action recognized");

        ActionRecognition {
            action,
            confidence: f64::from(weight) / 100.0,
            timestamp: current_time,
            technique: profile.description.to_string(),
            key_points: owned(profile.key_points),
            analysis: profile.analysis.to_string(),
            tips: owned(profile.tips),
            common_mistakes: owned(profile.common_mistakes),
            commentary,
            probabilities: weights
                .into_iter()
                .map(|(a, w)| (a, f64::from(w) / 100.0))
                .collect(),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Observations about the pose that fit the action.
fn pose_notes(action: FencingAction, pose: &PoseFeatures) -> Vec<&'static str> {
    let mut notes = Vec::new();

    if action.is_thrust() {
        if pose.left_arm_extension > 0.4 || pose.right_arm_extension > 0.4 {
            notes.push("手臂完全伸展");
        } else if pose.left_arm_extension < 0.2 || pose.right_arm_extension < 0.2 {
            notes.push("手臂未完全伸展");
        }
    }

    if pose.shoulder_angle.abs() > 15.0 {
        notes.push(if pose.shoulder_angle > 0.0 {
            "身体略微右倾"
        } else {
            "身体略微左倾"
        });
    }

    if action == FencingAction::Parry && (pose.left_arm_angle > 90.0 || pose.right_arm_angle > 90.0)
    {
        notes.push("格挡角度正确");
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn opening_favours_straight_thrust() {
        let r = ActionRecognizer::new().recognize(30, "", &mut rng());
        assert_eq!(r.action, FencingAction::StraightThrust);
        assert!((r.confidence - 0.4).abs() < 1e-9);
        assert_eq!(r.timestamp, 30);
        assert_eq!(r.key_points.len(), 4);
        assert_eq!(r.tips.len(), 3);
    }

    #[test]
    fn late_bout_favours_disengage() {
        let r = ActionRecognizer::new().recognize(200, "", &mut rng());
        assert_eq!(r.action, FencingAction::Disengage);
        assert!((r.confidence - 0.35).abs() < 1e-9);
    }

    #[test]
    fn middle_uses_base_table() {
        let recognizer = ActionRecognizer::new();
        let p = recognizer.probabilities(120, "");
        assert!((p[&FencingAction::StraightThrust] - 0.3).abs() < 1e-9);
        assert!((p[&FencingAction::CompoundAttack] - 0.1).abs() < 1e-9);
        // 180 itself is not "after three minutes"
        assert!((recognizer.probabilities(180, "")[&FencingAction::Disengage] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn defence_context_picks_parry() {
        let r = ActionRecognizer::new().recognize(120, "对手在防守", &mut rng());
        assert_eq!(r.action, FencingAction::Parry);
        assert!((r.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn attack_context_wins_over_defence() {
        let p = ActionRecognizer::new().probabilities(120, "进攻和防守");
        assert!((p[&FencingAction::StraightThrust] - 0.5).abs() < 1e-9);
        assert!((p[&FencingAction::Parry] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn tie_goes_to_earlier_action() {
        // late attack: 直刺 30+20 and 转移刺 35+15
        let r = ActionRecognizer::new().recognize(240, "进攻", &mut rng());
        assert_eq!(r.action, FencingAction::StraightThrust);
    }

    #[test]
    fn commentary_comes_from_action_templates() {
        let recognizer = ActionRecognizer::new();
        let r = recognizer.recognize(120, "防守", &mut rng());
        assert!(
            recognizer
                .commentary
                .candidates(&FencingAction::Parry)
                .contains(&r.commentary)
        );
    }

    #[test]
    fn pose_refines_commentary() {
        let recognizer = ActionRecognizer::new();
        let pose = PoseFeatures {
            left_arm_angle: 170.0,
            right_arm_angle: 100.0,
            shoulder_angle: -20.0,
            left_arm_extension: 0.5,
            right_arm_extension: 0.3,
        };

        let thrust = recognizer.recognize_with_pose(30, "", Some(&pose), &mut rng());
        assert!(thrust.commentary.ends_with("，手臂完全伸展，身体略微左倾"));

        let parry = recognizer.recognize_with_pose(120, "防守", Some(&pose), &mut rng());
        assert!(parry.commentary.ends_with("，身体略微左倾，格挡角度正确"));
    }

    #[test]
    fn neutral_pose_adds_nothing() {
        let pose = PoseFeatures {
            left_arm_extension: 0.3,
            right_arm_extension: 0.3,
            ..PoseFeatures::default()
        };
        assert!(pose_notes(FencingAction::StraightThrust, &pose).is_empty());
        assert!(pose_notes(FencingAction::Evasion, &pose).is_empty());
    }

    #[test]
    fn action_serializes_as_name() {
        let r = ActionRecognizer::new().recognize(30, "", &mut rng());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["action"], "直刺");
        assert!(json["probabilities"]["复合进攻"].is_number());
    }
}
