//! Danmaku: the scrolling comments overlaid on the video.
//!
//! [`DanmakuGenerator`] writes AI comments, either from free-text context or
//! from a structured frame analysis. [`DanmakuBoard`] keeps the bounded
//! history of user and AI comments.

use crate::stage::MatchStage;
use chrono::{DateTime, Utc};
use piste_core::error::{Error, Result};
use piste_core::{KeywordRouter, TemplateBank, render};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use uuid::Uuid;

/// Style of a comment. Serialized with the Chinese label the front end shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DanmakuStyle {
    #[serde(rename = "进攻")]
    Attack,
    #[serde(rename = "防守")]
    Defense,
    #[serde(rename = "战术")]
    Tactics,
    #[serde(rename = "技术")]
    Technique,
    #[serde(rename = "精彩")]
    Highlight,
    #[serde(rename = "鼓励")]
    Encouragement,
    #[serde(rename = "一般")]
    General,
}

impl DanmakuStyle {
    pub fn label(&self) -> &'static str {
        match self {
            DanmakuStyle::Attack => "进攻",
            DanmakuStyle::Defense => "防守",
            DanmakuStyle::Tactics => "战术",
            DanmakuStyle::Technique => "技术",
            DanmakuStyle::Highlight => "精彩",
            DanmakuStyle::Encouragement => "鼓励",
            DanmakuStyle::General => "一般",
        }
    }
}

/// Situation in the bout inferred from the viewer's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchContext {
    #[serde(rename = "比赛开始")]
    Opening,
    #[serde(rename = "比赛进行")]
    InProgress,
    #[serde(rename = "关键时刻")]
    Critical,
    #[serde(rename = "比分领先")]
    Leading,
    #[serde(rename = "比分落后")]
    Trailing,
    #[serde(rename = "技术展示")]
    Showcase,
}

/// Structured output of a frame analyser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<DetectedAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedAction {
    /// Action name, e.g. "转移刺"
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub analysis: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneInfo {
    /// "花剑", "重剑", "佩剑" or "未知"
    #[serde(default)]
    pub weapon: String,
    #[serde(default)]
    pub stage: String,
}

/// Which line a detected action gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ActionLine {
    Transfer,
    Parry,
    Compound,
    Other,
}

const SCENE_LINE: &str = "这是{weapon}比赛，当前处于{stage}阶段";

/// A generated AI comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDanmaku {
    pub text: String,
    pub style: DanmakuStyle,
    pub context: MatchContext,
}

/// Template-driven AI comment writer.
pub struct DanmakuGenerator {
    templates: TemplateBank<DanmakuStyle>,
    contexts: KeywordRouter<MatchContext>,
    styles: HashMap<MatchContext, Vec<DanmakuStyle>>,
    stage_lines: TemplateBank<MatchStage>,
    action_kinds: KeywordRouter<ActionLine>,
    action_lines: TemplateBank<ActionLine>,
    categories: KeywordRouter<DanmakuStyle>,
}

impl Default for DanmakuGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DanmakuGenerator {
    pub fn new() -> Self {
        use DanmakuStyle::*;

        let templates = TemplateBank::new("比赛很精彩")
            .with(
                Attack,
                [
                    "进攻很犀利！",
                    "这个直刺很准",
                    "转移刺时机很好",
                    "速度真快！",
                    "时机把握得很好",
                    "假动作很巧妙",
                    "复合进攻很精彩",
                    "这个进攻很有创意",
                ],
            )
            .with(
                Defense,
                [
                    "防守很稳健",
                    "格挡很及时",
                    "闪避很灵活",
                    "反应很快",
                    "防守很到位",
                    "这个防守很漂亮",
                    "反击时机很好",
                    "防守反击很精彩",
                ],
            )
            .with(
                Tactics,
                [
                    "战术运用得当",
                    "节奏控制很好",
                    "变化很丰富",
                    "策略很清晰",
                    "配合很默契",
                    "心理战很成功",
                    "这个战术很聪明",
                    "临场应变很好",
                ],
            )
            .with(
                Technique,
                [
                    "技术很纯熟",
                    "动作很标准",
                    "基本功很扎实",
                    "技术很全面",
                    "发挥很稳定",
                    "这个动作很漂亮",
                    "技术运用很灵活",
                ],
            )
            .with(
                Highlight,
                [
                    "太精彩了！",
                    "神操作！",
                    "完美！",
                    "太棒了！",
                    "精彩绝伦！",
                    "这个动作太帅了！",
                    "绝了！",
                    "太厉害了！",
                ],
            )
            .with(
                Encouragement,
                [
                    "继续加油",
                    "稳住",
                    "调整一下",
                    "不要着急",
                    "保持冷静",
                    "相信自己",
                    "还有机会",
                    "坚持住",
                ],
            );

        let contexts = KeywordRouter::new(MatchContext::InProgress)
            .rule(MatchContext::Opening, ["热身", "试探", "开始", "准备"])
            .rule(MatchContext::InProgress, ["进行", "对抗", "激烈", "胶着"])
            .rule(MatchContext::Critical, ["关键", "重要", "决定", "最后"])
            .rule(MatchContext::Leading, ["领先", "优势", "控制", "主导"])
            .rule(MatchContext::Trailing, ["落后", "追赶", "反击", "绝地"])
            .rule(MatchContext::Showcase, ["技术", "动作", "技巧", "展示"]);

        let styles = HashMap::from([
            (MatchContext::Opening, vec![Technique, Encouragement]),
            (MatchContext::InProgress, vec![Attack, Defense, Tactics, Technique]),
            (MatchContext::Critical, vec![Highlight, Tactics, Technique]),
            (MatchContext::Leading, vec![Technique, Tactics, Highlight]),
            (MatchContext::Trailing, vec![Encouragement, Tactics, Technique]),
            (MatchContext::Showcase, vec![Attack, Defense, Tactics, Technique]),
        ]);

        let stage_lines = TemplateBank::new("比赛很激烈")
            .with(MatchStage::Opening, ["比赛开始", "精彩即将开始", "拭目以待"])
            .with(MatchStage::Middle, ["比赛很激烈", "双方都很强", "精彩继续"])
            .with(MatchStage::Critical, ["关键时刻", "决定胜负", "紧张时刻"])
            .with(MatchStage::Closing, ["比赛结束", "精彩比赛", "感谢观看"]);

        let action_kinds = KeywordRouter::new(ActionLine::Other)
            .rule(ActionLine::Transfer, ["转移刺"])
            .rule(ActionLine::Parry, ["格挡"])
            .rule(ActionLine::Compound, ["复合进攻"]);

        let action_lines = TemplateBank::new("{action}时机把握很好！")
            .with(ActionLine::Transfer, ["精彩的{action}！{analysis}"])
            .with(ActionLine::Parry, ["防守到位！{analysis}"])
            .with(ActionLine::Compound, ["复合进攻很巧妙！{analysis}"]);

        let categories = KeywordRouter::new(General)
            .rule(Attack, ["进攻", "攻击", "刺击", "出击"])
            .rule(Defense, ["防守", "格挡", "闪避", "后退"])
            .rule(Tactics, ["战术", "策略", "节奏", "变化"])
            .rule(Technique, ["技术", "动作", "技巧", "基本功"])
            .rule(Highlight, ["精彩", "漂亮", "厉害", "棒"]);

        Self {
            templates,
            contexts,
            styles,
            stage_lines,
            action_kinds,
            action_lines,
            categories,
        }
    }

    /// Infer the bout situation from the video context and the viewer's text.
    pub fn match_context(&self, video_context: &str, user_message: &str) -> MatchContext {
        self.contexts
            .classify(&format!("{video_context} {user_message}"))
    }

    /// An AI comment for free-text context.
    pub fn generate_ai<R: Rng + ?Sized>(
        &self,
        video_context: &str,
        user_message: &str,
        rng: &mut R,
    ) -> GeneratedDanmaku {
        let context = self.match_context(video_context, user_message);
        let style = self
            .styles
            .get(&context)
            .and_then(|styles| styles.choose(rng))
            .copied()
            .unwrap_or(DanmakuStyle::Technique);
        let text = self.templates.select(&style, rng).to_string();

        GeneratedDanmaku {
            text,
            style,
            context,
        }
    }

    /// An AI comment for a structured frame analysis.
    ///
    /// A detected action wins over scene information; with neither, a line
    /// for the stage at `current_time` is picked.
    pub fn contextual<R: Rng + ?Sized>(
        &self,
        frame: &FrameAnalysis,
        current_time: u64,
        rng: &mut R,
    ) -> String {
        if let Some(action) = frame.action.as_ref().filter(|a| !a.action.trim().is_empty()) {
            let name = action.action.trim();
            let line = self.action_kinds.classify(name);
            let template = self.action_lines.select(&line, rng);
            return render(template, &[("action", name), ("analysis", action.analysis.trim())]);
        }

        let scene = frame
            .scene
            .as_ref()
            .filter(|s| !s.weapon.trim().is_empty() && s.weapon.trim() != "未知");
        if let Some(scene) = scene {
            let stage = match scene.stage.trim() {
                "" => MatchStage::from_secs(current_time).label(),
                stage => stage,
            };
            return render(SCENE_LINE, &[("weapon", scene.weapon.trim()), ("stage", stage)]);
        }

        self.stage_lines
            .select(&MatchStage::from_secs(current_time), rng)
            .to_string()
    }

    /// Style of a viewer-sent comment.
    pub fn categorize(&self, text: &str) -> DanmakuStyle {
        self.categories.classify(text)
    }
}

/// Who sent a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanmakuKind {
    User,
    Ai,
}

/// One comment on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Danmaku {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: DanmakuKind,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub category: DanmakuStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Counts over the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DanmakuStats {
    pub total: usize,
    pub user: usize,
    pub ai: usize,
    pub categories: BTreeMap<String, usize>,
    pub last_updated: DateTime<Utc>,
}

/// Bounded history of comments, oldest evicted first.
#[derive(Debug, Clone)]
pub struct DanmakuBoard {
    entries: VecDeque<Danmaku>,
    cap: usize,
}

impl Default for DanmakuBoard {
    fn default() -> Self {
        Self::new(100)
    }
}

impl DanmakuBoard {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    /// Post a viewer comment. Blank text is rejected.
    pub fn add_user(
        &mut self,
        text: &str,
        user_id: &str,
        category: DanmakuStyle,
    ) -> Result<Danmaku> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("danmaku text is required".into()));
        }
        let user_id = match user_id.trim() {
            "" => "anonymous",
            id => id,
        };

        Ok(self.push(Danmaku {
            id: format!("user_{}", Uuid::new_v4()),
            text: text.to_string(),
            kind: DanmakuKind::User,
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            category,
            context: None,
        }))
    }

    /// Record an AI comment.
    pub fn add_ai(&mut self, generated: &GeneratedDanmaku, video_context: &str) -> Danmaku {
        let context = Some(video_context.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        self.push(Danmaku {
            id: format!("ai_{}", Uuid::new_v4()),
            text: generated.text.clone(),
            kind: DanmakuKind::Ai,
            user_id: "ai_system".into(),
            timestamp: Utc::now(),
            category: generated.style,
            context,
        })
    }

    fn push(&mut self, danmaku: Danmaku) -> Danmaku {
        self.entries.push_back(danmaku.clone());
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
        danmaku
    }

    /// The last `limit` comments, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<Danmaku> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// The last `limit` comments of a style.
    pub fn by_category(&self, category: DanmakuStyle, limit: usize) -> Vec<Danmaku> {
        let matching: Vec<_> = self
            .entries
            .iter()
            .filter(|d| d.category == category)
            .collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    /// Up to `limit` comments containing `keyword`, oldest first.
    pub fn search(&self, keyword: &str, limit: usize) -> Vec<Danmaku> {
        let keyword = keyword.to_lowercase();
        self.entries
            .iter()
            .filter(|d| d.text.to_lowercase().contains(&keyword))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> DanmakuStats {
        let mut categories = BTreeMap::new();
        for d in &self.entries {
            *categories.entry(d.category.label().to_string()).or_insert(0) += 1;
        }
        let user = self
            .entries
            .iter()
            .filter(|d| d.kind == DanmakuKind::User)
            .count();

        DanmakuStats {
            total: self.entries.len(),
            user,
            ai: self.entries.len() - user,
            categories,
            last_updated: Utc::now(),
        }
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(2024)
    }

    #[test]
    fn context_classification() {
        let g = DanmakuGenerator::new();
        assert_eq!(g.match_context("比赛刚开始", ""), MatchContext::Opening);
        assert_eq!(g.match_context("", "到了关键分"), MatchContext::Critical);
        assert_eq!(g.match_context("目前比分落后", ""), MatchContext::Trailing);
        assert_eq!(g.match_context("", "这个技巧"), MatchContext::Showcase);
        assert_eq!(g.match_context("", ""), MatchContext::InProgress);
    }

    #[test]
    fn generated_style_fits_context() {
        let g = DanmakuGenerator::new();
        let mut rng = rng();
        for _ in 0..30 {
            let d = g.generate_ai("比赛开始", "", &mut rng);
            assert_eq!(d.context, MatchContext::Opening);
            assert!(matches!(
                d.style,
                DanmakuStyle::Technique | DanmakuStyle::Encouragement
            ));
            assert!(g.templates.candidates(&d.style).contains(&d.text));
        }
    }

    #[test]
    fn seeded_generation_repeats() {
        let g = DanmakuGenerator::new();
        let a = g.generate_ai("", "领先了", &mut rng());
        let b = g.generate_ai("", "领先了", &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn contextual_action_lines() {
        let g = DanmakuGenerator::new();
        let mut rng = rng();
        let frame = |name: &str| FrameAnalysis {
            action: Some(DetectedAction {
                action: name.into(),
                analysis: "时机很好".into(),
            }),
            scene: None,
        };

        assert_eq!(g.contextual(&frame("转移刺"), 0, &mut rng), "精彩的转移刺！时机很好");
        assert_eq!(g.contextual(&frame("格挡"), 0, &mut rng), "防守到位！时机很好");
        assert_eq!(g.contextual(&frame("复合进攻"), 0, &mut rng), "复合进攻很巧妙！时机很好");
        assert_eq!(g.contextual(&frame("直刺"), 0, &mut rng), "直刺时机把握很好！");
    }

    #[test]
    fn contextual_scene_line() {
        let g = DanmakuGenerator::new();
        let frame = FrameAnalysis {
            action: None,
            scene: Some(SceneInfo {
                weapon: "佩剑".into(),
                stage: "中段".into(),
            }),
        };
        assert_eq!(
            g.contextual(&frame, 100, &mut rng()),
            "这是佩剑比赛，当前处于中段阶段"
        );
    }

    #[test]
    fn contextual_falls_back_to_stage_line() {
        let g = DanmakuGenerator::new();
        let mut rng = rng();
        let unknown_weapon = FrameAnalysis {
            action: Some(DetectedAction::default()),
            scene: Some(SceneInfo {
                weapon: "未知".into(),
                stage: String::new(),
            }),
        };

        for (secs, stage) in [
            (10, MatchStage::Opening),
            (100, MatchStage::Middle),
            (200, MatchStage::Critical),
            (400, MatchStage::Closing),
        ] {
            let line = g.contextual(&unknown_weapon, secs, &mut rng);
            assert!(g.stage_lines.candidates(&stage).contains(&line), "{line}");
        }
    }

    #[test]
    fn frame_analysis_parses_partial_json() {
        let frame: FrameAnalysis =
            serde_json::from_value(serde_json::json!({"action": {"action": "格挡"}})).unwrap();
        assert_eq!(frame.action.unwrap().analysis, "");
        assert!(frame.scene.is_none());
    }

    #[test]
    fn categorize_user_danmaku() {
        let g = DanmakuGenerator::new();
        assert_eq!(g.categorize("这次进攻太快了"), DanmakuStyle::Attack);
        assert_eq!(g.categorize("格挡漂亮"), DanmakuStyle::Defense);
        assert_eq!(g.categorize("节奏控制"), DanmakuStyle::Tactics);
        assert_eq!(g.categorize("基本功扎实"), DanmakuStyle::Technique);
        assert_eq!(g.categorize("太棒了"), DanmakuStyle::Highlight);
        assert_eq!(g.categorize("666"), DanmakuStyle::General);
    }

    #[test]
    fn style_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&DanmakuStyle::Encouragement).unwrap(),
            "\"鼓励\""
        );
        assert_eq!(
            serde_json::to_string(&MatchContext::Leading).unwrap(),
            "\"比分领先\""
        );
    }

    #[test]
    fn board_is_bounded() {
        let mut board = DanmakuBoard::new(100);
        for i in 0..105 {
            board
                .add_user(&format!("弹幕{i}"), "u1", DanmakuStyle::General)
                .unwrap();
        }
        assert_eq!(board.stats().total, 100);
        let recent = board.recent(50);
        assert_eq!(recent.len(), 50);
        assert_eq!(recent.last().unwrap().text, "弹幕104");
        assert_eq!(board.recent(1000).first().unwrap().text, "弹幕5");
    }

    #[test]
    fn board_rejects_blank_and_defaults_user() {
        let mut board = DanmakuBoard::default();
        assert!(board.add_user("  ", "u1", DanmakuStyle::General).is_err());

        let d = board.add_user("加油", "", DanmakuStyle::Encouragement).unwrap();
        assert_eq!(d.user_id, "anonymous");
        assert!(d.id.starts_with("user_"));
        assert_eq!(d.kind, DanmakuKind::User);
    }

    #[test]
    fn board_stats_and_queries() {
        let g = DanmakuGenerator::new();
        let mut board = DanmakuBoard::default();
        board.add_user("进攻犀利", "u1", g.categorize("进攻犀利")).unwrap();
        board.add_user("防守好", "u2", g.categorize("防守好")).unwrap();
        let ai = board.add_ai(&g.generate_ai("", "", &mut rng()), "奥运会决赛");
        assert!(ai.id.starts_with("ai_"));
        assert_eq!(ai.context.as_deref(), Some("奥运会决赛"));

        let stats = board.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.user, 2);
        assert_eq!(stats.ai, 1);
        assert_eq!(stats.categories.values().sum::<usize>(), 3);

        assert_eq!(board.by_category(DanmakuStyle::Attack, 10).len(), 1);
        assert_eq!(board.search("防守", 10).len(), 1);
        assert_eq!(board.clear(), 3);
        assert_eq!(board.stats().total, 0);
    }

    #[test]
    fn danmaku_serializes_kind_as_type() {
        let mut board = DanmakuBoard::default();
        let d = board.add_user("好", "u1", DanmakuStyle::General).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "user");
        assert_eq!(json["category"], "一般");
        assert!(json.get("context").is_none());
    }
}
