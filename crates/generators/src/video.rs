//! YouTube link parsing and position-based video analysis.
//!
//! Nothing here fetches the video page. Ids are pulled out of the URL and the
//! analysis is derived from the playback position and URL keywords.

use crate::stage::MatchStage;
use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
        r"youtube\.com/v/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/watch\?.*v=([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Pull the video id out of a YouTube link.
///
/// Watch, short (`youtu.be`), embed and `/v/` links are recognised. Ids that
/// do not have the usual eleven characters are still accepted from a plain
/// `youtu.be/<id>` path or a `watch?v=<id>` query.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    for pattern in VIDEO_ID_PATTERNS.iter() {
        if let Some(id) = pattern.captures(url).and_then(|c| c.get(1)) {
            return Some(id.as_str().to_string());
        }
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let (host, path_and_query) = rest.split_once('/').unwrap_or((rest, ""));
    let (path, query) = path_and_query.split_once('?').unwrap_or((path_and_query, ""));

    let id = match host {
        "youtu.be" => Some(path),
        "youtube.com" | "www.youtube.com" if path == "watch" => query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v=")),
        _ => None,
    };
    id.filter(|id| !id.is_empty()).map(str::to_string)
}

/// Player parameters appended to every embed link.
const EMBED_PARAMS: &str = "rel=0&modestbranding=1&controls=1&fs=1&playsinline=1";

/// Embed link for the player, optionally starting `start_secs` in.
pub fn embed_url(id: &str, start_secs: u64) -> String {
    if start_secs > 0 {
        format!("https://www.youtube.com/embed/{id}?start={start_secs}&{EMBED_PARAMS}")
    } else {
        format!("https://www.youtube.com/embed/{id}?{EMBED_PARAMS}")
    }
}

/// Short `youtu.be` link, with a `t=` offset when `start_secs` is non-zero.
pub fn share_url(id: &str, start_secs: u64) -> String {
    if start_secs > 0 {
        format!("https://youtu.be/{id}?t={start_secs}")
    } else {
        format!("https://youtu.be/{id}")
    }
}

/// The `list=` parameter of a youtube.com link.
pub fn extract_playlist_id(url: &str) -> Option<String> {
    let url = url.trim();
    if !url.contains("youtube.com/") {
        return None;
    }
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("list="))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Thumbnail links at every size YouTube serves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnails {
    pub default: String,
    pub medium: String,
    pub high: String,
    pub standard: String,
    pub maxres: String,
}

impl Thumbnails {
    pub fn for_video(id: &str) -> Self {
        let at = |name: &str| format!("https://img.youtube.com/vi/{id}/{name}.jpg");
        Self {
            default: at("default"),
            medium: at("mqdefault"),
            high: at("hqdefault"),
            standard: at("sddefault"),
            maxres: at("maxresdefault"),
        }
    }
}

/// Basic info for a parsed link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub id: String,
    pub url: String,
    pub embed_url: String,
    pub share_url: String,
    pub thumbnail: String,
    pub thumbnails: Thumbnails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    pub title: String,
    pub duration: String,
    pub channel: String,
}

impl VideoInfo {
    pub fn basic(id: &str, original_url: &str) -> Self {
        let thumbnails = Thumbnails::for_video(id);
        Self {
            id: id.to_string(),
            url: original_url.trim().to_string(),
            embed_url: embed_url(id, 0),
            share_url: share_url(id, 0),
            thumbnail: thumbnails.maxres.clone(),
            thumbnails,
            playlist_id: extract_playlist_id(original_url),
            title: format!("YouTube视频 ({id})"),
            duration: "未知".into(),
            channel: "未知频道".into(),
        }
    }
}

/// Parse a YouTube link into basic video info.
pub fn parse_youtube(url: &str) -> Option<VideoInfo> {
    let id = extract_video_id(url)?;
    Some(VideoInfo::basic(&id, url))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeNote {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
}

/// What the URL and the playback position say about the video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoScene {
    pub competition_type: &'static str,
    pub weapon: &'static str,
    pub stage: &'static str,
    pub related_knowledge: Vec<KnowledgeNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentKnowledge {
    pub title: &'static str,
    pub content: &'static str,
    pub tips: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMoment {
    pub time: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
    pub knowledge: MomentKnowledge,
}

/// Position-based analysis of the video being watched.
#[derive(Debug, Clone, Default)]
pub struct VideoAnalyzer;

impl VideoAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// One-paragraph reading of the bout at `current_time` seconds.
    pub fn analyze_position(&self, current_time: u64) -> String {
        let stage = MatchStage::from_secs(current_time);
        format!(
            "根据视频内容分析，当前处于{}。建议关注运动员的技术运用和战术变化。",
            stage.description()
        )
    }

    pub fn detect_weapon(&self, video_url: &str) -> &'static str {
        let url = video_url.to_lowercase();
        if url.contains("foil") || url.contains("花剑") {
            "花剑"
        } else if url.contains("epee") || url.contains("重剑") {
            "重剑"
        } else if url.contains("sabre") || url.contains("佩剑") {
            "佩剑"
        } else {
            "未知"
        }
    }

    pub fn detect_competition_type(&self, video_url: &str) -> &'static str {
        let url = video_url.to_lowercase();
        if url.contains("olympic") || url.contains("奥运会") {
            "奥运会"
        } else if url.contains("world") || url.contains("世锦赛") {
            "世锦赛"
        } else if url.contains("training") || url.contains("训练") {
            "训练"
        } else {
            "比赛"
        }
    }

    pub fn scene(&self, video_url: &str, current_time: u64) -> VideoScene {
        let weapon = self.detect_weapon(video_url);
        let competition_type = self.detect_competition_type(video_url);

        let mut related_knowledge = Vec::new();
        if let Some(content) = weapon_knowledge(weapon) {
            related_knowledge.push(KnowledgeNote {
                kind: "剑种介绍".into(),
                title: format!("{weapon}的特点"),
                content: content.into(),
            });
        }
        related_knowledge.push(KnowledgeNote {
            kind: "比赛知识".into(),
            title: format!("{competition_type}规则"),
            content: format!("这是{competition_type}级别的击剑比赛，具有很高的竞技水平。"),
        });

        VideoScene {
            competition_type,
            weapon,
            stage: MatchStage::from_secs(current_time).label(),
            related_knowledge,
        }
    }

    /// Likely key moments of a video lasting `duration` seconds.
    pub fn key_moments(&self, duration: u64) -> Vec<KeyMoment> {
        let candidates = [
            (0, "开始", "比赛开始"),
            (duration / 4, "阶段", "比赛进行中"),
            (duration / 2, "关键", "关键阶段"),
            (duration.saturating_mul(3) / 4, "关键", "关键时刻"),
        ];

        candidates
            .into_iter()
            .filter(|(time, _, _)| *time < duration)
            .map(|(time, kind, description)| KeyMoment {
                time,
                kind,
                description,
                knowledge: moment_knowledge(kind),
            })
            .collect()
    }
}

pub(crate) fn weapon_knowledge(weapon: &str) -> Option<&'static str> {
    match weapon {
        "花剑" => Some(
            "花剑有效部位是躯干，使用剑尖刺击。花剑比赛强调技术和战术，被称为'击剑中的芭蕾'。",
        ),
        "重剑" => Some("重剑全身都是有效部位，使用剑尖刺击。重剑比赛节奏相对较慢，更注重战术思考。"),
        "佩剑" => Some(
            "佩剑有效部位是上半身，使用剑尖刺击和剑刃劈砍。佩剑比赛节奏最快，最具观赏性。",
        ),
        _ => None,
    }
}

fn moment_knowledge(kind: &str) -> MomentKnowledge {
    match kind {
        "开始" => MomentKnowledge {
            title: "比赛开始阶段",
            content: "比赛开始时，运动员通常会进行试探，观察对手的技术特点和战术倾向。",
            tips: vec!["注意观察对手的站位", "保持警惕，准备应对突然进攻"],
        },
        "阶段" => MomentKnowledge {
            title: "比赛进行中",
            content: "比赛进行中，双方会展开激烈的对抗，运用各种技术和战术。",
            tips: vec!["注意距离控制", "观察对手的节奏变化"],
        },
        "关键" => MomentKnowledge {
            title: "关键时刻",
            content: "关键时刻需要运动员保持冷静，运用最擅长的技术，把握得分机会。",
            tips: vec!["保持心理稳定", "相信自己的技术", "把握时机"],
        },
        _ => MomentKnowledge {
            title: "击剑知识",
            content: "这是一个精彩的击剑比赛时刻。",
            tips: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_from_common_links() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id);
        assert_eq!(extract_video_id("https://youtube.com/v/dQw4w9WgXcQ"), id);
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ&t=42"),
            id
        );
        assert_eq!(extract_video_id("  https://youtu.be/dQw4w9WgXcQ?t=10  "), id);
    }

    #[test]
    fn short_ids_fall_back_to_url_parts() {
        assert_eq!(extract_video_id("https://youtu.be/abc123").as_deref(), Some("abc123"));
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?t=5&v=short").as_deref(),
            Some("short")
        );
    }

    #[test]
    fn rejects_other_links() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("https://vimeo.com/123456"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/feed/trending"), None);
        assert_eq!(extract_video_id("https://youtu.be/"), None);
    }

    #[test]
    fn basic_info() {
        let info = parse_youtube("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(
            info.embed_url,
            "https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0&modestbranding=1&controls=1&fs=1&playsinline=1"
        );
        assert_eq!(info.share_url, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(
            info.thumbnail,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(info.thumbnails.maxres, info.thumbnail);
        assert_eq!(
            info.thumbnails.medium,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg"
        );
        assert_eq!(info.playlist_id, None);
        assert_eq!(info.title, "YouTube视频 (dQw4w9WgXcQ)");
        assert_eq!(info.duration, "未知");
        assert_eq!(info.channel, "未知频道");
        assert!(parse_youtube("not a link").is_none());
    }

    #[test]
    fn embed_and_share_links_with_offset() {
        assert_eq!(
            embed_url("abc", 42),
            "https://www.youtube.com/embed/abc?start=42&rel=0&modestbranding=1&controls=1&fs=1&playsinline=1"
        );
        assert_eq!(share_url("abc", 42), "https://youtu.be/abc?t=42");
    }

    #[test]
    fn playlist_links() {
        let info = parse_youtube("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLfencing").unwrap();
        assert_eq!(info.playlist_id.as_deref(), Some("PLfencing"));
        assert_eq!(extract_playlist_id("https://youtu.be/dQw4w9WgXcQ?list=PL1"), None);
        assert_eq!(extract_playlist_id("https://www.youtube.com/watch?v=x&list="), None);
    }

    #[test]
    fn position_analysis_follows_stage() {
        let analyzer = VideoAnalyzer::new();
        assert_eq!(
            analyzer.analyze_position(10),
            "根据视频内容分析，当前处于比赛开始阶段，运动员正在热身和试探。建议关注运动员的技术运用和战术变化。"
        );
        assert!(analyzer.analyze_position(200).contains("比分胶着"));
        assert!(analyzer.analyze_position(1000).contains("接近尾声"));
    }

    #[test]
    fn scene_from_url_keywords() {
        let analyzer = VideoAnalyzer::new();
        let scene = analyzer.scene("https://youtube.com/watch?v=x&title=Olympic-Sabre-Final", 90);
        assert_eq!(scene.weapon, "佩剑");
        assert_eq!(scene.competition_type, "奥运会");
        assert_eq!(scene.stage, "中段");
        assert_eq!(scene.related_knowledge.len(), 2);
        assert_eq!(scene.related_knowledge[0].title, "佩剑的特点");

        let plain = analyzer.scene("", 0);
        assert_eq!(plain.weapon, "未知");
        assert_eq!(plain.competition_type, "比赛");
        assert_eq!(plain.related_knowledge.len(), 1);
    }

    #[test]
    fn key_moments_within_duration() {
        let analyzer = VideoAnalyzer::new();
        let moments = analyzer.key_moments(400);
        let times: Vec<_> = moments.iter().map(|m| m.time).collect();
        assert_eq!(times, [0, 100, 200, 300]);
        assert_eq!(moments[0].knowledge.title, "比赛开始阶段");
        assert_eq!(moments[3].knowledge.tips.len(), 3);

        // one-second clip: every moment lands on zero
        assert!(analyzer.key_moments(1).iter().all(|m| m.time == 0));
        assert!(analyzer.key_moments(0).is_empty());
    }
}
