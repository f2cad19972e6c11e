//! Built-in fencing knowledge.
//!
//! A read-only store of facts keyed by category then topic, plus the pool of
//! training tips. Built once at startup and shared by reference.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Top-level grouping of knowledge entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KnowledgeCategory {
    WeaponType,
    Rule,
    Technique,
    History,
    Competition,
    Training,
    Role,
}

/// Either a prose answer or a list of short facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBody {
    Text(String),
    Facts(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeEntry {
    pub topic: String,
    pub category: KnowledgeCategory,
    pub body: KnowledgeBody,
}

impl KnowledgeEntry {
    /// The entry as one readable sentence or paragraph.
    pub fn render(&self) -> String {
        match &self.body {
            KnowledgeBody::Text(text) => text.clone(),
            KnowledgeBody::Facts(facts) => format!("{}包括：{}。", self.topic, facts.join("、")),
        }
    }
}

/// Category → topic → entry, plus training tips.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    entries: HashMap<KnowledgeCategory, BTreeMap<String, KnowledgeEntry>>,
    tips: Vec<String>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prose entry, replacing any entry with the same key.
    pub fn insert_text(&mut self, category: KnowledgeCategory, topic: &str, text: &str) {
        self.insert(category, topic, KnowledgeBody::Text(text.into()));
    }

    /// Add a fact-list entry, replacing any entry with the same key.
    pub fn insert_facts(&mut self, category: KnowledgeCategory, topic: &str, facts: &[&str]) {
        let facts = facts.iter().map(|f| f.to_string()).collect();
        self.insert(category, topic, KnowledgeBody::Facts(facts));
    }

    fn insert(&mut self, category: KnowledgeCategory, topic: &str, body: KnowledgeBody) {
        self.entries.entry(category).or_default().insert(
            topic.to_string(),
            KnowledgeEntry {
                topic: topic.to_string(),
                category,
                body,
            },
        );
    }

    pub fn add_tip(&mut self, tip: &str) {
        self.tips.push(tip.to_string());
    }

    pub fn get(&self, category: KnowledgeCategory, topic: &str) -> Option<&KnowledgeEntry> {
        self.entries.get(&category)?.get(topic)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tips(&self) -> &[String] {
        &self.tips
    }

    /// Up to `count` distinct tips in random order.
    pub fn sample_tips<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<String> {
        self.tips.choose_multiple(rng, count).cloned().collect()
    }

    /// The knowledge the assistant ships with.
    pub fn builtin() -> Self {
        use KnowledgeCategory::*;

        let mut store = Self::new();

        // Weapons and terminology
        store.insert_text(
            WeaponType,
            "花剑",
            "花剑是击剑三个剑种之一，有效部位是躯干，使用剑尖刺击。花剑比赛强调技术和战术，被称为'击剑中的芭蕾'。",
        );
        store.insert_text(
            WeaponType,
            "重剑",
            "重剑是击剑三个剑种之一，全身都是有效部位，使用剑尖刺击。重剑比赛节奏相对较慢，更注重战术思考。",
        );
        store.insert_text(
            WeaponType,
            "佩剑",
            "佩剑是击剑三个剑种之一，有效部位是上半身，使用剑尖刺击和剑刃劈砍。佩剑比赛节奏最快，最具观赏性。",
        );
        store.insert_text(
            WeaponType,
            "剑种区别",
            "三个剑种的主要区别在于有效部位和得分方式：花剑只有躯干有效，只能刺击，重量500克以下；重剑全身有效，只能刺击，重量770克以下，没有优先权；佩剑上半身有效，可以刺击和劈砍，重量500克以下。",
        );
        store.insert_text(
            WeaponType,
            "术语",
            "击剑有很多专业术语，比如进攻、防守、格挡、闪避等。这些术语反映了击剑运动的技术特点和战术要求。",
        );

        // Rules
        store.insert_text(
            Rule,
            "基本规则",
            "击剑比赛的基本规则是：采用单败淘汰制，每局3分钟，先得15分者获胜。比赛过程中必须遵守击剑礼仪和规则。",
        );
        store.insert_text(
            Rule,
            "得分规则",
            "击剑比赛的得分规则是：击中有效部位得1分，同时击中则双方各得1分。先得15分者获胜，如果时间到比分相同则加时赛。",
        );
        store.insert_text(
            Rule,
            "场地规则",
            "击剑比赛场地长14米，宽1.5-2米，中央有中线。场地表面必须平整，不能有障碍物。",
        );
        store.insert_text(
            Rule,
            "装备要求",
            "击剑运动员必须穿戴完整的防护装备，包括击剑服、面罩、手套、护胸等。装备必须符合国际击剑联合会(FIE)的安全标准。",
        );
        store.insert_text(
            Rule,
            "裁判规则",
            "击剑比赛由主裁判和边裁判共同执裁。主裁判负责判定得分，边裁判协助观察。比赛过程中运动员必须服从裁判的判罚。",
        );
        store.insert_text(
            Rule,
            "优先权",
            "优先权（主动权）规则适用于花剑和佩剑：双方同时亮灯时，由裁判判定谁先建立了进攻，拥有优先权的一方得分。格挡成功后的还击会夺得优先权。重剑没有优先权，同时击中双方各得1分。",
        );
        store.insert_text(
            Rule,
            "犯规",
            "常见犯规包括：越出场地边线、用非持剑手遮挡有效部位、身体冲撞对手、故意背对对手等。犯规会被出示黄牌、红牌或黑牌，红牌判给对手1分。",
        );

        // Technique
        store.insert_text(
            Technique,
            "技术概述",
            "击剑技术分为基本动作、进攻技术、防守技术和战术运用。基本功很重要，要在训练中不断磨练各种技术。",
        );
        store.insert_text(
            Technique,
            "进攻技术",
            "击剑的进攻技术包括直刺、转移刺、击打刺、复合进攻等。进攻时要把握时机，利用假动作迷惑对手，寻找破绽。",
        );
        store.insert_text(
            Technique,
            "防守技术",
            "防守技术包括格挡、闪避、后退、反击等。好的防守不仅要化解对手进攻，还要为反击创造机会。",
        );
        store.insert_text(
            Technique,
            "战术运用",
            "击剑战术包括距离控制、时机把握、节奏变化、假动作运用等。要根据对手特点制定相应战术，灵活调整。",
        );
        store.insert_facts(
            Technique,
            "基本动作",
            &["立正", "敬礼", "实战姿势", "前进", "后退", "冲刺"],
        );

        // History
        store.insert_text(
            History,
            "概述",
            "击剑有着悠久的历史，从贵族决斗武器发展为现代体育运动。现代击剑强调技术、战术和心理素质的综合运用。",
        );
        store.insert_text(
            History,
            "起源",
            "击剑起源于欧洲中世纪，最初是贵族决斗的武器。随着时代发展，逐渐演变为体育运动和奥运会项目。",
        );
        store.insert_text(
            History,
            "中国",
            "中国击剑起步较晚，但在1984年洛杉矶奥运会上，栾菊杰获得女子花剑金牌，这是中国击剑的首枚奥运金牌。",
        );
        store.insert_text(
            History,
            "奥运会",
            "击剑从1896年第一届现代奥运会就是正式比赛项目。现在包括个人和团体赛，共设10枚金牌。",
        );

        // Competition
        store.insert_text(
            Competition,
            "比赛概述",
            "这场比赛展现了击剑运动的魅力。运动员的技术、战术和心理素质都达到了很高水平，是一场精彩的比赛。",
        );
        store.insert_text(
            Competition,
            "精彩表现",
            "从技术角度看，这个动作展现了运动员扎实的基本功和临场应变能力。进攻时机把握得很好，防守也很到位。",
        );
        store.insert_text(
            Competition,
            "战术分析",
            "这场比赛体现了高水平的战术运用。运动员能够根据对手特点调整策略，在关键时刻做出正确判断。",
        );
        store.insert_text(
            Competition,
            "心理博弈",
            "击剑不仅是技术的较量，更是心理的博弈。运动员需要在压力下保持冷静，在关键时刻发挥出最佳水平。",
        );
        store.insert_text(
            Competition,
            "世锦赛",
            "世界击剑锦标赛每年举办一次，是最高水平的国际比赛。",
        );
        store.insert_text(
            Competition,
            "世界杯",
            "击剑世界杯系列赛全年举办，积分决定年终排名。",
        );

        // Training
        store.insert_text(
            Training,
            "训练方法",
            "提高击剑水平需要系统训练：每天练习实战姿势和步法，定期进行体能训练，再通过对练和实战积累比赛经验。训练后复盘录像，找出技术上的不足。",
        );
        store.insert_text(
            Training,
            "入门",
            "初学者建议从基本功开始：先学习立正、敬礼和实战姿势，再练习前进、后退等步法，最后在教练指导下学习直刺和格挡。入门阶段通常使用花剑。",
        );
        store.insert_text(
            Training,
            "步法",
            "步法是击剑的基础，包括前进、后退、弓步和冲刺。练习时保持重心稳定，两脚间距与肩同宽，移动时上身保持放松。",
        );
        store.insert_text(
            Training,
            "体能",
            "击剑对爆发力、速度和耐力都有要求。体能训练可以包括短距离冲刺、跳绳、核心力量练习和腿部力量训练。",
        );

        // Roles on and around the piste
        store.insert_text(
            Role,
            "场上角色",
            "一场击剑比赛中有运动员、主裁判、边裁判和教练等角色。主裁判负责判定得分，边裁判协助观察，教练在局间指导运动员调整技术和战术。",
        );
        store.insert_text(
            Role,
            "教练",
            "教练的作用是制定训练计划、纠正技术动作，并在比赛局间休息时帮助运动员分析对手、调整战术和稳定心态。",
        );
        store.insert_text(
            Role,
            "裁判员",
            "裁判员负责执行比赛规则：判定击中是否有效、在花剑和佩剑中判定优先权、处罚犯规行为。运动员对判罚有异议时可以申请视频回放。",
        );

        for tip in [
            "保持正确的实战姿势，重心要稳",
            "进攻时要把握时机，不要盲目出击",
            "防守要主动，为反击创造机会",
            "注意距离控制，保持合适的攻击距离",
            "运用假动作迷惑对手，寻找破绽",
            "保持冷静，在压力下发挥最佳水平",
        ] {
            store.add_tip(tip);
        }

        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn builtin_has_every_category() {
        let store = KnowledgeStore::builtin();
        for category in [
            KnowledgeCategory::WeaponType,
            KnowledgeCategory::Rule,
            KnowledgeCategory::Technique,
            KnowledgeCategory::History,
            KnowledgeCategory::Competition,
            KnowledgeCategory::Training,
            KnowledgeCategory::Role,
        ] {
            let count = store.entries.get(&category).map_or(0, BTreeMap::len);
            assert!(count > 0, "{category:?} is empty");
        }
        assert_eq!(store.tips().len(), 6);
    }

    #[test]
    fn lookup_hit_and_miss() {
        let store = KnowledgeStore::builtin();
        let scoring = store.get(KnowledgeCategory::Rule, "得分规则").unwrap();
        assert!(scoring.render().contains("得1分"));
        assert!(store.get(KnowledgeCategory::Rule, "不存在").is_none());
        assert!(store.get(KnowledgeCategory::History, "得分规则").is_none());
    }

    #[test]
    fn facts_render_as_list() {
        let store = KnowledgeStore::builtin();
        let basics = store.get(KnowledgeCategory::Technique, "基本动作").unwrap();
        assert_eq!(
            basics.render(),
            "基本动作包括：立正、敬礼、实战姿势、前进、后退、冲刺。"
        );
    }

    #[test]
    fn sampled_tips_are_distinct() {
        let store = KnowledgeStore::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        let tips = store.sample_tips(3, &mut rng);
        assert_eq!(tips.len(), 3);
        let unique: std::collections::HashSet<_> = tips.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(tips.iter().all(|t| store.tips().contains(t)));
    }

    #[test]
    fn sampling_more_than_available_returns_all() {
        let store = KnowledgeStore::builtin();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(store.sample_tips(20, &mut rng).len(), 6);
    }

    #[test]
    fn empty_store() {
        let store = KnowledgeStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.get(KnowledgeCategory::Rule, "得分规则").is_none());
    }
}
