//! Mock competition feed: recent results and world rankings.
//!
//! There is no live data source. Results and rankings are sampled from fixed
//! name and tournament pools so the front end has something realistic to show.

use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

pub const WEAPONS: [&str; 3] = ["花剑", "重剑", "佩剑"];
pub const CATEGORIES: [&str; 4] = ["男子个人", "女子个人", "男子团体", "女子团体"];

const TOURNAMENTS: [&str; 7] = [
    "2024年巴黎奥运会",
    "2024年世界击剑锦标赛",
    "2024年欧洲击剑锦标赛",
    "2024年亚洲击剑锦标赛",
    "2024年世界杯系列赛",
    "2024年大奖赛",
    "2024年洲际杯赛",
];
const COUNTRIES: [&str; 7] = ["中国", "法国", "意大利", "俄罗斯", "美国", "韩国", "日本"];
const SURNAMES: [&str; 10] = ["张", "李", "王", "刘", "陈", "杨", "赵", "黄", "周", "吴"];
const GIVEN_NAMES: [&str; 10] = ["伟", "芳", "娜", "敏", "静", "丽", "强", "磊", "军", "洋"];

/// Results are drawn from the last this many days.
const RESULT_WINDOW_DAYS: u64 = 90;
const RANKED_PER_GROUP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionResult {
    pub id: String,
    pub tournament: String,
    pub weapon: String,
    pub category: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub winner: String,
    pub runner_up: String,
    pub third: String,
    pub country: String,
    pub score: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub rank: usize,
    pub athlete: String,
    pub country: String,
    pub weapon: String,
    pub category: String,
    pub points: u32,
    pub tournaments: u32,
}

/// Mock results and rankings.
#[derive(Debug, Clone, Default)]
pub struct CompetitionFeed;

impl CompetitionFeed {
    pub fn new() -> Self {
        Self
    }

    /// `limit` results from the last 90 days, newest first.
    pub fn recent_results<R: Rng + ?Sized>(&self, limit: usize, rng: &mut R) -> Vec<CompetitionResult> {
        self.recent_results_on(Utc::now().date_naive(), limit, rng)
    }

    /// Like [`recent_results`](Self::recent_results), relative to `today`.
    pub fn recent_results_on<R: Rng + ?Sized>(
        &self,
        today: NaiveDate,
        limit: usize,
        rng: &mut R,
    ) -> Vec<CompetitionResult> {
        let mut results: Vec<_> = (0..limit)
            .map(|i| {
                let days_ago = rng.random_range(0..=RESULT_WINDOW_DAYS);
                let date = today.checked_sub_days(Days::new(days_ago)).unwrap_or(today);
                CompetitionResult {
                    id: format!("result_{}", i + 1),
                    tournament: pick(&TOURNAMENTS, rng),
                    weapon: pick(&WEAPONS, rng),
                    category: pick(&CATEGORIES, rng),
                    date: date.format("%Y-%m-%d").to_string(),
                    winner: athlete_name(rng),
                    runner_up: athlete_name(rng),
                    third: athlete_name(rng),
                    country: pick(&COUNTRIES, rng),
                    score: format!(
                        "{}-{}",
                        rng.random_range(10..=15),
                        rng.random_range(5..=14)
                    ),
                    status: "已完成".into(),
                }
            })
            .collect();

        // ISO dates sort lexicographically; stable sort keeps id order per day
        results.sort_by(|a, b| b.date.cmp(&a.date));
        results
    }

    /// Top ten per weapon and category. `"all"` (or blank) selects every value.
    pub fn rankings<R: Rng + ?Sized>(
        &self,
        weapon: &str,
        category: &str,
        rng: &mut R,
    ) -> Vec<RankingEntry> {
        let weapons = selection(weapon, &WEAPONS);
        let categories = selection(category, &CATEGORIES);

        let mut rankings = Vec::with_capacity(weapons.len() * categories.len() * RANKED_PER_GROUP);
        for w in &weapons {
            for c in &categories {
                for _ in 0..RANKED_PER_GROUP {
                    rankings.push(RankingEntry {
                        rank: rankings.len() + 1,
                        athlete: athlete_name(rng),
                        country: pick(&COUNTRIES, rng),
                        weapon: w.clone(),
                        category: c.clone(),
                        points: rng.random_range(100..=1000),
                        tournaments: rng.random_range(5..=20),
                    });
                }
            }
        }

        tracing::debug!(weapon, category, count = rankings.len(), "Generated rankings");
        rankings
    }
}

fn selection(filter: &str, all: &[&str]) -> Vec<String> {
    match filter.trim() {
        "" | "all" => all.iter().map(|s| s.to_string()).collect(),
        one => vec![one.to_string()],
    }
}

fn pick<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> String {
    pool.choose(rng).copied().unwrap_or_default().to_string()
}

fn athlete_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{}", pick(&SURNAMES, rng), pick(&GIVEN_NAMES, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    #[test]
    fn results_are_recent_and_sorted() {
        let results = CompetitionFeed::new().recent_results_on(today(), 25, &mut StdRng::seed_from_u64(5));
        assert_eq!(results.len(), 25);

        let earliest = today() - Days::new(90);
        for r in &results {
            let date = NaiveDate::parse_from_str(&r.date, "%Y-%m-%d").unwrap();
            assert!(date <= today() && date >= earliest, "{}", r.date);
            assert_eq!(r.status, "已完成");
            assert_eq!(r.winner.chars().count(), 2);
            assert!(TOURNAMENTS.contains(&r.tournament.as_str()));
        }
        assert!(results.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn scores_stay_in_range() {
        let results = CompetitionFeed::new().recent_results_on(today(), 50, &mut StdRng::seed_from_u64(8));
        for r in results {
            let (a, b) = r.score.split_once('-').unwrap();
            let (a, b): (u32, u32) = (a.parse().unwrap(), b.parse().unwrap());
            assert!((10..=15).contains(&a));
            assert!((5..=14).contains(&b));
        }
    }

    #[test]
    fn zero_limit_is_empty() {
        let results = CompetitionFeed::new().recent_results(0, &mut StdRng::seed_from_u64(1));
        assert!(results.is_empty());
    }

    #[test]
    fn all_rankings_cover_every_group() {
        let rankings = CompetitionFeed::new().rankings("all", "all", &mut StdRng::seed_from_u64(2));
        assert_eq!(rankings.len(), 3 * 4 * 10);
        assert!(rankings.iter().enumerate().all(|(i, r)| r.rank == i + 1));
        assert!(rankings.iter().all(|r| (100..=1000).contains(&r.points)));
        assert!(rankings.iter().all(|r| (5..=20).contains(&r.tournaments)));
    }

    #[test]
    fn filtered_rankings() {
        let rankings = CompetitionFeed::new().rankings("佩剑", "女子个人", &mut StdRng::seed_from_u64(2));
        assert_eq!(rankings.len(), 10);
        assert!(rankings.iter().all(|r| r.weapon == "佩剑" && r.category == "女子个人"));

        let by_weapon = CompetitionFeed::new().rankings("重剑", "", &mut StdRng::seed_from_u64(2));
        assert_eq!(by_weapon.len(), 40);
    }
}
