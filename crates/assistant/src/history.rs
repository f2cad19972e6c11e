//! Bounded in-memory conversation log.

use chrono::{DateTime, Utc};
use piste_core::ConversationTurn;
use std::collections::VecDeque;

/// FIFO of conversation turns. Never holds more than `cap` turns; the oldest
/// are evicted first.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: VecDeque<ConversationTurn>,
    cap: usize,
}

impl ConversationLog {
    /// A log holding at most `cap` turns (at least one).
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            turns: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append a turn, returning how many old turns were evicted.
    pub fn push(&mut self, turn: ConversationTurn) -> usize {
        self.turns.push_back(turn);
        let mut evicted = 0;
        while self.turns.len() > self.cap {
            self.turns.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ConversationTurn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Remove every turn, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.turns.len();
        self.turns.clear();
        removed
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.turns.back().map(|t| t.timestamp)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn::user(format!("消息{i}")).unwrap()
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut log = ConversationLog::new(50);
        let mut evicted = 0;
        for i in 0..57 {
            evicted += log.push(turn(i));
        }
        assert_eq!(log.len(), 50);
        assert_eq!(evicted, 7);
        let turns = log.turns();
        assert_eq!(turns.first().unwrap().text, "消息7");
        assert_eq!(turns.last().unwrap().text, "消息56");
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut log = ConversationLog::new(10);
        for i in 0..6 {
            log.push(turn(i));
        }
        let texts: Vec<_> = log.recent(3).into_iter().map(|t| t.text).collect();
        assert_eq!(texts, ["消息3", "消息4", "消息5"]);
        assert_eq!(log.recent(100).len(), 6);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn zero_cap_is_clamped() {
        let mut log = ConversationLog::new(0);
        log.push(turn(1));
        log.push(turn(2));
        assert_eq!(log.len(), 1);
        assert_eq!(log.turns()[0].text, "消息2");
    }

    #[test]
    fn clear_and_last_activity() {
        let mut log = ConversationLog::default();
        assert!(log.last_activity().is_none());
        log.push(turn(1));
        let last = log.turns()[0].timestamp;
        assert_eq!(log.last_activity(), Some(last));
        assert_eq!(log.clear(), 1);
        assert!(log.is_empty());
    }
}
