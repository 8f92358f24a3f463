use crate::domain::handicap::RECENT_ROUNDS;
use crate::domain::model::{PlayerId, Round};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 哪些輪次可以進入 handicap 計算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRules {
    #[serde(default = "default_recent_rounds")]
    pub recent_rounds: usize,
    #[serde(default = "default_qualifying_statuses")]
    pub qualifying_statuses: Vec<String>,
    #[serde(default = "default_require_status")]
    pub require_status: bool,
}

fn default_recent_rounds() -> usize {
    RECENT_ROUNDS
}

fn default_qualifying_statuses() -> Vec<String> {
    vec!["OK".to_string()]
}

fn default_require_status() -> bool {
    true
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            recent_rounds: default_recent_rounds(),
            qualifying_statuses: default_qualifying_statuses(),
            require_status: default_require_status(),
        }
    }
}

impl SelectionRules {
    /// 狀態比對忽略大小寫與前後空白
    pub fn is_qualifying(&self, round: &Round) -> bool {
        if round.differential.is_none() {
            return false;
        }
        if !self.require_status {
            return true;
        }
        match round.status.as_deref().map(str::trim) {
            Some(status) => self
                .qualifying_statuses
                .iter()
                .any(|allowed| allowed.trim().eq_ignore_ascii_case(status)),
            None => false,
        }
    }

    /// 取出某位球員最近的合格輪次，依日期由新到舊
    pub fn select_for_player<'a>(&self, rounds: &'a [Round], player: &PlayerId) -> Vec<&'a Round> {
        let mut selected: Vec<&Round> = rounds
            .iter()
            .filter(|round| &round.player_id == player && self.is_qualifying(round))
            .collect();

        selected.sort_by(|a, b| b.play_date.cmp(&a.play_date));
        selected.truncate(self.recent_rounds);
        selected
    }
}

/// 依球員分組，保留原始順序
pub fn group_by_player(rounds: Vec<Round>) -> BTreeMap<PlayerId, Vec<Round>> {
    let mut groups: BTreeMap<PlayerId, Vec<Round>> = BTreeMap::new();
    for round in rounds {
        groups.entry(round.player_id.clone()).or_default().push(round);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Differential;
    use chrono::{Duration, NaiveDate};

    fn round(player: &str, day: i64, differential: Option<f64>, status: Option<&str>) -> Round {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Round::new(
            player,
            base + Duration::days(day),
            differential.map(Differential::from),
            status,
        )
    }

    #[test]
    fn test_filters_status_null_and_player() {
        let rounds = vec![
            round("1", 0, Some(10.0), Some("OK")),
            round("1", 1, Some(11.0), Some("pending")),
            round("1", 2, None, Some("OK")),
            round("1", 3, Some(12.0), None),
            round("2", 4, Some(5.0), Some("OK")),
            round("1", 5, Some(13.0), Some(" ok ")),
        ];

        let rules = SelectionRules::default();
        let selected = rules.select_for_player(&rounds, &PlayerId::new("1"));

        let days: Vec<NaiveDate> = selected.iter().map(|r| r.play_date).collect();
        assert_eq!(days, vec![rounds[5].play_date, rounds[0].play_date]);
    }

    #[test]
    fn test_keeps_most_recent_twenty() {
        let rounds: Vec<Round> = (0..25)
            .map(|day| round("7", day, Some(day as f64), Some("OK")))
            .collect();

        let selected = SelectionRules::default().select_for_player(&rounds, &PlayerId::new("7"));

        assert_eq!(selected.len(), 20);
        assert_eq!(selected[0].play_date, rounds[24].play_date);
        assert_eq!(selected[19].play_date, rounds[5].play_date);
    }

    #[test]
    fn test_status_not_required() {
        let rules = SelectionRules {
            require_status: false,
            ..SelectionRules::default()
        };

        assert!(rules.is_qualifying(&round("1", 0, Some(1.0), None)));
        assert!(!rules.is_qualifying(&round("1", 0, None, Some("OK"))));
    }

    #[test]
    fn test_group_by_player() {
        let rounds = vec![
            round("b", 0, Some(1.0), Some("OK")),
            round("a", 1, Some(2.0), Some("OK")),
            round("b", 2, Some(3.0), Some("OK")),
        ];

        let groups = group_by_player(rounds);
        let keys: Vec<&str> = groups.keys().map(PlayerId::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(groups[&PlayerId::new("b")].len(), 2);
    }
}
