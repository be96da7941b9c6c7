pub mod client;
pub mod fixtures;
pub mod standings;
pub mod stats;
pub mod supabase;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of the database row format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct League {
    pub id: String,
    pub name: String,
    pub season: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
}

impl Team {
    pub fn display_name(&self) -> &str {
        self.short_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Completed,
    Postponed,
    Cancelled,
}

impl MatchStatus {
    pub fn short_label(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCH",
            MatchStatus::Live => "LIVE",
            MatchStatus::Completed => "FNL",
            MatchStatus::Postponed => "PPD",
            MatchStatus::Cancelled => "CXL",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Match {
    pub id: String,
    pub league_id: String,
    /// `None` while the side is still to be decided (knockout draws).
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: MatchStatus,
    pub venue: Option<String>,
    pub notes: Option<String>,
}

impl Match {
    /// (home, away) only when both sides have a score recorded.
    pub fn score(&self) -> Option<(u16, u16)> {
        self.home_score.zip(self.away_score)
    }

    pub fn involves(&self, team_id: &str) -> bool {
        self.home_team_id.as_deref() == Some(team_id) || self.away_team_id.as_deref() == Some(team_id)
    }

    /// Both sides known and distinct, so the result can count in a table.
    pub fn has_two_teams(&self) -> bool {
        match (self.home_team_id.as_deref(), self.away_team_id.as_deref()) {
            (Some(home), Some(away)) => home != away,
            _ => false,
        }
    }
}

/// Competition phase, inferred from free-text match notes. Ordered from
/// earliest to latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    GroupStage,
    RoundOf16,
    QuarterFinals,
    SemiFinals,
    ThirdPlace,
    Final,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::GroupStage,
        Stage::RoundOf16,
        Stage::QuarterFinals,
        Stage::SemiFinals,
        Stage::ThirdPlace,
        Stage::Final,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::GroupStage => "Group Stage",
            Stage::RoundOf16 => "Round of 16",
            Stage::QuarterFinals => "Quarter Finals",
            Stage::SemiFinals => "Semi Finals",
            Stage::ThirdPlace => "Third Place",
            Stage::Final => "Final",
        }
    }

    pub fn prev(self) -> Option<Self> {
        match self {
            Stage::GroupStage => None,
            Stage::RoundOf16 => Some(Stage::GroupStage),
            Stage::QuarterFinals => Some(Stage::RoundOf16),
            Stage::SemiFinals => Some(Stage::QuarterFinals),
            Stage::ThirdPlace => Some(Stage::SemiFinals),
            Stage::Final => Some(Stage::ThirdPlace),
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Stage::GroupStage => Some(Stage::RoundOf16),
            Stage::RoundOf16 => Some(Stage::QuarterFinals),
            Stage::QuarterFinals => Some(Stage::SemiFinals),
            Stage::SemiFinals => Some(Stage::ThirdPlace),
            Stage::ThirdPlace => Some(Stage::Final),
            Stage::Final => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    pub fn letter(&self) -> char {
        match self {
            Outcome::Win => 'W',
            Outcome::Loss => 'L',
            Outcome::Draw => 'D',
        }
    }
}

/// Last five results, oldest first, always five characters wide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form(pub String);

impl Form {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandingRow {
    pub rank: u32,
    pub team_id: String,
    pub team_name: String,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points_for: u32,
    pub points_against: u32,
    pub points: u32,
    pub form: Form,
}

impl StandingRow {
    pub fn point_differential(&self) -> i64 {
        i64::from(self.points_for) - i64::from(self.points_against)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageTable {
    pub stage: Stage,
    pub rows: Vec<StandingRow>,
}

/// League points awarded per result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsSystem {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for PointsSystem {
    fn default() -> Self {
        Self { win: 2, draw: 1, loss: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub round: u32,
    pub home_team_id: String,
    pub away_team_id: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rounds: u32,
    pub double_round_robin: bool,
    pub fixtures: Vec<Fixture>,
}

impl Schedule {
    pub fn round(&self, round: u32) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(move |f| f.round == round)
    }
}

/// One player's box score line for one match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatLine {
    pub player_id: String,
    pub player_name: String,
    pub team_id: Option<String>,
    pub match_id: Option<String>,
    pub points: u16,
    pub rebounds: u16,
    pub assists: u16,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerLeader {
    pub player_id: String,
    pub player_name: String,
    pub team_id: Option<String>,
    pub games: u32,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
}

impl PlayerLeader {
    fn per_game(&self, total: u32) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(total) / f64::from(self.games)
        }
    }

    pub fn points_per_game(&self) -> f64 {
        self.per_game(self.points)
    }

    pub fn rebounds_per_game(&self) -> f64 {
        self.per_game(self.rebounds)
    }

    pub fn assists_per_game(&self) -> f64 {
        self.per_game(self.assists)
    }
}

/// Everything the portal shows for one league, loaded in one go.
#[derive(Debug, Clone, Default)]
pub struct LeagueSnapshot {
    pub league: League,
    pub teams: Vec<Team>,
    pub matches: Vec<Match>,
    pub player_stats: Vec<PlayerStatLine>,
}

impl LeagueSnapshot {
    pub fn team_name<'a>(&'a self, team_id: &'a str) -> &'a str {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .map(Team::display_name)
            .unwrap_or(team_id)
    }

    /// Display name for one side of a match; undecided sides read "TBD".
    pub fn side_name<'a>(&'a self, team_id: Option<&'a str>) -> &'a str {
        team_id.map_or("TBD", |id| self.team_name(id))
    }

    /// Swap in the league's full match list after a refresh, keeping teams
    /// and stats. Matches missing from the refresh are gone.
    pub fn replace_matches(&mut self, matches: Vec<Match>) {
        self.matches = matches;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_navigation() {
        assert_eq!(Stage::GroupStage.prev(), None);
        assert_eq!(Stage::GroupStage.next(), Some(Stage::RoundOf16));
        assert_eq!(Stage::Final.next(), None);
        assert!(Stage::SemiFinals < Stage::Final);
    }

    #[test]
    fn team_display_name_prefers_short_name() {
        let mut team = Team { id: "t1".into(), name: "Nairobi City Thunder".into(), short_name: Some("Thunder".into()) };
        assert_eq!(team.display_name(), "Thunder");
        team.short_name = Some("  ".into());
        assert_eq!(team.display_name(), "Nairobi City Thunder");
    }

    #[test]
    fn replace_matches_updates_and_drops_removed() {
        let mut snapshot = LeagueSnapshot {
            matches: vec![
                Match { id: "m1".into(), ..Default::default() },
                Match { id: "m2".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        snapshot.replace_matches(vec![
            Match { id: "m1".into(), home_score: Some(70), away_score: Some(60), ..Default::default() },
            Match { id: "m3".into(), ..Default::default() },
        ]);
        let ids: Vec<&str> = snapshot.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
        assert_eq!(snapshot.matches[0].score(), Some((70, 60)));
    }

    #[test]
    fn undecided_or_repeated_sides_are_not_two_teams() {
        let mut m = Match { home_team_id: Some("a".into()), away_team_id: Some("b".into()), ..Default::default() };
        assert!(m.has_two_teams());
        assert!(m.involves("b"));
        m.away_team_id = None;
        assert!(!m.has_two_teams());
        assert!(!m.involves("b"));
        m.away_team_id = Some("a".into());
        assert!(!m.has_two_teams());
    }

    #[test]
    fn undecided_side_reads_tbd() {
        let snapshot = LeagueSnapshot::default();
        assert_eq!(snapshot.side_name(None), "TBD");
        assert_eq!(snapshot.side_name(Some("t9")), "t9");
    }

    #[test]
    fn unknown_team_name_falls_back_to_id() {
        let snapshot = LeagueSnapshot::default();
        assert_eq!(snapshot.team_name("ghost"), "ghost");
    }

    #[test]
    fn per_game_averages_handle_zero_games() {
        let leader = PlayerLeader { points: 10, ..Default::default() };
        assert_eq!(leader.points_per_game(), 0.0);
    }
}
