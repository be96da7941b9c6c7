/// Raw row shapes returned by the hosted database's REST endpoint.
/// These map to the clean domain types via the mapping functions in client.rs.
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Primary keys come back as either integers or UUID strings depending on the
/// table, so ids are accepted in both forms.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RowId {
    Text(String),
    Number(i64),
}

impl Default for RowId {
    fn default() -> Self {
        RowId::Text(String::new())
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowId::Text(s) => f.write_str(s),
            RowId::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LeagueRow {
    pub id: RowId,
    pub name: Option<String>,
    pub season: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamRow {
    pub id: RowId,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchRow {
    pub id: RowId,
    pub league_id: Option<RowId>,
    pub home_team_id: Option<RowId>,
    pub away_team_id: Option<RowId>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub match_date: Option<String>,
    /// Some rows split date and tip-off time into two columns.
    pub match_time: Option<String>,
    pub venue: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlayerStatRow {
    pub player_id: Option<RowId>,
    pub team_id: Option<RowId>,
    pub match_id: Option<RowId>,
    pub points: Option<i64>,
    pub rebounds: Option<i64>,
    pub assists: Option<i64>,
    /// Embedded resource from `select=*,players(first_name,last_name)`.
    pub players: Option<PlayerRef>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlayerRef {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Local snapshot file (LEAGUETUI_SNAPSHOT_JSON)
// ---------------------------------------------------------------------------

/// A dump of the four tables for one league, for offline use.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SnapshotFile {
    pub league: LeagueRow,
    #[serde(default)]
    pub teams: Vec<TeamRow>,
    #[serde(default)]
    pub matches: Vec<MatchRow>,
    #[serde(default)]
    pub player_statistics: Vec<PlayerStatRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unread_columns_are_ignored() {
        let team: TeamRow =
            serde_json::from_str(r#"{"id": 7, "name": "KPA", "league_id": "l1", "founded": 1990}"#).unwrap();
        assert_eq!(team.id, RowId::Number(7));
        assert_eq!(team.name.as_deref(), Some("KPA"));

        let stat: PlayerStatRow =
            serde_json::from_str(r#"{"id": 99, "player_id": "p1", "points": 14}"#).unwrap();
        assert_eq!(stat.player_id, Some(RowId::Text("p1".into())));
        assert_eq!(stat.points, Some(14));
    }
}
