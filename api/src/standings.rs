//! Per-stage league tables computed from a flat match list.
//!
//! Everything here is recomputed from scratch on each load; nothing is
//! cached between calls.

use crate::{Form, Match, MatchStatus, Outcome, PointsSystem, Stage, StageTable, StandingRow, Team};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

pub const FORM_LENGTH: usize = 5;
const FORM_PAD: char = '-';

/// Infer the competition stage from free-text match notes.
///
/// Notes are lowercased and stripped of anything that is not alphanumeric,
/// so "Quarter-Final", "quarter finals" and "QUARTERFINALS" all match.
/// More specific names are checked before "final".
pub fn infer_stage(notes: Option<&str>) -> Stage {
    let Some(notes) = notes else {
        return Stage::GroupStage;
    };
    let normalized: String = notes
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();

    if normalized.contains("quarterfinal") {
        Stage::QuarterFinals
    } else if normalized.contains("semifinal") {
        Stage::SemiFinals
    } else if normalized.contains("roundof16") || normalized.contains("last16") {
        Stage::RoundOf16
    } else if normalized.contains("thirdplace") || normalized.contains("3rdplace") {
        Stage::ThirdPlace
    } else if normalized.contains("final") {
        Stage::Final
    } else {
        Stage::GroupStage
    }
}

/// A match counts once both scores are in and it is either in the past or
/// explicitly marked completed.
pub fn is_completed(m: &Match, now: DateTime<Utc>) -> bool {
    if m.score().is_none() {
        return false;
    }
    let in_past = m.scheduled_at.is_some_and(|at| at < now);
    in_past || m.status == MatchStatus::Completed
}

/// Result of a completed match from one team's point of view.
pub fn outcome_for(m: &Match, team_id: &str) -> Option<Outcome> {
    let (home, away) = m.score()?;
    let (own, other) = if m.home_team_id.as_deref() == Some(team_id) {
        (home, away)
    } else if m.away_team_id.as_deref() == Some(team_id) {
        (away, home)
    } else {
        return None;
    };
    Some(match own.cmp(&other) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Loss,
        std::cmp::Ordering::Equal => Outcome::Draw,
    })
}

/// Last five completed results for `team_id`, oldest first, padded with `-`.
pub fn team_form(team_id: &str, matches: &[Match], now: DateTime<Utc>) -> Form {
    let mut played: Vec<&Match> = matches
        .iter()
        .filter(|m| m.has_two_teams() && m.involves(team_id) && is_completed(m, now))
        .collect();
    // Undated matches sort first; stable sort keeps input order among equals.
    played.sort_by_key(|m| m.scheduled_at);

    let skip = played.len().saturating_sub(FORM_LENGTH);
    let mut form: String = played
        .iter()
        .skip(skip)
        .filter_map(|m| outcome_for(m, team_id))
        .map(|o| o.letter())
        .collect();
    while form.chars().count() < FORM_LENGTH {
        form.push(FORM_PAD);
    }
    Form(form)
}

#[derive(Debug, Default)]
struct Tally {
    played: u32,
    wins: u32,
    losses: u32,
    draws: u32,
    points_for: u32,
    points_against: u32,
}

impl Tally {
    fn record(&mut self, own: u16, other: u16) {
        self.played += 1;
        self.points_for += u32::from(own);
        self.points_against += u32::from(other);
        match own.cmp(&other) {
            std::cmp::Ordering::Greater => self.wins += 1,
            std::cmp::Ordering::Less => self.losses += 1,
            std::cmp::Ordering::Equal => self.draws += 1,
        }
    }
}

/// Build one table per stage present in `matches`, ordered by stage.
///
/// Every team that appears in a stage's matches gets a row, even when none of
/// its games there are complete yet. Undecided sides add no row, and a match
/// listing the same team on both sides is ignored.
pub fn compute_standings(
    matches: &[Match],
    teams: &[Team],
    now: DateTime<Utc>,
    points: PointsSystem,
) -> Vec<StageTable> {
    let names: HashMap<&str, &str> = teams
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();

    // Stage -> team id -> tally. Vec keeps first-seen team order within a stage.
    let mut stages: BTreeMap<Stage, Vec<(String, Tally)>> = BTreeMap::new();

    for m in matches {
        if m.home_team_id.is_some() && m.home_team_id == m.away_team_id {
            continue;
        }
        let stage = infer_stage(m.notes.as_deref());
        let tallies = stages.entry(stage).or_default();
        for team_id in [&m.home_team_id, &m.away_team_id].into_iter().flatten() {
            if !tallies.iter().any(|(id, _)| id == team_id) {
                tallies.push((team_id.clone(), Tally::default()));
            }
        }

        if !m.has_two_teams() || !is_completed(m, now) {
            continue;
        }
        let Some((home, away)) = m.score() else {
            continue;
        };
        for (id, tally) in tallies.iter_mut() {
            if m.home_team_id.as_deref() == Some(id.as_str()) {
                tally.record(home, away);
            } else if m.away_team_id.as_deref() == Some(id.as_str()) {
                tally.record(away, home);
            }
        }
    }

    let mut forms: HashMap<String, Form> = HashMap::new();

    stages
        .into_iter()
        .map(|(stage, tallies)| {
            let mut rows: Vec<StandingRow> = tallies
                .into_iter()
                .map(|(team_id, t)| {
                    let form = forms
                        .entry(team_id.clone())
                        .or_insert_with(|| team_form(&team_id, matches, now))
                        .clone();
                    StandingRow {
                        rank: 0,
                        team_name: names
                            .get(team_id.as_str())
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| team_id.clone()),
                        team_id,
                        played: t.played,
                        wins: t.wins,
                        losses: t.losses,
                        draws: t.draws,
                        points_for: t.points_for,
                        points_against: t.points_against,
                        points: points.win * t.wins + points.draw * t.draws + points.loss * t.losses,
                        form,
                    }
                })
                .collect();
            sort_rows(&mut rows);
            assign_dense_ranks(&mut rows);
            StageTable { stage, rows }
        })
        .collect()
}

fn sort_rows(rows: &mut [StandingRow]) {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.point_differential().cmp(&a.point_differential()))
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
}

/// Equal (points, differential) share a rank; the next distinct row is rank + 1.
fn assign_dense_ranks(rows: &mut [StandingRow]) {
    let mut rank = 0;
    let mut previous: Option<(u32, i64)> = None;
    for row in rows.iter_mut() {
        let key = (row.points, row.point_differential());
        if previous != Some(key) {
            rank += 1;
            previous = Some(key);
        }
        row.rank = rank;
    }
}
