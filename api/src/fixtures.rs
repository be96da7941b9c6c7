//! Round-robin fixture generation by the circle method.

use crate::{Fixture, Schedule, Team};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    NotEnoughTeams(usize),
    DuplicateTeam(String),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::NotEnoughTeams(n) => {
                write!(f, "need at least 2 teams to generate fixtures, got {n}")
            }
            FixtureError::DuplicateTeam(id) => write!(f, "team {id} listed more than once"),
        }
    }
}

impl std::error::Error for FixtureError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureOptions {
    /// Play everyone twice, second half with home/away swapped.
    pub double_round_robin: bool,
    /// Date of round 1. Without it fixtures are left undated.
    pub start_date: Option<NaiveDate>,
    /// Gap between consecutive rounds; 0 is treated as 7.
    pub days_between_rounds: u32,
}

const DEFAULT_DAYS_BETWEEN_ROUNDS: u32 = 7;

/// Generate a round-robin schedule.
///
/// Each round pairs slot `i` (home) with slot `n-1-i` (away), then rotates
/// the slots by moving the last one to index 1 while index 0 stays put.
/// An odd team count gets a bye slot; whoever draws it rests that round.
pub fn generate_round_robin(teams: &[Team], options: &FixtureOptions) -> Result<Schedule, FixtureError> {
    if teams.len() < 2 {
        return Err(FixtureError::NotEnoughTeams(teams.len()));
    }
    let mut seen = HashSet::new();
    for team in teams {
        if !seen.insert(team.id.as_str()) {
            return Err(FixtureError::DuplicateTeam(team.id.clone()));
        }
    }

    // None is the bye.
    let mut slots: Vec<Option<&str>> = teams.iter().map(|t| Some(t.id.as_str())).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let rounds_per_pass = (n - 1) as u32;

    let mut fixtures = Vec::with_capacity(n / 2 * (n - 1));
    for round in 1..=rounds_per_pass {
        for i in 0..n / 2 {
            if let (Some(home), Some(away)) = (slots[i], slots[n - 1 - i]) {
                fixtures.push(Fixture {
                    round,
                    home_team_id: home.to_string(),
                    away_team_id: away.to_string(),
                    date: None,
                });
            }
        }
        if let Some(last) = slots.pop() {
            slots.insert(1, last);
        }
    }

    let mut rounds = rounds_per_pass;
    if options.double_round_robin {
        let return_leg: Vec<Fixture> = fixtures
            .iter()
            .map(|f| Fixture {
                round: f.round + rounds_per_pass,
                home_team_id: f.away_team_id.clone(),
                away_team_id: f.home_team_id.clone(),
                date: None,
            })
            .collect();
        fixtures.extend(return_leg);
        rounds *= 2;
    }

    if let Some(start) = options.start_date {
        let gap = match options.days_between_rounds {
            0 => DEFAULT_DAYS_BETWEEN_ROUNDS,
            d => d,
        };
        for fixture in &mut fixtures {
            let offset = i64::from(fixture.round - 1) * i64::from(gap);
            fixture.date = start.checked_add_signed(Duration::days(offset));
        }
    }

    Ok(Schedule {
        rounds,
        double_round_robin: options.double_round_robin,
        fixtures,
    })
}
