use crate::{PlayerLeader, PlayerStatLine};
use std::collections::HashMap;

/// Fold per-match stat lines into per-player totals, best scorers first.
///
/// Each line is one game played. Players with fewer than `min_games` lines
/// are left out.
pub fn league_leaders(lines: &[PlayerStatLine], min_games: u32) -> Vec<PlayerLeader> {
    let mut by_player: HashMap<&str, PlayerLeader> = HashMap::new();

    for line in lines {
        let leader = by_player
            .entry(line.player_id.as_str())
            .or_insert_with(|| PlayerLeader {
                player_id: line.player_id.clone(),
                player_name: line.player_name.clone(),
                team_id: line.team_id.clone(),
                ..Default::default()
            });
        leader.games += 1;
        leader.points += u32::from(line.points);
        leader.rebounds += u32::from(line.rebounds);
        leader.assists += u32::from(line.assists);
        if leader.team_id.is_none() {
            leader.team_id = line.team_id.clone();
        }
    }

    let mut leaders: Vec<PlayerLeader> = by_player
        .into_values()
        .filter(|l| l.games >= min_games)
        .collect();
    leaders.sort_by(|a, b| {
        b.points_per_game()
            .total_cmp(&a.points_per_game())
            .then_with(|| a.player_name.cmp(&b.player_name))
    });
    leaders
}
