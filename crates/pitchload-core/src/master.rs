//! Master-data derivation.
//!
//! Turns the two extracts into the dimension rows the fact tables hang off:
//! leagues, seasons, teams, players and matches. Everything here is pure; the
//! rows are written by the store in this same dependency order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  model::{League, Match, Player, Season, Team},
  schema::{
    EVENT_ID, LEAGUE_ID, PLAYER_ID, PLAYER_NAME, SEASON_ID, SEASON_NAME,
    TEAM_ID, TEAM_NAME, TEAM_QUALIFIER,
  },
  table::WideTable,
};

/// Season recorded for a match whose extract rows carry none.
pub const SEASON_SENTINEL: &str = "N/A";

/// Status every registered match is given.
pub const MATCH_STATUS_CLOSED: &str = "closed";

pub const HOME: &str = "home";
pub const AWAY: &str = "away";

/// Display attributes for leagues. The extracts carry league identifiers
/// only, so name and country come from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueProfile {
  pub name:    String,
  pub country: Option<String>,
}

impl Default for LeagueProfile {
  fn default() -> Self {
    Self { name: "LaLiga".to_owned(), country: Some("Spain".to_owned()) }
  }
}

/// All dimension rows derived from one pair of extracts.
#[derive(Debug, Clone, Default)]
pub struct MasterData {
  pub leagues: Vec<League>,
  pub seasons: Vec<Season>,
  pub teams:   Vec<Team>,
  pub players: Vec<Player>,
  pub matches: Vec<Match>,
}

impl MasterData {
  pub fn derive(
    team: &WideTable,
    player: &WideTable,
    league: &LeagueProfile,
  ) -> Self {
    Self {
      leagues: derive_leagues(team, league),
      seasons: derive_seasons(team),
      teams:   derive_teams(team, player),
      players: derive_players(player),
      matches: derive_matches(team),
    }
  }
}

/// One league per distinct league identifier in the team extract.
pub fn derive_leagues(team: &WideTable, profile: &LeagueProfile) -> Vec<League> {
  let mut seen = HashSet::new();
  team
    .rows()
    .filter_map(|row| row.get(LEAGUE_ID))
    .filter(|id| seen.insert(*id))
    .map(|id| League {
      league_id: id.to_owned(),
      name:      profile.name.clone(),
      country:   profile.country.clone(),
    })
    .collect()
}

/// One season per distinct season identifier that also names its league.
/// The first row seen for a season supplies its name.
pub fn derive_seasons(team: &WideTable) -> Vec<Season> {
  let mut seen = HashSet::new();
  team
    .rows()
    .filter_map(|row| {
      let season_id = row.get(SEASON_ID)?;
      let league_id = row.get(LEAGUE_ID)?;
      seen.insert(season_id).then(|| Season {
        season_id: season_id.to_owned(),
        name:      row.get(SEASON_NAME).map(str::to_owned),
        league_id: league_id.to_owned(),
      })
    })
    .collect()
}

/// Teams from both extracts, team extract first, deduplicated by identifier.
///
/// The union keeps teams that only appear in the player extract.
pub fn derive_teams(team: &WideTable, player: &WideTable) -> Vec<Team> {
  let mut seen = HashSet::new();
  team
    .rows()
    .chain(player.rows())
    .filter_map(|row| {
      let team_id = row.get(TEAM_ID)?;
      seen.insert(team_id).then(|| Team {
        team_id: team_id.to_owned(),
        name:    row.get(TEAM_NAME).map(str::to_owned),
      })
    })
    .collect()
}

pub fn derive_players(player: &WideTable) -> Vec<Player> {
  let mut seen = HashSet::new();
  player
    .rows()
    .filter_map(|row| {
      let player_id = row.get(PLAYER_ID)?;
      seen.insert(player_id).then(|| Player {
        player_id: player_id.to_owned(),
        name:      row.get(PLAYER_NAME).map(str::to_owned),
      })
    })
    .collect()
}

/// One match per distinct event in the team extract, in first-seen order.
///
/// The season comes from the event's first row. Home and away are the first
/// rows of the event qualified exactly `home` / `away`; an event without such
/// a row gets a null side rather than failing.
pub fn derive_matches(team: &WideTable) -> Vec<Match> {
  let mut matches: Vec<Match> = Vec::new();
  let mut by_event: HashMap<&str, usize> = HashMap::new();

  for row in team.rows() {
    let Some(event_id) = row.get(EVENT_ID) else {
      continue;
    };

    let index = *by_event.entry(event_id).or_insert_with(|| {
      matches.push(Match {
        event_id:     event_id.to_owned(),
        season_id:    row
          .get(SEASON_ID)
          .unwrap_or(SEASON_SENTINEL)
          .to_owned(),
        home_team_id: None,
        away_team_id: None,
        status:       MATCH_STATUS_CLOSED.to_owned(),
      });
      matches.len() - 1
    });

    let Some(team_id) = row.get(TEAM_ID) else {
      continue;
    };
    let side = match row.get(TEAM_QUALIFIER) {
      Some(HOME) => &mut matches[index].home_team_id,
      Some(AWAY) => &mut matches[index].away_team_id,
      _ => continue,
    };
    if side.is_none() {
      *side = Some(team_id.to_owned());
    }
  }

  matches
}
