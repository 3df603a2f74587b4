use crate::models::{HeroCatalog, LiveLeagueGame, MatchOutcome, ScoreboardSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Drafting,
    Started,
    Finished,
}

impl NoticeKind {
    /// Started and finished games are read out loud; drafting is plain text.
    pub fn tts(&self) -> bool {
        match self {
            NoticeKind::Drafting => false,
            NoticeKind::Started | NoticeKind::Finished => true,
        }
    }
}

pub fn render_drafting(games: &[LiveLeagueGame]) -> String {
    games
        .iter()
        .map(|g| {
            format!(
                "In Drafting: {} vs. {} (Game {})",
                g.radiant_team.team_name, g.dire_team.team_name, g.game_number
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_started(games: &[LiveLeagueGame], heroes: Option<&HeroCatalog>) -> String {
    games
        .iter()
        .map(|g| {
            let line = format!(
                "Match Started: {} vs. {} (Game {})",
                g.radiant_team.team_name, g.dire_team.team_name, g.game_number
            );
            match heroes {
                Some(catalog) => format!(
                    "{} [{} vs. {}]",
                    line,
                    hero_names(&g.scoreboard.radiant, catalog),
                    hero_names(&g.scoreboard.dire, catalog)
                ),
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_finished(outcomes: &[MatchOutcome]) -> String {
    outcomes
        .iter()
        .map(|o| {
            format!(
                "Match Ended: {} defeated {} ({} - {}, Game {})",
                o.winner_name, o.loser_name, o.winner_score, o.loser_score, o.game_number
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn hero_names(side: &ScoreboardSide, catalog: &HeroCatalog) -> String {
    side.picks
        .iter()
        .map(|pick| {
            catalog
                .get(&pick.hero_id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", pick.hero_id))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
