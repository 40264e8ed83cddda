use std::{convert::Infallible, fmt::Display, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static THRESHOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("valid threshold regex"));
static SHORT_TOTALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(o|u)\s*\d").expect("valid short totals regex"));

/// The betting markets the engine knows how to resolve. Anything else is carried through as `Other` and never wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    /// Home, draw or away (1X2)
    HeadToHead,
    /// Over or under a goal threshold
    Totals,
    /// Two of the three head-to-head outcomes
    DoubleChance,
    BothTeamsToScore,
    Other(String),
}

impl FromStr for MarketType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        let market = match key.as_str() {
            "h2h" | "1x2" | "head_to_head" | "match_winner" | "moneyline" | "h2h_3_way" => Self::HeadToHead,
            "totals" | "over_under" | "total_goals" => Self::Totals,
            "double_chance" | "dc" => Self::DoubleChance,
            "btts" | "both_teams_to_score" | "both_teams_score" => Self::BothTeamsToScore,
            _ => Self::Other(s.to_string()),
        };
        Ok(market)
    }
}

impl Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketType::HeadToHead => write!(f, "h2h"),
            MarketType::Totals => write!(f, "totals"),
            MarketType::DoubleChance => write!(f, "double_chance"),
            MarketType::BothTeamsToScore => write!(f, "btts"),
            MarketType::Other(s) => write!(f, "{s}"),
        }
    }
}

/// The final result of a match, with the team names needed to interpret free-text labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore<'a> {
    pub home_team: &'a str,
    pub away_team: &'a str,
    pub home: i32,
    pub away: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Home,
    Draw,
    Away,
}

impl FinalScore<'_> {
    fn outcome(&self) -> Outcome {
        match self.home.cmp(&self.away) {
            std::cmp::Ordering::Greater => Outcome::Home,
            std::cmp::Ordering::Equal => Outcome::Draw,
            std::cmp::Ordering::Less => Outcome::Away,
        }
    }
}

/// Parses the market type and resolves the selection against the final score.
pub fn is_selection_correct(market_type: &str, label: &str, score: &FinalScore) -> bool {
    let market = market_type.parse::<MarketType>().unwrap_or_else(|e| match e {});
    resolve_selection(&market, label, score)
}

/// Decides whether a selection label is correct for the given final score.
///
/// Labels that cannot be interpreted are incorrect. An unresolvable selection never wins.
pub fn resolve_selection(market: &MarketType, label: &str, score: &FinalScore) -> bool {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return false;
    }
    match market {
        MarketType::HeadToHead => head_to_head_pick(&label, score).map(|o| o == score.outcome()).unwrap_or(false),
        MarketType::Totals => totals(&label, score).unwrap_or(false),
        MarketType::DoubleChance => {
            double_chance_pick(&label, score).map(|(a, b)| a == score.outcome() || b == score.outcome()).unwrap_or(false)
        },
        MarketType::BothTeamsToScore => both_teams_to_score(&label, score).unwrap_or(false),
        MarketType::Other(_) => false,
    }
}

fn head_to_head_pick(label: &str, score: &FinalScore) -> Option<Outcome> {
    match label {
        "1" => return Some(Outcome::Home),
        "x" => return Some(Outcome::Draw),
        "2" => return Some(Outcome::Away),
        _ => {},
    }
    if label.contains("draw") || label == "nul" || label == "tie" {
        return Some(Outcome::Draw);
    }
    if label == "home" || label.starts_with("home ") {
        return Some(Outcome::Home);
    }
    if label == "away" || label.starts_with("away ") {
        return Some(Outcome::Away);
    }
    team_pick(label, score)
}

/// Matches a label against the team names. A full team name inside the label wins over a label that is merely a
/// fragment of a team name, which in turn wins over a shared word ("Arsenal to win" for "Arsenal FC"). If both teams
/// fit equally well the label is ambiguous.
fn team_pick(label: &str, score: &FinalScore) -> Option<Outcome> {
    let home = score.home_team.trim().to_lowercase();
    let away = score.away_team.trim().to_lowercase();
    let names_home = !home.is_empty() && label.contains(&home);
    let names_away = !away.is_empty() && label.contains(&away);
    match (names_home, names_away) {
        (true, false) => return Some(Outcome::Home),
        (false, true) => return Some(Outcome::Away),
        (true, true) => return None,
        (false, false) => {},
    }
    if label.len() < 3 {
        return None;
    }
    match (home.contains(label), away.contains(label)) {
        (true, false) => return Some(Outcome::Home),
        (false, true) => return Some(Outcome::Away),
        (true, true) => return None,
        (false, false) => {},
    }
    let words = name_words(label);
    let hits = |team: &str| name_words(team).iter().filter(|w| words.contains(w)).count();
    match (hits(&home), hits(&away)) {
        (h, 0) if h > 0 => Some(Outcome::Home),
        (0, a) if a > 0 => Some(Outcome::Away),
        _ => None,
    }
}

/// The distinctive words of a name. Short words and club prefixes such as "FC" carry no information.
fn name_words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3 && !matches!(*w, "afc" | "the" | "club"))
        .collect()
}

fn totals(label: &str, score: &FinalScore) -> Option<bool> {
    let threshold = THRESHOLD.captures(label)?.get(1)?.as_str().replace(',', ".").parse::<f64>().ok()?;
    let total = f64::from(score.home + score.away);
    let over = label.contains("over") || label.contains("plus") || label.starts_with('+');
    let under = label.contains("under") || label.contains("moins") || label.starts_with('-');
    let (over, under) = match (over, under) {
        (false, false) => match SHORT_TOTALS.captures(label).and_then(|c| c.get(1)).map(|m| m.as_str()) {
            Some("o") => (true, false),
            Some("u") => (false, true),
            _ => return None,
        },
        flags => flags,
    };
    match (over, under) {
        (true, false) => Some(total > threshold),
        (false, true) => Some(total < threshold),
        _ => None,
    }
}

fn double_chance_pick(label: &str, score: &FinalScore) -> Option<(Outcome, Outcome)> {
    let compact = label.chars().filter(|c| !matches!(c, ' ' | '/' | '-' | '(' | ')')).collect::<String>();
    match compact.as_str() {
        "1x" | "x1" => return Some((Outcome::Home, Outcome::Draw)),
        "x2" | "2x" => return Some((Outcome::Draw, Outcome::Away)),
        "12" | "21" => return Some((Outcome::Home, Outcome::Away)),
        _ => {},
    }
    if label.contains("no draw") || label.contains("no-draw") {
        return Some((Outcome::Home, Outcome::Away));
    }
    let draw = label.contains("draw");
    let home = label.contains("home") || mentions_team(label, score.home_team);
    let away = label.contains("away") || mentions_team(label, score.away_team);
    match (draw, home, away) {
        (true, true, false) => Some((Outcome::Home, Outcome::Draw)),
        (true, false, true) => Some((Outcome::Draw, Outcome::Away)),
        (false, true, true) => Some((Outcome::Home, Outcome::Away)),
        _ => None,
    }
}

fn mentions_team(label: &str, team: &str) -> bool {
    let team = team.trim().to_lowercase();
    !team.is_empty() && label.contains(&team)
}

fn both_teams_to_score(label: &str, score: &FinalScore) -> Option<bool> {
    let words = label.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect::<Vec<_>>();
    let yes = words.iter().any(|w| matches!(*w, "yes" | "gg" | "oui"));
    let no = words.iter().any(|w| matches!(*w, "no" | "ng" | "non"));
    let both_scored = score.home > 0 && score.away > 0;
    match (yes, no) {
        (true, false) => Some(both_scored),
        (false, true) => Some(!both_scored),
        _ => None,
    }
}
