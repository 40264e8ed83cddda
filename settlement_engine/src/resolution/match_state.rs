use crate::{
    db_types::{Match, MatchStatus},
    traits::ProviderScore,
};

/// Works out the status and score a match should move to after a provider report.
///
/// Returns `None` when nothing would change, including for matches that are already finished.
/// Scores the provider omits are kept. Statuses only move forward: `Scheduled`, `Live`, `Finished`.
pub fn next_match_state(current: &Match, score: &ProviderScore) -> Option<(MatchStatus, Option<(i32, i32)>)> {
    if current.is_finished() {
        return None;
    }
    let final_score = score.final_score().or(current.final_score());
    let status = if score.completed {
        MatchStatus::Finished
    } else if final_score.is_some() {
        MatchStatus::Live
    } else {
        current.status
    };
    if status == current.status && final_score == current.final_score() {
        None
    } else {
        Some((status, final_score))
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn fixture(status: MatchStatus, home: Option<i32>, away: Option<i32>) -> Match {
        let now = Utc::now();
        Match {
            id: 1,
            external_id: "evt-1".into(),
            sport: "soccer".into(),
            league_key: "soccer_epl".into(),
            home_team: "Arsenal".into(),
            away_team: "Chelsea".into(),
            start_time: now,
            status,
            home_score: home,
            away_score: away,
            created_at: now,
            updated_at: now,
        }
    }

    fn report(home: Option<i32>, away: Option<i32>, completed: bool) -> ProviderScore {
        ProviderScore { external_id: "evt-1".into(), home_score: home, away_score: away, completed }
    }

    #[test]
    fn scores_make_a_match_live() {
        let m = fixture(MatchStatus::Scheduled, None, None);
        assert_eq!(next_match_state(&m, &report(Some(1), Some(0), false)), Some((MatchStatus::Live, Some((1, 0)))));
    }

    #[test]
    fn completion_finishes_a_match() {
        let m = fixture(MatchStatus::Live, Some(1), Some(0));
        assert_eq!(next_match_state(&m, &report(Some(2), Some(0), true)), Some((MatchStatus::Finished, Some((2, 0)))));
        // Completed without scores keeps whatever we had
        assert_eq!(next_match_state(&m, &report(None, None, true)), Some((MatchStatus::Finished, Some((1, 0)))));
    }

    #[test]
    fn finished_matches_are_never_touched() {
        let m = fixture(MatchStatus::Finished, Some(1), Some(1));
        assert_eq!(next_match_state(&m, &report(Some(3), Some(1), true)), None);
    }

    #[test]
    fn identical_reports_change_nothing() {
        let m = fixture(MatchStatus::Live, Some(1), Some(1));
        assert_eq!(next_match_state(&m, &report(Some(1), Some(1), false)), None);
        let m = fixture(MatchStatus::Scheduled, None, None);
        assert_eq!(next_match_state(&m, &report(None, None, false)), None);
    }

    #[test]
    fn live_never_regresses() {
        let m = fixture(MatchStatus::Live, None, None);
        assert_eq!(next_match_state(&m, &report(None, None, false)), None);
    }

    #[test]
    fn a_lone_score_is_ignored() {
        let m = fixture(MatchStatus::Scheduled, None, None);
        assert_eq!(next_match_state(&m, &report(Some(1), None, false)), None);
    }
}
