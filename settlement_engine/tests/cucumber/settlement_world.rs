use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex},
    time::Duration,
};

use cucumber::World;
use log::*;
use settlement_engine::{
    db_types::{Match, Ticket, User},
    events::EventProducers,
    traits::{ProviderScore, ScoreBatch, ScoreSource, ScoreSourceError},
    SqliteDatabase,
};
use tokio::{task::JoinHandle, time::sleep};

use crate::support::{
    events::{capture_events, CapturedEvents},
    prepare_env::{create_database, random_db_path, run_migrations},
};

#[derive(Default, Debug, World)]
pub struct SettlementWorld {
    pub system: Option<SettlementSystem>,
}

impl SettlementWorld {
    pub fn system(&self) -> &SettlementSystem {
        self.system.as_ref().expect("Settlement system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut SettlementSystem {
        self.system.as_mut().expect("Settlement system not initialised")
    }
}

/// Provider results that scenarios script step by step, keyed by league.
#[derive(Clone, Default)]
pub struct ScriptedScores {
    scores: Arc<Mutex<HashMap<String, Vec<ProviderScore>>>>,
}

impl ScriptedScores {
    pub fn report(&self, league: &str, score: ProviderScore) {
        let mut scores = self.scores.lock().unwrap();
        let league = scores.entry(league.to_string()).or_default();
        league.retain(|s| s.external_id != score.external_id);
        league.push(score);
    }
}

impl ScoreSource for ScriptedScores {
    async fn get_scores(&self, league_key: &str) -> Result<ScoreBatch, ScoreSourceError> {
        let scores = self.scores.lock().unwrap().get(league_key).cloned().unwrap_or_default();
        Ok(ScoreBatch { scores, quota: None })
    }
}

pub struct SettlementSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub scores: ScriptedScores,
    pub producers: EventProducers,
    pub captured: CapturedEvents,
    pub handlers: Vec<JoinHandle<()>>,
    pub users: HashMap<String, User>,
    pub matches: HashMap<String, Match>,
    pub tickets: HashMap<String, Ticket>,
}

impl Debug for SettlementSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementSystem({})", self.db_path)
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 4).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(Duration::from_millis(50)).await;
        let (producers, handlers, captured) = capture_events();
        Self {
            db_path: url,
            db,
            scores: ScriptedScores::default(),
            producers,
            captured,
            handlers,
            users: HashMap::new(),
            matches: HashMap::new(),
            tickets: HashMap::new(),
        }
    }

    pub fn user(&self, name: &str) -> &User {
        self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn game(&self, external_id: &str) -> &Match {
        self.matches.get(external_id).unwrap_or_else(|| panic!("No match {external_id}"))
    }

    pub fn ticket(&self, title: &str) -> &Ticket {
        self.tickets.get(title).unwrap_or_else(|| panic!("No ticket called {title}"))
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
