use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use tipster_common::Money;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------     MatchStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum MatchStatus {
    /// The match has not kicked off yet.
    Scheduled,
    /// The match has started, but no final result is known.
    Live,
    /// The match is over. Once a match is finished, its status never changes again.
    Finished,
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "Scheduled"),
            MatchStatus::Live => write!(f, "Live"),
            MatchStatus::Finished => write!(f, "Finished"),
        }
    }
}

impl FromStr for MatchStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(Self::Scheduled),
            "Live" => Ok(Self::Live),
            "Finished" => Ok(Self::Finished),
            s => Err(ConversionError(format!("Invalid match status: {s}"))),
        }
    }
}

impl From<String> for MatchStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid match status: {value}. But this conversion cannot fail. Defaulting to Scheduled");
            MatchStatus::Scheduled
        })
    }
}

//--------------------------------------        Match        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    /// The identifier the score provider uses for this match
    pub external_id: String,
    pub sport: String,
    /// The provider's league code, e.g. `soccer_epl`
    pub league_key: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// The final score as `(home, away)`. Only available when both scores are known.
    pub fn final_score(&self) -> Option<(i32, i32)> {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub external_id: String,
    pub sport: String,
    pub league_key: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: DateTime<Utc>,
}

impl NewMatch {
    pub fn new<S: Into<String>>(external_id: S, league_key: S, home_team: S, away_team: S, start_time: DateTime<Utc>) -> Self {
        let league_key = league_key.into();
        // Provider league keys are prefixed with the sport, e.g. soccer_epl
        let sport = league_key.split('_').next().unwrap_or_default().to_string();
        Self {
            external_id: external_id.into(),
            sport,
            league_key,
            home_team: home_team.into(),
            away_team: away_team.into(),
            start_time,
        }
    }
}

//--------------------------------------     TicketStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Selections can still be bought. No match on the ticket has started.
    Open,
    /// At least one match has started. Waiting on final results.
    Locked,
    /// Settled. The ticket result is final.
    Finished,
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "Open"),
            TicketStatus::Locked => write!(f, "Locked"),
            TicketStatus::Finished => write!(f, "Finished"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Locked" => Ok(Self::Locked),
            "Finished" => Ok(Self::Finished),
            s => Err(ConversionError(format!("Invalid ticket status: {s}"))),
        }
    }
}

//--------------------------------------     TicketResult    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum TicketResult {
    Pending,
    Win,
    Lose,
}

impl Display for TicketResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketResult::Pending => write!(f, "Pending"),
            TicketResult::Win => write!(f, "Win"),
            TicketResult::Lose => write!(f, "Lose"),
        }
    }
}

impl FromStr for TicketResult {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Win" => Ok(Self::Win),
            "Lose" => Ok(Self::Lose),
            s => Err(ConversionError(format!("Invalid ticket result: {s}"))),
        }
    }
}

//--------------------------------------        Ticket       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub tipster_id: i64,
    pub title: String,
    pub is_public: bool,
    pub price: Money,
    /// The mean of the selection odds, fixed when the ticket was published
    pub avg_odds: f64,
    pub status: TicketStatus,
    pub result: TicketResult,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub tipster_id: i64,
    pub title: String,
    pub is_public: bool,
    pub price: Money,
    pub selections: Vec<NewSelection>,
}

impl NewTicket {
    pub fn new<S: Into<String>>(tipster_id: i64, title: S, price: Money) -> Self {
        Self { tipster_id, title: title.into(), is_public: price.value() == 0, price, selections: Vec::new() }
    }

    pub fn with_selection(mut self, selection: NewSelection) -> Self {
        self.selections.push(selection);
        self
    }

    pub fn with_visibility(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// The arithmetic mean of the selection odds. `None` for a ticket without selections.
    pub fn average_odds(&self) -> Option<f64> {
        if self.selections.is_empty() {
            return None;
        }
        let total = self.selections.iter().map(|s| s.odds).sum::<f64>();
        Some(total / self.selections.len() as f64)
    }
}

//--------------------------------------      Selection      ---------------------------------------------------------
/// One prediction on a ticket. Selections never change once the ticket is published.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Selection {
    pub id: i64,
    pub ticket_id: i64,
    pub position: i64,
    /// A by-value reference to the match. The match may disappear from the repository.
    pub match_id: i64,
    pub match_label: String,
    pub market_type: String,
    pub label: String,
    pub odds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSelection {
    pub match_id: i64,
    pub match_label: String,
    pub market_type: String,
    pub label: String,
    pub odds: f64,
}

impl NewSelection {
    pub fn new<S: Into<String>>(match_id: i64, market_type: S, label: S, odds: f64) -> Self {
        Self { match_id, match_label: String::default(), market_type: market_type.into(), label: label.into(), odds }
    }

    pub fn with_match_label<S: Into<String>>(mut self, label: S) -> Self {
        self.match_label = label.into();
        self
    }
}

//--------------------------------------    TicketPurchase   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TicketPurchase {
    pub id: i64,
    pub ticket_id: i64,
    pub buyer_id: i64,
    pub price_paid: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicketPurchase {
    pub ticket_id: i64,
    pub buyer_id: i64,
    pub price_paid: Money,
}

//--------------------------------------        Wallet       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   TransactionType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Purchase,
    /// The tipster's side of a purchase
    Sale,
    Commission,
    /// A ticket payout. At most one per (user, ticket).
    Win,
    Refund,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Deposit => write!(f, "Deposit"),
            TransactionType::Withdrawal => write!(f, "Withdrawal"),
            TransactionType::Purchase => write!(f, "Purchase"),
            TransactionType::Sale => write!(f, "Sale"),
            TransactionType::Commission => write!(f, "Commission"),
            TransactionType::Win => write!(f, "Win"),
            TransactionType::Refund => write!(f, "Refund"),
        }
    }
}

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "Pending"),
            TransactionStatus::Completed => write!(f, "Completed"),
            TransactionStatus::Failed => write!(f, "Failed"),
        }
    }
}

//--------------------------------------  WalletTransaction  ---------------------------------------------------------
/// An append-only ledger entry. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: i64,
    pub wallet_id: i64,
    pub user_id: i64,
    pub tx_type: TransactionType,
    pub amount: Money,
    pub reference_id: Option<i64>,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWalletTransaction {
    pub wallet_id: i64,
    pub user_id: i64,
    pub tx_type: TransactionType,
    pub amount: Money,
    pub reference_id: Option<i64>,
    pub description: Option<String>,
}

impl NewWalletTransaction {
    pub fn win(wallet_id: i64, user_id: i64, amount: Money, ticket_id: i64) -> Self {
        Self {
            wallet_id,
            user_id,
            tx_type: TransactionType::Win,
            amount,
            reference_id: Some(ticket_id),
            description: Some(format!("Winnings for ticket #{ticket_id}")),
        }
    }

    pub fn deposit(wallet_id: i64, user_id: i64, amount: Money, description: Option<String>) -> Self {
        Self { wallet_id, user_id, tx_type: TransactionType::Deposit, amount, reference_id: None, description }
    }
}

//--------------------------------------  SubscriptionStatus ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "Active"),
            SubscriptionStatus::Expired => write!(f, "Expired"),
            SubscriptionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

//--------------------------------------    Subscription     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub subscriber_id: i64,
    pub tipster_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub notified_expiring_j3: bool,
    pub notified_expiring_j1: bool,
    pub notified_expired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date > now
    }

    pub fn has_flag(&self, flag: SubscriptionFlag) -> bool {
        match flag {
            SubscriptionFlag::ExpiringJ3 => self.notified_expiring_j3,
            SubscriptionFlag::ExpiringJ1 => self.notified_expiring_j1,
            SubscriptionFlag::Expired => self.notified_expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub subscriber_id: i64,
    pub tipster_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// The one-shot notification markers carried by every subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionFlag {
    ExpiringJ3,
    ExpiringJ1,
    Expired,
}

impl SubscriptionFlag {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            SubscriptionFlag::ExpiringJ3 => "notified_expiring_j3",
            SubscriptionFlag::ExpiringJ1 => "notified_expiring_j1",
            SubscriptionFlag::Expired => "notified_expired",
        }
    }
}

impl Display for SubscriptionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionFlag::ExpiringJ3 => write!(f, "J-3 warning"),
            SubscriptionFlag::ExpiringJ1 => write!(f, "J-1 warning"),
            SubscriptionFlag::Expired => write!(f, "expiry notice"),
        }
    }
}

//--------------------------------------         User        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(username: S, email: S) -> Self {
        Self { username: username.into(), email: email.into() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn average_odds() {
        let ticket = NewTicket::new(1, "Weekend acca", Money::from(500))
            .with_selection(NewSelection::new(1, "h2h", "1", 1.5))
            .with_selection(NewSelection::new(2, "h2h", "2", 2.5));
        let avg = ticket.average_odds().unwrap();
        assert!((avg - 2.0).abs() < 1e-9);
        assert!(!ticket.is_public);
        assert_eq!(NewTicket::new(1, "Free", Money::from(0)).average_odds(), None);
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!("Locked".parse::<TicketStatus>().unwrap(), TicketStatus::Locked);
        assert_eq!(TicketResult::Win.to_string(), "Win");
        assert!("Closed".parse::<TicketStatus>().is_err());
        assert_eq!(MatchStatus::from("Bogus".to_string()), MatchStatus::Scheduled);
    }

    #[test]
    fn new_match_derives_sport_from_league_key() {
        let m = NewMatch::new("abc", "soccer_epl", "Arsenal", "Chelsea", Utc::now());
        assert_eq!(m.sport, "soccer");
        assert_eq!(m.league_key, "soccer_epl");
    }
}
