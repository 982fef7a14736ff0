//! Aggregate views over a token collection. Everything here is pure.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate};

use crate::constants::DATE_FORMAT;
use crate::state::Token;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventBreakdown {
    pub total: usize,
    pub claimed: usize,
}

impl EventBreakdown {
    pub fn claim_rate(&self) -> f64 {
        ratio(self.claimed, self.total)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenStats {
    pub total: usize,
    pub claimed: usize,
    pub unique_events: usize,
    pub claim_rate: f64,
    pub oldest: Option<NaiveDate>,
    pub newest: Option<NaiveDate>,
    pub average_claim_hours: Option<f64>,
}

impl TokenStats {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self {
            total: tokens.len(),
            claimed: claimed_count(tokens),
            unique_events: unique_events(tokens),
            claim_rate: claim_rate(tokens),
            oldest: oldest(tokens).and_then(|t| parse_date(&t.date)),
            newest: newest(tokens).and_then(|t| parse_date(&t.date)),
            average_claim_hours: average_claim_hours(tokens),
        }
    }

    pub fn claim_rate_percent(&self) -> f64 {
        self.claim_rate * 100.0
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()
}

pub fn unique_events(tokens: &[Token]) -> usize {
    tokens.iter().map(|t| t.event.as_str()).collect::<HashSet<_>>().len()
}

pub fn claimed_count(tokens: &[Token]) -> usize {
    tokens.iter().filter(|t| t.claimed).count()
}

/// Fraction of claimed tokens; 0 for an empty collection.
pub fn claim_rate(tokens: &[Token]) -> f64 {
    ratio(claimed_count(tokens), tokens.len())
}

pub fn claim_rate_percent(tokens: &[Token]) -> f64 {
    claim_rate(tokens) * 100.0
}

/// Earliest token by `date`. Tokens with unparseable dates are ignored.
pub fn oldest(tokens: &[Token]) -> Option<&Token> {
    tokens
        .iter()
        .filter_map(|t| parse_date(&t.date).map(|d| (d, t)))
        .min_by_key(|(d, _)| *d)
        .map(|(_, t)| t)
}

pub fn newest(tokens: &[Token]) -> Option<&Token> {
    tokens
        .iter()
        .filter_map(|t| parse_date(&t.date).map(|d| (d, t)))
        .max_by_key(|(d, _)| *d)
        .map(|(_, t)| t)
}

pub fn distribution_by_event(tokens: &[Token]) -> BTreeMap<String, EventBreakdown> {
    let mut distribution: BTreeMap<String, EventBreakdown> = BTreeMap::new();
    for token in tokens {
        let entry = distribution.entry(token.event.clone()).or_default();
        entry.total += 1;
        if token.claimed {
            entry.claimed += 1;
        }
    }
    distribution
}

/// Claimed tokens per UTC day of claim.
pub fn claims_by_day(tokens: &[Token]) -> BTreeMap<NaiveDate, usize> {
    let mut days = BTreeMap::new();
    for token in tokens.iter().filter(|t| t.claimed) {
        let day = token
            .claimed_at
            .and_then(DateTime::from_timestamp_millis)
            .map(|at| at.date_naive());
        if let Some(day) = day {
            *days.entry(day).or_insert(0) += 1;
        }
    }
    days
}

/// Mean hours between mint and claim over claimed tokens.
pub fn average_claim_hours(tokens: &[Token]) -> Option<f64> {
    let waits: Vec<i64> = tokens
        .iter()
        .filter(|t| t.claimed)
        .filter_map(|t| t.claimed_at.map(|at| at.saturating_sub(t.created_at).max(0)))
        .collect();
    if waits.is_empty() {
        return None;
    }
    let total: i128 = waits.iter().map(|&wait| i128::from(wait)).sum();
    Some(total as f64 / waits.len() as f64 / MILLIS_PER_HOUR)
}
