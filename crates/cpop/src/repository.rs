use std::collections::HashSet;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::CpopError;
use crate::settings::LedgerSettings;
use crate::state::{
    claim_address, ClaimRecord, CompressedToken, EventConfig, EventId, EventRecord,
    TokenAttribute, TokenMetadata,
};
use crate::Result;

/// Where events, claims and tokens live. The service only talks to this
/// port, so an indexer-backed implementation can replace the in-memory one.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert_event(&self, record: EventRecord) -> Result<()>;

    async fn event(&self, id: &EventId) -> Result<Option<EventRecord>>;

    async fn has_claimed(&self, id: &EventId, claimer: &Pubkey) -> Result<bool>;

    /// Atomically checks the event still accepts claims from `claimer` and
    /// hands out one token. Returns the token and the updated event.
    async fn record_claim(
        &self,
        id: &EventId,
        claimer: Pubkey,
        claimed_at: i64,
    ) -> Result<(CompressedToken, EventConfig)>;

    async fn deactivate_event(&self, id: &EventId, authority: &Pubkey) -> Result<()>;

    /// Every token `owner` holds, oldest first.
    async fn tokens_of(&self, owner: &Pubkey) -> Result<Vec<CompressedToken>>;
}

#[derive(Default)]
struct Ledger {
    events: Vec<EventRecord>,
    tokens: Vec<CompressedToken>,
    claims: HashSet<[u8; 32]>,
}

impl Ledger {
    fn event_mut(&mut self, id: &EventId) -> Result<&mut EventRecord> {
        self.events
            .iter_mut()
            .find(|record| record.id == *id)
            .ok_or_else(|| CpopError::EventNotFound(id.to_string()))
    }
}

pub struct MemoryRepository {
    mint_latency: Duration,
    claim_latency: Duration,
    fetch_latency: Duration,
    samples: Vec<CompressedToken>,
    inner: RwLock<Ledger>,
}

impl MemoryRepository {
    pub fn new(settings: &LedgerSettings) -> Result<Self> {
        let samples = if settings.seed_sample_tokens {
            sample_tokens().inspect_err(|e| log::error!("Error building sample tokens: {e}"))?
        } else {
            Vec::new()
        };

        Ok(Self::with_samples(settings, samples))
    }

    /// No samples, no simulated latency.
    pub fn empty() -> Self {
        Self::with_samples(
            &LedgerSettings {
                mint_latency_ms: 0,
                claim_latency_ms: 0,
                fetch_latency_ms: 0,
                seed_sample_tokens: false,
            },
            Vec::new(),
        )
    }

    fn with_samples(settings: &LedgerSettings, samples: Vec<CompressedToken>) -> Self {
        Self {
            mint_latency: settings.mint_latency(),
            claim_latency: settings.claim_latency(),
            fetch_latency: settings.fetch_latency(),
            samples,
            inner: RwLock::new(Ledger::default()),
        }
    }

    pub async fn event_count(&self) -> usize {
        self.inner.read().await.events.len()
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl TokenRepository for MemoryRepository {
    async fn insert_event(&self, record: EventRecord) -> Result<()> {
        simulate_latency(self.mint_latency).await;

        let token = CompressedToken::new(
            record.id.to_string(),
            record.address,
            record.metadata.clone(),
            record.config.creator,
            record.config.created_at.saturating_mul(1000),
            None,
        )?;

        let mut ledger = self.inner.write().await;
        if ledger.events.iter().any(|existing| existing.id == record.id) {
            return Err(CpopError::Chain(format!("event {} already exists", record.id)));
        }
        ledger.events.push(record);
        ledger.tokens.push(token);
        log::debug!("Total created events: {}", ledger.events.len());
        Ok(())
    }

    async fn event(&self, id: &EventId) -> Result<Option<EventRecord>> {
        let ledger = self.inner.read().await;
        Ok(ledger.events.iter().find(|record| record.id == *id).cloned())
    }

    async fn has_claimed(&self, id: &EventId, claimer: &Pubkey) -> Result<bool> {
        let ledger = self.inner.read().await;
        Ok(ledger.claims.contains(&claim_address(id, claimer)))
    }

    async fn record_claim(
        &self,
        id: &EventId,
        claimer: Pubkey,
        claimed_at: i64,
    ) -> Result<(CompressedToken, EventConfig)> {
        simulate_latency(self.claim_latency).await;

        let mut ledger = self.inner.write().await;
        let address = claim_address(id, &claimer);
        let claimed_before = ledger.claims.contains(&address);

        let event = ledger.event_mut(id)?;
        if !event.config.is_active {
            return Err(CpopError::EventInactive);
        }
        if claimed_before {
            return Err(CpopError::AlreadyClaimed);
        }
        event.config.record_claim()?;

        let record = ClaimRecord {
            event: event.address,
            claimer,
            claimed_at,
        };
        let token = CompressedToken::new(
            record.token_id(id),
            event.address,
            event.metadata.clone(),
            claimer,
            event.config.created_at.saturating_mul(1000),
            Some(claimed_at),
        )?;
        let config = event.config.clone();

        ledger.claims.insert(address);
        ledger.tokens.push(token.clone());
        Ok((token, config))
    }

    async fn deactivate_event(&self, id: &EventId, authority: &Pubkey) -> Result<()> {
        let mut ledger = self.inner.write().await;
        ledger.event_mut(id)?.config.deactivate(authority)
    }

    async fn tokens_of(&self, owner: &Pubkey) -> Result<Vec<CompressedToken>> {
        simulate_latency(self.fetch_latency).await;

        let ledger = self.inner.read().await;
        let samples = self.samples.iter().cloned().map(|mut token| {
            token.owner = *owner;
            token
        });
        let owned = ledger
            .tokens
            .iter()
            .filter(|token| token.owner == *owner)
            .cloned();

        Ok(samples.chain(owned).collect())
    }
}

fn sample_tokens() -> Result<Vec<CompressedToken>> {
    let now = chrono::Utc::now().timestamp_millis();
    let sample = |id: &str, mint: u8, name: &str, symbol: &str, description: &str, date: &str, age: i64| {
        CompressedToken::new(
            id.to_owned(),
            Pubkey::new_from_array([mint; 32]),
            TokenMetadata {
                name: name.to_owned(),
                symbol: symbol.to_owned(),
                description: description.to_owned(),
                image: None,
                attributes: vec![
                    TokenAttribute::new(crate::constants::ATTR_EVENT, name),
                    TokenAttribute::new(crate::constants::ATTR_DATE, date),
                ],
            },
            Pubkey::default(),
            now - age,
            None,
        )
    };

    [
        sample(
            "token-1",
            1,
            "Tech Conference 2023",
            "TECH23",
            "Proof of attendance for Tech Conference 2023",
            "2023-06-15",
            1_000_000,
        ),
        sample(
            "token-2",
            2,
            "Blockchain Workshop",
            "BLKW",
            "Participation token for Blockchain Workshop",
            "2023-07-22",
            500_000,
        ),
    ]
    .into_iter()
    .collect()
}
