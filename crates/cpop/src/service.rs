use std::sync::Arc;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tokio::sync::{broadcast, OnceCell};

use crate::cluster::Cluster;
use crate::constants::*;
use crate::errors::CpopError;
use crate::events::{EventCreated, EventDeactivated, LedgerEvent, TokenClaimed};
use crate::instructions;
use crate::nanoid;
use crate::repository::TokenRepository;
use crate::settings::Settings;
use crate::state::{EventConfig, EventId, EventRecord, Token, TokenMetadata};
use crate::wallet::WalletSigner;
use crate::Result;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Merkle tree the service's compressed tokens are appended to. Created on
/// first mint and reused afterwards.
#[derive(Debug)]
pub struct TreeConfig {
    pub tree_keypair: Keypair,
    pub merkle_tree: Pubkey,
}

/// Mint, claim and fetch for compressed event tokens.
pub struct TokenService {
    repository: Arc<dyn TokenRepository>,
    cluster: Arc<dyn Cluster>,
    confirmation_timeout: Duration,
    id_length: usize,
    tree: OnceCell<TreeConfig>,
    events: broadcast::Sender<LedgerEvent>,
}

impl TokenService {
    pub fn new(
        repository: Arc<dyn TokenRepository>,
        cluster: Arc<dyn Cluster>,
        settings: &Settings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repository,
            cluster,
            confirmation_timeout: settings.confirmation_timeout(),
            id_length: settings.ids.length,
            tree: OnceCell::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub fn repository(&self) -> &Arc<dyn TokenRepository> {
        &self.repository
    }

    /// Creates an event and its token set, returning the event's claim key.
    ///
    /// Confirmation of the creation transaction is bounded by the configured
    /// timeout. Submission and confirmation failures are logged and the
    /// event is created regardless; signing failures abort.
    pub async fn mint(
        &self,
        wallet: &dyn WalletSigner,
        event_name: &str,
        event_description: &str,
        token_supply: u64,
    ) -> Result<EventId> {
        validate_event(event_name, event_description, token_supply)?;

        let creator = wallet.pubkey();
        let tree = self.tree().await;
        let now = chrono::Utc::now();
        let created_millis = now.timestamp_millis().max(0) as u64;
        let date = now.format(DATE_FORMAT).to_string();
        let metadata = TokenMetadata::for_event(event_name, event_description, &date, token_supply);
        log::info!("Creating compressed token for event: {event_name}");

        let (event, _bump) = instructions::event_address(&creator, rand::random());
        let ix = instructions::initialize_event(
            event,
            creator,
            event_name,
            event_description,
            token_supply,
        );
        let tx = self.signed_transaction(wallet, ix).await?;

        let (signature_part, confirmed) = match self.cluster.send_transaction(&tx).await {
            Ok(signature) => {
                let confirmed = self.await_confirmation(&signature).await;
                (signature.to_string(), confirmed)
            }
            Err(e) => {
                log::warn!("Transaction error: {e}; proceeding with event creation");
                (nanoid::generate(EVENT_ID_SEGMENT_LEN), false)
            }
        };

        let event_id = EventId::new(&tree.merkle_tree, &signature_part, created_millis)?;
        let config = EventConfig::new(
            creator,
            event_name.to_owned(),
            event_description.to_owned(),
            token_supply,
            now.timestamp(),
        );
        self.repository
            .insert_event(EventRecord {
                id: event_id.clone(),
                address: event,
                config,
                metadata,
            })
            .await?;

        log::info!("Event created: {event_id} ({token_supply} tokens)");
        self.emit(LedgerEvent::EventCreated(EventCreated {
            event_id: event_id.clone(),
            event,
            creator,
            event_name: event_name.to_owned(),
            token_supply,
            confirmed,
        }));
        Ok(event_id)
    }

    /// Claims one token of `event_id` for `wallet`. Fails before anything is
    /// submitted when the id is malformed or the event cannot be claimed.
    pub async fn claim(&self, wallet: &dyn WalletSigner, event_id: &str) -> Result<Signature> {
        let event_id: EventId = event_id.trim().parse()?;
        let claimer = wallet.pubkey();

        let record = self.require_event(&event_id).await?;
        record.config.ensure_claimable()?;
        if self.repository.has_claimed(&event_id, &claimer).await? {
            return Err(CpopError::AlreadyClaimed);
        }

        log::debug!("Claiming compressed token for event {event_id} by {claimer}");
        let ix = instructions::claim_token(record.address, claimer);
        let tx = self.signed_transaction(wallet, ix).await?;
        let signature = self.cluster.send_transaction(&tx).await?;
        self.cluster.confirm_transaction(&signature).await?;

        let claimed_at = chrono::Utc::now().timestamp_millis();
        let (token, config) = self
            .repository
            .record_claim(&event_id, claimer, claimed_at)
            .await?;

        log::info!("Token claimed! Signature: {signature}");
        self.emit(LedgerEvent::TokenClaimed(TokenClaimed {
            event_id,
            claimer,
            token_id: token.id,
            tokens_claimed: config.tokens_claimed,
        }));
        Ok(signature)
    }

    /// Sample tokens plus everything `owner` created or claimed, oldest first.
    pub async fn fetch(&self, owner: &Pubkey) -> Result<Vec<Token>> {
        let tokens = self.repository.tokens_of(owner).await?;
        log::debug!("Fetched tokens: {}", tokens.len());
        Ok(tokens.iter().map(|token| token.to_token()).collect())
    }

    pub async fn event_details(&self, event_id: &str) -> Result<EventRecord> {
        let event_id: EventId = event_id.trim().parse()?;
        self.require_event(&event_id).await
    }

    /// Stops further claims. Only the creator may do this.
    pub async fn deactivate(&self, wallet: &dyn WalletSigner, event_id: &str) -> Result<()> {
        let event_id: EventId = event_id.trim().parse()?;
        let creator = wallet.pubkey();

        let record = self.require_event(&event_id).await?;
        if record.config.creator != creator {
            return Err(CpopError::Unauthorized);
        }

        let ix = instructions::deactivate_event(record.address, creator);
        let tx = self.signed_transaction(wallet, ix).await?;
        let signature = self.cluster.send_transaction(&tx).await?;
        self.cluster.confirm_transaction(&signature).await?;
        self.repository.deactivate_event(&event_id, &creator).await?;

        log::info!("Event deactivated: {}", record.config.event_name);
        self.emit(LedgerEvent::EventDeactivated(EventDeactivated { event_id, creator }));
        Ok(())
    }

    /// Checks a token's metadata against the digest recorded when it was
    /// minted. This is a local integrity check, not a proof against chain
    /// state.
    pub async fn verify(&self, owner: &Pubkey, token_id: &str) -> Result<bool> {
        let tokens = self.repository.tokens_of(owner).await?;
        let token = tokens
            .iter()
            .find(|token| token.id == token_id)
            .ok_or_else(|| CpopError::TokenNotFound(token_id.to_owned()))?;
        token.verify_metadata()
    }

    /// Random display id of the configured length.
    pub fn display_id(&self) -> String {
        nanoid::generate(self.id_length)
    }

    async fn tree(&self) -> &TreeConfig {
        self.tree
            .get_or_init(|| async {
                let tree_keypair = Keypair::new();
                let merkle_tree = Signer::pubkey(&tree_keypair);
                log::info!("Creating simulated merkle tree {merkle_tree} for compressed tokens");
                TreeConfig {
                    tree_keypair,
                    merkle_tree,
                }
            })
            .await
    }

    async fn require_event(&self, event_id: &EventId) -> Result<EventRecord> {
        self.repository
            .event(event_id)
            .await?
            .ok_or_else(|| CpopError::EventNotFound(event_id.to_string()))
    }

    async fn signed_transaction(
        &self,
        wallet: &dyn WalletSigner,
        ix: Instruction,
    ) -> Result<Transaction> {
        let payer = wallet.pubkey();
        let blockhash = self.cluster.latest_blockhash().await?;
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        wallet.sign_transaction(&mut tx, blockhash)?;
        Ok(tx)
    }

    async fn await_confirmation(&self, signature: &Signature) -> bool {
        match tokio::time::timeout(
            self.confirmation_timeout,
            self.cluster.confirm_transaction(signature),
        )
        .await
        {
            Ok(Ok(())) => {
                log::info!("Compressed token minted! Signature: {signature}");
                true
            }
            Ok(Err(e)) => {
                log::warn!("Transaction confirmation error: {e}; continuing");
                false
            }
            Err(_) => {
                log::warn!(
                    "Transaction {signature} not confirmed within {:?}; continuing",
                    self.confirmation_timeout
                );
                false
            }
        }
    }

    fn emit(&self, event: LedgerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

pub fn validate_event(event_name: &str, event_description: &str, token_supply: u64) -> Result<()> {
    if event_name.trim().is_empty() {
        return Err(CpopError::EventNameEmpty);
    }
    if event_name.len() > MAX_EVENT_NAME_LEN {
        return Err(CpopError::EventNameTooLong);
    }
    if event_description.trim().is_empty() {
        return Err(CpopError::EventDescriptionEmpty);
    }
    if event_description.len() > MAX_EVENT_DESCRIPTION_LEN {
        return Err(CpopError::EventDescriptionTooLong);
    }
    if token_supply == 0 {
        return Err(CpopError::InvalidTokenSupply);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_order_and_bounds() {
        assert!(matches!(validate_event("", "d", 1), Err(CpopError::EventNameEmpty)));
        assert!(matches!(validate_event("  ", "d", 1), Err(CpopError::EventNameEmpty)));
        assert!(matches!(
            validate_event("n", "", 1),
            Err(CpopError::EventDescriptionEmpty)
        ));
        assert!(matches!(validate_event("n", "d", 0), Err(CpopError::InvalidTokenSupply)));
        assert!(matches!(
            validate_event(&"x".repeat(MAX_EVENT_NAME_LEN + 1), "d", 1),
            Err(CpopError::EventNameTooLong)
        ));
        assert!(matches!(
            validate_event("n", &"x".repeat(MAX_EVENT_DESCRIPTION_LEN + 1), 1),
            Err(CpopError::EventDescriptionTooLong)
        ));
        assert!(validate_event("DevCon", "desc", 50).is_ok());
    }
}
