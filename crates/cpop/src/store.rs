//! Session-scoped token state shared by every screen.
//!
//! The store follows the wallet adapter: connecting loads the wallet's
//! collection, disconnecting clears it. Within a session fetches never
//! overlap; a refresh requested while one is running waits for it and then
//! fetches again, so results land in the order they complete. A fetch from
//! an ended session never delays the next one.

use std::sync::{Arc, Weak};

use anchor_lang::prelude::Pubkey;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::analytics::TokenStats;
use crate::claim_link::ClaimLink;
use crate::errors::CpopError;
use crate::service::TokenService;
use crate::state::{EventId, Token};
use crate::wallet::{Provider, WalletAdapter};
use crate::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Loading,
    Ready,
    Error,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenState {
    pub status: SessionStatus,
    pub owner: Option<Pubkey>,
    pub tokens: Vec<Token>,
    /// Message of the most recent failure, until cleared or superseded.
    pub error: Option<String>,
    /// Mint, claim and other actions currently running.
    pub actions_in_flight: usize,
    /// Bumped on every connect and disconnect.
    pub epoch: u64,
}

impl TokenState {
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Loading || self.actions_in_flight > 0
    }
}

#[derive(Default)]
struct Session {
    provider: Option<Provider>,
    epoch: u64,
    fetch_gate: Arc<tokio::sync::Mutex<()>>,
}

pub struct TokenStore {
    service: Arc<TokenService>,
    wallet: WalletAdapter,
    session: Mutex<Session>,
    state: watch::Sender<TokenState>,
}

impl TokenStore {
    pub fn new(service: Arc<TokenService>, wallet: WalletAdapter) -> Self {
        let (state, _) = watch::channel(TokenState::default());
        Self {
            service,
            wallet,
            session: Mutex::new(Session::default()),
            state,
        }
    }

    pub fn service(&self) -> &Arc<TokenService> {
        &self.service
    }

    pub fn wallet(&self) -> &WalletAdapter {
        &self.wallet
    }

    pub fn subscribe(&self) -> watch::Receiver<TokenState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TokenState {
        self.state.borrow().clone()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.state.borrow().tokens.clone()
    }

    pub fn stats(&self) -> TokenStats {
        TokenStats::from_tokens(&self.state.borrow().tokens)
    }

    /// Keeps the store in step with the wallet adapter until either is
    /// dropped. Session loads run on their own tasks and never delay the
    /// next adapter change.
    pub fn spawn_wallet_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let mut changes = self.wallet.subscribe();
        tokio::spawn(async move {
            loop {
                let Some(current) = store.upgrade() else {
                    break;
                };
                if current.apply_wallet() {
                    tokio::spawn(async move { current.refresh().await });
                } else {
                    drop(current);
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Applies the adapter's current connection state and, when a new
    /// session started, waits for its first load.
    pub async fn sync_wallet(&self) {
        if self.apply_wallet() {
            self.refresh().await;
        }
    }

    /// Starts or ends the session to match the adapter. Returns whether a
    /// new session needs its tokens loaded.
    fn apply_wallet(&self) -> bool {
        let Some(provider) = self.wallet.provider() else {
            self.end_session();
            return false;
        };

        let mut session = self.session.lock();
        let same_wallet = session
            .provider
            .as_ref()
            .is_some_and(|current| current.public_key == provider.public_key);
        if same_wallet {
            return false;
        }
        session.epoch += 1;
        session.fetch_gate = Arc::default();
        let epoch = session.epoch;
        let owner = provider.public_key;
        session.provider = Some(provider);

        log::debug!("Session {epoch} started for {owner}");
        self.state.send_replace(TokenState {
            status: SessionStatus::Loading,
            owner: Some(owner),
            epoch,
            ..Default::default()
        });
        true
    }

    fn end_session(&self) {
        let mut session = self.session.lock();
        let had_session = session.provider.take().is_some();
        if had_session {
            session.epoch += 1;
        }
        let epoch = session.epoch;
        self.state.send_if_modified(|state| {
            let cleared = TokenState {
                epoch,
                ..Default::default()
            };
            if *state == cleared {
                return false;
            }
            *state = cleared;
            true
        });
    }

    /// The connected wallet and its session epoch. A missing wallet is
    /// reported in the state.
    fn require_session(&self) -> Result<(Provider, u64)> {
        let session = self.session.lock();
        match &session.provider {
            Some(provider) => Ok((provider.clone(), session.epoch)),
            None => {
                let error = CpopError::WalletNotConnected;
                let message = error.to_string();
                self.state.send_modify(|state| state.error = Some(message));
                Err(error)
            }
        }
    }

    /// Re-fetches the connected wallet's tokens. Does nothing while
    /// disconnected. Failures are stored in the state, not returned.
    pub async fn refresh(&self) {
        let (provider, epoch, fetch_gate) = {
            let session = self.session.lock();
            let Some(provider) = session.provider.clone() else {
                return;
            };
            (provider, session.epoch, session.fetch_gate.clone())
        };

        let _gate = fetch_gate.lock().await;
        if !self.is_current(epoch) {
            return;
        }
        self.update(epoch, |state| {
            state.status = SessionStatus::Loading;
            state.error = None;
        });

        let result = self.service.fetch(&provider.public_key).await;
        self.update(epoch, |state| match result {
            Ok(tokens) => {
                state.tokens = tokens;
                state.status = SessionStatus::Ready;
            }
            Err(e) => {
                log::error!("Error fetching tokens: {e}");
                state.error = Some(e.to_string());
                state.status = SessionStatus::Error;
            }
        });
    }

    pub async fn mint_tokens(
        &self,
        event_name: &str,
        event_description: &str,
        token_supply: u64,
    ) -> Result<EventId> {
        let (provider, epoch) = self.require_session()?;

        self.begin_action(epoch);
        let result = self
            .service
            .mint(
                provider.signer.as_ref(),
                event_name,
                event_description,
                token_supply,
            )
            .await;
        self.end_action(epoch);

        match result {
            Ok(event_id) => {
                self.refresh().await;
                Ok(event_id)
            }
            Err(e) => {
                log::error!("Error minting tokens: {e}");
                self.record_error(epoch, &e);
                Err(e)
            }
        }
    }

    /// Returns whether the claim went through. On failure the reason is in
    /// the state's `error`.
    pub async fn claim_token(&self, event_id: &str) -> bool {
        let Ok((provider, epoch)) = self.require_session() else {
            return false;
        };

        self.begin_action(epoch);
        let result = self.service.claim(provider.signer.as_ref(), event_id).await;
        self.end_action(epoch);

        match result {
            Ok(signature) => {
                log::debug!("Claim {signature} recorded, refreshing");
                self.refresh().await;
                true
            }
            Err(e) => {
                log::error!("Error claiming token: {e}");
                self.record_error(epoch, &e);
                false
            }
        }
    }

    /// Claims from a scanned or pasted claim link. A link that does not
    /// decode is reported without any claim being attempted.
    pub async fn claim_from_link(&self, link: &str) -> bool {
        let Ok((_, epoch)) = self.require_session() else {
            return false;
        };

        match ClaimLink::decode(link) {
            Ok(claim) => self.claim_token(&claim.event_id).await,
            Err(e) => {
                log::warn!("Rejected claim link: {e}");
                self.record_error(epoch, &e);
                false
            }
        }
    }

    pub async fn deactivate_event(&self, event_id: &str) -> bool {
        let Ok((provider, epoch)) = self.require_session() else {
            return false;
        };

        self.begin_action(epoch);
        let result = self
            .service
            .deactivate(provider.signer.as_ref(), event_id)
            .await;
        self.end_action(epoch);

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Error deactivating event: {e}");
                self.record_error(epoch, &e);
                false
            }
        }
    }

    pub async fn verify_token(&self, token_id: &str) -> bool {
        let Ok((provider, epoch)) = self.require_session() else {
            return false;
        };

        match self.service.verify(&provider.public_key, token_id).await {
            Ok(true) => true,
            Ok(false) => {
                self.record_error(epoch, &CpopError::VerificationMismatch(token_id.to_owned()));
                false
            }
            Err(e) => {
                self.record_error(epoch, &e);
                false
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.session.lock().epoch == epoch
    }

    /// Applies `f` unless the session that produced the update has ended.
    /// The session lock is held so a concurrent disconnect cannot interleave.
    fn update(&self, epoch: u64, f: impl FnOnce(&mut TokenState)) {
        let session = self.session.lock();
        if session.epoch != epoch {
            log::debug!("Dropping update from ended session {epoch}");
            return;
        }
        self.state.send_modify(f);
    }

    fn record_error(&self, epoch: u64, error: &CpopError) {
        let message = error.to_string();
        self.update(epoch, |state| state.error = Some(message));
    }

    fn begin_action(&self, epoch: u64) {
        self.update(epoch, |state| {
            state.actions_in_flight += 1;
            state.error = None;
        });
    }

    fn end_action(&self, epoch: u64) {
        self.update(epoch, |state| {
            state.actions_in_flight = state.actions_in_flight.saturating_sub(1);
        });
    }
}
