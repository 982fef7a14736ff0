use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tokio::sync::RwLock;

use crate::errors::CpopError;
use crate::Result;

/// Transaction submission to a Solana cluster.
#[async_trait]
pub trait Cluster: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature>;

    /// Resolves once `signature` reaches the configured commitment. May never
    /// resolve; callers that cannot wait apply their own timeout.
    async fn confirm_transaction(&self, signature: &Signature) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConfirmationMode {
    #[default]
    Confirm,
    Fail,
    Stall,
}

/// Blockhashes a transaction may reference before it is rejected as
/// expired.
const MAX_RECENT_BLOCKHASHES: usize = 150;

/// In-process cluster: checks signatures, keeps every accepted transaction.
/// Every `latest_blockhash` call produces a new blockhash, so a resubmitted
/// instruction signs to a new transaction.
pub struct LocalCluster {
    inner: RwLock<LocalClusterState>,
}

#[derive(Default)]
struct LocalClusterState {
    confirmation: ConfirmationMode,
    reject_sends: bool,
    recent_blockhashes: VecDeque<Hash>,
    submitted: HashMap<Signature, Transaction>,
    order: Vec<Signature>,
}

impl Default for LocalCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCluster {
    pub fn new() -> Self {
        Self::with_confirmation(ConfirmationMode::Confirm)
    }

    pub fn with_confirmation(confirmation: ConfirmationMode) -> Self {
        Self {
            inner: RwLock::new(LocalClusterState {
                confirmation,
                ..Default::default()
            }),
        }
    }

    pub async fn set_confirmation(&self, mode: ConfirmationMode) {
        self.inner.write().await.confirmation = mode;
    }

    /// Makes every following `send_transaction` fail as if the RPC node were
    /// unreachable.
    pub async fn set_reject_sends(&self, reject: bool) {
        self.inner.write().await.reject_sends = reject;
    }

    pub async fn submitted(&self) -> Vec<Transaction> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|sig| inner.submitted.get(sig).cloned())
            .collect()
    }

    pub async fn submitted_count(&self) -> usize {
        self.inner.read().await.order.len()
    }
}

#[async_trait]
impl Cluster for LocalCluster {
    async fn latest_blockhash(&self) -> Result<Hash> {
        let blockhash = Hash::new_unique();
        let mut inner = self.inner.write().await;
        inner.recent_blockhashes.push_back(blockhash);
        if inner.recent_blockhashes.len() > MAX_RECENT_BLOCKHASHES {
            inner.recent_blockhashes.pop_front();
        }
        Ok(blockhash)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let mut inner = self.inner.write().await;
        if inner.reject_sends {
            return Err(CpopError::Chain("cluster unreachable".to_owned()));
        }
        if !inner.recent_blockhashes.contains(&tx.message.recent_blockhash) {
            return Err(CpopError::Chain("blockhash not found".to_owned()));
        }
        tx.verify()
            .map_err(|e| CpopError::Chain(format!("signature verification failed: {e}")))?;

        let signature = *tx
            .signatures
            .first()
            .ok_or_else(|| CpopError::Chain("transaction has no signatures".to_owned()))?;
        if inner.submitted.contains_key(&signature) {
            return Err(CpopError::Chain("transaction already processed".to_owned()));
        }

        inner.submitted.insert(signature, tx.clone());
        inner.order.push(signature);
        log::debug!("Transaction accepted: {signature}");
        Ok(signature)
    }

    async fn confirm_transaction(&self, signature: &Signature) -> Result<()> {
        let mode = {
            let inner = self.inner.read().await;
            if !inner.submitted.contains_key(signature) {
                return Err(CpopError::Chain(format!("unknown signature {signature}")));
            }
            inner.confirmation
        };

        match mode {
            ConfirmationMode::Confirm => Ok(()),
            ConfirmationMode::Fail => Err(CpopError::Chain(format!(
                "transaction {signature} failed to confirm"
            ))),
            ConfirmationMode::Stall => std::future::pending().await,
        }
    }
}
