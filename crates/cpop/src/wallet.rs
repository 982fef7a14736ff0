use std::str::FromStr;
use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use solana_sdk::hash::Hash;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;
use tokio::sync::watch;

use crate::errors::CpopError;
use crate::Result;

/// Signing capability of a connected wallet.
pub trait WalletSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Adds this wallet's signature to `tx`. Other required signatures are
    /// left untouched.
    fn sign_transaction(&self, tx: &mut Transaction, blockhash: Hash) -> Result<()>;

    fn sign_all_transactions(&self, txs: &mut [Transaction], blockhash: Hash) -> Result<()> {
        for tx in txs.iter_mut() {
            self.sign_transaction(tx, blockhash)?;
        }
        Ok(())
    }
}

impl WalletSigner for Keypair {
    fn pubkey(&self) -> Pubkey {
        Signer::pubkey(self)
    }

    fn sign_transaction(&self, tx: &mut Transaction, blockhash: Hash) -> Result<()> {
        tx.try_partial_sign(&[self], blockhash)
            .map_err(|e| CpopError::Signing(e.to_string()))
    }
}

/// A wallet that exposes its address but cannot sign.
#[derive(Clone, Copy, Debug)]
pub struct WatchOnlyWallet(pub Pubkey);

impl WalletSigner for WatchOnlyWallet {
    fn pubkey(&self) -> Pubkey {
        self.0
    }

    fn sign_transaction(&self, _tx: &mut Transaction, _blockhash: Hash) -> Result<()> {
        Err(CpopError::WalletCannotSign)
    }
}

#[derive(Clone)]
pub struct Provider {
    pub public_key: Pubkey,
    pub signer: Arc<dyn WalletSigner>,
}

impl Provider {
    pub fn new(signer: Arc<dyn WalletSigner>) -> Self {
        Self {
            public_key: signer.pubkey(),
            signer,
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Connection state of the user's wallet, observable by the rest of the app.
#[derive(Clone)]
pub struct WalletAdapter {
    inner: Arc<watch::Sender<Option<Provider>>>,
}

impl Default for WalletAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletAdapter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    pub fn connect(&self, signer: Arc<dyn WalletSigner>) -> Provider {
        let provider = Provider::new(signer);
        log::info!("Wallet connected: {}", provider.public_key);
        self.inner.send_replace(Some(provider.clone()));
        provider
    }

    pub fn disconnect(&self) {
        if let Some(previous) = self.inner.send_replace(None) {
            log::info!("Wallet disconnected: {}", previous.public_key);
        }
    }

    pub fn provider(&self) -> Option<Provider> {
        self.inner.borrow().clone()
    }

    pub fn require_provider(&self) -> Result<Provider> {
        self.provider().ok_or(CpopError::WalletNotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Provider>> {
        self.inner.subscribe()
    }
}

pub fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address.trim()).map_err(|_| CpopError::InvalidPublicKey(address.to_owned()))
}

/// `ABCD...WXYZ` style abbreviation for display.
pub fn shorten_address(address: &str, chars: usize) -> String {
    let len = address.chars().count();
    if len <= chars * 2 {
        return address.to_owned();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(len - chars).collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::{AccountMeta, Instruction};

    fn memo_tx(payer: &Pubkey) -> Transaction {
        let ix = Instruction {
            program_id: crate::ID,
            accounts: vec![AccountMeta::new(*payer, true)],
            data: vec![1, 2, 3],
        };
        Transaction::new_with_payer(&[ix], Some(payer))
    }

    #[test]
    fn keypair_signs() {
        let keypair = Keypair::new();
        let mut tx = memo_tx(&WalletSigner::pubkey(&keypair));
        keypair.sign_transaction(&mut tx, Hash::new_unique()).unwrap();
        assert!(tx.is_signed());
        assert!(tx.verify().is_ok());
    }

    #[test]
    fn watch_only_refuses() {
        let wallet = WatchOnlyWallet(Pubkey::new_unique());
        let mut tx = memo_tx(&wallet.0);
        let err = wallet.sign_transaction(&mut tx, Hash::new_unique()).unwrap_err();
        assert!(matches!(err, CpopError::WalletCannotSign));
    }

    #[test]
    fn sign_all_signs_every_transaction() {
        let keypair = Keypair::new();
        let payer = WalletSigner::pubkey(&keypair);
        let mut txs = vec![memo_tx(&payer), memo_tx(&payer)];
        keypair.sign_all_transactions(&mut txs, Hash::new_unique()).unwrap();
        assert!(txs.iter().all(|tx| tx.is_signed()));
    }

    #[test]
    fn adapter_tracks_connection() {
        let adapter = WalletAdapter::new();
        assert!(!adapter.is_connected());
        assert!(matches!(
            adapter.require_provider().unwrap_err(),
            CpopError::WalletNotConnected
        ));

        let keypair = Arc::new(Keypair::new());
        let expected = WalletSigner::pubkey(keypair.as_ref());
        let provider = adapter.connect(keypair);
        assert_eq!(provider.public_key, expected);
        assert_eq!(adapter.provider().unwrap().public_key, expected);

        adapter.disconnect();
        assert!(adapter.provider().is_none());
    }

    #[test]
    fn parse_rejects_garbage() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_pubkey(&key.to_string()).unwrap(), key);
        assert!(matches!(
            parse_pubkey("not a key").unwrap_err(),
            CpopError::InvalidPublicKey(_)
        ));
    }

    #[test]
    fn shortens_long_addresses_only() {
        assert_eq!(shorten_address("ABCDEFGHIJKLMNOP", 4), "ABCD...MNOP");
        assert_eq!(shorten_address("ABCDEFGH", 4), "ABCDEFGH");
    }
}
