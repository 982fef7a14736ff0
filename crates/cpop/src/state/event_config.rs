use anchor_lang::prelude::*;

use crate::errors::CpopError;
use crate::state::{EventId, TokenMetadata};

/// Mirror of the cPOP program's event account.
#[account]
#[derive(InitSpace, Debug, PartialEq)]
pub struct EventConfig {
    pub creator: Pubkey,
    #[max_len(100)]
    pub event_name: String,
    #[max_len(500)]
    pub event_description: String,
    pub token_supply: u64,
    pub tokens_claimed: u64,
    pub is_active: bool,
    pub created_at: i64,
}

impl EventConfig {
    pub fn new(
        creator: Pubkey,
        event_name: String,
        event_description: String,
        token_supply: u64,
        created_at: i64,
    ) -> Self {
        Self {
            creator,
            event_name,
            event_description,
            token_supply,
            tokens_claimed: 0,
            is_active: true,
            created_at,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.token_supply.saturating_sub(self.tokens_claimed)
    }

    pub fn can_claim(&self) -> bool {
        self.is_active && self.remaining() > 0
    }

    pub fn ensure_claimable(&self) -> crate::Result<()> {
        if !self.is_active {
            return Err(CpopError::EventInactive);
        }
        if self.remaining() == 0 {
            return Err(CpopError::NoTokensLeft);
        }
        Ok(())
    }

    pub fn record_claim(&mut self) -> crate::Result<()> {
        self.ensure_claimable()?;
        self.tokens_claimed = self
            .tokens_claimed
            .checked_add(1)
            .ok_or(CpopError::NoTokensLeft)?;
        Ok(())
    }

    pub fn deactivate(&mut self, authority: &Pubkey) -> crate::Result<()> {
        if self.creator != *authority {
            return Err(CpopError::Unauthorized);
        }
        self.is_active = false;
        Ok(())
    }

    /// Decodes raw account data, rejecting anything without the event
    /// account discriminator.
    pub fn from_account_data(data: &[u8]) -> crate::Result<Self> {
        let mut slice = data;
        EventConfig::try_deserialize(&mut slice)
            .map_err(|e| CpopError::Chain(format!("invalid event account: {e}")))
    }

    pub fn to_account_data(&self) -> crate::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(8 + EventConfig::INIT_SPACE);
        self.try_serialize(&mut data)
            .map_err(|e| CpopError::Chain(format!("event account encoding failed: {e}")))?;
        Ok(data)
    }
}

/// An event as the ledger knows it.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub id: EventId,
    pub address: Pubkey,
    pub config: EventConfig,
    pub metadata: TokenMetadata,
}
