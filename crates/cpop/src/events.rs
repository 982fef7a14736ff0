use anchor_lang::prelude::Pubkey;

use crate::state::EventId;

/// State changes announced by the token service once they have been recorded.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerEvent {
    EventCreated(EventCreated),
    TokenClaimed(TokenClaimed),
    EventDeactivated(EventDeactivated),
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventCreated {
    pub event_id: EventId,
    pub event: Pubkey,
    pub creator: Pubkey,
    pub event_name: String,
    pub token_supply: u64,
    /// `false` when the creation transaction was not confirmed in time.
    pub confirmed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TokenClaimed {
    pub event_id: EventId,
    pub claimer: Pubkey,
    pub token_id: String,
    pub tokens_claimed: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventDeactivated {
    pub event_id: EventId,
    pub creator: Pubkey,
}
