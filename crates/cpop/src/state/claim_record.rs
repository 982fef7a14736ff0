//! Claim marker for preventing repeated claims

use anchor_lang::prelude::*;
use light_sdk::address::v2::derive_address;
use light_sdk::LightDiscriminator;

use crate::constants::CLAIM_SEED;
use crate::state::EventId;

/// Compressed account recording that `claimer` received a token of `event`.
///
/// Its address is derived from the event id and the claimer, so it exists
/// at most once per pair. The address doubles as the claimed token's id.
#[derive(Debug, Clone, Default, PartialEq, AnchorSerialize, AnchorDeserialize, LightDiscriminator)]
pub struct ClaimRecord {
    pub event: Pubkey,
    pub claimer: Pubkey,
    pub claimed_at: i64,
}

pub fn address_tree() -> Pubkey {
    Pubkey::new_from_array(light_sdk_types::ADDRESS_TREE_V2)
}

pub fn claim_address(event_id: &EventId, claimer: &Pubkey) -> [u8; 32] {
    let event_id = event_id.to_string();
    let (address, _seed) = derive_address(
        &[CLAIM_SEED, event_id.as_bytes(), claimer.as_ref()],
        &address_tree(),
        &crate::ID,
    );
    address
}

impl ClaimRecord {
    pub fn address(&self, event_id: &EventId) -> [u8; 32] {
        claim_address(event_id, &self.claimer)
    }

    pub fn token_id(&self, event_id: &EventId) -> String {
        Pubkey::new_from_array(self.address(event_id)).to_string()
    }
}
