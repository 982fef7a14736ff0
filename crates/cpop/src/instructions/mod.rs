//! Client-side builders for the cPOP program's instructions.

pub mod claim_token;
pub mod deactivate_event;
pub mod initialize_event;

pub use claim_token::*;
pub use deactivate_event::*;
pub use initialize_event::*;

use anchor_lang::prelude::*;
use anchor_lang::solana_program::hash::hash;

use crate::constants::EVENT_SEED;

/// Anchor's instruction discriminator: first 8 bytes of `sha256("global:<name>")`.
pub fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("global:{name}");
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    discriminator
}

pub(crate) fn instruction_data<T: AnchorSerialize>(name: &str, args: &T) -> Vec<u8> {
    let mut data = sighash(name).to_vec();
    // Writing into a Vec cannot fail.
    let _ = args.serialize(&mut data);
    data
}

/// Event account address for `creator`'s event seeded with `nonce`. Each
/// mint draws a fresh nonce.
pub fn event_address(creator: &Pubkey, nonce: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[EVENT_SEED, creator.as_ref(), &nonce.to_le_bytes()],
        &crate::ID,
    )
}
