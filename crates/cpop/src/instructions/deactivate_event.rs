use anchor_lang::prelude::*;
use solana_sdk::instruction::Instruction;

use super::instruction_data;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq)]
pub struct DeactivateEventArgs {}

/// Only the event's creator may sign this.
pub fn deactivate_event(event: Pubkey, creator: Pubkey) -> Instruction {
    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(event, false),
            AccountMeta::new_readonly(creator, true),
        ],
        data: instruction_data("deactivate_event", &DeactivateEventArgs {}),
    }
}
