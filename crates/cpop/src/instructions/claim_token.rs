use anchor_lang::prelude::*;
use solana_sdk::instruction::Instruction;
use solana_sdk::system_program;

use super::instruction_data;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq)]
pub struct ClaimTokenArgs {}

pub fn claim_token(event: Pubkey, claimer: Pubkey) -> Instruction {
    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(event, false),
            AccountMeta::new(claimer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data("claim_token", &ClaimTokenArgs {}),
    }
}
