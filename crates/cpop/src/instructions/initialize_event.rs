use anchor_lang::prelude::*;
use solana_sdk::instruction::Instruction;
use solana_sdk::system_program;

use super::instruction_data;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq)]
pub struct InitializeEventArgs {
    pub event_name: String,
    pub event_description: String,
    pub token_supply: u64,
}

pub fn initialize_event(
    event: Pubkey,
    creator: Pubkey,
    event_name: &str,
    event_description: &str,
    token_supply: u64,
) -> Instruction {
    let args = InitializeEventArgs {
        event_name: event_name.to_owned(),
        event_description: event_description.to_owned(),
        token_supply,
    };

    Instruction {
        program_id: crate::ID,
        accounts: vec![
            AccountMeta::new(event, false),
            AccountMeta::new(creator, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data("initialize_event", &args),
    }
}
