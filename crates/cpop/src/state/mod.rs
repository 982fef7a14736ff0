//! Client-side data model

pub mod claim_record;
pub mod event_config;
pub mod event_id;
pub mod token;

pub use claim_record::*;
pub use event_config::*;
pub use event_id::*;
pub use token::*;
