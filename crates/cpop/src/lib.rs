//! Client core for cPOP: compressed proof-of-participation tokens.
//!
//! Creators mint an event through [`service::TokenService`], share the
//! resulting [`claim_link::ClaimLink`] (usually as a QR code), and attendees
//! claim through the same service. [`store::TokenStore`] keeps the connected
//! wallet's collection current for whatever presentation layer sits on top.

use anchor_lang::prelude::*;

pub mod analytics;
pub mod claim_link;
pub mod cluster;
pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod nanoid;
pub mod repository;
pub mod service;
pub mod settings;
pub mod state;
pub mod store;
pub mod wallet;

pub use errors::{CpopError, ErrorKind};

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

pub type Result<T> = std::result::Result<T, CpopError>;
