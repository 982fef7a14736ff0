use anchor_lang::prelude::*;
use light_hasher::{Hasher, Sha256};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::errors::CpopError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenAttribute {
    pub trait_type: String,
    pub value: String,
}

impl TokenAttribute {
    pub fn new(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_owned(),
            value: value.into(),
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: Option<String>,
    pub attributes: Vec<TokenAttribute>,
}

impl TokenMetadata {
    /// Metadata of a freshly created event token.
    pub fn for_event(event_name: &str, event_description: &str, date: &str, supply: u64) -> Self {
        Self {
            name: event_name.to_owned(),
            symbol: TOKEN_SYMBOL.to_owned(),
            description: event_description.to_owned(),
            image: Some(DEFAULT_TOKEN_IMAGE.to_owned()),
            attributes: vec![
                TokenAttribute::new(ATTR_EVENT, event_name),
                TokenAttribute::new(ATTR_DATE, date),
                TokenAttribute::new(ATTR_SUPPLY, supply.to_string()),
            ],
        }
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.trait_type == trait_type)
            .map(|attr| attr.value.as_str())
    }

    /// Sha256 over the Borsh encoding of every field.
    pub fn digest(&self) -> crate::Result<[u8; 32]> {
        let mut bytes = Vec::new();
        self.serialize(&mut bytes)
            .map_err(|e| CpopError::Hashing(e.to_string()))?;
        Sha256::hash(&bytes).map_err(|e| CpopError::Hashing(e.to_string()))
    }
}

/// A compressed token as the ledger stores it.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedToken {
    pub id: String,
    pub mint: Pubkey,
    pub metadata: TokenMetadata,
    pub owner: Pubkey,
    /// Unix millis at which the token was minted.
    pub created_at: i64,
    /// Unix millis at which the owner claimed it, for claimed tokens.
    pub claimed_at: Option<i64>,
    pub metadata_hash: [u8; 32],
}

impl CompressedToken {
    pub fn new(
        id: String,
        mint: Pubkey,
        metadata: TokenMetadata,
        owner: Pubkey,
        created_at: i64,
        claimed_at: Option<i64>,
    ) -> crate::Result<Self> {
        let metadata_hash = metadata.digest()?;
        Ok(Self {
            id,
            mint,
            metadata,
            owner,
            created_at,
            claimed_at,
            metadata_hash,
        })
    }

    /// True when the metadata still hashes to the digest recorded at mint.
    pub fn verify_metadata(&self) -> crate::Result<bool> {
        Ok(self.metadata.digest()? == self.metadata_hash)
    }

    pub fn to_token(&self) -> Token {
        let event = self
            .metadata
            .attribute(ATTR_EVENT)
            .unwrap_or(&self.metadata.name)
            .to_owned();
        let date = self
            .metadata
            .attribute(ATTR_DATE)
            .map(str::to_owned)
            .unwrap_or_else(|| chrono::Utc::now().format(DATE_FORMAT).to_string());

        Token {
            id: self.id.clone(),
            name: self.metadata.name.clone(),
            event,
            date,
            image: self.metadata.image.clone(),
            claimed: self.claimed_at.is_some(),
            claimed_at: self.claimed_at,
            created_at: self.created_at,
        }
    }
}

/// What the presentation layer renders for each token in a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub name: String,
    pub event: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub claimed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}
