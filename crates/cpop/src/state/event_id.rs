use std::fmt;
use std::str::FromStr;

use anchor_lang::prelude::Pubkey;

use crate::constants::EVENT_ID_SEGMENT_LEN;
use crate::errors::CpopError;

/// Claim key of an event: `<tree>-<signature>-<unix millis>`.
///
/// The first segment is the leading characters of the merkle tree address
/// holding the event's tokens, the second the leading characters of the
/// creation transaction signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId {
    tree: String,
    signature: String,
    created_at: u64,
}

impl EventId {
    pub fn new(tree: &Pubkey, signature: &str, created_at: u64) -> crate::Result<Self> {
        let tree = tree.to_string();
        let id = Self {
            tree: truncate(&tree),
            signature: truncate(signature),
            created_at,
        };
        id.validate()?;
        Ok(id)
    }

    pub fn tree_prefix(&self) -> &str {
        &self.tree
    }

    pub fn signature_prefix(&self) -> &str {
        &self.signature
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    fn validate(&self) -> crate::Result<()> {
        if is_segment(&self.tree) && is_segment(&self.signature) {
            Ok(())
        } else {
            Err(CpopError::MalformedEventId(self.to_string()))
        }
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(EVENT_ID_SEGMENT_LEN).collect()
}

fn is_segment(s: &str) -> bool {
    s.len() == EVENT_ID_SEGMENT_LEN && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.tree, self.signature, self.created_at)
    }
}

impl FromStr for EventId {
    type Err = CpopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CpopError::MalformedEventId(s.to_owned());

        let mut parts = s.split('-');
        let (Some(tree), Some(signature), Some(created_at), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if !is_segment(tree) || !is_segment(signature) {
            return Err(malformed());
        }
        if created_at.is_empty() || !created_at.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let created_at = created_at.parse().map_err(|_| malformed())?;

        Ok(Self {
            tree: tree.to_owned(),
            signature: signature.to_owned(),
            created_at,
        })
    }
}
