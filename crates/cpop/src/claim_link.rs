//! Claim links shared from creator to attendee, typically as a QR code.
//!
//! Format: `<base>/claim?mint=<event id>&event=<event name>[&check=<hex>]`.
//! Values are percent-encoded the way `encodeURIComponent` does it. `check`
//! is optional so links produced without it stay valid.

use light_hasher::{Hasher, Sha256};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::constants::*;
use crate::errors::CpopError;
use crate::settings::ClaimSettings;
use crate::state::EventId;
use crate::Result;

const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimLink {
    pub event_id: String,
    pub event_name: String,
}

impl ClaimLink {
    pub fn new(event_id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: event_name.into(),
        }
    }

    pub fn for_event(event_id: &EventId, event_name: &str) -> Self {
        Self::new(event_id.to_string(), event_name)
    }

    pub fn encode(&self, base: &str, with_checksum: bool) -> Result<String> {
        if self.event_id.is_empty() || self.event_name.is_empty() {
            return Err(CpopError::MalformedClaimLink(
                "event id and name are required".to_owned(),
            ));
        }
        Url::parse(base).map_err(|e| CpopError::MalformedClaimLink(format!("{base}: {e}")))?;

        let mut link = format!(
            "{}/{}?{}={}&{}={}",
            base.trim_end_matches('/'),
            CLAIM_PATH,
            CLAIM_PARAM_MINT,
            utf8_percent_encode(&self.event_id, URI_COMPONENT),
            CLAIM_PARAM_EVENT,
            utf8_percent_encode(&self.event_name, URI_COMPONENT),
        );
        if with_checksum {
            link.push_str(&format!("&{}={}", CLAIM_PARAM_CHECK, self.checksum()?));
        }
        Ok(link)
    }

    pub fn encode_with(&self, settings: &ClaimSettings) -> Result<String> {
        self.encode(&settings.base_url, settings.include_checksum)
    }

    /// Validates a scanned or pasted link. Nothing may be claimed from a link
    /// this rejects. The path must end in the claim page; any prefix before it
    /// is accepted, matching bases that carry a path.
    pub fn decode(link: &str) -> Result<Self> {
        let url = Url::parse(link.trim())
            .map_err(|e| CpopError::MalformedClaimLink(format!("not a URL: {e}")))?;

        let page = url
            .path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last());
        if page != Some(CLAIM_PATH) {
            return Err(CpopError::MalformedClaimLink(format!(
                "not a claim link: {}",
                url.path()
            )));
        }

        let mut mint = None;
        let mut event = None;
        let mut check = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                CLAIM_PARAM_MINT => mint = Some(value.into_owned()),
                CLAIM_PARAM_EVENT => event = Some(value.into_owned()),
                CLAIM_PARAM_CHECK => check = Some(value.into_owned()),
                _ => {}
            }
        }

        let event_id = mint
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CpopError::MalformedClaimLink(format!("missing `{CLAIM_PARAM_MINT}`")))?;
        let event_name = event
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CpopError::MalformedClaimLink(format!("missing `{CLAIM_PARAM_EVENT}`")))?;

        let claim = Self {
            event_id,
            event_name,
        };
        if let Some(check) = check {
            if !check.eq_ignore_ascii_case(&claim.checksum()?) {
                return Err(CpopError::ClaimLinkTampered);
            }
        }
        Ok(claim)
    }

    pub fn checksum(&self) -> Result<String> {
        let digest = Sha256::hashv(&[self.event_id.as_bytes(), &[0u8], self.event_name.as_bytes()])
            .map_err(|e| CpopError::Hashing(e.to_string()))?;
        Ok(hex::encode(&digest[..CLAIM_CHECKSUM_BYTES]))
    }

    pub fn event_id(&self) -> Result<EventId> {
        self.event_id.parse()
    }
}
