use thiserror::Error;

#[derive(Debug, Error)]
pub enum CpopError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Connected wallet cannot sign transactions")]
    WalletCannotSign,

    #[error("Event name cannot be empty")]
    EventNameEmpty,

    #[error("Event name exceeds maximum length")]
    EventNameTooLong,

    #[error("Event description cannot be empty")]
    EventDescriptionEmpty,

    #[error("Event description exceeds maximum length")]
    EventDescriptionTooLong,

    #[error("Token supply must be greater than zero")]
    InvalidTokenSupply,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid event ID format: {0}")]
    MalformedEventId(String),

    #[error("Invalid claim link: {0}")]
    MalformedClaimLink(String),

    #[error("Claim link checksum does not match its contents")]
    ClaimLinkTampered,

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Event is not active")]
    EventInactive,

    #[error("No tokens left to claim")]
    NoTokensLeft,

    #[error("Token already claimed by this wallet")]
    AlreadyClaimed,

    #[error("Unauthorized: signer is not the event creator")]
    Unauthorized,

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Token verification failed for {0}: the metadata may have been tampered with")]
    VerificationMismatch(String),

    #[error("Transaction signing failed: {0}")]
    Signing(String),

    #[error("Network or chain failure: {0}")]
    Chain(String),

    #[error("Hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Coarse classification used by callers deciding how to present a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    WalletNotConnected,
    InvalidInput,
    MalformedClaimTarget,
    Rejected,
    NetworkOrChainFailure,
    VerificationMismatch,
    Configuration,
}

impl CpopError {
    pub fn kind(&self) -> ErrorKind {
        use CpopError::*;

        match self {
            WalletNotConnected | WalletCannotSign => ErrorKind::WalletNotConnected,
            EventNameEmpty
            | EventNameTooLong
            | EventDescriptionEmpty
            | EventDescriptionTooLong
            | InvalidTokenSupply
            | InvalidPublicKey(_) => ErrorKind::InvalidInput,
            MalformedEventId(_) | MalformedClaimLink(_) | ClaimLinkTampered => {
                ErrorKind::MalformedClaimTarget
            }
            EventNotFound(_) | EventInactive | NoTokensLeft | AlreadyClaimed | Unauthorized
            | TokenNotFound(_) => ErrorKind::Rejected,
            Signing(_) | Chain(_) | Hashing(_) => ErrorKind::NetworkOrChainFailure,
            VerificationMismatch(_) => ErrorKind::VerificationMismatch,
            Config(_) => ErrorKind::Configuration,
        }
    }
}
