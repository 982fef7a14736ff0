pub const EVENT_SEED: &[u8] = b"event";
pub const CLAIM_SEED: &[u8] = b"claim";

pub const MAX_EVENT_NAME_LEN: usize = 100;
pub const MAX_EVENT_DESCRIPTION_LEN: usize = 500;

pub const DEFAULT_ID_LEN: usize = 21;
pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the tree and signature segments of an event id.
pub const EVENT_ID_SEGMENT_LEN: usize = 8;

pub const TOKEN_SYMBOL: &str = "CPOP";
pub const DEFAULT_TOKEN_IMAGE: &str = "https://example.com/token-image.png";

pub const ATTR_EVENT: &str = "Event";
pub const ATTR_DATE: &str = "Date";
pub const ATTR_SUPPLY: &str = "Supply";

pub const CLAIM_PATH: &str = "claim";
pub const CLAIM_PARAM_MINT: &str = "mint";
pub const CLAIM_PARAM_EVENT: &str = "event";
pub const CLAIM_PARAM_CHECK: &str = "check";
pub const CLAIM_CHECKSUM_BYTES: usize = 8;

pub const DEFAULT_MINT_LATENCY_MS: u64 = 2000;
pub const DEFAULT_CLAIM_LATENCY_MS: u64 = 2000;
pub const DEFAULT_FETCH_LATENCY_MS: u64 = 1000;
pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_CLUSTER_ENDPOINT: &str = "https://api.devnet.solana.com";
pub const DEFAULT_COMMITMENT: &str = "confirmed";
pub const DEFAULT_CLAIM_BASE_URL: &str = "https://cpop.app";

pub const DATE_FORMAT: &str = "%Y-%m-%d";
