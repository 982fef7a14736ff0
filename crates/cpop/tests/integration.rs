use std::sync::Arc;

use cpop::claim_link::ClaimLink;
use cpop::cluster::{ConfirmationMode, LocalCluster};
use cpop::events::LedgerEvent;
use cpop::repository::{MemoryRepository, TokenRepository};
use cpop::service::TokenService;
use cpop::settings::Settings;
use cpop::wallet::WatchOnlyWallet;
use cpop::{CpopError, ErrorKind};
use solana_sdk::signature::{Keypair, Signer};

struct Harness {
    service: TokenService,
    repository: Arc<MemoryRepository>,
    cluster: Arc<LocalCluster>,
}

fn harness_with(cluster: LocalCluster, settings: Settings) -> Harness {
    let repository = Arc::new(MemoryRepository::empty());
    let cluster = Arc::new(cluster);
    let service = TokenService::new(repository.clone(), cluster.clone(), &settings);
    Harness {
        service,
        repository,
        cluster,
    }
}

fn harness() -> Harness {
    harness_with(LocalCluster::new(), Settings::instant())
}

#[tokio::test]
async fn test_mint_event() {
    let h = harness();
    let creator = Keypair::new();

    let event_id = h.service.mint(&creator, "DevCon", "desc", 50).await.unwrap();
    println!("minted event: {event_id}");
    assert!(!event_id.to_string().is_empty());
    assert_eq!(h.cluster.submitted_count().await, 1);

    let tokens = h.service.fetch(&creator.pubkey()).await.unwrap();
    let token = tokens.iter().find(|t| t.id == event_id.to_string()).unwrap();
    assert_eq!(token.event, "DevCon");
    assert!(!token.claimed);

    let record = h.service.event_details(&event_id.to_string()).await.unwrap();
    assert_eq!(record.config.token_supply, 50);
    assert_eq!(record.config.tokens_claimed, 0);
    assert!(record.config.is_active);
}

#[tokio::test]
async fn test_mint_ids_are_fresh() {
    let h = harness();
    let creator = Keypair::new();

    let first = h.service.mint(&creator, "DevCon", "desc", 50).await.unwrap();
    let second = h.service.mint(&creator, "DevCon", "desc", 50).await.unwrap();
    assert_ne!(first, second);
    assert_eq!(h.repository.event_count().await, 2);
}

#[tokio::test]
async fn test_mint_validation() {
    let h = harness();
    let creator = Keypair::new();

    let err = h.service.mint(&creator, "", "desc", 50).await.unwrap_err();
    assert!(matches!(err, CpopError::EventNameEmpty));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = h.service.mint(&creator, "DevCon", "desc", 0).await.unwrap_err();
    assert!(matches!(err, CpopError::InvalidTokenSupply));
    assert_eq!(h.cluster.submitted_count().await, 0);
}

#[tokio::test]
async fn test_mint_survives_stalled_confirmation() {
    let mut settings = Settings::instant();
    settings.cluster.confirmation_timeout_ms = 20;
    let h = harness_with(LocalCluster::with_confirmation(ConfirmationMode::Stall), settings);
    let mut events = h.service.subscribe();

    let creator = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap();

    match events.recv().await.unwrap() {
        LedgerEvent::EventCreated(created) => {
            assert_eq!(created.event_id, event_id);
            assert!(!created.confirmed);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_mint_survives_unreachable_cluster() {
    let h = harness();
    h.cluster.set_reject_sends(true).await;

    let creator = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap();
    assert_eq!(h.cluster.submitted_count().await, 0);
    assert!(h.service.event_details(&event_id.to_string()).await.is_ok());
}

#[tokio::test]
async fn test_watch_only_wallet_cannot_mint() {
    let h = harness();
    let wallet = WatchOnlyWallet(Keypair::new().pubkey());

    let err = h.service.mint(&wallet, "DevCon", "desc", 5).await.unwrap_err();
    assert!(matches!(err, CpopError::WalletCannotSign));
    assert_eq!(h.repository.event_count().await, 0);
}

#[tokio::test]
async fn test_claim_token() {
    let h = harness();
    let creator = Keypair::new();
    let attendee = Keypair::new();

    let event_id = h.service.mint(&creator, "DevCon", "desc", 50).await.unwrap();
    let mut events = h.service.subscribe();

    let sig = h
        .service
        .claim(&attendee, &event_id.to_string())
        .await
        .unwrap();
    println!("claim tx: {sig:?}");

    let tokens = h.service.fetch(&attendee.pubkey()).await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].event, "DevCon");
    assert!(tokens[0].claimed);
    assert!(tokens[0].claimed_at.is_some());

    let record = h.service.event_details(&event_id.to_string()).await.unwrap();
    assert_eq!(record.config.tokens_claimed, 1);

    match events.recv().await.unwrap() {
        LedgerEvent::TokenClaimed(claimed) => {
            assert_eq!(claimed.claimer, attendee.pubkey());
            assert_eq!(claimed.tokens_claimed, 1);
            assert_eq!(claimed.token_id, tokens[0].id);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_claim_through_link() {
    let h = harness();
    let creator = Keypair::new();
    let attendee = Keypair::new();

    let event_id = h.service.mint(&creator, "Dev Con & Friends", "desc", 2).await.unwrap();
    let link = ClaimLink::for_event(&event_id, "Dev Con & Friends")
        .encode_with(&Settings::default().claim)
        .unwrap();

    let decoded = ClaimLink::decode(&link).unwrap();
    assert_eq!(decoded.event_id().unwrap(), event_id);
    h.service.claim(&attendee, &decoded.event_id).await.unwrap();
}

#[tokio::test]
async fn test_claim_malformed_id() {
    let h = harness();
    let creator = Keypair::new();
    let attendee = Keypair::new();
    h.service.mint(&creator, "DevCon", "desc", 50).await.unwrap();
    let before = h.cluster.submitted_count().await;

    let err = h.service.claim(&attendee, "not-a-real-id").await.unwrap_err();
    assert!(matches!(err, CpopError::MalformedEventId(_)));
    assert_eq!(err.kind(), ErrorKind::MalformedClaimTarget);

    assert!(h.service.fetch(&attendee.pubkey()).await.unwrap().is_empty());
    assert_eq!(h.cluster.submitted_count().await, before);
}

#[tokio::test]
async fn test_claim_unknown_event() {
    let h = harness();
    let err = h
        .service
        .claim(&Keypair::new(), "ABCDEFGH-12345678-1700000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, CpopError::EventNotFound(_)));
    assert_eq!(h.cluster.submitted_count().await, 0);
}

#[tokio::test]
async fn test_claim_twice_rejected() {
    let h = harness();
    let creator = Keypair::new();
    let attendee = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 50).await.unwrap().to_string();

    h.service.claim(&attendee, &event_id).await.unwrap();
    let err = h.service.claim(&attendee, &event_id).await.unwrap_err();
    assert!(matches!(err, CpopError::AlreadyClaimed));
    assert_eq!(err.kind(), ErrorKind::Rejected);

    assert_eq!(h.service.fetch(&attendee.pubkey()).await.unwrap().len(), 1);
    let record = h.service.event_details(&event_id).await.unwrap();
    assert_eq!(record.config.tokens_claimed, 1);
}

#[tokio::test]
async fn test_claim_supply_exhausted() {
    let h = harness();
    let creator = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 1).await.unwrap().to_string();

    h.service.claim(&Keypair::new(), &event_id).await.unwrap();
    let err = h.service.claim(&Keypair::new(), &event_id).await.unwrap_err();
    assert!(matches!(err, CpopError::NoTokensLeft));
}

#[tokio::test]
async fn test_deactivate_event() {
    let h = harness();
    let creator = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 50).await.unwrap().to_string();

    // Only the creator may deactivate
    let err = h.service.deactivate(&Keypair::new(), &event_id).await.unwrap_err();
    assert!(matches!(err, CpopError::Unauthorized));

    h.service.deactivate(&creator, &event_id).await.unwrap();
    assert!(!h.service.event_details(&event_id).await.unwrap().config.is_active);

    let err = h.service.claim(&Keypair::new(), &event_id).await.unwrap_err();
    assert!(matches!(err, CpopError::EventInactive));
}

#[tokio::test]
async fn test_claim_fails_when_confirmation_fails() {
    let h = harness();
    let creator = Keypair::new();
    let attendee = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap().to_string();

    h.cluster.set_confirmation(ConfirmationMode::Fail).await;
    let err = h.service.claim(&attendee, &event_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkOrChainFailure);
    assert!(!h
        .repository
        .has_claimed(&event_id.parse().unwrap(), &attendee.pubkey())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_claim_retry_after_failed_confirmation() {
    let h = harness();
    let creator = Keypair::new();
    let attendee = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap().to_string();

    h.cluster.set_confirmation(ConfirmationMode::Fail).await;
    let err = h.service.claim(&attendee, &event_id).await.unwrap_err();
    println!("first attempt: {err:?}");

    // Cluster recovers, the same claim goes through
    h.cluster.set_confirmation(ConfirmationMode::Confirm).await;
    h.service.claim(&attendee, &event_id).await.unwrap();

    let tokens = h.service.fetch(&attendee.pubkey()).await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].claimed);
    let record = h.service.event_details(&event_id).await.unwrap();
    assert_eq!(record.config.tokens_claimed, 1);
}

#[tokio::test]
async fn test_deactivate_retry_after_failed_confirmation() {
    let h = harness();
    let creator = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap().to_string();

    h.cluster.set_confirmation(ConfirmationMode::Fail).await;
    assert!(h.service.deactivate(&creator, &event_id).await.is_err());
    assert!(h.service.event_details(&event_id).await.unwrap().config.is_active);

    h.cluster.set_confirmation(ConfirmationMode::Confirm).await;
    h.service.deactivate(&creator, &event_id).await.unwrap();
    assert!(!h.service.event_details(&event_id).await.unwrap().config.is_active);
}

#[tokio::test]
async fn test_same_attendee_claims_events_from_one_creator() {
    let h = harness();
    let creator = Keypair::new();
    let attendee = Keypair::new();

    let first = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap().to_string();
    let second = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap().to_string();
    let first_address = h.service.event_details(&first).await.unwrap().address;
    let second_address = h.service.event_details(&second).await.unwrap().address;
    assert_ne!(first_address, second_address);

    h.service.claim(&attendee, &first).await.unwrap();
    h.service.claim(&attendee, &second).await.unwrap();
    assert_eq!(h.service.fetch(&attendee.pubkey()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_verify_token() {
    let h = harness();
    let creator = Keypair::new();
    let event_id = h.service.mint(&creator, "DevCon", "desc", 5).await.unwrap().to_string();

    assert!(h.service.verify(&creator.pubkey(), &event_id).await.unwrap());
    let err = h
        .service
        .verify(&creator.pubkey(), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, CpopError::TokenNotFound(_)));
}

#[tokio::test]
async fn test_fetch_includes_samples() {
    let mut settings = Settings::instant();
    settings.ledger.seed_sample_tokens = true;
    let repository = Arc::new(MemoryRepository::new(&settings.ledger).unwrap());
    let service = TokenService::new(repository, Arc::new(LocalCluster::new()), &settings);

    let owner = Keypair::new();
    let tokens = service.fetch(&owner.pubkey()).await.unwrap();
    let names: Vec<_> = tokens.iter().map(|t| t.event.as_str()).collect();
    assert_eq!(names, vec!["Tech Conference 2023", "Blockchain Workshop"]);
}

#[test]
fn test_display_id_length() {
    let mut settings = Settings::instant();
    settings.ids.length = 12;
    let service = TokenService::new(
        Arc::new(MemoryRepository::empty()),
        Arc::new(LocalCluster::new()),
        &settings,
    );
    assert_eq!(service.display_id().len(), 12);
}
