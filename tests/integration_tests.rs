use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use wallet_ledger::account::{Account, AccountType};
use wallet_ledger::asset::Asset;
use wallet_ledger::config::EngineConfig;
use wallet_ledger::engine::Engine;
use wallet_ledger::error::CoreError;
use wallet_ledger::orchestrator::MovementRequest;
use wallet_ledger::store::memory::MemoryStore;

async fn seeded_engine() -> (Engine, Account) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), EngineConfig::default());

    let asset = Asset::new("GOLD_COIN", "Gold Coin", 2);
    engine.create_asset(asset.clone()).await.unwrap();

    let treasury = Account::new_system(AccountType::SystemTreasury, "Treasury");
    let bonus_pool = Account::new_system(AccountType::SystemBonus, "Bonus Pool");
    let revenue = Account::new_system(AccountType::SystemRevenue, "Revenue");
    engine.create_account(treasury.clone()).await.unwrap();
    engine.create_account(bonus_pool).await.unwrap();
    engine.create_account(revenue).await.unwrap();

    let user = Account::new_user("user_001", "User One");
    engine.create_account(user.clone()).await.unwrap();

    // Seed fixture balances directly, bypassing the ledger write path — these
    // scenarios assume a pre-existing treasury and starting user balance, not
    // a movement the engine itself recorded.
    store.seed_balance(treasury.id, asset.id, dec!(10_000_000));
    store.seed_balance(user.id, asset.id, dec!(500));

    (engine, user)
}

fn request(key: &str, amount: Decimal) -> MovementRequest {
    MovementRequest {
        user_id: "user_001".to_string(),
        asset_code: "GOLD_COIN".to_string(),
        amount,
        idempotency_key: key.to_string(),
        description: "test movement".to_string(),
        extra: json!({}),
    }
}

#[tokio::test]
async fn top_up_then_duplicate_returns_same_transaction() {
    let (engine, _user) = seeded_engine().await;

    let first = engine.top_up(request("k1", dec!(100))).await.unwrap();
    assert_eq!(first["newBalance"], json!("600"));

    let second = engine.top_up(request("k1", dec!(100))).await.unwrap();
    assert_eq!(first["transactionId"], second["transactionId"]);
    assert_eq!(second["newBalance"], json!("600"));

    let balances = engine.get_all_balances("user_001").await.unwrap();
    let gold = balances.iter().find(|b| b.asset_code == "GOLD_COIN").unwrap();
    assert_eq!(gold.balance, dec!(600));
}

#[tokio::test]
async fn purchase_after_top_up_moves_into_revenue() {
    let (engine, _user) = seeded_engine().await;

    engine.top_up(request("k1", dec!(100))).await.unwrap();
    let response = engine
        .purchase(MovementRequest {
            extra: json!({"item": "Epic Shield"}),
            ..request("k2", dec!(25))
        })
        .await
        .unwrap();
    assert_eq!(response["newBalance"], json!("575"));

    let balances = engine.get_all_balances("user_001").await.unwrap();
    let gold = balances.iter().find(|b| b.asset_code == "GOLD_COIN").unwrap();
    assert_eq!(gold.balance, dec!(575));
}

#[tokio::test]
async fn purchase_exceeding_balance_fails_without_side_effects() {
    let (engine, _user) = seeded_engine().await;

    let result = engine.purchase(request("k3", dec!(10_000))).await;
    assert!(matches!(result, Err(CoreError::InsufficientFunds)));

    let balances = engine.get_all_balances("user_001").await.unwrap();
    let gold = balances.iter().find(|b| b.asset_code == "GOLD_COIN").unwrap();
    assert_eq!(gold.balance, dec!(500));
}

#[tokio::test]
async fn zero_and_negative_amounts_are_rejected() {
    let (engine, _user) = seeded_engine().await;

    let zero = engine.top_up(request("k-zero", dec!(0))).await;
    assert!(matches!(zero, Err(CoreError::ValidationError(_))));

    let negative = engine.top_up(request("k-neg", dec!(-5))).await;
    assert!(matches!(negative, Err(CoreError::ValidationError(_))));
}

#[tokio::test]
async fn fifty_concurrent_top_ups_all_succeed_exactly_once() {
    let (engine, _user) = seeded_engine().await;
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for i in 0..50 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .top_up(request(&format!("k-topup-{i}"), dec!(10)))
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let balances = engine.get_all_balances("user_001").await.unwrap();
    let gold = balances.iter().find(|b| b.asset_code == "GOLD_COIN").unwrap();
    assert_eq!(gold.balance, dec!(1000));

    let history = engine.get_history("user_001", 100, 0).await.unwrap();
    assert_eq!(history.len(), 50);
}

#[tokio::test]
async fn ten_concurrent_calls_with_the_same_key_collapse_to_one_transaction() {
    let (engine, _user) = seeded_engine().await;
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.top_up(request("k-same", dec!(100))).await
        }));
    }

    let mut transaction_ids = std::collections::HashSet::new();
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        transaction_ids.insert(response["transactionId"].to_string());
    }

    assert_eq!(transaction_ids.len(), 1);

    let balances = engine.get_all_balances("user_001").await.unwrap();
    let gold = balances.iter().find(|b| b.asset_code == "GOLD_COIN").unwrap();
    assert_eq!(gold.balance, dec!(600));
}

#[tokio::test]
async fn reused_key_with_different_amount_is_a_conflict() {
    let (engine, _user) = seeded_engine().await;

    engine
        .purchase(MovementRequest {
            extra: json!({"item": "Epic Shield"}),
            ..request("k2", dec!(25))
        })
        .await
        .unwrap();

    let result = engine
        .purchase(MovementRequest {
            extra: json!({"item": "Epic Shield"}),
            ..request("k2", dec!(30))
        })
        .await;

    assert!(matches!(result, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn unknown_asset_code_is_not_found() {
    let (engine, _user) = seeded_engine().await;

    let result = engine
        .top_up(MovementRequest {
            asset_code: "DIAMOND".to_string(),
            ..request("k-unknown", dec!(10))
        })
        .await;

    assert!(matches!(result, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn get_balance_resolves_by_user_id_and_asset_code() {
    let (engine, _user) = seeded_engine().await;

    let balance = engine.get_balance("user_001", "GOLD_COIN").await.unwrap();
    assert_eq!(balance.asset_code, "GOLD_COIN");
    assert_eq!(balance.asset_name, "Gold Coin");
    assert_eq!(balance.balance, dec!(500));

    engine.top_up(request("k1", dec!(100))).await.unwrap();
    let balance = engine.get_balance("user_001", "GOLD_COIN").await.unwrap();
    assert_eq!(balance.balance, dec!(600));
}

#[tokio::test]
async fn get_balance_for_unknown_asset_is_not_found() {
    let (engine, _user) = seeded_engine().await;

    let result = engine.get_balance("user_001", "DIAMOND").await;
    assert!(matches!(result, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn history_is_ordered_newest_first_and_respects_limit() {
    let (engine, _user) = seeded_engine().await;

    engine.top_up(request("h1", dec!(10))).await.unwrap();
    engine.top_up(request("h2", dec!(10))).await.unwrap();
    engine.top_up(request("h3", dec!(10))).await.unwrap();

    let history = engine.get_history("user_001", 2, 0).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].transaction.created_at >= history[1].transaction.created_at);
}
