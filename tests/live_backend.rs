//! Tests against a running TradeDesk backend.
//!
//! All tests are `#[ignore]` because they need the backend up (by default on
//! `localhost:8000`, override with `TRADEDESK_API_URL` / `TRADEDESK_WS_URL`
//! in the environment or a `.env` file) and at least one instrument listed.
//! Each test registers its own throwaway user since every REST route
//! besides auth needs a session.
//!
//! Run with:
//! ```bash
//! cargo test --test live_backend -- --ignored --nocapture
//! ```

use std::time::Duration;

use tokio::time::timeout;
use tradedesk_sdk::prelude::*;

const TEST_TIMEOUT: Duration = Duration::from_secs(15);

fn client() -> TradingClient {
    dotenvy::dotenv().ok();
    TradingClientBuilder::from_env()
        .build()
        .expect("client should build")
}

async fn first_symbol(client: &TradingClient) -> Symbol {
    let instruments = client
        .instruments()
        .list()
        .await
        .expect("list instruments");
    instruments
        .into_iter()
        .find(|i| i.is_active)
        .expect("backend has no active instruments")
        .symbol
}

/// Register a throwaway user and log in as them.
async fn logged_in(client: &TradingClient) {
    let email = format!("sdk-{}@example.com", rand::random::<u32>());
    let password = "sdk-test-password";
    client
        .auth()
        .register(&email, password)
        .await
        .expect("register");
    client
        .auth()
        .login(&email, password)
        .await
        .expect("login");
}

#[tokio::test]
#[ignore]
async fn instruments_are_listed_and_cached() {
    let client = client();
    logged_in(&client).await;
    let symbol = first_symbol(&client).await;

    let instrument = client.instruments().get(&symbol).await.expect("get");
    assert_eq!(instrument.symbol, symbol);
    println!("{} @ {}", instrument.symbol, instrument.current_price);
}

#[tokio::test]
#[ignore]
async fn session_lifecycle() {
    let client = client();
    logged_in(&client).await;
    assert!(client.auth().is_authenticated().await);

    let account = client.accounts().me().await.expect("account");
    println!("cash balance: {}", account.cash_balance);

    let orders = client.orders().list().await.expect("orders");
    println!("{} orders on record", orders.len());

    client.auth().logout().await.expect("logout");
    assert!(!client.auth().is_authenticated().await);
}

#[tokio::test]
#[ignore]
async fn market_order_is_accepted() {
    let client = client();
    logged_in(&client).await;
    let symbol = first_symbol(&client).await;

    let order = NewOrder::market(symbol.clone(), Side::Buy, 1);
    let placed = client.orders().place(&order).await.expect("place order");
    assert_eq!(placed.side, Side::Buy);
    assert_eq!(placed.quantity, 1);
    println!("order {} is {:?}", placed.id, placed.status);
}

#[tokio::test]
#[ignore]
async fn market_stream_delivers_a_book() {
    let client = client();
    logged_in(&client).await;
    let symbol = first_symbol(&client).await;

    let stream = client.market_stream();
    let mut sub = stream.subscribe(symbol.clone());

    let view = timeout(TEST_TIMEOUT, async {
        loop {
            let view = sub.current();
            if view.order_book.is_ready() {
                return view;
            }
            sub.changed().await.expect("feed stopped");
        }
    })
    .await
    .expect("timed out waiting for a snapshot");

    assert!(view.connection.is_open());
    println!(
        "{}: bid {:?} ask {:?} last {:?}",
        symbol,
        view.order_book.best_bid(),
        view.order_book.best_ask(),
        view.ticker.price
    );

    stream.unsubscribe(sub);
    stream.shutdown().await;
    assert!(stream.active_symbols().is_empty());
}
