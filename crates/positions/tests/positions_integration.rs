//! Position rollups end to end: a mixed-status ledger through the paged,
//! parallel fold into finalized rows.

use std::sync::Arc;

use pinaka_core::{
    MaterializedView, OrderFilter, OrderRecord, OrderSide, OrderStatus, PositionsConfig,
};
use pinaka_data::MemoryStore;
use pinaka_positions::{compute_positions, PositionDirection, PositionView};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn config() -> PositionsConfig {
    PositionsConfig {
        page_size: 3,
        parallelism: 2,
    }
}

fn desk_ledger() -> Arc<MemoryStore> {
    let store = MemoryStore::open();
    let orders = vec![
        OrderRecord::filled("NIFTY24DEC22000CE", "alice", OrderSide::Buy, dec!(75), dec!(120.5)),
        OrderRecord::filled("NIFTY24DEC22000CE", "alice", OrderSide::Sell, dec!(50), dec!(131)),
        OrderRecord::pending("NIFTY24DEC22000CE", "alice", OrderSide::Sell, dec!(25), Some(dec!(140))),
        OrderRecord::filled("BANKNIFTY", "bob", OrderSide::Sell, dec!(30), dec!(48200)),
        OrderRecord::pending("BANKNIFTY", "bob", OrderSide::Buy, dec!(30), None),
        OrderRecord::filled("BANKNIFTY", "carol", OrderSide::Buy, dec!(15), dec!(48000))
            .with_status(OrderStatus::Cancelled),
        OrderRecord::filled("NIFTY24DEC22000CE", "alice", OrderSide::Buy, dec!(25), dec!(118))
            .with_status(OrderStatus::Rejected),
    ];
    store.extend_orders(orders);
    Arc::new(store)
}

#[tokio::test]
async fn desk_positions() {
    let store = desk_ledger();
    let output = compute_positions(&*store, &OrderFilter::all(), &config()).await.unwrap();
    assert_eq!(output.report.orders_scanned, 7);

    let keys: Vec<_> = output
        .rows
        .iter()
        .map(|p| (p.symbol.as_str(), p.user_id.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("BANKNIFTY", "bob"),
            ("BANKNIFTY", "carol"),
            ("NIFTY24DEC22000CE", "alice"),
        ]
    );

    let bob = &output.rows[0];
    assert_eq!(bob.direction, PositionDirection::Short);
    assert_eq!(bob.open_buy_orders, 1);
    assert_eq!(bob.open_buy_value, Decimal::ZERO);
    assert_eq!(bob.open_buy_avg_price, Some(Decimal::ZERO));

    let carol = &output.rows[1];
    assert_eq!(carol.direction, PositionDirection::Flat);
    assert_eq!(carol.total_buy_quantity, Decimal::ZERO);

    let alice = &output.rows[2];
    assert_eq!(alice.net_position, dec!(25));
    assert_eq!(alice.realized_pnl, dec!(525));
    assert_eq!(alice.open_sell_quantity, dec!(25));
    assert_eq!(alice.open_sell_avg_price, Some(dec!(140)));
}

#[tokio::test]
async fn view_tracks_ledger_growth() {
    let store = desk_ledger();
    let mut view = PositionView::new(
        store.clone(),
        OrderFilter::all().symbol("BANKNIFTY").user("bob"),
        config(),
    );
    view.refresh().await.unwrap();
    assert_eq!(view.rows()[0].net_position, dec!(-30));

    store.append_order(OrderRecord::filled("BANKNIFTY", "bob", OrderSide::Buy, dec!(30), dec!(48100)));
    store.append_order(OrderRecord::filled("BANKNIFTY", "alice", OrderSide::Buy, dec!(1), dec!(1)));
    view.refresh().await.unwrap();

    assert_eq!(view.rows().len(), 1);
    let bob = &view.rows()[0];
    assert_eq!(bob.direction, PositionDirection::Flat);
    assert_eq!(bob.realized_pnl, dec!(3000));

    view.invalidate();
    let report = view.refresh().await.unwrap();
    assert_eq!(report.orders_scanned, 3);
    assert_eq!(view.rows()[0].realized_pnl, dec!(3000));
}
