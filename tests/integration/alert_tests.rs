// Alert behavior across consecutive scans sharing one alert set.

use super::*;
use std::sync::Arc as StdArc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use shelfwatch::alerts::AlertSet;
use shelfwatch::coordinator::ScanCoordinator;
use shelfwatch::events::{EventSink, MonitorEvent};

async fn scan_with(
    shop_html: String,
    alerts: &StdArc<AsyncMutex<AlertSet>>,
    rx_events: &mut Vec<MonitorEvent>,
) -> anyhow::Result<()> {
    let mut routes = admin_routes("901", &[("11", "anna")]);
    routes.push((shop_route("11"), shop_html));
    let page = FakePage::new(routes);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = test_config(vec![admin("A", "901")], &["w1"]);
    let coordinator = ScanCoordinator::new(&config, EventSink::new(tx));

    coordinator
        .run(&page, &config.admins, alerts, &CancellationToken::new())
        .await?;

    while let Ok(event) = rx.try_recv() {
        rx_events.push(event);
    }
    Ok(())
}

fn count_alerts(events: &[MonitorEvent]) -> (usize, usize) {
    let out_of_stock = events
        .iter()
        .filter(|e| matches!(e, MonitorEvent::OutOfStockAlert { .. }))
        .count();
    let restocked = events
        .iter()
        .filter(|e| matches!(e, MonitorEvent::Restocked { .. }))
        .count();
    (out_of_stock, restocked)
}

#[tokio::test]
async fn test_alert_fires_once_then_clears_on_restock() -> anyhow::Result<()> {
    let alerts = StdArc::new(AsyncMutex::new(AlertSet::new()));
    let mut events = Vec::new();

    // Cycle 1: seller has items listed, one alert fires.
    scan_with(shop_with_items(&["Jacket"]), &alerts, &mut events).await?;
    assert_eq!(count_alerts(&events), (1, 0));
    assert_eq!(alerts.lock().await.len(), 1);

    // Cycle 2: same state, no re-alert.
    scan_with(shop_with_items(&["Jacket"]), &alerts, &mut events).await?;
    assert_eq!(count_alerts(&events), (1, 0));
    assert_eq!(alerts.lock().await.len(), 1);

    // Cycle 3: shop is empty again, the entry clears with one notification.
    scan_with(shop_empty_marker(), &alerts, &mut events).await?;
    assert_eq!(count_alerts(&events), (1, 1));
    assert!(alerts.lock().await.is_empty());

    // Cycle 4: still empty, nothing further to clear.
    scan_with(shop_empty_marker(), &alerts, &mut events).await?;
    assert_eq!(count_alerts(&events), (1, 1));
    Ok(())
}

#[tokio::test]
async fn test_errored_seller_leaves_the_alert_set_alone() -> anyhow::Result<()> {
    let alerts = StdArc::new(AsyncMutex::new(AlertSet::new()));
    let mut events = Vec::new();

    scan_with(shop_with_items(&["Jacket"]), &alerts, &mut events).await?;
    assert_eq!(alerts.lock().await.len(), 1);

    // Shop page unreachable this cycle: the seller errors out but the
    // alert entry must survive until a clean no-inventory verdict.
    let routes = admin_routes("901", &[("11", "anna")]);
    let page = FakePage::new(routes);
    let config = test_config(vec![admin("A", "901")], &["w1"]);
    let coordinator = ScanCoordinator::new(&config, EventSink::disabled());
    let result = coordinator
        .run(&page, &config.admins, &alerts, &CancellationToken::new())
        .await?;

    assert_eq!(result.with_errors.len(), 1);
    assert_eq!(alerts.lock().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_alert_entry_format() -> anyhow::Result<()> {
    let alerts = StdArc::new(AsyncMutex::new(AlertSet::new()));
    let mut events = Vec::new();

    scan_with(shop_with_items(&["Jacket"]), &alerts, &mut events).await?;

    let set = alerts.lock().await;
    assert_eq!(set.entries(), &[format!("anna({HOST}/member/11)")]);
    Ok(())
}
