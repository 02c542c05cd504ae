//! Background Price Ticker
//!
//! A Tokio task that advances the market price walk on a configurable
//! interval. Ticks are published on a `watch` channel so views can
//! refresh when prices move.

use super::price_walk::MarketService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use wallnance_persistence::KeyValueStore;

/// Status of the price ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TickerStatus {
    Running,
    Paused,
    Stopped,
}

/// Handle to control the ticker task
#[derive(Clone)]
pub struct MarketTickerHandle {
    pause_tx: Arc<watch::Sender<bool>>,
    ticks_rx: watch::Receiver<u64>,
    cancel_token: CancellationToken,
    status: Arc<RwLock<TickerStatus>>,
    interval: Arc<RwLock<Duration>>,
}

impl MarketTickerHandle {
    /// Pause ticking (the task stays alive)
    pub async fn pause(&self) {
        let _ = self.pause_tx.send(true);
        *self.status.write().await = TickerStatus::Paused;
        info!("Price ticker paused");
    }

    pub async fn resume(&self) {
        let _ = self.pause_tx.send(false);
        *self.status.write().await = TickerStatus::Running;
        info!("Price ticker resumed");
    }

    /// Stop the ticker entirely (cannot be restarted, spawn a new one)
    pub async fn stop(&self) {
        self.cancel_token.cancel();
        *self.status.write().await = TickerStatus::Stopped;
        info!("Price ticker stopped");
    }

    pub async fn status(&self) -> TickerStatus {
        *self.status.read().await
    }

    pub async fn set_interval(&self, interval: Duration) {
        *self.interval.write().await = interval;
        info!("Price ticker interval set to {:?}", interval);
    }

    pub async fn interval(&self) -> Duration {
        *self.interval.read().await
    }

    /// Receiver of the latest completed tick count
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks_rx.clone()
    }
}

/// Spawn the ticker task over `market`.
///
/// Returns a handle to control pause/resume/stop.
pub fn spawn_price_ticker<S>(market: Arc<MarketService<S>>, interval: Duration) -> MarketTickerHandle
where
    S: KeyValueStore + 'static,
{
    let (pause_tx, pause_rx) = watch::channel(false);
    let (ticks_tx, ticks_rx) = watch::channel(0u64);
    let cancel_token = CancellationToken::new();
    let status = Arc::new(RwLock::new(TickerStatus::Running));
    let interval = Arc::new(RwLock::new(interval));

    let handle = MarketTickerHandle {
        pause_tx: Arc::new(pause_tx),
        ticks_rx,
        cancel_token: cancel_token.clone(),
        status: status.clone(),
        interval: interval.clone(),
    };

    tokio::spawn(ticker_loop(market, pause_rx, ticks_tx, cancel_token, status, interval));

    handle
}

async fn ticker_loop<S: KeyValueStore>(
    market: Arc<MarketService<S>>,
    mut pause_rx: watch::Receiver<bool>,
    ticks_tx: watch::Sender<u64>,
    cancel_token: CancellationToken,
    status: Arc<RwLock<TickerStatus>>,
    interval: Arc<RwLock<Duration>>,
) {
    info!("Price ticker started (interval: {:?})", *interval.read().await);

    loop {
        let current_interval = *interval.read().await;

        tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!("Price ticker cancelled, exiting");
                break;
            }
            _ = tokio::time::sleep(current_interval) => {
                if *pause_rx.borrow() {
                    debug!("Price ticker is paused, skipping tick");
                    continue;
                }

                match market.tick().await {
                    Ok(count) => {
                        let _ = ticks_tx.send(count);
                    }
                    Err(e) => error!("Price tick failed: {}", e),
                }
            }
            // Wake on pause changes so resume takes effect immediately
            changed = pause_rx.changed() => {
                if changed.is_err() {
                    debug!("Price ticker handle dropped, exiting");
                    break;
                }
                continue;
            }
        }
    }

    *status.write().await = TickerStatus::Stopped;
    info!("Price ticker loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallnance_core::GameSettings;
    use wallnance_persistence::MemoryStore;

    async fn service() -> Arc<MarketService<MemoryStore>> {
        let settings = GameSettings {
            rng_seed: Some(11),
            ..Default::default()
        };
        Arc::new(
            MarketService::load(Arc::new(MemoryStore::new()), &settings)
                .await
                .unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_on_interval() {
        let market = service().await;
        let handle = spawn_price_ticker(market.clone(), Duration::from_secs(5));
        let mut ticks = handle.subscribe();

        ticks.changed().await.unwrap();
        assert_eq!(*ticks.borrow(), 1);
        ticks.changed().await.unwrap();
        assert_eq!(*ticks.borrow(), 2);
        assert_eq!(market.snapshot().await.tick_count(), 2);

        handle.stop().await;
        assert_eq!(handle.status().await, TickerStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_skips_ticks() {
        let market = service().await;
        let handle = spawn_price_ticker(market.clone(), Duration::from_secs(1));
        handle.pause().await;
        assert_eq!(handle.status().await, TickerStatus::Paused);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(market.snapshot().await.tick_count(), 0);

        handle.resume().await;
        let mut ticks = handle.subscribe();
        ticks.changed().await.unwrap();
        assert!(market.snapshot().await.tick_count() >= 1);

        handle.set_interval(Duration::from_secs(2)).await;
        assert_eq!(handle.interval().await, Duration::from_secs(2));
        handle.stop().await;
    }
}
