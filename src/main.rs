//! CRASHCAST — crash-game probability estimator and bet advisor.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the estimator to the round feed and the dashboard, and runs
//! the ingest loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crashcast::config::AppConfig;
use crashcast::dashboard::{self, DashboardState};
use crashcast::estimator::{Estimator, EstimatorConfig};
use crashcast::feed::{OutcomeFeed, SimulatedFeed};
use crashcast::model;

const BANNER: &str = r#"
  ____ ____      _    ____  _   _  ____    _    ____ _____
 / ___|  _ \    / \  / ___|| | | |/ ___|  / \  / ___|_   _|
| |   | |_) |  / _ \ \___ \| |_| | |     / _ \ \___ \ | |
| |___|  _ <  / ___ \ ___) |  _  | |___ / ___ \ ___) || |
 \____|_| \_\/_/   \_\____/|_| |_|\____/_/   \_\____/ |_|

  Crash-game probability estimator
  v0.1.0 — not betting advice
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        capacity = cfg.estimator.capacity,
        min_history = cfg.estimator.min_history,
        bet_threshold = cfg.estimator.bet_threshold,
        round_interval_secs = cfg.feed.round_interval_secs,
        "CRASHCAST starting up"
    );

    // -- Initialise components -------------------------------------------

    let scoring_model = model::load_model(&cfg.model)?;

    let estimator = Estimator::new(
        EstimatorConfig {
            capacity: cfg.estimator.capacity,
            min_history: cfg.estimator.min_history,
            summary_window: cfg.estimator.summary_window,
            empirical_weight: cfg.estimator.empirical_weight,
            bet_threshold: cfg.estimator.bet_threshold,
            confidence_saturation: cfg.estimator.confidence_saturation,
        },
        scoring_model,
    );

    let state = Arc::new(DashboardState::new(estimator));

    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(state.clone(), cfg.dashboard.port)?;
    }

    // The production round source is an external scraper; the simulated
    // feed stands in behind the same seam.
    let mut feed = SimulatedFeed::new(&cfg.feed);
    info!(feed = feed.name(), "Round feed ready");

    // -- Ingest loop ------------------------------------------------------

    let round_interval = Duration::from_secs(cfg.feed.round_interval_secs.max(1));
    let mut interval = tokio::time::interval(round_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.feed.round_interval_secs,
        "Entering ingest loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = ingest_round(&state, &mut feed).await {
                    // A bad reading is discarded; the loop continues.
                    error!(error = %e, "Round ingest failed — continuing");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Final session report
    let metrics = state.session.read().await.snapshot();
    info!(
        rounds = metrics.rounds_recorded,
        predictions = metrics.predictions_served,
        bets = metrics.bets_advised,
        net_profit = %metrics.net_profit,
        roi = format!("{:.1}%", metrics.roi_pct),
        "CRASHCAST shut down cleanly."
    );

    Ok(())
}

/// Pull one completed round from the feed and record it.
async fn ingest_round(
    state: &Arc<DashboardState>,
    feed: &mut SimulatedFeed,
) -> Result<()> {
    let outcome = feed.next_outcome().await?;

    {
        let mut estimator = state.estimator.write().await;
        if let Err(e) = estimator.record(outcome.multiplier) {
            // Invalid reading from the source: discard and continue.
            warn!(error = %e, "Discarding invalid outcome");
            return Ok(());
        }
    }

    let mut session = state.session.write().await;
    session.record_round(outcome.multiplier);

    if session.rounds_recorded() % 10 == 0 {
        let metrics = session.snapshot();
        info!(
            rounds = metrics.rounds_recorded,
            avg = format!("{:.2}x", metrics.avg_multiplier),
            max = format!("{:.2}x", metrics.max_multiplier),
            predictions = metrics.predictions_served,
            net_profit = %metrics.net_profit,
            "Session report"
        );
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crashcast=info"));

    let json_logging = std::env::var("CRASHCAST_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
