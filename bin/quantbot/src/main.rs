use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use analytics::{Analyzer, CsvFileLog};
use common::{Config, MarketDataSource, ServiceConfig};
use console::{Command, Renderer};
use feed::BinanceFeed;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let service = match &cfg.service_config_path {
        Some(path) => ServiceConfig::load(path)
            .unwrap_or_else(|e| panic!("Failed to load service config at '{path}': {e}")),
        None => ServiceConfig::default(),
    };
    info!(currency = %service.currency, "quantbot starting");

    // ── Core ──────────────────────────────────────────────────────────────────
    let renderer = Renderer::new(service.currency.clone());
    let log = CsvFileLog::create(&cfg.transaction_log_path);
    let analyzer = Arc::new(RwLock::new(Analyzer::new(service.clone(), Box::new(log))));
    let feed = Arc::new(BinanceFeed::new());

    // ── Stdin reader ──────────────────────────────────────────────────────────
    // stdin blocks, so it runs on its own thread and feeds a channel
    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    // ── Initial watchlist ─────────────────────────────────────────────────────
    println!("{}", renderer.header());
    let initial = line_rx.recv().await.unwrap_or_default();

    let mut prices = match feed.latest_prices().await {
        Ok(prices) => prices,
        Err(e) => {
            error!(error = %e, "Connection lost: make sure you are connected to the internet");
            std::process::exit(1);
        }
    };

    let watchlist: Vec<String> = initial
        .split_whitespace()
        .map(console::normalize_symbol)
        .collect();
    if watchlist.is_empty() {
        warn!("empty watchlist; use `add <symbol>` to track something");
    }
    seed_symbols(
        &analyzer,
        &feed,
        &prices,
        &service.currency,
        watchlist,
        &renderer,
    )
    .await;

    println!("{}", renderer.help());

    // ── Poll loop ─────────────────────────────────────────────────────────────
    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.poll_interval_secs));
    let roll_every = Duration::from_secs(cfg.roll_interval_secs);
    let mut last_roll = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match feed.latest_prices().await {
                    Ok(latest) => {
                        prices = latest;
                        let roll_window = last_roll.elapsed() >= roll_every;
                        if roll_window {
                            last_roll = tokio::time::Instant::now();
                        }

                        let tracked = analyzer.read().await.symbols();
                        let batch: BTreeMap<String, f64> = tracked
                            .into_iter()
                            .filter_map(|symbol| prices.get(&symbol).map(|&price| (symbol, price)))
                            .collect();
                        let events = analyzer.write().await.process_tick(&batch, roll_window);
                        for event in &events {
                            println!("{}", renderer.event(event));
                        }
                    }
                    Err(e) => warn!(error = %e, "price poll failed; tick skipped"),
                }
            }

            line = line_rx.recv() => {
                let Some(line) = line else { break };
                match Command::parse(&line) {
                    Ok(command) => {
                        let keep_running = handle_command(
                            command,
                            &analyzer,
                            &feed,
                            &prices,
                            &service,
                            &renderer,
                        )
                        .await;
                        if !keep_running {
                            break;
                        }
                    }
                    Err(e) => {
                        println!("{e}");
                        println!("{}", renderer.help());
                    }
                }
            }
        }
    }

    info!("session ended");
}

/// Execute one parsed command. Returns false when the session should end.
async fn handle_command(
    command: Command,
    analyzer: &Arc<RwLock<Analyzer>>,
    feed: &Arc<BinanceFeed>,
    prices: &HashMap<String, f64>,
    service: &ServiceConfig,
    renderer: &Renderer,
) -> bool {
    match command {
        Command::Help => println!("{}", renderer.help()),

        Command::Deposit(amount) => {
            let event = analyzer.write().await.deposit(amount);
            println!("{}", renderer.event(&event));
        }

        Command::Withdraw => {
            let events = analyzer.write().await.withdraw();
            for event in &events {
                println!("{}", renderer.event(event));
            }
            return false;
        }

        Command::Assets => {
            let analyzer = analyzer.read().await;
            let assets = analyzer.snapshot_assets();
            let estimated = analyzer.estimated_withdrawal();
            println!(
                "{}",
                renderer.assets(&assets, estimated, service.withdrawal_fee)
            );
        }

        Command::Transactions => {
            let transactions = analyzer.read().await.snapshot_transactions();
            println!("{}", renderer.transactions(&transactions));
        }

        Command::Indicators => {
            let rows = analyzer.read().await.snapshot_indicators();
            println!("{}", renderer.indicators(&rows));
        }

        Command::Market => {
            let tracked = analyzer.read().await.symbols();
            let quotes: Vec<(String, f64)> = tracked
                .into_iter()
                .filter_map(|symbol| prices.get(&symbol).map(|&price| (symbol, price)))
                .collect();
            println!("{}", renderer.market(&quotes));
        }

        Command::Add(symbol) => {
            seed_symbols(
                analyzer,
                feed,
                prices,
                &service.currency,
                vec![symbol],
                renderer,
            )
            .await;
        }

        Command::Remove(symbol) => {
            let events = analyzer.write().await.remove(&symbol);
            for event in &events {
                println!("{}", renderer.event(event));
            }
        }
    }
    true
}

/// Validate and seed a batch of symbols. Histories are fetched concurrently,
/// one task per symbol; each task takes the analyzer's write lock only for
/// the seeding itself.
async fn seed_symbols(
    analyzer: &Arc<RwLock<Analyzer>>,
    feed: &Arc<BinanceFeed>,
    prices: &HashMap<String, f64>,
    currency: &str,
    symbols: Vec<String>,
    renderer: &Renderer,
) {
    let mut accepted = Vec::new();
    {
        let analyzer = analyzer.read().await;
        for symbol in symbols {
            if analyzer.is_tracked(&symbol) || accepted.contains(&symbol) {
                println!("{}", renderer.already_tracked(&symbol));
            } else if !symbol.contains(currency) || !prices.contains_key(&symbol) {
                println!("{}", renderer.unavailable(&symbol));
            } else {
                accepted.push(symbol);
            }
        }
    }

    let handles: Vec<_> = accepted
        .into_iter()
        .map(|symbol| {
            let analyzer = Arc::clone(analyzer);
            let feed = Arc::clone(feed);
            tokio::spawn(async move {
                match feed.close_history(&symbol).await {
                    Ok(history) => {
                        analyzer.write().await.seed(&symbol, &history);
                        Some(symbol)
                    }
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "history fetch failed; symbol not added");
                        None
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        if let Ok(Some(symbol)) = handle.await {
            println!("{}", renderer.added(&symbol));
        }
    }
}
