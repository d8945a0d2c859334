//! consoled - traffic operator console
//!
//! This binary:
//! 1. Loads site/category configuration
//! 2. Starts one analysis session against the selected video
//! 3. Drains relay updates into the frame/counter/map/chart views
//! 4. Stops cooperatively on Ctrl-C, end of stream, or engine failure

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Parser;

use traffic_console::{
    dispatch_channel, ChartView, ConsoleConfig, CounterView, CountingEngine, FrameView, MapView,
    SessionController, StubEngine, UpdateEvent,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video to analyze. `stub://<name>` runs the built-in synthetic engine.
    #[arg(long, env = "CONSOLE_VIDEO")]
    video: String,
    /// Model path override (defaults to the configured model).
    #[arg(long)]
    model: Option<PathBuf>,
    /// Camera site to recentre the map on.
    #[arg(long)]
    site: Option<String>,
    /// Poll cadence override, in milliseconds.
    #[arg(long)]
    cadence_ms: Option<u64>,
    /// Number of synthetic ticks for stub:// videos.
    #[arg(long, default_value_t = 300)]
    stub_ticks: u64,
    /// UI mode for the stderr status line (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = ConsoleConfig::load()?;
    if let Some(model) = args.model {
        cfg.model_path = model;
    }
    if let Some(ms) = args.cadence_ms {
        cfg.cadence = Duration::from_millis(ms);
    }

    let engine = select_engine(&args.video, args.stub_ticks)?;
    log::info!("engine '{}' selected for {}", engine.name(), args.video);
    log::info!(
        "cadence {}ms, {} categories, {} sites",
        cfg.cadence.as_millis(),
        cfg.categories.len(),
        cfg.sites.len()
    );

    let (updates_tx, updates_rx) = dispatch_channel();
    let mut controller = SessionController::new(cfg.cadence, updates_tx);

    let mut frame_view = FrameView::new();
    let mut counter_view = CounterView::new(cfg.categories.clone());
    let mut chart_view = ChartView::new(cfg.categories.clone());
    let mut map_view = MapView::new(&cfg.sites, cfg.map_center);
    for marker in map_view.markers() {
        log::debug!("map marker: {}", marker.popup);
    }
    if let Some(site) = &args.site {
        let center = map_view.recenter(site)?;
        log::info!(
            "map centred on {} ({:.4}, {:.4})",
            site,
            center.latitude,
            center.longitude
        );
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_handler = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_handler.store(true, Ordering::SeqCst);
    })
    .expect("error setting Ctrl-C handler");

    let is_tty = std::io::stderr().is_terminal();
    let console_ui = ui::Ui::from_args(Some(&args.ui), is_tty, false);
    let mut status = console_ui.status_line(&controller.status_text());

    controller.start(engine, Path::new(&args.video), &cfg.model_path)?;
    status.set(&controller.status_text());

    let mut last_report = Instant::now();
    let mut stop_requested = false;
    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            if stop_requested {
                log::warn!("second interrupt, abandoning session");
                break;
            }
            log::info!("interrupt received, stopping session");
            controller.stop();
            stop_requested = true;
        }

        let mut finished = false;
        for event in updates_rx.drain_timeout(Duration::from_millis(50)) {
            controller.observe(&event);
            match event {
                UpdateEvent::Snapshot(snapshot) => {
                    frame_view.apply(&snapshot);
                    counter_view.apply(&snapshot);
                    chart_view.apply(&snapshot);
                }
                UpdateEvent::Status(text) => status.set(&text),
                UpdateEvent::Lifecycle(_) => status.set(&controller.status_text()),
                UpdateEvent::Finished => finished = true,
            }
        }

        if last_report.elapsed() >= Duration::from_secs(5) {
            report_counts(&counter_view, &frame_view);
            last_report = Instant::now();
        }

        if finished {
            break;
        }
    }

    report_counts(&counter_view, &frame_view);
    let chart = chart_view.model();
    if !chart.proportions.is_empty() {
        let distribution: Vec<String> = chart
            .proportions
            .iter()
            .map(|(category, share)| format!("{category}={:.0}%", share * 100.0))
            .collect();
        log::info!("distribution: {}", distribution.join(" "));
    }
    if let Err(err) = controller.shutdown(cfg.shutdown_timeout) {
        log::error!("shutdown: {} (leaking relay thread)", err);
    }
    status.finish(&controller.status_text());
    log::info!("final state: {}", controller.state());
    Ok(())
}

fn select_engine(video: &str, stub_ticks: u64) -> Result<Box<dyn CountingEngine>> {
    if video.starts_with("stub://") {
        return Ok(Box::new(StubEngine::synthetic(stub_ticks)));
    }
    Err(anyhow!(
        "no counting engine is linked for '{}'; only stub:// videos are supported in this build",
        video
    ))
}

fn report_counts(counter: &CounterView, frame: &FrameView) {
    let rows: Vec<String> = counter
        .rows()
        .iter()
        .map(|(category, count)| format!("{category}={count}"))
        .collect();
    let dims = frame
        .dimensions()
        .map(|(w, h)| format!("{w}x{h}"))
        .unwrap_or_else(|| "none".to_string());
    log::info!(
        "counts: {} total={} frame={}",
        rows.join(" "),
        counter.total(),
        dims
    );
}
