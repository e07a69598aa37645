/*
 *  main.rs
 *
 *  OnAir - broadcast overlay engine
 *	(c) 2020-26 Stuart Hunter
 *
 *	Headless runner - mounts a scene, drives the engine from the wall
 *	clock and logs what a renderer would draw
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use anyhow::Context;
use env_logger::Env;
use log::{debug, error, info};
use std::collections::HashMap;
use std::time::Duration;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use onair::config::{self, Config};
use onair::overlay::{
    ClockSource, OverlayEngine, PresentationSnapshot, SystemClock, WidgetEvent, WidgetId,
};
use onair::pacer::Pacer;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

// idle cap so a scene with no timers still notices the pacer
const MAX_SLEEP: Duration = Duration::from_millis(250);

/// Remembers the last snapshot per widget and logs the fields a viewer would
/// notice. Marquee phase moves every frame so it is left out.
#[derive(Default)]
struct SnapshotLog {
    last: HashMap<WidgetId, PresentationSnapshot>,
}

impl SnapshotLog {
    fn record(&mut self, id: WidgetId, name: &str, items: &[String], snap: PresentationSnapshot) {
        let changed = match self.last.get(&id) {
            None => true,
            Some(prev) => {
                prev.visible != snap.visible
                    || prev.active_index != snap.active_index
                    || prev.remaining_label != snap.remaining_label
                    || prev.clock_label != snap.clock_label
                    || prev.paused != snap.paused
            }
        };
        if changed {
            let mut line = format!("[{}] {}", name, if snap.visible { "on air" } else { "hidden" });
            if let Some(item) = snap.active_item(items) {
                line.push_str(&format!(" | {}", item));
            }
            if let Some(label) = snap.remaining_label.as_deref() {
                line.push_str(&format!(" | {}", label));
            }
            if let Some(label) = snap.clock_label.as_deref() {
                line.push_str(&format!(" | {}", label));
            }
            if snap.paused {
                line.push_str(" | paused");
            }
            info!("{}", line);
        }
        self.last.insert(id, snap);
    }
}

async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

async fn run_scene(cfg: &Config) {
    let clock = SystemClock::new();
    let mut engine = OverlayEngine::new();
    let mut names: HashMap<WidgetId, &str> = HashMap::new();

    let now = clock.now();
    for entry in &cfg.scene {
        let id = engine.mount(entry.widget.clone(), now);
        info!("Mounted {} as {} ({})", entry.name, id, entry.widget.banner());
        names.insert(id, entry.name.as_str());
    }

    let mut pacer = Pacer::new(cfg.fps(), now);
    let mut log = SnapshotLog::default();

    loop {
        let now = clock.now();

        for (id, event) in engine.tick(now) {
            let name = names.get(&id).copied().unwrap_or("?");
            match event {
                WidgetEvent::Expired => info!("{}: alert expired", name),
                WidgetEvent::AutoHidden => info!("{}: auto-hidden", name),
                other => debug!("{}: {:?}", name, other),
            }
        }

        if pacer.should_render(now) {
            for (id, snap) in engine.snapshots(now) {
                let name = names.get(&id).copied().unwrap_or("?");
                let items = engine.config(id).map(|c| c.items.as_slice()).unwrap_or(&[]);
                log.record(id, name, items, snap);
            }
        }

        let wake = engine
            .next_wakeup()
            .map_or(pacer.next_deadline(), |t| t.min(pacer.next_deadline()));
        let nap = wake.saturating_since(clock.now()).min(MAX_SLEEP);
        tokio::time::sleep(nap).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let (cfg, cli) = match config::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(2);
        }
    };

    if cli.dump_config {
        let yaml = serde_yaml::to_string(&cfg).context("serializing merged config")?;
        println!("{}", yaml);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_filter()))
        .format_timestamp_secs()
        .init();

    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    info!("{} widget(s) in scene, polling at {} fps", cfg.scene.len(), cfg.fps());

    let limit = cfg.run_for_secs.map(Duration::from_secs);

    tokio::select! {
        // Handle Unix signals for graceful shutdown
        res = signal_handler() => {
            if let Err(e) = res {
                error!("Signal handler failed: {}", e);
            }
        }
        _ = async {
            match limit {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        } => {
            info!("Run time limit reached.");
        }
        _ = run_scene(&cfg) => {}
    }

    info!("Shutdown complete.");
    Ok(())
}
