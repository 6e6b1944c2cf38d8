// src/main.rs

//! `display-core`: bootstraps the display core from a configuration file,
//! brings up every display the hardware reports, prints the result and tears
//! everything down again.

use anyhow::{bail, Context};
use display_core::display::{DisplayEventHandler, DisplayHandle, DisplayState, SharedEventHandler};
use display_core::{Config, DisplayVariant};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Logs display events; the binary has no compositor to forward them to.
struct LoggingEventHandler;

impl DisplayEventHandler for LoggingEventHandler {
    fn refresh(&self, variant: DisplayVariant, display_id: Option<i32>) {
        info!("refresh requested by {} display {:?}", variant, display_id);
    }

    fn state_changed(&self, variant: DisplayVariant, display_id: Option<i32>, state: DisplayState) {
        info!("{} display {:?} is now {:?}", variant, display_id, state);
    }
}

fn parse_args() -> anyhow::Result<Option<PathBuf>> {
    let mut config_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("usage: display-core [--config <path>]");
                std::process::exit(0);
            }
            other => bail!("unexpected argument '{}'", other),
        }
    }
    Ok(config_path)
}

fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let config_path = parse_args()?;
    let config = Config::load(config_path).context("Failed to load configuration")?;

    let core = config.build_core();
    core.init().context("Display core bootstrap failed")?;

    let resource = core.hw_resource_info();
    if let Some(resource) = &resource {
        info!(
            "hardware: {} mixers, {} dspp, {} kbps, caps {:?}",
            resource.num_mixers, resource.num_dspp, resource.max_bandwidth_kbps, resource.capabilities
        );
    }

    let topology = match core.get_displays_status() {
        Ok(topology) => topology,
        Err(e) => {
            warn!("Topology refresh failed ({}), using bootstrap snapshot", e);
            core.cached_topology()
        }
    };

    let handler: SharedEventHandler = Arc::new(LoggingEventHandler);
    let mut displays: Vec<DisplayHandle> = Vec::new();
    for (id, info) in &topology {
        match core.create_display_by_id(*id, Some(handler.clone())) {
            Ok(display) => displays.push(display),
            Err(e) => warn!(
                "display {} ({}, {}): not created: {}",
                id, info.display_type, info.name, e
            ),
        }
    }

    for display in displays.iter_mut() {
        if let Err(e) = display.set_display_state(DisplayState::On) {
            warn!("{}: power on failed: {}", display.name(), e);
        }
    }

    println!("extension: {}", if core.has_extension() { "loaded" } else { "none" });
    for variant in DisplayVariant::ALL {
        if let Ok(max) = core.get_max_displays_supported(variant) {
            println!("max {} displays: {}", variant, max);
        }
    }
    println!("topology: {} entries", topology.len());
    for info in topology.values() {
        println!(
            "  [{}] {:<10} {:<24} connected={} primary={}",
            info.display_id, info.display_type, info.name, info.is_connected, info.is_primary
        );
    }
    println!("active displays: {}", displays.len());
    for display in &displays {
        println!("  {} ({:?})", display.name(), display.state());
    }

    for display in displays {
        if let Err(e) = core.destroy_display(Some(display)) {
            error!("destroy failed: {}", e);
        }
    }
    core.deinit().context("Display core teardown failed")?;
    info!("display-core exited successfully.");
    Ok(())
}
