// NovaDE XSETTINGS daemon entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use xsettings_core::{init_logging, init_minimal_logging, ConfigLoader, XSettingsConfig};
use xsettings_domain::{DefaultXSettingsService, FilesystemSettingsStore, SettingRegistry, XSettingsService};
use xsettings_system::{Cli, X11DisplayServer};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_minimal_logging();
            error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        init_minimal_logging();
        warn!("Falling back to minimal logging: {}", e);
    }

    info!("Starting novade-xsettingsd {}", env!("CARGO_PKG_VERSION"));

    let store_path = config.store_path().context("Failed to resolve the settings store path")?;
    let store = FilesystemSettingsStore::open(&store_path)
        .with_context(|| format!("Failed to open settings store {:?}", store_path))?;
    info!("Using settings store {:?}", store.path());

    let screen = cli.screen.or(config.display.screen);
    let x11 = Arc::new(X11DisplayServer::connect(screen).context("Failed to connect to the X server")?);

    let service = DefaultXSettingsService::new(
        x11.clone(),
        Arc::new(store),
        Arc::new(SettingRegistry::with_defaults()),
        config.scale.clone(),
    );

    // Publish before announcing the selection so clients never see an empty property.
    match service.load_from_store() {
        Ok(count) => info!("Published {} stored setting(s)", count),
        Err(e) => warn!("Loading stored settings failed: {}", e),
    }
    if let Err(e) = service.sync_connected_monitors() {
        warn!("Could not add default scale factors for connected monitors: {}", e);
    }

    x11.claim_selection(cli.replace).context("Failed to become the XSETTINGS manager")?;
    let screen_num = x11.screen_num();
    info!(
        "Serving screen {} (serial {}), scale factor {}",
        screen_num,
        service.get_property_serial().unwrap_or_default(),
        service.get_scale_factor()
    );

    x11.run_until_replaced().context("X11 event loop failed")?;
    info!("novade-xsettingsd shutting down");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<XSettingsConfig> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };
    Ok(config)
}
