use std::path::PathBuf;

use clap::Parser;

/// NovaDE XSETTINGS manager.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "novade-xsettingsd", version, about)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/novade/xsettingsd.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// X screen to serve, overrides `display.screen`
    #[arg(short, long, value_name = "N")]
    pub screen: Option<usize>,

    /// Take over from a running settings manager
    #[arg(long)]
    pub replace: bool,
}
