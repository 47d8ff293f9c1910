//! rewrite-proxy binary.
//!
//! ```text
//! rewrite-proxy [--config proxy.toml] [--bind 0.0.0.0:3000] [--static-dir public]
//! ```

use std::path::PathBuf;

use clap::Parser;

use rewrite_proxy::config::{load_config, validate_config, ProxyConfig};
use rewrite_proxy::lifecycle::startup;

#[derive(Parser, Debug)]
#[command(name = "rewrite-proxy")]
#[command(about = "Forwarding HTTP proxy that rewrites page links to stay on the proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the static front-end directory.
    #[arg(long)]
    static_dir: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(dir) = self.static_dir {
            config.static_files.dir = dir;
        }
        // Overrides bypass the loader's validation.
        if let Err(errors) = validate_config(&config) {
            for e in &errors {
                eprintln!("invalid configuration: {}", e);
            }
            return Err("configuration rejected".into());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    startup::run(config).await
}
