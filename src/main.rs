use anyhow::{Result, anyhow};
use clap::Parser;
use policy_snake::game::GameConfig;
use policy_snake::logging::init_logging;
use policy_snake::modes::PlayMode;
use policy_snake::policy::{
    InferenceBackend, NetworkPolicy, Policy, PolicyAdapter, UnavailablePolicy, default_device,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "policy_snake")]
#[command(version, about = "Snake steered by a trained policy, with keyboard override")]
struct Cli {
    /// Trained policy model: a PyTorch state dict (.pt/.pth) or a Burn record
    /// (.mpk, with metadata in <stem>.meta.json)
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON game configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Tick period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Budget for one policy call in milliseconds (defaults to the tick period)
    #[arg(long)]
    policy_timeout_ms: Option<u64>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn game_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::from_json_file(path)?,
            None => GameConfig::default(),
        };

        if self.width.is_some() || self.height.is_some() {
            config.resize(
                self.width.unwrap_or(config.grid_width),
                self.height.unwrap_or(config.grid_height),
            );
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(timeout_ms) = self.policy_timeout_ms {
            config.policy_timeout_ms = Some(timeout_ms);
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }

        config.validate().map_err(|reason| anyhow!("Invalid configuration: {reason}"))?;
        Ok(config)
    }

    fn policy(&self) -> Arc<dyn Policy> {
        let Some(path) = &self.model else {
            info!("no model given, manual control only");
            return Arc::new(UnavailablePolicy::new("no model configured"));
        };

        match NetworkPolicy::<InferenceBackend>::load(path, default_device()) {
            Ok(policy) => Arc::new(policy),
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(path = %path.display(), %reason, "model unavailable, manual control only");
                Arc::new(UnavailablePolicy::new(reason))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = cli.game_config()?;
    let adapter = PolicyAdapter::new(cli.policy(), config.policy_timeout());
    info!(?config, policy = adapter.policy_name(), "starting");

    let mut play_mode = PlayMode::new(config, adapter);
    play_mode.run().await?;

    Ok(())
}
