use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use roach_balancer::logging::init_logging;
use roach_balancer::{
    Args, Balancer, CockroachLivenessSource, Config, RuntimeConfig, load_config_with_fallback,
    shutdown_signal,
};

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_file.as_deref());

    let (mut config, source) = load_config_with_fallback(&args.config)?;
    info!(
        "Using {} ({})",
        source.description(),
        args.config.display()
    );
    args.apply_to(&mut config);
    config.validate()?;

    RuntimeConfig::from_args(args.threads)
        .build_runtime()?
        .block_on(run_balancer(config))
}

async fn run_balancer(config: Config) -> Result<()> {
    info!("Bootstrap nodes:");
    for node in &config.cluster.nodes {
        info!("  - {}", node);
    }

    let source = Arc::new(CockroachLivenessSource::new(config.cluster.clone()));
    let balancer = Balancer::start(&config, source)?;

    let listener = match balancer.listen(&config.balancer.listen_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("{}", e);
            balancer.shutdown();
            return Err(e.into());
        }
    };

    let signal_balancer = Arc::clone(&balancer);
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_balancer.shutdown();
    });

    balancer.serve(listener).await;
    Ok(())
}
