use anyhow::{Context, bail};
use rpcfan::{Balancer, Config};

use crate::PoolArgs;

/// Resolve the config from a file, flags, or both.
pub fn load_config(args: &PoolArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None if args.endpoints.is_empty() => {
            bail!("no endpoints given; pass --config or at least one --endpoint")
        }
        None => Config::default(),
    };

    for endpoint in &args.endpoints {
        if !config.endpoints.contains(endpoint) {
            config.endpoints.push(endpoint.clone());
        }
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

/// Build an HTTP balancer and run one probe cycle so reads can be routed.
pub async fn connect(args: &PoolArgs) -> anyhow::Result<Balancer> {
    let balancer = Balancer::new(load_config(args)?)?;
    balancer.refresh().await;
    if balancer.live_nodes().is_empty() {
        bail!("none of {} endpoint(s) answered", balancer.nodes().len());
    }
    Ok(balancer)
}
