use std::collections::BTreeMap;

use crate::PoolArgs;

pub async fn probe(pool: &PoolArgs, format: &str) -> anyhow::Result<()> {
    let balancer = super::pool::connect(pool).await?;
    let latencies = balancer.live_latencies();
    let live = balancer.live_nodes();

    match format {
        "json" => {
            let report: BTreeMap<_, _> = latencies
                .iter()
                .map(|(endpoint, d)| (endpoint.as_str(), d.as_micros() as u64))
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            for endpoint in &live {
                let took = latencies.get(endpoint).copied().unwrap_or_default();
                println!("{:>10.3?}  {endpoint}", took);
            }
            let dead = balancer.nodes().len() - live.len();
            if dead > 0 {
                println!("{dead} endpoint(s) did not answer");
            }
        }
    }

    Ok(())
}
