use std::time::Instant;

use tracing::info;

use crate::PoolArgs;

pub async fn blocks(pool: &PoolArgs, start: u64, end: u64, format: &str) -> anyhow::Result<()> {
    let balancer = super::pool::connect(pool).await?;

    let started = Instant::now();
    let blocks = balancer.blocks_by_range_batched(start, end).await?;
    info!(
        count = blocks.len(),
        nodes = balancer.live_nodes().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetched blocks"
    );

    let mut ordered: Vec<_> = blocks.into_values().collect();
    ordered.sort_by_key(|b| b.header.number);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&ordered)?),
        _ => {
            for block in &ordered {
                println!(
                    "{:>10}  {}  txs={:<4} gas={}",
                    block.header.number,
                    block.header.hash,
                    block.transactions.len(),
                    block.header.gas_used
                );
            }
        }
    }

    Ok(())
}
