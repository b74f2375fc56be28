use std::time::Duration;

use crate::PoolArgs;

pub async fn benchmark(pool: &PoolArgs, height: u64, reps: usize) -> anyhow::Result<()> {
    let balancer = super::pool::connect(pool).await?;
    let mut times: Vec<_> = balancer.benchmark(height, reps).await?.into_iter().collect();
    times.sort_by_key(|(_, took)| *took);

    for (endpoint, took) in times {
        println!("{took:>10.3?}  ({:.3?}/call)  {endpoint}", per_call(took, reps));
    }

    Ok(())
}

fn per_call(took: Duration, reps: usize) -> Duration {
    took / u32::try_from(reps.max(1)).unwrap_or(u32::MAX)
}
