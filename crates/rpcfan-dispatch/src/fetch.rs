//! Sequential single-node fetch.

use std::collections::HashMap;
use std::time::Duration;

use rpcfan_rpc::Connection;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, DispatchResult};
use crate::family::Family;

/// Fetch every key over one connection, in order, under one deadline for
/// the whole sequence.
///
/// Keys are pulled lazily, so a block range never has to be materialized.
/// `cancel` is checked before each call; a call already in flight is not
/// interrupted by it. The first failure discards everything fetched so far.
pub async fn fetch_sequential<F, C, I>(
    conn: &mut C,
    keys: I,
    timeout: Duration,
    cancel: &CancellationToken,
) -> DispatchResult<HashMap<F::Key, F::Value>>
where
    F: Family,
    C: Connection,
    I: IntoIterator<Item = F::Key>,
{
    let deadline = Instant::now() + timeout;
    let keys = keys.into_iter();
    let mut out = HashMap::with_capacity(keys.size_hint().0);

    for key in keys {
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        let value = tokio::time::timeout_at(deadline, F::fetch(conn, key))
            .await
            .map_err(|_| DispatchError::Timeout(timeout))??;
        out.insert(key, value);
    }

    Ok(out)
}
