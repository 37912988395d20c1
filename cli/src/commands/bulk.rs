use anyhow::Result;
use plzmap::BulkOperation;
use tracing::info;

use crate::cli::{Cli, LayerArgs};

pub fn run(cli: &Cli, args: &LayerArgs, operation: BulkOperation) -> Result<()> {
    let (mut session, store) = super::open_session(cli, args)?;

    let added = session.bulk(operation);
    info!(?operation, added = added.len(), "bulk operation applied");
    eprintln!("[{operation:?}] added {}: {}", added.len(), added.join(","));

    super::finish(&mut session, store.as_ref(), args)
}
