use anyhow::{Context, Result};
use plzmap::{DrawnShape, SelectionMode};

use crate::cli::{Cli, SelectArgs};

pub fn run(cli: &Cli, args: &SelectArgs) -> Result<()> {
    let (mut session, store) = super::open_session(cli, &args.layer)?;
    let mode = SelectionMode::from(args.mode);

    if !args.apply.is_empty() {
        match mode {
            SelectionMode::Replace => session.replace(&args.apply),
            SelectionMode::Add => { session.add(&args.apply); }
            SelectionMode::Toggle => for code in &args.apply { session.toggle(code); },
            SelectionMode::Remove => { session.remove(&args.apply); }
        }
    }

    if let Some(shape) = &args.shape {
        let shape: DrawnShape = serde_json::from_str(shape).context("[select] invalid --shape JSON")?;
        let hits = session.select_by_shape(&shape, mode);
        eprintln!("[select] shape hit {}: {}", hits.len(), hits.join(","));
    }

    super::finish(&mut session, store.as_ref(), &args.layer)
}
