use anyhow::Result;

use crate::cli::{Cli, DatasetArgs};

pub fn run(cli: &Cli, args: &DatasetArgs) -> Result<()> {
    let config = super::engine_config(cli)?;
    let index = super::load_dataset(args, &config)?;
    let report = index.report();

    println!("dataset:     {}", args.dataset.display());
    println!("granularity: {}", index.granularity());
    println!("regions:     {}", report.loaded);
    println!("skipped:     {} ({} duplicates)", report.skipped, report.duplicates);
    println!("repairs:     {} rings closed, {} rings dropped, {} polygons dropped",
        report.repairs.closed_rings, report.repairs.dropped_rings, report.repairs.dropped_polygons);
    println!("exterior:    {}", index.ids().filter(|&id| index.is_exterior(id)).count());
    if let Some(extent) = index.extent() {
        println!("extent:      [{:.4}, {:.4}] - [{:.4}, {:.4}]",
            extent.min().x, extent.min().y, extent.max().x, extent.max().y);
    }
    Ok(())
}
