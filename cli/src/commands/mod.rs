pub mod bulk;
pub mod inspect;
pub mod search;
pub mod select;

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use plzmap::{
    load_index, selection_to_geojson, EngineConfig, GeometryIndex, Granularity, JsonFileLayerStore,
    Session, StoreError,
};
use tracing::info;

use crate::cli::{Cli, DatasetArgs, LayerArgs};

/// Config file from `--config`, or the defaults.
pub fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => EngineConfig::from_json_file(path),
        None => Ok(EngineConfig::default()),
    }
}

/// `--granularity`, else the `plz-Nstellig` file name, else 5-digit.
fn granularity(args: &DatasetArgs) -> Granularity {
    args.granularity.unwrap_or_else(|| {
        args.dataset.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
            .and_then(|stem| stem.parse().ok())
            .unwrap_or(Granularity::FiveDigit)
    })
}

pub fn load_dataset(args: &DatasetArgs, config: &EngineConfig) -> Result<GeometryIndex> {
    let granularity = granularity(args);
    load_index(&args.dataset, granularity, config.outer_frame)
        .with_context(|| format!("[plzmap] cannot load {granularity} dataset"))
}

/// Load the dataset, open the layer, and seed it from the layer file and `--codes`.
pub fn open_session(cli: &Cli, args: &LayerArgs) -> Result<(Session, Option<JsonFileLayerStore>)> {
    let config = engine_config(cli)?;
    let index = Arc::new(load_dataset(&args.dataset, &config)?);
    let mut session = Session::new(args.layer.clone(), index, config);

    let store = args.layers.as_ref().map(JsonFileLayerStore::new);
    if let Some(store) = &store {
        match session.load(store) {
            Ok(()) => info!(layer = %args.layer, codes = session.selection().len(), "loaded layer"),
            Err(StoreError::NotFound(_)) => info!(layer = %args.layer, "starting new layer"),
            Err(e) => return Err(e).with_context(|| format!("reading {}", store.path().display())),
        }
    }
    session.add(&args.codes);
    Ok((session, store))
}

/// Save the layer, write the GeoJSON export and print the selection.
pub fn finish(session: &mut Session, store: Option<&JsonFileLayerStore>, args: &LayerArgs) -> Result<()> {
    if let Some(store) = store {
        let written = session.save(store)
            .with_context(|| format!("writing {}", store.path().display()))?;
        if written { info!(layer = %args.layer, path = %store.path().display(), "saved layer") }
    }
    if let Some(path) = &args.geojson {
        write_geojson(path, session)?;
    }
    println!("{}", session.codes().join(","));
    Ok(())
}

fn write_geojson(path: &Path, session: &Session) -> Result<()> {
    let json = selection_to_geojson(session.index(), &session.codes());
    fs::write(path, serde_json::to_string(&json)?)
        .with_context(|| format!("writing {}", path.display()))
}
