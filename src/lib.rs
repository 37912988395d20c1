#![doc = "plzmap public API: postal-code region selection, adjacency and distance search"]
mod adjacency;
mod bulk;
mod config;
mod geom;
mod index;
mod io;
mod region;
mod search;
mod selection;
mod session;
mod shape;

#[doc(inline)]
pub use region::{code_from_properties, normalize_code, Granularity, RawRegion, Region, RegionId, CODE_KEYS};

#[doc(inline)]
pub use geom::{haversine_km, repair_rings, DrawnShape, RepairError, RepairStats, DEFAULT_CIRCLE_VERTICES};

#[doc(inline)]
pub use index::{convert_codes, GeometryIndex, LoadReport, OuterFrame};

#[doc(inline)]
pub use adjacency::{AdjacencyResolver, Neighbors};

#[doc(inline)]
pub use selection::{ChangeListener, SelectionSet};

#[doc(inline)]
pub use shape::{SelectionMode, ShapeSelector};

#[doc(inline)]
pub use bulk::{BulkOperation, BulkOperator};

#[doc(inline)]
#[cfg(feature = "routing")]
pub use search::OsrmRouter;
#[doc(inline)]
pub use search::{
    ApproximationModel, DistanceMatrix, DistanceSearch, RoutingError, RoutingService,
    SearchHit, SearchMetric, SearchOutcome, SearchRequest, SearchResult, TravelMode,
};

#[doc(inline)]
pub use session::{
    IndexCatalog, JsonFileLayerStore, LayerRecord, LayerStore, MemoryLayerStore, Session,
    SessionRegistry, StoreError,
};

#[doc(inline)]
pub use io::{
    load_index, parse_feature_collection, read_dataset, read_geojson, read_shapefile,
    region_bounds, selection_to_geojson, DatasetFormat,
};

#[doc(inline)]
pub use config::{EngineConfig, SearchConfig, SpeedBracket};

/// Cancellation handle accepted by [`DistanceSearch::run`].
pub use tokio_util::sync::CancellationToken;
