use std::path::PathBuf;

use plzmap::{Granularity, SearchMetric, SelectionMode, TravelMode};

/// Postal-code region selection CLI
#[derive(clap::Parser, Debug)]
#[command(name = "plzmap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Engine configuration file (JSON); flags override it
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Load a region dataset and report what was indexed
    Inspect(DatasetArgs),

    /// Apply codes or a drawn shape to a layer's selection
    Select(SelectArgs),

    /// Add every region touching the selection
    Expand(LayerArgs),

    /// Add unselected regions enclosed by the selection
    FillHoles(LayerArgs),

    /// Add every region intersecting the union of the selection
    Grow(LayerArgs),

    /// Find regions within a distance or travel time of a point
    Search(SearchArgs),
}

#[derive(clap::Args, Debug)]
pub struct DatasetArgs {
    /// Region dataset (.geojson, .geojson.gz or .shp)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub dataset: PathBuf,

    /// Code granularity (1, 2, 3 or 5); guessed from a `plz-Nstellig` file name otherwise
    #[arg(short, long)]
    pub granularity: Option<Granularity>,
}

#[derive(clap::Args, Debug)]
pub struct LayerArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Layer storage file (JSON); the selection is read from and saved to it
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub layers: Option<PathBuf>,

    /// Layer id within the storage file
    #[arg(short, long, default_value = "default")]
    pub layer: String,

    /// Codes to start from, comma separated (in addition to the stored layer)
    #[arg(long, value_delimiter = ',')]
    pub codes: Vec<String>,

    /// Write the resulting selection as GeoJSON
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub geojson: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SelectArgs {
    #[command(flatten)]
    pub layer: LayerArgs,

    /// Drawn shape as JSON, e.g. '{"type":"circle","center":[11.57,48.13],"radius_km":5}'
    #[arg(long)]
    pub shape: Option<String>,

    /// How codes or shape hits are applied
    #[arg(short, long, value_enum, default_value_t = ModeArg::Toggle)]
    pub mode: ModeArg,

    /// Codes to apply with --mode, comma separated
    #[arg(long, value_delimiter = ',')]
    pub apply: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub layer: LayerArgs,

    /// Search center as lon,lat
    #[arg(long, allow_hyphen_values = true)]
    pub center: String,

    /// Radius in km, or in minutes with --metric time
    #[arg(short, long)]
    pub radius: f64,

    #[arg(long, value_enum, default_value_t = MetricArg::Distance)]
    pub metric: MetricArg,

    #[arg(long, value_enum, default_value_t = TravelArg::StraightLine)]
    pub travel: TravelArg,

    /// OSRM-compatible routing service for --travel driving
    #[arg(long)]
    pub routing_url: Option<String>,

    /// Add the hits to the layer's selection
    #[arg(long)]
    pub select: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg { Replace, Add, Toggle, Remove }

impl From<ModeArg> for SelectionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Replace => SelectionMode::Replace,
            ModeArg::Add => SelectionMode::Add,
            ModeArg::Toggle => SelectionMode::Toggle,
            ModeArg::Remove => SelectionMode::Remove,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum MetricArg { Distance, Time }

impl From<MetricArg> for SearchMetric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::Distance => SearchMetric::Distance,
            MetricArg::Time => SearchMetric::Time,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum TravelArg { StraightLine, Driving }

impl From<TravelArg> for TravelMode {
    fn from(travel: TravelArg) -> Self {
        match travel {
            TravelArg::StraightLine => TravelMode::StraightLine,
            TravelArg::Driving => TravelMode::Driving,
        }
    }
}
