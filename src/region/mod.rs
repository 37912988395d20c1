mod code;
mod granularity;
mod region;

pub use code::{code_from_properties, normalize_code, CODE_KEYS};
pub use granularity::Granularity;
pub use region::{RawRegion, Region, RegionId};
