pub mod params;
pub mod series;
pub mod variant;

pub use params::{encode_bytes32_string, expand_param_directives, merge_params, ParamEncoding, Params};
pub use series::{CostSeries, InvocationResult, Outcome, SeriesStatus};
pub use variant::{Instance, Recipe, Variant};
