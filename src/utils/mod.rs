pub mod check;
pub mod time_utils;
pub mod units;

pub use check::{check_params, Param};
pub use time_utils::*;
pub use units::{format_base_units, from_base_units, to_base_units};
