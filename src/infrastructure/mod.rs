pub mod cache;
pub mod logging;
pub mod upstream;

pub use cache::InfoCache;
pub use logging::{init_default_logging, init_logging};
pub use upstream::{EverpayApi, HttpEverpayApi};
