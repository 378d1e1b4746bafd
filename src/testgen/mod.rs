pub mod coverage;
pub mod materialize;
pub mod resolve;
