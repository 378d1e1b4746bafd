pub mod imports;

pub use imports::{find_related_files, ImportToken};
