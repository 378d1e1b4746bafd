pub mod framework;
pub mod language;
