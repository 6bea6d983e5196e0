pub mod config;
pub mod error;
pub mod tile_registry;
pub mod types;

pub use config::CodecConfig;
pub use error::TesseraError;
pub use tile_registry::TileRegistry;
pub use types::Result;
