pub mod inspect;

// Re-export commonly used items
pub use tessera_common::{CodecConfig, Result, TesseraError, TileRegistry};
pub use tessera_logger::{log, LogSeverity};
pub use tessera_protocol::{
    CodecContext, EditKind, Message, MessageCodec, Packet, Section, Tile, TileEdit, TileGrid,
    TileSquare,
};
