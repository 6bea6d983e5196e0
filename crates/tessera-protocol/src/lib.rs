pub mod context;
pub mod entities;
pub mod frame;
pub mod packet;
pub mod scratch;
pub mod section;
pub mod section_grid;
pub mod tile;
pub mod tile_edit;
pub mod tile_header;
pub mod tile_square;

// Re-export commonly used items
pub use context::CodecContext;
pub use entities::{Chest, ItemSlot, Sign, TileEntity, TileEntityData};
pub use frame::{Message, MessageCodec};
pub use packet::{Packet, PacketBuffer, PacketReader};
pub use scratch::{BufferPool, PooledBuffer, ScratchPool};
pub use section::Section;
pub use tile::{BlockFrame, BlockShape, Liquid, LiquidKind, Tile, TileGrid};
pub use tile_edit::{EditKind, TileEdit, TileEditAction};
pub use tile_square::TileSquare;
