use bytes::BytesMut;
use std::path::PathBuf;
use tessera::{CodecContext, Message, MessageCodec, Tile, TileGrid};
use tessera_protocol::tile::{BlockFrame, BlockShape, Liquid, LiquidKind};
use tokio_util::codec::Encoder;

/// A surface slice: sky, a dirt layer with grass on top, stone below, a pool of water and
/// a chest sitting on the ground.
pub fn terrain(width: u16, height: u16) -> TileGrid {
    let mut grid = TileGrid::new(width, height);
    let ground = height / 3;
    for x in 0..width {
        for y in ground..height {
            let tile = match y - ground {
                0 => Tile::with_block(2),
                1..=4 => Tile {
                    wall: 2,
                    ..Tile::with_block(0)
                },
                _ => Tile {
                    wall: 1,
                    ..Tile::with_block(1)
                },
            };
            grid.set(x, y, tile);
        }
    }
    for x in 4..9.min(width) {
        grid.set(
            x,
            ground.saturating_sub(1),
            Tile {
                liquid: Liquid::new(LiquidKind::Water, 255),
                ..Tile::default()
            },
        );
    }
    if width > 12 && ground > 0 {
        grid.set(
            12,
            ground - 1,
            Tile {
                block_frame: BlockFrame::new(0, 18),
                ..Tile::with_block(21)
            },
        );
        grid.set(
            11,
            ground,
            Tile {
                block_shape: BlockShape::SlopeDownRight,
                red_wire: true,
                ..Tile::with_block(2)
            },
        );
    }
    grid
}

pub fn encode_stream(messages: &[Message], context: &CodecContext) -> Vec<u8> {
    let mut codec = MessageCodec::new(context.clone());
    let mut stream = BytesMut::new();
    for message in messages {
        codec
            .encode(message.clone(), &mut stream)
            .expect("message should encode");
    }
    stream.to_vec()
}

/// A path under the system temp directory that no other test uses.
pub fn temp_capture_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tessera-{}-{}.bin", std::process::id(), name))
}
