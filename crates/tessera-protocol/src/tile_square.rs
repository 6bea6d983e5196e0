//! Square patch of tiles sent without run-length encoding. Every cell gets a flat 16-bit
//! header; cells are visited column by column (x outer, y inner).
//!
//! ```text
//! bit  0 block         bit  6 yellow wire      bit 12 reserved
//! bit  1 wall          bit  7 half block       bits 13-15 slope (0-4)
//! bit  2 liquid        bit  8 actuator
//! bit  3 red wire      bit  9 actuator active
//! bit  4 blue wire     bit 10 block color
//! bit  5 green wire    bit 11 wall color
//! ```

use crate::context::CodecContext;
use crate::packet::{Packet, PacketBuffer, PacketReader};
use crate::tile::{BlockFrame, BlockShape, Liquid, LiquidKind, Tile, TileGrid};
use tessera_common::{Result, TesseraError, TileRegistry};

const BLOCK: u16 = 1 << 0;
const WALL: u16 = 1 << 1;
const LIQUID: u16 = 1 << 2;
const RED_WIRE: u16 = 1 << 3;
const BLUE_WIRE: u16 = 1 << 4;
const GREEN_WIRE: u16 = 1 << 5;
const YELLOW_WIRE: u16 = 1 << 6;
const HALF_BLOCK: u16 = 1 << 7;
const ACTUATOR: u16 = 1 << 8;
const ACTUATOR_ACTIVE: u16 = 1 << 9;
const BLOCK_COLOR: u16 = 1 << 10;
const WALL_COLOR: u16 = 1 << 11;
const RESERVED: u16 = 1 << 12;
const SLOPE_SHIFT: u16 = 13;

/// Set in the size field when a change type byte follows it.
const HAS_CHANGE_TYPE: u16 = 0x8000;
const MAX_SIZE: u16 = 0x7FFF;

/// Smallest encoding of one cell: the bare header.
const MIN_TILE_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSquare {
    /// World X of the top-left tile
    pub x: i16,
    /// World Y of the top-left tile
    pub y: i16,
    /// Optional extra byte describing why the patch was sent.
    pub change_type: Option<u8>,
    /// Must be square with a side of at most 32767.
    pub grid: TileGrid,
}

impl TileSquare {
    pub fn new(x: i16, y: i16, grid: TileGrid) -> Result<Self> {
        check_grid(&grid)?;
        Ok(Self {
            x,
            y,
            change_type: None,
            grid,
        })
    }

    pub fn size(&self) -> u16 {
        self.grid.width()
    }
}

fn check_grid(grid: &TileGrid) -> Result<()> {
    if !grid.is_square() {
        return Err(TesseraError::PreconditionError(format!(
            "Tile square must be square, got {}x{}",
            grid.width(),
            grid.height()
        )));
    }
    if grid.width() > MAX_SIZE {
        return Err(TesseraError::PreconditionError(format!(
            "Tile square side {} exceeds {}",
            grid.width(),
            MAX_SIZE
        )));
    }
    Ok(())
}

fn write_square_tile(buffer: &mut PacketBuffer, tile: &Tile, registry: &TileRegistry) {
    let mut header = 0u16;
    let flags = [
        (tile.has_block(), BLOCK),
        (tile.has_wall(), WALL),
        (tile.liquid.is_present(), LIQUID),
        (tile.red_wire, RED_WIRE),
        (tile.blue_wire, BLUE_WIRE),
        (tile.green_wire, GREEN_WIRE),
        (tile.yellow_wire, YELLOW_WIRE),
        (tile.block_shape.is_half_block(), HALF_BLOCK),
        (tile.actuator, ACTUATOR),
        (tile.actuator_active, ACTUATOR_ACTIVE),
        (tile.block_color != 0, BLOCK_COLOR),
        (tile.wall_color != 0, WALL_COLOR),
    ];
    for (set, bit) in flags {
        if set {
            header |= bit;
        }
    }
    header |= (tile.block_shape.slope() as u16) << SLOPE_SHIFT;
    buffer.write_u16(header);

    if tile.block_color != 0 {
        buffer.write_u8(tile.block_color);
    }
    if tile.wall_color != 0 {
        buffer.write_u8(tile.wall_color);
    }
    if let Some(block) = tile.block {
        buffer.write_u16(block);
        if registry.is_frame_important(block) {
            buffer.write_i16(tile.block_frame.u);
            buffer.write_i16(tile.block_frame.v);
        }
    }
    if tile.has_wall() {
        buffer.write_u16(tile.wall);
    }
    if tile.liquid.is_present() {
        buffer.write_u8(tile.liquid.amount);
        buffer.write_u8(tile.liquid.kind.to_u8());
    }
}

fn read_square_tile(reader: &mut PacketReader<'_>, registry: &TileRegistry) -> Result<Tile> {
    let header = reader.read_u16()?;
    if header & RESERVED != 0 {
        return Err(TesseraError::FramingError(format!(
            "Reserved bit set in square tile header {:#06x}",
            header
        )));
    }

    let slope = (header >> SLOPE_SHIFT) as u8;
    let block_shape = BlockShape::from_parts(header & HALF_BLOCK != 0, slope).ok_or_else(|| {
        TesseraError::FramingError(format!("Invalid slope {} in square tile header", slope))
    })?;

    let mut tile = Tile {
        block_shape,
        red_wire: header & RED_WIRE != 0,
        blue_wire: header & BLUE_WIRE != 0,
        green_wire: header & GREEN_WIRE != 0,
        yellow_wire: header & YELLOW_WIRE != 0,
        actuator: header & ACTUATOR != 0,
        actuator_active: header & ACTUATOR_ACTIVE != 0,
        ..Tile::default()
    };

    if header & BLOCK_COLOR != 0 {
        tile.block_color = reader.read_u8()?;
    }
    if header & WALL_COLOR != 0 {
        tile.wall_color = reader.read_u8()?;
    }
    if header & BLOCK != 0 {
        let block = reader.read_u16()?;
        tile.block = Some(block);
        if registry.is_frame_important(block) {
            tile.block_frame = BlockFrame::new(reader.read_i16()?, reader.read_i16()?);
        }
    }
    if header & WALL != 0 {
        tile.wall = reader.read_u16()?;
    }
    if header & LIQUID != 0 {
        let amount = reader.read_u8()?;
        let kind = reader.read_u8()?;
        let kind = LiquidKind::from_u8(kind).ok_or_else(|| {
            TesseraError::FramingError(format!("Unknown liquid kind {}", kind))
        })?;
        tile.liquid = Liquid::new(kind, amount);
    }

    Ok(tile)
}

impl Packet for TileSquare {
    fn packet_id() -> u8 {
        20
    }

    fn read_from_buffer(reader: &mut PacketReader<'_>, context: &CodecContext) -> Result<Self> {
        let size_field = reader.read_u16()?;
        let size = size_field & MAX_SIZE;
        let change_type = if size_field & HAS_CHANGE_TYPE != 0 {
            Some(reader.read_u8()?)
        } else {
            None
        };
        let x = reader.read_i16()?;
        let y = reader.read_i16()?;

        let cells = size as usize * size as usize;
        if cells > context.config().max_section_cells {
            return Err(TesseraError::FramingError(format!(
                "Tile square of side {} exceeds the limit of {} cells",
                size,
                context.config().max_section_cells
            )));
        }
        if cells * MIN_TILE_LEN > reader.remaining() {
            return Err(TesseraError::truncated(
                "tile square",
                cells * MIN_TILE_LEN,
                reader.remaining(),
            ));
        }

        let mut grid = TileGrid::new(size, size);
        for column in 0..size {
            for row in 0..size {
                let tile = read_square_tile(reader, context.registry())?;
                grid.set(column, row, tile);
            }
        }

        Ok(TileSquare {
            x,
            y,
            change_type,
            grid,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer, context: &CodecContext) -> Result<()> {
        check_grid(&self.grid)?;

        let size = self.size();
        match self.change_type {
            Some(change_type) => {
                buffer.write_u16(size | HAS_CHANGE_TYPE);
                buffer.write_u8(change_type);
            }
            None => buffer.write_u16(size),
        }
        buffer.write_i16(self.x);
        buffer.write_i16(self.y);

        for column in 0..size {
            for row in 0..size {
                if let Some(tile) = self.grid.get(column, row) {
                    write_square_tile(buffer, tile, context.registry());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tessera_common::CodecConfig;

    fn plain_context() -> CodecContext {
        CodecContext::new(
            TileRegistry::from_frame_important(&[21]),
            CodecConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_layout_is_column_major() {
        let context = plain_context();
        let mut grid = TileGrid::new(2, 2);
        grid.set(1, 0, Tile::with_block(7));
        let square = TileSquare::new(-3, 9, grid).unwrap();
        let bytes = square.encode(&context).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x02, 0x00, // size 2
                0xFD, 0xFF, 0x09, 0x00, // origin
                0x00, 0x00, // (0, 0)
                0x00, 0x00, // (0, 1)
                0x01, 0x00, 0x07, 0x00, // (1, 0) block 7
                0x00, 0x00, // (1, 1)
            ]
        );
        assert_eq!(TileSquare::decode(&bytes, &context).unwrap(), square);
    }

    #[test]
    fn test_change_type_sets_sign_bit() {
        let context = plain_context();
        let mut square = TileSquare::new(0, 0, TileGrid::new(1, 1)).unwrap();
        square.change_type = Some(3);
        let bytes = square.encode(&context).unwrap();
        assert_eq!(&bytes[..3], &[0x01, 0x80, 0x03]);
        assert_eq!(TileSquare::decode(&bytes, &context).unwrap(), square);
    }

    #[test]
    fn test_field_order() {
        let context = plain_context();
        let tile = Tile {
            block: Some(21),
            block_frame: BlockFrame::new(18, 36),
            block_color: 4,
            block_shape: BlockShape::SlopeUpLeft,
            wall: 300,
            wall_color: 5,
            liquid: Liquid::new(LiquidKind::Lava, 200),
            red_wire: true,
            actuator: true,
            ..Tile::default()
        };
        let square = TileSquare::new(0, 0, TileGrid::filled(1, 1, tile)).unwrap();
        let bytes = square.encode(&context).unwrap();
        // block, wall, liquid, red, actuator, both colors, slope 4
        let header: u16 = 0b1000_1101_0000_1111;
        assert_eq!(
            &bytes[6..],
            &[
                header as u8,
                (header >> 8) as u8,
                4,
                5,
                21,
                0,
                18,
                0,
                36,
                0,
                0x2C,
                0x01,
                200,
                1
            ]
        );
        assert_eq!(TileSquare::decode(&bytes, &context).unwrap(), square);
    }

    #[test]
    fn test_block_zero_needs_no_sentinel() {
        let context = plain_context();
        let square = TileSquare::new(0, 0, TileGrid::filled(1, 1, Tile::with_block(0))).unwrap();
        let bytes = square.encode(&context).unwrap();
        assert_eq!(&bytes[6..], &[0x01, 0x00, 0x00, 0x00]);
        assert_eq!(TileSquare::decode(&bytes, &context).unwrap(), square);
    }

    #[test]
    fn test_half_block_roundtrip() {
        let context = plain_context();
        let tile = Tile {
            block_shape: BlockShape::HalfBlock,
            ..Tile::with_block(1)
        };
        let square = TileSquare::new(0, 0, TileGrid::filled(3, 3, tile)).unwrap();
        let bytes = square.encode(&context).unwrap();
        assert_eq!(TileSquare::decode(&bytes, &context).unwrap(), square);
    }

    #[test]
    fn test_non_square_is_rejected_before_writing() {
        let context = plain_context();
        assert_matches!(
            TileSquare::new(0, 0, TileGrid::new(2, 3)),
            Err(TesseraError::PreconditionError(_))
        );

        let square = TileSquare {
            x: 0,
            y: 0,
            change_type: None,
            grid: TileGrid::new(3, 2),
        };
        let mut buffer = PacketBuffer::new();
        assert_matches!(
            square.write_to_buffer(&mut buffer, &context),
            Err(TesseraError::PreconditionError(_))
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_invalid_headers() {
        let context = plain_context();
        let prefix = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00];

        // reserved bit
        let bytes = [&prefix[..], &[0x00, 0x10]].concat();
        assert_matches!(
            TileSquare::decode(&bytes, &context),
            Err(TesseraError::FramingError(_))
        );

        // slope 5
        let bytes = [&prefix[..], &[0x01, 0xA0, 0x01, 0x00]].concat();
        assert_matches!(
            TileSquare::decode(&bytes, &context),
            Err(TesseraError::FramingError(_))
        );

        // liquid kind 3
        let bytes = [&prefix[..], &[0x04, 0x00, 0xFF, 0x03]].concat();
        assert_matches!(
            TileSquare::decode(&bytes, &context),
            Err(TesseraError::FramingError(_))
        );
    }

    #[test]
    fn test_truncated_square() {
        let context = plain_context();
        let square = TileSquare::new(5, 5, TileGrid::filled(4, 4, Tile::with_wall(3))).unwrap();
        let bytes = square.encode(&context).unwrap();
        for cut in 0..bytes.len() {
            assert_matches!(
                TileSquare::decode(&bytes[..cut], &context),
                Err(TesseraError::FramingError(_))
            );
        }
    }

    #[test]
    fn test_huge_size_fails_without_allocating() {
        let context = plain_context();
        let bytes = [0xFF, 0x7F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_matches!(
            TileSquare::decode(&bytes, &context),
            Err(TesseraError::FramingError(_))
        );
    }
}
