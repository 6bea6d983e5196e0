//! Per-tile record of the section grid: up to three chained header bytes, the fields they
//! announce, and an optional run length.
//!
//! ```text
//! primary    bit 0    secondary header follows
//!            bit 1    block present
//!            bit 2    wall present
//!            bit 3-4  liquid: 0 none, 1 water, 2 lava, 3 honey
//!            bit 5    stored block id uses two bytes
//!            bit 6-7  run length: 0 none, 1 one byte, 2 two bytes
//! secondary  bit 0    tertiary header follows
//!            bit 1-3  red, blue, green wire
//!            bit 4-6  block shape
//! tertiary   bit 1    actuator
//!            bit 2    actuator active
//!            bit 3    block color present
//!            bit 4    wall color present
//!            bit 5    yellow wire
//!            bit 6    wall id uses two bytes
//! ```
//!
//! Fields follow in a fixed order: block id, block frame, block color, wall id low byte,
//! wall color, liquid amount, wall id high byte, run length. The block id is stored minus
//! one, so block 0 is written as 0xFFFF.

use crate::packet::{PacketBuffer, PacketReader};
use crate::tile::{BlockFrame, BlockShape, Liquid, LiquidKind, Tile};
use tessera_common::{Result, TesseraError, TileRegistry};

const HAS_SECONDARY: u8 = 0b0000_0001;
const HAS_BLOCK: u8 = 0b0000_0010;
const HAS_WALL: u8 = 0b0000_0100;
const LIQUID_SHIFT: u8 = 3;
const LIQUID_MASK: u8 = 0b0001_1000;
const BLOCK_ID_WIDE: u8 = 0b0010_0000;
const RUN_SHIFT: u8 = 6;
const RUN_BYTE: u8 = 0b0100_0000;
const RUN_WORD: u8 = 0b1000_0000;

const HAS_TERTIARY: u8 = 0b0000_0001;
const RED_WIRE: u8 = 0b0000_0010;
const BLUE_WIRE: u8 = 0b0000_0100;
const GREEN_WIRE: u8 = 0b0000_1000;
const SHAPE_SHIFT: u8 = 4;
const SHAPE_MASK: u8 = 0b0111_0000;
const SECONDARY_RESERVED: u8 = 0b1000_0000;

const ACTUATOR: u8 = 0b0000_0010;
const ACTUATOR_ACTIVE: u8 = 0b0000_0100;
const BLOCK_COLOR: u8 = 0b0000_1000;
const WALL_COLOR: u8 = 0b0001_0000;
const YELLOW_WIRE: u8 = 0b0010_0000;
const WALL_ID_WIDE: u8 = 0b0100_0000;
const TERTIARY_RESERVED: u8 = 0b1000_0001;

/// Block id 2, frame 4, colors 2, wall 2, liquid 1, run length 2.
const MAX_FIELD_BYTES: usize = 13;

/// A decoded tile plus the number of additional copies that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRecord {
    pub tile: Tile,
    pub run_length: u16,
}

/// Field bytes collected before the headers are known.
struct FieldBytes {
    bytes: [u8; MAX_FIELD_BYTES],
    len: usize,
}

impl FieldBytes {
    fn new() -> Self {
        Self {
            bytes: [0; MAX_FIELD_BYTES],
            len: 0,
        }
    }

    fn push(&mut self, byte: u8) {
        self.bytes[self.len] = byte;
        self.len += 1;
    }

    fn push_u16(&mut self, value: u16) {
        self.push(value as u8);
        self.push((value >> 8) as u8);
    }

    fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Encodes a single tile without a run length.
pub fn encode_tile(tile: &Tile, registry: &TileRegistry) -> Vec<u8> {
    let mut buffer = PacketBuffer::with_capacity(3 + MAX_FIELD_BYTES);
    write_tile(&mut buffer, tile, 0, registry);
    buffer.into_inner()
}

/// Decodes a single tile record. The byte count includes any run length bytes.
pub fn decode_tile(bytes: &[u8], registry: &TileRegistry) -> Result<(Tile, usize)> {
    let mut reader = PacketReader::new(bytes);
    let record = read_tile(&mut reader, registry)?;
    Ok((record.tile, reader.get_cursor()))
}

/// Writes `tile` followed by `run_length` additional copies' worth of run length.
pub fn write_tile(buffer: &mut PacketBuffer, tile: &Tile, run_length: u16, registry: &TileRegistry) {
    let mut primary = 0u8;
    let mut secondary = 0u8;
    let mut tertiary = 0u8;
    let mut fields = FieldBytes::new();

    if let Some(block) = tile.block {
        primary |= HAS_BLOCK;
        let stored = block.wrapping_sub(1);
        fields.push(stored as u8);
        if stored > 0xFF {
            primary |= BLOCK_ID_WIDE;
            fields.push((stored >> 8) as u8);
        }
        if registry.is_frame_important(block) {
            fields.push_u16(tile.block_frame.u as u16);
            fields.push_u16(tile.block_frame.v as u16);
        }
    }

    if tile.block_color != 0 {
        tertiary |= BLOCK_COLOR;
        fields.push(tile.block_color);
    }

    if tile.wall != 0 {
        primary |= HAS_WALL;
        fields.push(tile.wall as u8);
    }

    if tile.wall_color != 0 {
        tertiary |= WALL_COLOR;
        fields.push(tile.wall_color);
    }

    if tile.liquid.is_present() {
        primary |= (tile.liquid.kind.to_u8() + 1) << LIQUID_SHIFT;
        fields.push(tile.liquid.amount);
    }

    if tile.wall > 0xFF {
        tertiary |= WALL_ID_WIDE;
        fields.push((tile.wall >> 8) as u8);
    }

    if run_length > 0 {
        fields.push(run_length as u8);
        if run_length > 0xFF {
            primary |= RUN_WORD;
            fields.push((run_length >> 8) as u8);
        } else {
            primary |= RUN_BYTE;
        }
    }

    if tile.red_wire {
        secondary |= RED_WIRE;
    }
    if tile.blue_wire {
        secondary |= BLUE_WIRE;
    }
    if tile.green_wire {
        secondary |= GREEN_WIRE;
    }
    secondary |= tile.block_shape.to_u8() << SHAPE_SHIFT;

    if tile.actuator {
        tertiary |= ACTUATOR;
    }
    if tile.actuator_active {
        tertiary |= ACTUATOR_ACTIVE;
    }
    if tile.yellow_wire {
        tertiary |= YELLOW_WIRE;
    }

    // Each header only exists when it or a later one carries something.
    if tertiary != 0 {
        secondary |= HAS_TERTIARY;
    }
    if secondary != 0 {
        primary |= HAS_SECONDARY;
    }

    buffer.write_u8(primary);
    if secondary != 0 {
        buffer.write_u8(secondary);
    }
    if tertiary != 0 {
        buffer.write_u8(tertiary);
    }
    buffer.write_bytes_raw(fields.as_slice());
}

/// Reads one tile record written by [`write_tile`].
pub fn read_tile(reader: &mut PacketReader<'_>, registry: &TileRegistry) -> Result<TileRecord> {
    let primary = reader.read_u8()?;
    let secondary = if primary & HAS_SECONDARY != 0 {
        reader.read_u8()?
    } else {
        0
    };
    let tertiary = if secondary & HAS_TERTIARY != 0 {
        reader.read_u8()?
    } else {
        0
    };

    if secondary & SECONDARY_RESERVED != 0 || tertiary & TERTIARY_RESERVED != 0 {
        return Err(TesseraError::FramingError(format!(
            "Reserved tile header bits set: {:#04x} {:#04x}",
            secondary, tertiary
        )));
    }

    let mut tile = Tile::default();

    if primary & HAS_BLOCK != 0 {
        let mut stored = reader.read_u8()? as u16;
        if primary & BLOCK_ID_WIDE != 0 {
            stored |= (reader.read_u8()? as u16) << 8;
        }
        let block = stored.wrapping_add(1);
        tile.block = Some(block);
        if registry.is_frame_important(block) {
            tile.block_frame = BlockFrame::new(reader.read_i16()?, reader.read_i16()?);
        }
    } else if primary & BLOCK_ID_WIDE != 0 {
        return Err(TesseraError::FramingError(
            "Two-byte block id flag set without a block".to_string(),
        ));
    }

    if tertiary & BLOCK_COLOR != 0 {
        tile.block_color = reader.read_u8()?;
    }

    if primary & HAS_WALL != 0 {
        tile.wall = reader.read_u8()? as u16;
    }

    if tertiary & WALL_COLOR != 0 {
        tile.wall_color = reader.read_u8()?;
    }

    let liquid_bits = (primary & LIQUID_MASK) >> LIQUID_SHIFT;
    if liquid_bits != 0 {
        let kind = LiquidKind::from_u8(liquid_bits - 1).unwrap_or_default();
        tile.liquid = Liquid::new(kind, reader.read_u8()?);
    }

    if tertiary & WALL_ID_WIDE != 0 {
        if primary & HAS_WALL == 0 {
            return Err(TesseraError::FramingError(
                "Two-byte wall id flag set without a wall".to_string(),
            ));
        }
        tile.wall |= (reader.read_u8()? as u16) << 8;
    }

    let run_length = match primary >> RUN_SHIFT {
        0 => 0,
        1 => reader.read_u8()? as u16,
        2 => reader.read_u16()?,
        _ => {
            return Err(TesseraError::FramingError(
                "Invalid run length selector 3".to_string(),
            ))
        }
    };

    let shape_bits = (secondary & SHAPE_MASK) >> SHAPE_SHIFT;
    tile.block_shape = BlockShape::from_u8(shape_bits).ok_or_else(|| {
        TesseraError::FramingError(format!("Invalid block shape {}", shape_bits))
    })?;

    tile.red_wire = secondary & RED_WIRE != 0;
    tile.blue_wire = secondary & BLUE_WIRE != 0;
    tile.green_wire = secondary & GREEN_WIRE != 0;
    tile.actuator = tertiary & ACTUATOR != 0;
    tile.actuator_active = tertiary & ACTUATOR_ACTIVE != 0;
    tile.yellow_wire = tertiary & YELLOW_WIRE != 0;

    Ok(TileRecord { tile, run_length })
}
