use crate::context::CodecContext;
use crate::packet::{Packet, PacketBuffer, PacketReader};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use tessera_common::{Result, TesseraError};

/// Encoded size of a tile edit: kind, x, y and three payload bytes.
pub const TILE_EDIT_LEN: usize = 8;

/// Kind of a single-tile modification. Unknown bytes are kept so they re-encode unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    KillTile,
    PlaceTile,
    KillWall,
    PlaceWall,
    KillTileNoItem,
    PlaceWire,
    KillWire,
    PoundTile,
    PlaceActuator,
    KillActuator,
    PlaceWire2,
    KillWire2,
    PlaceWire3,
    KillWire3,
    SlopeTile,
    FrameTrack,
    PlaceWire4,
    KillWire4,
    PokeLogicGate,
    Actuate,
    TryKillTile,
    ReplaceTile,
    ReplaceWall,
    SlopePoundTile,
    Unknown(u8),
}

const KNOWN_KINDS: [EditKind; 24] = [
    EditKind::KillTile,
    EditKind::PlaceTile,
    EditKind::KillWall,
    EditKind::PlaceWall,
    EditKind::KillTileNoItem,
    EditKind::PlaceWire,
    EditKind::KillWire,
    EditKind::PoundTile,
    EditKind::PlaceActuator,
    EditKind::KillActuator,
    EditKind::PlaceWire2,
    EditKind::KillWire2,
    EditKind::PlaceWire3,
    EditKind::KillWire3,
    EditKind::SlopeTile,
    EditKind::FrameTrack,
    EditKind::PlaceWire4,
    EditKind::KillWire4,
    EditKind::PokeLogicGate,
    EditKind::Actuate,
    EditKind::TryKillTile,
    EditKind::ReplaceTile,
    EditKind::ReplaceWall,
    EditKind::SlopePoundTile,
];

impl EditKind {
    pub fn from_u8(value: u8) -> Self {
        KNOWN_KINDS
            .get(value as usize)
            .copied()
            .unwrap_or(EditKind::Unknown(value))
    }

    pub fn to_u8(self) -> u8 {
        match self {
            EditKind::Unknown(value) => value,
            known => KNOWN_KINDS
                .iter()
                .position(|kind| *kind == known)
                .map_or(u8::MAX, |index| index as u8),
        }
    }

    fn payload(self) -> PayloadKind {
        match self {
            EditKind::PlaceTile | EditKind::ReplaceTile => PayloadKind::Block,
            EditKind::PlaceWall | EditKind::ReplaceWall => PayloadKind::Wall,
            EditKind::SlopeTile | EditKind::SlopePoundTile => PayloadKind::Shape,
            EditKind::KillTile
            | EditKind::KillWall
            | EditKind::KillTileNoItem
            | EditKind::TryKillTile => PayloadKind::Failure,
            _ => PayloadKind::Opaque,
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EditKind::Unknown(value) => write!(f, "Unknown({})", value),
            known => write!(f, "{:?}", known),
        }
    }
}

/// How the three payload bytes are read for a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadKind {
    Block,
    Wall,
    Shape,
    Failure,
    Opaque,
}

/// Typed view of a tile edit. Each variant carries only the payload its kind uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEditAction {
    KillTile { failed: bool },
    KillWall { failed: bool },
    KillTileNoItem { failed: bool },
    TryKillTile { failed: bool },
    PlaceTile { block: u16, style: u8 },
    ReplaceTile { block: u16, style: u8 },
    PlaceWall { wall: u16 },
    ReplaceWall { wall: u16 },
    SlopeTile { shape: u16 },
    SlopePoundTile { shape: u16 },
    /// Any kind without a typed payload, including unknown kinds.
    Other { kind: EditKind, payload: [u8; 3] },
}

/// A single tile modification. The payload is stored as raw bytes and only interpreted
/// through accessors that match the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEdit {
    kind: EditKind,
    pub x: i16,
    pub y: i16,
    payload: [u8; 3],
}

impl TileEdit {
    pub fn new(kind: EditKind, x: i16, y: i16, payload: [u8; 3]) -> Self {
        Self {
            kind,
            x,
            y,
            payload,
        }
    }

    pub fn place_tile(x: i16, y: i16, block: u16, style: u8) -> Self {
        Self::from_action(TileEditAction::PlaceTile { block, style }, x, y)
    }

    pub fn place_wall(x: i16, y: i16, wall: u16) -> Self {
        Self::from_action(TileEditAction::PlaceWall { wall }, x, y)
    }

    pub fn kill_tile(x: i16, y: i16, failed: bool) -> Self {
        Self::from_action(TileEditAction::KillTile { failed }, x, y)
    }

    pub fn slope_tile(x: i16, y: i16, shape: u16) -> Self {
        Self::from_action(TileEditAction::SlopeTile { shape }, x, y)
    }

    pub fn from_action(action: TileEditAction, x: i16, y: i16) -> Self {
        let (kind, payload) = match action {
            TileEditAction::KillTile { failed } => (EditKind::KillTile, failure_bytes(failed)),
            TileEditAction::KillWall { failed } => (EditKind::KillWall, failure_bytes(failed)),
            TileEditAction::KillTileNoItem { failed } => {
                (EditKind::KillTileNoItem, failure_bytes(failed))
            }
            TileEditAction::TryKillTile { failed } => {
                (EditKind::TryKillTile, failure_bytes(failed))
            }
            TileEditAction::PlaceTile { block, style } => {
                (EditKind::PlaceTile, block_bytes(block, style))
            }
            TileEditAction::ReplaceTile { block, style } => {
                (EditKind::ReplaceTile, block_bytes(block, style))
            }
            TileEditAction::PlaceWall { wall } => (EditKind::PlaceWall, word_bytes(wall)),
            TileEditAction::ReplaceWall { wall } => (EditKind::ReplaceWall, word_bytes(wall)),
            TileEditAction::SlopeTile { shape } => (EditKind::SlopeTile, word_bytes(shape)),
            TileEditAction::SlopePoundTile { shape } => {
                (EditKind::SlopePoundTile, word_bytes(shape))
            }
            TileEditAction::Other { kind, payload } => (kind, payload),
        };
        Self::new(kind, x, y, payload)
    }

    pub fn kind(&self) -> EditKind {
        self.kind
    }

    /// Raw payload bytes, whatever the kind.
    pub fn payload(&self) -> [u8; 3] {
        self.payload
    }

    pub fn action(&self) -> TileEditAction {
        let word = self.word();
        match self.kind {
            EditKind::KillTile => TileEditAction::KillTile { failed: word == 1 },
            EditKind::KillWall => TileEditAction::KillWall { failed: word == 1 },
            EditKind::KillTileNoItem => TileEditAction::KillTileNoItem { failed: word == 1 },
            EditKind::TryKillTile => TileEditAction::TryKillTile { failed: word == 1 },
            EditKind::PlaceTile => TileEditAction::PlaceTile {
                block: word,
                style: self.payload[2],
            },
            EditKind::ReplaceTile => TileEditAction::ReplaceTile {
                block: word,
                style: self.payload[2],
            },
            EditKind::PlaceWall => TileEditAction::PlaceWall { wall: word },
            EditKind::ReplaceWall => TileEditAction::ReplaceWall { wall: word },
            EditKind::SlopeTile => TileEditAction::SlopeTile { shape: word },
            EditKind::SlopePoundTile => TileEditAction::SlopePoundTile { shape: word },
            kind => TileEditAction::Other {
                kind,
                payload: self.payload,
            },
        }
    }

    /// Block id and style of a tile placement.
    pub fn block(&self) -> Result<(u16, u8)> {
        self.expect(PayloadKind::Block, "block")?;
        Ok((self.word(), self.payload[2]))
    }

    pub fn set_block(&mut self, block: u16, style: u8) -> Result<()> {
        self.expect(PayloadKind::Block, "block")?;
        self.payload = block_bytes(block, style);
        Ok(())
    }

    pub fn wall(&self) -> Result<u16> {
        self.expect(PayloadKind::Wall, "wall")?;
        Ok(self.word())
    }

    pub fn set_wall(&mut self, wall: u16) -> Result<()> {
        self.expect(PayloadKind::Wall, "wall")?;
        self.set_word(wall);
        Ok(())
    }

    pub fn shape(&self) -> Result<u16> {
        self.expect(PayloadKind::Shape, "shape")?;
        Ok(self.word())
    }

    pub fn set_shape(&mut self, shape: u16) -> Result<()> {
        self.expect(PayloadKind::Shape, "shape")?;
        self.set_word(shape);
        Ok(())
    }

    /// Whether a kill request was rejected.
    pub fn failed(&self) -> Result<bool> {
        self.expect(PayloadKind::Failure, "failure flag")?;
        Ok(self.word() == 1)
    }

    pub fn set_failed(&mut self, failed: bool) -> Result<()> {
        self.expect(PayloadKind::Failure, "failure flag")?;
        self.set_word(failed as u16);
        Ok(())
    }

    fn expect(&self, wanted: PayloadKind, field: &str) -> Result<()> {
        if self.kind.payload() == wanted {
            Ok(())
        } else {
            Err(TesseraError::UsageError(format!(
                "Tile edit of kind {} has no {}",
                self.kind, field
            )))
        }
    }

    fn word(&self) -> u16 {
        LittleEndian::read_u16(&self.payload[..2])
    }

    fn set_word(&mut self, value: u16) {
        LittleEndian::write_u16(&mut self.payload[..2], value);
    }
}

fn word_bytes(value: u16) -> [u8; 3] {
    let mut payload = [0u8; 3];
    LittleEndian::write_u16(&mut payload[..2], value);
    payload
}

fn block_bytes(block: u16, style: u8) -> [u8; 3] {
    let mut payload = word_bytes(block);
    payload[2] = style;
    payload
}

fn failure_bytes(failed: bool) -> [u8; 3] {
    word_bytes(failed as u16)
}

impl Packet for TileEdit {
    fn packet_id() -> u8 {
        17
    }

    fn read_from_buffer(reader: &mut PacketReader<'_>, _context: &CodecContext) -> Result<Self> {
        let bytes = reader.take(TILE_EDIT_LEN, "tile edit")?;
        Ok(TileEdit {
            kind: EditKind::from_u8(bytes[0]),
            x: LittleEndian::read_i16(&bytes[1..3]),
            y: LittleEndian::read_i16(&bytes[3..5]),
            payload: [bytes[5], bytes[6], bytes[7]],
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer, _context: &CodecContext) -> Result<()> {
        buffer.write_u8(self.kind.to_u8());
        buffer.write_i16(self.x);
        buffer.write_i16(self.y);
        buffer.write_bytes_raw(&self.payload);
        Ok(())
    }
}
