use tessera_common::{Result, TesseraError, TileRegistry};

/// Liquid type. Only meaningful while the liquid amount is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LiquidKind {
    #[default]
    Water,
    Lava,
    Honey,
}

impl LiquidKind {
    pub fn to_u8(self) -> u8 {
        match self {
            LiquidKind::Water => 0,
            LiquidKind::Lava => 1,
            LiquidKind::Honey => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LiquidKind::Water),
            1 => Some(LiquidKind::Lava),
            2 => Some(LiquidKind::Honey),
            _ => None,
        }
    }
}

/// Liquid in a cell. An amount of zero means no liquid, whatever the kind says, so two
/// empty liquids always compare equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Liquid {
    pub kind: LiquidKind,
    pub amount: u8,
}

impl Liquid {
    pub const NONE: Liquid = Liquid {
        kind: LiquidKind::Water,
        amount: 0,
    };

    pub fn new(kind: LiquidKind, amount: u8) -> Self {
        Self { kind, amount }
    }

    pub fn is_present(&self) -> bool {
        self.amount != 0
    }
}

impl PartialEq for Liquid {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_present(), other.is_present()) {
            (false, false) => true,
            (true, true) => self.kind == other.kind && self.amount == other.amount,
            _ => false,
        }
    }
}

impl Eq for Liquid {}

/// Slope or half-block state of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockShape {
    #[default]
    Normal,
    HalfBlock,
    SlopeDownRight,
    SlopeDownLeft,
    SlopeUpRight,
    SlopeUpLeft,
}

impl BlockShape {
    /// The 3-bit shape value used by the section header.
    pub fn to_u8(self) -> u8 {
        match self {
            BlockShape::Normal => 0,
            BlockShape::HalfBlock => 1,
            BlockShape::SlopeDownRight => 2,
            BlockShape::SlopeDownLeft => 3,
            BlockShape::SlopeUpRight => 4,
            BlockShape::SlopeUpLeft => 5,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BlockShape::Normal),
            1 => Some(BlockShape::HalfBlock),
            2 => Some(BlockShape::SlopeDownRight),
            3 => Some(BlockShape::SlopeDownLeft),
            4 => Some(BlockShape::SlopeUpRight),
            5 => Some(BlockShape::SlopeUpLeft),
            _ => None,
        }
    }

    /// Slope number, 0 for normal and half blocks, 1 to 4 for slopes.
    pub fn slope(self) -> u8 {
        match self {
            BlockShape::Normal | BlockShape::HalfBlock => 0,
            other => other.to_u8() - 1,
        }
    }

    pub fn is_half_block(self) -> bool {
        self == BlockShape::HalfBlock
    }

    /// Rebuilds a shape from the separate half-block flag and slope number. A slope wins
    /// over the half-block flag.
    pub fn from_parts(half_block: bool, slope: u8) -> Option<Self> {
        match slope {
            0 if half_block => Some(BlockShape::HalfBlock),
            0 => Some(BlockShape::Normal),
            1..=4 => Self::from_u8(slope + 1),
            _ => None,
        }
    }
}

/// Sprite sheet coordinates of a frame-important block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockFrame {
    pub u: i16,
    pub v: i16,
}

impl BlockFrame {
    pub fn new(u: i16, v: i16) -> Self {
        Self { u, v }
    }
}

/// One grid cell. The default value is an empty cell: no block, no wall, no liquid,
/// no wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    /// Block type. `Some(0)` is a real block, distinct from `None`.
    pub block: Option<u16>,
    /// Only carried on the wire for frame-important block types.
    pub block_frame: BlockFrame,
    pub block_color: u8,
    pub block_shape: BlockShape,
    /// Wall type, 0 for no wall.
    pub wall: u16,
    pub wall_color: u8,
    pub liquid: Liquid,
    pub red_wire: bool,
    pub blue_wire: bool,
    pub green_wire: bool,
    pub yellow_wire: bool,
    pub actuator: bool,
    pub actuator_active: bool,
}

impl Tile {
    pub fn with_block(block: u16) -> Self {
        Self {
            block: Some(block),
            ..Self::default()
        }
    }

    pub fn with_wall(wall: u16) -> Self {
        Self {
            wall,
            ..Self::default()
        }
    }

    pub fn has_block(&self) -> bool {
        self.block.is_some()
    }

    pub fn has_wall(&self) -> bool {
        self.wall != 0
    }

    pub fn is_empty(&self) -> bool {
        *self == Tile::default()
    }

    /// Whether the block frame goes on the wire for this tile.
    pub fn has_frame(&self, registry: &TileRegistry) -> bool {
        self.block
            .map_or(false, |block| registry.is_frame_important(block))
    }

    /// The tile as a decoder would see it: frames of blocks that do not carry one are zeroed.
    pub fn normalized(&self, registry: &TileRegistry) -> Tile {
        let mut tile = *self;
        if !tile.has_frame(registry) {
            tile.block_frame = BlockFrame::default();
        }
        if !tile.liquid.is_present() {
            tile.liquid = Liquid::NONE;
        }
        tile
    }
}

/// Dense row-major grid of tiles: the cell at `(x, y)` lives at index `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u16,
    height: u16,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Grid of empty tiles.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::default(); width as usize * height as usize],
        }
    }

    /// Grid filled with copies of `tile`.
    pub fn filled(width: u16, height: u16, tile: Tile) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; width as usize * height as usize],
        }
    }

    pub fn from_tiles(width: u16, height: u16, tiles: Vec<Tile>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(TesseraError::PreconditionError(format!(
                "A {}x{} grid needs {} tiles, got {}",
                width,
                height,
                expected,
                tiles.len()
            )));
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Tile> {
        self.index(x, y).map(|index| &self.tiles[index])
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Tile> {
        self.index(x, y).map(move |index| &mut self.tiles[index])
    }

    /// Replaces the tile at `(x, y)`. Returns false when the position is outside the grid.
    pub fn set(&mut self, x: u16, y: u16, tile: Tile) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = tile;
                true
            }
            None => false,
        }
    }
}
