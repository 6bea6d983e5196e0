//! Run-length encoded tile grid. Cells are visited row by row (y outer, x inner); each run
//! of identical neighbours is written once through the tile header codec together with the
//! number of extra copies.

use crate::packet::{PacketBuffer, PacketReader};
use crate::tile::{Tile, TileGrid};
use crate::tile_header::{read_tile, write_tile};
use tessera_common::{Result, TesseraError, TileRegistry};

/// Cells reserved up front when decoding; larger grids grow as records arrive.
const MAX_PREALLOCATED_CELLS: usize = 64 * 1024;

/// Run being accumulated by the encoder.
struct Run {
    tile: Tile,
    repeats: u16,
    batchable: bool,
}

impl Run {
    fn start(tile: Tile, registry: &TileRegistry) -> Self {
        let batchable = tile
            .block
            .map_or(true, |block| registry.allows_batching(block));
        Self {
            tile,
            repeats: 0,
            batchable,
        }
    }

    fn try_extend(&mut self, tile: &Tile) -> bool {
        if self.batchable && self.repeats < u16::MAX && self.tile == *tile {
            self.repeats += 1;
            true
        } else {
            false
        }
    }
}

pub fn encode_grid(grid: &TileGrid, registry: &TileRegistry) -> Vec<u8> {
    let mut buffer = PacketBuffer::new();
    write_grid(&mut buffer, grid, registry);
    buffer.into_inner()
}

pub fn decode_grid(
    bytes: &[u8],
    width: u16,
    height: u16,
    registry: &TileRegistry,
    max_cells: usize,
) -> Result<TileGrid> {
    let mut reader = PacketReader::new(bytes);
    read_grid(&mut reader, width, height, registry, max_cells)
}

/// Writes the grid's cells. Width and height are not part of the output.
pub fn write_grid(buffer: &mut PacketBuffer, grid: &TileGrid, registry: &TileRegistry) {
    let mut run: Option<Run> = None;

    for tile in grid.tiles() {
        // Compare what the decoder will see, not fields that never reach the wire.
        let tile = tile.normalized(registry);
        if let Some(current) = run.as_mut() {
            if current.try_extend(&tile) {
                continue;
            }
        }
        if let Some(finished) = run.replace(Run::start(tile, registry)) {
            write_tile(buffer, &finished.tile, finished.repeats, registry);
        }
    }

    if let Some(finished) = run {
        write_tile(buffer, &finished.tile, finished.repeats, registry);
    }
}

/// Reads records until exactly `width * height` cells are filled. Grids with more than
/// `max_cells` cells are refused before any record is read.
pub fn read_grid(
    reader: &mut PacketReader<'_>,
    width: u16,
    height: u16,
    registry: &TileRegistry,
    max_cells: usize,
) -> Result<TileGrid> {
    let cells = width as usize * height as usize;
    if cells > max_cells {
        return Err(TesseraError::FramingError(format!(
            "Grid of {}x{} exceeds the limit of {} cells",
            width, height, max_cells
        )));
    }
    let mut tiles: Vec<Tile> = Vec::with_capacity(cells.min(MAX_PREALLOCATED_CELLS));

    while tiles.len() < cells {
        let record = read_tile(reader, registry)?;
        let left = cells - tiles.len() - 1;
        let repeats = record.run_length as usize;
        if repeats > left {
            return Err(TesseraError::FramingError(format!(
                "Run of {} copies overflows the grid at cell {} of {}",
                repeats,
                tiles.len(),
                cells
            )));
        }
        tiles.push(record.tile);
        tiles.extend(std::iter::repeat(record.tile).take(repeats));
    }

    TileGrid::from_tiles(width, height, tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{BlockFrame, Liquid, LiquidKind};
    use assert_matches::assert_matches;
    use tessera_common::config::DEFAULT_MAX_SECTION_CELLS;

    fn plain_registry() -> TileRegistry {
        TileRegistry::from_frame_important(&[])
    }

    fn roundtrip(grid: &TileGrid, registry: &TileRegistry) -> Vec<u8> {
        let bytes = encode_grid(grid, registry);
        let decoded = decode_grid(
            &bytes,
            grid.width(),
            grid.height(),
            registry,
            DEFAULT_MAX_SECTION_CELLS,
        )
        .unwrap();
        assert_eq!(&decoded, grid);
        bytes
    }

    /// Deterministic pseudo-random grid with short runs.
    fn noisy_grid(width: u16, height: u16) -> TileGrid {
        let mut state = 0x2545_F491u32;
        let mut tiles = Vec::new();
        for _ in 0..(width as usize * height as usize) {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let tile = match state % 5 {
                0 => Tile::default(),
                1 => Tile::with_block((state >> 8) as u16 % 3),
                2 => Tile::with_wall(1 + (state >> 12) as u16 % 400),
                3 => Tile {
                    liquid: Liquid::new(LiquidKind::Water, 255),
                    ..Tile::default()
                },
                _ => Tile {
                    red_wire: true,
                    actuator: state & 1 == 0,
                    ..Tile::with_block(1)
                },
            };
            tiles.push(tile);
        }
        TileGrid::from_tiles(width, height, tiles).unwrap()
    }

    #[test]
    fn test_three_empty_tiles() {
        let grid = TileGrid::new(3, 1);
        let bytes = roundtrip(&grid, &plain_registry());
        assert_eq!(bytes, vec![0x40, 0x02]);
    }

    #[test]
    fn test_single_cell() {
        let grid = TileGrid::filled(1, 1, Tile::with_block(5));
        let bytes = roundtrip(&grid, &plain_registry());
        assert_eq!(bytes, vec![0x02, 0x04]);
    }

    #[test]
    fn test_empty_grid() {
        let grid = TileGrid::new(0, 0);
        let bytes = roundtrip(&grid, &plain_registry());
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_every_cell_differs() {
        let tiles = (0..12u16).map(|i| Tile::with_block(i + 1)).collect();
        let grid = TileGrid::from_tiles(4, 3, tiles).unwrap();
        let bytes = roundtrip(&grid, &plain_registry());
        // One header byte and one id byte per cell, no run lengths.
        assert_eq!(bytes.len(), 24);
        assert!(bytes.chunks(2).all(|record| record[0] == 0x02));
    }

    #[test]
    fn test_single_maximal_run_uses_word_length() {
        let grid = TileGrid::filled(200, 150, Tile::with_block(1));
        let bytes = roundtrip(&grid, &plain_registry());
        // 29999 = 0x752F
        assert_eq!(bytes, vec![0x82, 0x00, 0x2F, 0x75]);
    }

    #[test]
    fn test_run_continues_across_rows() {
        let mut grid = TileGrid::new(4, 2);
        for x in 2..4 {
            grid.set(x, 0, Tile::with_wall(9));
        }
        for x in 0..2 {
            grid.set(x, 1, Tile::with_wall(9));
        }
        let bytes = roundtrip(&grid, &plain_registry());
        // empty x2, wall x4, empty x2
        assert_eq!(bytes, vec![0x40, 0x01, 0x44, 0x09, 0x03, 0x40, 0x01]);
    }

    #[test]
    fn test_run_longer_than_u16_splits() {
        let registry = plain_registry();
        let grid = TileGrid::filled(300, 300, Tile::default());
        let bytes = roundtrip(&grid, &registry);
        // 90000 cells = 65536 + 24464
        assert_eq!(bytes, vec![0x80, 0xFF, 0xFF, 0x80, 0x8F, 0x5F]);
    }

    #[test]
    fn test_non_batching_blocks_are_not_merged() {
        let registry = TileRegistry::from_tables(&[], &[423]);
        let grid = TileGrid::filled(3, 1, Tile::with_block(423));
        let bytes = roundtrip(&grid, &registry);
        // 422 = 0x01A6, written once per cell
        assert_eq!(bytes, vec![0x22, 0xA6, 0x01, 0x22, 0xA6, 0x01, 0x22, 0xA6, 0x01]);
    }

    #[test]
    fn test_unused_frames_do_not_split_runs() {
        let registry = plain_registry();
        let mut grid = TileGrid::filled(2, 1, Tile::with_block(1));
        grid.set(
            1,
            0,
            Tile {
                block_frame: BlockFrame::new(18, 0),
                ..Tile::with_block(1)
            },
        );
        let bytes = encode_grid(&grid, &registry);
        assert_eq!(bytes, vec![0x42, 0x00, 0x01]);
    }

    #[test]
    fn test_reencoding_is_canonical() {
        let registry = TileRegistry::vanilla();
        let grid = noisy_grid(37, 23);
        let first = encode_grid(&grid, &registry);
        let decoded = decode_grid(&first, 37, 23, &registry, DEFAULT_MAX_SECTION_CELLS).unwrap();
        let second = encode_grid(&decoded, &registry);
        assert_eq!(first, second);
        assert_eq!(decoded, grid);
    }

    #[test]
    fn test_run_overflowing_grid_is_rejected() {
        // Three empty cells claimed for a 2x1 grid.
        let result = decode_grid(&[0x40, 0x02], 2, 1, &plain_registry(), 16);
        assert_matches!(result, Err(TesseraError::FramingError(_)));
    }

    #[test]
    fn test_truncated_grid_is_rejected() {
        let registry = plain_registry();
        let grid = noisy_grid(8, 8);
        let bytes = encode_grid(&grid, &registry);
        let result = decode_grid(&bytes[..bytes.len() - 1], 8, 8, &registry, 64);
        assert_matches!(result, Err(TesseraError::FramingError(_)));
    }

    #[test]
    fn test_decode_stops_after_last_cell() {
        let registry = plain_registry();
        let mut bytes = encode_grid(&TileGrid::new(2, 2), &registry);
        let grid_len = bytes.len();
        bytes.extend_from_slice(&[0x02, 0x04]);

        let mut reader = PacketReader::new(&bytes);
        let grid = read_grid(&mut reader, 2, 2, &registry, 4).unwrap();
        assert_eq!(grid, TileGrid::new(2, 2));
        assert_eq!(reader.get_cursor(), grid_len);
    }

    #[test]
    fn test_cell_limit_checked_before_reading() {
        let registry = plain_registry();
        // One record claiming 65536 empty cells.
        let bytes = [0x80, 0xFF, 0xFF];
        let result = decode_grid(&bytes, 256, 256, &registry, 65535);
        assert_matches!(result, Err(TesseraError::FramingError(_)));

        let mut reader = PacketReader::new(&bytes);
        let result = read_grid(&mut reader, u16::MAX, u16::MAX, &registry, 1 << 20);
        assert_matches!(result, Err(TesseraError::FramingError(_)));
        assert_eq!(reader.get_cursor(), 0);

        let grid = decode_grid(&bytes, 256, 256, &registry, 65536).unwrap();
        assert_eq!(grid, TileGrid::new(256, 256));
    }
}
