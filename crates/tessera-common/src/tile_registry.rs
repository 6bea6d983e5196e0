mod tile_table {
    include!(concat!(env!("OUT_DIR"), "/tile_table.rs"));
}

pub use tile_table::TILE_COUNT;

/// Per block type metadata the codecs need: whether a block carries frame
/// coordinates on the wire, and whether identical neighbours may share a run.
///
/// Built once and handed to the codecs by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRegistry {
    frame_important: Vec<bool>,
    no_batching: Vec<bool>,
}

impl TileRegistry {
    /// Registry for the stock block set, generated from `tiles.json`.
    pub fn vanilla() -> Self {
        Self::from_tables(tile_table::FRAME_IMPORTANT, tile_table::NO_BATCHING)
    }

    /// Registry where only `ids` are frame-important and every type batches.
    pub fn from_frame_important(ids: &[u16]) -> Self {
        Self::from_tables(ids, &[])
    }

    pub fn from_tables(frame_important: &[u16], no_batching: &[u16]) -> Self {
        Self {
            frame_important: to_mask(frame_important),
            no_batching: to_mask(no_batching),
        }
    }

    pub fn is_frame_important(&self, block_id: u16) -> bool {
        self.frame_important
            .get(block_id as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn allows_batching(&self, block_id: u16) -> bool {
        !self
            .no_batching
            .get(block_id as usize)
            .copied()
            .unwrap_or(false)
    }
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::vanilla()
    }
}

fn to_mask(ids: &[u16]) -> Vec<bool> {
    let len = ids.iter().max().map_or(0, |max| *max as usize + 1);
    let mut mask = vec![false; len];
    for id in ids {
        mask[*id as usize] = true;
    }
    mask
}
