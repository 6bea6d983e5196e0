use crate::context::CodecContext;
use crate::entities::{check_list_len, read_list, write_list, Chest, Sign, TileEntity};
use crate::packet::{Packet, PacketBuffer, PacketReader};
use crate::scratch::PooledBuffer;
use crate::section_grid::{read_grid, write_grid};
use crate::tile::TileGrid;
use flate2::bufread::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tessera_common::{Result, TesseraError};
use tessera_logger::LogSeverity::{Debug, Warning};
use tessera_logger::log;

const RAW: u8 = 0;
const DEFLATED: u8 = 1;

/// A rectangular block of the world together with the chests, signs and tile entities
/// that live in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// World X of the top-left tile
    pub x: i32,
    /// World Y of the top-left tile
    pub y: i32,
    pub grid: TileGrid,
    pub chests: Vec<Chest>,
    pub signs: Vec<Sign>,
    pub tile_entities: Vec<TileEntity>,
}

impl Section {
    /// Section without any entities.
    pub fn new(x: i32, y: i32, grid: TileGrid) -> Self {
        Self {
            x,
            y,
            grid,
            chests: Vec::new(),
            signs: Vec::new(),
            tile_entities: Vec::new(),
        }
    }

    fn write_payload(&self, buffer: &mut PacketBuffer, context: &CodecContext) {
        buffer.write_i32(self.x);
        buffer.write_i32(self.y);
        buffer.write_u16(self.grid.width());
        buffer.write_u16(self.grid.height());
        write_grid(buffer, &self.grid, context.registry());
        write_list(buffer, &self.chests);
        write_list(buffer, &self.signs);
        write_list(buffer, &self.tile_entities);
    }

    fn read_payload(bytes: &[u8], context: &CodecContext) -> Result<Self> {
        let mut reader = PacketReader::new(bytes);
        let x = reader.read_i32()?;
        let y = reader.read_i32()?;
        let width = reader.read_u16()?;
        let height = reader.read_u16()?;

        let grid = read_grid(
            &mut reader,
            width,
            height,
            context.registry(),
            context.config().max_section_cells,
        )?;
        let chests = read_list(&mut reader)?;
        let signs = read_list(&mut reader)?;
        let tile_entities = read_list(&mut reader)?;

        if !reader.is_empty() {
            return Err(TesseraError::FramingError(format!(
                "{} trailing bytes after section payload",
                reader.remaining()
            )));
        }

        Ok(Section {
            x,
            y,
            grid,
            chests,
            signs,
            tile_entities,
        })
    }
}

/// Inflates `compressed` into a pooled buffer, refusing anything larger than the
/// configured scratch capacity. The stream must use up all of `compressed`.
fn inflate<'a>(compressed: &[u8], context: &'a CodecContext) -> Result<PooledBuffer<'a>> {
    let capacity = context.config().scratch_capacity;
    let mut scratch = PooledBuffer::rent(context.pool(), capacity + 1);
    let mut decoder = DeflateDecoder::new(compressed);

    // One byte past the capacity is enough to tell that the payload does not fit.
    decoder
        .by_ref()
        .take(capacity as u64 + 1)
        .read_to_end(&mut scratch)
        .map_err(|e| TesseraError::FramingError(format!("Malformed compressed section: {}", e)))?;

    if scratch.len() > capacity {
        log(
            format!(
                "Compressed section inflates past the scratch capacity of {} bytes",
                capacity
            ),
            Warning,
        );
        return Err(TesseraError::FramingError(format!(
            "Decompressed section exceeds {} bytes",
            capacity
        )));
    }

    let consumed = decoder.total_in() as usize;
    if consumed != compressed.len() {
        return Err(TesseraError::FramingError(format!(
            "{} trailing bytes after compressed section",
            compressed.len() - consumed
        )));
    }

    Ok(scratch)
}

impl Packet for Section {
    fn packet_id() -> u8 {
        10
    }

    fn read_from_buffer(reader: &mut PacketReader<'_>, context: &CodecContext) -> Result<Self> {
        let section = match reader.read_u8()? {
            RAW => Self::read_payload(reader.take_rest(), context)?,
            DEFLATED => {
                let scratch = inflate(reader.take_rest(), context)?;
                Self::read_payload(&scratch, context)?
            }
            other => {
                return Err(TesseraError::FramingError(format!(
                    "Unknown section compression flag {}",
                    other
                )))
            }
        };

        log(
            format!(
                "Decoded section at ({}, {}), {}x{} tiles, {} chests, {} signs, {} tile entities",
                section.x,
                section.y,
                section.grid.width(),
                section.grid.height(),
                section.chests.len(),
                section.signs.len(),
                section.tile_entities.len()
            ),
            Debug,
        );
        Ok(section)
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer, context: &CodecContext) -> Result<()> {
        check_list_len(&self.chests)?;
        check_list_len(&self.signs)?;
        check_list_len(&self.tile_entities)?;

        let max_cells = context.config().max_section_cells;
        if self.grid.len() > max_cells {
            return Err(TesseraError::PreconditionError(format!(
                "Section of {}x{} exceeds the limit of {} cells",
                self.grid.width(),
                self.grid.height(),
                max_cells
            )));
        }

        if !context.config().compress_sections {
            buffer.write_u8(RAW);
            self.write_payload(buffer, context);
            return Ok(());
        }

        let mut payload = PacketBuffer::new();
        self.write_payload(&mut payload, context);

        // The receiving side inflates into a buffer of this size.
        let capacity = context.config().scratch_capacity;
        if payload.len() > capacity {
            return Err(TesseraError::PreconditionError(format!(
                "Section payload of {} bytes exceeds the scratch capacity of {} bytes",
                payload.len(),
                capacity
            )));
        }

        let level = Compression::new(context.config().compression_level);
        let mut encoder = DeflateEncoder::new(Vec::new(), level);
        encoder.write_all(payload.get_buffer())?;
        let compressed = encoder.finish()?;

        log(
            format!(
                "Deflated section at ({}, {}) from {} to {} bytes",
                self.x,
                self.y,
                payload.len(),
                compressed.len()
            ),
            Debug,
        );

        buffer.write_u8(DEFLATED);
        buffer.write_bytes_raw(&compressed);
        Ok(())
    }
}
