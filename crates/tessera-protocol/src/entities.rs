//! Auxiliary records that trail the tile grid of a section: chests, signs and tile entities.
//! Each list is a u16 count followed by that many records.

use crate::packet::{PacketBuffer, PacketReader};
use tessera_common::{Result, TesseraError};

/// A record with a fixed per-kind wire layout.
pub trait EntityRecord: Sized {
    /// Used in error messages.
    const NAME: &'static str;

    fn read(reader: &mut PacketReader<'_>) -> Result<Self>;

    fn write(&self, buffer: &mut PacketBuffer);
}

/// Rejects lists whose length does not fit the u16 count.
pub fn check_list_len<T: EntityRecord>(items: &[T]) -> Result<()> {
    if items.len() > u16::MAX as usize {
        return Err(TesseraError::PreconditionError(format!(
            "Too many {} records: {} (max {})",
            T::NAME,
            items.len(),
            u16::MAX
        )));
    }
    Ok(())
}

/// Writes a count-prefixed list. Callers check the length with [`check_list_len`] first.
pub fn write_list<T: EntityRecord>(buffer: &mut PacketBuffer, items: &[T]) {
    buffer.write_u16(items.len() as u16);
    for item in items {
        item.write(buffer);
    }
}

pub fn read_list<T: EntityRecord>(reader: &mut PacketReader<'_>) -> Result<Vec<T>> {
    let count = reader.read_u16()? as usize;
    // Every record takes at least one byte.
    let mut items = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        items.push(T::read(reader)?);
    }
    Ok(items)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chest {
    pub index: i16,
    pub x: i16,
    pub y: i16,
    pub name: String,
}

impl EntityRecord for Chest {
    const NAME: &'static str = "chest";

    fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Chest {
            index: reader.read_i16()?,
            x: reader.read_i16()?,
            y: reader.read_i16()?,
            name: reader.read_string()?,
        })
    }

    fn write(&self, buffer: &mut PacketBuffer) {
        buffer.write_i16(self.index);
        buffer.write_i16(self.x);
        buffer.write_i16(self.y);
        buffer.write_string(&self.name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sign {
    pub index: i16,
    pub x: i16,
    pub y: i16,
    pub text: String,
}

impl EntityRecord for Sign {
    const NAME: &'static str = "sign";

    fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(Sign {
            index: reader.read_i16()?,
            x: reader.read_i16()?,
            y: reader.read_i16()?,
            text: reader.read_string()?,
        })
    }

    fn write(&self, buffer: &mut PacketBuffer) {
        buffer.write_i16(self.index);
        buffer.write_i16(self.x);
        buffer.write_i16(self.y);
        buffer.write_string(&self.text);
    }
}

/// An item held by a tile entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemSlot {
    pub net_id: i16,
    pub prefix: u8,
    pub stack: i16,
}

impl ItemSlot {
    fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        Ok(ItemSlot {
            net_id: reader.read_i16()?,
            prefix: reader.read_u8()?,
            stack: reader.read_i16()?,
        })
    }

    fn write(&self, buffer: &mut PacketBuffer) {
        buffer.write_i16(self.net_id);
        buffer.write_u8(self.prefix);
        buffer.write_i16(self.stack);
    }
}

/// Kind-specific part of a tile entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEntityData {
    TrainingDummy { npc: i16 },
    ItemFrame { item: ItemSlot },
    LogicSensor { check: u8, on: bool },
    DisplayDoll {
        items: [Option<ItemSlot>; 8],
        dyes: [Option<ItemSlot>; 8],
    },
    WeaponsRack { item: ItemSlot },
    HatRack {
        items: [Option<ItemSlot>; 2],
        dyes: [Option<ItemSlot>; 2],
    },
    FoodPlatter { item: ItemSlot },
    TeleportationPylon,
}

impl TileEntityData {
    pub fn kind(&self) -> u8 {
        match self {
            TileEntityData::TrainingDummy { .. } => 0,
            TileEntityData::ItemFrame { .. } => 1,
            TileEntityData::LogicSensor { .. } => 2,
            TileEntityData::DisplayDoll { .. } => 3,
            TileEntityData::WeaponsRack { .. } => 4,
            TileEntityData::HatRack { .. } => 5,
            TileEntityData::FoodPlatter { .. } => 6,
            TileEntityData::TeleportationPylon => 7,
        }
    }
}

/// Bit `i` of the mask is set when slot `i` holds an item.
fn slot_mask(slots: &[Option<ItemSlot>]) -> u8 {
    slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_some())
        .fold(0u8, |mask, (index, _)| mask | (1 << index))
}

fn write_slots(buffer: &mut PacketBuffer, slots: &[Option<ItemSlot>]) {
    for slot in slots.iter().flatten() {
        slot.write(buffer);
    }
}

fn read_slots<const N: usize>(
    reader: &mut PacketReader<'_>,
    mask: u8,
) -> Result<[Option<ItemSlot>; N]> {
    let mut slots = [None; N];
    for (index, slot) in slots.iter_mut().enumerate() {
        if mask & (1 << index) != 0 {
            *slot = Some(ItemSlot::read(reader)?);
        }
    }
    Ok(slots)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEntity {
    pub id: i32,
    pub x: i16,
    pub y: i16,
    pub data: TileEntityData,
}

impl EntityRecord for TileEntity {
    const NAME: &'static str = "tile entity";

    fn read(reader: &mut PacketReader<'_>) -> Result<Self> {
        let kind = reader.read_u8()?;
        let id = reader.read_i32()?;
        let x = reader.read_i16()?;
        let y = reader.read_i16()?;

        let data = match kind {
            0 => TileEntityData::TrainingDummy {
                npc: reader.read_i16()?,
            },
            1 => TileEntityData::ItemFrame {
                item: ItemSlot::read(reader)?,
            },
            2 => TileEntityData::LogicSensor {
                check: reader.read_u8()?,
                on: reader.read_bool()?,
            },
            3 => {
                let item_mask = reader.read_u8()?;
                let dye_mask = reader.read_u8()?;
                TileEntityData::DisplayDoll {
                    items: read_slots(reader, item_mask)?,
                    dyes: read_slots(reader, dye_mask)?,
                }
            }
            4 => TileEntityData::WeaponsRack {
                item: ItemSlot::read(reader)?,
            },
            5 => {
                let mask = reader.read_u8()?;
                if mask & 0xF0 != 0 {
                    return Err(TesseraError::FramingError(format!(
                        "Invalid hat rack slot mask {:#04x}",
                        mask
                    )));
                }
                TileEntityData::HatRack {
                    items: read_slots(reader, mask & 0b0011)?,
                    dyes: read_slots(reader, mask >> 2)?,
                }
            }
            6 => TileEntityData::FoodPlatter {
                item: ItemSlot::read(reader)?,
            },
            7 => TileEntityData::TeleportationPylon,
            other => {
                return Err(TesseraError::FramingError(format!(
                    "Unknown tile entity kind {}",
                    other
                )))
            }
        };

        Ok(TileEntity { id, x, y, data })
    }

    fn write(&self, buffer: &mut PacketBuffer) {
        buffer.write_u8(self.data.kind());
        buffer.write_i32(self.id);
        buffer.write_i16(self.x);
        buffer.write_i16(self.y);

        match &self.data {
            TileEntityData::TrainingDummy { npc } => buffer.write_i16(*npc),
            TileEntityData::ItemFrame { item }
            | TileEntityData::WeaponsRack { item }
            | TileEntityData::FoodPlatter { item } => item.write(buffer),
            TileEntityData::LogicSensor { check, on } => {
                buffer.write_u8(*check);
                buffer.write_bool(*on);
            }
            TileEntityData::DisplayDoll { items, dyes } => {
                buffer.write_u8(slot_mask(items));
                buffer.write_u8(slot_mask(dyes));
                write_slots(buffer, items);
                write_slots(buffer, dyes);
            }
            TileEntityData::HatRack { items, dyes } => {
                buffer.write_u8(slot_mask(items) | (slot_mask(dyes) << 2));
                write_slots(buffer, items);
                write_slots(buffer, dyes);
            }
            TileEntityData::TeleportationPylon => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn roundtrip<T: EntityRecord + PartialEq + std::fmt::Debug>(record: &T) -> Vec<u8> {
        let mut buffer = PacketBuffer::new();
        record.write(&mut buffer);
        let bytes = buffer.into_inner();
        let mut reader = PacketReader::new(&bytes);
        assert_eq!(&T::read(&mut reader).unwrap(), record);
        assert!(reader.is_empty());
        bytes
    }

    fn item(net_id: i16) -> ItemSlot {
        ItemSlot {
            net_id,
            prefix: 3,
            stack: 1,
        }
    }

    #[test]
    fn test_chest_layout() {
        let chest = Chest {
            index: 7,
            x: 100,
            y: -1,
            name: "Loot".to_string(),
        };
        let bytes = roundtrip(&chest);
        assert_eq!(
            bytes,
            vec![7, 0, 100, 0, 0xFF, 0xFF, 4, b'L', b'o', b'o', b't']
        );
    }

    #[test]
    fn test_sign_roundtrip() {
        roundtrip(&Sign {
            index: 0,
            x: 12,
            y: 34,
            text: "Welcome\nhome 🏠".to_string(),
        });
    }

    #[test]
    fn test_every_tile_entity_kind_roundtrips() {
        let kinds = vec![
            TileEntityData::TrainingDummy { npc: -1 },
            TileEntityData::ItemFrame { item: item(29) },
            TileEntityData::LogicSensor { check: 2, on: true },
            TileEntityData::DisplayDoll {
                items: [Some(item(1)), None, None, Some(item(4)), None, None, None, Some(item(8))],
                dyes: [None, Some(item(1007)), None, None, None, None, None, None],
            },
            TileEntityData::WeaponsRack { item: item(46) },
            TileEntityData::HatRack {
                items: [None, Some(item(2))],
                dyes: [Some(item(1008)), None],
            },
            TileEntityData::FoodPlatter { item: item(353) },
            TileEntityData::TeleportationPylon,
        ];

        for (expected_kind, data) in kinds.into_iter().enumerate() {
            assert_eq!(data.kind() as usize, expected_kind);
            let entity = TileEntity {
                id: 1000 + expected_kind as i32,
                x: 5,
                y: 6,
                data,
            };
            let bytes = roundtrip(&entity);
            assert_eq!(bytes[0] as usize, expected_kind);
        }
    }

    #[test]
    fn test_hat_rack_mask_layout() {
        let entity = TileEntity {
            id: 1,
            x: 0,
            y: 0,
            data: TileEntityData::HatRack {
                items: [None, Some(item(2))],
                dyes: [Some(item(9)), None],
            },
        };
        let bytes = roundtrip(&entity);
        // kind, id (4), x (2), y (2), mask
        assert_eq!(bytes[9], 0b0110);
        assert_eq!(bytes.len(), 10 + 2 * 5);
    }

    #[test]
    fn test_unknown_tile_entity_kind() {
        let bytes = [9, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = PacketReader::new(&bytes);
        assert_matches!(
            TileEntity::read(&mut reader),
            Err(TesseraError::FramingError(_))
        );
    }

    #[test]
    fn test_list_roundtrip_and_truncation() {
        let signs = vec![
            Sign {
                index: 1,
                x: 2,
                y: 3,
                text: "a".to_string(),
            },
            Sign {
                index: 4,
                x: 5,
                y: 6,
                text: String::new(),
            },
        ];
        let mut buffer = PacketBuffer::new();
        write_list(&mut buffer, &signs);
        let bytes = buffer.into_inner();
        assert_eq!(&bytes[..2], &[2, 0]);

        let mut reader = PacketReader::new(&bytes);
        assert_eq!(read_list::<Sign>(&mut reader).unwrap(), signs);

        let mut reader = PacketReader::new(&bytes[..bytes.len() - 1]);
        assert_matches!(
            read_list::<Sign>(&mut reader),
            Err(TesseraError::FramingError(_))
        );
    }

    #[test]
    fn test_huge_count_does_not_preallocate() {
        let bytes = [0xFF, 0xFF];
        let mut reader = PacketReader::new(&bytes);
        assert_matches!(
            read_list::<Chest>(&mut reader),
            Err(TesseraError::FramingError(_))
        );
    }
}
