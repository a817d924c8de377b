//! Record codec
//!
//! Encoding and decoding of one record across consecutive slots.
//!
//! All functions take the mapped region as a byte slice plus the byte
//! offset of the record's primary slot. Callers serialize access to the
//! region; nothing here locks.

use crate::error::{Result, SlotKvError};

use super::{
    Record, SlotType, KEY_LEN_OFFSET, MAX_KEY_LEN, MAX_SLOTS_PER_RECORD, MAX_VALUE_LEN,
    PAYLOAD_OFFSET, SLOT_COUNT_OFFSET, SLOT_METADATA_LEN, SLOT_SIZE, TTL_OFFSET, TYPE_OFFSET,
    USABLE_BYTES_PER_SLOT, VALUE_LEN_OFFSET,
};

// =============================================================================
// Sizing
// =============================================================================

/// Number of slots a record with the given lengths occupies
///
/// `ceil((key_len + value_len) / usable_bytes_per_slot)`, never less than 1.
pub fn slots_needed(key_len: usize, value_len: usize) -> Result<u8> {
    check_field_widths(key_len, value_len)?;

    let payload = key_len + value_len;
    let slots = payload.div_ceil(USABLE_BYTES_PER_SLOT).max(1);

    if slots > MAX_SLOTS_PER_RECORD {
        return Err(SlotKvError::FieldOverflow {
            field: "slot count",
            len: slots,
            max: MAX_SLOTS_PER_RECORD,
        });
    }

    Ok(slots as u8)
}

/// Fail if a length does not fit its header field
fn check_field_widths(key_len: usize, value_len: usize) -> Result<()> {
    if key_len > MAX_KEY_LEN {
        return Err(SlotKvError::FieldOverflow {
            field: "key",
            len: key_len,
            max: MAX_KEY_LEN,
        });
    }
    if value_len > MAX_VALUE_LEN {
        return Err(SlotKvError::FieldOverflow {
            field: "value",
            len: value_len,
            max: MAX_VALUE_LEN,
        });
    }
    Ok(())
}

fn check_span(region_len: usize, offset: usize, slots: usize) -> Result<()> {
    let end = offset + slots * SLOT_SIZE;
    if end > region_len {
        return Err(SlotKvError::CorruptStore(format!(
            "record at offset {} spans {} slots past end of region ({} bytes)",
            offset, slots, region_len
        )));
    }
    Ok(())
}

// =============================================================================
// Encoding
// =============================================================================

/// Write a record starting at `offset`
///
/// Emits the header and key into the primary slot, then streams value
/// bytes across as many slots as needed, stamping a Continuation flag at
/// the start of each following slot. Returns the number of slots used.
pub fn write_record(
    region: &mut [u8],
    offset: usize,
    key: &[u8],
    value: &[u8],
    ttl: u32,
) -> Result<u8> {
    let slot_count = slots_needed(key.len(), value.len())?;
    check_span(region.len(), offset, slot_count as usize)?;

    let primary = &mut region[offset..offset + SLOT_SIZE];
    primary[TYPE_OFFSET] = SlotType::Primary as u8;
    primary[SLOT_COUNT_OFFSET] = slot_count;
    primary[TTL_OFFSET..TTL_OFFSET + 4].copy_from_slice(&ttl.to_be_bytes());
    primary[KEY_LEN_OFFSET] = key.len() as u8;
    primary[VALUE_LEN_OFFSET..VALUE_LEN_OFFSET + 2]
        .copy_from_slice(&(value.len() as u16).to_be_bytes());
    primary[PAYLOAD_OFFSET..PAYLOAD_OFFSET + key.len()].copy_from_slice(key);

    let mut remaining = value;
    let mut pos = PAYLOAD_OFFSET + key.len();

    for i in 0..slot_count as usize {
        let slot_start = offset + i * SLOT_SIZE;

        if i > 0 {
            region[slot_start] = SlotType::Continuation as u8;
            region[slot_start + 1..slot_start + SLOT_METADATA_LEN].fill(0);
            pos = PAYLOAD_OFFSET;
        }

        let n = remaining.len().min(SLOT_SIZE - pos);
        region[slot_start + pos..slot_start + pos + n].copy_from_slice(&remaining[..n]);
        remaining = &remaining[n..];
    }

    Ok(slot_count)
}

// =============================================================================
// Decoding
// =============================================================================

/// Read the record whose primary slot starts at `offset`
///
/// Walks forward slot by slot until `value_len` bytes are collected.
pub fn read_record(region: &[u8], offset: usize) -> Result<Record> {
    check_span(region.len(), offset, 1)?;
    let primary = &region[offset..offset + SLOT_SIZE];

    let slot_type = SlotType::from_byte(primary[TYPE_OFFSET]).ok_or_else(|| {
        SlotKvError::CorruptStore(format!(
            "unknown slot type {} at offset {}",
            primary[TYPE_OFFSET], offset
        ))
    })?;

    let slot_count = primary[SLOT_COUNT_OFFSET];
    if slot_count == 0 {
        return Err(SlotKvError::CorruptStore(format!(
            "record at offset {} has zero slot count",
            offset
        )));
    }

    let ttl = u32::from_be_bytes([
        primary[TTL_OFFSET],
        primary[TTL_OFFSET + 1],
        primary[TTL_OFFSET + 2],
        primary[TTL_OFFSET + 3],
    ]);
    let key_len = primary[KEY_LEN_OFFSET];
    let value_len = u16::from_be_bytes([primary[VALUE_LEN_OFFSET], primary[VALUE_LEN_OFFSET + 1]]);

    let key_end = PAYLOAD_OFFSET + key_len as usize;
    if key_end > SLOT_SIZE {
        return Err(SlotKvError::CorruptStore(format!(
            "key of {} bytes at offset {} overflows its primary slot",
            key_len, offset
        )));
    }
    check_span(region.len(), offset, slot_count as usize)?;

    let key = primary[PAYLOAD_OFFSET..key_end].to_vec();

    let mut value = Vec::with_capacity(value_len as usize);
    let mut pos = key_end;
    let mut slot = 0usize;

    while value.len() < value_len as usize {
        if pos == SLOT_SIZE {
            slot += 1;
            if slot >= slot_count as usize {
                return Err(SlotKvError::CorruptStore(format!(
                    "record at offset {} ends after {} of {} value bytes",
                    offset,
                    value.len(),
                    value_len
                )));
            }
            pos = PAYLOAD_OFFSET;
        }

        let slot_start = offset + slot * SLOT_SIZE;
        let wanted = value_len as usize - value.len();
        let n = wanted.min(SLOT_SIZE - pos);
        value.extend_from_slice(&region[slot_start + pos..slot_start + pos + n]);
        pos += n;
    }

    Ok(Record {
        slot_type,
        slot_count,
        ttl,
        key_len,
        value_len,
        key,
        value,
    })
}

/// Check the type flag only: true iff the slot at `offset` is Primary
pub fn is_primary(region: &[u8], offset: usize) -> bool {
    region.get(offset).copied() == Some(SlotType::Primary as u8)
}

// =============================================================================
// Tombstones
// =============================================================================

/// Mark every slot of the record at `offset` as Available
///
/// Only the type flags change; payload bytes stay in place. Returns the
/// number of slots tombstoned.
pub fn delete_record(region: &mut [u8], offset: usize) -> Result<u8> {
    check_span(region.len(), offset, 1)?;

    let slot_count = region[offset + SLOT_COUNT_OFFSET];
    check_span(region.len(), offset, slot_count as usize)?;

    for i in 0..slot_count as usize {
        region[offset + i * SLOT_SIZE + TYPE_OFFSET] = SlotType::Available as u8;
    }

    Ok(slot_count)
}
