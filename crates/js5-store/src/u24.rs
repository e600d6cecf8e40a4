//! 3-byte big-endian ("medium") integers used by index records and sector
//! headers

use binrw::{BinResult, Endian};
use std::io::{Read, Seek, Write};

/// Largest value a medium field can hold
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// Custom binrw parser for a 3-byte big-endian integer
pub fn read_u24<R: Read + Seek>(reader: &mut R, _endian: Endian, _args: ()) -> BinResult<u32> {
    let mut bytes = [0u8; 3];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
}

/// Custom binrw writer for a 3-byte big-endian integer
pub fn write_u24<W: Write + Seek>(
    value: &u32,
    writer: &mut W,
    _endian: Endian,
    _args: (),
) -> BinResult<()> {
    if *value > U24_MAX {
        return Err(binrw::Error::AssertFail {
            pos: writer.stream_position()?,
            message: format!("Value {value} does not fit in 24 bits"),
        });
    }
    writer.write_all(&value.to_be_bytes()[1..])?;
    Ok(())
}
