use core::{
    any::type_name,
    cmp::Ordering,
    ops::{Add, Rem, Sub},
};
use std::io::Write;

use zerocopy::FromBytes;

use crate::ReadError;

pub fn read<T: FromBytes + Copy>(resource: &[u8]) -> Result<T, ReadError> {
    T::read_from_prefix(resource)
        .map_err(|_| ReadError(type_name::<T>().to_string()))
        .map(|(value, _)| value)
}

pub fn aligned_to<T: Add<Output = T> + Sub<Output = T> + Rem<Output = T> + Eq + Copy + Default>(
    value: T, alignment: T,
) -> T {
    if value % alignment == T::default() {
        return value;
    }
    value + alignment - (value % alignment)
}

/// Number of zero bytes needed after `written` bytes to reach a 32-bit boundary.
pub fn padding_length(written: usize) -> usize { aligned_to(written, 4) - written }

pub fn write_padding<W: Write>(writer: &mut W, length: usize) -> std::io::Result<usize> {
    const ZEROES: [u8; 4] = [0; 4];
    writer.write_all(&ZEROES[..length])?;
    Ok(length)
}

/// UTF-16LE bytes of the string without a terminator.
pub fn string_to_u16_raw<S: AsRef<str>>(string: S) -> Vec<u8> {
    string.as_ref().encode_utf16().flat_map(|c| c.to_le_bytes()).collect()
}

/// UTF-16LE bytes of the string followed by a null terminator.
pub fn string_to_u16<S: AsRef<str>>(string: S) -> Vec<u8> {
    let string = string.as_ref();
    let mut data = Vec::with_capacity(string.len() * 2 + 2);
    data.extend(string.encode_utf16().flat_map(|c| c.to_le_bytes()));
    data.extend([0, 0]);
    data
}

pub fn utf16_length<S: AsRef<str>>(string: S) -> usize { string.as_ref().encode_utf16().count() }

pub fn cmp_utf16(a: &str, b: &str) -> Ordering { a.encode_utf16().cmp(b.encode_utf16()) }
