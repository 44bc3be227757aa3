//! 0x04 -- IDENTITY: returns its input unchanged.

use bytes::Bytes;

pub fn run(input: &[u8]) -> Bytes {
    Bytes::copy_from_slice(input)
}
