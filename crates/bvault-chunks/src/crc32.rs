//! CRC-32 (reflected polynomial 0xEDB88320, init and final XOR 0xFFFFFFFF)
//!
//! This is the zlib/PNG CRC, computed with a 256-entry table built at compile
//! time.

const POLYNOMIAL: u32 = 0xEDB8_8320;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

pub fn crc32(data: &[u8]) -> u32 {
    let crc = data.iter().fold(0xFFFF_FFFFu32, |crc, &byte| {
        TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8)
    });
    crc ^ 0xFFFF_FFFF
}

/// CRC-32 as 8 lowercase hex digits
pub fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32(data))
}
