//! CRC-16/XMODEM as used by NuFX headers and threads.
//!
//! Polynomial `0x1021`, seed `0x0000`, no input or output reflection, one byte
//! at a time MSB first.  The lookup table is built at compile time.
//!
//! ```
//! use shrinkit::crc16::{crc16, Crc16};
//!
//! assert_eq!(crc16(b"123456789"), 0x31c3);
//!
//! let mut hasher = Crc16::new();
//! hasher.update(b"1234");
//! hasher.update(b"56789");
//! assert_eq!(hasher.finalize(), 0x31c3);
//! ```

/// Generator polynomial (x^16 + x^12 + x^5 + 1).
pub const POLYNOMIAL: u16 = 0x1021;
/// Initial register value.
pub const SEED:       u16 = 0x0000;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ POLYNOMIAL } else { crc << 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// The 256-entry lookup table.
pub fn table() -> &'static [u16; 256] {
    &TABLE
}

/// Streaming CRC-16 hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    pub fn new() -> Self {
        Self { value: SEED }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.value;
        for &b in data {
            crc = (crc << 8) ^ TABLE[((crc >> 8) as u8 ^ b) as usize];
        }
        self.value = crc;
    }

    /// Back to the seed, as if nothing had been hashed.
    pub fn reset(&mut self) {
        self.value = SEED;
    }

    /// Current register value; hashing may continue afterwards.
    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn finalize(self) -> u16 {
        self.value
    }
}

/// One-shot CRC-16 over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut hasher = Crc16::new();
    hasher.update(data);
    hasher.finalize()
}
