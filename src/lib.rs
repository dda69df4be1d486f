pub mod crc16;
pub mod timestamp;
pub mod byte_source;
pub mod master_header;

pub use crc16::{crc16, Crc16};
pub use timestamp::Timestamp;
pub use byte_source::{ByteSource, ByteSourceError};
pub use master_header::{ArchiveKind, LocateOptions, MasterHeaderBlock, MasterHeaderError};
