//! On-wire constants for the SpIOpen frame format.

/// Value of each byte in the preamble.
pub const PREAMBLE_BYTE: u8 = 0xAA;
/// Complement of the preamble byte; what a preamble byte looks like after an
/// odd number of bit slips.
pub const PREAMBLE_BYTE_COMPLEMENT: u8 = 0x55;
/// Both preamble bytes as one big-endian word.
pub const PREAMBLE_WORD: u16 = 0xAAAA;

/// Size of the preamble in bytes.
pub const PREAMBLE_SIZE: usize = 2;
/// Size of the SECDED-encoded format header in bytes.
pub const FORMAT_HEADER_SIZE: usize = 2;
/// Size of the SECDED-encoded XL data length field in bytes.
pub const XL_DATA_LENGTH_SIZE: usize = 2;
/// Size of the XL control field in bytes, not counting the data length field.
pub const XL_CONTROL_SIZE: usize = 6;
/// Size of the basic CAN identifier in bytes.
pub const CAN_IDENTIFIER_SIZE: usize = 2;
/// Size of the additional extended identifier in bytes; present only when the
/// IDE flag is set.
pub const CAN_IDENTIFIER_EXTENSION_SIZE: usize = 2;
/// Size of the time-to-live counter in bytes; present only when the TTL flag
/// is set.
pub const TIME_TO_LIVE_SIZE: usize = 1;
/// Maximum payload size in bytes for CAN-CC frames.
pub const MAX_CC_PAYLOAD_SIZE: usize = 8;
/// Maximum payload size in bytes for CAN-FD frames.
pub const MAX_FD_PAYLOAD_SIZE: usize = 64;
/// Maximum payload size in bytes for CAN-XL frames.
pub const MAX_XL_PAYLOAD_SIZE: usize = 2048;
/// Size of the CRC-16 checksum in bytes (payloads of at most 8 bytes).
pub const SHORT_CRC_SIZE: usize = 2;
/// Size of the CRC-32 checksum in bytes (payloads longer than 8 bytes).
pub const LONG_CRC_SIZE: usize = 4;
/// Maximum size of the word-alignment padding in bytes; present only when the
/// WA flag is set and the frame would otherwise end on an odd byte.
pub const MAX_PADDING_SIZE: usize = 1;

/// Mask for the DLC field in the low byte of the format header.
pub const HEADER_DLC_MASK: u8 = 0x0F;
/// Mask for the IDE flag in the low byte of the format header.
pub const HEADER_IDE_MASK: u8 = 0x10;
/// Mask for the FDF flag in the low byte of the format header.
pub const HEADER_FDF_MASK: u8 = 0x20;
/// Mask for the XLF flag in the low byte of the format header.
pub const HEADER_XLF_MASK: u8 = 0x40;
/// Mask for the TTL flag in the low byte of the format header.
pub const HEADER_TTL_MASK: u8 = 0x80;
/// Mask for the word-alignment flag in the high byte of the format header.
/// The remaining high-byte bits are reserved, written as zero and ignored on
/// read.
pub const HEADER_WA_MASK: u8 = 0x01;

/// Mask for the RTR/RRS flag in the most significant CAN identifier byte.
pub const CID_RTR_MASK: u8 = 0x80;
/// Mask for the BRS flag in the most significant CAN identifier byte.
pub const CID_BRS_MASK: u8 = 0x40;
/// Mask for the ESI flag in the most significant CAN identifier byte.
pub const CID_ESI_MASK: u8 = 0x20;

/// CAN-FD 4-bit DLC to payload length in bytes.
pub const CAN_FD_PAYLOAD_BY_DLC: [usize; 16] =
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Largest possible CAN-CC header, preamble included.
pub const MAX_CAN_CC_HEADER_SIZE: usize = PREAMBLE_SIZE
    + FORMAT_HEADER_SIZE
    + CAN_IDENTIFIER_SIZE
    + CAN_IDENTIFIER_EXTENSION_SIZE
    + TIME_TO_LIVE_SIZE;
/// Largest possible CAN-FD header, preamble included.
pub const MAX_CAN_FD_HEADER_SIZE: usize = MAX_CAN_CC_HEADER_SIZE;
/// Largest possible CAN-XL header, preamble included.
pub const MAX_CAN_XL_HEADER_SIZE: usize =
    MAX_CAN_CC_HEADER_SIZE + XL_DATA_LENGTH_SIZE + XL_CONTROL_SIZE;

/// Largest possible CAN-CC frame; sizes receive/transmit buffers.
pub const MAX_CAN_CC_FRAME_SIZE: usize =
    MAX_CAN_CC_HEADER_SIZE + MAX_CC_PAYLOAD_SIZE + SHORT_CRC_SIZE + MAX_PADDING_SIZE;
/// Largest possible CAN-FD frame.
pub const MAX_CAN_FD_FRAME_SIZE: usize =
    MAX_CAN_FD_HEADER_SIZE + MAX_FD_PAYLOAD_SIZE + LONG_CRC_SIZE + MAX_PADDING_SIZE;
/// Largest possible CAN-XL frame.
pub const MAX_CAN_XL_FRAME_SIZE: usize =
    MAX_CAN_XL_HEADER_SIZE + MAX_XL_PAYLOAD_SIZE + LONG_CRC_SIZE + MAX_PADDING_SIZE;
