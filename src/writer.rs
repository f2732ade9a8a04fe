//! Serializes a [`Frame`] into a byte buffer.

use snafu::Snafu;

use crate::algorithms::{crc16_ccitt, crc32_mpeg2, secded16_encode11};
use crate::format;
use crate::frame::{frame_length_for, Frame, FrameFlags, XlControl};

/// Errors returned while writing a frame.
#[non_exhaustive]
#[derive(Debug, PartialEq, Snafu)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    #[snafu(display("payload length {length} is not representable in this frame mode"))]
    InvalidPayloadLength { length: usize },
    #[snafu(display("buffer too short: frame needs {required} bytes, buffer holds {available}"))]
    BufferTooShort { required: usize, available: usize },
    #[snafu(display("FDF and XLF are mutually exclusive"))]
    FormatConflict,
    #[snafu(display("CAN-FD frames are not supported by this build"))]
    CanFdNotSupported,
    #[snafu(display("CAN-XL frames are not supported by this build"))]
    CanXlNotSupported,
}

/// Summary of a successful frame write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameWritten {
    /// Zero bytes appended after the payload to fill the chosen DLC slot.
    pub payload_padding: usize,
    /// Zero bytes appended before the CRC for word alignment.
    pub frame_padding: usize,
    /// Bytes written, from the start of the preamble to the end of the CRC.
    pub total_length: usize,
}

/// Where the writer finds the payload bytes.
pub(crate) enum PayloadSource<'a> {
    /// Payload borrowed from the caller; copied into place.
    Slice(&'a [u8]),
    /// Payload already lives in the output buffer at this span; moved into
    /// place with an overlap-safe copy.
    InPlace { offset: usize, length: usize },
}

impl PayloadSource<'_> {
    fn len(&self) -> usize {
        match self {
            PayloadSource::Slice(bytes) => bytes.len(),
            PayloadSource::InPlace { length, .. } => *length,
        }
    }
}

fn check_mode(flags: FrameFlags, payload_length: usize) -> Result<(), WriteError> {
    if flags.contains(FrameFlags::FDF) && flags.contains(FrameFlags::XLF) {
        return Err(WriteError::FormatConflict);
    }
    #[cfg(not(feature = "can-fd"))]
    {
        if flags.contains(FrameFlags::FDF) {
            return Err(WriteError::CanFdNotSupported);
        }
    }
    #[cfg(not(feature = "can-xl"))]
    {
        if flags.contains(FrameFlags::XLF) {
            return Err(WriteError::CanXlNotSupported);
        }
    }

    let limit = if flags.contains(FrameFlags::XLF) {
        // The XL length field carries 11 bits.
        format::MAX_XL_PAYLOAD_SIZE - 1
    } else if flags.contains(FrameFlags::FDF) {
        format::MAX_FD_PAYLOAD_SIZE
    } else {
        format::MAX_CC_PAYLOAD_SIZE
    };
    if payload_length > limit {
        return Err(WriteError::InvalidPayloadLength {
            length: payload_length,
        });
    }
    Ok(())
}

// DLC nibble for the format header plus the number of zero bytes needed to
// fill the DLC slot. XL carries its length outside the DLC; classic carries
// it verbatim.
fn dlc_and_payload_padding(
    flags: FrameFlags,
    payload_length: usize,
) -> Result<(u8, usize), WriteError> {
    if flags.contains(FrameFlags::XLF) {
        return Ok((0, 0));
    }
    if payload_length <= format::MAX_CC_PAYLOAD_SIZE {
        return Ok((payload_length as u8, 0));
    }
    for dlc in 9..16 {
        let slot = format::CAN_FD_PAYLOAD_BY_DLC[dlc];
        if payload_length <= slot {
            return Ok((dlc as u8, slot - payload_length));
        }
    }
    Err(WriteError::InvalidPayloadLength {
        length: payload_length,
    })
}

/// Serializes a frame into `buffer`.
///
/// The buffer must hold at least [`Frame::frame_length`] bytes. On error the
/// buffer contents are indeterminate.
pub fn write_frame(frame: &Frame<'_>, buffer: &mut [u8]) -> Result<FrameWritten, WriteError> {
    write_with_source(
        frame.can_identifier,
        frame.flags,
        frame.time_to_live,
        frame.xl(),
        PayloadSource::Slice(frame.payload),
        buffer,
    )
}

pub(crate) fn write_with_source(
    can_identifier: u32,
    flags: FrameFlags,
    time_to_live: u8,
    xl_control: XlControl,
    payload: PayloadSource<'_>,
    buffer: &mut [u8],
) -> Result<FrameWritten, WriteError> {
    let payload_length = payload.len();
    check_mode(flags, payload_length)?;
    let (dlc_nibble, payload_padding) = dlc_and_payload_padding(flags, payload_length)?;

    let required = frame_length_for(flags, payload_length);
    if buffer.len() < required {
        return Err(WriteError::BufferTooShort {
            required,
            available: buffer.len(),
        });
    }

    let mut cursor = 0;
    buffer[cursor] = format::PREAMBLE_BYTE;
    buffer[cursor + 1] = format::PREAMBLE_BYTE;
    cursor += format::PREAMBLE_SIZE;

    // Format header: 11-bit value, SECDED encoded, high byte first.
    let mut low = dlc_nibble & format::HEADER_DLC_MASK;
    if flags.contains(FrameFlags::IDE) {
        low |= format::HEADER_IDE_MASK;
    }
    if flags.contains(FrameFlags::FDF) {
        low |= format::HEADER_FDF_MASK;
    }
    if flags.contains(FrameFlags::XLF) {
        low |= format::HEADER_XLF_MASK;
    }
    if flags.contains(FrameFlags::TTL) {
        low |= format::HEADER_TTL_MASK;
    }
    let high = if flags.contains(FrameFlags::WA) {
        format::HEADER_WA_MASK
    } else {
        0
    };
    let encoded_header = secded16_encode11(u16::from(low) | (u16::from(high) << 8));
    buffer[cursor..cursor + 2].copy_from_slice(&encoded_header.to_be_bytes());
    cursor += format::FORMAT_HEADER_SIZE;

    if flags.contains(FrameFlags::XLF) {
        // XL length (SECDED encoded, high byte first), then the control
        // block with a big-endian addressing field.
        let encoded_length = secded16_encode11(payload_length as u16 & 0x07FF);
        buffer[cursor..cursor + 2].copy_from_slice(&encoded_length.to_be_bytes());
        cursor += format::XL_DATA_LENGTH_SIZE;

        buffer[cursor] = xl_control.payload_type;
        buffer[cursor + 1] = xl_control.virtual_can_network_id;
        buffer[cursor + 2..cursor + 6].copy_from_slice(&xl_control.addressing_field.to_be_bytes());
        cursor += format::XL_CONTROL_SIZE;
    }

    // CAN identifier, big endian, RTR/BRS/ESI in the top bits of the first
    // byte.
    let mut flag_bits = 0;
    if flags.contains(FrameFlags::RTR) {
        flag_bits |= format::CID_RTR_MASK;
    }
    if flags.contains(FrameFlags::BRS) {
        flag_bits |= format::CID_BRS_MASK;
    }
    if flags.contains(FrameFlags::ESI) {
        flag_bits |= format::CID_ESI_MASK;
    }
    let cid_flag_mask = format::CID_RTR_MASK | format::CID_BRS_MASK | format::CID_ESI_MASK;
    if flags.contains(FrameFlags::IDE) {
        let id = can_identifier.to_be_bytes();
        buffer[cursor] = (id[0] & !cid_flag_mask) | flag_bits;
        buffer[cursor + 1..cursor + 4].copy_from_slice(&id[1..4]);
        cursor += format::CAN_IDENTIFIER_SIZE + format::CAN_IDENTIFIER_EXTENSION_SIZE;
    } else {
        buffer[cursor] = ((can_identifier >> 8) as u8 & !cid_flag_mask) | flag_bits;
        buffer[cursor + 1] = can_identifier as u8;
        cursor += format::CAN_IDENTIFIER_SIZE;
    }

    if flags.contains(FrameFlags::TTL) {
        buffer[cursor] = time_to_live;
        cursor += format::TIME_TO_LIVE_SIZE;
    }

    match payload {
        PayloadSource::Slice(bytes) => {
            buffer[cursor..cursor + payload_length].copy_from_slice(bytes);
        }
        PayloadSource::InPlace { offset, length } => {
            buffer.copy_within(offset..offset + length, cursor);
        }
    }
    cursor += payload_length;
    for _ in 0..payload_padding {
        buffer[cursor] = 0;
        cursor += 1;
    }

    // Word-alignment padding sits before the CRC. The CRC itself is an even
    // number of bytes, so parity here is parity of the finished frame.
    let mut frame_padding = 0;
    if flags.contains(FrameFlags::WA) && cursor & 1 != 0 {
        buffer[cursor] = 0;
        cursor += 1;
        frame_padding = format::MAX_PADDING_SIZE;
    }

    // CRC covers everything after the preamble, padding included.
    if payload_length > format::MAX_CC_PAYLOAD_SIZE {
        let crc = crc32_mpeg2(&buffer[format::PREAMBLE_SIZE..cursor]);
        buffer[cursor..cursor + 4].copy_from_slice(&crc.to_be_bytes());
        cursor += format::LONG_CRC_SIZE;
    } else {
        let crc = crc16_ccitt(&buffer[format::PREAMBLE_SIZE..cursor]);
        buffer[cursor..cursor + 2].copy_from_slice(&crc.to_be_bytes());
        cursor += format::SHORT_CRC_SIZE;
    }

    debug_assert_eq!(cursor, required);
    Ok(FrameWritten {
        payload_padding,
        frame_padding,
        total_length: cursor,
    })
}
