//! The logical SpIOpen frame.

use bitflags::bitflags;

use crate::format;

bitflags! {
    /// The eight single-bit frame flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        /// Remote transmission request / remote request substitution.
        const RTR = 1 << 0;
        /// Bit rate switch.
        const BRS = 1 << 1;
        /// Error state indicator.
        const ESI = 1 << 2;
        /// Identifier extension: 29-bit identifier instead of 11-bit.
        const IDE = 1 << 3;
        /// CAN-FD format.
        const FDF = 1 << 4;
        /// CAN-XL format.
        const XLF = 1 << 5;
        /// A time-to-live byte is carried in the header.
        const TTL = 1 << 6;
        /// Pad the serialized frame to an even number of bytes.
        const WA = 1 << 7;
    }
}

impl Default for FrameFlags {
    fn default() -> Self {
        FrameFlags::empty()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FrameFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "FrameFlags({=u8:#x})", self.bits());
    }
}

/// CAN-XL control fields. Only meaningful on frames with
/// [`FrameFlags::XLF`] set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct XlControl {
    pub payload_type: u8,
    pub virtual_can_network_id: u8,
    pub addressing_field: u32,
}

/// A logical frame.
///
/// The payload bytes are borrowed, not owned: after a read they point into
/// the buffer the frame was read from, and the frame cannot outlive it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame<'a> {
    /// 11-bit base identifier, or 29-bit when [`FrameFlags::IDE`] is set.
    pub can_identifier: u32,
    pub flags: FrameFlags,
    /// Hop counter; only serialized when [`FrameFlags::TTL`] is set.
    pub time_to_live: u8,
    /// Only serialized when [`FrameFlags::XLF`] is set.
    #[cfg(feature = "can-xl")]
    pub xl_control: XlControl,
    pub payload: &'a [u8],
}

/// Length of the header for the given flags, from the format header until
/// right before the payload. Does not include the preamble.
pub(crate) fn header_length_for(flags: FrameFlags) -> usize {
    let mut length = format::FORMAT_HEADER_SIZE + format::CAN_IDENTIFIER_SIZE;
    if flags.contains(FrameFlags::IDE) {
        length += format::CAN_IDENTIFIER_EXTENSION_SIZE;
    }
    if flags.contains(FrameFlags::TTL) {
        length += format::TIME_TO_LIVE_SIZE;
    }
    if flags.contains(FrameFlags::XLF) {
        length += format::XL_DATA_LENGTH_SIZE + format::XL_CONTROL_SIZE;
    }
    length
}

/// Number of payload bytes on the wire: FD payloads round up to the nearest
/// DLC table value, every other mode carries the payload verbatim.
pub(crate) fn wire_payload_length(flags: FrameFlags, payload_length: usize) -> usize {
    if flags.contains(FrameFlags::FDF) && payload_length > format::MAX_CC_PAYLOAD_SIZE {
        for &padded in &format::CAN_FD_PAYLOAD_BY_DLC[9..] {
            if payload_length <= padded {
                return padded;
            }
        }
    }
    payload_length
}

/// Serialized length for the given flags and payload length, from the start
/// of the preamble to the end of the CRC, DLC and alignment padding included.
pub(crate) fn frame_length_for(flags: FrameFlags, payload_length: usize) -> usize {
    let mut length =
        format::PREAMBLE_SIZE + header_length_for(flags) + wire_payload_length(flags, payload_length);
    length += if payload_length <= format::MAX_CC_PAYLOAD_SIZE {
        format::SHORT_CRC_SIZE
    } else {
        format::LONG_CRC_SIZE
    };
    if flags.contains(FrameFlags::WA) && length & 1 != 0 {
        length += format::MAX_PADDING_SIZE;
    }
    length
}

impl<'a> Frame<'a> {
    /// Clears every field back to its empty state. The payload becomes an
    /// empty slice.
    pub fn reset(&mut self) {
        *self = Frame::default();
    }

    /// Length of the header in bytes, from the format header until right
    /// before the payload. Does not include the preamble.
    pub fn header_length(&self) -> usize {
        header_length_for(self.flags)
    }

    /// Serialized length of the frame in bytes, from the start of the
    /// preamble to the end of the CRC, padding included.
    pub fn frame_length(&self) -> usize {
        frame_length_for(self.flags, self.payload.len())
    }

    /// XL control fields regardless of build configuration; zeroed when the
    /// build carries none.
    pub(crate) fn xl(&self) -> XlControl {
        #[cfg(feature = "can-xl")]
        return self.xl_control;
        #[cfg(not(feature = "can-xl"))]
        XlControl::default()
    }

    /// Decrements the time-to-live counter when the TTL flag is set.
    ///
    /// Returns `true` when the counter has expired (reached zero), `false`
    /// when the TTL flag is not set or the counter is still above zero.
    pub fn decrement_and_check_ttl(&mut self) -> bool {
        if !self.flags.contains(FrameFlags::TTL) {
            return false;
        }
        if self.time_to_live > 0 {
            self.time_to_live -= 1;
        }
        self.time_to_live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, FrameFlags};

    #[test]
    fn test_header_and_frame_length_base() {
        let payload = [0x11, 0x22, 0x33];
        let frame = Frame {
            can_identifier: 0x123,
            payload: &payload,
            ..Frame::default()
        };

        // Format header + base identifier, then 3 payload bytes and a short
        // CRC around the 2-byte preamble.
        assert_eq!(frame.header_length(), 4);
        assert_eq!(frame.frame_length(), 11);
    }

    #[test]
    fn test_frame_length_word_alignment() {
        let payload = [0u8; 8];
        let mut frame = Frame {
            can_identifier: 0x1ABCDE,
            flags: FrameFlags::IDE | FrameFlags::RTR | FrameFlags::TTL,
            time_to_live: 5,
            payload: &payload,
            ..Frame::default()
        };

        // 2 preamble + 2 format + 4 identifier + 1 ttl + 8 payload + 2 crc.
        assert_eq!(frame.frame_length(), 19);

        frame.flags |= FrameFlags::WA;
        assert_eq!(frame.frame_length(), 20);
    }

    #[cfg(feature = "can-fd")]
    #[test]
    fn test_frame_length_fd_rounds_up_to_dlc() {
        let payload = [0u8; 9];
        let frame = Frame {
            can_identifier: 0x200,
            flags: FrameFlags::FDF,
            payload: &payload,
            ..Frame::default()
        };

        // 9 payload bytes round up to the 12-byte DLC slot; long CRC.
        assert_eq!(frame.frame_length(), 2 + 4 + 12 + 4);
    }

    #[cfg(feature = "can-xl")]
    #[test]
    fn test_frame_length_xl() {
        let payload = [0u8; 1024];
        let frame = Frame {
            can_identifier: 0x001,
            flags: FrameFlags::XLF,
            payload: &payload,
            ..Frame::default()
        };

        // 2 preamble + 2 format + 2 xl length + 6 xl control + 2 identifier
        // + 1024 payload + 4 crc.
        assert_eq!(frame.header_length(), 12);
        assert_eq!(frame.frame_length(), 1042);
    }

    #[test]
    fn test_reset() {
        let payload = [1, 2, 3];
        let mut frame = Frame {
            can_identifier: 0x7FF,
            flags: FrameFlags::ESI | FrameFlags::TTL,
            time_to_live: 3,
            payload: &payload,
            ..Frame::default()
        };

        frame.reset();
        assert_eq!(frame, Frame::default());
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_decrement_and_check_ttl() {
        let mut frame = Frame::default();
        assert!(!frame.decrement_and_check_ttl());

        frame.flags = FrameFlags::TTL;
        frame.time_to_live = 2;
        assert!(!frame.decrement_and_check_ttl());
        assert!(frame.decrement_and_check_ttl());
        assert_eq!(frame.time_to_live, 0);

        // An expired counter stays expired.
        assert!(frame.decrement_and_check_ttl());
    }
}
