//! Binds one logical frame to one persistent byte buffer.

use crate::format;
use crate::frame::{header_length_for, Frame, FrameFlags, XlControl};
use crate::reader::{read_and_copy_frame, read_frame, FrameRead, ReadError};
use crate::writer::{write_with_source, FrameWritten, PayloadSource, WriteError};

/// A frame bound to one persistent byte buffer.
///
/// The held frame's payload is tracked as a span into the held buffer, so
/// the binding survives the buffer being refilled (typically by DMA)
/// between calls. The codec keeps no cross-call state beyond that span:
/// every read revalidates the whole buffer, and the held frame is only as
/// fresh as the last `read_*` or `load_*` call.
pub struct FrameBuffer<'b> {
    buffer: &'b mut [u8],
    can_identifier: u32,
    flags: FrameFlags,
    time_to_live: u8,
    #[cfg(feature = "can-xl")]
    xl_control: XlControl,
    payload_offset: usize,
    payload_length: usize,
}

// Owned snapshot of a parse, so the buffer borrow ends before the held
// fields are updated.
struct ReadSummary {
    can_identifier: u32,
    flags: FrameFlags,
    time_to_live: u8,
    #[cfg(feature = "can-xl")]
    xl_control: XlControl,
    payload_length: usize,
    dlc_corrected: bool,
}

fn summarize(outcome: Result<FrameRead<'_>, ReadError>) -> Result<ReadSummary, ReadError> {
    let read = outcome?;
    Ok(ReadSummary {
        can_identifier: read.frame.can_identifier,
        flags: read.frame.flags,
        time_to_live: read.frame.time_to_live,
        #[cfg(feature = "can-xl")]
        xl_control: read.frame.xl_control,
        payload_length: read.frame.payload.len(),
        dlc_corrected: read.dlc_corrected,
    })
}

impl<'b> FrameBuffer<'b> {
    /// Binds `buffer` with an empty held frame.
    pub fn new(buffer: &'b mut [u8]) -> Self {
        Self {
            buffer,
            can_identifier: 0,
            flags: FrameFlags::empty(),
            time_to_live: 0,
            #[cfg(feature = "can-xl")]
            xl_control: XlControl::default(),
            payload_offset: 0,
            payload_length: 0,
        }
    }

    /// The held frame. Its payload resolves into the held buffer.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            can_identifier: self.can_identifier,
            flags: self.flags,
            time_to_live: self.time_to_live,
            #[cfg(feature = "can-xl")]
            xl_control: self.xl_control,
            payload: &self.buffer[self.payload_offset..self.payload_offset + self.payload_length],
        }
    }

    /// The held buffer.
    pub fn buffer(&self) -> &[u8] {
        self.buffer
    }

    /// Mutable access to the held buffer, for the agent that fills it
    /// between codec calls. The held frame is stale until the next read.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.buffer
    }

    /// Length of the held buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn held_xl(&self) -> XlControl {
        #[cfg(feature = "can-xl")]
        return self.xl_control;
        #[cfg(not(feature = "can-xl"))]
        XlControl::default()
    }

    /// Serializes the held frame into the held buffer.
    ///
    /// The payload bytes already live in the held buffer; they are moved to
    /// their new position when a header change shifted them.
    pub fn write_internal_buffer(&mut self) -> Result<FrameWritten, WriteError> {
        let written = write_with_source(
            self.can_identifier,
            self.flags,
            self.time_to_live,
            self.held_xl(),
            PayloadSource::InPlace {
                offset: self.payload_offset,
                length: self.payload_length,
            },
            self.buffer,
        )?;
        self.payload_offset = format::PREAMBLE_SIZE + header_length_for(self.flags);
        Ok(written)
    }

    /// Reads the held buffer into the held frame and returns it.
    ///
    /// The buffer is revalidated from scratch; on error the held frame is
    /// left empty.
    pub fn read_internal_buffer(&mut self) -> Result<FrameRead<'_>, ReadError> {
        let summary = summarize(read_frame(self.buffer, 0));
        self.apply(summary)
    }

    /// Copies a frame out of `source` into the held buffer, compensating
    /// for `bit_slip_count` bits of slip, then reads it.
    pub fn load_and_read_internal_buffer(
        &mut self,
        source: &[u8],
        source_offset: usize,
        bit_slip_count: u8,
    ) -> Result<FrameRead<'_>, ReadError> {
        let summary = summarize(read_and_copy_frame(
            source,
            self.buffer,
            source_offset,
            bit_slip_count,
        ));
        self.apply(summary)
    }

    /// Overwrites the held frame with `frame` and serializes it into the
    /// held buffer. The payload bytes are copied in; afterwards the held
    /// frame's payload resolves into the held buffer.
    pub fn load_frame_and_write_internal_buffer(
        &mut self,
        frame: &Frame<'_>,
    ) -> Result<FrameWritten, WriteError> {
        let written = write_with_source(
            frame.can_identifier,
            frame.flags,
            frame.time_to_live,
            frame.xl(),
            PayloadSource::Slice(frame.payload),
            self.buffer,
        )?;
        self.can_identifier = frame.can_identifier;
        self.flags = frame.flags;
        self.time_to_live = frame.time_to_live;
        #[cfg(feature = "can-xl")]
        {
            self.xl_control = frame.xl_control;
        }
        self.payload_offset = format::PREAMBLE_SIZE + header_length_for(frame.flags);
        self.payload_length = frame.payload.len();
        Ok(written)
    }

    /// Decrements the held frame's time-to-live counter; see
    /// [`Frame::decrement_and_check_ttl`]. A later
    /// [`write_internal_buffer`](Self::write_internal_buffer) serializes the
    /// decremented counter.
    pub fn decrement_and_check_ttl(&mut self) -> bool {
        if !self.flags.contains(FrameFlags::TTL) {
            return false;
        }
        if self.time_to_live > 0 {
            self.time_to_live -= 1;
        }
        self.time_to_live == 0
    }

    fn apply(&mut self, summary: Result<ReadSummary, ReadError>) -> Result<FrameRead<'_>, ReadError> {
        match summary {
            Ok(summary) => {
                self.can_identifier = summary.can_identifier;
                self.flags = summary.flags;
                self.time_to_live = summary.time_to_live;
                #[cfg(feature = "can-xl")]
                {
                    self.xl_control = summary.xl_control;
                }
                self.payload_offset = format::PREAMBLE_SIZE + header_length_for(summary.flags);
                self.payload_length = summary.payload_length;
                Ok(FrameRead {
                    frame: self.frame(),
                    dlc_corrected: summary.dlc_corrected,
                })
            }
            Err(error) => {
                self.can_identifier = 0;
                self.flags = FrameFlags::empty();
                self.time_to_live = 0;
                #[cfg(feature = "can-xl")]
                {
                    self.xl_control = XlControl::default();
                }
                self.payload_offset = 0;
                self.payload_length = 0;
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FrameBuffer;
    use crate::format::MAX_CAN_CC_FRAME_SIZE;
    use crate::frame::{Frame, FrameFlags};
    use crate::reader::ReadError;
    use crate::writer::write_frame;

    #[test]
    fn test_load_frame_and_write() {
        let payload = [0x10, 0x20, 0x30, 0x40];
        let frame = Frame {
            can_identifier: 0x2AB,
            flags: FrameFlags::TTL,
            time_to_live: 3,
            payload: &payload,
            ..Frame::default()
        };

        let mut storage = [0u8; MAX_CAN_CC_FRAME_SIZE];
        let mut bound = FrameBuffer::new(&mut storage);
        let written = bound.load_frame_and_write_internal_buffer(&frame).unwrap();
        assert_eq!(written.total_length, frame.frame_length());

        // The held frame resolves its payload out of the held buffer.
        assert_eq!(bound.frame(), frame);

        // And the buffer parses back to the same frame.
        let read = bound.read_internal_buffer().unwrap();
        assert_eq!(read.frame.can_identifier, 0x2AB);
        assert_eq!(read.frame.payload, &payload[..]);
    }

    #[test]
    fn test_read_internal_buffer_after_external_fill() {
        let payload = [0xA1, 0xB2];
        let frame = Frame {
            can_identifier: 0x155,
            payload: &payload,
            ..Frame::default()
        };

        let mut wire = [0u8; MAX_CAN_CC_FRAME_SIZE];
        let written = write_frame(&frame, &mut wire).unwrap();

        let mut storage = [0u8; MAX_CAN_CC_FRAME_SIZE];
        let mut bound = FrameBuffer::new(&mut storage);

        // What a DMA transfer into the bound buffer looks like from here.
        bound.buffer_mut()[..written.total_length].copy_from_slice(&wire[..written.total_length]);

        let read = bound.read_internal_buffer().unwrap();
        assert_eq!(read.frame, frame);
        assert!(!read.dlc_corrected);
    }

    #[test]
    fn test_read_internal_buffer_empty() {
        let mut storage = [0u8; MAX_CAN_CC_FRAME_SIZE];
        let mut bound = FrameBuffer::new(&mut storage);
        assert_eq!(
            bound.read_internal_buffer().unwrap_err(),
            ReadError::NoPreamble
        );
        assert!(bound.frame().payload.is_empty());
    }

    #[test]
    fn test_ttl_decrement_and_rewrite() {
        let payload = [0x01];
        let frame = Frame {
            can_identifier: 0x300,
            flags: FrameFlags::TTL,
            time_to_live: 2,
            payload: &payload,
            ..Frame::default()
        };

        let mut storage = [0u8; MAX_CAN_CC_FRAME_SIZE];
        let mut bound = FrameBuffer::new(&mut storage);
        bound.load_frame_and_write_internal_buffer(&frame).unwrap();

        assert!(!bound.decrement_and_check_ttl());
        bound.write_internal_buffer().unwrap();

        let read = bound.read_internal_buffer().unwrap();
        assert_eq!(read.frame.time_to_live, 1);
        assert_eq!(read.frame.payload, &payload[..]);

        assert!(bound.decrement_and_check_ttl());
    }

    #[test]
    fn test_load_and_read_with_bit_slip() {
        let payload = [0x42, 0x43, 0x44];
        let frame = Frame {
            can_identifier: 0x0F0,
            payload: &payload,
            ..Frame::default()
        };

        let mut wire = [0u8; MAX_CAN_CC_FRAME_SIZE];
        let written = write_frame(&frame, &mut wire).unwrap();

        // The frame as captured three bits late by a free-running receiver.
        let slip = 3u8;
        let mut slipped = [0u8; MAX_CAN_CC_FRAME_SIZE + 1];
        slipped[0] = wire[0] >> slip;
        for index in 1..written.total_length {
            slipped[index] = (wire[index - 1] << (8 - slip)) | (wire[index] >> slip);
        }
        slipped[written.total_length] = wire[written.total_length - 1] << (8 - slip);

        let mut storage = [0u8; MAX_CAN_CC_FRAME_SIZE];
        let mut bound = FrameBuffer::new(&mut storage);
        let read = bound
            .load_and_read_internal_buffer(&slipped[..written.total_length + 1], 0, slip)
            .unwrap();
        assert_eq!(read.frame, frame);
    }
}
