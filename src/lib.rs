//! This crate provides a `#![no_std]` codec for SpIOpen frames: CAN-compatible
//! framing carried over SPI-like daisy-chained links.
//!
//! A frame is delimited by a two-byte `0xAA 0xAA` preamble and carries a
//! SECDED(16,11) protected format header, an 11- or 29-bit CAN identifier,
//! an optional time-to-live byte, optional CAN-XL control fields and a
//! payload, closed by a CRC-16-CCITT or CRC-32/MPEG-2 checksum chosen by
//! payload size. The reader can resynchronize a stream that arrived with
//! 1..=7 bits of slip by locating the preamble across byte boundaries.
//!
//! Nothing here allocates; payloads are borrowed from the buffers they live
//! in.
//!
//! # Usage
//! ### Writing and reading a frame
//! ```rust
//! use spiopen_frame::format::MAX_CAN_CC_FRAME_SIZE;
//! use spiopen_frame::{read_frame, write_frame, Frame};
//!
//! let payload = [0x11, 0x22, 0x33];
//! let frame = Frame {
//!     can_identifier: 0x123,
//!     payload: &payload,
//!     ..Frame::default()
//! };
//!
//! let mut buf = [0u8; MAX_CAN_CC_FRAME_SIZE];
//! let written = write_frame(&frame, &mut buf).unwrap();
//!
//! let read = read_frame(&buf[..written.total_length], 0).unwrap();
//! assert_eq!(read.frame.can_identifier, 0x123);
//! assert_eq!(read.frame.payload, &payload[..]);
//! ```
//! ### Recovering a bit-slipped frame
//! ```rust
//! use spiopen_frame::format::MAX_CAN_CC_FRAME_SIZE;
//! use spiopen_frame::{find_frame_preamble, read_and_copy_frame};
//!
//! # let captured = {
//! #     let payload = [0x11u8, 0x22];
//! #     let frame = spiopen_frame::Frame {
//! #         can_identifier: 0x123,
//! #         payload: &payload,
//! #         ..spiopen_frame::Frame::default()
//! #     };
//! #     let mut wire = [0u8; MAX_CAN_CC_FRAME_SIZE];
//! #     let n = spiopen_frame::write_frame(&frame, &mut wire).unwrap().total_length;
//! #     let mut slipped = [0u8; MAX_CAN_CC_FRAME_SIZE + 1];
//! #     slipped[0] = wire[0] >> 3;
//! #     for i in 1..n {
//! #         slipped[i] = (wire[i - 1] << 5) | (wire[i] >> 3);
//! #     }
//! #     slipped[n] = wire[n - 1] << 5;
//! #     slipped
//! # };
//! // `captured` holds bytes from a free-running shift register.
//! let found = find_frame_preamble(&captured, 0, true).unwrap();
//!
//! let mut aligned = [0u8; MAX_CAN_CC_FRAME_SIZE];
//! let read = read_and_copy_frame(
//!     &captured,
//!     &mut aligned,
//!     found.frame_start_offset,
//!     found.bit_slip_count,
//! )
//! .unwrap();
//! assert_eq!(read.frame.can_identifier, 0x123);
//! ```

#![no_std]

mod algorithms;
pub mod format;
mod frame;
mod frame_buffer;
mod reader;
mod writer;

pub use algorithms::{
    crc16_ccitt, crc32_mpeg2, secded16_decode11, secded16_encode11, Secded16Decode,
};
pub use frame::{Frame, FrameFlags, XlControl};
pub use frame_buffer::FrameBuffer;
pub use reader::{
    find_frame_preamble, iter_frames, read_and_copy_frame, read_frame, FrameIter, FrameRead,
    FrameSearch, ReadError,
};
pub use writer::{write_frame, FrameWritten, WriteError};
