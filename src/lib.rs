//! A fast `no_std` lock-free single-producer single-consumer byte ring buffer.
//! Data moves as raw byte slices: `write` and `read` copy as many bytes as
//! currently fit and report the count, so a short transfer is the buffer's
//! backpressure signal rather than an error. The capacity is chosen at
//! creation time and normalized to a power of two for a more efficient
//! offset handling.
//!
//! # Example
//! ```
//! use bytering_spsc::RingBuffer;
//!
//! const N: usize = 1_000_000;
//! let (mut tx, mut rx) = RingBuffer::init(1_024).unwrap();
//!
//! let p = std::thread::spawn(move || {
//!     let mut sent: usize = 0;
//!     while sent < N {
//!         let chunk = [(sent % 251) as u8];
//!         if tx.write(&chunk) == 1 {
//!             sent += 1;
//!         } else {
//!             std::thread::yield_now();
//!         }
//!     }
//! });
//!
//! let c = std::thread::spawn(move || {
//!     let mut received: usize = 0;
//!     let mut chunk = [0u8; 1];
//!     while received < N {
//!         if rx.read(&mut chunk) == 1 {
//!             assert_eq!(chunk[0], (received % 251) as u8);
//!             received += 1;
//!         } else {
//!             std::thread::yield_now();
//!         }
//!     }
//! });
//!
//! p.join().unwrap();
//! c.join().unwrap();
//! ```
#![no_std]
extern crate alloc;

mod ring_buffer;

pub use ring_buffer::{Error, RingBuffer, RingBufferReader, RingBufferWriter};
