//! Replay serialization boundary
//!
//! The engine hands finished records to a [`Serializer`]; where the bytes
//! go (file, socket, memory) is the caller's business. A
//! [`SerializerFactory`] builds serializers over caller-supplied streams.
//!
//! Two formats ship with the crate:
//! - **binary**: compact little-endian records behind a magic/version
//!   preamble ([`BinarySerializerFactory`])
//! - **json**: one serde JSON document per line ([`JsonSerializerFactory`])
//!
//! # Example
//!
//! ```rust
//! use arena_simulator_core_rs::delta::{MatchFooter, RoundDelta};
//! use arena_simulator_core_rs::models::event::MatchEndReason;
//! use arena_simulator_core_rs::serializer::{BinarySerializerFactory, ReplayRecord, SerializerFactory};
//! use std::io::Cursor;
//!
//! let mut buf = Vec::new();
//! {
//!     let mut out = BinarySerializerFactory
//!         .create_serializer(Some(Box::new(&mut buf)), None)
//!         .unwrap();
//!     out.write_record(&ReplayRecord::Footer(MatchFooter {
//!         winner: None,
//!         reason: MatchEndReason::RoundLimit,
//!         rounds_played: 3,
//!     }))
//!     .unwrap();
//!     out.flush().unwrap();
//! }
//!
//! let mut input = BinarySerializerFactory
//!     .create_serializer(None, Some(Box::new(Cursor::new(buf))))
//!     .unwrap();
//! assert!(matches!(input.read_record().unwrap(), Some(ReplayRecord::Footer(_))));
//! assert!(input.read_record().unwrap().is_none());
//! ```

mod binary;
pub mod codec;
mod error;
mod json;

pub use binary::{BinarySerializer, BinarySerializerFactory};
pub use error::SerializerError;
pub use json::{JsonSerializer, JsonSerializerFactory};

use crate::delta::{MatchFooter, MatchHeader, RoundDelta};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// One unit of a replay stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayRecord {
    Header(MatchHeader),
    Round(RoundDelta),
    Footer(MatchFooter),
}

/// Writes and reads replay records
pub trait Serializer {
    fn write_record(&mut self, record: &ReplayRecord) -> Result<(), SerializerError>;

    /// Next record, or `None` at the end of the input
    fn read_record(&mut self) -> Result<Option<ReplayRecord>, SerializerError>;

    fn flush(&mut self) -> Result<(), SerializerError>;
}

/// Builds serializers over caller-supplied streams
///
/// Either stream may be omitted; using the missing direction fails with
/// [`SerializerError::MissingOutput`] or [`SerializerError::MissingInput`].
pub trait SerializerFactory {
    fn create_serializer<'a>(
        &self,
        output: Option<Box<dyn Write + 'a>>,
        input: Option<Box<dyn Read + 'a>>,
    ) -> Result<Box<dyn Serializer + 'a>, SerializerError>;
}
