use crate::serializer::codec::{decode_preamble, decode_record, encode_preamble, encode_record};
use crate::serializer::{ReplayRecord, Serializer, SerializerError, SerializerFactory};
use std::io::{Read, Write};

/// Binary replay stream
///
/// The preamble is written before the first record and checked before the
/// first read.
pub struct BinarySerializer<'a> {
    output: Option<Box<dyn Write + 'a>>,
    input: Option<Box<dyn Read + 'a>>,
    preamble_written: bool,
    preamble_read: bool,
    records_written: u64,
}

impl<'a> BinarySerializer<'a> {
    pub fn new(output: Option<Box<dyn Write + 'a>>, input: Option<Box<dyn Read + 'a>>) -> Self {
        Self {
            output,
            input,
            preamble_written: false,
            preamble_read: false,
            records_written: 0,
        }
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl Serializer for BinarySerializer<'_> {
    fn write_record(&mut self, record: &ReplayRecord) -> Result<(), SerializerError> {
        let out = self.output.as_mut().ok_or(SerializerError::MissingOutput)?;
        if let ReplayRecord::Round(delta) = record {
            delta.validate()?;
        }
        if !self.preamble_written {
            encode_preamble(&mut **out)?;
            self.preamble_written = true;
        }
        encode_record(&mut **out, record)?;
        self.records_written += 1;
        Ok(())
    }

    fn read_record(&mut self) -> Result<Option<ReplayRecord>, SerializerError> {
        let input = self.input.as_mut().ok_or(SerializerError::MissingInput)?;
        if !self.preamble_read {
            decode_preamble(&mut **input)?;
            self.preamble_read = true;
        }
        decode_record(&mut **input)
    }

    fn flush(&mut self) -> Result<(), SerializerError> {
        if let Some(out) = self.output.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySerializerFactory;

impl SerializerFactory for BinarySerializerFactory {
    fn create_serializer<'a>(
        &self,
        output: Option<Box<dyn Write + 'a>>,
        input: Option<Box<dyn Read + 'a>>,
    ) -> Result<Box<dyn Serializer + 'a>, SerializerError> {
        Ok(Box::new(BinarySerializer::new(output, input)))
    }
}
