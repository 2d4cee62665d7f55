use crate::serializer::{ReplayRecord, Serializer, SerializerError, SerializerFactory};
use std::io::{BufRead, BufReader, Read, Write};

/// Newline-delimited JSON replay stream, one record per line
pub struct JsonSerializer<'a> {
    output: Option<Box<dyn Write + 'a>>,
    input: Option<BufReader<Box<dyn Read + 'a>>>,
}

impl<'a> JsonSerializer<'a> {
    pub fn new(output: Option<Box<dyn Write + 'a>>, input: Option<Box<dyn Read + 'a>>) -> Self {
        Self {
            output,
            input: input.map(BufReader::new),
        }
    }
}

impl Serializer for JsonSerializer<'_> {
    fn write_record(&mut self, record: &ReplayRecord) -> Result<(), SerializerError> {
        let out = self.output.as_mut().ok_or(SerializerError::MissingOutput)?;
        if let ReplayRecord::Round(delta) = record {
            delta.validate()?;
        }
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn read_record(&mut self) -> Result<Option<ReplayRecord>, SerializerError> {
        let input = self.input.as_mut().ok_or(SerializerError::MissingInput)?;
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        Ok(Some(serde_json::from_str(&line)?))
    }

    fn flush(&mut self) -> Result<(), SerializerError> {
        if let Some(out) = self.output.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializerFactory;

impl SerializerFactory for JsonSerializerFactory {
    fn create_serializer<'a>(
        &self,
        output: Option<Box<dyn Write + 'a>>,
        input: Option<Box<dyn Read + 'a>>,
    ) -> Result<Box<dyn Serializer + 'a>, SerializerError> {
        Ok(Box::new(JsonSerializer::new(output, input)))
    }
}
