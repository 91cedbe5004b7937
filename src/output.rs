//! Single-line JSON rendering for results and errors.
//!
//! Objects are written as `{"key": value, "key": value}`, the separator
//! layout downstream consumers of the classifier already parse.

use crate::classifier::Result;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io::{self, Write};

#[derive(Debug, Default, Clone, Copy)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}

#[derive(Serialize)]
struct ErrorMessage<'a> {
    error: &'a str,
}

/// Writes `value` followed by a newline.
pub fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let mut serializer = Serializer::with_formatter(&mut *writer, SpacedFormatter);
    value.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_error<W: Write>(writer: &mut W, message: &str) -> Result<()> {
    write_line(writer, &ErrorMessage { error: message })
}
