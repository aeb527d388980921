use crate::Type;
use nom::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Message truncated: {0}")]
    Truncated(String),

    #[error("Circular reference - detected a pointer we have seen already: {0}")]
    CircularReference(u16),

    #[error("Name pointer to offset {0} is outside of the message")]
    PointerOutOfBounds(u16),

    #[error("Label length byte {0:#04x} uses a reserved label type")]
    ReservedLabelType(u8),

    #[error("OpCode {0} does not fit in 4 bits")]
    ReservedOpCode(u8),

    #[error("RCode {0} does not fit in 4 bits")]
    ReservedRCode(u8),

    #[error("Label of length {0} is longer than 63 bytes: {1}")]
    NameLengthExceeded(usize, String),

    #[error("Name contains an empty label: {0}")]
    EmptyLabel(String),

    #[error("Encoded name of {0} bytes is longer than 255 bytes: {1}")]
    NameTooLong(usize, String),

    #[error("{0} record data must be {1} bytes, found {2}")]
    InvalidRDataLength(Type, usize, usize),

    #[error("Too many entries in the {0} section: {1}")]
    SectionOverflow(&'static str, usize),
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for MessageError {
    fn from(error: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match error {
            nom::Err::Error(e) | nom::Err::Failure(e) if e.code == ErrorKind::Eof => {
                MessageError::Truncated(format!(
                    "unexpected end of input with {} bytes left",
                    e.input.len()
                ))
            }
            nom::Err::Incomplete(_) => MessageError::Truncated("incomplete input".to_string()),
            other => MessageError::ParsingError(format!("{:?}", other)),
        }
    }
}
