mod builder;
mod error;
mod header;
mod message;
mod parser;
mod question;
mod resource_record;

use tracing::{instrument, trace};

pub use builder::{MessageBuilder, QuestionBuilder, ResourceRecordBuilder};
pub use error::MessageError;
pub use header::{Flags, Header, OpCode, RCode};
pub use message::{build_query, Message};
pub use parser::decode_name;
pub use question::{Class, Question, Type};
pub use resource_record::{RData, ResourceRecord};

pub type Result<T> = std::result::Result<T, MessageError>;

/// RFC1035 - labels are restricted to 63 octets or less.
pub const MAX_LABEL_LEN: usize = 63;

/// RFC1035 - names are restricted to 255 octets or less.
pub const MAX_NAME_LEN: usize = 255;

/// Encodes a dotted domain name as a sequence of length prefixed labels,
/// terminated by the zero length root label.
///
/// A single trailing dot is accepted, and both `""` and `"."` encode the root.
pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(name.len() + 2);
    encode_str(name, &mut buf)?;
    Ok(buf)
}

#[instrument(skip(buf))]
pub(crate) fn encode_str(s: &str, buf: &mut Vec<u8>) -> Result<usize> {
    let start = buf.len();
    let trimmed = s.strip_suffix('.').unwrap_or(s);
    if !trimmed.is_empty() {
        for name in trimmed.split('.') {
            if name.is_empty() {
                buf.truncate(start);
                return Err(MessageError::EmptyLabel(s.to_string()));
            }
            if name.len() > MAX_LABEL_LEN {
                buf.truncate(start);
                return Err(MessageError::NameLengthExceeded(
                    name.len(),
                    name.to_string(),
                ));
            }
            buf.push(name.len() as u8);
            buf.extend_from_slice(name.as_bytes());
        }
    }
    buf.push(0);

    let byte_count = buf.len() - start;
    if byte_count > MAX_NAME_LEN {
        buf.truncate(start);
        return Err(MessageError::NameTooLong(byte_count, s.to_string()));
    }

    trace!("Wrote {} bytes", byte_count);

    Ok(byte_count)
}
