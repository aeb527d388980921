use crate::header::SectionCounts;
use crate::{
    parser, Header, MessageBuilder, MessageError, Question, QuestionBuilder, ResourceRecord,
    Result, Type,
};
use std::convert::TryFrom;
use std::fmt;
use tracing::{instrument, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    /// The authority section.
    pub name_servers: Vec<ResourceRecord>,
    pub additional_records: Vec<ResourceRecord>,
}

impl Message {
    /// Reads the u8 buffer and parses the DNS message from it.
    ///
    /// This includes the dereferencing of rfc1035 Message Compression pointers,
    /// and collapsing the names into strings. The header counts decide how many
    /// entries are read from each section; running out of bytes before they
    /// are all read is a [`MessageError::Truncated`].
    #[instrument(skip(input))]
    pub fn from_bytes(input: &[u8]) -> Result<Message> {
        let message = parser::read_message(input)?;

        trace!("Read input as: {}", message);

        Ok(message)
    }

    /// Serializes the Message to bytes into the provided buffer, returning the
    /// number of bytes written to the buffer.
    ///
    /// The section counts in the header are taken from the section lengths.
    #[instrument(skip(self, buf))]
    pub fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let counts = SectionCounts {
            qd: section_count("question", self.questions.len())?,
            an: section_count("answer", self.answers.len())?,
            ns: section_count("authority", self.name_servers.len())?,
            ar: section_count("additional", self.additional_records.len())?,
        };

        let mut byte_count = self.header.to_bytes(counts, buf);
        for q in self.questions.iter() {
            byte_count += q.to_bytes(buf)?;
        }
        for a in self.answers.iter() {
            byte_count += a.to_bytes(buf)?;
        }
        for n in self.name_servers.iter() {
            byte_count += n.to_bytes(buf)?;
        }
        for ar in self.additional_records.iter() {
            byte_count += ar.to_bytes(buf)?;
        }

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }
}

fn section_count(section: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| MessageError::SectionOverflow(section, len))
}

/// Builds the wire form of a query for `name` and `q_type` in class IN, with
/// only the Recursion Desired flag set.
#[instrument]
pub fn build_query(name: &str, q_type: Type, id: u16) -> Result<Vec<u8>> {
    let message = MessageBuilder::new()
        .id(id)
        .rd(true)
        .question(QuestionBuilder::new().name(name).q_type(q_type).build())
        .build()?;

    let mut buf = Vec::with_capacity(512);
    message.to_bytes(&mut buf)?;
    Ok(buf)
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "Message(id:{}) - ", self.header.id)?;
        write!(f, "Query [")?;
        for (i, q) in self.questions.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", q.q_name, q.q_type)?;
        }
        write!(f, "]")?;
        if self.header.flags.qr() {
            write!(f, " - Response({}) [", self.header.flags.rcode())?;
            for (i, a) in self.answers.iter().enumerate() {
                if i != 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} => {}", a.name, a.data)?;
            }
            write!(
                f,
                "] authority: {}, additional: {}",
                self.name_servers.len(),
                self.additional_records.len()
            )?;
        }
        Ok(())
    }
}
