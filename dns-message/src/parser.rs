use crate::error::MessageError;
use crate::header::{SectionCounts, HEADER_LEN};
use crate::{
    Class, Flags, Header, Message, Question, RData, ResourceRecord, Result, Type, MAX_NAME_LEN,
};
use nom::bits::complete::take as take_bits;
use nom::bytes::complete::take as take_bytes;
use nom::IResult;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use tracing::{instrument, trace};

/// Type, class, ttl and rdlength of a resource record.
const RR_FIXED_LEN: usize = 10;

/// Type and class of a question.
const QUESTION_FIXED_LEN: usize = 4;

/// Every parser below takes the whole `message` alongside the `input` it is
/// reading from, as name pointers are offsets from the start of the message.
/// The returned slice is the input left after the item: a cursor that only
/// ever moves forward.
type Parsed<'a, T> = Result<(&'a [u8], T)>;

#[derive(Debug)]
pub(crate) struct RawHeader {
    pub(crate) header: Header,
    pub(crate) counts: SectionCounts,
}

/// Helper for pulling out either the length of a label, or the offset of the
/// name to continue from if using compression.
#[derive(Debug, PartialEq)]
enum NameRecord {
    Offset(u16),
    Length(u8),
    Reserved(u8),
}

fn ensure_remaining(input: &[u8], needed: usize, what: &str) -> Result<()> {
    if input.len() < needed {
        return Err(MessageError::Truncated(format!(
            "{} needs {} bytes but only {} remain",
            what,
            needed,
            input.len()
        )));
    }
    Ok(())
}

fn read_u16(input: &[u8]) -> IResult<&[u8], u16> {
    nom::combinator::map(take_bytes(2usize), |input: &[u8]| {
        u16::from_be_bytes([input[0], input[1]])
    })(input)
}

fn read_u32(input: &[u8]) -> IResult<&[u8], u32> {
    nom::combinator::map(take_bytes(4usize), |input: &[u8]| {
        u32::from_be_bytes([input[0], input[1], input[2], input[3]])
    })(input)
}

fn read_slice(input: &[u8], len: usize) -> IResult<&[u8], &[u8]> {
    take_bytes(len)(input)
}

#[instrument(skip(input))]
pub(crate) fn read_header(input: &[u8]) -> Parsed<'_, RawHeader> {
    ensure_remaining(input, HEADER_LEN, "header")?;

    let (input, id) = read_u16(input)?;
    let (input, flags) = read_u16(input)?;
    let (input, qd) = read_u16(input)?;
    let (input, an) = read_u16(input)?;
    let (input, ns) = read_u16(input)?;
    let (input, ar) = read_u16(input)?;

    trace!(
        "header id: {}, flags: {:#06x}, counts: {}/{}/{}/{}",
        id,
        flags,
        qd,
        an,
        ns,
        ar
    );

    Ok((
        input,
        RawHeader {
            header: Header {
                id,
                flags: Flags::from(flags),
            },
            counts: SectionCounts { qd, an, ns, ar },
        },
    ))
}

fn read_name_record(input: &[u8]) -> IResult<&[u8], NameRecord> {
    use nom::bits::bits;

    bits::<_, _, nom::error::Error<_>, nom::error::Error<_>, _>(|i| {
        let (i, flags): (_, u8) = take_bits(2usize)(i)?;
        match flags {
            0b11 => {
                // This is a compressed offset
                let (i, offset): (_, u16) = take_bits(14usize)(i)?;
                Ok((i, NameRecord::Offset(offset)))
            }
            0b00 => {
                let (i, len): (_, u8) = take_bits(6usize)(i)?;
                Ok((i, NameRecord::Length(len)))
            }
            _ => {
                let (i, rest): (_, u8) = take_bits(6usize)(i)?;
                Ok((i, NameRecord::Reserved(flags << 6 | rest)))
            }
        }
    })(input)
}

/// Reads labels from `input` into `labels` until the root label.
///
/// A pointer is always the last element of a name: reading carries on at its
/// target, and the input returned is the two bytes past the first pointer, no
/// matter how long the name it points to is. Pointers are followed in a loop
/// so a long chain of them cannot exhaust the stack.
fn read_labels<'a>(
    message: &'a [u8],
    input: &'a [u8],
    labels: &mut Vec<String>,
) -> Result<&'a [u8]> {
    let mut input = input;
    let mut resume = None;
    let mut seen_ptrs = HashSet::new();
    // The root label counts towards the encoded length.
    let mut name_len = 1;
    loop {
        let (i, name_record) = read_name_record(input)?;
        match name_record {
            // Names are terminated with a NULL byte.
            NameRecord::Length(0) => return Ok(resume.unwrap_or(i)),
            NameRecord::Length(length) => {
                ensure_remaining(i, length as usize, "label")?;
                let (i, label) = read_slice(i, length as usize)?;
                labels.push(String::from_utf8_lossy(label).into_owned());
                name_len += 1 + length as usize;
                if name_len > MAX_NAME_LEN {
                    return Err(MessageError::NameTooLong(name_len, labels.join(".")));
                }
                input = i;
            }
            NameRecord::Offset(offset) => {
                if !seen_ptrs.insert(offset) {
                    return Err(MessageError::CircularReference(offset));
                }
                trace!("Name pointer at offset: {}", offset);
                input = message
                    .get(offset as usize..)
                    .filter(|target| !target.is_empty())
                    .ok_or(MessageError::PointerOutOfBounds(offset))?;
                resume.get_or_insert(i);
            }
            NameRecord::Reserved(byte) => return Err(MessageError::ReservedLabelType(byte)),
        }
    }
}

#[instrument(skip(message, input))]
fn read_name<'a>(message: &'a [u8], input: &'a [u8]) -> Parsed<'a, String> {
    let mut labels = Vec::new();
    let input = read_labels(message, input, &mut labels)?;
    let name = labels.join(".");
    trace!("read name: {}", name);
    Ok((input, name))
}

/// Decodes the (possibly compressed) name that starts at `offset` in
/// `message`, returning the dotted name and the offset of the first byte after
/// it.
pub fn decode_name(message: &[u8], offset: usize) -> Result<(String, usize)> {
    let input = message.get(offset..).ok_or_else(|| {
        MessageError::Truncated(format!(
            "name offset {} is past the end of a {} byte message",
            offset,
            message.len()
        ))
    })?;
    let (rest, name) = read_name(message, input)?;
    Ok((name, message.len() - rest.len()))
}

#[instrument(skip(message, input))]
fn read_question<'a>(message: &'a [u8], input: &'a [u8]) -> Parsed<'a, Question> {
    trace!("reading question");
    let (input, q_name) = read_name(message, input)?;

    ensure_remaining(input, QUESTION_FIXED_LEN, "question")?;
    let (input, q_type) = read_u16(input)?;
    let (input, q_class) = read_u16(input)?;

    Ok((
        input,
        Question {
            q_name,
            q_type: Type::from(q_type),
            q_class: Class::from(q_class),
        },
    ))
}

/// Interprets the rdata of a record. The rdata slice bounds the data, but any
/// name pointers inside it are still resolved against the whole message.
fn read_rdata(message: &[u8], rtype: Type, rdata: &[u8]) -> Result<RData> {
    let data = match rtype {
        Type::A => {
            if rdata.len() != 4 {
                return Err(MessageError::InvalidRDataLength(Type::A, 4, rdata.len()));
            }
            RData::A(Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]))
        }
        Type::NS => {
            let (_, host) = read_name(message, rdata)?;
            RData::NS(host)
        }
        other => RData::Raw(other.into(), rdata.to_vec()),
    };

    trace!("Parsed rdata as {}", data);

    Ok(data)
}

#[instrument(skip(message, input))]
fn read_resource_record<'a>(message: &'a [u8], input: &'a [u8]) -> Parsed<'a, ResourceRecord> {
    trace!("reading resource record");
    let (input, name) = read_name(message, input)?;

    ensure_remaining(input, RR_FIXED_LEN, "resource record")?;
    let (input, rtype) = read_u16(input)?;
    let (input, class) = read_u16(input)?;
    let (input, ttl) = read_u32(input)?;
    let (input, rdlength) = read_u16(input)?;

    trace!("Found rdata of length: {}", rdlength);

    ensure_remaining(input, rdlength as usize, "rdata")?;
    let (input, rdata) = read_slice(input, rdlength as usize)?;
    let data = read_rdata(message, Type::from(rtype), rdata)?;

    Ok((
        input,
        ResourceRecord {
            name,
            data,
            class: Class::from(class),
            ttl,
        },
    ))
}

fn read_records<'a>(
    message: &'a [u8],
    input: &'a [u8],
    count: u16,
) -> Parsed<'a, Vec<ResourceRecord>> {
    let mut input = input;
    let mut records = Vec::new();
    for _ in 0..count {
        let (i, record) = read_resource_record(message, input)?;
        input = i;
        records.push(record);
    }
    Ok((input, records))
}

#[instrument(skip(message))]
pub(crate) fn read_message(message: &[u8]) -> Result<Message> {
    trace!("reading message");
    let (mut input, raw) = read_header(message)?;
    let counts = raw.counts;

    let mut questions = Vec::new();
    for _ in 0..counts.qd {
        let (i, question) = read_question(message, input)?;
        input = i;
        questions.push(question);
    }

    let (input, answers) = read_records(message, input, counts.an)?;
    let (input, name_servers) = read_records(message, input, counts.ns)?;
    let (input, additional_records) = read_records(message, input, counts.ar)?;

    if !input.is_empty() {
        trace!("Ignoring {} trailing bytes", input.len());
    }

    Ok(Message {
        header: raw.header,
        questions,
        answers,
        name_servers,
        additional_records,
    })
}
