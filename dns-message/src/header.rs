use crate::{MessageError, Result};
use std::default::Default;
use std::fmt;
use tracing::{instrument, trace};

/// Length of the fixed header in bytes.
pub(crate) const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Default, PartialEq)]
/// The DNS Message Header as per RFC1035 and RFC2535.
///
/// The four section counts are not held here: they are derived from the
/// sections of the [`crate::Message`] when it is written, and drive how many
/// entries are read when it is parsed.
pub struct Header {
    /// RFC1035 - A 16 bit identifier assigned by the program that generates any
    /// kind of query. This identifier is copied the corresponding reply and
    /// can be used by the requester to match up replies to outstanding queries.
    pub id: u16,

    /// The second 16 bits of the header: QR, Opcode, AA, TC, RD, RA, Z, AD, CD
    /// and RCODE.
    pub flags: Flags,
}

/// Number of entries in each of the four message sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SectionCounts {
    pub(crate) qd: u16,
    pub(crate) an: u16,
    pub(crate) ns: u16,
    pub(crate) ar: u16,
}

impl Header {
    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, counts: SectionCounts, buf: &mut Vec<u8>) -> usize {
        for field in [
            self.id,
            self.flags.bits(),
            counts.qd,
            counts.an,
            counts.ns,
            counts.ar,
        ]
        .iter()
        {
            buf.extend_from_slice(&field.to_be_bytes());
        }

        trace!("Wrote {} bytes", HEADER_LEN);

        HEADER_LEN
    }
}

/// The flags word of the header, kept as the raw 16 bits so that any value
/// read off the wire is written back unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags(u16);

impl Flags {
    /// RFC1035 - Query (0) or Response (1).
    pub const QR: u16 = 1 << 15;

    /// RFC1035 - Authoritative Answer.
    pub const AA: u16 = 1 << 10;

    /// RFC1035 - TrunCation.
    pub const TC: u16 = 1 << 9;

    /// RFC1035 - Recursion Desired.
    pub const RD: u16 = 1 << 8;

    /// RFC1035 - Recursion Available.
    pub const RA: u16 = 1 << 7;

    /// RFC2535 - Authentic Data.
    pub const AD: u16 = 1 << 5;

    /// RFC2535 - Checking Disabled.
    pub const CD: u16 = 1 << 4;

    const OPCODE_SHIFT: u16 = 11;
    const NIBBLE: u16 = 0xf;

    pub fn bits(self) -> u16 {
        self.0
    }

    fn get(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    fn set(&mut self, mask: u16, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    pub fn qr(self) -> bool {
        self.get(Self::QR)
    }

    pub fn aa(self) -> bool {
        self.get(Self::AA)
    }

    pub fn tc(self) -> bool {
        self.get(Self::TC)
    }

    pub fn rd(self) -> bool {
        self.get(Self::RD)
    }

    pub fn ra(self) -> bool {
        self.get(Self::RA)
    }

    pub fn ad(self) -> bool {
        self.get(Self::AD)
    }

    pub fn cd(self) -> bool {
        self.get(Self::CD)
    }

    pub fn opcode(self) -> OpCode {
        OpCode::from(((self.0 >> Self::OPCODE_SHIFT) & Self::NIBBLE) as u8)
    }

    pub fn rcode(self) -> RCode {
        RCode::from((self.0 & Self::NIBBLE) as u8)
    }

    pub fn set_qr(&mut self, value: bool) {
        self.set(Self::QR, value)
    }

    pub fn set_aa(&mut self, value: bool) {
        self.set(Self::AA, value)
    }

    pub fn set_tc(&mut self, value: bool) {
        self.set(Self::TC, value)
    }

    pub fn set_rd(&mut self, value: bool) {
        self.set(Self::RD, value)
    }

    pub fn set_ra(&mut self, value: bool) {
        self.set(Self::RA, value)
    }

    pub fn set_ad(&mut self, value: bool) {
        self.set(Self::AD, value)
    }

    pub fn set_cd(&mut self, value: bool) {
        self.set(Self::CD, value)
    }

    pub fn set_opcode(&mut self, opcode: OpCode) -> Result<()> {
        let val = u16::from(opcode.as_u8()?);
        self.0 = (self.0 & !(Self::NIBBLE << Self::OPCODE_SHIFT)) | (val << Self::OPCODE_SHIFT);
        Ok(())
    }

    pub fn set_rcode(&mut self, rcode: RCode) -> Result<()> {
        let val = u16::from(rcode.as_u8()?);
        self.0 = (self.0 & !Self::NIBBLE) | val;
        Ok(())
    }
}

impl From<u16> for Flags {
    fn from(bits: u16) -> Self {
        Flags(bits)
    }
}

impl From<Flags> for u16 {
    fn from(flags: Flags) -> u16 {
        flags.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A four bit field that specifies kind of query in this message.  This value
/// is set by the originator of a query and copied into the response.
pub enum OpCode {
    /// A standard query.
    Query,

    /// An inverse query.
    IQuery,

    /// A server status request.
    Status,

    /// An unknown OpCode (contained within).
    Unknown(u8),
}

impl OpCode {
    pub(crate) fn as_u8(&self) -> Result<u8> {
        match self {
            OpCode::Query => Ok(0),
            OpCode::IQuery => Ok(1),
            OpCode::Status => Ok(2),
            OpCode::Unknown(opcode) => {
                if *opcode > 0xf {
                    // OpCodes can only be 4 bits wide.
                    Err(MessageError::ReservedOpCode(*opcode))
                } else {
                    Ok(*opcode)
                }
            }
        }
    }
}

impl From<u8> for OpCode {
    fn from(val: u8) -> Self {
        match val {
            0 => OpCode::Query,
            1 => OpCode::IQuery,
            2 => OpCode::Status,
            n => OpCode::Unknown(n),
        }
    }
}

impl Default for OpCode {
    fn default() -> Self {
        OpCode::Query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Response code - this 4 bit field is set as part of responses.
pub enum RCode {
    /// No error condition.
    NoError,

    /// Format error - The name server was unable to interpret the query.
    FormatError,

    /// Server failure - The name server was unable to process this query due to
    /// a problem with the name server.
    ServerFailure,

    /// Name Error - Meaningful only for responses from an authoritative name
    /// server, this code signifies that the domain name referenced in the query
    /// does not exist.
    NameError,

    /// Not Implemented - The name server does not support the requested kind of
    /// query.
    NotImplemented,

    /// Refused - The name server refuses to perform the specified operation for
    /// policy reasons.
    Refused,

    /// The response code was unknown (contained within).
    Unknown(u8),
}

impl RCode {
    pub(crate) fn as_u8(&self) -> Result<u8> {
        match self {
            RCode::NoError => Ok(0),
            RCode::FormatError => Ok(1),
            RCode::ServerFailure => Ok(2),
            RCode::NameError => Ok(3),
            RCode::NotImplemented => Ok(4),
            RCode::Refused => Ok(5),
            RCode::Unknown(i) if *i > 0xf => Err(MessageError::ReservedRCode(*i)),
            RCode::Unknown(i) => Ok(*i),
        }
    }
}

impl From<u8> for RCode {
    fn from(val: u8) -> Self {
        match val {
            0 => RCode::NoError,
            1 => RCode::FormatError,
            2 => RCode::ServerFailure,
            3 => RCode::NameError,
            4 => RCode::NotImplemented,
            5 => RCode::Refused,
            x => RCode::Unknown(x),
        }
    }
}

impl Default for RCode {
    fn default() -> Self {
        RCode::NoError
    }
}

impl fmt::Display for RCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            RCode::NoError => write!(f, "NOERROR"),
            RCode::FormatError => write!(f, "FORMERR"),
            RCode::ServerFailure => write!(f, "SERVFAIL"),
            RCode::NameError => write!(f, "NXDOMAIN"),
            RCode::NotImplemented => write!(f, "NOTIMP"),
            RCode::Refused => write!(f, "REFUSED"),
            RCode::Unknown(i) => write!(f, "Unknown({})", i),
        }
    }
}
