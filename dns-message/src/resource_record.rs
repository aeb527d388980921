use crate::{encode_str, Class, MessageError, Result, Type};
use std::convert::TryFrom;
use std::fmt;
use std::net::Ipv4Addr;
use tracing::{instrument, trace};

#[derive(Debug, Clone, PartialEq)]
/// The answer, authority and additional sections all share the same format,
/// that is a variable number of [`ResourceRecord`]s.
///
/// These can be constructed with a [`crate::ResourceRecordBuilder`].
pub struct ResourceRecord {
    /// A domain name to which this resource record pertains.
    pub name: String,

    /// The type and data of the resource record.
    pub data: RData,

    /// The class of the data in the `data` field.
    pub class: Class,

    /// RFC1035 - a 32 bit unsigned integer that specifies the time interval (in
    /// seconds) that the resource record may be cached before it should be
    /// discarded.
    pub ttl: u32,
}

impl ResourceRecord {
    pub fn rtype(&self) -> Type {
        self.data.rtype()
    }

    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        // The rdata is encoded first so a bad NS name leaves `buf` untouched,
        // and its length has to be written before it.
        let mut rdata: Vec<u8> = Vec::with_capacity(255);
        let rdlength = self.data.to_bytes(&mut rdata)?;
        let rdlength_field = u16::try_from(rdlength)
            .map_err(|_| MessageError::SectionOverflow("rdata", rdlength))?;

        // Names are always written in full, there is no compression on output.
        let mut byte_count = encode_str(&self.name, buf)?;

        buf.extend_from_slice(&u16::from(self.rtype()).to_be_bytes());
        byte_count += 2;

        byte_count += self.class.to_bytes(buf);

        buf.extend_from_slice(&self.ttl.to_be_bytes());
        byte_count += 4;

        buf.extend_from_slice(&rdlength_field.to_be_bytes());
        buf.extend(rdata);
        byte_count += 2 + rdlength;

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        write!(f, "{} {} {} {}", self.name, self.ttl, self.class, self.data)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// The [`ResourceRecord`] data.
pub enum RData {
    /// RFC1035 - (1) a host address.
    A(Ipv4Addr),

    /// RFC1035 - (2) the host name of an authoritative name server.
    NS(String),

    /// Raw rdata - any other type is kept as the record type and its bytes,
    /// exactly as they were on the wire.
    Raw(u16, Vec<u8>),
}

impl RData {
    pub fn rtype(&self) -> Type {
        match self {
            RData::A(_) => Type::A,
            RData::NS(_) => Type::NS,
            RData::Raw(i, _) => Type::from(*i),
        }
    }

    pub fn as_a(&self) -> Option<Ipv4Addr> {
        match self {
            RData::A(v4) => Some(*v4),
            _ => None,
        }
    }

    pub fn as_ns(&self) -> Option<&str> {
        match self {
            RData::NS(host) => Some(host),
            _ => None,
        }
    }

    fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        match self {
            RData::A(v4) => {
                buf.extend_from_slice(&v4.octets());
                Ok(4)
            }
            RData::NS(host) => encode_str(host, buf),
            RData::Raw(_, v) => {
                buf.extend_from_slice(v);
                Ok(v.len())
            }
        }
    }
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Self::A(v4) => write!(f, "A({})", v4),
            Self::NS(host) => write!(f, "NS({})", host),
            Self::Raw(id, v) => write!(f, "{}({} bytes)", Type::from(*id), v.len()),
        }
    }
}
