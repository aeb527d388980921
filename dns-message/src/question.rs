use crate::{encode_str, Result};
use std::default::Default;
use std::fmt;
use std::str::FromStr;

use tracing::{instrument, trace};

#[derive(Debug, Clone, PartialEq)]
/// The question section is used to carry the "question" in most queries, i.e.,
/// the parameters that define what is being asked.
pub struct Question {
    /// RFC1035 - a domain name represented as a sequence of labels, where each
    /// label consists of a length octet followed by that number of octets.  The
    /// domain name terminates with the zero length octet for the null label of
    /// the root.  Note that this field may be an odd number of octets; no
    /// padding is used.
    pub q_name: String,

    /// RFC1035 - a two octet code which specifies the type of the query.
    pub q_type: Type,

    /// RFC1035 - a two octet code that specifies the ['Class`] of the query.
    pub q_class: Class,
}

impl Question {
    #[instrument(skip(buf))]
    pub(crate) fn to_bytes(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let mut byte_count = encode_str(&self.q_name, buf)?;
        byte_count += self.q_type.to_bytes(buf);
        byte_count += self.q_class.to_bytes(buf);

        trace!("Wrote {} bytes", byte_count);

        Ok(byte_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Record types. Only [`Type::A`] and [`Type::NS`] record data is interpreted,
/// everything else is carried as opaque bytes.
pub enum Type {
    /// RFC1035 - (1) a host address.
    A,

    /// RFC1035 - (2) an authoritative name server.
    NS,

    /// RFC1035 - (5) the canonical name for an alias.
    CNAME,

    /// RFC1035 - (6) marks the start of a zone of authority.
    SOA,

    /// RFC1035 - (12) a domain name pointer.
    PTR,

    /// RFC1035 - (15) mail exchange.
    MX,

    /// RFC1035 - (16) text strings.
    TXT,

    /// RFC3596 - (28) a single IPv6 address.
    AAAA,

    /// RFC6891 - (41) the EDNS0 pseudo record.
    OPT,

    /// RFC1035 - (255) A request for all records.
    STAR,

    /// An unknown [`Type`] - the value is contained within.
    Unknown(u16),
}

impl Type {
    fn to_bytes(self, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&u16::from(self).to_be_bytes());
        2
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        let disp = match self {
            Self::A => "A",
            Self::NS => "NS",
            Self::CNAME => "CNAME",
            Self::SOA => "SOA",
            Self::PTR => "PTR",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::AAAA => "AAAA",
            Self::OPT => "OPT",
            Self::STAR => "*",
            Self::Unknown(i) => return write!(f, "TYPE{}", i),
        };
        write!(f, "{}", disp)
    }
}

impl FromStr for Type {
    type Err = String;

    /// Accepts a mnemonic (`A`, `ns`, ...), an RFC3597 `TYPEnn` or a bare
    /// number.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let t = match upper.as_str() {
            "A" => Type::A,
            "NS" => Type::NS,
            "CNAME" => Type::CNAME,
            "SOA" => Type::SOA,
            "PTR" => Type::PTR,
            "MX" => Type::MX,
            "TXT" => Type::TXT,
            "AAAA" => Type::AAAA,
            "OPT" => Type::OPT,
            "*" | "ANY" => Type::STAR,
            other => {
                let num = other.strip_prefix("TYPE").unwrap_or(other);
                num.parse::<u16>()
                    .map(Type::from)
                    .map_err(|_| format!("unknown record type: {}", s))?
            }
        };
        Ok(t)
    }
}

impl Default for Type {
    fn default() -> Self {
        Self::A
    }
}

impl From<Type> for u16 {
    fn from(t: Type) -> u16 {
        match t {
            Type::A => 1,
            Type::NS => 2,
            Type::CNAME => 5,
            Type::SOA => 6,
            Type::PTR => 12,
            Type::MX => 15,
            Type::TXT => 16,
            Type::AAAA => 28,
            Type::OPT => 41,
            Type::STAR => 255,
            Type::Unknown(i) => i,
        }
    }
}

impl From<u16> for Type {
    fn from(val: u16) -> Self {
        match val {
            1 => Type::A,
            2 => Type::NS,
            5 => Type::CNAME,
            6 => Type::SOA,
            12 => Type::PTR,
            15 => Type::MX,
            16 => Type::TXT,
            28 => Type::AAAA,
            41 => Type::OPT,
            255 => Type::STAR,
            _ => Type::Unknown(val),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The class of the query - you will want [`Class::IN`] (the default) 99.99% of
/// the time.
pub enum Class {
    /// RFC1035 - 1 the Internet.
    IN,

    /// RFC1035 - 3 the CHAOS class.
    CH,

    /// RFC1035 - 4 Hesiod [Dyer 87].
    HS,

    /// RFC1035 - 255 any class.
    STAR,

    /// An unknown class - contained within.
    Unknown(u16),
}

impl Class {
    pub(crate) fn to_bytes(self, buf: &mut Vec<u8>) -> usize {
        buf.extend_from_slice(&u16::from(self).to_be_bytes());
        2
    }
}

impl Default for Class {
    fn default() -> Self {
        Class::IN
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::result::Result<(), fmt::Error> {
        match self {
            Class::IN => write!(f, "IN"),
            Class::CH => write!(f, "CH"),
            Class::HS => write!(f, "HS"),
            Class::STAR => write!(f, "*"),
            Class::Unknown(i) => write!(f, "CLASS{}", i),
        }
    }
}

impl From<Class> for u16 {
    fn from(c: Class) -> u16 {
        match c {
            Class::IN => 1,
            Class::CH => 3,
            Class::HS => 4,
            Class::STAR => 255,
            Class::Unknown(i) => i,
        }
    }
}

impl From<u16> for Class {
    fn from(val: u16) -> Self {
        match val {
            1 => Class::IN,
            3 => Class::CH,
            4 => Class::HS,
            255 => Class::STAR,
            _ => Class::Unknown(val),
        }
    }
}
