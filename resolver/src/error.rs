use dns_message::{MessageError, RCode};
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid DNS message: {0}")]
    Message(#[from] MessageError),

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("{server} returned no answer, glue or nameserver for {name} ({rcode})")]
    NoReferral {
        name: String,
        server: Ipv4Addr,
        rcode: RCode,
    },

    #[error("Gave up on {name} after {hops} queries")]
    HopLimitExceeded { name: String, hops: usize },

    #[error("Nameserver lookups for {name} nested deeper than {depth}")]
    DepthLimitExceeded { name: String, depth: usize },

    #[error("Response id {actual} from {server} does not match query id {expected}")]
    IdMismatch {
        server: Ipv4Addr,
        expected: u16,
        actual: u16,
    },

    #[error("Message from {server} is not a response")]
    NotAResponse { server: Ipv4Addr },
}
