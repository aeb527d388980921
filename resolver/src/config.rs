use std::net::Ipv4Addr;

/// a.root-servers.net
pub const DEFAULT_ROOT_SERVER: Ipv4Addr = Ipv4Addr::new(198, 41, 0, 4);

pub const DEFAULT_PORT: u16 = 53;

/// RFC1035 - Limit length of 512 bytes, so just double it.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Where every resolution, including nameserver lookups, starts.
    pub root_server: Ipv4Addr,

    /// Port the nameservers are queried on.
    pub port: u16,

    /// Size of the buffer a reply is received into. Longer datagrams are cut
    /// short.
    pub recv_buffer_size: usize,

    /// Queries a single resolution may send before giving up, not counting
    /// those of nested nameserver lookups.
    pub max_hops: usize,

    /// How deep nameserver lookups may nest inside each other.
    pub max_depth: usize,

    /// Reject replies whose id does not match the query, or that are not
    /// marked as responses.
    pub verify_responses: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_server: DEFAULT_ROOT_SERVER,
            port: DEFAULT_PORT,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            max_hops: 32,
            max_depth: 8,
            verify_responses: true,
        }
    }
}
