mod config;
mod error;
mod resolver;
mod transport;

pub use config::{ResolverConfig, DEFAULT_PORT, DEFAULT_RECV_BUFFER_SIZE, DEFAULT_ROOT_SERVER};
pub use error::ResolveError;
pub use resolver::Resolver;
pub use transport::{Transport, UdpTransport};

pub type Result<T> = std::result::Result<T, ResolveError>;
