pub mod portal;

pub use portal::{Fetch, NetworkError, PortalClient};
