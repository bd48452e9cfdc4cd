// Command Relay Infrastructure - HTTP Adapter
// Implements: RemoteAuthority

mod remote_authority;

pub use remote_authority::{
    HttpRemoteAuthority, API_KEY_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
