//! JSON-RPC framing and per-connection sessions.

pub mod message;
mod session;

pub use message::{
    DecodeError, Inbound, JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION,
    decode_bytes, decode_frame,
};
pub use session::{
    ClientInfo, Session, SessionError, SessionResult, SessionState, SessionSummary,
};
