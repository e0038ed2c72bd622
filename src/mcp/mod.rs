// JSON-RPC message types, the tool dispatcher and the stdin/stdout transport
pub mod handler;
pub mod protocol;
pub mod stdio;
