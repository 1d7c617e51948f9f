//! Session-state containers.
//!
//! Each container from the client is modeled as an explicit, independently
//! owned state object: the chat session and overlay stores are pure
//! reducers (mutations serialized through a single task, never interleaved),
//! guest usage counters write through to Redis, and the project cache is an
//! in-process map used by the projects handlers.

pub mod chat_session;
pub mod guest;
pub mod overlay;
pub mod project_cache;
