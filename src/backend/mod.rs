//! Backend implementations of the transfer engine's interfaces

pub mod memory;
pub mod null;

pub use memory::MemoryStore;
pub use null::NullTransport;
