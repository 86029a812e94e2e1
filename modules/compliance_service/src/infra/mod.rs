//! Infrastructure layer - persistence, queue, events and external systems

pub mod email;
pub mod events;
pub mod external;
pub mod files;
pub mod queue;
pub mod storage;
