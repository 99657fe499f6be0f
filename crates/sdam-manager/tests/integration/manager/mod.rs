pub mod groups;
pub mod heartbeat;
