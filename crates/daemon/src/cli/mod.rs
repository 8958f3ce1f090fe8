pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Admin, Daemon, Health, Init, Version};
