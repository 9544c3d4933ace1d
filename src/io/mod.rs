//! Side-effecting collaborators: model transport, tool execution, filesystem.

pub mod config;
pub mod discovery;
pub mod gateway;
pub mod process;
pub mod tools;
