//! Cache-generation MCP tools.
//!
//! Inspection of the generations in the local store and a manual
//! install/activate pass of the configured generation.

pub mod activate;
pub mod generations;

pub use activate::activate_impl;
pub use generations::generations_impl;
