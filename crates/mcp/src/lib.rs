// MCP (Model Context Protocol) tool layer for chart generation.
// Exposes one tool per chart type; the transport is left to the host.

pub mod generate;
pub mod protocol;
pub mod remote;
pub mod server;
pub mod tools;

pub use generate::{ChartGenerator, Route};
pub use server::McpServer;
