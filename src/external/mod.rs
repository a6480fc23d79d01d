//! Clients for external collaborators.

mod erp;

pub use erp::{ErpClient, ErpPort};
