//! Domain records mirrored from the hosted backend's tables and procedure
//! payloads.

pub mod agenda;
pub mod claims;
pub mod crm;
pub mod finance;
pub mod ledger;
pub mod macros;
pub mod portfolio;
pub mod reconciliation;

pub use agenda::*;
pub use claims::*;
pub use crm::*;
pub use finance::*;
pub use ledger::*;
pub use portfolio::*;
pub use reconciliation::*;
