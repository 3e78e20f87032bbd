//! Domain model: entities, value objects, pure pricing functions and the
//! persistence/clock ports the dispatch engine depends on.

pub mod business;
pub mod delivery;
pub mod ids;
pub mod ledger;
pub mod money;
pub mod ports;
pub mod pricing;
pub mod rider;
pub mod user;
