//! Limit switch inputs

pub mod nc;

pub use nc::NcSwitch;
