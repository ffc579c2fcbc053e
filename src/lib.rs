pub mod codec;
pub mod commands;
pub mod doctor;
pub mod error;
pub mod mask;
pub mod migrate;
pub mod paths;
pub mod profile;
pub mod resolve;
pub mod store;
pub mod telemetry;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
