pub mod cli;
pub mod config;
pub mod pki;
pub mod scan;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;
