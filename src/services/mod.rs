pub mod gateway;
pub mod seed;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::*;
