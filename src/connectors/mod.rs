pub mod traits;
pub mod upbit;

#[cfg(test)]
pub mod mock;
