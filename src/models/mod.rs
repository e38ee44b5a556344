pub mod common;
pub mod device;
pub mod sample;
pub mod sync;
