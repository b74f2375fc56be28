pub mod benchmark;
pub mod blocks;
pub mod pool;
pub mod probe;
