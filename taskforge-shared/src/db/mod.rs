/// Database utilities

pub mod pool;
