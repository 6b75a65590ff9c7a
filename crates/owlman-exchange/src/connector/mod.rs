//! 증권사 커넥터.

pub mod kis;
