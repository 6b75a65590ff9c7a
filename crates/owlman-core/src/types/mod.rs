//! 분석 전반에서 사용되는 공통 도메인 타입.

mod bar;
mod universe;

pub use bar::*;
pub use universe::*;
