//! # Owlman Core
//!
//! 금융 분석 도구 모음의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 다른 크레이트 전반에서 사용되는 기본 타입을 제공합니다:
//! - 일봉 및 가격 이력
//! - 투자 유니버스 (종목 메타데이터)
//! - 설정 관리
//! - 로깅 인프라
//! - 공통 에러 타입

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
