//! owlman CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - ETF 유니버스 스크리닝 (군집별 후보와 진입 금액)
//! - ETF 목록 조회
//! - 계좌 자산 현황 / 휴장일 조회
//! - 채권 매매 손익과 예상 수익 계산

pub mod commands;
