//! 증권사 외부 데이터 제공자.

mod bond;
mod naver;

pub use bond::{BondInfo, CouponPayment, ShinhanBondProvider, BOND_BASE_URL, REDEMPTION_PRICE};
pub use naver::{etf_universe, EtfCategory, EtfItem, NaverEtfProvider, ETF_LIST_URL};
