//! 투자 유니버스 (종목 코드 → 메타데이터, 순서 유지).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 종목 메타데이터.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// 종목 코드 (예: "069500")
    pub code: String,
    /// 종목명
    pub name: String,
    /// 분류 (ETF 카테고리 등)
    pub category: Option<String>,
    /// 시가총액 (억원)
    pub market_cap: Option<Decimal>,
}

impl Instrument {
    /// 코드와 이름만으로 생성합니다.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category: None,
            market_cap: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_market_cap(mut self, market_cap: Decimal) -> Self {
        self.market_cap = Some(market_cap);
        self
    }
}

/// 순서가 유지되는 종목 집합.
///
/// 삽입 순서가 군집 라벨 번호와 동점 처리 순서를 결정합니다.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    instruments: Vec<Instrument>,
    index: HashMap<String, usize>,
}

impl Universe {
    /// 종목 목록으로 유니버스를 생성합니다. 중복 코드는 처음 것만 남깁니다.
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        let mut universe = Self::default();
        for instrument in instruments {
            universe.push(instrument);
        }
        universe
    }

    /// 종목을 추가합니다. 이미 있는 코드면 `false`를 반환합니다.
    pub fn push(&mut self, instrument: Instrument) -> bool {
        if self.index.contains_key(&instrument.code) {
            return false;
        }
        self.index
            .insert(instrument.code.clone(), self.instruments.len());
        self.instruments.push(instrument);
        true
    }

    pub fn get(&self, code: &str) -> Option<&Instrument> {
        self.index.get(code).map(|&i| &self.instruments[i])
    }

    /// 코드의 위치(순서)를 반환합니다.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn codes(&self) -> Vec<String> {
        self.instruments.iter().map(|i| i.code.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// 조건을 만족하는 종목만 남깁니다. 순서는 유지됩니다.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Instrument) -> bool,
    {
        self.instruments.retain(|i| keep(i));
        self.index = self
            .instruments
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.code.clone(), i))
            .collect();
    }
}

impl FromIterator<Instrument> for Universe {
    fn from_iter<T: IntoIterator<Item = Instrument>>(iter: T) -> Self {
        Self::new(iter)
    }
}
