/// 금액 값 객체
/// 하나의 경매에 속한 모든 금액은 같은 통화를 사용한다
// region:    --- Imports
use crate::auction::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

// endregion: --- Imports

// region:    --- Currency

/// 통화 코드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Krw,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Krw => "KRW",
        }
    }

    pub fn from_str(s: &str) -> Option<Currency> {
        match s {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            "KRW" => Some(Currency::Krw),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// endregion: --- Currency

// region:    --- Money

/// 불변 금액 값: 모든 연산은 새 값을 만든다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// 음수 금액은 거부
    pub fn new(amount: Decimal, currency: Currency) -> Result<Money, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Money { amount, currency })
    }

    pub fn zero(currency: Currency) -> Money {
        Money {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// 이미 검증된 금액 복원용 (저장소, 기본 정책 상수)
    pub(crate) fn from_parts(amount: Decimal, currency: Currency) -> Money {
        Money { amount, currency }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// 통화가 다른 Money 연산은 호출자 버그다
    fn assert_same_currency(&self, other: &Money) {
        assert_eq!(
            self.currency, other.currency,
            "통화가 다른 Money 연산: {} vs {}",
            self.currency, other.currency
        );
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        self.assert_same_currency(&rhs);
        Money {
            amount: self.amount + rhs.amount,
            currency: self.currency,
        }
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Money) -> Option<Ordering> {
        self.assert_same_currency(other);
        self.amount.partial_cmp(&other.amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

// endregion: --- Money
