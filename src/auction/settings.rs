/// 경매 정책 묶음
/// 경매 생성 시점에 확정되며 이후 변경되지 않는다
// region:    --- Imports
use crate::auction::error::DomainError;
use crate::auction::money::{Currency, Money};
use chrono::Duration;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Auction Settings

/// 경매 정책: 스나이핑 방지 창/연장, 최소 입찰 증가액, 프록시 허용, 보증금 규칙
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuctionSettings {
    #[serde(with = "duration_secs")]
    pub anti_sniping_window: Duration,
    #[serde(with = "duration_secs")]
    pub anti_sniping_extension: Duration,
    pub minimum_bid_increment: Money,
    pub allow_proxy_bidding: bool,
    pub max_extensions: u32,
    pub require_deposit: bool,
    pub deposit_amount: Option<Money>,
}

impl AuctionSettings {
    /// 기본 정책: 2분 창, 5분 연장, 증가액 100, 최대 3회 연장
    pub fn default_for(currency: Currency) -> AuctionSettings {
        AuctionSettings {
            anti_sniping_window: Duration::minutes(2),
            anti_sniping_extension: Duration::minutes(5),
            minimum_bid_increment: Money::from_parts(dec!(100), currency),
            allow_proxy_bidding: true,
            max_extensions: 3,
            require_deposit: false,
            deposit_amount: None,
        }
    }

    /// 생성 시점 검증: 음수 기간, 0 이하 증가액, 통화 불일치, 보증금 누락을 거부
    pub fn validate(&self, currency: Currency) -> Result<(), DomainError> {
        if self.anti_sniping_window < Duration::zero() || self.anti_sniping_extension < Duration::zero() {
            return Err(DomainError::InvalidSettings("스나이핑 방지 기간은 음수일 수 없습니다"));
        }
        if self.minimum_bid_increment.currency() != currency {
            return Err(DomainError::CurrencyMismatch {
                expected: currency,
                actual: self.minimum_bid_increment.currency(),
            });
        }
        if self.minimum_bid_increment.is_zero() {
            return Err(DomainError::InvalidSettings("최소 입찰 증가액은 0보다 커야 합니다"));
        }
        match (self.require_deposit, &self.deposit_amount) {
            (true, None) => {
                return Err(DomainError::InvalidSettings("보증금 필수 경매에는 보증금 금액이 필요합니다"))
            }
            (_, Some(deposit)) if deposit.currency() != currency => {
                return Err(DomainError::CurrencyMismatch {
                    expected: currency,
                    actual: deposit.currency(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

// endregion: --- Auction Settings

// region:    --- Serde Helpers

/// chrono::Duration 을 초 단위 정수로 직렬화
mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(secs))
    }
}

// endregion: --- Serde Helpers
