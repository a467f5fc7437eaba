/// 경매 저장소 포트
/// 버전 토큰과 함께 로드하고, compare-and-swap 으로 저장한다
/// 같은 버전을 노린 두 커맨드 중 정확히 하나만 커밋된다
// region:    --- Imports
use crate::auction::error::{DomainError, EngineError};
use crate::auction::model::{Auction, AuctionSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;

// endregion: --- Modules

// region:    --- Repo Error

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("경매를 찾을 수 없습니다: {0}")]
    NotFound(i64),
    #[error("버전 충돌: 경매 {0}")]
    VersionConflict(i64),
    #[error("저장소 오류: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> RepoError {
        RepoError::Backend(e.to_string())
    }
}

impl From<RepoError> for EngineError {
    fn from(e: RepoError) -> EngineError {
        match e {
            RepoError::NotFound(id) => EngineError::Domain(DomainError::AuctionNotFound(id)),
            RepoError::VersionConflict(_) => EngineError::Domain(DomainError::VersionConflict),
            RepoError::Backend(msg) => EngineError::Storage(msg),
        }
    }
}

// endregion: --- Repo Error

// region:    --- Repository Trait

/// 버전이 붙은 애그리게잇 로드 결과
pub struct VersionedAuction {
    pub auction: Auction,
    pub version: i64,
}

#[async_trait]
pub trait AuctionRepository: Send + Sync {
    /// 새 경매 저장, 부여된 id 반환 (버전은 1에서 시작)
    async fn insert(&self, snapshot: AuctionSnapshot) -> Result<i64, RepoError>;

    /// id 로 로드, 현재 버전 토큰 포함
    async fn load(&self, auction_id: i64) -> Result<VersionedAuction, RepoError>;

    /// expected_version 에 대한 compare-and-swap 저장, 새 버전 반환
    /// 버전이 어긋나면 VersionConflict — 호출자는 다시 읽고 처음부터 재평가한다
    async fn save(
        &self,
        snapshot: &AuctionSnapshot,
        expected_version: i64,
    ) -> Result<i64, RepoError>;

    /// 시작 시간이 지난 Scheduled 경매 id 목록
    async fn find_due_to_start(&self, now: DateTime<Utc>) -> Result<Vec<i64>, RepoError>;

    /// 종료 시간이 지난 Active 경매 id 목록
    async fn find_due_to_close(&self, now: DateTime<Utc>) -> Result<Vec<i64>, RepoError>;
}

// endregion: --- Repository Trait
