/// 인메모리 저장소: 테스트와 워커 검증용
// region:    --- Imports
use crate::auction::model::{Auction, AuctionSnapshot, AuctionStatus};
use crate::repository::{AuctionRepository, RepoError, VersionedAuction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

// endregion: --- Imports

// region:    --- In-Memory Repository

#[derive(Default)]
pub struct InMemoryAuctionRepository {
    inner: Mutex<Store>,
}

#[derive(Default)]
struct Store {
    next_id: i64,
    auctions: HashMap<i64, (AuctionSnapshot, i64)>,
}

impl InMemoryAuctionRepository {
    pub fn new() -> InMemoryAuctionRepository {
        InMemoryAuctionRepository::default()
    }

    /// 현재 버전 조회 (테스트 검증용)
    pub fn version_of(&self, auction_id: i64) -> Option<i64> {
        self.inner
            .lock()
            .expect("repository lock")
            .auctions
            .get(&auction_id)
            .map(|(_, version)| *version)
    }
}

#[async_trait]
impl AuctionRepository for InMemoryAuctionRepository {
    async fn insert(&self, snapshot: AuctionSnapshot) -> Result<i64, RepoError> {
        let mut store = self.inner.lock().expect("repository lock");
        store.next_id += 1;
        let id = store.next_id;
        let mut snapshot = snapshot;
        snapshot.id = id;
        store.auctions.insert(id, (snapshot, 1));
        Ok(id)
    }

    async fn load(&self, auction_id: i64) -> Result<VersionedAuction, RepoError> {
        let store = self.inner.lock().expect("repository lock");
        let (snapshot, version) = store
            .auctions
            .get(&auction_id)
            .ok_or(RepoError::NotFound(auction_id))?;
        Ok(VersionedAuction {
            auction: Auction::restore(snapshot.clone()),
            version: *version,
        })
    }

    async fn save(
        &self,
        snapshot: &AuctionSnapshot,
        expected_version: i64,
    ) -> Result<i64, RepoError> {
        let mut store = self.inner.lock().expect("repository lock");
        let entry = store
            .auctions
            .get_mut(&snapshot.id)
            .ok_or(RepoError::NotFound(snapshot.id))?;
        if entry.1 != expected_version {
            return Err(RepoError::VersionConflict(snapshot.id));
        }
        entry.0 = snapshot.clone();
        entry.1 += 1;
        Ok(entry.1)
    }

    async fn find_due_to_start(&self, now: DateTime<Utc>) -> Result<Vec<i64>, RepoError> {
        let store = self.inner.lock().expect("repository lock");
        let mut due: Vec<i64> = store
            .auctions
            .values()
            .filter(|(s, _)| s.status == AuctionStatus::Scheduled && s.start_time <= now)
            .map(|(s, _)| s.id)
            .collect();
        due.sort_unstable();
        Ok(due)
    }

    async fn find_due_to_close(&self, now: DateTime<Utc>) -> Result<Vec<i64>, RepoError> {
        let store = self.inner.lock().expect("repository lock");
        let mut due: Vec<i64> = store
            .auctions
            .values()
            .filter(|(s, _)| s.status == AuctionStatus::Active && s.end_time <= now)
            .map(|(s, _)| s.id)
            .collect();
        due.sort_unstable();
        Ok(due)
    }
}

// endregion: --- In-Memory Repository
