/// Postgres 저장소 구현체
/// 저장은 한 트랜잭션 안에서 버전 조건부 UPDATE + 입찰 upsert 로 처리한다
/// 조건에 걸린 행이 없으면 그 버전은 이미 다른 커맨드가 가져간 것이다
// region:    --- Imports
use crate::auction::model::{Auction, AuctionSnapshot};
use crate::bidding::model::{AuctionRow, BidRow};
use crate::repository::{AuctionRepository, RepoError, VersionedAuction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Queries

const AUCTION_COLUMNS: &str = "id, title, description, auction_type, status, vehicle_id, seller_id, \
     currency, starting_price, reserve_price, buy_now_price, current_high_bid, winning_bid_id, \
     winning_bidder_id, start_time, end_time, actual_end_time, is_dealer_only, bid_count, \
     extension_count, anti_sniping_window_secs, anti_sniping_extension_secs, minimum_bid_increment, \
     allow_proxy_bidding, max_extensions, require_deposit, deposit_amount, version, created_at";

const INSERT_AUCTION: &str = "INSERT INTO auctions (title, description, auction_type, status, vehicle_id, seller_id, \
     currency, starting_price, reserve_price, buy_now_price, current_high_bid, winning_bid_id, \
     winning_bidder_id, start_time, end_time, actual_end_time, is_dealer_only, bid_count, \
     extension_count, anti_sniping_window_secs, anti_sniping_extension_secs, minimum_bid_increment, \
     allow_proxy_bidding, max_extensions, require_deposit, deposit_amount, version) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, \
     $20, $21, $22, $23, $24, $25, $26, 1) \
     RETURNING id";

/// 버전 조건부 저장: 전이가 바꿀 수 있는 필드만 갱신한다
const SAVE_AUCTION: &str = "UPDATE auctions SET status = $1, current_high_bid = $2, winning_bid_id = $3, \
     winning_bidder_id = $4, end_time = $5, actual_end_time = $6, bid_count = $7, \
     extension_count = $8, version = version + 1 \
     WHERE id = $9 AND version = $10 \
     RETURNING version";

const UPSERT_BID: &str = "INSERT INTO bids (auction_id, id, bidder_id, amount, status, placed_at, is_proxy_bid, max_proxy_amount) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
     ON CONFLICT (auction_id, id) \
     DO UPDATE SET amount = EXCLUDED.amount, status = EXCLUDED.status";

const GET_DUE_TO_START: &str =
    "SELECT id FROM auctions WHERE status = 'SCHEDULED' AND start_time <= $1 ORDER BY id";

const GET_DUE_TO_CLOSE: &str =
    "SELECT id FROM auctions WHERE status = 'ACTIVE' AND end_time <= $1 ORDER BY id";

// endregion: --- Queries

// region:    --- Postgres Repository

pub struct PostgresAuctionRepository {
    pool: Arc<PgPool>,
}

impl PostgresAuctionRepository {
    pub fn new(pool: Arc<PgPool>) -> PostgresAuctionRepository {
        PostgresAuctionRepository { pool }
    }
}

#[async_trait]
impl AuctionRepository for PostgresAuctionRepository {
    async fn insert(&self, snapshot: AuctionSnapshot) -> Result<i64, RepoError> {
        let id = sqlx::query_scalar::<_, i64>(INSERT_AUCTION)
            .bind(&snapshot.title)
            .bind(&snapshot.description)
            .bind(snapshot.auction_type.as_str())
            .bind(snapshot.status.as_str())
            .bind(snapshot.vehicle_id)
            .bind(snapshot.seller_id)
            .bind(snapshot.starting_price.currency().as_str())
            .bind(snapshot.starting_price.amount())
            .bind(snapshot.reserve_price.map(|m| m.amount()))
            .bind(snapshot.buy_now_price.map(|m| m.amount()))
            .bind(snapshot.current_high_bid.amount())
            .bind(snapshot.winning_bid_id)
            .bind(snapshot.winning_bidder_id)
            .bind(snapshot.start_time)
            .bind(snapshot.end_time)
            .bind(snapshot.actual_end_time)
            .bind(snapshot.is_dealer_only)
            .bind(snapshot.bid_count as i32)
            .bind(snapshot.extension_count as i32)
            .bind(snapshot.settings.anti_sniping_window.num_seconds())
            .bind(snapshot.settings.anti_sniping_extension.num_seconds())
            .bind(snapshot.settings.minimum_bid_increment.amount())
            .bind(snapshot.settings.allow_proxy_bidding)
            .bind(snapshot.settings.max_extensions as i32)
            .bind(snapshot.settings.require_deposit)
            .bind(snapshot.settings.deposit_amount.map(|m| m.amount()))
            .fetch_one(&*self.pool)
            .await?;
        Ok(id)
    }

    async fn load(&self, auction_id: i64) -> Result<VersionedAuction, RepoError> {
        let select_auction = format!("SELECT {AUCTION_COLUMNS} FROM auctions WHERE id = $1");
        let row = sqlx::query_as::<_, AuctionRow>(&select_auction)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or(RepoError::NotFound(auction_id))?;

        let bid_rows = sqlx::query_as::<_, BidRow>(
            "SELECT auction_id, id, bidder_id, amount, status, placed_at, is_proxy_bid, \
             max_proxy_amount FROM bids WHERE auction_id = $1 ORDER BY id",
        )
        .bind(auction_id)
        .fetch_all(&*self.pool)
        .await?;

        let version = row.version;
        let snapshot = row.into_snapshot(bid_rows).map_err(RepoError::Backend)?;
        Ok(VersionedAuction {
            auction: Auction::restore(snapshot),
            version,
        })
    }

    async fn save(
        &self,
        snapshot: &AuctionSnapshot,
        expected_version: i64,
    ) -> Result<i64, RepoError> {
        let mut tx = self.pool.begin().await?;

        let new_version = sqlx::query_scalar::<_, i64>(SAVE_AUCTION)
            .bind(snapshot.status.as_str())
            .bind(snapshot.current_high_bid.amount())
            .bind(snapshot.winning_bid_id)
            .bind(snapshot.winning_bidder_id)
            .bind(snapshot.end_time)
            .bind(snapshot.actual_end_time)
            .bind(snapshot.bid_count as i32)
            .bind(snapshot.extension_count as i32)
            .bind(snapshot.id)
            .bind(expected_version)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepoError::VersionConflict(snapshot.id))?;

        for bid in &snapshot.bids {
            sqlx::query(UPSERT_BID)
                .bind(bid.auction_id)
                .bind(bid.id)
                .bind(bid.bidder_id)
                .bind(bid.amount.amount())
                .bind(bid.status.as_str())
                .bind(bid.placed_at)
                .bind(bid.is_proxy_bid)
                .bind(bid.max_proxy_amount.map(|m| m.amount()))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(new_version)
    }

    async fn find_due_to_start(&self, now: DateTime<Utc>) -> Result<Vec<i64>, RepoError> {
        let ids = sqlx::query_scalar::<_, i64>(GET_DUE_TO_START)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?;
        Ok(ids)
    }

    async fn find_due_to_close(&self, now: DateTime<Utc>) -> Result<Vec<i64>, RepoError> {
        let ids = sqlx::query_scalar::<_, i64>(GET_DUE_TO_CLOSE)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?;
        Ok(ids)
    }
}

// endregion: --- Postgres Repository
