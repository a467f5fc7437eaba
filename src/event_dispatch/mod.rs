/// 도메인 이벤트 발행
/// 애그리게잇이 쌓은 이벤트를 커밋 성공 후 봉투에 싸서 외부(알림, 실시간 푸시, 감사 로그)로 내보낸다
/// 발행 실패는 커밋을 되돌리지 않는다 — 로그만 남긴다
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::message_broker::KafkaProducer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

// endregion: --- Imports

// region:    --- Event Envelope

/// 발행 봉투: 애그리게잇 id, 타입, 페이로드, 커밋 버전
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EventEnvelope {
    pub aggregate_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub version: i64,
}

// endregion: --- Event Envelope

// region:    --- Event Dispatcher Trait

/// 이벤트 발행 트레이트
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        aggregate_id: i64,
        version: i64,
        events: &[AuctionEvent],
        occurred_at: DateTime<Utc>,
    ) -> Result<(), String>;
}

fn envelope(
    aggregate_id: i64,
    version: i64,
    event: &AuctionEvent,
    occurred_at: DateTime<Utc>,
) -> Result<EventEnvelope, String> {
    Ok(EventEnvelope {
        aggregate_id,
        event_type: event.event_type().to_string(),
        data: serde_json::to_value(event).map_err(|e| e.to_string())?,
        timestamp: occurred_at,
        version,
    })
}

// endregion: --- Event Dispatcher Trait

// region:    --- Kafka Dispatcher

pub const AUCTION_EVENTS_TOPIC: &str = "auction-events";

/// 카프카 발행 구현체
pub struct KafkaEventDispatcher {
    producer: Arc<KafkaProducer>,
}

impl KafkaEventDispatcher {
    pub fn new(producer: Arc<KafkaProducer>) -> KafkaEventDispatcher {
        KafkaEventDispatcher { producer }
    }
}

#[async_trait]
impl EventDispatcher for KafkaEventDispatcher {
    async fn dispatch(
        &self,
        aggregate_id: i64,
        version: i64,
        events: &[AuctionEvent],
        occurred_at: DateTime<Utc>,
    ) -> Result<(), String> {
        for event in events {
            let envelope = envelope(aggregate_id, version, event, occurred_at)?;
            info!(
                "{:<12} --> 이벤트 발행: {} (경매 {})",
                "Dispatch", envelope.event_type, aggregate_id
            );
            self.producer
                .send_message(
                    AUCTION_EVENTS_TOPIC,
                    &aggregate_id.to_string(),
                    &serde_json::to_string(&envelope).map_err(|e| e.to_string())?,
                )
                .await?;
        }
        Ok(())
    }
}

// endregion: --- Kafka Dispatcher

// region:    --- Collecting Dispatcher

/// 테스트용: 발행된 봉투를 메모리에 모은다
#[derive(Default)]
pub struct CollectingEventDispatcher {
    envelopes: Mutex<Vec<EventEnvelope>>,
}

impl CollectingEventDispatcher {
    pub fn new() -> CollectingEventDispatcher {
        CollectingEventDispatcher::default()
    }

    pub async fn take(&self) -> Vec<EventEnvelope> {
        std::mem::take(&mut *self.envelopes.lock().await)
    }
}

#[async_trait]
impl EventDispatcher for CollectingEventDispatcher {
    async fn dispatch(
        &self,
        aggregate_id: i64,
        version: i64,
        events: &[AuctionEvent],
        occurred_at: DateTime<Utc>,
    ) -> Result<(), String> {
        let mut sink = self.envelopes.lock().await;
        for event in events {
            sink.push(envelope(aggregate_id, version, event, occurred_at)?);
        }
        Ok(())
    }
}

// endregion: --- Collecting Dispatcher
