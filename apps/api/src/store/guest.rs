//! Guest usage counters: how many free messages an unauthenticated device
//! has sent. The only container with write-through persistence — counters
//! survive restarts so the guest gate cannot be reset by reloading.

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    Json,
};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

/// Free messages before the sign-up gate closes.
pub const GUEST_MESSAGE_LIMIT: u32 = 10;

#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Increments and returns the device's counter.
    async fn record_message(&self, device_id: &str) -> anyhow::Result<u32>;

    /// Returns the device's counter without incrementing.
    async fn usage(&self, device_id: &str) -> anyhow::Result<u32>;
}

fn usage_key(device_id: &str) -> String {
    format!("guest:usage:{device_id}")
}

pub struct RedisUsageStore {
    client: redis::Client,
}

impl RedisUsageStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageStore for RedisUsageStore {
    async fn record_message(&self, device_id: &str) -> anyhow::Result<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let count: u32 = conn.incr(usage_key(device_id), 1u32).await?;
        Ok(count)
    }

    async fn usage(&self, device_id: &str) -> anyhow::Result<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let count: Option<u32> = conn.get(usage_key(device_id)).await?;
        Ok(count.unwrap_or(0))
    }
}

/// In-memory double for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryUsageStore {
    counts: std::sync::Mutex<std::collections::HashMap<String, u32>>,
}

#[cfg(test)]
#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn record_message(&self, device_id: &str) -> anyhow::Result<u32> {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let count = counts.entry(device_id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn usage(&self, device_id: &str) -> anyhow::Result<u32> {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        Ok(counts.get(device_id).copied().unwrap_or(0))
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordUsageRequest {
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct GuestUsageResponse {
    pub count: u32,
    pub limit: u32,
    pub limit_reached: bool,
}

impl GuestUsageResponse {
    fn from_count(count: u32) -> Self {
        Self {
            count,
            limit: GUEST_MESSAGE_LIMIT,
            limit_reached: count >= GUEST_MESSAGE_LIMIT,
        }
    }
}

/// GET /api/v1/guest/usage?device_id=… — public.
pub async fn get_guest_usage(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<GuestUsageResponse>, AppError> {
    if query.device_id.trim().is_empty() {
        return Err(AppError::Validation("device_id is required".to_string()));
    }

    let count = state.guest_usage.usage(&query.device_id).await?;
    Ok(Json(GuestUsageResponse::from_count(count)))
}

/// POST /api/v1/guest/usage — public; called once per guest message.
pub async fn record_guest_usage(
    State(state): State<AppState>,
    Json(req): Json<RecordUsageRequest>,
) -> Result<Json<GuestUsageResponse>, AppError> {
    if req.device_id.trim().is_empty() {
        return Err(AppError::Validation("device_id is required".to_string()));
    }

    let count = state.guest_usage.record_message(&req.device_id).await?;
    Ok(Json(GuestUsageResponse::from_count(count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_start_at_zero_and_increment_per_device() {
        let store = MemoryUsageStore::default();
        assert_eq!(store.usage("device-a").await.unwrap(), 0);

        store.record_message("device-a").await.unwrap();
        store.record_message("device-a").await.unwrap();
        store.record_message("device-b").await.unwrap();

        assert_eq!(store.usage("device-a").await.unwrap(), 2);
        assert_eq!(store.usage("device-b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn limit_is_reached_at_ten_messages() {
        let store = MemoryUsageStore::default();
        let mut last = 0;
        for _ in 0..GUEST_MESSAGE_LIMIT {
            last = store.record_message("device-a").await.unwrap();
        }
        let response = GuestUsageResponse::from_count(last);
        assert!(response.limit_reached);

        let below = GuestUsageResponse::from_count(GUEST_MESSAGE_LIMIT - 1);
        assert!(!below.limit_reached);
    }

    #[test]
    fn usage_keys_are_namespaced_per_device() {
        assert_eq!(usage_key("abc"), "guest:usage:abc");
    }
}
