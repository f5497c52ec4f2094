// src/services/redis_service.rs
use crate::errors::MockitError;
use crate::session::Session;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

pub const TUTORIAL_KEY: &str = "mockit:has_seen_tutorial";

pub fn session_key(session_id: &Uuid) -> String {
    format!("session:{}", session_id)
}

pub struct RedisService {
    client: Client,
    session_ttl_secs: usize,
}

impl RedisService {
    pub async fn new(redis_url: &str, session_ttl_secs: usize) -> Result<Self, MockitError> {
        let client = Client::open(redis_url).map_err(|e| MockitError::Redis(e.to_string()))?;

        // Test connection
        let mut conn = client
            .get_async_connection()
            .await
            .map_err(|e| MockitError::Redis(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| MockitError::Redis(e.to_string()))?;

        Ok(Self {
            client,
            session_ttl_secs,
        })
    }

    async fn connection(&self) -> Result<redis::aio::Connection, MockitError> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| MockitError::Redis(e.to_string()))
    }

    pub async fn store_session(&self, session: &Session) -> Result<(), MockitError> {
        let mut conn = self.connection().await?;

        let value = serde_json::to_string(session)
            .map_err(|e| MockitError::Serialization(e.to_string()))?;

        conn.set_ex::<_, _, ()>(session_key(&session.id), value, self.session_ttl_secs)
            .await
            .map_err(|e| MockitError::Redis(e.to_string()))?;

        Ok(())
    }

    pub async fn get_session(&self, session_id: &Uuid) -> Result<Session, MockitError> {
        let mut conn = self.connection().await?;

        let value: Option<String> = conn
            .get(session_key(session_id))
            .await
            .map_err(|e| MockitError::Redis(e.to_string()))?;

        let value =
            value.ok_or_else(|| MockitError::NotFound(format!("session {}", session_id)))?;

        serde_json::from_str(&value).map_err(|e| MockitError::Serialization(e.to_string()))
    }

    /// Whether the tutorial has been dismissed before.
    pub async fn tutorial_seen(&self) -> Result<bool, MockitError> {
        let mut conn = self.connection().await?;
        conn.exists(TUTORIAL_KEY)
            .await
            .map_err(|e| MockitError::Redis(e.to_string()))
    }

    pub async fn mark_tutorial_seen(&self) -> Result<(), MockitError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(TUTORIAL_KEY, "true")
            .await
            .map_err(|e| MockitError::Redis(e.to_string()))
    }
}
