//! Signed session marker encoding

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::UserRole;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::{PersistenceMode, SessionMarker};

/// JWT claims for a session marker
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (marker ID)
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    pub mode: PersistenceMode,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Turns markers into opaque signed tokens and back
#[derive(Clone)]
pub struct MarkerCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    durable_ttl: Duration,
    ephemeral_ttl: Duration,
}

impl MarkerCodec {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            durable_ttl: config.durable_ttl(),
            ephemeral_ttl: config.ephemeral_ttl(),
        }
    }

    /// Maximum lifetime of a marker issued in `mode`
    pub fn ttl(&self, mode: PersistenceMode) -> Duration {
        match mode {
            PersistenceMode::Durable => self.durable_ttl,
            PersistenceMode::Ephemeral => self.ephemeral_ttl,
        }
    }

    pub fn claims(&self, marker: &SessionMarker) -> Claims {
        let iat = marker.issued_at.timestamp();
        Claims {
            sub: marker.id.clone(),
            username: marker.username.clone(),
            role: marker.role,
            mode: marker.mode,
            iat,
            exp: iat + self.ttl(marker.mode).num_seconds(),
        }
    }

    pub fn encode(&self, marker: &SessionMarker) -> Result<String> {
        Ok(encode(&Header::default(), &self.claims(marker), &self.encoding)?)
    }

    /// Verify signature and expiry, then rebuild the marker
    pub fn decode(&self, token: &str) -> Result<SessionMarker> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())?.claims;
        let issued_at = DateTime::<Utc>::from_timestamp(claims.iat, 0)
            .ok_or_else(|| Error::Other(format!("invalid issue time {}", claims.iat)))?;

        Ok(SessionMarker {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
            mode: claims.mode,
            issued_at,
        })
    }
}
