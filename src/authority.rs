//! Client seam for the authority service.
//!
//! The coordinator talks to the authority through the [`Authority`] trait so
//! tests can swap in an in-process double. [`HttpAuthority`] is the real
//! client; every call uses a short bounded timeout and degrades to
//! [`AuthorityStatus::Unavailable`] instead of blocking, except for key
//! rejections which surface as [`Error::InvalidKey`].

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::protocol::{self, QueryReply, Report};
use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What the authority knows about the slot, as seen from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorityStatus {
    Occupied(String),
    Vacant,
    /// The authority could not be reached or answered garbage. Callers fall
    /// back to the replica store.
    Unavailable,
}

#[async_trait]
pub trait Authority: Send + Sync + std::fmt::Debug {
    async fn query(&self) -> Result<AuthorityStatus>;
    async fn acquire(&self, identity: &str) -> Result<()>;
    async fn release(&self) -> Result<()>;
}

#[derive(Debug)]
pub struct HttpAuthority {
    http: reqwest::Client,
    url: String,
    key: String,
    warned: AtomicBool,
}

impl HttpAuthority {
    pub fn new(url: &str, key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            warned: AtomicBool::new(false),
        })
    }

    // Unreachability is expected during degraded operation; one warning is
    // enough, repeats drop to debug.
    fn note_unavailable(&self, cause: impl Display) -> AuthorityStatus {
        if self.warned.swap(true, Ordering::Relaxed) {
            debug!("Authority still unavailable: {}", cause);
        } else {
            warn!("Authority unavailable, falling back to replica store: {}", cause);
        }
        AuthorityStatus::Unavailable
    }
}

#[async_trait]
impl Authority for HttpAuthority {
    async fn query(&self) -> Result<AuthorityStatus> {
        let response = match self
            .http
            .get(&self.url)
            .query(&[("key", &self.key)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(self.note_unavailable(e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Ok(self.note_unavailable(e)),
        };
        if status == StatusCode::SERVICE_UNAVAILABLE && body == protocol::INVALID_KEY {
            return Err(Error::InvalidKey);
        }
        if !status.is_success() {
            return Ok(self.note_unavailable(format!("{status}: {body}")));
        }

        match serde_json::from_str::<QueryReply>(&body) {
            Ok(QueryReply {
                online: true,
                ip: Some(identity),
            }) => Ok(AuthorityStatus::Occupied(identity)),
            Ok(QueryReply { online: false, .. }) => Ok(AuthorityStatus::Vacant),
            Ok(QueryReply { online: true, ip: None }) => {
                Ok(self.note_unavailable("online reply without an identity"))
            }
            Err(e) => Ok(self.note_unavailable(e)),
        }
    }

    async fn acquire(&self, identity: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .form(&Report::started(&self.key, identity))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await?;
        if body == protocol::INVALID_KEY {
            return Err(Error::InvalidKey);
        }
        if let Some(holder) = protocol::parse_already_running(&body) {
            return Err(Error::AlreadyRunning {
                holder: holder.to_string(),
            });
        }
        Err(Error::Protocol { reason: body })
    }

    async fn release(&self) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .form(&Report::stopped(&self.key))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await?;
        if body == protocol::INVALID_KEY {
            return Err(Error::InvalidKey);
        }
        Err(Error::Protocol { reason: body })
    }
}
