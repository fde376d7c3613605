//! [`HttpConnector`] reads punches from an iClock-style JSON transactions
//! API.
//!
//! The session authenticates with `POST /api-token-auth/` when credentials
//! are configured, then walks `GET /iclock/api/transactions/` following the
//! `next` links until the log is exhausted.

use std::time::Duration;

use punchcard_core::{clock::parse_timestamp, punch::RawPunch};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
  device::{DeviceConfig, DeviceConnector, DeviceSession},
  error::DeviceError,
};

/// Guard against a server whose `next` links never end.
const MAX_PAGES: usize = 1000;

const PAGE_SIZE: u32 = 500;

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TokenRequest<'a> {
  username: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
  #[serde(default)]
  token: Option<String>,
}

#[derive(Deserialize)]
struct TransactionPage {
  #[serde(default)]
  next: Option<String>,
  #[serde(default)]
  data: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct Transaction {
  id:          u32,
  emp_code:    String,
  punch_time:  String,
  #[serde(default)]
  punch_state: String,
  #[serde(default)]
  verify_type: i32,
}

impl Transaction {
  fn into_raw(self) -> Result<RawPunch, DeviceError> {
    let timestamp = parse_timestamp(&self.punch_time)
      .map_err(|e| DeviceError::Protocol(format!("transaction {}: {e}", self.id)))?;
    Ok(RawPunch {
      uid: self.id,
      user_id: self.emp_code,
      timestamp,
      status_code: self.verify_type,
      // Non-numeric states map to an unknown subtype.
      punch_subtype: self.punch_state.trim().parse().unwrap_or(u8::MAX),
    })
  }
}

// ─── Connector ───────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone, Default)]
pub struct HttpConnector {
  client: Client,
}

impl HttpConnector {
  pub fn new() -> Result<Self, DeviceError> {
    let client = Client::builder().build()?;
    Ok(Self { client })
  }
}

pub struct HttpSession {
  client:  Client,
  base:    String,
  label:   String,
  token:   Option<String>,
  timeout: Duration,
}

fn transport_error(label: &str, e: reqwest::Error) -> DeviceError {
  if e.is_connect() || e.is_timeout() {
    DeviceError::Unreachable(label.to_owned(), e.to_string())
  } else {
    DeviceError::Http(e)
  }
}

impl DeviceConnector for HttpConnector {
  type Session = HttpSession;

  async fn connect(&self, device: &DeviceConfig) -> Result<HttpSession, DeviceError> {
    let base = format!("http://{}:{}", device.ip, device.port);
    let label = device.label();
    let timeout = device.timeout();

    let token = match (&device.username, &device.password) {
      (Some(username), Some(password)) => {
        let resp = self
          .client
          .post(format!("{base}/api-token-auth/"))
          .timeout(timeout)
          .json(&TokenRequest { username, password })
          .send()
          .await
          .map_err(|e| transport_error(&label, e))?;
        if !resp.status().is_success() {
          return Err(DeviceError::Protocol(format!(
            "{label}: token auth → {}",
            resp.status()
          )));
        }
        let body: TokenResponse = resp.json().await?;
        Some(body.token.ok_or_else(|| {
          DeviceError::Protocol(format!("{label}: token auth returned no token"))
        })?)
      }
      _ => None,
    };

    debug!(device = %label, authenticated = token.is_some(), "device session opened");
    Ok(HttpSession {
      client: self.client.clone(),
      base,
      label,
      token,
      timeout,
    })
  }
}

impl HttpSession {
  async fn page(&self, url: &str) -> Result<TransactionPage, DeviceError> {
    let mut req = self.client.get(url).timeout(self.timeout);
    if let Some(token) = &self.token {
      req = req.header(reqwest::header::AUTHORIZATION, format!("Token {token}"));
    }
    let resp = req.send().await.map_err(|e| transport_error(&self.label, e))?;
    if !resp.status().is_success() {
      return Err(DeviceError::Protocol(format!(
        "{}: GET transactions → {}",
        self.label,
        resp.status()
      )));
    }
    Ok(resp.json().await?)
  }
}

impl DeviceSession for HttpSession {
  async fn get_punches(&mut self) -> Result<Vec<RawPunch>, DeviceError> {
    let mut punches = Vec::new();
    let mut url = Some(format!(
      "{}/iclock/api/transactions/?page_size={PAGE_SIZE}",
      self.base
    ));

    for _ in 0..MAX_PAGES {
      let Some(current) = url.take() else { break };
      let page = self.page(&current).await?;
      for tx in page.data {
        match tx.into_raw() {
          Ok(raw) => punches.push(raw),
          Err(e) => warn!(device = %self.label, error = %e, "skipping transaction"),
        }
      }
      url = page.next;
    }
    if url.is_some() {
      warn!(device = %self.label, pages = MAX_PAGES, "transaction log truncated");
    }
    Ok(punches)
  }

  async fn disconnect(self) {
    debug!(device = %self.label, "device session closed");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transaction_page_maps_to_raw_punches() {
    let page: TransactionPage = serde_json::from_str(
      r#"{
        "count": 2,
        "next": "http://10.0.0.5:80/iclock/api/transactions/?page=2",
        "previous": null,
        "data": [
          {"id": 11, "emp_code": "1007", "punch_time": "2025-01-10 09:00:07",
           "punch_state": "0", "verify_type": 1, "terminal_sn": "A1"},
          {"id": 12, "emp_code": "1007", "punch_time": "2025-01-10 18:02:00",
           "punch_state": "x", "verify_type": 15}
        ]
      }"#,
    )
    .unwrap();
    assert!(page.next.is_some());

    let raws: Vec<RawPunch> = page
      .data
      .into_iter()
      .map(|t| t.into_raw().unwrap())
      .collect();
    assert_eq!(raws[0].uid, 11);
    assert_eq!(raws[0].user_id, "1007");
    assert_eq!(raws[0].punch_subtype, 0);
    assert_eq!(raws[1].status_code, 15);
    assert_eq!(raws[1].punch_subtype, u8::MAX);
  }

  #[test]
  fn bad_punch_time_is_a_protocol_error() {
    let tx = Transaction {
      id:          1,
      emp_code:    "1".into(),
      punch_time:  "yesterday".into(),
      punch_state: "0".into(),
      verify_type: 0,
    };
    assert!(matches!(tx.into_raw(), Err(DeviceError::Protocol(_))));
  }
}
