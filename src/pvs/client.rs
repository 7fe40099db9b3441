//! HTTPS client for the PVS varserver API.

use crate::collector::traits::SnapshotSource;
use crate::config::PvsConfig;
use crate::error::{AuthError, PvsError, Result};
use crate::pvs::snapshot::Snapshot;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

/// Variable holding the supervisor's serial number.
pub const SERIAL_VAR: &str = "/sys/info/serialnum";

/// Account name used for the local owner login.
pub const LOGIN_USER: &str = "ssm_owner";

/// Password segment used when no usable serial number is known.
pub const FALLBACK_PASSWORD: &str = "F1084";

/// State established by a successful login.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Serial number the credential was derived from
    pub serial: Option<String>,
    /// Base64 credential sent to the login endpoint
    pub credential: Option<String>,
    /// Token returned in the `session` field of the login response
    pub token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct VarsResponse {
    #[serde(default)]
    values: Vec<VarEntry>,
}

#[derive(Debug, Deserialize)]
struct VarEntry {
    #[serde(default)]
    value: Value,
}

/// Build the basic-auth credential from a serial number.
///
/// The password is the last five characters of the serial; shorter or absent
/// serials fall back to [`FALLBACK_PASSWORD`].
pub fn derive_credential(serial: Option<&str>) -> String {
    let password = serial
        .and_then(|serial| {
            let count = serial.chars().count();
            (count >= 5).then(|| serial.chars().skip(count - 5).collect::<String>())
        })
        .unwrap_or_else(|| FALLBACK_PASSWORD.to_string());

    STANDARD.encode(format!("{LOGIN_USER}:{password}"))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Client for one PVS supervisor.
pub struct PvsClient {
    config: PvsConfig,
    http: reqwest::Client,
    session: Session,
}

impl PvsClient {
    /// Create a client. The device uses a self-signed certificate, so
    /// certificate validation is turned off for this client only. Cookies set
    /// by the device are kept for the life of the client.
    pub fn new(config: PvsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .cookie_store(true)
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .build()
            .map_err(|e| PvsError::config_error(format!("failed to build PVS client: {e}")))?;

        Ok(Self {
            config,
            http,
            session: Session::default(),
        })
    }

    pub fn config(&self) -> &PvsConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the serial lookup and login handshake, replacing any earlier session.
    pub async fn login(&mut self) -> std::result::Result<(), AuthError> {
        self.session = Session::default();

        let serial = match self.read_serial().await? {
            Some(serial) => {
                info!("PVS serial: {}", serial);
                serial
            }
            None => match &self.config.default_serial {
                Some(default) => {
                    info!("Using default serial number: {}", default);
                    default.clone()
                }
                None => {
                    error!("No serial number found and no default serial provided");
                    return Err(AuthError::NoSerial);
                }
            },
        };

        let serial = Some(serial).filter(|serial| !serial.is_empty());
        let credential = derive_credential(serial.as_deref());
        let url = format!("{}/auth?login", self.config.base_url());
        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("basic {credential}"))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Authentication failed with status: {}", status.as_u16());
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let token = match body.get("session").and_then(value_to_string) {
            Some(token) => token,
            None => {
                error!("No session token in auth response: {}", body);
                return Err(AuthError::MissingSession);
            }
        };

        self.session = Session {
            serial,
            credential: Some(credential),
            token: Some(token),
        };
        info!("Successfully authenticated with PVS");
        Ok(())
    }

    /// Read the serial number variable. `Ok(None)` means the device did not
    /// report one, either through an error status or an empty `values` list.
    /// A reported but blank value comes back as `Some("")`. Transport failures
    /// are errors.
    async fn read_serial(&self) -> std::result::Result<Option<String>, AuthError> {
        let url = format!("{}/vars?name={}", self.config.base_url(), SERIAL_VAR);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            warn!("Failed to get serial number: {}", response.status().as_u16());
            return Ok(None);
        }

        let body: VarsResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let serial = body
            .values
            .first()
            .map(|entry| value_to_string(&entry.value).unwrap_or_default());

        if serial.is_none() {
            warn!("No serial number found in response");
        }
        Ok(serial)
    }

    /// Fetch every variable on the device in one request.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let url = format!("{}/vars?match=/&fmt=obj", self.config.base_url());
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PvsError::fetch_error(format!("request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PvsError::fetch_error(format!(
                "device returned status {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PvsError::fetch_error(format!("invalid JSON body: {e}")))?;
        let snapshot = Snapshot::from_json(body)?;

        info!("Retrieved {} variables from PVS", snapshot.len());
        Ok(snapshot)
    }
}

impl SnapshotSource for PvsClient {
    async fn authenticate(&mut self) -> Result<()> {
        self.login().await.map_err(PvsError::from)
    }

    async fn fetch_all(&mut self) -> Result<Snapshot> {
        self.fetch_snapshot().await
    }
}
