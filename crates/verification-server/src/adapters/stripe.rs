//! # Identity Provider Adapter
//!
//! `IdentityProvider` over a Stripe-Identity-compatible REST API.
//!
//! - Requests are form encoded and authenticated with a bearer key
//! - Sessions always demand a passport with live capture and a matching selfie
//! - Reports are read with the restricted key, expanding the document fields
//!   that are not returned by default

use crate::container::config::ProviderConfig;
use async_trait::async_trait;
use pp_02_verification::{
    CreateSessionParams, IdentityProvider, ProviderDate, ProviderError, ProviderSession,
    ReportDocument, VerificationReport,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared_types::VerificationStatus;
use tracing::{debug, warn};

const SESSIONS_PATH: &str = "/v1/identity/verification_sessions";
const REPORTS_PATH: &str = "/v1/identity/verification_reports";

/// Report fields requested on top of the default representation.
const REPORT_EXPANSIONS: [&str; 3] = [
    "document.expiration_date",
    "document.number",
    "document.dob",
];

/// HTTP client for the identity provider.
pub struct StripeIdentityProvider {
    client: Client,
    base_url: String,
    secret_key: String,
    restricted_key: String,
}

impl StripeIdentityProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.expose().to_string(),
            restricted_key: config.restricted_key.expose().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ProviderError::Decode(e.to_string()));
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| status.to_string());

        warn!(status = status.as_u16(), %message, "[provider] Request rejected");
        if status == StatusCode::NOT_FOUND {
            Err(ProviderError::NotFound(message))
        } else {
            Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl IdentityProvider for StripeIdentityProvider {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<ProviderSession, ProviderError> {
        let mut form = vec![
            ("type", "document".to_string()),
            ("metadata[account]", params.account.to_hex()),
            ("options[document][allowed_types][]", "passport".to_string()),
            ("options[document][require_live_capture]", "true".to_string()),
            ("options[document][require_matching_selfie]", "true".to_string()),
        ];
        if let Some(return_url) = params.return_url {
            form.push(("return_url", return_url));
        }

        let request = self
            .client
            .post(self.url(SESSIONS_PATH))
            .bearer_auth(&self.secret_key)
            .form(&form);
        let session: SessionObject = self.send(request).await?;

        debug!(session = %session.id, account = %params.account, "[provider] Session created");
        session.into_domain()
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, ProviderError> {
        let request = self
            .client
            .get(self.url(&format!("{}/{}", SESSIONS_PATH, session_id)))
            .bearer_auth(&self.secret_key);
        let session: SessionObject = self.send(request).await?;
        session.into_domain()
    }

    async fn retrieve_report(&self, report_id: &str) -> Result<VerificationReport, ProviderError> {
        let expand: Vec<(&str, &str)> = REPORT_EXPANSIONS
            .iter()
            .map(|field| ("expand[]", *field))
            .collect();

        let request = self
            .client
            .get(self.url(&format!("{}/{}", REPORTS_PATH, report_id)))
            .bearer_auth(&self.restricted_key)
            .query(&expand);
        let report: ReportObject = self.send(request).await?;
        report.into_domain()
    }

    async fn redact_session(&self, session_id: &str) -> Result<(), ProviderError> {
        let request = self
            .client
            .post(self.url(&format!("{}/{}/redact", SESSIONS_PATH, session_id)))
            .bearer_auth(&self.secret_key);
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct SessionObject {
    id: String,
    status: String,
    url: Option<String>,
    last_verification_report: Option<String>,
}

impl SessionObject {
    fn into_domain(self) -> Result<ProviderSession, ProviderError> {
        let status: VerificationStatus = self
            .status
            .parse()
            .map_err(|e: shared_types::TypeError| ProviderError::Decode(e.to_string()))?;
        Ok(ProviderSession {
            id: self.id,
            status,
            url: self.url,
            last_verification_report: self.last_verification_report,
        })
    }
}

/// Provider dates carry nullable parts.
#[derive(Deserialize)]
struct DateObject {
    day: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
}

impl DateObject {
    fn into_domain(self, field: &str) -> Result<ProviderDate, ProviderError> {
        match (self.year, self.month, self.day) {
            (Some(year), Some(month), Some(day)) => Ok(ProviderDate { year, month, day }),
            _ => Err(ProviderError::Decode(format!("incomplete {}", field))),
        }
    }
}

#[derive(Deserialize)]
struct DocumentObject {
    issuing_country: Option<String>,
    number: Option<String>,
    expiration_date: Option<DateObject>,
    dob: Option<DateObject>,
}

#[derive(Deserialize)]
struct ReportObject {
    id: String,
    document: Option<DocumentObject>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ProviderError> {
    value.ok_or_else(|| ProviderError::Decode(format!("report missing {}", field)))
}

impl ReportObject {
    fn into_domain(self) -> Result<VerificationReport, ProviderError> {
        let doc = required(self.document, "document")?;
        Ok(VerificationReport {
            id: self.id,
            document: ReportDocument {
                issuing_country: required(doc.issuing_country, "document.issuing_country")?,
                number: required(doc.number, "document.number")?,
                expiration_date: required(doc.expiration_date, "document.expiration_date")?
                    .into_domain("document.expiration_date")?,
                dob: required(doc.dob, "document.dob")?.into_domain("document.dob")?,
            },
        })
    }
}
