//! Outbound email: sponsor-outreach and notification messages via a
//! Resend-style HTTP API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email API returned status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
}

/// Email-sending client.
pub struct EmailClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

impl EmailClient {
    /// Creates a client against the production API.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, from: &str, timeout_secs: u64) -> Result<Self, EmailError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, from, timeout_secs)
    }

    /// Creates a client against an explicit base URL (mock servers in tests).
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        from: &str,
        timeout_secs: u64,
    ) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            from: from.to_owned(),
        })
    }

    /// Sends one HTML email; returns the provider's message id when given.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] on transport failure or a non-2xx status.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<Option<String>, EmailError> {
        let request = SendRequest {
            from: &self.from,
            to: [to],
            subject,
            html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body: SendResponse = response.json().await?;
        tracing::info!(to, subject, message_id = ?body.id, "email sent");
        Ok(body.id)
    }
}

/// Content for one sponsor-outreach email.
#[derive(Debug, Clone, Default)]
pub struct SponsorOutreach<'a> {
    pub influencer_name: &'a str,
    pub company_name: &'a str,
    pub product_name: &'a str,
    pub custom_message: Option<&'a str>,
    pub suggested_pricing: Option<&'a str>,
}

/// Renders the sponsor-outreach subject and HTML body.
#[must_use]
pub fn render_sponsor_outreach(outreach: &SponsorOutreach<'_>) -> (String, String) {
    let subject = format!(
        "Partnership opportunity with {} — {}",
        outreach.company_name, outreach.product_name
    );

    let mut body = format!(
        "<html><body>\
         <p>Hi {influencer},</p>\
         <p>We're {company}, and we think your channel would be a great fit to feature \
         <strong>{product}</strong> with your audience.</p>",
        influencer = outreach.influencer_name,
        company = outreach.company_name,
        product = outreach.product_name,
    );
    if let Some(message) = outreach.custom_message {
        body.push_str(&format!("<p>{message}</p>"));
    }
    if let Some(pricing) = outreach.suggested_pricing {
        body.push_str(&format!(
            "<p>We'd propose a partnership in the range of <strong>{pricing}</strong>.</p>"
        ));
    }
    body.push_str(
        "<p>If you're interested, just reply to this email and we can work out the \
         details.</p><p>Best,<br>The partnerships team</p></body></html>",
    );

    (subject, body)
}

/// Renders a short operational notification.
#[must_use]
pub fn render_notification(subject: &str, message: &str) -> (String, String) {
    let body = format!(
        "<html><body><h3>{subject}</h3><p>{message}</p></body></html>"
    );
    (subject.to_owned(), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn send_posts_bearer_authed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({
                "from": "outreach@dreamwell.example",
                "to": ["creator@example.com"],
                "subject": "hello"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg-1"})),
            )
            .mount(&server)
            .await;

        let client = EmailClient::with_base_url(
            &server.uri(),
            "re_test",
            "outreach@dreamwell.example",
            5,
        )
        .expect("client");
        let id = client
            .send("creator@example.com", "hello", "<p>hi</p>")
            .await
            .expect("send");
        assert_eq!(id.as_deref(), Some("msg-1"));
    }

    #[tokio::test]
    async fn non_2xx_is_a_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad address"))
            .mount(&server)
            .await;

        let client =
            EmailClient::with_base_url(&server.uri(), "re_test", "outreach@x.example", 5)
                .expect("client");
        let err = client
            .send("nope", "subject", "<p>hi</p>")
            .await
            .expect_err("422 must fail");
        assert!(matches!(
            err,
            EmailError::UnexpectedStatus { status: 422, .. }
        ));
    }

    #[test]
    fn sponsor_outreach_includes_optional_sections() {
        let (subject, body) = render_sponsor_outreach(&SponsorOutreach {
            influencer_name: "Ana",
            company_name: "Acme Fitness",
            product_name: "Iron Kettlebell",
            custom_message: Some("Loved your garage gym series."),
            suggested_pricing: Some("$300–$450"),
        });
        assert!(subject.contains("Acme Fitness"));
        assert!(body.contains("Loved your garage gym series."));
        assert!(body.contains("$300–$450"));
    }

    #[test]
    fn sponsor_outreach_omits_absent_sections() {
        let (_, body) = render_sponsor_outreach(&SponsorOutreach {
            influencer_name: "Ana",
            company_name: "Acme",
            product_name: "Bands",
            ..SponsorOutreach::default()
        });
        assert!(!body.contains("partnership in the range"));
    }
}
