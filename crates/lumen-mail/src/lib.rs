//! Outbound email for the verification-code flow, delivered through an HTTP
//! mail API (Resend-compatible JSON POST). Failures always propagate to the
//! caller; a send-code request must not claim success when no mail went out.

use std::time::Duration;

use serde::Serialize;
use tracing::info;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail API key not configured")]
    NotConfigured,
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

pub struct Mailer {
    endpoint: String,
    api_key: String,
    from: String,
    http: reqwest::Client,
}

impl Mailer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
            http,
        })
    }

    /// Send a verification code email in the requested language.
    pub async fn send_verification_code(
        &self,
        to: &str,
        code: &str,
        english: bool,
    ) -> Result<(), MailError> {
        let subject = if english {
            "Lumen - Your Verification Code"
        } else {
            "流萤日志 - 您的验证码"
        };
        let html = verification_email_html(code, english);
        self.send(to, subject, &html).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if self.api_key.is_empty() {
            return Err(MailError::NotConfigured);
        }

        let payload = OutboundEmail {
            from: &self.from,
            to: [to],
            subject,
            html,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("Verification email sent to {}", to);
        Ok(())
    }
}

fn verification_email_html(code: &str, english: bool) -> String {
    let (title, note_line1, note_line2, brand) = if english {
        (
            "Your Verification Code",
            "This code expires in 5 minutes",
            "If you didn't request this, please ignore this email",
            "🌙 Lumen",
        )
    } else {
        (
            "您的登录验证码",
            "验证码有效期为 5 分钟",
            "如果这不是您的操作，请忽略此邮件",
            "🌙 流萤日志",
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; background: #f4f4f7; padding: 24px; }}
        .card {{ max-width: 480px; margin: 0 auto; background: white; border-radius: 14px; padding: 36px; }}
        .brand {{ font-size: 26px; font-weight: bold; color: #5a67d8; text-align: center; margin-bottom: 24px; }}
        .title {{ font-size: 18px; color: #333; text-align: center; margin-bottom: 16px; }}
        .code {{ background: #5a67d8; border-radius: 10px; color: white; font-size: 34px; font-weight: bold;
                 letter-spacing: 8px; padding: 18px; text-align: center; margin: 24px 0; }}
        .note {{ color: #666; font-size: 13px; text-align: center; }}
    </style>
</head>
<body>
    <div class="card">
        <div class="brand">{brand}</div>
        <div class="title">{title}</div>
        <div class="code">{code}</div>
        <div class="note">{note_line1}<br>{note_line2}</div>
    </div>
</body>
</html>
"#
    )
}
