use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::company_profile::CompanyProfile;
use crate::models::invoice::Invoice;
use crate::utils::format::format_money;

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
pub const FALLBACK_COMPANY_NAME: &str = "Your electrician";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct ResendEmailSender {
    client: Client,
    api_key: Option<String>,
    from: String,
    endpoint: String,
}

impl ResendEmailSender {
    pub fn new(client: Client, api_key: Option<String>, from: String) -> Self {
        Self {
            client,
            api_key,
            from,
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let Some(api_key) = &self.api_key else {
            return Err(Error::Config(
                "RESEND_API_KEY is not set, email delivery disabled".to_string(),
            ));
        };

        let payload = ResendPayload {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "email provider returned {}: {}",
                status, body
            )));
        }

        debug!(subject = %email.subject, "Email accepted by provider");
        Ok(())
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Builds the confirmation sent to the invoice's client once payment lands.
/// Returns `None` when the invoice carries no client email.
pub fn render_payment_confirmation(
    invoice: &Invoice,
    profile: Option<&CompanyProfile>,
    paid_at: DateTime<Utc>,
) -> Option<OutgoingEmail> {
    let to = invoice.client_email()?;
    let contact = invoice.client_contact();

    let company_name = profile
        .and_then(|p| non_blank(Some(p.company_name.as_str())))
        .unwrap_or(FALLBACK_COMPANY_NAME);
    let company_email = profile.and_then(|p| non_blank(p.company_email.as_deref()));
    let company_phone = profile.and_then(|p| non_blank(p.company_phone.as_deref()));

    let greeting = match non_blank(contact.name.as_deref()) {
        Some(name) => format!("Hi {},", escape_html(name)),
        None => "Hello,".to_string(),
    };

    let mut contact_lines = String::new();
    if let Some(email) = company_email {
        contact_lines.push_str(&format!(
            "<p style=\"margin:0\">Email: {}</p>",
            escape_html(email)
        ));
    }
    if let Some(phone) = company_phone {
        contact_lines.push_str(&format!(
            "<p style=\"margin:0\">Phone: {}</p>",
            escape_html(phone)
        ));
    }

    let amount = format_money(invoice.total, &invoice.currency);
    let number = escape_html(&invoice.invoice_number);
    let company = escape_html(company_name);

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family:Arial,sans-serif;color:#1f2937">
<h2>Payment received</h2>
<p>{greeting}</p>
<p>Thank you for your payment. Invoice <strong>{number}</strong> has been paid in full.</p>
<table cellpadding="4">
<tr><td>Invoice</td><td>{number}</td></tr>
<tr><td>Amount paid</td><td>{amount}</td></tr>
<tr><td>Payment date</td><td>{date}</td></tr>
</table>
<p>Kind regards,</p>
<p><strong>{company}</strong></p>
{contact_lines}
</body>
</html>"#,
        amount = escape_html(&amount),
        date = paid_at.format("%d %B %Y"),
    );

    Some(OutgoingEmail {
        to: vec![to],
        subject: format!("Payment received for invoice {}", invoice.invoice_number),
        html,
    })
}
