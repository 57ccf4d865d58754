use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::dto::stripe_event_dto::PaymentEvent;
use crate::error::{Error, Result};
use crate::utils::stripe_signature::verify_signature;

/// What to do when a delivery cannot be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePolicy {
    /// Reject unsigned or badly signed deliveries.
    Strict,
    /// Log and process them anyway. Intended for local development only.
    Lenient,
}

impl std::str::FromStr for SignaturePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown signature policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedEvent {
    pub event: PaymentEvent,
    pub signature_verified: bool,
}

#[derive(Debug, Clone)]
pub struct EventVerifier {
    secret: Option<String>,
    policy: SignaturePolicy,
    tolerance_secs: i64,
}

impl EventVerifier {
    pub fn new(secret: Option<String>, policy: SignaturePolicy, tolerance_secs: i64) -> Self {
        let secret = secret.filter(|s| !s.trim().is_empty());
        if policy == SignaturePolicy::Lenient {
            warn!("Webhook signature policy is lenient; unverified events will be processed");
        }
        Self {
            secret,
            policy,
            tolerance_secs,
        }
    }

    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<VerifiedEvent> {
        self.verify_at(payload, signature, Utc::now())
    }

    pub fn verify_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<VerifiedEvent> {
        let signature = signature.map(str::trim).filter(|s| !s.is_empty());

        let signature_verified = match (self.secret.as_deref(), signature) {
            (Some(secret), Some(signature)) => {
                match verify_signature(payload, signature, secret, self.tolerance_secs, now) {
                    Ok(()) => true,
                    Err(err) if self.policy == SignaturePolicy::Lenient => {
                        warn!(error = %err, "Webhook signature verification failed, parsing unverified");
                        false
                    }
                    Err(err) => {
                        warn!(error = %err, "Rejecting webhook with invalid signature");
                        return Err(Error::Signature(err));
                    }
                }
            }
            (None, _) if self.policy == SignaturePolicy::Strict => {
                return Err(Error::Config(
                    "STRIPE_CONNECT_WEBHOOK_SECRET is required to verify webhooks".to_string(),
                ));
            }
            (Some(_), None) if self.policy == SignaturePolicy::Strict => {
                warn!("Rejecting webhook without stripe-signature header");
                return Err(Error::BadRequest("missing_stripe_signature".to_string()));
            }
            (secret, signature) => {
                warn!(
                    has_secret = secret.is_some(),
                    has_signature = signature.is_some(),
                    "Webhook secret or signature absent, parsing unverified"
                );
                false
            }
        };

        let event = PaymentEvent::from_slice(payload)
            .map_err(|e| Error::MalformedEvent(e.to_string()))?;

        info!(
            event_type = event.event_type(),
            signature_verified,
            "Webhook event parsed"
        );

        Ok(VerifiedEvent {
            event,
            signature_verified,
        })
    }
}
