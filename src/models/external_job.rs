use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// Aggregators disagree on whether ids are numbers or strings.
fn deserialize_id_flexible<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => Ok(s),
        StringOrInt::Int(i) => Ok(i.to_string()),
    }
}

/// A listing from the `job_listings` cache or the live aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExternalJob {
    #[serde(deserialize_with = "deserialize_id_flexible")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type", default)]
    pub job_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub external_url: String,
    pub posted_date: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ExternalJob {
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.posted_date)
    }
}
