pub mod format;
pub mod job_relevance;
pub mod stripe_signature;
pub mod time;
