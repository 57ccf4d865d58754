pub mod job_feed_dto;
pub mod stripe_event_dto;
pub mod webhook_dto;
