pub mod company_profile;
pub mod external_job;
pub mod invoice;
pub mod notification;
pub mod vacancy;
