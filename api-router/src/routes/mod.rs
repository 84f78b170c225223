pub mod chat;
pub mod healthz;
pub mod jobs;
pub mod uploads;
