mod models;

pub use models::{PostRecord, STATE_ARCHIVED, STATE_NORMAL};
