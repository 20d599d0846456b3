mod admin;
mod health_check;

pub use admin::{handle_list_subscriptions, handle_status, handle_trigger_dispatch, AdminApiKey};
pub use health_check::health_check;
