pub mod alert;
pub mod forecast;
pub mod location;
pub mod preferences;
pub mod subscriber;
pub mod subscriber_email;
