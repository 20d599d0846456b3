mod dispatch;
mod health_check;
mod helpers;
mod status;
mod subscriptions;
