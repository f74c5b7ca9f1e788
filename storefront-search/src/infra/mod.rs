pub mod api_client;
pub mod navigation;
pub mod notifications;
pub mod services;
