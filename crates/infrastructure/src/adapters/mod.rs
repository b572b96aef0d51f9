//! Adapters implementing application ports.

mod navigator;
mod refresh_endpoint;
mod reqwest_client;

pub use navigator::WatchNavigator;
pub use refresh_endpoint::ReqwestTokenRefresher;
pub use reqwest_client::{MAX_REDIRECTS, ReqwestHttpClient};
