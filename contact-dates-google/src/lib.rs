//! Google adapters for contact-dates.
//!
//! [`PeopleDirectory`] and [`GoogleCalendar`] implement the engine's service
//! traits over the People v1 and Calendar v3 REST APIs. Tokens come from a
//! per-account [`Session`] created by the local OAuth flow in [`auth`].

pub mod app_config;
pub mod auth;
pub mod calendar;
pub mod http;
pub mod people;
pub mod session;

use anyhow::Result;

pub use calendar::GoogleCalendar;
pub use http::ApiClient;
pub use people::PeopleDirectory;
pub use session::Session;

/// Both services for `account_email`, sharing one refreshed access token.
pub async fn connect(account_email: &str) -> Result<(PeopleDirectory, GoogleCalendar)> {
    let session = Session::load_valid(account_email).await?;
    let api = ApiClient::new(session.access_token());

    Ok((PeopleDirectory::new(api.clone()), GoogleCalendar::new(api)))
}
