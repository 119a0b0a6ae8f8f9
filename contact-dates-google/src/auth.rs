//! Local OAuth consent flow.
//!
//! Opens the consent page in the browser, waits for Google to redirect back
//! to a one-shot listener on localhost, exchanges the code for tokens and
//! stores them as the account's session.

use anyhow::{Context, Result};
use google_calendar::Client;
use google_calendar::types::MinAccessRole;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use tracing::{debug, info};

use crate::app_config::Credentials;
use crate::session::{Session, SessionData};

const REDIRECT_PORT: u16 = 8085;
const REDIRECT_URI: &str = "http://localhost:8085/callback";

/// Read/write calendars, read-only contacts.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/contacts.readonly",
];

fn client_for(creds: &Credentials, access_token: String, refresh_token: String) -> Client {
    Client::new(
        creds.client_id.clone(),
        creds.client_secret.clone(),
        REDIRECT_URI.to_string(),
        access_token,
        refresh_token,
    )
}

/// Parse `code` and `state` out of the callback request line.
///
/// The line looks like: `GET /callback?code=xxx&state=yyy HTTP/1.1`
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .context("Invalid request")?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;

    if let Some((_, error)) = url.query_pairs().find(|(k, _)| k == "error") {
        anyhow::bail!("Authorization was denied: {}", error);
    }

    let code = url
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .context("No code in callback")?;

    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .context("No state in callback")?;

    Ok((code, state))
}

/// Start a local HTTP listener and block until the OAuth callback arrives.
fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", REDIRECT_PORT))
        .with_context(|| format!("Failed to bind to port {}", REDIRECT_PORT))?;

    println!("Waiting for OAuth callback on port {}...", REDIRECT_PORT);

    let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let result = parse_callback(&request_line);

    let body = if result.is_ok() {
        "<h1>Authentication successful!</h1>\
        <p>You can close this window and return to the terminal.</p>"
    } else {
        "<h1>Authentication failed</h1>\
        <p>Return to the terminal for details.</p>"
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>{}</body></html>",
        body
    );

    stream.write_all(response.as_bytes())?;
    stream.flush()?;

    result
}

/// Run the full consent flow and persist the session.
///
/// Returns the email of the authenticated account.
pub async fn authenticate(creds: &Credentials) -> Result<String> {
    let mut client = client_for(creds, String::new(), String::new());

    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
    let auth_url = client.user_consent_url(&scopes);

    println!("\nOpen this URL in your browser to authenticate:\n");
    println!("{}\n", auth_url);

    if open::that(&auth_url).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, state) = tokio::task::spawn_blocking(wait_for_callback)
        .await
        .context("OAuth callback listener panicked")??;

    info!("Received authorization code, exchanging for tokens");

    let tokens = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange code for tokens")?;

    let data = SessionData::from(&tokens);
    let email = fetch_user_email(creds, &tokens.access_token, &tokens.refresh_token).await?;

    Session::new(&email, data).save()?;
    debug!(account = %email, "Saved session");

    Ok(email)
}

/// The primary calendar's id is the account's email address.
async fn fetch_user_email(creds: &Credentials, access_token: &str, refresh_token: &str) -> Result<String> {
    let client = client_for(creds, access_token.to_string(), refresh_token.to_string());

    let response = client
        .calendar_list()
        .list_all(MinAccessRole::default(), false, false)
        .await
        .context("Failed to fetch calendar list")?;

    response
        .body
        .into_iter()
        .find(|cal| cal.primary && !cal.id.is_empty())
        .map(|cal| cal.id)
        .context("Could not determine the account email (no primary calendar)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback() {
        let (code, state) =
            parse_callback("GET /callback?code=4%2F0Ab&state=xyz&scope=a HTTP/1.1\r\n").unwrap();
        assert_eq!(code, "4/0Ab");
        assert_eq!(state, "xyz");
    }

    #[test]
    fn test_parse_callback_reports_denial() {
        let err = parse_callback("GET /callback?error=access_denied HTTP/1.1").unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_parse_callback_requires_code() {
        assert!(parse_callback("GET /callback?state=xyz HTTP/1.1").is_err());
        assert!(parse_callback("").is_err());
    }
}
