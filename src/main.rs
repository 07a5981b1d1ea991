//! Concept Tutor - conversational learning client
//!
//! A terminal REPL driving a session controller against a remote
//! explanation/quiz API.

mod api;
mod config;
mod render;
mod session;

use api::auth::{AuthClient, RegisterRequest};
use api::{ApiErrorKind, HttpTutorApi};
use config::{ApiConfig, Credentials};
use session::{SessionController, SessionEvent, TokioPacer};
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (stderr, so the chat transcript stays clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concept_tutor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Configuration
    let config = ApiConfig::from_env();
    tracing::info!(base_url = %config.base_url, "Connecting to tutor API");

    let bearer_token = match (&config.bearer_token, &config.credentials) {
        (Some(token), _) => Some(token.clone()),
        (None, Some(credentials)) => Some(obtain_token(&config.base_url, credentials).await?),
        (None, None) => None,
    };

    let api = Arc::new(HttpTutorApi::new(config.base_url.clone(), bearer_token));
    let mut controller = SessionController::new(api, Arc::new(TokioPacer));

    // Render controller output as it happens
    let mut events = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::MessageAppended(message) => render::render_message(&message),
                SessionEvent::PhaseBegan(phase) | SessionEvent::PhaseUpdated(phase) => {
                    render::render_phase(&phase);
                }
                SessionEvent::RunCollapsed => {}
            }
        }
    });

    render::render_banner();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        controller.handle_input(&line).await;
    }

    println!("\nGoodbye!");
    Ok(())
}

/// Log in with the configured credentials, registering the account first if
/// the server doesn't know it yet and an email is configured.
async fn obtain_token(
    base_url: &str,
    credentials: &Credentials,
) -> Result<String, Box<dyn std::error::Error>> {
    let auth = AuthClient::new(base_url);

    let token = match auth
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(token) => token,
        Err(err)
            if matches!(err.kind, ApiErrorKind::Auth | ApiErrorKind::InvalidRequest)
                && credentials.email.is_some() =>
        {
            tracing::info!(username = %credentials.username, "Login failed, registering account");
            let email = credentials.email.clone().unwrap_or_default();
            auth.register(&RegisterRequest {
                username: credentials.username.clone(),
                email,
                password: credentials.password.clone(),
                grade_level: credentials.grade_level,
            })
            .await?
        }
        Err(err) => return Err(err.into()),
    };

    let profile = auth.me(&token.access_token).await?;
    tracing::info!(username = %profile.username, "Logged in");

    Ok(token.access_token)
}
