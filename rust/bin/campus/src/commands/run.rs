//! `campus run`: drive one account through its whole lifecycle.
//!
//! Uses the in-memory provider, so it needs no backend. Every notification
//! is printed as it is shown; the log buffer is printed at the end.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::info;

use campus_auth::{
    MemoryProfileStore, MemoryProvider, OpResult, ProfileError, ProfileFields, SessionSynchronizer,
};
use campus_diag::{use_error, ErrorScope, ErrorSurface, LogStore};
use campus_state::{Notification, NotificationChannel};

use crate::config::ClientConfig;

pub struct RunArgs {
    pub email: String,
    pub password: String,
    pub new_password: String,
    pub username: Option<String>,
    /// Make the profile write fail, to show a partial sign-up.
    pub fail_profile: bool,
}

/// What a run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub notifications: Vec<Notification>,
    /// `"[step] message"` for every failed step, in order.
    pub failures: Vec<String>,
    /// The last error the surface shows, if any.
    pub last_error: Option<String>,
    pub logs: String,
}

/// Run the lifecycle and print what happened.
pub async fn run(config: &ClientConfig, args: RunArgs) -> Result<()> {
    let summary = execute(config, args).await?;

    println!();
    println!("Logs:");
    println!("{}", summary.logs);
    if let Some(err) = &summary.last_error {
        eprintln!("Last error: {}", err);
    }
    Ok(())
}

pub async fn execute(config: &ClientConfig, args: RunArgs) -> Result<RunSummary> {
    let log = Arc::new(LogStore::from_config(&config.diag));
    let surface = Arc::new(ErrorSurface::from_config(&config.diag));
    let _scope = ErrorScope::enter(surface.clone());

    let toasts = Arc::new(NotificationChannel::new());
    let shown = Arc::new(Mutex::new(Vec::new()));
    {
        let shown = shown.clone();
        toasts.subscribe(move |n| {
            if let Some(n) = n {
                let marker = if n.is_failure() { "!" } else { "*" };
                println!("{} {}: {}", marker, n.title, n.description);
                shown.lock().push(n.clone());
            }
        });
    }

    let provider = Arc::new(MemoryProvider::new());
    let profiles = Arc::new(MemoryProfileStore::new());
    if args.fail_profile {
        profiles.fail_with(ProfileError::Rejected(
            "new row violates row-level security policy for table \"profiles\"".into(),
        ));
    }

    let sync = SessionSynchronizer::new(
        provider,
        profiles,
        toasts,
        log.clone(),
        config.auth.clone(),
    );
    sync.start().await;
    info!(mode = ?config.diag.mode, "session synchronizer started");

    let username = args
        .username
        .clone()
        .unwrap_or_else(|| local_part(&args.email).to_string());

    let mut failures = Vec::new();
    let fields = ProfileFields::new(username);
    failures.extend(report("SignUp", &sync.sign_up(&args.email, &args.password, fields).await));
    failures.extend(report("SignIn", &sync.sign_in(&args.email, &args.password).await));
    failures.extend(report("ResetPassword", &sync.reset_password(&args.email).await));
    failures.extend(report("UpdatePassword", &sync.update_password(&args.new_password).await));
    failures.extend(report("SignOut", &sync.sign_out().await));

    sync.stop();

    let notifications = shown.lock().clone();
    Ok(RunSummary {
        notifications,
        failures,
        last_error: surface.error(),
        logs: log.export_logs(),
    })
}

/// Push a failed step to the error surface; returns its prefixed line.
fn report<T>(step: &str, result: &OpResult<T>) -> Option<String> {
    match &result.error {
        Some(e) => Some(use_error().log_error(e.to_fault(), Some(step))),
        None => {
            info!(step, "ok");
            None
        }
    }
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_diag::Mode;

    fn args(fail_profile: bool) -> RunArgs {
        RunArgs {
            email: "ana@uni.edu".into(),
            password: "secret1".into(),
            new_password: "secret2".into(),
            username: None,
            fail_profile,
        }
    }

    fn dev_config() -> ClientConfig {
        let mut config = ClientConfig::default();
        config.diag.mode = Mode::Development;
        config
    }

    #[tokio::test]
    async fn full_lifecycle_succeeds() {
        let summary = execute(&dev_config(), args(false)).await.unwrap();

        let titles: Vec<_> = summary.notifications.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Cuenta creada",
                "Bienvenido",
                "Correo enviado",
                "Contraseña actualizada",
                "Sesión cerrada",
            ]
        );
        assert!(summary.failures.is_empty());
        assert!(summary.last_error.is_none());

        let logs: Vec<serde_json::Value> = serde_json::from_str(&summary.logs).unwrap();
        let messages: Vec<_> = logs.iter().map(|e| e["message"].as_str().unwrap()).collect();
        assert!(messages.contains(&"User signed in"));
        assert!(messages.contains(&"Password reset email sent"));
        assert!(messages.contains(&"User signed out successfully"));
    }

    #[tokio::test]
    async fn failing_profile_write_reports_sign_up_only() {
        let summary = execute(&dev_config(), args(true)).await.unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].starts_with("[SignUp] new row violates"));
        assert!(summary.notifications[0].is_failure());
        // The account was created upstream, so the rest of the flow works.
        assert_eq!(summary.notifications.len(), 5);
        assert!(summary.notifications[1..].iter().all(|n| !n.is_failure()));
        assert!(summary.last_error.unwrap().starts_with("new row violates"));
    }

    #[test]
    fn username_defaults_to_local_part() {
        assert_eq!(local_part("ana@uni.edu"), "ana");
        assert_eq!(local_part("plain"), "plain");
    }
}
