//! Notification routing
//!
//! Error-message bundles accumulate per user over one center run:
//! first-time validation failures and duplicate-filename violations
//! both land here. The accumulator is a plain value threaded through
//! the run and flushed once at the end; delivery itself is behind the
//! [`Notifier`] trait.

use async_trait::async_trait;
use chrono::Utc;
use intake_common::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Filenames plus the error text they share
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBundle {
    pub filenames: Vec<String>,
    pub message: String,
}

/// Per-user error bundles accumulated during one center run
#[derive(Debug, Clone, Default)]
pub struct NotificationAccumulator {
    bundles: BTreeMap<String, Vec<MessageBundle>>,
}

impl NotificationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one bundle for every distinct user in `users`.
    ///
    /// Recipients are deduplicated here so a user who both created
    /// and modified a file receives the bundle once.
    pub fn add_bundle(&mut self, users: &[String], filenames: Vec<String>, message: impl Into<String>) {
        let message = message.into();
        let unique_users: BTreeSet<&String> = users.iter().collect();
        for user in unique_users {
            self.bundles
                .entry(user.clone())
                .or_default()
                .push(MessageBundle {
                    filenames: filenames.clone(),
                    message: message.clone(),
                });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Number of users with at least one queued bundle
    pub fn user_count(&self) -> usize {
        self.bundles.len()
    }

    pub fn bundles_for(&self, user: &str) -> Option<&[MessageBundle]> {
        self.bundles.get(user).map(|b| b.as_slice())
    }

    /// Users with queued bundles, in ascending id order
    pub fn users(&self) -> impl Iterator<Item = &String> {
        self.bundles.keys()
    }
}

/// External delivery collaborator
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Resolve the display name used in the message salutation
    async fn resolve_username(&self, user_id: &str) -> Result<String>;

    /// Deliver one composed message
    async fn send(&self, user_id: &str, subject: &str, body: &str) -> Result<()>;
}

/// Compose the message body for one user's bundles
pub fn compose_body(username: &str, bundles: &[MessageBundle]) -> String {
    let mut errors = String::new();
    for bundle in bundles {
        let filenames = bundle.filenames.join(", ");
        errors.push_str(&format!(
            "Filenames: {}, Errors:\n {}\n\n",
            filenames, bundle.message
        ));
    }

    format!(
        "Dear {},\n\nYou have invalid files! Here are the reasons why:\n\n{}",
        username, errors
    )
}

/// Flush the accumulator: one composed message per user with queued
/// bundles. Returns the number of users notified.
pub async fn flush(
    accumulator: NotificationAccumulator,
    notifier: &dyn Notifier,
    subject_prefix: &str,
) -> Result<usize> {
    let mut notified = 0;
    let subject = format!(
        "{} - {}",
        subject_prefix,
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    );

    for (user, bundles) in &accumulator.bundles {
        debug!(user = %user, bundles = bundles.len(), "Sending validation error message");
        let username = notifier.resolve_username(user).await?;
        let body = compose_body(&username, bundles);
        notifier.send(user, &subject, &body).await?;
        notified += 1;
    }

    if notified > 0 {
        info!(users = notified, "Validation error notifications sent");
    }
    Ok(notified)
}
