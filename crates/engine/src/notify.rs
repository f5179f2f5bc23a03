//! Unaccredited-attendee notification worker.
//!
//! When a holding ends with attendees who were not on the course group
//! roster, the lecturer gets an email listing them. Delivery is
//! fire-and-forget over a bounded channel: a full queue or a send failure
//! is logged and never blocks or fails the ending transition. Without
//! SMTP configuration the worker degrades to logging the attendee list.

use attend_core::types::DbId;
use attend_db::repositories::{HoldingRepo, ManualEntryRepo, RoomEntryRepo, ScheduleRepo};
use attend_db::DbPool;
use tokio::sync::mpsc;

use crate::error::EngineError;

const CHANNEL_CAPACITY: usize = 64;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@attend.local";

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    ///
    /// | Variable        | Required | Default                 |
    /// |-----------------|----------|-------------------------|
    /// | `SMTP_HOST`     | yes      | —                       |
    /// | `SMTP_PORT`     | no       | `587`                   |
    /// | `SMTP_FROM`     | no       | `noreply@attend.local`  |
    /// | `SMTP_USER`     | no       | —                       |
    /// | `SMTP_PASSWORD` | no       | —                       |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// One queued notification: a finished holding plus the unaccredited
/// completed entries under it.
#[derive(Debug)]
struct UnaccreditedNotice {
    holding_id: DbId,
    room_entry_ids: Vec<DbId>,
    manual_entry_ids: Vec<DbId>,
}

/// Cloneable handle for queueing notifications.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<UnaccreditedNotice>,
}

impl Notifier {
    /// Spawn the delivery worker and return a handle to it.
    pub fn spawn(pool: DbPool, email: Option<EmailConfig>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        if email.is_none() {
            tracing::info!("SMTP not configured; notifications will be logged only");
        }
        tokio::spawn(worker(pool, email, rx));
        Self { tx }
    }

    /// A handle whose notices go nowhere. For tests.
    pub fn disconnected() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self { tx }
    }

    /// Queue a notice; drops it with a warning when the queue is full or
    /// the worker is gone.
    pub fn notify_unaccredited(
        &self,
        holding_id: DbId,
        room_entry_ids: Vec<DbId>,
        manual_entry_ids: Vec<DbId>,
    ) {
        let notice = UnaccreditedNotice {
            holding_id,
            room_entry_ids,
            manual_entry_ids,
        };
        if self.tx.try_send(notice).is_err() {
            tracing::warn!(holding_id, "Notification queue unavailable, dropping notice");
        }
    }
}

async fn worker(pool: DbPool, email: Option<EmailConfig>, mut rx: mpsc::Receiver<UnaccreditedNotice>) {
    while let Some(notice) = rx.recv().await {
        if let Err(err) = deliver(&pool, email.as_ref(), &notice).await {
            tracing::error!(
                holding_id = notice.holding_id,
                error = %err,
                "Failed to deliver unaccredited-attendee notification"
            );
        }
    }
}

async fn deliver(
    pool: &DbPool,
    email: Option<&EmailConfig>,
    notice: &UnaccreditedNotice,
) -> Result<(), EngineError> {
    let Some(holding) = HoldingRepo::find_by_id(pool, notice.holding_id).await? else {
        tracing::warn!(holding_id = notice.holding_id, "Holding vanished before notification");
        return Ok(());
    };

    let mut names = RoomEntryRepo::attendee_names(pool, &notice.room_entry_ids).await?;
    names.extend(ManualEntryRepo::attendee_names(pool, &notice.manual_entry_ids).await?);
    if names.is_empty() {
        return Ok(());
    }

    let group_name = match ScheduleRepo::find_term(pool, holding.course_group_term_id).await? {
        Some(term) => ScheduleRepo::group_name(pool, term.course_group_id).await?,
        None => None,
    };
    let session = group_name.unwrap_or_else(|| format!("session {}", holding.id));

    let lecturer_email = match holding.lecturer_id {
        Some(lecturer_id) => ScheduleRepo::find_person(pool, lecturer_id)
            .await?
            .and_then(|p| p.email),
        None => None,
    };

    match (email, lecturer_email) {
        (Some(cfg), Some(to)) => {
            let subject = format!("[Attend] Unlisted attendees in {session}");
            let mut body = format!(
                "The following attendees of {session} were not on the course group roster:\n\n"
            );
            for name in &names {
                body.push_str("  - ");
                body.push_str(name);
                body.push('\n');
            }
            if let Err(err) = send(cfg, &to, subject, body).await {
                tracing::error!(
                    holding_id = notice.holding_id,
                    to,
                    error = %err,
                    "Failed to send notification email"
                );
            }
        }
        _ => {
            tracing::info!(
                holding_id = notice.holding_id,
                attendees = ?names,
                "Unlisted attendees (no email delivery)"
            );
        }
    }
    Ok(())
}

async fn send(cfg: &EmailConfig, to: &str, subject: String, body: String) -> Result<(), EmailError> {
    use lettre::{
        message::header::ContentType, transport::smtp::authentication::Credentials,
        AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    };

    let message = Message::builder()
        .from(cfg.from_address.parse()?)
        .to(to.parse()?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| EmailError::Build(e.to_string()))?;

    let mut transport_builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
        .port(cfg.smtp_port);
    if let (Some(user), Some(pass)) = (&cfg.smtp_user, &cfg.smtp_password) {
        transport_builder =
            transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    transport_builder.build().send(message).await?;
    tracing::info!(to, "Notification email sent");
    Ok(())
}
