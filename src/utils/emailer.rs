use async_trait::async_trait;
use chrono::Datelike as _;
use chrono_tz::Tz;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor};

use crate::db::submission::CreateSubmission;
use crate::prelude::*;
use crate::utils::mailer::Notifier;
use crate::views::emails::ContactNotification;

/// Emails the site operator about new submissions over SMTP.
pub struct Emailer {
    /// Mailbox to send email from.
    from: Mailbox,
    /// Operator mailbox to notify.
    to: Mailbox,
    site_name: String,
    tz: Tz,
    /// Underlying SMTP transport.
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl Emailer {
    pub fn connect(config: &Config) -> Result<Self> {
        // `lettre` requires a default provider to be installed to use SMTPS.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let email = &config.email;
        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(&email.smtp_addr)
            .with_context(|| format!("parsing smtp_addr={}", email.smtp_addr))?
            .timeout(Some(Duration::from_secs(email.timeout_secs)));
        if let (Some(username), Some(password)) = (&email.smtp_username, &email.smtp_password) {
            transport = transport.credentials(Credentials::new(username.clone(), password.clone()));
        }
        let transport = transport.build();

        let from = sender(config)?;
        let to = email.to.clone().unwrap_or_else(|| from.clone());

        Ok(Self { from, to, site_name: config.app.name.clone(), tz: config.app.tz, transport })
    }

    /// Build the notification for a submission, replying to the submitter.
    ///
    /// The operator still gets notified when the submitter's address can't be used as a Reply-To.
    pub fn message(&self, submission: &CreateSubmission) -> Result<Message> {
        let year = Utc::now().with_timezone(&self.tz).year();
        let html = ContactNotification::new(&self.site_name, submission, year).render()?;

        let mut message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format!("📩 New Contact Request - {}", submission.subject))
            .header(ContentType::TEXT_HTML);
        match submission.email.parse() {
            Ok(address) => message = message.reply_to(Mailbox::new(Some(submission.name.clone()), address)),
            Err(e) => tracing::warn!("Omitting Reply-To for email={:?}: {e}", submission.email),
        }
        Ok(message.body(html)?)
    }
}

#[async_trait]
impl Notifier for Emailer {
    async fn notify(&self, submission: &CreateSubmission) -> Result<()> {
        let message = self.message(submission)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// `email.from`, or the SMTP account named after the site.
fn sender(config: &Config) -> Result<Mailbox> {
    if let Some(from) = &config.email.from {
        return Ok(from.clone());
    }
    let username = config.email.smtp_username.as_deref().context("email.from or EMAIL_USER must be set")?;
    let address = username.parse().with_context(|| format!("parsing sender address={username}"))?;
    Ok(Mailbox::new(Some(format!("{} Website", config.app.name)), address))
}
