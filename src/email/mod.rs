pub mod templates;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Outbound mail for account and workflow events.
pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| format!("Invalid WORKHUB_SMTP_FROM: {e}"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("System SMTP error: {e}"))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        Ok(Self { transport, from })
    }

    pub async fn send_welcome(&self, to_email: &str, to_name: &str, base_url: &str) -> Result<(), String> {
        let html = templates::render_welcome(to_name, base_url);
        let text = format!("Hi {to_name},\n\nYour Workhub account has been created. Log in at {base_url}\n");
        self.send(to_email, to_name, "Welcome to Workhub", text, html).await
    }

    pub async fn send_notification(
        &self,
        to_email: &str,
        to_name: &str,
        title: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<(), String> {
        let html = templates::render_notification(to_name, title, message, link);
        let mut text = format!("Hi {to_name},\n\n{message}\n");
        if let Some(link) = link {
            text.push_str(&format!("\n{link}\n"));
        }
        self.send(to_email, to_name, &format!("{title} - Workhub"), text, html)
            .await
    }

    async fn send(
        &self,
        to_email: &str,
        to_name: &str,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<(), String> {
        let to = Mailbox::new(
            Some(to_name.to_string()),
            to_email
                .parse()
                .map_err(|e| format!("Invalid to address: {e}"))?,
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}
