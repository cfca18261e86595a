use crate::{api::AccountApi, error::AppResult, models::ContactMessage};

/// Validates a contact form submission, then sends it
pub async fn send_contact(api: &dyn AccountApi, message: ContactMessage) -> AppResult<()> {
    message.validate()?;
    api.send_contact(&message).await?;
    tracing::info!(email = %message.email, "Contact message sent");
    Ok(())
}
