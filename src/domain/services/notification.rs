use crate::domain::models::event::{Event, EventMode};
use crate::error::AppError;
use tera::Tera;

pub struct ApprovalMail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Renders the approval notification: event title, schedule, organizer and
/// company, plus mode-specific details (join link for ONLINE, venue and
/// contact for ONSITE).
pub fn build_approval_mail(
    templates: &Tera,
    event: &Event,
    organizer_name: &str,
    company_name: &str,
    participant_name: &str,
) -> Result<ApprovalMail, AppError> {
    let online = EventMode::parse(&event.mode) == Some(EventMode::Online);

    let mut context = tera::Context::new();
    context.insert("participant_name", participant_name);
    context.insert("event_title", &event.title);
    context.insert("category", event.category.as_deref().unwrap_or("N/A"));
    context.insert("starts", &event.start_date.format("%Y-%m-%d %H:%M UTC").to_string());
    context.insert("ends", &event.end_date.format("%Y-%m-%d %H:%M UTC").to_string());
    context.insert("organizer_name", organizer_name);
    context.insert("company_name", company_name);
    context.insert("online", &online);
    context.insert("join_link", event.join_link.as_deref().unwrap_or(""));
    context.insert("venue", event.venue.as_deref().unwrap_or("To be announced"));
    context.insert("contact_info", event.contact_info.as_deref().unwrap_or("N/A"));

    let html_body = templates
        .render("approval.html", &context)
        .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {:?}", e)))?;

    Ok(ApprovalMail {
        subject: format!("You're approved for \"{}\"", event.title),
        text_body: "Congratulations! Here are your event details.".to_string(),
        html_body,
    })
}
