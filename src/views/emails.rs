use askama::Template;

use crate::db::submission::CreateSubmission;

/// Operator notification for a new contact submission.
#[derive(Template)]
#[template(path = "emails/contact.html")]
pub struct ContactNotification<'a> {
    pub site_name: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub subject: &'a str,
    pub message: &'a str,
    pub ip_address: Option<&'a str>,
    pub location: Option<&'a str>,
    pub submitted_at: &'a str,
    pub year: i32,
}

impl<'a> ContactNotification<'a> {
    pub fn new(site_name: &'a str, submission: &'a CreateSubmission, year: i32) -> Self {
        let present = |v: &'a Option<String>| v.as_deref().filter(|v| !v.trim().is_empty());
        Self {
            site_name,
            name: &submission.name,
            email: &submission.email,
            phone: present(&submission.phone),
            subject: &submission.subject,
            message: &submission.message,
            ip_address: present(&submission.ip_address),
            location: present(&submission.location),
            submitted_at: &submission.submitted_at,
            year,
        }
    }
}
