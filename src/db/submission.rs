use crate::prelude::*;

/// A contact form submission.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Submission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,

    pub subject: String,
    pub message: String,

    pub ip_address: Option<String>,
    pub location: Option<String>,
    /// Human readable time of submission in the site's timezone.
    pub submitted_at: String,

    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,

    pub subject: String,
    pub message: String,

    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub submitted_at: String,
}

impl Submission {
    /// Append a new submission. Identical submissions are stored as separate rows.
    pub async fn create(db: &Db, form: &CreateSubmission) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO submissions \
                (name, email, phone, subject, message, ip_address, location, submitted_at) \
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&form.name)
        .bind(&form.email)
        .bind(&form.phone)
        .bind(&form.subject)
        .bind(&form.message)
        .bind(&form.ip_address)
        .bind(&form.location)
        .bind(&form.submitted_at)
        .execute(db)
        .await?;
        Ok(row.last_insert_rowid())
    }
}

#[cfg(test)]
impl Submission {
    /// Lookup a submission by id.
    pub async fn lookup(db: &Db, id: i64) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>("SELECT * FROM submissions WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    /// List all submissions, oldest first.
    pub async fn list(db: &Db) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>("SELECT * FROM submissions ORDER BY id")
            .fetch_all(db)
            .await?;
        Ok(rows)
    }
}
