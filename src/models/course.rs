use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Lecture, Media};

/// Course summary as stored in the `courses` table; lectures are loaded separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: String,
    #[sqlx(try_from = "String")]
    pub poster: Media,
    pub views: i64,
    pub num_of_videos: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_by: String,
    pub poster: Media,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub poster: Option<Media>,
}

/// A course together with its lectures in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDocument {
    #[serde(flatten)]
    pub course: Course,
    pub lectures: Vec<Lecture>,
}
