use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Media;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lecture {
    pub id: String,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub videos: Media,
    #[sqlx(try_from = "String")]
    pub assignment: Media,
}

#[derive(Debug, Clone)]
pub struct NewLecture {
    pub title: String,
    pub description: String,
    pub videos: Media,
    pub assignment: Media,
}

#[derive(Debug, Clone, Default)]
pub struct LectureChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub videos: Option<Media>,
    pub assignment: Option<Media>,
}
