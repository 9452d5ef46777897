use serde::{Deserialize, Serialize};

use super::{Course, Lecture};

/// Body of every successful response.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<Course>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lectures: Option<Vec<Lecture>>,
}

impl ApiResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn courses(courses: Vec<Course>) -> Self {
        Self {
            success: true,
            courses: Some(courses),
            ..Self::default()
        }
    }

    pub fn lectures(lectures: Vec<Lecture>) -> Self {
        Self {
            success: true,
            lectures: Some(lectures),
            ..Self::default()
        }
    }
}
