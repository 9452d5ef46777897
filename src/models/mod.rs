pub mod course;
pub mod lecture;
pub mod media;
pub mod response;

pub use course::{Course, CourseChanges, CourseDocument, NewCourse};
pub use lecture::{Lecture, LectureChanges, NewLecture};
pub use media::{Media, NO_ASSIGNMENT};
pub use response::ApiResponse;
