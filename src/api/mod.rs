use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Path, Query};
use axum::routing::{post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::datauri;
use crate::db::repository::{self, LectureUpdate};
use crate::error::{AppError, COURSE_NOT_FOUND, LECTURE_NOT_FOUND};
use crate::models::*;
use crate::state::AppState;
use crate::upload::UploadForm;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LectureQueryParams {
    course_id: String,
    lecture_id: String,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/lectures",
            put(update_lecture).delete(delete_lecture),
        )
        .route(
            "/courses/{id}",
            get(get_course_lectures).put(update_course).delete(delete_course),
        )
        .route("/courses/{id}/lectures", post(add_lecture))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<ApiResponse>, AppError> {
    let courses = repository::fetch_courses(&state.db).await?;
    Ok(Json(ApiResponse::courses(courses)))
}

async fn create_course(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let (Some(title), Some(description), Some(category), Some(created_by)) =
        (form.title, form.description, form.category, form.created_by)
    else {
        return Err(AppError::Validation("Please add all fields".to_string()));
    };

    let poster = form
        .file
        .as_ref()
        .map(datauri::encode)
        .ok_or_else(|| AppError::Validation("Please upload a poster".to_string()))?;

    let course = repository::insert_course(
        &state.db,
        NewCourse {
            title,
            description,
            category,
            created_by,
            poster,
        },
    )
    .await?;
    info!(
        course_id = %course.id,
        poster = ?form.file.as_ref().and_then(|f| f.file_name.as_deref()),
        "course created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message(
            "Course created successfully. you can add lectures now",
        )),
    ))
}

async fn get_course_lectures(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    let lectures = repository::record_view(&state.db, &id)
        .await?
        .ok_or(AppError::NotFound(COURSE_NOT_FOUND))?;
    Ok(Json(ApiResponse::lectures(lectures)))
}

async fn add_lecture(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: UploadForm,
) -> Result<Json<ApiResponse>, AppError> {
    if repository::find_course_by_id(&state.db, &id).await?.is_none() {
        return Err(AppError::NotFound(COURSE_NOT_FOUND));
    }

    let (Some(title), Some(description)) = (form.title, form.description) else {
        return Err(AppError::Validation(
            "Please add lecture title and description".to_string(),
        ));
    };
    let videos = form
        .file
        .as_ref()
        .map(datauri::encode)
        .ok_or_else(|| AppError::Validation("Please upload a video".to_string()))?;
    let assignment = form
        .pdf
        .as_ref()
        .map(datauri::encode)
        .unwrap_or_else(Media::no_assignment);

    let lecture = repository::append_lecture(
        &state.db,
        &id,
        NewLecture {
            title,
            description,
            videos,
            assignment,
        },
    )
    .await?
    .ok_or(AppError::NotFound(COURSE_NOT_FOUND))?;
    info!(
        course_id = %id,
        lecture_id = %lecture.id,
        video = ?form.file.as_ref().and_then(|f| f.file_name.as_deref()),
        assignment = ?form.pdf.as_ref().and_then(|f| f.file_name.as_deref()),
        "lecture added"
    );

    Ok(Json(ApiResponse::message("Lectures added in Course")))
}

async fn update_lecture(
    State(state): State<AppState>,
    query: Result<Query<LectureQueryParams>, QueryRejection>,
    form: UploadForm,
) -> Result<Json<ApiResponse>, AppError> {
    let Query(params) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let changes = LectureChanges {
        title: form.title,
        description: form.description,
        videos: form.file.as_ref().map(datauri::encode),
        assignment: form.pdf.as_ref().map(datauri::encode),
    };

    match repository::update_lecture(&state.db, &params.course_id, &params.lecture_id, changes)
        .await?
    {
        LectureUpdate::Updated(lecture) => {
            info!(course_id = %params.course_id, lecture_id = %lecture.id, "lecture updated");
            Ok(Json(ApiResponse::message("Lecture updated successfully")))
        }
        LectureUpdate::CourseNotFound => Err(AppError::NotFound(COURSE_NOT_FOUND)),
        LectureUpdate::LectureNotFound => Err(AppError::NotFound(LECTURE_NOT_FOUND)),
    }
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: UploadForm,
) -> Result<Json<ApiResponse>, AppError> {
    let changes = CourseChanges {
        title: form.title,
        description: form.description,
        category: form.category,
        created_by: form.created_by,
        poster: form.file.as_ref().map(datauri::encode),
    };

    let course = repository::update_course(&state.db, &id, changes)
        .await?
        .ok_or(AppError::NotFound(COURSE_NOT_FOUND))?;
    info!(course_id = %course.id, "course updated");

    Ok(Json(ApiResponse::message("Course updated successfully")))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, AppError> {
    if !repository::delete_course(&state.db, &id).await? {
        return Err(AppError::NotFound(COURSE_NOT_FOUND));
    }
    info!(course_id = %id, "course deleted");

    Ok(Json(ApiResponse::message("Course deleted successfully")))
}

async fn delete_lecture(
    State(state): State<AppState>,
    query: Result<Query<LectureQueryParams>, QueryRejection>,
) -> Result<Json<ApiResponse>, AppError> {
    let Query(params) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let remaining = repository::remove_lecture(&state.db, &params.course_id, &params.lecture_id)
        .await?
        .ok_or(AppError::NotFound(COURSE_NOT_FOUND))?;
    info!(
        course_id = %params.course_id,
        lecture_id = %params.lecture_id,
        remaining,
        "lecture deleted"
    );

    Ok(Json(ApiResponse::message("Lecture deleted successfully")))
}
