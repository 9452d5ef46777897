use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::models::{
    Course, CourseChanges, CourseDocument, Lecture, LectureChanges, Media, NewCourse, NewLecture,
};

/// Result of a lecture update, which can miss at either level.
#[derive(Debug)]
pub enum LectureUpdate {
    Updated(Lecture),
    CourseNotFound,
    LectureNotFound,
}

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT id, title, description, category, created_by, poster,
               views, num_of_videos, created_at, updated_at
        FROM courses
        ORDER BY rowid
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn insert_course(db: &SqlitePool, req: NewCourse) -> Result<Course, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, title, description, category, created_by, poster,
            views, num_of_videos, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.category)
    .bind(&req.created_by)
    .bind(req.poster.as_str())
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(Course {
        id,
        title: req.title,
        description: req.description,
        category: req.category,
        created_by: req.created_by,
        poster: req.poster,
        views: 0,
        num_of_videos: 0,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn find_course_by_id<'e>(
    db: impl SqliteExecutor<'e>,
    id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, title, description, category, created_by, poster, views, num_of_videos, created_at, updated_at FROM courses WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn fetch_lectures<'e>(
    db: impl SqliteExecutor<'e>,
    course_id: &str,
) -> Result<Vec<Lecture>, sqlx::Error> {
    sqlx::query_as::<_, Lecture>(
        "SELECT id, title, description, videos, assignment FROM lectures WHERE course_id = ? ORDER BY position"
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

/// Loads a course with its lectures from one consistent snapshot.
pub async fn fetch_course(db: &SqlitePool, id: &str) -> Result<Option<CourseDocument>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let Some(course) = find_course_by_id(&mut *tx, id).await? else {
        return Ok(None);
    };
    let lectures = fetch_lectures(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(Some(CourseDocument { course, lectures }))
}

/// Counts one view and returns the course's lectures.
pub async fn record_view(db: &SqlitePool, id: &str) -> Result<Option<Vec<Lecture>>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let touched = sqlx::query("UPDATE courses SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if touched == 0 {
        return Ok(None);
    }

    let lectures = fetch_lectures(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(Some(lectures))
}

/// Appends a lecture at the end of the course and refreshes `num_of_videos`.
pub async fn append_lecture(
    db: &SqlitePool,
    course_id: &str,
    req: NewLecture,
) -> Result<Option<Lecture>, sqlx::Error> {
    let mut tx = db.begin().await?;

    // The write comes first so the transaction holds the lock before reading positions.
    if !touch_course(&mut *tx, course_id).await? {
        return Ok(None);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO lectures
            (id, course_id, position, title, description, videos, assignment)
        VALUES (
            ?, ?,
            (SELECT COALESCE(MAX(position), -1) + 1 FROM lectures WHERE course_id = ?),
            ?, ?, ?, ?
        )
        "#,
    )
    .bind(&id)
    .bind(course_id)
    .bind(course_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.videos.as_str())
    .bind(req.assignment.as_str())
    .execute(&mut *tx)
    .await?;

    sync_video_count(&mut *tx, course_id).await?;
    tx.commit().await?;

    Ok(Some(Lecture {
        id,
        title: req.title,
        description: req.description,
        videos: req.videos,
        assignment: req.assignment,
    }))
}

pub async fn update_lecture(
    db: &SqlitePool,
    course_id: &str,
    lecture_id: &str,
    changes: LectureChanges,
) -> Result<LectureUpdate, sqlx::Error> {
    let mut tx = db.begin().await?;

    if !touch_course(&mut *tx, course_id).await? {
        return Ok(LectureUpdate::CourseNotFound);
    }

    let updated = sqlx::query(
        r#"
        UPDATE lectures
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            videos = COALESCE(?, videos),
            assignment = COALESCE(?, assignment)
        WHERE id = ? AND course_id = ?
        "#,
    )
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.videos.map(Media::into_inner))
    .bind(changes.assignment.map(Media::into_inner))
    .bind(lecture_id)
    .bind(course_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(LectureUpdate::LectureNotFound);
    }

    let lecture = sqlx::query_as::<_, Lecture>(
        "SELECT id, title, description, videos, assignment FROM lectures WHERE id = ?"
    )
    .bind(lecture_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(LectureUpdate::Updated(lecture))
}

pub async fn update_course(
    db: &SqlitePool,
    id: &str,
    changes: CourseChanges,
) -> Result<Option<Course>, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let updated = sqlx::query(
        r#"
        UPDATE courses
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            category = COALESCE(?, category),
            created_by = COALESCE(?, created_by),
            poster = COALESCE(?, poster),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.category)
    .bind(changes.created_by)
    .bind(changes.poster.map(Media::into_inner))
    .bind(now)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    find_course_by_id(db, id).await
}

/// Deletes the course; its lectures go with it through the foreign key cascade.
pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

/// Removes a lecture if present and returns the course's remaining video count.
pub async fn remove_lecture(
    db: &SqlitePool,
    course_id: &str,
    lecture_id: &str,
) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = db.begin().await?;

    if !touch_course(&mut *tx, course_id).await? {
        return Ok(None);
    }

    sqlx::query("DELETE FROM lectures WHERE id = ? AND course_id = ?")
        .bind(lecture_id)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    let remaining = sync_video_count(&mut *tx, course_id).await?;
    tx.commit().await?;

    Ok(Some(remaining))
}

async fn touch_course<'e>(db: impl SqliteExecutor<'e>, id: &str) -> Result<bool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query("UPDATE courses SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

async fn sync_video_count<'e>(
    db: impl SqliteExecutor<'e>,
    course_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE courses
        SET num_of_videos = (SELECT COUNT(*) FROM lectures WHERE course_id = ?)
        WHERE id = ?
        RETURNING num_of_videos
        "#,
    )
    .bind(course_id)
    .bind(course_id)
    .fetch_one(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    async fn setup_test_db() -> SqlitePool {
        connect_in_memory().await.expect("Failed to create test db")
    }

    fn new_course(title: &str) -> NewCourse {
        NewCourse {
            title: title.to_string(),
            description: "Intro".to_string(),
            category: "Math".to_string(),
            created_by: "u1".to_string(),
            poster: Media::new("data:image/png;base64,AAAA"),
        }
    }

    fn new_lecture(title: &str) -> NewLecture {
        NewLecture {
            title: title.to_string(),
            description: "Lecture body".to_string(),
            videos: Media::new("data:video/mp4;base64,BBBB"),
            assignment: Media::no_assignment(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_course() {
        let pool = setup_test_db().await;

        let course = insert_course(&pool, new_course("Algebra"))
            .await
            .expect("Failed to insert course");
        assert_eq!(course.title, "Algebra");
        assert_eq!(course.views, 0);
        assert_eq!(course.num_of_videos, 0);

        let courses = fetch_courses(&pool).await.expect("Failed to fetch courses");
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, course.id);
        assert_eq!(courses[0].poster, course.poster);

        let document = fetch_course(&pool, &course.id)
            .await
            .unwrap()
            .expect("Course not found");
        assert!(document.lectures.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_courses_keeps_insertion_order() {
        let pool = setup_test_db().await;

        for title in ["Algebra", "Biology", "Chemistry"] {
            insert_course(&pool, new_course(title)).await.unwrap();
        }

        let titles: Vec<String> = fetch_courses(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, ["Algebra", "Biology", "Chemistry"]);
    }

    #[tokio::test]
    async fn test_record_view_counts_each_call() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, new_course("Algebra")).await.unwrap();

        for _ in 0..3 {
            let lectures = record_view(&pool, &course.id)
                .await
                .unwrap()
                .expect("Course not found");
            assert!(lectures.is_empty());
        }

        let stored = find_course_by_id(&pool, &course.id).await.unwrap().unwrap();
        assert_eq!(stored.views, 3);

        assert!(record_view(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_lecture_keeps_count_and_order() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, new_course("Algebra")).await.unwrap();

        let mut ids = Vec::new();
        for title in ["L1", "L2", "L3"] {
            let lecture = append_lecture(&pool, &course.id, new_lecture(title))
                .await
                .unwrap()
                .expect("Course not found");
            ids.push(lecture.id);
        }

        let document = fetch_course(&pool, &course.id).await.unwrap().unwrap();
        assert_eq!(document.course.num_of_videos, 3);
        let stored: Vec<String> = document.lectures.iter().map(|l| l.id.clone()).collect();
        assert_eq!(stored, ids);
        assert!(document.lectures[0].assignment.is_no_assignment());
    }

    #[tokio::test]
    async fn test_append_lecture_to_missing_course() {
        let pool = setup_test_db().await;

        let result = append_lecture(&pool, "missing", new_lecture("L1")).await.unwrap();
        assert!(result.is_none());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lectures")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_update_lecture_changes_only_given_fields() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, new_course("Algebra")).await.unwrap();
        let lecture = append_lecture(&pool, &course.id, new_lecture("L1"))
            .await
            .unwrap()
            .unwrap();

        let changes = LectureChanges {
            title: Some("L1 revised".to_string()),
            assignment: Some(Media::new("data:application/pdf;base64,CCCC")),
            ..LectureChanges::default()
        };
        let outcome = update_lecture(&pool, &course.id, &lecture.id, changes)
            .await
            .unwrap();

        let updated = match outcome {
            LectureUpdate::Updated(lecture) => lecture,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(updated.title, "L1 revised");
        assert_eq!(updated.description, lecture.description);
        assert_eq!(updated.videos, lecture.videos);
        assert_eq!(updated.assignment.as_str(), "data:application/pdf;base64,CCCC");

        let stored = find_course_by_id(&pool, &course.id).await.unwrap().unwrap();
        assert_eq!(stored.num_of_videos, 1);
    }

    #[tokio::test]
    async fn test_update_lecture_reports_missing_targets() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, new_course("Algebra")).await.unwrap();
        let other = insert_course(&pool, new_course("Biology")).await.unwrap();
        let lecture = append_lecture(&pool, &other.id, new_lecture("L1"))
            .await
            .unwrap()
            .unwrap();

        let outcome = update_lecture(&pool, "missing", &lecture.id, LectureChanges::default())
            .await
            .unwrap();
        assert!(matches!(outcome, LectureUpdate::CourseNotFound));

        // a lecture is only reachable through its own course
        let changes = LectureChanges {
            title: Some("hijacked".to_string()),
            ..LectureChanges::default()
        };
        let outcome = update_lecture(&pool, &course.id, &lecture.id, changes)
            .await
            .unwrap();
        assert!(matches!(outcome, LectureUpdate::LectureNotFound));

        let lectures = fetch_lectures(&pool, &other.id).await.unwrap();
        assert_eq!(lectures[0].title, "L1");
    }

    #[tokio::test]
    async fn test_update_course_keeps_absent_fields() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, new_course("Algebra")).await.unwrap();

        let changes = CourseChanges {
            category: Some("Mathematics".to_string()),
            poster: Some(Media::new("data:image/jpeg;base64,DDDD")),
            ..CourseChanges::default()
        };
        let updated = update_course(&pool, &course.id, changes)
            .await
            .unwrap()
            .expect("Course not found");

        assert_eq!(updated.title, "Algebra");
        assert_eq!(updated.description, "Intro");
        assert_eq!(updated.category, "Mathematics");
        assert_eq!(updated.poster.as_str(), "data:image/jpeg;base64,DDDD");

        let missing = update_course(&pool, "missing", CourseChanges::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_course_cascades_lectures() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, new_course("Algebra")).await.unwrap();
        append_lecture(&pool, &course.id, new_lecture("L1")).await.unwrap();

        assert!(delete_course(&pool, &course.id).await.unwrap());
        assert!(!delete_course(&pool, &course.id).await.unwrap());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lectures")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_remove_lecture() {
        let pool = setup_test_db().await;
        let course = insert_course(&pool, new_course("Algebra")).await.unwrap();
        let first = append_lecture(&pool, &course.id, new_lecture("L1"))
            .await
            .unwrap()
            .unwrap();
        let second = append_lecture(&pool, &course.id, new_lecture("L2"))
            .await
            .unwrap()
            .unwrap();

        let remaining = remove_lecture(&pool, &course.id, &first.id).await.unwrap();
        assert_eq!(remaining, Some(1));

        // unknown lecture ids are a no-op
        let remaining = remove_lecture(&pool, &course.id, "missing").await.unwrap();
        assert_eq!(remaining, Some(1));

        assert!(remove_lecture(&pool, "missing", &second.id).await.unwrap().is_none());

        let lectures = fetch_lectures(&pool, &course.id).await.unwrap();
        assert_eq!(lectures.len(), 1);
        assert_eq!(lectures[0].id, second.id);

        // positions keep growing after a removal
        let third = append_lecture(&pool, &course.id, new_lecture("L3"))
            .await
            .unwrap()
            .unwrap();
        let ids: Vec<String> = fetch_lectures(&pool, &course.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, [second.id, third.id]);
    }
}
