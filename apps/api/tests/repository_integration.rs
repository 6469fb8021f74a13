//! Integration tests for repository layer
//!
//! These tests verify that repository implementations correctly interact
//! with the PostgreSQL database: constraint mapping, tracking-ID assignment,
//! filtering and the change log written alongside grievance mutations.
//! They are skipped when DATABASE_URL is not set.

use grievance_portal_api::auth::password::hash_password;
use grievance_portal_api::domain::catalog::{CategoryDraft, DepartmentDraft};
use grievance_portal_api::domain::grievance::{
    CategoryFilter, GrievanceFilter, GrievanceStatus, NewFeedback, NewGrievance, NewRemark, Page,
};
use grievance_portal_api::domain::repositories::user_repository::{User, UserUpdate};
use grievance_portal_api::domain::repositories::{
    AnalyticsRepository, CategoryRepository, DepartmentRepository, GrievanceRepository,
    RepositoryError, UserRepository,
};
use grievance_portal_api::domain::user::{Email, Role, Username};
use grievance_portal_api::infrastructure::db;
use grievance_portal_api::infrastructure::repositories::{
    PostgresAnalyticsRepository, PostgresCategoryRepository, PostgresDepartmentRepository,
    PostgresGrievanceRepository, PostgresUserRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Set up test database connection pool, or None without DATABASE_URL
async fn setup_test_db() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Some(pool)
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..10])
}

fn test_user(role: Role) -> User {
    let username = unique(role.as_str());
    User::new(
        Username::new(username.clone()).expect("valid username"),
        Email::new(format!("{}@example.com", username)).expect("valid email"),
        hash_password("testpassword").expect("hash password"),
        role,
    )
}

/// Clean up test data after each test
async fn cleanup_user(pool: &PgPool, user_id: Uuid) {
    sqlx::query("DELETE FROM grievances WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to cleanup grievances");
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to cleanup user");
}

#[tokio::test]
async fn test_user_repository_create_and_find_by_login() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let user_repo = PostgresUserRepository::new(pool.clone());

    let user = test_user(Role::Citizen);
    let user_id = user_repo
        .create(user.clone())
        .await
        .expect("Failed to create user");
    assert_eq!(user_id, user.id, "User ID should match");

    let by_username = user_repo
        .find_by_login(user.username.as_str())
        .await
        .expect("Failed to find user")
        .expect("User should be found");
    assert_eq!(by_username.id, user.id);
    assert_eq!(by_username.role, Role::Citizen);
    assert!(by_username.is_active);

    let by_email = user_repo
        .find_by_login(&user.email.as_str().to_uppercase())
        .await
        .expect("Failed to find user")
        .expect("Email lookup is case-insensitive");
    assert_eq!(by_email.id, user.id);

    cleanup_user(&pool, user_id).await;
}

#[tokio::test]
async fn test_user_repository_find_by_login_username_with_at_sign() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let user_repo = PostgresUserRepository::new(pool.clone());

    let mut user = test_user(Role::Citizen);
    let name = format!("{}@ward", unique("at"));
    user.username = Username::new(name.clone()).expect("valid username");
    user_repo
        .create(user.clone())
        .await
        .expect("Failed to create user");

    let found = user_repo
        .find_by_login(&name)
        .await
        .expect("Failed to find user")
        .expect("Username containing '@' should still match");
    assert_eq!(found.id, user.id);

    let missing = user_repo
        .find_by_login("nobody@nowhere.example")
        .await
        .expect("Failed to look up user");
    assert!(missing.is_none());

    cleanup_user(&pool, user.id).await;
}

#[tokio::test]
async fn test_user_repository_duplicate_username_is_conflict() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let user_repo = PostgresUserRepository::new(pool.clone());

    let first = test_user(Role::Citizen);
    user_repo
        .create(first.clone())
        .await
        .expect("First user creation should succeed");

    let mut second = test_user(Role::Citizen);
    second.username = first.username.clone();

    let result = user_repo.create(second).await;
    assert!(
        matches!(result, Err(RepositoryError::Conflict(_))),
        "Duplicate username should be a conflict: {:?}",
        result
    );

    let taken = user_repo
        .email_taken(&first.email, None)
        .await
        .expect("Failed to check email");
    assert!(taken);
    let taken_by_other = user_repo
        .email_taken(&first.email, Some(first.id))
        .await
        .expect("Failed to check email");
    assert!(!taken_by_other);

    cleanup_user(&pool, first.id).await;
}

#[tokio::test]
async fn test_user_repository_partial_update_and_last_login() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let user_repo = PostgresUserRepository::new(pool.clone());

    let user = test_user(Role::Citizen);
    user_repo.create(user.clone()).await.expect("create user");

    let updated = user_repo
        .update(
            user.id,
            &UserUpdate {
                role: Some(Role::Officer),
                designation: Some(Some("Village Officer".to_string())),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update user");
    assert_eq!(updated.role, Role::Officer);
    assert_eq!(updated.designation.as_deref(), Some("Village Officer"));
    assert_eq!(updated.email, user.email, "untouched fields are kept");

    user_repo
        .update_last_login(user.id)
        .await
        .expect("Failed to update last login");
    let found = user_repo
        .find_by_id(user.id)
        .await
        .expect("Failed to find user")
        .expect("User should exist");
    assert!(found.last_login.is_some());

    let missing = user_repo
        .update(Uuid::new_v4(), &UserUpdate {
            is_active: Some(false),
            ..Default::default()
        })
        .await;
    assert!(matches!(missing, Err(RepositoryError::NotFound(_))));

    cleanup_user(&pool, user.id).await;
}

#[tokio::test]
async fn test_grievance_create_assigns_tracking_id_and_logs() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let user_repo = PostgresUserRepository::new(pool.clone());
    let repo = PostgresGrievanceRepository::new(pool.clone());

    let citizen = test_user(Role::Citizen);
    user_repo.create(citizen.clone()).await.expect("create user");

    let new = NewGrievance::new(
        citizen.id,
        "Streetlight out".to_string(),
        "The light at the bus stop is off".to_string(),
        None,
        None,
        None,
    )
    .expect("valid grievance");

    let first = repo.create(&new, "KER").await.expect("create grievance");
    let second = repo.create(&new, "KER").await.expect("create grievance");

    let first_tid = first.tracking_id().expect("tracking id assigned");
    let second_tid = second.tracking_id().expect("tracking id assigned");
    assert_ne!(first_tid, second_tid);
    assert_eq!(first_tid.sequence(), Some(first.id()));
    assert!(first_tid.as_str().starts_with("KER-"));
    assert_eq!(first.status(), GrievanceStatus::New);

    let found = repo
        .find_by_tracking_id(first_tid)
        .await
        .expect("lookup")
        .expect("found by tracking id");
    assert_eq!(found.id(), first.id());

    let history = repo.history(first.id()).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "created");
    assert_eq!(
        history[0].user.as_ref().map(|u| u.id),
        Some(citizen.id),
        "filer is the actor"
    );

    cleanup_user(&pool, citizen.id).await;
}

#[tokio::test]
async fn test_grievance_save_writes_change_log_with_actor() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let user_repo = PostgresUserRepository::new(pool.clone());
    let repo = PostgresGrievanceRepository::new(pool.clone());

    let citizen = test_user(Role::Citizen);
    let officer = test_user(Role::Officer);
    user_repo.create(citizen.clone()).await.expect("create citizen");
    user_repo.create(officer.clone()).await.expect("create officer");

    let new = NewGrievance::new(
        citizen.id,
        "Drain blocked".to_string(),
        "Overflowing drain near the market".to_string(),
        None,
        None,
        None,
    )
    .expect("valid grievance");
    let mut grievance = repo.create(&new, "KER").await.expect("create grievance");

    let event = grievance
        .change_status(GrievanceStatus::Escalated)
        .expect("allowed transition")
        .expect("status changed");
    repo.save(&grievance, Some(officer.id), &[event])
        .await
        .expect("save grievance");

    let stored = repo
        .find_by_id(grievance.id())
        .await
        .expect("lookup")
        .expect("grievance exists");
    assert_eq!(stored.status(), GrievanceStatus::Escalated);

    let history = repo.history(grievance.id()).await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, "status_changed");
    assert_eq!(history[0].before.as_deref(), Some("new"));
    assert_eq!(history[0].after.as_deref(), Some("escalated"));
    assert_eq!(history[0].user.as_ref().map(|u| u.id), Some(officer.id));

    cleanup_user(&pool, citizen.id).await;
    cleanup_user(&pool, officer.id).await;
}

#[tokio::test]
async fn test_grievance_save_remark_feedback_and_filters() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let user_repo = PostgresUserRepository::new(pool.clone());
    let department_repo = PostgresDepartmentRepository::new(pool.clone());
    let category_repo = PostgresCategoryRepository::new(pool.clone());
    let repo = PostgresGrievanceRepository::new(pool.clone());

    let citizen = test_user(Role::Citizen);
    let officer = test_user(Role::Officer);
    user_repo.create(citizen.clone()).await.expect("create citizen");
    user_repo.create(officer.clone()).await.expect("create officer");

    let department = department_repo
        .create(&DepartmentDraft::new(&unique("Revenue"), None, None).unwrap())
        .await
        .expect("create department");
    let category = category_repo
        .create(&CategoryDraft::new(&unique("Land"), Some(department.id)).unwrap())
        .await
        .expect("create category");
    assert_eq!(
        category.department.as_ref().map(|d| d.id),
        Some(department.id)
    );

    let duplicate = category_repo
        .create(&CategoryDraft::new(&category.name, Some(department.id)).unwrap())
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    let needle = unique("boundary");
    let new = NewGrievance::new(
        citizen.id,
        format!("Survey {}", needle),
        "Boundary stones missing".to_string(),
        Some(category.id),
        None,
        None,
    )
    .unwrap()
    .with_default_department(Some(department.id));
    let mut grievance = repo.create(&new, "KER").await.expect("create grievance");
    assert_eq!(grievance.department_id(), Some(department.id));

    // assign and start work
    let mut events = Vec::new();
    events.extend(grievance.assign(officer.id).unwrap());
    events.extend(grievance.change_status(GrievanceStatus::InProgress).unwrap());
    repo.save(&grievance, Some(officer.id), &events)
        .await
        .expect("save grievance");

    // filters
    let (count, results) = repo
        .list(
            &GrievanceFilter {
                search: Some(needle.to_uppercase()),
                ..Default::default()
            },
            Page::default(),
        )
        .await
        .expect("list by search");
    assert_eq!(count, 1);
    assert_eq!(results[0].grievance.id(), grievance.id());
    assert_eq!(
        results[0].assigned_officer.as_ref().map(|o| o.id),
        Some(officer.id)
    );
    assert_eq!(
        results[0].category.as_ref().map(|c| c.id),
        Some(category.id)
    );

    let (count, _) = repo
        .list(
            &GrievanceFilter {
                status: Some("in_progress".to_string()),
                category: Some(CategoryFilter::Name(category.name.to_lowercase())),
                assigned_officer: Some(officer.id),
                user: Some(citizen.id),
                ..Default::default()
            },
            Page::default(),
        )
        .await
        .expect("list by status");
    assert_eq!(count, 1);

    let (count, _) = repo
        .list(
            &GrievanceFilter {
                status: Some("resolved".to_string()),
                user: Some(citizen.id),
                ..Default::default()
            },
            Page::default(),
        )
        .await
        .expect("list by status");
    assert_eq!(count, 0);

    // remark
    let remark = repo
        .add_remark(&NewRemark::new(grievance.id(), officer.id, "Surveyor assigned").unwrap())
        .await
        .expect("add remark");
    assert_eq!(remark.officer.as_ref().map(|o| o.id), Some(officer.id));
    assert_eq!(repo.remarks(grievance.id()).await.unwrap().len(), 1);

    // feedback, once
    let event = grievance
        .change_status(GrievanceStatus::Resolved)
        .unwrap()
        .expect("status changed");
    repo.save(&grievance, Some(officer.id), &[event])
        .await
        .expect("resolve");

    let (feedback, event) =
        NewFeedback::for_grievance(&grievance, 5, Some("Thanks".to_string())).unwrap();
    let stored = repo
        .add_feedback(&feedback, citizen.id, &event)
        .await
        .expect("add feedback");
    assert_eq!(stored.rating, 5);

    let again = repo.add_feedback(&feedback, citizen.id, &event).await;
    assert!(matches!(again, Err(RepositoryError::Conflict(_))));

    let actions: Vec<String> = repo
        .history(grievance.id())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            "feedback_submitted",
            "status_changed",
            "remark_added",
            "status_changed",
            "assigned",
            "created"
        ]
    );

    // analytics
    let dashboard = PostgresAnalyticsRepository::new(pool.clone())
        .officer_dashboard(officer.id)
        .await
        .expect("dashboard");
    assert_eq!(dashboard.total_assigned, 1);
    assert_eq!(dashboard.by_status[0].status, GrievanceStatus::Resolved);

    let summary = PostgresAnalyticsRepository::new(pool.clone())
        .summary()
        .await
        .expect("summary");
    assert!(summary.feedback_count >= 1);
    assert!(summary.average_rating.is_some());

    // delete cascades to remarks, feedback and logs
    repo.delete(grievance.id()).await.expect("delete");
    assert!(repo.find_by_id(grievance.id()).await.unwrap().is_none());
    assert!(repo.history(grievance.id()).await.unwrap().is_empty());
    assert!(matches!(
        repo.delete(grievance.id()).await,
        Err(RepositoryError::NotFound(_))
    ));

    category_repo.delete(category.id).await.expect("delete category");
    department_repo
        .delete(department.id)
        .await
        .expect("delete department");
    cleanup_user(&pool, citizen.id).await;
    cleanup_user(&pool, officer.id).await;
}
