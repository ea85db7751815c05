// tests/store_tests.rs

use edugenius_backend::models::{
    api_key::{ApiKey, ApiKeyStatus},
    job::{JobStatus, QuizJob},
    log::LogLevel,
    user::{User, UserRole},
};
use edugenius_backend::store::{ConnectionType, Db, LocalStore};

async fn local_db() -> Db {
    let local = LocalStore::in_memory()
        .await
        .expect("Failed to open in-memory store");
    let db = Db::new(local);
    db.init().await.expect("Failed to initialize storage");
    db
}

fn sample_job(id: &str, title: &str) -> QuizJob {
    QuizJob {
        id: id.to_string(),
        title: title.to_string(),
        subject: "Fisika".to_string(),
        grade: "Kelas 11".to_string(),
        topic: "Gerak Lurus".to_string(),
        status: JobStatus::Processing,
        progress: 0,
        results: None,
        error: None,
        created_at: "2025-01-01T00:00:00Z".to_string(),
        published: false,
    }
}

fn sample_user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        name: "Guru Uji".to_string(),
        role: UserRole::Guru,
        active: true,
        password: "argon2-hash-placeholder".to_string(),
    }
}

#[tokio::test]
async fn fresh_store_uses_local_backend() {
    let db = local_db().await;
    assert_eq!(db.connection_type().await, ConnectionType::Local);
}

#[tokio::test]
async fn save_then_get_is_an_idempotent_upsert() {
    let db = local_db().await;

    // Insert
    db.save_job(&sample_job("j1", "Draft")).await.unwrap();
    // Upsert with changed fields
    let mut updated = sample_job("j1", "Final");
    updated.status = JobStatus::Completed;
    updated.progress = 100;
    db.save_job(&updated).await.unwrap();

    let jobs = db.get_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, "Final");
    assert_eq!(jobs[0].status, JobStatus::Completed);
    assert_eq!(jobs[0].progress, 100);
}

#[tokio::test]
async fn delete_removes_and_is_a_noop_for_unknown_ids() {
    let db = local_db().await;
    db.save_job(&sample_job("j1", "Keep")).await.unwrap();
    db.save_job(&sample_job("j2", "Drop")).await.unwrap();

    db.delete_job("j2").await.unwrap();
    // Deleting an id that was never stored must not error or change state.
    db.delete_job("no-such-id").await.unwrap();

    let jobs = db.get_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, "j1");
}

#[tokio::test]
async fn user_upsert_is_keyed_by_id() {
    let db = local_db().await;
    db.save_user(&sample_user("u1", "guru1")).await.unwrap();

    let mut renamed = sample_user("u1", "guru1");
    renamed.name = "Nama Baru".to_string();
    renamed.active = false;
    db.save_user(&renamed).await.unwrap();

    let users = db.get_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Nama Baru");
    assert!(!users[0].active);

    db.delete_user("u1").await.unwrap();
    db.delete_user("u1").await.unwrap();
    assert!(db.get_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_keys_are_replaced_wholesale() {
    let db = local_db().await;
    db.save_api_keys(&[ApiKey::new("aaaaaa"), ApiKey::new("bbbbbb")])
        .await
        .unwrap();
    db.save_api_keys(&[ApiKey::new("cccccc")]).await.unwrap();

    let keys = db.get_api_keys().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key, "cccccc");
    assert_eq!(keys[0].status, ApiKeyStatus::Active);
}

#[tokio::test]
async fn key_usage_increments_only_the_selected_key() {
    let db = local_db().await;
    db.save_api_keys(&[ApiKey::new("aaaaaa"), ApiKey::new("bbbbbb")])
        .await
        .unwrap();

    db.update_api_key_usage("aaaaaa").await.unwrap();
    db.update_api_key_usage("aaaaaa").await.unwrap();
    // Unknown key: no-op.
    db.update_api_key_usage("zzzzzz").await.unwrap();

    let keys = db.get_api_keys().await.unwrap();
    let a = keys.iter().find(|k| k.key == "aaaaaa").unwrap();
    let b = keys.iter().find(|k| k.key == "bbbbbb").unwrap();
    assert_eq!(a.usage_count, 2);
    assert_eq!(b.usage_count, 0);
}

#[tokio::test]
async fn settings_default_until_saved_and_roundtrip() {
    let db = local_db().await;

    let settings = db.get_settings().await.unwrap();
    assert_eq!(settings.site_name, "EduGenius AI");
    assert!(settings.ai_fact_checker);
    assert_eq!(settings.tasks_per_hour, 10);

    let mut changed = settings;
    changed.site_name = "Sekolah Kita".to_string();
    changed.ai_fact_checker = false;
    db.save_settings(&changed).await.unwrap();

    let reloaded = db.get_settings().await.unwrap();
    assert_eq!(reloaded.site_name, "Sekolah Kita");
    assert!(!reloaded.ai_fact_checker);
    // No remote credentials were set, so the backend stays local.
    assert_eq!(db.connection_type().await, ConnectionType::Local);
}

#[tokio::test]
async fn logs_are_newest_first_and_capped_at_100() {
    let db = local_db().await;

    for i in 0..105 {
        db.add_log(LogLevel::Info, format!("entry {i}")).await.unwrap();
    }

    let logs = db.get_logs().await.unwrap();
    assert_eq!(logs.len(), 100);
    assert_eq!(logs[0].message, "entry 104");
    assert_eq!(logs[99].message, "entry 5");

    db.clear_logs().await.unwrap();
    assert!(db.get_logs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_rejects_an_empty_url() {
    let db = local_db().await;
    let result = db.test_connection("", "token").await;
    assert!(!result.success);
    assert_eq!(result.message, "URL Database tidak boleh kosong.");
}

#[tokio::test]
async fn test_connection_reports_unreachable_backends() {
    let db = local_db().await;
    // Nothing listens on this port.
    let result = db.test_connection("http://127.0.0.1:9", "token").await;
    assert!(!result.success);
    assert!(result.message.starts_with("Koneksi gagal:"));
}
