// tests/admin_tests.rs

use std::sync::Arc;

use edugenius_backend::{
    config::Config,
    models::user::{User, UserRole},
    routes,
    state::AppState,
    store::{Db, LocalStore},
    utils::hash::hash_password,
};
use serde_json::json;

struct TestApp {
    address: String,
    db: Arc<Db>,
}

/// Spawns the app on a random port; no test in this file reaches the
/// external generation service.
async fn spawn_app() -> TestApp {
    let config = Config {
        database_path: ":memory:".to_string(),
        jwt_secret: "admin_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        gemini_api_key: String::new(),
        gemini_base_url: "http://127.0.0.1:9".to_string(),
    };

    let local = LocalStore::in_memory()
        .await
        .expect("Failed to open in-memory store");
    let db = Arc::new(Db::new(local));
    db.init().await.expect("Failed to initialize storage");

    let state = AppState::new(db.clone(), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, db }
}

async fn seed_user(db: &Db, id: &str, username: &str, password: &str, role: UserRole) {
    let user = User {
        id: id.to_string(),
        username: username.to_string(),
        name: "Test User".to_string(),
        role,
        active: true,
        password: hash_password(password).unwrap(),
    };
    db.save_user(&user).await.unwrap();
}

async fn login(client: &reqwest::Client, address: &str, username: &str, password: &str) -> String {
    let challenge: serde_json::Value = client
        .get(format!("{address}/api/auth/challenge"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let answer: i64 = challenge["question"]
        .as_str()
        .unwrap()
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().unwrap())
        .sum();

    let response: serde_json::Value = client
        .post(format!("{address}/api/auth/login"))
        .json(&json!({
            "username": username,
            "password": password,
            "challengeId": challenge["id"],
            "challengeAnswer": answer,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    response["token"]
        .as_str()
        .expect("login did not return a token")
        .to_string()
}

#[tokio::test]
async fn admin_surface_requires_admin_role() {
    // Arrange
    let app = spawn_app().await;
    seed_user(&app.db, "u1", "guru1", "password123", UserRole::Guru).await;
    let client = reqwest::Client::new();

    // No token: 401
    let response = client
        .get(format!("{}/api/admin/keys", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // GURU token: 403
    let token = login(&client, &app.address, "guru1", "password123").await;
    let response = client
        .get(format!("{}/api/admin/keys", app.address))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn api_key_management_flow() {
    // Arrange
    let app = spawn_app().await;
    seed_user(&app.db, "admin", "hairi", "password123", UserRole::Admin).await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "hairi", "password123").await;
    let auth = format!("Bearer {token}");

    // Manual add
    let response = client
        .post(format!("{}/api/admin/keys", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "key": "AIzaSy-manual-key-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Duplicate add is rejected
    let response = client
        .post(format!("{}/api/admin/keys", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "key": "AIzaSy-manual-key-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Bulk upload: one short line and one duplicate are skipped
    let response: serde_json::Value = client
        .post(format!("{}/api/admin/keys/bulk", app.address))
        .header("Authorization", &auth)
        .json(&json!({
            "text": "AIzaSy-bulk-key-1\nshort\nAIzaSy-manual-key-1\nAIzaSy-bulk-key-2\n"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["added"], 2);
    assert_eq!(response["total"], 3);

    // Usage counters reset to zero
    app.db.update_api_key_usage("AIzaSy-bulk-key-1").await.unwrap();
    let keys: serde_json::Value = client
        .post(format!("{}/api/admin/keys/reset", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        keys.as_array()
            .unwrap()
            .iter()
            .all(|k| k["usageCount"] == 0)
    );

    // Delete one key
    let response = client
        .delete(format!("{}/api/admin/keys/AIzaSy-bulk-key-2", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(app.db.get_api_keys().await.unwrap().len(), 2);
}

#[tokio::test]
async fn user_management_flow() {
    // Arrange
    let app = spawn_app().await;
    seed_user(&app.db, "admin", "hairi", "password123", UserRole::Admin).await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "hairi", "password123").await;
    let auth = format!("Bearer {token}");

    // Create
    let created: serde_json::Value = client
        .post(format!("{}/api/admin/users", app.address))
        .header("Authorization", &auth)
        .json(&json!({
            "username": "BudiSantoso",
            "name": "Budi Santoso",
            "role": "GURU",
            "password": "rahasia123"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // Usernames are lowercased and hashes never leave the server.
    assert_eq!(created["username"], "budisantoso");
    assert!(created.get("password").is_none());
    let user_id = created["id"].as_str().unwrap().to_string();

    // Duplicate username is a conflict
    let response = client
        .post(format!("{}/api/admin/users", app.address))
        .header("Authorization", &auth)
        .json(&json!({
            "username": "budisantoso",
            "name": "Budi Kedua",
            "role": "GURU",
            "password": "rahasia123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // The new account can log in
    let guru_token = login(&client, &app.address, "budisantoso", "rahasia123").await;
    assert!(!guru_token.is_empty());

    // Deactivate, then the login is refused
    let response = client
        .put(format!("{}/api/admin/users/{user_id}", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let challenge: serde_json::Value = client
        .get(format!("{}/api/auth/challenge", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let answer: i64 = challenge["question"]
        .as_str()
        .unwrap()
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().unwrap())
        .sum();
    let response = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&json!({
            "username": "budisantoso",
            "password": "rahasia123",
            "challengeId": challenge["id"],
            "challengeAnswer": answer,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // The built-in admin account is protected
    let response = client
        .delete(format!("{}/api/admin/users/admin", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Other accounts can be deleted
    let response = client
        .delete(format!("{}/api/admin/users/{user_id}", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(app.db.get_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_user_upload_skips_malformed_and_duplicate_lines() {
    // Arrange
    let app = spawn_app().await;
    seed_user(&app.db, "admin", "hairi", "password123", UserRole::Admin).await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "hairi", "password123").await;

    // Act
    let response: serde_json::Value = client
        .post(format!("{}/api/admin/users/bulk", app.address))
        .header("Authorization", format!("Bearer {token}"))
        .json(&json!({
            "text": "sari,Sari Dewi,pass1234\n\
                     malformed-line\n\
                     hairi,Duplikat,pass1234\n\
                     agus,Agus Wijaya,pass5678\n"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(response["added"], 2);
    let users = app.db.get_users().await.unwrap();
    assert_eq!(users.len(), 3); // seeded admin + 2 imported

    // Imported accounts hold hashes, not the uploaded plaintext.
    let sari = users.iter().find(|u| u.username == "sari").unwrap();
    assert_ne!(sari.password, "pass1234");
    assert_eq!(sari.role, UserRole::Guru);
}

#[tokio::test]
async fn settings_flow_and_connection_probe() {
    // Arrange
    let app = spawn_app().await;
    seed_user(&app.db, "admin", "hairi", "password123", UserRole::Admin).await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "hairi", "password123").await;
    let auth = format!("Bearer {token}");

    // Defaults are served before anything is stored
    let settings: serde_json::Value = client
        .get(format!("{}/api/admin/settings", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(settings["siteName"], "EduGenius AI");
    assert_eq!(settings["aiFactChecker"], true);

    // Wholesale overwrite
    let mut updated = settings.clone();
    updated["siteName"] = json!("Sekolah Kita");
    updated["aiFactChecker"] = json!(false);
    let response: serde_json::Value = client
        .put(format!("{}/api/admin/settings", app.address))
        .header("Authorization", &auth)
        .json(&updated)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["connectionType"], "LOCAL");

    let reloaded: serde_json::Value = client
        .get(format!("{}/api/admin/settings", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reloaded["siteName"], "Sekolah Kita");
    assert_eq!(reloaded["aiFactChecker"], false);

    // A malformed remote URL is rejected before anything is written
    let mut bad = reloaded.clone();
    bad["dbUrl"] = json!("not a url");
    let response = client
        .put(format!("{}/api/admin/settings", app.address))
        .header("Authorization", &auth)
        .json(&bad)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // The probe reports failures without switching backends
    let probe: serde_json::Value = client
        .post(format!("{}/api/admin/settings/test", app.address))
        .header("Authorization", &auth)
        .json(&json!({ "url": "", "token": "" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(probe["success"], false);
}

#[tokio::test]
async fn clearing_logs_leaves_a_warning_marker() {
    // Arrange
    let app = spawn_app().await;
    seed_user(&app.db, "admin", "hairi", "password123", UserRole::Admin).await;
    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "hairi", "password123").await;
    let auth = format!("Bearer {token}");

    app.db
        .add_log(
            edugenius_backend::models::log::LogLevel::Info,
            "aktivitas lama",
        )
        .await
        .unwrap();

    // Act
    let response = client
        .delete(format!("{}/api/admin/logs", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // Assert
    let logs: serde_json::Value = client
        .get(format!("{}/api/admin/logs", app.address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["level"], "WARNING");
}

#[tokio::test]
async fn dashboard_joins_all_collections() {
    // Arrange
    let app = spawn_app().await;
    seed_user(&app.db, "admin", "hairi", "password123", UserRole::Admin).await;

    use edugenius_backend::models::{
        api_key::ApiKey,
        job::{JobStatus, QuizJob},
    };
    for i in 0..3 {
        let mut job = QuizJob {
            id: format!("j{i}"),
            title: format!("Paket {i}"),
            subject: "Kimia".to_string(),
            grade: "Kelas 10".to_string(),
            topic: "Topik".to_string(),
            status: JobStatus::Completed,
            progress: 100,
            results: None,
            error: None,
            created_at: format!("2025-01-0{}T00:00:00Z", i + 1),
            published: i == 0,
        };
        if i == 2 {
            job.status = JobStatus::Failed;
        }
        app.db.save_job(&job).await.unwrap();
    }
    app.db
        .save_api_keys(&[ApiKey::new("aaaaaa"), ApiKey::new("bbbbbb")])
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let token = login(&client, &app.address, "hairi", "password123").await;

    // Act
    let dashboard: serde_json::Value = client
        .get(format!("{}/api/dashboard", app.address))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(dashboard["totalJobs"], 3);
    assert_eq!(dashboard["completedJobs"], 2);
    assert_eq!(dashboard["failedJobs"], 1);
    assert_eq!(dashboard["publishedJobs"], 1);
    assert_eq!(dashboard["activeKeys"], 2);
    assert_eq!(dashboard["totalUsers"], 1);
    // Recent jobs are newest first.
    assert_eq!(dashboard["recentJobs"][0]["id"], "j2");
}
