//! End-to-end tests for the gallery service
//!
//! Each test serves the real router on a loopback port with in-memory
//! family, photo and session stores and a temporary upload directory.

use std::sync::Arc;

use argon2::Params;
use gallery::{
    AppState,
    blob::{BlobStore, FsBlobStore},
    credentials::CredentialStore,
    lifecycle::BlobLifecycleManager,
    models::Photo,
    repositories::{InMemoryFamilyStore, InMemoryPhotoStore},
    routes,
    session::{MemorySessionStore, SessionManager},
};
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
    redirect::Policy,
};
use tokio::net::TcpListener;

struct TestApp {
    base_url: String,
    blobs: Arc<FsBlobStore>,
    _upload_dir: tempfile::TempDir,
}

impl TestApp {
    async fn spawn() -> Self {
        let upload_dir = tempfile::tempdir().expect("create upload dir");
        let blobs = Arc::new(FsBlobStore::open(upload_dir.path()).await.unwrap());

        // Cheap hashing keeps the suite fast; production uses the default cost.
        let params = Params::new(1024, 1, 1, None).unwrap();
        let credentials =
            CredentialStore::with_params(Arc::new(InMemoryFamilyStore::new()), params).unwrap();

        let state = AppState {
            credentials,
            sessions: SessionManager::new(Arc::new(MemorySessionStore::new()), None),
            lifecycle: BlobLifecycleManager::new(
                blobs.clone(),
                Arc::new(InMemoryPhotoStore::new()),
            ),
            max_upload_bytes: 1024 * 1024,
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes::create_router(state))
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            blobs,
            _upload_dir: upload_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A browser-like client: keeps cookies, does not follow redirects
    fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap()
    }

    async fn register(&self, client: &Client, username: &str, password: &str) -> StatusCode {
        client
            .post(self.url("/register"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .unwrap()
            .status()
    }

    async fn login(&self, client: &Client, username: &str, password: &str) -> StatusCode {
        client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .unwrap()
            .status()
    }

    async fn upload(&self, client: &Client, filename: &str, bytes: &[u8], caption: &str) -> Photo {
        let response = self.upload_raw(client, filename, bytes, caption).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        photo_from_json(response.json().await.unwrap())
    }

    async fn upload_raw(
        &self,
        client: &Client,
        filename: &str,
        bytes: &[u8],
        caption: &str,
    ) -> reqwest::Response {
        let form = Form::new().text("caption", caption.to_string()).part(
            "photo",
            Part::bytes(bytes.to_vec())
                .file_name(filename.to_string())
                .mime_str("image/jpeg")
                .unwrap(),
        );

        client
            .post(self.url("/photos"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    async fn list(&self, client: &Client) -> Vec<Photo> {
        let response = client.get(self.url("/dashboard")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let values: Vec<serde_json::Value> = response.json().await.unwrap();
        values.into_iter().map(photo_from_json).collect()
    }

    async fn delete(&self, client: &Client, photo: &Photo) -> StatusCode {
        client
            .delete(self.url(&format!("/photos/{}", photo.id)))
            .send()
            .await
            .unwrap()
            .status()
    }
}

fn photo_from_json(value: serde_json::Value) -> Photo {
    Photo {
        id: value["id"].as_str().unwrap().parse().unwrap(),
        owner_id: value["owner_id"].as_str().unwrap().parse().unwrap(),
        stored_name: value["stored_name"].as_str().unwrap().to_string(),
        caption: value["caption"].as_str().unwrap().to_string(),
        created_at: value["created_at"].as_str().unwrap().parse().unwrap(),
    }
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    assert_eq!(app.register(&client, "alice", "pw1").await, StatusCode::CREATED);
    assert_eq!(app.register(&client, "alice", "pw2").await, StatusCode::CONFLICT);

    // The first password still works, the second was never stored.
    assert_eq!(app.login(&client, "alice", "pw1").await, StatusCode::OK);
    assert_eq!(
        app.login(&TestApp::client(), "alice", "pw2").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();
    app.register(&client, "alice", "pw1").await;

    let wrong = client
        .post(app.url("/login"))
        .form(&[("username", "alice"), ("password", "wrong")])
        .send()
        .await
        .unwrap();
    let wrong_status = wrong.status();
    let wrong_body = wrong.text().await.unwrap();

    let unknown = client
        .post(app.url("/login"))
        .form(&[("username", "nobody"), ("password", "pw1")])
        .send()
        .await
        .unwrap();
    let unknown_status = unknown.status();
    let unknown_body = unknown.text().await.unwrap();

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, unknown_status);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_upload_is_listed_for_owner() {
    let app = TestApp::spawn().await;
    let alice = TestApp::client();
    app.register(&alice, "alice", "pw1").await;
    assert_eq!(app.login(&alice, "alice", "pw1").await, StatusCode::OK);

    let photo = app.upload(&alice, "beach.jpg", b"beach bytes", "beach").await;

    assert_eq!(photo.caption, "beach");
    assert!(app.blobs.exists(&photo.stored_name).await.unwrap());
    assert_eq!(app.list(&alice).await, vec![photo.clone()]);

    let blob = alice
        .get(app.url(&format!("/photos/{}/blob", photo.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(blob.status(), StatusCode::OK);
    assert_eq!(blob.headers()["content-type"], "image/jpeg");
    assert_eq!(blob.bytes().await.unwrap().as_ref(), b"beach bytes");
}

#[tokio::test]
async fn test_other_family_cannot_touch_photo() {
    let app = TestApp::spawn().await;
    let alice = TestApp::client();
    let bob = TestApp::client();
    app.register(&alice, "alice", "pw1").await;
    app.register(&bob, "bob", "pw2").await;
    app.login(&alice, "alice", "pw1").await;
    app.login(&bob, "bob", "pw2").await;

    let photo = app.upload(&alice, "beach.jpg", b"beach bytes", "beach").await;

    assert_eq!(app.delete(&bob, &photo).await, StatusCode::FORBIDDEN);
    let via_form = bob
        .post(app.url(&format!("/photos/{}/delete", photo.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(via_form.status(), StatusCode::FORBIDDEN);
    let blob = bob
        .get(app.url(&format!("/photos/{}/blob", photo.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(blob.status(), StatusCode::FORBIDDEN);

    assert!(app.list(&bob).await.is_empty());
    assert_eq!(app.list(&alice).await, vec![photo.clone()]);
    assert!(app.blobs.exists(&photo.stored_name).await.unwrap());
}

#[tokio::test]
async fn test_owner_delete_removes_row_and_blob() {
    let app = TestApp::spawn().await;
    let alice = TestApp::client();
    app.register(&alice, "alice", "pw1").await;
    app.login(&alice, "alice", "pw1").await;

    let photo = app.upload(&alice, "beach.jpg", b"beach bytes", "beach").await;

    assert_eq!(app.delete(&alice, &photo).await, StatusCode::NO_CONTENT);
    assert!(!app.blobs.exists(&photo.stored_name).await.unwrap());
    assert!(app.list(&alice).await.is_empty());

    assert_eq!(app.delete(&alice, &photo).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_requests_are_sent_to_login() {
    let app = TestApp::spawn().await;
    let anonymous = TestApp::client();

    let response = anonymous.get(app.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/login");

    let response = app
        .upload_raw(&anonymous, "beach.jpg", b"beach bytes", "beach")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = anonymous
        .delete(app.url(&format!("/photos/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_malformed_photo_id() {
    let app = TestApp::spawn().await;

    let anonymous = TestApp::client();
    let response = anonymous
        .delete(app.url("/photos/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/login");

    let response = anonymous
        .get(app.url("/photos/abc/blob"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let alice = TestApp::client();
    app.register(&alice, "alice", "pw1").await;
    app.login(&alice, "alice", "pw1").await;

    for response in [
        alice.delete(app.url("/photos/abc")).send().await.unwrap(),
        alice.post(app.url("/photos/abc/delete")).send().await.unwrap(),
        alice.get(app.url("/photos/abc/blob")).send().await.unwrap(),
    ] {
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Photo not found");
    }
}

#[tokio::test]
async fn test_logout_ends_session_and_is_idempotent() {
    let app = TestApp::spawn().await;
    let alice = TestApp::client();
    app.register(&alice, "alice", "pw1").await;
    app.login(&alice, "alice", "pw1").await;
    assert!(app.list(&alice).await.is_empty());

    let first = alice.post(app.url("/logout")).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);
    let second = alice.get(app.url("/logout")).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::SEE_OTHER);

    let response = alice.get(app.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let app = TestApp::spawn().await;
    let alice = TestApp::client();
    app.register(&alice, "alice", "pw1").await;
    app.login(&alice, "alice", "pw1").await;

    let response = alice
        .post(app.url("/photos"))
        .multipart(Form::new().text("caption", "no photo"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.list(&alice).await.is_empty());
}

#[tokio::test]
async fn test_health_reports_ok() {
    let app = TestApp::spawn().await;

    let response = reqwest::get(app.url("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
