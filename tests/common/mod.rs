#![allow(dead_code)]

use bloglist::{
    AppConfig, AppState, create_router,
    memory::MemoryRepository,
    models::{BlogRecord, NewBlog, UserRecord},
    repository::{Repository, RepositoryState},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
    pub state: AppState,
    pub client: reqwest::Client,
}

pub struct UserDetails {
    pub username: &'static str,
    pub name: &'static str,
    pub password: &'static str,
}

pub const USERS: [UserDetails; 2] = [
    UserDetails {
        username: "jtesla",
        name: "Jayanth PSY",
        password: "LoseYourself",
    },
    UserDetails {
        username: "mmathers",
        name: "Marshall Mathers",
        password: "NotAfraid",
    },
];

/// (title, author, url, likes)
pub type BlogFixture = (&'static str, &'static str, &'static str, i64);

pub const INITIAL_BLOGS: [BlogFixture; 2] = [
    ("React patterns", "Michael Chan", "https://reactpatterns.com/", 7),
    (
        "Go To Statement Considered Harmful",
        "Edsger W. Dijkstra",
        "http://www.u.arizona.edu/~rubinson/copyright_violations/Go_To_Considered_Harmful.html",
        5,
    ),
];

pub const OTHER_INITIAL_BLOGS: [BlogFixture; 2] = [
    (
        "Canonical string reduction",
        "Edsger W. Dijkstra",
        "http://www.cs.utexas.edu/~EWD/transcriptions/EWD08xx/EWD808.html",
        12,
    ),
    (
        "First class tests",
        "Robert C. Martin",
        "http://blog.cleancoder.com/uncle-bob/2017/05/05/TestDefinitions.htmll",
        10,
    ),
];

pub async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::default()).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let state = AppState::new(repo.clone() as RepositoryState, config);
    let router = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        state,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("request failed")
    }

    pub async fn put_json(&self, path: &str, body: &Value, token: &str) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.delete(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("request failed")
    }

    /// Registers a user through the API and returns the response body.
    pub async fn register(&self, details: &UserDetails) -> Value {
        let response = self
            .post_json(
                "/api/users",
                &json!({
                    "username": details.username,
                    "name": details.name,
                    "password": details.password,
                }),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "registration of {} failed", details.username);
        response.json().await.unwrap()
    }

    pub async fn login_token(&self, details: &UserDetails) -> String {
        let response = self
            .post_json(
                "/api/login",
                &json!({ "username": details.username, "password": details.password }),
                None,
            )
            .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Inserts posts directly into the store and links them to their owner,
    /// the way a fixture loader would.
    pub async fn seed_blogs(&self, owner_id: &str, blogs: &[BlogFixture]) {
        let owner_id = Uuid::parse_str(owner_id).unwrap();
        let mut owner = self.repo.find_user(owner_id).await.unwrap().unwrap();
        for (title, author, url, likes) in blogs {
            let blog = self
                .repo
                .insert_blog(NewBlog {
                    title: Some(title.to_string()),
                    author: Some(author.to_string()),
                    url: Some(url.to_string()),
                    likes: Some(*likes),
                    user_id: owner_id,
                })
                .await
                .unwrap();
            owner.blogs.push(blog.id);
        }
        self.repo.save_user(&owner).await.unwrap();
    }

    pub async fn blogs_in_db(&self) -> Vec<BlogRecord> {
        self.repo.find_blogs().await.unwrap()
    }

    pub async fn blogs_of(&self, owner_id: &str) -> Vec<BlogRecord> {
        let owner_id = Uuid::parse_str(owner_id).unwrap();
        self.blogs_in_db()
            .await
            .into_iter()
            .filter(|blog| blog.user_id == Some(owner_id))
            .collect()
    }

    pub async fn users_in_db(&self) -> Vec<UserRecord> {
        self.repo.find_users().await.unwrap()
    }
}
