use bloglist::{
    memory::MemoryRepository,
    models::{BlogChanges, NewBlog, NewUser},
    repository::{Repository, StoreError, parse_id},
};
use uuid::Uuid;

fn new_user(username: Option<&str>) -> NewUser {
    NewUser {
        username: username.map(str::to_string),
        name: Some("Test".to_string()),
        password_hash: "digest".to_string(),
    }
}

fn new_blog(owner: Uuid, title: Option<&str>, url: Option<&str>) -> NewBlog {
    NewBlog {
        title: title.map(str::to_string),
        author: None,
        url: url.map(str::to_string),
        likes: None,
        user_id: owner,
    }
}

fn validation_message(result: Result<impl std::fmt::Debug, StoreError>) -> String {
    match result {
        Err(StoreError::Validation(message)) => message,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_parse_id_rejects_malformed_ids() {
    assert!(matches!(parse_id("5a422aa71b54a676234d17f8"), Err(StoreError::Cast(_))));
    let id = Uuid::new_v4();
    assert_eq!(parse_id(&id.to_string()).unwrap(), id);
}

#[tokio::test]
async fn test_insert_user_starts_with_empty_blog_list() {
    let repo = MemoryRepository::new();
    let user = repo.insert_user(new_user(Some("root"))).await.unwrap();

    assert!(user.blogs.is_empty());
    assert_eq!(repo.find_user_by_username("root").await.unwrap(), Some(user));
}

#[tokio::test]
async fn test_username_rules_report_first_failure() {
    let repo = MemoryRepository::new();
    repo.insert_user(new_user(Some("root"))).await.unwrap();

    assert_eq!(
        validation_message(repo.insert_user(new_user(None)).await),
        "User validation failed: username: field is mandatory"
    );
    assert_eq!(
        validation_message(repo.insert_user(new_user(Some(""))).await),
        "User validation failed: username: field is mandatory"
    );
    assert_eq!(
        validation_message(repo.insert_user(new_user(Some("ro"))).await),
        "User validation failed: username: should be at least 3 characters long"
    );
    assert_eq!(
        validation_message(repo.insert_user(new_user(Some("root"))).await),
        "User validation failed: username: Error, expected `username` to be unique. Value: `root`"
    );
    assert_eq!(repo.find_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_blog_rules_collect_every_failing_field() {
    let repo = MemoryRepository::new();
    let result = repo.insert_blog(new_blog(Uuid::new_v4(), None, Some(""))).await;
    assert_eq!(
        validation_message(result),
        "Blog validation failed: title: field is mandatory, url: field is mandatory"
    );
    assert!(repo.find_blogs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_blog_defaults_likes_and_comments() {
    let repo = MemoryRepository::new();
    let owner = Uuid::new_v4();
    let blog = repo
        .insert_blog(new_blog(owner, Some("Title"), Some("https://example.com")))
        .await
        .unwrap();

    assert_eq!(blog.likes, 0);
    assert!(blog.comments.is_empty());
    assert_eq!(blog.user_id, Some(owner));
}

#[tokio::test]
async fn test_update_blog_touches_only_given_fields() {
    let repo = MemoryRepository::new();
    let blog = repo
        .insert_blog(new_blog(Uuid::new_v4(), Some("Title"), Some("https://example.com")))
        .await
        .unwrap();

    let updated = repo
        .update_blog(
            blog.id,
            BlogChanges {
                likes: Some(9),
                ..BlogChanges::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.likes, 9);
    assert_eq!(updated.title, "Title");
    assert_eq!(updated.url, "https://example.com");
    assert_eq!(repo.update_blog(Uuid::new_v4(), BlogChanges::default()).await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_blog_reports_whether_anything_was_removed() {
    let repo = MemoryRepository::new();
    let blog = repo
        .insert_blog(new_blog(Uuid::new_v4(), Some("Title"), Some("https://example.com")))
        .await
        .unwrap();

    assert!(repo.delete_blog(blog.id).await.unwrap());
    assert!(!repo.delete_blog(blog.id).await.unwrap());
    assert_eq!(repo.find_blog(blog.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_save_user_overwrites_the_document() {
    let repo = MemoryRepository::new();
    let mut user = repo.insert_user(new_user(Some("root"))).await.unwrap();
    let blog_id = Uuid::new_v4();

    user.blogs.push(blog_id);
    repo.save_user(&user).await.unwrap();

    let stored = repo.find_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.blogs, vec![blog_id]);
}

#[tokio::test]
async fn test_clear_empties_both_collections() {
    let repo = MemoryRepository::new();
    let user = repo.insert_user(new_user(Some("root"))).await.unwrap();
    repo.insert_blog(new_blog(user.id, Some("Title"), Some("https://example.com")))
        .await
        .unwrap();

    repo.clear().await.unwrap();
    assert!(repo.find_users().await.unwrap().is_empty());
    assert!(repo.find_blogs().await.unwrap().is_empty());
}
