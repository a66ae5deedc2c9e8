use friendbook::application_impl::*;
use friendbook::application_port::*;
use friendbook::domain_model::*;
use friendbook::infra_memory::*;
use std::sync::Arc;
use std::time::Duration;

/// Stores passwords reversed so tests stay fast and deterministic.
struct ReversingHasher;

#[async_trait::async_trait]
impl CredentialHasher for ReversingHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        Ok(password.chars().rev().collect())
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        Ok(password.chars().rev().collect::<String>() == password_hash)
    }
}

struct Services {
    auth: RealAuthService,
    users: RealUserService,
    posts: RealPostService,
}

fn services() -> Services {
    let db = MemoryDb::new();
    let user_repo = Arc::new(MemoryUserRepo::new(db.clone()));
    let token_codec = Arc::new(JwtHs256Codec::new(JwtConfig {
        issuer: "test.auth".into(),
        audience: "test-client".into(),
        access_ttl: Duration::from_secs(300),
        signing_key: b"integration-test-key".to_vec(),
    }));

    Services {
        auth: RealAuthService::new(
            user_repo.clone(),
            Arc::new(ReversingHasher),
            token_codec,
            Arc::new(db.clone()),
        ),
        users: RealUserService::new(user_repo),
        posts: RealPostService::new(
            Arc::new(MemoryPostRepo::new(db.clone())),
            Arc::new(MemoryCommentRepo::new(db.clone())),
            Arc::new(MemoryLikeRepo::new(db.clone())),
            Arc::new(db),
        ),
    }
}

fn signup(username: &str) -> SignupInput {
    SignupInput {
        email: format!("{username}@example.com"),
        username: username.to_string(),
        password: "correct horse".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

fn login(username: &str, password: &str) -> LoginInput {
    LoginInput {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn signup_login_and_verify() {
    let s = services();
    let user_id = s.auth.signup(signup("alice")).await.unwrap();

    let result = s.auth.login(login("alice", "correct horse")).await.unwrap();
    assert_eq!(result.user.user_id, user_id);
    assert_eq!(result.user.username, "alice");
    assert!(result.expires_at > chrono::Utc::now());

    let verified = s.auth.verify_token(&result.token.0).await.unwrap();
    assert_eq!(verified, user_id);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let s = services();
    s.auth.signup(signup("alice")).await.unwrap();

    assert!(matches!(
        s.auth.signup(signup("alice")).await,
        Err(AuthError::UserExists)
    ));
}

#[tokio::test]
async fn signup_validates_fields() {
    let s = services();

    let mut short_name = signup("al");
    short_name.username = "al".into();
    let mut short_password = signup("bob");
    short_password.password = "12345".into();
    let mut bad_email = signup("carol");
    bad_email.email = "carol.example.com".into();
    let mut blank_name = signup("dave");
    blank_name.first_name = "  ".into();

    for input in [short_name, short_password, bad_email, blank_name] {
        assert!(matches!(
            s.auth.signup(input).await,
            Err(AuthError::InvalidInput(_))
        ));
    }
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let s = services();
    s.auth.signup(signup("alice")).await.unwrap();

    assert!(matches!(
        s.auth.login(login("alice", "wrong horse")).await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        s.auth.login(login("nobody", "correct horse")).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let s = services();
    assert!(matches!(
        s.auth.verify_token("not-a-jwt").await,
        Err(AuthError::TokenInvalid)
    ));
}

#[tokio::test]
async fn change_password_requires_old_password() {
    let s = services();
    let user_id = s.auth.signup(signup("alice")).await.unwrap();

    assert!(matches!(
        s.auth.change_password(user_id, "wrong horse", "battery staple").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        s.auth.change_password(user_id, "correct horse", "short").await,
        Err(AuthError::InvalidInput(_))
    ));

    s.auth
        .change_password(user_id, "correct horse", "battery staple")
        .await
        .unwrap();

    assert!(s.auth.login(login("alice", "correct horse")).await.is_err());
    assert!(s.auth.login(login("alice", "battery staple")).await.is_ok());
}

#[tokio::test]
async fn user_lookup_and_prefix_search() {
    let s = services();
    let alice = s.auth.signup(signup("alice")).await.unwrap();
    s.auth.signup(signup("albert")).await.unwrap();
    s.auth.signup(signup("bob")).await.unwrap();

    assert_eq!(s.users.resolve_username("alice").await.unwrap(), alice);
    assert_eq!(s.users.get_username(alice).await.unwrap(), "alice");
    assert!(matches!(
        s.users.get_username(UserId::new_random()).await,
        Err(AuthError::UserNotFound)
    ));

    let found: Vec<String> = s
        .users
        .search_users(Some("al"))
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(found, vec!["albert", "alice"]);

    assert_eq!(s.users.search_users(None).await.unwrap().len(), 3);
    assert!(s.users.search_users(Some("zed")).await.unwrap().is_empty());
}

#[tokio::test]
async fn posts_are_listed_newest_first() {
    let s = services();
    let author = UserId::new_random();

    let first = s.posts.create_post(author, "one", "first post").await.unwrap();
    let second = s.posts.create_post(author, "two", "second post").await.unwrap();
    s.posts
        .create_post(UserId::new_random(), "other", "someone else")
        .await
        .unwrap();

    let ids: Vec<PostId> = s
        .posts
        .list_posts(author)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.post_id)
        .collect();
    assert_eq!(ids, vec![second, first]);

    assert!(matches!(
        s.posts.create_post(author, "", "no title").await,
        Err(PostError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn only_the_author_deletes_a_comment() {
    let s = services();
    let (author, other) = (UserId::new_random(), UserId::new_random());
    let post_id = s.posts.create_post(author, "title", "body").await.unwrap();

    let comment_id = s.posts.add_comment(other, post_id, "nice").await.unwrap();
    s.posts.add_comment(author, post_id, "thanks").await.unwrap();
    assert_eq!(s.posts.list_comments(post_id).await.unwrap().len(), 2);

    assert!(matches!(
        s.posts.delete_comment(author, comment_id).await,
        Err(PostError::Forbidden)
    ));
    s.posts.delete_comment(other, comment_id).await.unwrap();
    assert!(matches!(
        s.posts.delete_comment(other, comment_id).await,
        Err(PostError::CommentNotFound)
    ));

    let remaining = s.posts.list_comments(post_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].author, author);
}

#[tokio::test]
async fn comment_on_missing_post_fails() {
    let s = services();
    assert!(matches!(
        s.posts.add_comment(UserId::new_random(), PostId(404), "hello?").await,
        Err(PostError::PostNotFound)
    ));
}

#[tokio::test]
async fn likes_toggle() {
    let s = services();
    let (author, fan) = (UserId::new_random(), UserId::new_random());
    let post_id = s.posts.create_post(author, "title", "body").await.unwrap();

    assert_eq!(s.posts.toggle_like(fan, post_id).await.unwrap(), LikeToggle::Liked);
    assert_eq!(s.posts.toggle_like(author, post_id).await.unwrap(), LikeToggle::Liked);
    assert_eq!(s.posts.like_count(post_id).await.unwrap(), 2);
    assert!(s.posts.has_liked(fan, post_id).await.unwrap());

    assert_eq!(s.posts.toggle_like(fan, post_id).await.unwrap(), LikeToggle::Unliked);
    assert_eq!(s.posts.like_count(post_id).await.unwrap(), 1);
    assert!(!s.posts.has_liked(fan, post_id).await.unwrap());

    assert!(matches!(
        s.posts.toggle_like(fan, PostId(404)).await,
        Err(PostError::PostNotFound)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_by_one_user_alternate() {
    let s = Arc::new(services());
    let (author, fan) = (UserId::new_random(), UserId::new_random());
    let post_id = s.posts.create_post(author, "title", "body").await.unwrap();

    for _ in 0..10 {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let s = s.clone();
                tokio::spawn(async move { s.posts.toggle_like(fan, post_id).await })
            })
            .collect();

        let mut toggles = Vec::new();
        for handle in handles {
            toggles.push(handle.await.unwrap().unwrap());
        }
        toggles.sort_by_key(|t| *t == LikeToggle::Unliked);

        assert_eq!(toggles, vec![LikeToggle::Liked, LikeToggle::Unliked]);
        assert_eq!(s.posts.like_count(post_id).await.unwrap(), 0);
        assert!(!s.posts.has_liked(fan, post_id).await.unwrap());
    }
}
