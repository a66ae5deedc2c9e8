use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

fn reply<T: Serialize>(data: T) -> warp::reply::Json {
    warp::reply::json(&ApiResponse::ok(data))
}

fn created<T: Serialize>(data: T) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(reply(data), StatusCode::CREATED)
}

fn rejection<E: Into<ApiError>>(error: E) -> warp::Rejection {
    reject::custom(error.into())
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

pub async fn register(
    body: RegisterRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let signup_input = SignupInput {
        email: body.email,
        username: body.username,
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
    };
    let user_id = auth_service.signup(signup_input).await.map_err(rejection)?;

    Ok(created(RegisterResponse { user_id }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        username: body.username,
        password: body.password,
    };
    let login_result = auth_service.login(login_input).await.map_err(rejection)?;

    Ok(reply(login_result))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    body: ChangePasswordRequest,
    user_id: UserId,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .change_password(user_id, &body.old_password, &body.new_password)
        .await
        .map_err(rejection)?;

    Ok(reply(()))
}

#[derive(Debug, Deserialize)]
pub struct SearchUsersQuery {
    pub search: Option<String>,
}

pub async fn search_users(
    query: SearchUsersQuery,
    _user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let users = user_service
        .search_users(query.search.as_deref())
        .await
        .map_err(rejection)?;

    Ok(reply(users))
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub user_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
pub struct UsernameResponse {
    pub username: String,
}

pub async fn get_username(
    query: UsernameQuery,
    _user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let username = user_service
        .get_username(UserId(query.user_id))
        .await
        .map_err(rejection)?;

    Ok(reply(UsernameResponse { username }))
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub user_id: UserId,
}

pub async fn resolve_username(
    query: UserIdQuery,
    _user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user_id = user_service
        .resolve_username(&query.username)
        .await
        .map_err(rejection)?;

    Ok(reply(UserIdResponse { user_id }))
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub post_id: PostId,
}

pub async fn create_post(
    body: CreatePostRequest,
    user_id: UserId,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let post_id = post_service
        .create_post(user_id, &body.title, &body.content)
        .await
        .map_err(rejection)?;

    Ok(created(CreatePostResponse { post_id }))
}

pub async fn list_posts(
    user_id: UserId,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let posts = post_service.list_posts(user_id).await.map_err(rejection)?;
    Ok(reply(posts))
}

pub async fn friends_posts(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let posts = relationship_service
        .friends_posts(user_id)
        .await
        .map_err(rejection)?;

    Ok(reply(posts))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub post_id: PostId,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct AddCommentResponse {
    pub comment_id: CommentId,
}

pub async fn add_comment(
    body: AddCommentRequest,
    user_id: UserId,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let comment_id = post_service
        .add_comment(user_id, body.post_id, &body.content)
        .await
        .map_err(rejection)?;

    Ok(created(AddCommentResponse { comment_id }))
}

pub async fn list_comments(
    post_id: i64,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let comments = post_service
        .list_comments(PostId(post_id))
        .await
        .map_err(rejection)?;

    Ok(reply(comments))
}

pub async fn delete_comment(
    comment_id: i64,
    user_id: UserId,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    post_service
        .delete_comment(user_id, CommentId(comment_id))
        .await
        .map_err(rejection)?;

    Ok(reply(()))
}

#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub action: LikeToggle,
}

pub async fn toggle_like(
    post_id: i64,
    user_id: UserId,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let action = post_service
        .toggle_like(user_id, PostId(post_id))
        .await
        .map_err(rejection)?;

    Ok(reply(ToggleLikeResponse { action }))
}

#[derive(Debug, Serialize)]
pub struct LikeCountResponse {
    pub like_count: i64,
}

pub async fn like_count(
    post_id: i64,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let like_count = post_service
        .like_count(PostId(post_id))
        .await
        .map_err(rejection)?;

    Ok(reply(LikeCountResponse { like_count }))
}

#[derive(Debug, Serialize)]
pub struct HasLikedResponse {
    pub liked: bool,
}

pub async fn has_liked(
    post_id: i64,
    user_id: UserId,
    post_service: Arc<dyn PostService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let liked = post_service
        .has_liked(user_id, PostId(post_id))
        .await
        .map_err(rejection)?;

    Ok(reply(HasLikedResponse { liked }))
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub target: UserId,
}

#[derive(Debug, Serialize)]
pub struct RelationStatusResponse {
    pub status: RelationStatus,
}

pub async fn send_friend_request(
    body: FriendRequestBody,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    relationship_service
        .send_request(user_id, body.target)
        .await
        .map_err(rejection)?;

    Ok(created(RelationStatusResponse {
        status: RelationStatus::Pending,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FriendResponseBody {
    pub requester: UserId,
    pub action: String,
}

pub async fn respond_friend_request(
    body: FriendResponseBody,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let action = body
        .action
        .parse::<FriendAction>()
        .map_err(RelationError::InvalidOperation)
        .map_err(rejection)?;

    let status = relationship_service
        .respond(body.requester, user_id, action)
        .await
        .map_err(rejection)?;

    debug!(recipient = %user_id, requester = %body.requester, %action, "friend request answered");
    Ok(reply(RelationStatusResponse { status }))
}

#[derive(Debug, Deserialize)]
pub struct FriendStatusQuery {
    pub target: uuid::Uuid,
}

pub async fn friend_status(
    query: FriendStatusQuery,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = relationship_service
        .status_of(user_id, UserId(query.target))
        .await
        .map_err(rejection)?;

    Ok(reply(RelationStatusResponse { status }))
}

pub async fn incoming_requests(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let edges = relationship_service
        .incoming_pending(user_id)
        .await
        .map_err(rejection)?;

    Ok(reply(edges))
}

pub async fn friends(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let edges = relationship_service
        .confirmed_friends(user_id)
        .await
        .map_err(rejection)?;

    Ok(reply(edges))
}

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
}

pub async fn hello() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(reply(HelloResponse {
        message: "Hello, world!",
    }))
}
