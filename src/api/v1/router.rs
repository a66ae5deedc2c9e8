use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // path before method, so an unknown path rejects as 404 rather than 405
    let hello = warp::path("hello")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::hello);

    let register = warp::path("register")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let change_password = warp::path("change_password")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::change_password);

    let search_users = warp::path("users")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handler::SearchUsersQuery>())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::search_users);

    let username = warp::path("username")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handler::UsernameQuery>())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::get_username);

    let user_id = warp::path("user_id")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handler::UserIdQuery>())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::resolve_username);

    let create_post = warp::path("posts")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::create_post);

    let list_posts = warp::path("posts")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::list_posts);

    let friends_posts = warp::path("friends_posts")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::friends_posts);

    let add_comment = warp::path("comments")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::add_comment);

    let list_comments = warp::path!("comments" / i64)
        .and(warp::get())
        .and(with(server.post_service.clone()))
        .and_then(handler::list_comments);

    let delete_comment = warp::path!("comments" / i64)
        .and(warp::delete())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::delete_comment);

    let toggle_like = warp::path!("likes" / i64)
        .and(warp::post())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::toggle_like);

    let like_count = warp::path!("likes" / i64 / "count")
        .and(warp::get())
        .and(with(server.post_service.clone()))
        .and_then(handler::like_count);

    let has_liked = warp::path!("likes" / i64 / "mine")
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.post_service.clone()))
        .and_then(handler::has_liked);

    let friend_request = warp::path("friend_request")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::send_friend_request);

    let friend_response = warp::path("friend_response")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::respond_friend_request);

    let friend_status = warp::path("friend_status")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handler::FriendStatusQuery>())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::friend_status);

    let incoming_requests = warp::path("incoming_requests")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::incoming_requests);

    let friends = warp::path("friends")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::friends);

    let accounts = register
        .or(login)
        .or(change_password)
        .or(search_users)
        .or(username)
        .or(user_id);

    let posts = create_post
        .or(list_posts)
        .or(friends_posts)
        .or(add_comment)
        .or(list_comments)
        .or(delete_comment)
        .or(toggle_like)
        .or(like_count)
        .or(has_liked);

    let relationships = friend_request
        .or(friend_response)
        .or(friend_status)
        .or(incoming_requests)
        .or(friends);

    hello.or(accounts).or(posts).or(relationships)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |token: String| {
        let auth_service = auth_service.clone();
        async move {
            if let Some(token) = token.strip_prefix("Bearer ") {
                let user_id = auth_service
                    .verify_token(token)
                    .await
                    .map_err(ApiError::unauthorized)
                    .map_err(reject::custom)?;
                Ok(user_id)
            } else {
                Err(reject::custom(ApiError::new(
                    ApiErrorCode::InvalidToken,
                    "expected a bearer token",
                )))
            }
        }
    })
}
