use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::{Auth, Settings, Store};
use anyhow::{Context, anyhow};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;

struct Repos {
    tx_manager: Arc<dyn TxManager>,
    user_repo: Arc<dyn UserRepo>,
    friendship_repo: Arc<dyn FriendshipRepo>,
    post_repo: Arc<dyn PostRepo>,
    comment_repo: Arc<dyn CommentRepo>,
    like_repo: Arc<dyn LikeRepo>,
}

impl Repos {
    fn mysql(pool: &MySqlPool) -> Self {
        Repos {
            tx_manager: Arc::new(MySqlTxManager::new(pool.clone())),
            user_repo: Arc::new(MySqlUserRepo::new(pool.clone())),
            friendship_repo: Arc::new(MySqlFriendshipRepo::new(pool.clone())),
            post_repo: Arc::new(MySqlPostRepo::new(pool.clone())),
            comment_repo: Arc::new(MySqlCommentRepo::new(pool.clone())),
            like_repo: Arc::new(MySqlLikeRepo::new(pool.clone())),
        }
    }

    fn memory(db: &MemoryDb) -> Self {
        Repos {
            tx_manager: Arc::new(db.clone()),
            user_repo: Arc::new(MemoryUserRepo::new(db.clone())),
            friendship_repo: Arc::new(MemoryFriendshipRepo::new(db.clone())),
            post_repo: Arc::new(MemoryPostRepo::new(db.clone())),
            comment_repo: Arc::new(MemoryCommentRepo::new(db.clone())),
            like_repo: Arc::new(MemoryLikeRepo::new(db.clone())),
        }
    }
}

/// Owns the store handle and every service built on it.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pub post_service: Arc<dyn PostService>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let (repos, pool) = match settings.store.backend.as_str() {
            "mysql" => {
                let pool = connect_mysql(&settings.store).await?;
                (Repos::mysql(&pool), Some(pool))
            }
            "memory" => {
                warn!("using the in-memory store, data will not survive a restart");
                (Repos::memory(&MemoryDb::new()), None)
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let auth_service = build_auth_service(&settings.auth, &repos)?;

        let user_service: Arc<dyn UserService> =
            Arc::new(RealUserService::new(repos.user_repo.clone()));

        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(
                repos.friendship_repo.clone(),
                repos.post_repo.clone(),
                repos.tx_manager.clone(),
            ));

        let post_service: Arc<dyn PostService> = Arc::new(RealPostService::new(
            repos.post_repo.clone(),
            repos.comment_repo.clone(),
            repos.like_repo.clone(),
            repos.tx_manager.clone(),
        ));

        info!(
            store = %settings.store.backend,
            auth = %settings.auth.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            user_service,
            relationship_service,
            post_service,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("store pool closed");
        }
    }
}

async fn connect_mysql(store: &Store) -> anyhow::Result<MySqlPool> {
    let url = store
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("store.url is required for the mysql backend"))?;

    // callers beyond max_connections queue until acquire_timeout
    let pool = MySqlPoolOptions::new()
        .max_connections(store.max_connections)
        .acquire_timeout(store.acquire_timeout())
        .connect(url)
        .await
        .context("connecting to mysql")?;

    if store.run_migrations {
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("running migrations")?;
        info!("migrations applied");
    }

    Ok(pool)
}

fn build_auth_service(auth: &Auth, repos: &Repos) -> anyhow::Result<Arc<dyn AuthService>> {
    let service: Arc<dyn AuthService> = match auth.backend.as_str() {
        "fake" => {
            warn!("using the fake auth backend, any token is trusted");
            Arc::new(FakeAuthService::new())
        }
        "real" => {
            let signing_key = auth
                .signing_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| anyhow!("auth.signing_key is required for the real auth backend"))?;

            let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
                issuer: auth.issuer.clone(),
                audience: auth.audience.clone(),
                access_ttl: auth.access_ttl(),
                signing_key: signing_key.as_bytes().to_vec(),
            }));

            Arc::new(RealAuthService::new(
                repos.user_repo.clone(),
                Arc::new(Argon2PasswordHasher),
                token_codec,
                repos.tx_manager.clone(),
            ))
        }
        other => return Err(anyhow!("Unknown auth backend: {}", other)),
    };

    Ok(service)
}
