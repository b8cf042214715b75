use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workhub_notify::models::NotificationType;
use workhub_notify::publish::{NotificationPublisher, PublishRequest};
use workhub_notify::store::{MemoryStore, NotificationStore, PgStore};
use workhub_notify::stream::EmitterRegistry;
use workhub_notify::{api, cli, config, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "workhub_notify=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port, in_memory }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port, in_memory).await
        }
        Some(cli::Commands::Publish {
            receivers,
            notification_type,
            title,
            content,
            related_url,
            project_id,
            project_node_id,
            post_id,
            comment_id,
            cs_qna_id,
            cs_post_id,
        }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;

            let base = build_publish_request(
                &notification_type,
                title,
                content,
                related_url,
                project_id,
                project_node_id,
                post_id,
                comment_id,
                cs_qna_id,
                cs_post_id,
            )?;

            let store: Arc<dyn NotificationStore> = Arc::new(db);
            let registry = Arc::new(EmitterRegistry::new(store.clone()));
            let publisher = NotificationPublisher::new(store, registry);

            let receivers: HashSet<i64> = receivers.into_iter().collect();
            publisher.publish_to_users(&receivers, base).await?;
            println!("stored notification for {} receiver(s)", receivers.len());
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port, false).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16, in_memory: bool) -> anyhow::Result<()> {
    let store: Arc<dyn NotificationStore> = if in_memory {
        tracing::warn!("running with an in-memory store; notifications do not survive restarts");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(&cfg.database_url).await?;

        tracing::info!("Running migrations...");
        db.migrate().await?;
        Arc::new(db)
    };

    let registry = Arc::new(EmitterRegistry::new(store.clone()));

    let keepalive = Duration::from_secs(cfg.keepalive_secs);
    let state = Arc::new(AppState {
        store,
        registry: registry.clone(),
        config: cfg,
    });

    let app = axum::Router::new()
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .nest("/api/v1", api::api_router())
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer({
            use axum::http::{HeaderName, Method};
            use tower_http::cors::AllowOrigin;
            let dashboard_origin = std::env::var("WORKHUB_DASHBOARD_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string());
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str == dashboard_origin
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([Method::GET, Method::PATCH, Method::OPTIONS])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("x-user-id"),
                    HeaderName::from_static("last-event-id"),
                    HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true)
        })
        .layer(axum::middleware::from_fn(request_id_middleware));

    jobs::keepalive::spawn(registry, keepalive);
    tracing::info!(
        "Keep-alive ticker started ({}s interval)",
        keepalive.as_secs()
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("workhub-notify listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware: injects a unique X-Request-Id into every response so clients
/// can correlate errors with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Map the CLI's optional related-entity ids onto a publish request. The
/// first id given picks the factory; any extra ids are applied so the
/// exactly-one validation inside the publisher rejects over-set input.
#[allow(clippy::too_many_arguments)]
fn build_publish_request(
    notification_type: &str,
    title: Option<String>,
    content: Option<String>,
    related_url: Option<String>,
    project_id: Option<i64>,
    project_node_id: Option<i64>,
    post_id: Option<i64>,
    comment_id: Option<i64>,
    cs_qna_id: Option<i64>,
    cs_post_id: Option<i64>,
) -> anyhow::Result<PublishRequest> {
    let ty: NotificationType = notification_type.parse()?;

    let mut request = if let Some(id) = project_id {
        PublishRequest::for_project(ty, id)
    } else if let Some(id) = project_node_id {
        PublishRequest::for_project_node(ty, id)
    } else if let Some(id) = post_id {
        PublishRequest::for_post(ty, id)
    } else if let Some(id) = comment_id {
        PublishRequest::for_comment(ty, id)
    } else if let Some(id) = cs_qna_id {
        PublishRequest::for_cs_qna(ty, id)
    } else if let Some(id) = cs_post_id {
        PublishRequest::for_cs_post(ty, id)
    } else {
        anyhow::bail!("one related entity id is required (e.g. --post-id)");
    };

    // re-apply the remaining ids; the factory consumed exactly one of them
    if let Some(id) = project_node_id {
        if request.project_node_id_ref().is_none() {
            request = request.project_node_id(id);
        }
    }
    if let Some(id) = post_id {
        if request.post_id_ref().is_none() {
            request = request.post_id(id);
        }
    }
    if let Some(id) = comment_id {
        if request.comment_id_ref().is_none() {
            request = request.comment_id(id);
        }
    }
    if let Some(id) = cs_qna_id {
        if request.cs_qna_id_ref().is_none() {
            request = request.cs_qna_id(id);
        }
    }
    if let Some(id) = cs_post_id {
        if request.cs_post_id_ref().is_none() {
            request = request.cs_post_id(id);
        }
    }

    if let Some(title) = title {
        request = request.title(title);
    }
    if let Some(content) = content {
        request = request.content(content);
    }
    if let Some(related_url) = related_url {
        request = request.related_url(related_url);
    }

    Ok(request)
}
