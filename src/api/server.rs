use std::net::SocketAddr;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tracing::{debug, info};

use super::{
    middleware::{cors, log_requests},
    services::{self, ResourceRoute, health},
    state::AppState,
};
use crate::handlers::ResourceKind;

/// Assemble the addon router
///
/// Route gating:
/// - `/manifest.json` and `/{ud}/manifest.json` always exist
/// - each kind with handlers gets its `/{ud}/…` routes
/// - the routes without user data are only added when the manifest does
///   not require configuration
pub fn build_router(state: AppState) -> Router {
    let with_plain_routes = !state.manifest.manifest.requires_configuration();

    let mut router = Router::new()
        .route("/health", get(health))
        .route(
            "/manifest.json",
            get(|State(state): State<AppState>| services::manifest(state, None)),
        )
        .route(
            "/{ud}/manifest.json",
            get(|State(state): State<AppState>, uri: Uri| {
                // Raw segment, the codec does its own unescaping
                let ud = uri.path().trim_start_matches('/').split('/').next().map(str::to_owned);
                services::manifest(state, ud)
            }),
        );

    for kind in ResourceKind::ALL {
        if state.endpoint(kind).is_none() {
            continue;
        }

        for user_data in [true, false] {
            if !user_data && !with_plain_routes {
                continue;
            }
            let extras_variants: &[bool] = if kind.supports_extras() {
                &[false, true]
            } else {
                &[false]
            };

            for &extras in extras_variants {
                let route = ResourceRoute {
                    kind,
                    user_data,
                    extras,
                };
                debug!(path = %route.path(), "Registering route");
                router = router.route(
                    &route.path(),
                    get(
                        move |State(state): State<AppState>, uri: Uri, headers: HeaderMap| {
                            services::resource(state, route, uri, headers)
                        },
                    ),
                );
            }
        }
    }

    if let Some(url) = state.config.server.redirect_url.clone() {
        router = router.route("/", get(move || redirect(url.clone())));
    }

    let logging_enabled = !state.config.logging.disable_request_logging;
    let router = router.layer(cors());
    let router = if logging_enabled {
        router.layer(middleware::from_fn_with_state(state.clone(), log_requests))
    } else {
        router
    };

    router.with_state(state)
}

async fn redirect(url: String) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, url)]).into_response()
}

/// Serve `router` until Ctrl+C or SIGTERM
pub async fn run(address: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!(%address, "Addon listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
