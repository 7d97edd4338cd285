use axum::{
    Extension, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{admin, bookings, cars, notifications, offers, users};
use engine::{Engine, EngineError, User};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolve the HTTP Basic credentials into the caller's [`User`].
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = match state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await
    {
        Ok(user) => user,
        Err(EngineError::Database(err)) => {
            tracing::error!("database error during authentication: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Reject authenticated callers that are not admins.
async fn require_admin(
    Extension(user): Extension<User>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !user.is_admin() {
        tracing::debug!(user = %user.id, "admin route refused");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let public = Router::new()
        .route("/users/register", post(users::register))
        .route("/cars", get(cars::search))
        .route("/cars/{id}", get(cars::get))
        .route("/offers", get(offers::active));

    let admin = Router::new()
        .route("/admin/cars", get(cars::list_all).post(cars::add))
        .route("/admin/cars/{id}", patch(cars::update))
        .route("/admin/cars/{id}/active", post(cars::set_active))
        .route("/admin/offers", get(offers::list_all).post(offers::create))
        .route("/admin/offers/{id}", patch(offers::update))
        .route("/admin/bookings", get(bookings::list_all))
        .route("/admin/bookings/{id}/start", post(bookings::start))
        .route("/admin/bookings/{id}/complete", post(bookings::complete))
        .route("/admin/bookings/{id}/cancel", post(bookings::admin_cancel))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", patch(admin::update_user))
        .route("/admin/notifications/broadcast", post(admin::broadcast))
        .route("/admin/reports/summary", get(admin::report_summary))
        .route("/admin/reports/bookings.csv", get(admin::export_bookings))
        .route_layer(middleware::from_fn(require_admin));

    let authenticated = Router::new()
        .route("/users/me", get(users::me).patch(users::update_me))
        .route("/users/me/password", post(users::change_password))
        .route("/users/me/referrals", get(users::referrals))
        .route("/bookings/quote", post(bookings::quote))
        .route("/bookings", post(bookings::create).get(bookings::list))
        .route("/bookings/{id}", get(bookings::get))
        .route("/bookings/{id}/pay", post(bookings::pay))
        .route("/bookings/{id}/cancellation", get(bookings::cancellation))
        .route("/bookings/{id}/cancel", post(bookings::cancel))
        .route("/offers/validate", post(offers::validate))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread", get(notifications::unread))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/notifications/{id}", delete(notifications::remove))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    public.merge(authenticated).with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
