// apiserver.rs

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{Response, StatusCode, header},
    response::IntoResponse,
    routing::*,
};

use crate::*;

pub fn api_router(state: Arc<MyState>) -> Router {
    Router::new().route("/", get(get_root)).with_state(state)
}

pub async fn run_api_server(state: Arc<MyState>) -> anyhow::Result<()> {
    let listen = format!("0.0.0.0:{}", state.config.http_port);
    let addr = listen.parse::<net::SocketAddr>()?;

    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP enabled (port: {}).", addr.port());
    Ok(axum::serve(
        listener,
        app.into_make_service_with_connect_info::<net::SocketAddr>(),
    )
    .await?)
}

pub async fn get_root(
    State(state): State<Arc<MyState>>,
    ConnectInfo(peer): ConnectInfo<net::SocketAddr>,
) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    debug!("#{cnt} get_root()");

    let requestor = peer.to_string();
    match json_report(&state.config, &requestor) {
        Ok((json, temperature)) => {
            info!(
                "#{cnt} Request from: {requestor}, reported temperature {temperature:.3} {unit}.",
                unit = state.config.unit
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                format!("{json}\n"),
            )
                .into_response()
        }
        Err(e) => {
            // details stay in the log
            error!("#{cnt} Could not read temperature for {requestor}: {e}.");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "Internal Server Error\n",
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use axum::http::Request;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    use super::*;

    async fn call(state: Arc<MyState>, uri: &str, peer: &str) -> (StatusCode, String) {
        let mut req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(peer.parse::<net::SocketAddr>().unwrap()));

        let resp = api_router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_reports_temperature_and_peer() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"23456\n").unwrap();
        let state = Arc::new(MyState::new(MyConfig::for_test(f.path(), TempUnit::Celsius)));

        let (status, body) = call(state.clone(), "/", "1.2.3.4:5555").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.ends_with("}\n"));

        let report: TempReport = serde_json::from_str(body.trim_end()).unwrap();
        assert_eq!(report.temperature, 23.456);
        assert_eq!(report.requestor, "1.2.3.4:5555");
        assert_eq!(state.api_cnt.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn missing_sensor_is_a_generic_500() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        let state = Arc::new(MyState::new(MyConfig::for_test(&path, TempUnit::Celsius)));

        let (status, body) = call(state, "/", "1.2.3.4:5555").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error\n");
    }

    #[tokio::test]
    async fn requests_are_numbered_on_both_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        let state = Arc::new(MyState::new(MyConfig::for_test(&path, TempUnit::Celsius)));

        let (status, _) = call(state.clone(), "/", "1.2.3.4:5555").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        std::fs::write(&path, "1000\n").unwrap();
        let (status, _) = call(state.clone(), "/", "1.2.3.4:5556").await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(state.api_cnt.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let f = NamedTempFile::new().unwrap();
        let state = Arc::new(MyState::new(MyConfig::for_test(f.path(), TempUnit::Celsius)));

        let (status, _) = call(state.clone(), "/temp", "1.2.3.4:5555").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.api_cnt.load(Ordering::Relaxed), 0);
    }
}

// EOF
