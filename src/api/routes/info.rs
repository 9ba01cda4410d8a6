//! Dashboard details endpoint

use std::net::{IpAddr, Ipv4Addr};

use axum::{Json, extract::State};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::api::{state::ApiState, types::InfoResponse};

/// Address of the interface that routes towards the internet
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub async fn local_lan_ip() -> IpAddr {
    async fn route_towards_internet() -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).await?;
        Ok(socket.local_addr()?.ip())
    }

    route_towards_internet().await.unwrap_or_else(|e| {
        debug!("no LAN address found: {e}");
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    })
}

/// GET /api/info
pub async fn get_info(State(state): State<ApiState>) -> Json<InfoResponse> {
    let config = state.watcher.runtime_config().await;

    Json(InfoResponse {
        ping_target: config.ping_target,
        lan_ip: local_lan_ip().await.to_string(),
        port: state.port,
    })
}
