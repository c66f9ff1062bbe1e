//! In-process WebSocket scan gateway shared by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use meetscan_shared::ScanFrame;
use tokio::sync::broadcast;

pub const WAIT: Duration = Duration::from_secs(5);
pub const RETRY: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub enum GatewayCommand {
    Send(String),
    CloseAll,
}

#[derive(Clone)]
pub struct Gateway {
    connections: Arc<AtomicUsize>,
    commands: broadcast::Sender<GatewayCommand>,
}

impl Gateway {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn send(&self, text: impl Into<String>) {
        let _ = self.commands.send(GatewayCommand::Send(text.into()));
    }

    pub fn scan(&self, uid: &str, reader_id: Option<&str>) {
        let frame = ScanFrame::new(uid, reader_id);
        self.send(serde_json::to_string(&frame).unwrap());
    }

    pub fn close_all(&self) {
        let _ = self.commands.send(GatewayCommand::CloseAll);
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(gateway): State<Gateway>) -> Response {
    // Subscribe before the handshake completes so no command is missed.
    let commands = gateway.commands.subscribe();
    gateway.connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| serve(socket, commands))
}

async fn serve(mut socket: WebSocket, mut commands: broadcast::Receiver<GatewayCommand>) {
    while let Ok(command) = commands.recv().await {
        match command {
            GatewayCommand::Send(text) => {
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            GatewayCommand::CloseAll => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }
}

pub async fn spawn_gateway() -> (Gateway, SocketAddr) {
    let (commands, _) = broadcast::channel(64);
    let gateway = Gateway {
        connections: Arc::new(AtomicUsize::new(0)),
        commands,
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(gateway.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (gateway, addr)
}

pub fn scan_url(addr: SocketAddr) -> String {
    format!("ws://{addr}/ws")
}
