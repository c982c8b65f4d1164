//! TCP server plumbing for the panel protocol endpoints

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::{global::Global, models::ServerConfig};

pub mod json;

/// Handle to a bound server; the listener task aborts when this is dropped
pub struct ServerHandle {
    join: JoinHandle<()>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

pub async fn bind<C, H, F, E>(
    name: &'static str,
    config: C,
    global: Global,
    handle_client: H,
) -> Result<ServerHandle, std::io::Error>
where
    C: ServerConfig,
    H: Fn((TcpStream, SocketAddr), Global) -> F + Send + Sync + 'static,
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let address = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let listener = TcpListener::bind(&address).await?;

    info!(server = %name, address = %address, "server listening");

    let join = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    let client = handle_client((socket, peer_addr), global.clone());

                    tokio::spawn(async move {
                        if let Err(error) = client.await {
                            warn!(server = %name, peer = %peer_addr, error = %error, "client error");
                        }
                    });
                }
                Err(error) => {
                    error!(server = %name, error = %error, "accept failed");
                    break;
                }
            }
        }
    });

    Ok(ServerHandle { join })
}
