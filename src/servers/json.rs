//! JSON protocol server implementation

use std::net::SocketAddr;

use futures::prelude::*;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::{
    api::json::{message::PanelResponse, ClientConnection},
    global::{ClientName, Global},
};

/// JSON protocol codec definition
mod codec;
use codec::*;

#[derive(Debug, Error)]
pub enum JsonServerError {
    #[error("i/o error: {0}")]
    Io(#[from] futures_io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] JsonCodecError),
}

pub async fn handle_client(
    (socket, peer_addr): (TcpStream, SocketAddr),
    global: Global,
) -> Result<(), JsonServerError> {
    debug!("accepted new connection from {}", peer_addr);

    let framed = Framed::new(socket, JsonCodec::new());
    let (mut writer, mut reader) = framed.split();

    let mut client = ClientConnection::new(ClientName::Json { peer_addr });

    while let Some(request) = reader.next().await {
        trace!("processing request: {:?}", request);

        let reply = match request {
            Ok(request) => {
                let tan = request.tan;

                match client.handle_request(request, &global).await {
                    Ok(Some(response)) => response,
                    Ok(None) => PanelResponse::success(),
                    Err(error) => {
                        error!(error = %error, "error processing request");
                        PanelResponse::error(&error)
                    }
                }
                .with_tan(tan)
            }
            Err(error) => PanelResponse::error(&error),
        };

        trace!("sending response: {:?}", reply);

        writer.send(reply).await?;
    }

    Ok(())
}
