//! Web endpoint for the browser panel: websocket + JSON-RPC versions of the
//! panel protocol, and static serving of the panel bundle

use std::net::SocketAddr;

use futures::{Future, SinkExt, StreamExt};
use warp::{Filter, Rejection};

use crate::{
    api::json::message::PanelMessage,
    global::{Global, Paths},
    models::WebConfig,
};

mod session;
use session::*;

const MAX_SESSIONS: usize = 64;

pub async fn bind(
    global: Global,
    config: &WebConfig,
    paths: &Paths,
) -> Result<impl Future<Output = ()>, std::io::Error> {
    let session_store = SessionStore::new(MAX_SESSIONS);

    let ws = warp::ws()
        .and(session_store.request())
        .and(warp::filters::addr::remote())
        .and({
            let global = global.clone();
            warp::any().map(move || global.clone())
        })
        .map(
            |ws: warp::ws::Ws,
             session: SessionInstance,
             _remote: Option<SocketAddr>,
             global: Global| {
                (
                    ws.on_upgrade({
                        let session = session.session().clone();

                        move |websocket| {
                            let (mut tx, mut rx) = websocket.split();

                            async move {
                                while let Some(result) = rx.next().await {
                                    if let Some(message) =
                                        session.write().await.handle_result(&global, result).await
                                    {
                                        if let Err(error) = tx.send(message).await {
                                            warn!(error = %error, "websocket error");
                                        }
                                    } else {
                                        break;
                                    }
                                }
                            }
                        }
                    }),
                    session,
                )
            },
        )
        .untuple_one()
        .and_then(reply_session);

    let json_rpc = warp::path("json-rpc")
        .and(warp::post())
        .and(session_store.request())
        .and({
            let global = global.clone();
            warp::any().map(move || global.clone())
        })
        .and(warp::body::json())
        .and_then(
            |session: SessionInstance, global: Global, request: PanelMessage| async move {
                let response = session
                    .session()
                    .write()
                    .await
                    .handle_request(&global, request)
                    .await;

                Ok::<_, Rejection>((warp::reply::json(&response), session))
            },
        )
        .untuple_one()
        .and_then(reply_session);

    let files = warp::fs::dir(paths.resolve_path(if config.document_root.is_empty() {
        WebConfig::DEFAULT_DOCUMENT_ROOT
    } else {
        config.document_root.as_str()
    }));

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(address).await;

    match listener {
        Ok(listener) => {
            info!(address = %address, "panel web server listening");
            Ok(warp::serve(
                ws.or(json_rpc)
                    .or(files)
                    .with(warp::filters::log::log("ledvirt::web")),
            )
            .run_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener)))
        }
        Err(error) => Err(error),
    }
}
