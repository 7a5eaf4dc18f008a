mod save;

use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc};

use thiserror::Error;
use tokio::signal;
use warp::{filters::BoxedFilter, path::FullPath, Filter, Rejection, Reply};

use crate::config::{Configuration, ServerConfiguration};
use crate::storage::StateFile;

pub use save::SaveError;

/// The path segment the game client posts its state to
pub const SAVE_ROUTE: &str = "save";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not start the save server: {0}")]
    Bind(#[from] warp::Error),
}

/// Build every route the server answers. `POST /save` writes the body to
/// `state_file`; when static serving is on, GET and HEAD requests are
/// answered from the web root. Anything else falls through to warp's
/// default rejections.
pub fn routes(
    config: &ServerConfiguration,
    state_file: Arc<StateFile>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let save_route = warp::post()
        .and(warp::path(SAVE_ROUTE))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(config.max_payload_size))
        .and(warp::body::bytes())
        .and(with(state_file))
        .and_then(save::handle_save);

    save_route
        .or(static_files(config))
        .with(warp::log("gamesave::access"))
}

fn static_files(config: &ServerConfiguration) -> BoxedFilter<(warp::fs::File,)> {
    if config.serve_static {
        warp::get()
            .or(warp::head())
            .unify()
            .and(visible_path())
            .and(warp::fs::dir(config.web_root.clone()))
            .boxed()
    } else {
        warp::any()
            .and_then(|| async { Err::<warp::fs::File, Rejection>(warp::reject::not_found()) })
            .boxed()
    }
}

/// Rejects paths with a dot-prefixed segment, which covers the staging file
/// of a save in progress.
fn visible_path() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and_then(|path: FullPath| async move {
            let hidden = path.as_str().split('/').any(|segment| {
                segment.starts_with('.') || segment.to_ascii_lowercase().starts_with("%2e")
            });
            if hidden {
                Err(warp::reject::not_found())
            } else {
                Ok(())
            }
        })
        .untuple_one()
}

/// Bind the listener without starting to serve. The returned future serves
/// requests until `shutdown` resolves, then lets in-flight requests finish.
pub fn bind(
    configuration: &Configuration,
    state_file: Arc<StateFile>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()>), ServerError> {
    let routes = routes(&configuration.server, state_file);
    let (address, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(configuration.server.listen_address, shutdown)?;

    Ok((address, server))
}

/// Run the save server until the process receives Ctrl-C.
pub async fn run(configuration: Configuration) -> Result<(), ServerError> {
    let state_file = Arc::new(StateFile::from_config(&configuration.storage));

    match state_file.load().await {
        Ok(Some(state)) => info!(
            "Found an existing save at {} ({} bytes)",
            state_file.path().display(),
            state.len()
        ),
        Ok(None) => info!(
            "No save at {} yet, it will be created on the first save",
            state_file.path().display()
        ),
        Err(e) => warn!("{e}"),
    }

    let (address, server) = bind(&configuration, state_file, shutdown_signal())?;

    println!("Save server active on http://{address}");
    info!("Accepting game state on POST /{SAVE_ROUTE}");
    if configuration.server.serve_static {
        info!(
            "Serving static files from {}",
            configuration.server.web_root.display()
        );
    }

    server.await;

    info!("Save server shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        // Without a signal handler the server just runs until it is killed
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

fn with<T>(item: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone
where
    T: Send + Sync + Clone,
{
    warp::any().map(move || item.clone())
}
