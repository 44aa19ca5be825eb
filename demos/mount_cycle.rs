use render_host::config::LogLevel;
use render_host::render::backends::null::NullEngine;
use render_host::surface::headless::{HeadlessContainer, HeadlessSurface};
use render_host::{Bootstrap, CanvasView, HostConfig, HostError, HostEvent, Mounted, StaticModule};
use std::time::Duration;
use tokio::task::LocalSet;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), HostError> {
    // Everything in the host runs on one thread. The asynchronous engine handshake is
    // spawned as a local task, so all mounts happen inside a LocalSet.
    let local = LocalSet::new();
    local.run_until(run()).await
}

async fn run() -> Result<(), HostError> {
    let config = HostConfig::from_json_str(
        r#"{ "surface": { "display": { "width": 500, "height": 500 } }, "log_level": "debug" }"#,
    )?;

    // Bring up the engine module once for the whole process. The static module has nothing
    // to load; its global hook installs the logger.
    Bootstrap::global()
        .initialize(&StaticModule::with_logging(config.log_level))
        .await?;

    // A headless container stands in for the UI tree node the view is mounted into.
    let container = HeadlessContainer::new();

    // First a view whose engine is constructed synchronously. Mount provisions the surface,
    // binds the engine and renders once before returning.
    let mut view = CanvasView::with_config(
        config.clone(),
        NullEngine::<HeadlessSurface>::constructor(),
        Bootstrap::global(),
    )?;
    let mut events = view.subscribe_events();

    let mounted = view.mount(Some(&container))?;
    log::info!("sync mount: ready={} state={}", mounted.is_ready(), view.state());
    view.unmount();
    log::info!("sync unmount: state={} attached surfaces={}", view.state(), container.len());

    // Now a view whose engine needs a 50ms handshake.
    let mut view = CanvasView::with_config(
        config,
        NullEngine::<HeadlessSurface>::factory(Duration::from_millis(50)),
        Bootstrap::global(),
    )?;

    // Mount and wait for the handshake.
    view.mount(Some(&container))?.ready().await?;
    log::info!("async mount: state={}", view.state());
    view.unmount();

    // Mount again but unmount before the handshake completes. The surface goes away at once,
    // and the engine is disposed as soon as it shows up, without ever rendering.
    if let Mounted::Pending(pending) = view.mount(Some(&container))? {
        view.unmount();
        log::info!("abandoned mount: state={} attached surfaces={}", view.state(), container.len());
        match pending.wait().await {
            Err(HostError::Abandoned) => log::info!("late engine disposed"),
            other => log::warn!("unexpected handshake result: {:?}", other),
        }
    }
    log::info!("final state: {}", view.state());

    // Events of the first view
    while let Ok(event) = events.try_recv() {
        if let HostEvent::StateChanged { instance, from, to } = event {
            log::debug!("instance {}: {} -> {}", instance, from, to);
        }
    }

    Ok(())
}
