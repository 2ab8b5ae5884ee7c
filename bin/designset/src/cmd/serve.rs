//! Serve command - JSON render API and preview server

use color_eyre::eyre::{Result, WrapErr};
use designset_core::Settings;
use tokio::net::TcpListener;

use crate::server::{AppState, create_router};

/// Run the serve command.
pub async fn run(settings: Settings) -> Result<()> {
    let addr = settings.server.bind.clone();
    let root = settings.designsets.root.clone();
    tracing::info!(%addr, root = %root.display(), "Starting server");

    let state = AppState::new(settings).wrap_err("Failed to initialise renderer")?;
    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Design-set server running at http://{addr}");
    println!("  Design sets:  {}", root.display());
    println!("  Render API:   POST http://{addr}/api/render");
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}
