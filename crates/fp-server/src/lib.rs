//! Hosting Server
//!
//! Exposes room creation over HTTP and gameplay over WebSocket on a
//! single actix-web server, with a background sweep that closes idle
//! rooms.
//!
//! ## Routes
//!
//! - `POST /new?ruleset=fixed|elimination` — open a room
//! - `GET /ws?id=..&name=..&room=..` — join a room over WebSocket
//! - `GET /health` — liveness probe

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use fp_core::SWEEP_INTERVAL;
use fp_hosting::Lobby;

async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[rustfmt::skip]
pub async fn run() -> Result<(), std::io::Error> {
    let lobby = web::Data::new(Lobby::new());
    let sweeper = lobby.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweeper.sweep().await;
        }
    });
    log::info!("starting hosting server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(lobby.clone())
            .route("/health", web::get().to(health))
            .route("/new", web::post().to(fp_hosting::new_room))
            .route("/ws", web::get().to(fp_hosting::join))
    })
    .bind(std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()))?
    .run()
    .await
}
