use super::Lobby;
use super::Ruleset;
use super::session;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::web;
use fp_core::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NewRoomQuery {
    ruleset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    id: PlayerId,
    name: String,
    room: String,
}

/// POST /new?ruleset=fixed|elimination — open a room, return its code.
pub async fn new_room(lobby: web::Data<Lobby>, query: web::Query<NewRoomQuery>) -> HttpResponse {
    let ruleset = match query.ruleset.as_deref() {
        None => Ruleset::default(),
        Some(s) => match s.parse::<Ruleset>() {
            Ok(ruleset) => ruleset,
            Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
        },
    };
    match lobby.open(ruleset).await {
        Ok(code) => HttpResponse::Ok().json(serde_json::json!({ "room_code": code })),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// GET /ws?id=..&name=..&room=.. — upgrade and seat the player.
/// Seating failures are reported over the socket itself, after the
/// upgrade, so the client always gets a frame it can display.
pub async fn join(
    lobby: web::Data<Lobby>,
    query: web::Query<JoinQuery>,
    body: web::Payload,
    req: HttpRequest,
) -> HttpResponse {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            match session::bridge(&lobby, &query.room, query.id, &query.name, session, stream)
                .await
            {
                Ok(()) => response,
                Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
            }
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
