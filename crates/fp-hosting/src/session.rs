use super::Lobby;
use fp_core::*;
use fp_gameroom::*;
use tokio::sync::mpsc::unbounded_channel;

/// Bridge one accepted WebSocket to a seat in a room.
///
/// The seat's outbound half is an unbounded channel drained here into
/// the socket; inbound text frames run through the protocol against the
/// room under its mutex, one at a time. When the socket goes away for
/// any reason the seat is marked disconnected.
pub async fn bridge(
    lobby: &Lobby,
    code: &str,
    id: PlayerId,
    name: &str,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) -> anyhow::Result<()> {
    use futures::StreamExt;
    let Some(room) = lobby.find(code).await else {
        refuse(session, "room not found").await;
        return Ok(());
    };
    let (tx, mut rx) = unbounded_channel::<String>();
    if let Err(e) = room.lock().await.connect(id, name, tx) {
        refuse(session, &e.to_string()).await;
        return Ok(());
    }
    log::debug!("[bridge {}] player {} connected", code, id);
    let code = code.to_string();
    actix_web::rt::spawn(async move {
        'sesh: loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(json) => if session.text(json).await.is_err() { break 'sesh },
                    None => break 'sesh,
                },
                msg = stream.next() => match msg {
                    Some(Ok(actix_ws::Message::Text(text))) => {
                        let reply = Protocol::apply(&mut *room.lock().await, id, &text);
                        if session.text(reply).await.is_err() { break 'sesh }
                    }
                    Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                    Some(Err(_)) => break 'sesh,
                    None => break 'sesh,
                    _ => continue 'sesh,
                },
            }
        }
        room.lock().await.disconnect(id);
        log::debug!("[bridge {}] player {} disconnected", code, id);
    });
    Ok(())
}

/// Turn away a socket that cannot be seated: one explanatory frame,
/// then a clean close.
pub async fn refuse(mut session: actix_ws::Session, reason: &str) {
    let _ = session.text(Frame::refusal(reason).to_json()).await;
    let _ = session.close(None).await;
}
