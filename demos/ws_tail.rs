//! Tail messages from a WebSocket endpoint.
//!
//! ```text
//! cargo run --example ws_tail -- 'wss://localhost/v1/uploads/{id}?websocket=true' \
//!     --auth 'Bearer <token>' --insecure
//! ```

use wsession::{CloseCode, Endpoint, Event, Session, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut address = None;
    let mut auth = None;
    let mut insecure = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--auth" => auth = args.next(),
            "--insecure" => insecure = true,
            _ => address = Some(arg),
        }
    }
    let address = address.ok_or("usage: ws_tail <address> [--auth <token>] [--insecure]")?;

    let mut endpoint = Endpoint::parse(&address)?;
    if let Some(token) = &auth {
        endpoint = endpoint.header("Authorization", token);
    }

    let config = SessionConfig {
        tls_verify: !insecure,
        ..SessionConfig::new()
    };

    let session = Session::connect(endpoint, config, |event: Event| match event {
        Event::Opened => println!("-- connected"),
        Event::MessageReceived { payload } => {
            println!("< {}", String::from_utf8_lossy(&payload));
        }
        Event::Error { error } => eprintln!("-- error: {error}"),
        Event::Closed { reason, .. } => println!("-- closed: {reason}"),
    })?;

    tokio::signal::ctrl_c().await?;
    session.close(CloseCode::NORMAL, "interrupted");
    session.closed().await;
    Ok(())
}
