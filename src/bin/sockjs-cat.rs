//! Line-oriented client for the raw WebSocket endpoint.
//!
//! Every stdin line goes out as one message; every message received is
//! printed on its own line.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "sockjs-cat")]
#[command(about = "Pipe stdin to a SockJS raw WebSocket endpoint", long_about = None)]
struct Cli {
    /// Endpoint URL, e.g. ws://localhost:8080/echo/websocket
    url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (socket, _) = connect_async(cli.url.as_str()).await?;
    let (mut sink, mut stream) = socket.split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => sink.send(Message::text(line)).await?,
                None => {
                    stdin_open = false;
                    sink.send(Message::Close(None)).await?;
                }
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => println!("{}", text.as_str()),
                Some(Ok(Message::Close(frame))) => {
                    if let Some(frame) = frame {
                        eprintln!("closed: {} {}", u16::from(frame.code), frame.reason.as_str());
                    }
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }
    Ok(())
}
