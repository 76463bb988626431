use endpoint_dispatch::echo::{self, AuthEndpoint, Message, PublicEndpoint};
use endpoint_dispatch::{Client, LoopbackTransport};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Try running with RUST_LOG=debug to see each dispatch stage
    env_logger::init();

    let dispatcher = Arc::new(echo::create_echo_dispatcher()?);
    let registry = dispatcher.registry().clone();
    let client = Client::new(LoopbackTransport::new(dispatcher), registry);

    let reply = client
        .call_authenticated(
            AuthEndpoint,
            "valid",
            Message {
                msg: "hello".to_string(),
            },
        )
        .await?;
    println!("authEndpoint: {}", reply.reply);

    let reply = client
        .call(
            PublicEndpoint,
            Message {
                msg: "world".to_string(),
            },
        )
        .await?;
    println!("publicEndpoint: {}", reply.reply);

    // `client.call(AuthEndpoint, ..)` would not compile: the endpoint needs a token
    match client
        .call_authenticated(
            AuthEndpoint,
            "bad",
            Message {
                msg: "fail".to_string(),
            },
        )
        .await
    {
        Ok(reply) => println!("unexpected success: {}", reply.reply),
        Err(e) => println!("rejected: {}", e),
    }

    Ok(())
}
