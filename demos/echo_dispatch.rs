use endpoint_dispatch::echo::create_echo_dispatcher;
use log::LevelFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .init();

    // Create the echo dispatcher with both endpoints registered
    let dispatcher = create_echo_dispatcher()?;

    // Print what the registry declares
    println!("{}", serde_json::to_string_pretty(&dispatcher.registry().to_json())?);

    let requests = [
        r#"{ "endpoint": "authEndpoint", "token": "valid", "payload": { "msg": "hello" } }"#,
        r#"{ "endpoint": "authEndpoint", "token": "bad", "payload": { "msg": "fail" } }"#,
        r#"{ "endpoint": "authEndpoint", "payload": { "msg": "no token" } }"#,
        r#"{ "endpoint": "publicEndpoint", "payload": { "msg": "world" } }"#,
        r#"{ "endpoint": "publicEndpoint", "payload": { "text": "wrong field" } }"#,
        r#"{ "endpoint": "noSuchEndpoint", "payload": {} }"#,
    ];

    for request in requests {
        // Dispatch the request and print the response
        let response = dispatcher.dispatch(request).await?;
        println!("{}\n  -> {}", request, response);
    }

    Ok(())
}
