//! Dispatch protocol behaviour: ordering of lookup, validation and the
//! authorization gate, and what each stage is allowed to call.

use endpoint_dispatch::echo::{self, Message, Reply, User};
use endpoint_dispatch::{
    AuthError, AuthKind, Authenticator, Dispatcher, Error, Handler, HandlerError, HandlerSet,
    Registry, Request, Result, Shape, ValidationError, handle,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_test::{assert_err, assert_ok};

/// Counts authenticator and handler invocations
#[derive(Clone, Default)]
struct Calls {
    auth: Arc<AtomicUsize>,
    handler: Arc<AtomicUsize>,
}

impl Calls {
    fn auth(&self) -> usize {
        self.auth.load(Ordering::SeqCst)
    }

    fn handler(&self) -> usize {
        self.handler.load(Ordering::SeqCst)
    }
}

/// Echo API whose authenticator and handlers record their calls
fn counted_echo(calls: &Calls) -> Result<Dispatcher<impl Authenticator<Identity = User>>> {
    let auth_calls = calls.auth.clone();
    let authenticator = move |token: String| {
        auth_calls.fetch_add(1, Ordering::SeqCst);
        echo::verify_token(token)
    };

    let mut handlers: HandlerSet<User> = HandlerSet::new();

    let counter = calls.handler.clone();
    handlers.authenticated(echo::AuthEndpoint, move |user: User, input: Message| {
        counter.fetch_add(1, Ordering::SeqCst);
        echo::auth_reply(user, input)
    })?;

    let counter = calls.handler.clone();
    handlers.public(echo::PublicEndpoint, move |input: Message| {
        counter.fetch_add(1, Ordering::SeqCst);
        echo::public_reply(input)
    })?;

    Dispatcher::new(Arc::new(echo::registry()?), authenticator, handlers)
}

#[tokio::test]
async fn test_scenario() -> Result<()> {
    let dispatcher = echo::create_echo_dispatcher()?;

    let output = dispatcher
        .handle(Request::new("authEndpoint", json!({ "msg": "hello" })).with_token("valid"))
        .await?;
    assert_eq!(output, json!({ "reply": "auth: user1 - hello" }));

    let result = dispatcher
        .handle(Request::new("authEndpoint", json!({ "msg": "fail" })).with_token("bad"))
        .await;
    match result {
        Err(Error::AuthenticationFailed(reason)) => assert_eq!(reason.message, "Invalid token"),
        other => panic!("Expected AuthenticationFailed, got {:?}", other),
    }

    let output = dispatcher
        .handle(Request::new("publicEndpoint", json!({ "msg": "world" })))
        .await?;
    assert_eq!(output, json!({ "reply": "public: world" }));

    let result = dispatcher
        .handle(Request::new("noSuchEndpoint", json!({ "msg": "?" })))
        .await;
    assert!(matches!(result, Err(Error::UnknownEndpoint(name)) if name == "noSuchEndpoint"));

    Ok(())
}

#[tokio::test]
async fn test_public_endpoint_never_authenticates() -> Result<()> {
    let calls = Calls::default();
    let dispatcher = counted_echo(&calls)?;

    for token in [None, Some("valid"), Some("bad")] {
        let mut request = Request::new("publicEndpoint", json!({ "msg": "m" }));
        request.token = token.map(str::to_string);

        let output = assert_ok!(dispatcher.handle(request).await);
        assert_eq!(output, json!({ "reply": "public: m" }));
    }

    assert_eq!(calls.auth(), 0);
    assert_eq!(calls.handler(), 3);

    Ok(())
}

#[tokio::test]
async fn test_missing_token_skips_authenticator() -> Result<()> {
    let calls = Calls::default();
    let dispatcher = counted_echo(&calls)?;

    let err = assert_err!(
        dispatcher
            .handle(Request::new("authEndpoint", json!({ "msg": "m" })))
            .await
    );

    assert!(matches!(err, Error::TokenRequired(name) if name == "authEndpoint"));
    assert_eq!(calls.auth(), 0);
    assert_eq!(calls.handler(), 0);

    Ok(())
}

#[tokio::test]
async fn test_failed_authentication_skips_handler() -> Result<()> {
    let calls = Calls::default();
    let dispatcher = counted_echo(&calls)?;

    let err = assert_err!(
        dispatcher
            .handle(Request::new("authEndpoint", json!({ "msg": "m" })).with_token("expired"))
            .await
    );

    assert!(matches!(err, Error::AuthenticationFailed(_)));
    assert_eq!(calls.auth(), 1);
    assert_eq!(calls.handler(), 0);

    Ok(())
}

#[tokio::test]
async fn test_invalid_input_skips_authenticator_and_handler() -> Result<()> {
    let calls = Calls::default();
    let dispatcher = counted_echo(&calls)?;

    let bad_payloads = [json!(null), json!("hello"), json!({ "msg": 5 }), json!({})];

    for payload in bad_payloads {
        for endpoint in ["authEndpoint", "publicEndpoint"] {
            let request = Request::new(endpoint, payload.clone()).with_token("valid");
            let err = assert_err!(dispatcher.handle(request).await);
            assert!(matches!(err, Error::InvalidInput(_)), "{} accepted {}", endpoint, payload);
        }
    }

    assert_eq!(calls.auth(), 0);
    assert_eq!(calls.handler(), 0);

    Ok(())
}

#[tokio::test]
async fn test_authenticated_call_invokes_each_once() -> Result<()> {
    let calls = Calls::default();
    let dispatcher = counted_echo(&calls)?;

    dispatcher
        .handle(Request::new("authEndpoint", json!({ "msg": "m" })).with_token("valid"))
        .await?;

    assert_eq!(calls.auth(), 1);
    assert_eq!(calls.handler(), 1);

    Ok(())
}

#[tokio::test]
async fn test_identical_requests_give_identical_results() -> Result<()> {
    let dispatcher = echo::create_echo_dispatcher()?;

    let request = Request::new("authEndpoint", json!({ "msg": "again" })).with_token("valid");
    let first = dispatcher.handle(request.clone()).await?;
    let second = dispatcher.handle(request).await?;
    assert_eq!(first, second);

    let request = Request::new("authEndpoint", json!({ "msg": "again" })).with_token("bad");
    let first = dispatcher.handle(request.clone()).await.unwrap_err().to_string();
    let second = dispatcher.handle(request).await.unwrap_err().to_string();
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_handler_failure_is_not_reinterpreted() -> Result<()> {
    let registry = echo::registry()?;
    let mut handlers: HandlerSet<User> = HandlerSet::new();
    handlers
        .authenticated(echo::AuthEndpoint, |_user: User, _input: Message| async move {
            Err::<Reply, _>(HandlerError::new("quota exceeded"))
        })?
        .public(echo::PublicEndpoint, echo::public_reply)?;

    let request = Request::new("authEndpoint", json!({ "msg": "m" })).with_token("valid");
    let result = handle(&registry, &echo::verify_token, &handlers, request).await;

    match result {
        Err(Error::HandlerFailure(err)) => assert_eq!(err.message, "quota exceeded"),
        other => panic!("Expected HandlerFailure, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_validator_normalizes_before_handler() -> Result<()> {
    // Trims the message before the handler sees it
    let trimming = Shape::new(
        json!({ "type": "object" }),
        |value: Value| -> std::result::Result<Value, ValidationError> {
            let msg = value
                .get("msg")
                .and_then(Value::as_str)
                .ok_or_else(|| ValidationError::new("msg must be a string").at("msg"))?;
            Ok(json!({ "msg": msg.trim() }))
        },
    );

    let registry = Arc::new(
        Registry::builder()
            .register("trimmed", trimming, Shape::any(), AuthKind::Authenticated)?
            .build(),
    );

    let mut handlers: HandlerSet<User> = HandlerSet::new();
    handlers.insert(
        "trimmed",
        Handler::authenticated_fn(|user: User, payload: Value| async move {
            Ok(json!({ "user": user.id, "payload": payload }))
        }),
    )?;

    let authenticator = |token: String| async move {
        if token == "t" {
            Ok(User { id: "u".to_string() })
        } else {
            Err(AuthError::new("nope"))
        }
    };

    let dispatcher = Dispatcher::new(registry, authenticator, handlers)?;

    let output = dispatcher
        .handle(Request::new("trimmed", json!({ "msg": "  padded  " })).with_token("t"))
        .await?;
    assert_eq!(output, json!({ "user": "u", "payload": { "msg": "padded" } }));

    let err = assert_err!(
        dispatcher
            .handle(Request::new("trimmed", json!({ "msg": 1 })).with_token("t"))
            .await
    );
    match err {
        Error::InvalidInput(reason) => assert_eq!(reason.path.as_deref(), Some("msg")),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests_share_dispatcher() -> Result<()> {
    let dispatcher = Arc::new(echo::create_echo_dispatcher()?);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let request = Request::new("authEndpoint", json!({ "msg": format!("m{}", i) }))
                    .with_token("valid");
                dispatcher.handle(request).await
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let output = task.await.expect("task panicked")?;
        assert_eq!(output, json!({ "reply": format!("auth: user1 - m{}", i) }));
    }

    Ok(())
}

#[tokio::test]
async fn test_typed_handler_input_checked_before_authenticator() -> Result<()> {
    // Registry accepts anything; the typed handler still needs a `Message`
    let registry = Arc::new(
        Registry::builder()
            .register("authEndpoint", Shape::any(), Shape::any(), AuthKind::Authenticated)?
            .register("publicEndpoint", Shape::any(), Shape::any(), AuthKind::Public)?
            .build(),
    );

    let calls = Calls::default();
    let auth_calls = calls.auth.clone();
    let authenticator = move |token: String| {
        auth_calls.fetch_add(1, Ordering::SeqCst);
        echo::verify_token(token)
    };

    let mut handlers: HandlerSet<User> = HandlerSet::new();
    let counter = calls.handler.clone();
    handlers.authenticated(echo::AuthEndpoint, move |user: User, input: Message| {
        counter.fetch_add(1, Ordering::SeqCst);
        echo::auth_reply(user, input)
    })?;
    handlers.public(echo::PublicEndpoint, echo::public_reply)?;

    let dispatcher = Dispatcher::new(registry, authenticator, handlers)?;

    let err = assert_err!(
        dispatcher
            .handle(Request::new("authEndpoint", json!({ "nope": 1 })).with_token("valid"))
            .await
    );
    match err {
        Error::InvalidInput(reason) => assert!(reason.message.contains("msg")),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
    assert_eq!(calls.auth(), 0);
    assert_eq!(calls.handler(), 0);

    // Invalid input is reported ahead of a missing token
    let err = assert_err!(
        dispatcher
            .handle(Request::new("authEndpoint", json!({ "nope": 1 })))
            .await
    );
    assert!(matches!(err, Error::InvalidInput(_)));

    let output = dispatcher
        .handle(Request::new("authEndpoint", json!({ "msg": "ok" })).with_token("valid"))
        .await?;
    assert_eq!(output, json!({ "reply": "auth: user1 - ok" }));
    assert_eq!(calls.auth(), 1);
    assert_eq!(calls.handler(), 1);

    Ok(())
}
