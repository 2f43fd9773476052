use http::{Method, StatusCode};
use micro_router::{error_fn, handler_fn, param_fn, Dispatch, Flow, RequestContext, ResponseContext, Router};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let api = Router::builder()
        .merge_params(true)
        .param(
            "id",
            param_fn(|req, _res, raw, name| {
                let resolved = format!("user-{raw}");
                Box::pin(async move {
                    req.params_mut().insert(name, resolved);
                    Ok(Flow::Next)
                })
            }),
        )
        .get(
            "/users/:id",
            handler_fn(|req, res| {
                Box::pin(async move {
                    let id = req.params().get("id").unwrap_or("unknown").to_string();
                    res.send(format!("hello, {id}\r\n"));
                    Ok(Flow::Done)
                })
            }),
        )
        .get(
            "/fail",
            handler_fn(|_req, _res| Box::pin(async { Err(micro_router::RouteError::msg("deliberate failure")) })),
        )
        .build()
        .expect("api patterns are valid");

    let router = Router::builder()
        .middleware(handler_fn(|req, _res| {
            let line = format!("{} {}", req.method(), req.path());
            Box::pin(async move {
                info!(request = %line, "incoming");
                Ok(Flow::Next)
            })
        }))
        .scope("/api", api)
        .error_middleware(error_fn(|err, _req, res| {
            Box::pin(async move {
                res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                res.send(format!("error: {err}\r\n"));
                Ok(Flow::Done)
            })
        }))
        .build()
        .expect("router patterns are valid");

    for path in ["/api/users/42", "/api/fail", "/missing"] {
        let mut req = RequestContext::new(Method::GET, path);
        let mut res = ResponseContext::new();
        match router.handle(&mut req, &mut res).await {
            Ok(Dispatch::Handled) => {
                let response = res.into_response();
                info!(path, status = %response.status(), body = %String::from_utf8_lossy(response.body()), "handled");
            }
            Ok(Dispatch::Unmatched) => info!(path, "no route matched"),
            Err(e) => info!(path, cause = %e, "unhandled error"),
        }
    }
}
