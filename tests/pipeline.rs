//! End-to-end behavior of a router carrying the agent layer and a
//! discovery root, driven through `Router::handle`.

use hac::{
    Action, AgentContext, BlastRadius, Discovery, DiscoveryDocument, ErrorEnvelope, HacError,
    MEDIA_TYPE, MatchedRoute, Method, Mutability, Request, Response, Router, Safety, Status,
    SuccessEnvelope, is_agent_requested,
};

fn app() -> Router {
    let registry = hac::Registry::new();
    registry.get("/users").description("All users.").register();
    registry.post("/users").register();
    registry.get("/users/{id}")
        .description("A user account.")
        .action(
            Action::new("delete", "DELETE", "/users/{id}")
                .safety(Safety::new(Mutability::Irreversible, BlastRadius::SelfOnly).confirm()),
        )
        .register();
    registry.delete("/users/{id}").register();
    registry.get("/orders").description("All orders.").register();

    let discovery = Discovery::generate("Test API", "1.0", "Integration fixture.", &registry);

    let api = Router::new()
        .get("/users", |_req: Request| async { Response::json(b"[]".to_vec()) })
        .post("/users", |_req: Request| async {
            Response::builder().status(Status::Created).json(br#"{"id":3}"#.to_vec())
        })
        .get("/users/{id}", get_user)
        .delete("/users/{id}", |_req: Request| async { Response::status(Status::NoContent) })
        .get("/orders", |_req: Request| async { Response::json(b"[]".to_vec()) })
        .get("/health", |_req: Request| async { Response::json(br#"{"ok":true}"#.to_vec()) })
        .layer(AgentContext::new(registry).path_resolver(MatchedRoute));

    Router::new()
        .get("/", discovery.handler())
        .fallback(api.into_handler())
}

async fn get_user(req: Request) -> Response {
    let flag = is_agent_requested(&req);
    match req.param("id") {
        Some("500") => Response::builder()
            .status(Status::InternalServerError)
            .json(br#"{"code":"db_down","message":"database unavailable"}"#.to_vec()),
        Some(id) if id != "0" => Response::builder()
            .header("x-agent", if flag { "1" } else { "0" })
            .json(format!(r#"{{"id":{id},"name":"Alice"}}"#).into_bytes()),
        _ => Response::status(Status::NotFound),
    }
}

fn request(method: Method, path: &str, accept: &str) -> Request {
    Request::builder(method, path).header("accept", accept).build()
}

#[tokio::test]
async fn browsers_see_plain_json() {
    let res = app().handle(request(Method::Get, "/users/1", "text/html, */*")).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.header("x-agent"), Some("0"));
    assert_eq!(res.body(), br#"{"id":1,"name":"Alice"}"#);
}

#[tokio::test]
async fn agents_get_envelope_with_actions() {
    let res = app().handle(request(Method::Get, "/users/1", MEDIA_TYPE)).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(res.header("content-type"), Some(MEDIA_TYPE));
    assert_eq!(res.header("vary"), Some("Accept"));
    assert_eq!(res.header("x-agent"), Some("1"));

    let env: SuccessEnvelope = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(env.data.map(|d| d.get().to_owned()).as_deref(), Some(r#"{"id":1,"name":"Alice"}"#));
    assert_eq!(env.meta.version, "1.0");
    assert_eq!(env.meta.description.as_deref(), Some("A user account."));
    let delete = &env.meta.actions[0];
    assert_eq!((delete.rel.as_str(), delete.method.as_str()), ("delete", "DELETE"));
    let safety = delete.safety.as_ref().unwrap();
    assert_eq!(safety.mutability, Mutability::Irreversible);
    assert!(safety.confirmation_recommended);
}

#[tokio::test]
async fn created_collapses_to_ok_and_no_content_to_null() {
    let res = app().handle(request(Method::Post, "/users", MEDIA_TYPE)).await;
    assert_eq!(res.status_code(), 200);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["data"]["id"], 3);

    let res = app().handle(request(Method::Delete, "/users/1", MEDIA_TYPE)).await;
    assert_eq!(res.status_code(), 200);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn errors_become_error_envelopes() {
    let res = app().handle(request(Method::Get, "/users/0", MEDIA_TYPE)).await;
    assert_eq!(res.status_code(), 404);
    let env: ErrorEnvelope = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(env.error, HacError::new("Not Found", "Not Found"));

    let res = app().handle(request(Method::Get, "/users/500", MEDIA_TYPE)).await;
    assert_eq!(res.status_code(), 500);
    let env: ErrorEnvelope = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(env.error.code, "db_down");
    assert_eq!(env.error.message, "database unavailable");
    assert!(env.error.retryable);
}

#[tokio::test]
async fn undescribed_route_negotiation() {
    let res = app().handle(request(Method::Get, "/health", MEDIA_TYPE)).await;
    assert_eq!(res.status_code(), 406);

    let accept = "application/vnd.hac+json, application/json;q=0.9";
    let res = app().handle(request(Method::Get, "/health", accept)).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(res.body(), br#"{"ok":true}"#);
    assert_eq!(res.header("vary"), None);
}

#[tokio::test]
async fn discovery_root_lists_resources() {
    let res = app().handle(request(Method::Get, "/", MEDIA_TYPE)).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(res.header("content-type"), Some(MEDIA_TYPE));

    let doc: DiscoveryDocument = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(doc.meta.name, "Test API");
    let listed: Vec<_> = doc.meta.resources.iter()
        .map(|r| (r.href.as_str(), r.methods.join(",")))
        .collect();
    assert_eq!(listed, [
        ("/orders", "GET".to_owned()),
        ("/users", "GET,POST".to_owned()),
        ("/users/{id}", "DELETE,GET".to_owned()),
    ]);

    let res = app().handle(request(Method::Get, "/", "application/json")).await;
    assert_eq!(res.status_code(), 404);
}

#[tokio::test]
async fn unknown_routes_fall_through_to_404() {
    let res = app().handle(request(Method::Get, "/missing", "application/json")).await;
    assert_eq!(res.status_code(), 404);
}
