//! A small users API with agent context.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -H 'accept: application/vnd.hac+json' http://localhost:3000/users/42
//!   curl -H 'accept: application/vnd.hac+json' http://localhost:3000/
//!   curl -H 'accept: application/vnd.hac+json' http://localhost:3000/users/0
//!   curl -H 'accept: application/vnd.hac+json' http://localhost:3000/orders

use hac::{
    Action, AgentContext, BlastRadius, Discovery, Field, HacError, MatchedRoute, Mutability,
    Recovery, Registry, RelatedResource, Request, Response, Router, Safety, Server, ServerConfig,
    Status,
};

#[tokio::main]
async fn main() -> Result<(), hac::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let registry = Registry::new();
    registry.get("/users")
        .description("All user accounts.")
        .action(
            Action::new("create", "POST", "/users")
                .description("Create a user account.")
                .safety(Safety::new(Mutability::Reversible, BlastRadius::SelfOnly))
                .field(Field::new("name", "string").required())
                .field(Field::new("email", "string").required()),
        )
        .register();
    registry.post("/users").description("Create a user account.").register();
    registry.get("/users/{id}")
        .description("A user account.")
        .action(
            Action::new("delete", "DELETE", "/users/{id}")
                .description("Delete this account and everything it owns.")
                .safety(
                    Safety::new(Mutability::Irreversible, BlastRadius::SelfAndAssociated)
                        .confirm(),
                )
                .precondition("The account has no active subscriptions."),
        )
        .relate(RelatedResource::new("collection", "/users"))
        .register();
    registry.delete("/users/{id}").description("Deletes a user account.").register();

    let discovery = Discovery::generate("Users API", "1.0", "A sample users API.", &registry);

    let agent = AgentContext::new(registry)
        .path_resolver(MatchedRoute)
        .error_mapper(|status: u16, _body: &[u8], _req: &Request| {
            (status == 404).then(|| {
                HacError::new("user_not_found", "No user with that id.")
                    .recovery(Recovery::new("List users to find a valid id.")
                        .action(Action::new("list", "GET", "/users")))
            })
        });

    let api = Router::new()
        .get("/users", list_users)
        .post("/users", create_user)
        .get("/users/{id}", get_user)
        .delete("/users/{id}", delete_user)
        .get("/orders", list_orders)
        .layer(agent);

    let app = Router::new()
        .get("/", discovery.handler())
        .fallback(api.into_handler());

    Server::from_config(ServerConfig::from_env()?).serve(app).await
}

async fn list_users(_req: Request) -> Response {
    Response::json(br#"[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]"#.to_vec())
}

async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::builder()
            .status(Status::BadRequest)
            .json(br#"{"code":"missing_body","message":"Send a JSON user."}"#.to_vec());
    }
    Response::builder()
        .status(Status::Created)
        .header("location", "/users/3")
        .json(br#"{"id":3}"#.to_vec())
}

async fn get_user(req: Request) -> Response {
    match req.param("id") {
        Some("0") | None => Response::status(Status::NotFound),
        Some(id) => Response::json(format!(r#"{{"id":{id},"name":"Alice"}}"#).into_bytes()),
    }
}

async fn delete_user(_req: Request) -> Response {
    Response::status(Status::NoContent)
}

// No metadata registered: agent-only clients get 406.
async fn list_orders(_req: Request) -> Response {
    Response::json(b"[]".to_vec())
}
