pub mod conflict_rules;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod searchees;

pub use routes::create_router;
