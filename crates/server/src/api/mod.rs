pub mod handlers;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod videos;
pub mod webhook;

#[cfg(test)]
pub(crate) mod test_support;

pub use routes::create_router;
