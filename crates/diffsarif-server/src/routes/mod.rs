pub mod analyze_request;
pub mod analyze_route;
pub mod health_route;
