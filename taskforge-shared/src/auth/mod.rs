/// Authentication utilities
///
/// - `jwt`: HS256 access-token signing and validation
/// - `middleware`: the `AuthContext` identity threaded through every
///   scope-enforcer and concurrency-controller call

pub mod jwt;
pub mod middleware;
