// handlers/protected/mod.rs - Handlers behind the bearer-token gate
//
// Each handler receives the caller as `Extension<AuthUser>`, inserted by
// `middleware::jwt_auth_middleware`.

pub mod activations;
pub mod upload;
