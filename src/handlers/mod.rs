// Public (no auth) -> /health, /auth/*
// Protected (bearer token) -> /api/*
pub mod protected;
pub mod public;
