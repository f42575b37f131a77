mod auth;
mod common;
mod consensus;
