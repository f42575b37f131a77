pub mod access;
pub mod hash;
pub mod jwt;
pub mod link;
