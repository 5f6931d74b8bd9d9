#![allow(clippy::useless_format, clippy::too_many_arguments)]

pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;
