//! HTTP gateway for the titrate question cache.

pub mod gateway;
