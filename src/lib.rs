//! Client library for the Sunny Portal HTTP/XML services: authenticates a
//! user, discovers plants and devices, and fetches energy/power series.
//!
//! Requests are signed with the session token (HMAC-SHA1 over method,
//! service, timestamp and identifier); responses are XML envelopes decoded
//! into the records in [`model`].

pub mod api;
pub mod model;
