//! Client for the external Essay Rendering Gateway.
//!
//! The gateway turns essay text into a display-ready image. This crate
//! wraps its HTTP API behind the [`gateway::RenderGateway`] trait, polls
//! render status on a bounded schedule, and probes natural image
//! dimensions from image header bytes.

pub mod api;
pub mod gateway;
pub mod poller;
pub mod probe;

pub use api::HttpRenderGateway;
pub use gateway::{RenderError, RenderGateway, RenderRequest, RenderState, RenderTicket};
pub use poller::{poll_render, PollConfig, PollOutcome};
