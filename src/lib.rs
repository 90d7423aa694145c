//! Browser, desktop and mobile chat client for a conversation backend.
//!
//! - `api` - the backend endpoints and their HTTP implementation
//! - `controller` - conversation list, selection, transcript and the send flow
//! - `ui` / `views` - Dioxus components rendering the controller's model

pub mod api;
pub mod config;
pub mod controller;
pub mod markdown;
pub mod types;
pub mod ui;
pub mod views;
