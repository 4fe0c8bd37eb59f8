//! Client-side pipeline for outpost.
//!
//! This crate provides the network interception agent, the two push
//! subscribers, the delivery-token lifecycle, the unread badge aggregator and
//! the AI key-rotation proxy. Platform surfaces are reached through traits so
//! that each component can run against fakes.

pub mod agent;
pub mod ai;
pub mod badge;
pub mod fetch;
pub mod identity;
pub mod push;
pub mod token;

pub use agent::{AgentConfig, AgentState, Handled, InstallReport, InterceptionAgent, Request, ResponseSource, Strategy};
pub use ai::{ChatMessage, GeminiClient, GeminiConfig, KeyRotationProxy, Upstream, UpstreamError};
pub use badge::{AttentionCounters, BadgeAggregator, BadgeSink, IconOverlay, PlatformBadge, attention_count};
pub use fetch::{FetchConfig, FetchError, FetchResponse, Fetcher, HttpFetcher};
pub use identity::{Identity, Role};
pub use push::{BackgroundReceiver, ForegroundRouter, PushMessage, SoundEvent, classify};
pub use token::{TokenManager, TokenOutcome};
