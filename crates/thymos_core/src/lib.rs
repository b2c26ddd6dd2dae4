//! # Thymos Core
//!
//! Data model and pure logic shared by every other crate: emotion entries and
//! buckets, normalization of classifier output, the decay-weighted trend,
//! configuration, and the message adapters that turn host payloads into chat
//! messages.

pub mod config;
pub mod entry;
pub mod fingerprint;
pub mod message;
pub mod sentiment;
pub mod trend;

pub use config::{
    ClassifierConfig, EmotionConfig, LoggingConfig, RenderConfig, StoreConfig, ThymosConfig,
};
pub use entry::{
    Bucket, EmotionEntry, EmotionState, Intensity, RawClassification, NEUTRAL_LABEL,
    STATE_VERSION, UNSURE_REASON,
};
pub use fingerprint::fingerprint;
pub use message::{latest_for_role, parse_messages, ChatMessage, MessageAdapter, Role};
pub use trend::dominant_label;
