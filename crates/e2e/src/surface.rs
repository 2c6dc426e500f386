//! UI surface interface
//!
//! The browser automation layer lives outside this crate. Anything that can
//! locate elements by test id, report their visibility, text and attributes
//! and click them can drive verification.

use async_trait::async_trait;
use std::sync::Arc;

use crate::correlator::ResponseStream;
use crate::error::E2eResult;
use crate::scenario::ScenarioSpec;

#[async_trait]
pub trait UiSurface: Send + Sync {
    /// Whether the element is rendered and visible right now
    async fn is_visible(&self, test_id: &str) -> E2eResult<bool>;

    /// Display text of the element, if it exists
    async fn text(&self, test_id: &str) -> E2eResult<Option<String>>;

    /// Attribute value of the element, if both exist
    async fn attribute(&self, test_id: &str, name: &str) -> E2eResult<Option<String>>;

    async fn click(&self, test_id: &str) -> E2eResult<()>;
}

/// A live page and the backend responses it produces, scoped to one scenario
pub struct Session {
    pub surface: Arc<dyn UiSurface>,
    pub responses: ResponseStream,
}

/// Opens a fresh session for every scenario
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, scenario: &ScenarioSpec) -> E2eResult<Session>;
}
