//! In-memory UI surface
//!
//! `ScriptedSurface` plays back a page whose elements appear on a schedule
//! and whose clicks reveal or hide other elements and emit backend responses
//! into the scenario's response log. Offline runs and tests use it in place
//! of a browser.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::correlator::{BackendResponse, ResponseRecorder};
use crate::error::{E2eError, E2eResult};
use crate::surface::UiSurface;

/// Declarative description of one element
#[derive(Debug, Clone)]
pub struct ScriptedElement {
    test_id: String,
    text: Option<String>,
    attributes: HashMap<String, String>,
    appears_after: Option<Duration>,
}

impl ScriptedElement {
    /// An element visible from the start
    pub fn new(test_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            text: None,
            attributes: HashMap::new(),
            appears_after: Some(Duration::ZERO),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }

    /// Present in the DOM but hidden until a click shows it
    pub fn hidden(mut self) -> Self {
        self.appears_after = None;
        self
    }
}

/// What clicking an element does
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Show the element after `delay`, or hide it if currently visible
    Toggle { test_id: String, delay: Duration },
    Show { test_id: String, delay: Duration },
    Hide { test_id: String },
    /// Emit a backend response after `delay`
    Respond { response: BackendResponse, delay: Duration },
}

#[derive(Debug)]
struct ElementState {
    text: Option<String>,
    attributes: HashMap<String, String>,
    visible_from: Option<Instant>,
}

impl ElementState {
    fn is_visible(&self, now: Instant) -> bool {
        self.visible_from.map_or(false, |at| now >= at)
    }
}

pub struct ScriptedSurface {
    elements: Mutex<HashMap<String, ElementState>>,
    effects: HashMap<String, Vec<ClickEffect>>,
    clicks: Mutex<Vec<String>>,
    recorder: ResponseRecorder,
}

impl ScriptedSurface {
    pub fn new(recorder: ResponseRecorder) -> Self {
        Self {
            elements: Mutex::new(HashMap::new()),
            effects: HashMap::new(),
            clicks: Mutex::new(Vec::new()),
            recorder,
        }
    }

    pub fn with_element(self, element: ScriptedElement) -> Self {
        let visible_from = element.appears_after.map(|d| Instant::now() + d);
        self.elements.lock().insert(
            element.test_id,
            ElementState {
                text: element.text,
                attributes: element.attributes,
                visible_from,
            },
        );
        self
    }

    pub fn on_click(mut self, test_id: impl Into<String>, effect: ClickEffect) -> Self {
        self.effects.entry(test_id.into()).or_default().push(effect);
        self
    }

    /// Emit a response after `delay`, as a page load or background fetch would
    pub fn emit_after(&self, response: BackendResponse, delay: Duration) {
        let recorder = self.recorder.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            recorder.record(BackendResponse {
                received_at: Utc::now(),
                ..response
            });
        });
    }

    /// Test ids clicked so far, in order
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().clone()
    }

    fn apply(&self, effect: &ClickEffect, now: Instant) {
        match effect {
            ClickEffect::Toggle { test_id, delay } => {
                let mut elements = self.elements.lock();
                if let Some(el) = elements.get_mut(test_id) {
                    el.visible_from = if el.is_visible(now) {
                        None
                    } else {
                        Some(now + *delay)
                    };
                }
            }
            ClickEffect::Show { test_id, delay } => {
                if let Some(el) = self.elements.lock().get_mut(test_id) {
                    el.visible_from = Some(now + *delay);
                }
            }
            ClickEffect::Hide { test_id } => {
                if let Some(el) = self.elements.lock().get_mut(test_id) {
                    el.visible_from = None;
                }
            }
            ClickEffect::Respond { response, delay } => {
                self.emit_after(response.clone(), *delay);
            }
        }
    }
}

#[async_trait]
impl UiSurface for ScriptedSurface {
    async fn is_visible(&self, test_id: &str) -> E2eResult<bool> {
        let now = Instant::now();
        Ok(self
            .elements
            .lock()
            .get(test_id)
            .map_or(false, |el| el.is_visible(now)))
    }

    async fn text(&self, test_id: &str) -> E2eResult<Option<String>> {
        Ok(self.elements.lock().get(test_id).and_then(|el| el.text.clone()))
    }

    async fn attribute(&self, test_id: &str, name: &str) -> E2eResult<Option<String>> {
        Ok(self
            .elements
            .lock()
            .get(test_id)
            .and_then(|el| el.attributes.get(name).cloned()))
    }

    async fn click(&self, test_id: &str) -> E2eResult<()> {
        let now = Instant::now();
        let visible = self
            .elements
            .lock()
            .get(test_id)
            .map(|el| el.is_visible(now))
            .ok_or_else(|| E2eError::Surface(format!("no element with test id {}", test_id)))?;
        if !visible {
            return Err(E2eError::Surface(format!("{} is not visible", test_id)));
        }

        debug!("Click {}", test_id);
        self.clicks.lock().push(test_id.to_string());
        if let Some(effects) = self.effects.get(test_id) {
            for effect in effects {
                self.apply(effect, now);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlator::{response_stream, status_is, EvidenceCorrelator};

    #[tokio::test(start_paused = true)]
    async fn test_element_appears_on_schedule() {
        let (recorder, _stream) = response_stream();
        let surface = ScriptedSurface::new(recorder)
            .with_element(ScriptedElement::new("late").appears_after(Duration::from_millis(300)));

        assert!(!surface.is_visible("late").await.unwrap());
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(surface.is_visible("late").await.unwrap());
        assert!(!surface.is_visible("missing").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_toggles_and_emits() {
        let (recorder, stream) = response_stream();
        let surface = ScriptedSurface::new(recorder)
            .with_element(ScriptedElement::new("menu"))
            .with_element(ScriptedElement::new("item").hidden())
            .on_click(
                "menu",
                ClickEffect::Toggle {
                    test_id: "item".to_string(),
                    delay: Duration::ZERO,
                },
            )
            .on_click(
                "menu",
                ClickEffect::Respond {
                    response: BackendResponse::new("https://api.test/get-role", 200, "{}"),
                    delay: Duration::from_millis(50),
                },
            );

        surface.click("menu").await.unwrap();
        assert!(surface.is_visible("item").await.unwrap());

        let found = EvidenceCorrelator::new(stream)
            .await_within("get-role", status_is(200), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(found.status, 200);

        surface.click("menu").await.unwrap();
        assert!(!surface.is_visible("item").await.unwrap());
        assert_eq!(surface.clicks(), vec!["menu", "menu"]);
    }

    #[tokio::test]
    async fn test_click_on_hidden_element_fails() {
        let (recorder, _stream) = response_stream();
        let surface = ScriptedSurface::new(recorder)
            .with_element(ScriptedElement::new("item").hidden());

        assert!(matches!(surface.click("item").await, Err(E2eError::Surface(_))));
        assert!(matches!(surface.click("nope").await, Err(E2eError::Surface(_))));
    }
}
