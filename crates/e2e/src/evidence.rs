//! Scenario-scoped evidence
//!
//! Client settings, role privileges and the user snapshot are each fetched
//! at most once per scenario, and only when a rule asks for them. The cells
//! die with the scenario.

use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use gatecheck_common::{ClientSettings, ExchangeConfig, PrivilegeIndex, RoleDetails, User};

use crate::correlator::{status_is, EvidenceCorrelator};
use crate::error::E2eResult;

pub struct ScenarioEvidence {
    correlator: EvidenceCorrelator,
    exchanges: ExchangeConfig,
    window: Duration,
    settings: OnceCell<ClientSettings>,
    privileges: OnceCell<PrivilegeIndex>,
    user: OnceCell<User>,
}

impl ScenarioEvidence {
    pub fn new(correlator: EvidenceCorrelator, exchanges: ExchangeConfig, window: Duration) -> Self {
        Self {
            correlator,
            exchanges,
            window,
            settings: OnceCell::new(),
            privileges: OnceCell::new(),
            user: OnceCell::new(),
        }
    }

    pub async fn settings(&self) -> E2eResult<&ClientSettings> {
        self.settings
            .get_or_try_init(|| async move {
                debug!("Awaiting {}", self.exchanges.client_settings);
                self.correlator
                    .await_data(
                        &self.exchanges.client_settings,
                        status_is(self.exchanges.success_status),
                        self.window,
                    )
                    .await
            })
            .await
    }

    pub async fn privileges(&self) -> E2eResult<&PrivilegeIndex> {
        self.privileges
            .get_or_try_init(|| async move {
                debug!("Awaiting {}", self.exchanges.role);
                let role: RoleDetails = self
                    .correlator
                    .await_data(
                        &self.exchanges.role,
                        status_is(self.exchanges.success_status),
                        self.window,
                    )
                    .await?;
                Ok(PrivilegeIndex::from(&role))
            })
            .await
    }

    pub async fn user(&self) -> E2eResult<&User> {
        self.user
            .get_or_try_init(|| async move {
                debug!("Awaiting {}", self.exchanges.user);
                self.correlator
                    .await_data(
                        &self.exchanges.user,
                        status_is(self.exchanges.success_status),
                        self.window,
                    )
                    .await
            })
            .await
    }
}
