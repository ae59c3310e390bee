//! Economy-specific registry helpers
//!
//! Thin wrappers that fix the registry's capability type to
//! `dyn EconomyProvider`, so consumer code can resolve "the economy" without
//! spelling out the generic calls.

use crate::core::registry::{RegistrationHandle, Service, ServiceRegistry};
use crate::core::traits::EconomyProvider;
use crate::types::{EconomyError, OptionalEconomyApiFeature, ServicePriority};
use std::fmt;
use std::sync::Arc;

/// A resolved economy provider with its registration metadata
pub type EconomyService = Service<dyn EconomyProvider>;

/// Capability name reported when no economy provider is registered
const ECONOMY_CAPABILITY: &str = "EconomyProvider";

/// Register an economy provider
///
/// # Arguments
///
/// * `registry` - Registry to register into
/// * `provider` - The provider implementation
/// * `priority` - Resolution tier; higher wins, earlier wins ties
/// * `registrar_name` - Name of the plugin or component registering
///
/// # Returns
///
/// Handle for unregistering this specific registration
pub fn register_economy(
    registry: &ServiceRegistry,
    provider: Arc<dyn EconomyProvider>,
    priority: ServicePriority,
    registrar_name: &str,
) -> RegistrationHandle {
    registry.register::<dyn EconomyProvider>(provider, priority, registrar_name)
}

/// The active economy provider
///
/// Fails with `ProviderUnavailable` when no provider is registered. Callers
/// should resolve at the point of use instead of caching the result, so a
/// higher-priority provider registered later takes effect.
pub fn active_economy(registry: &ServiceRegistry) -> Result<EconomyService, EconomyError> {
    registry
        .service_for::<dyn EconomyProvider>()
        .ok_or_else(|| EconomyError::provider_unavailable(ECONOMY_CAPABILITY))
}

/// Facts about the active provider, for status output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomySummary {
    pub registrar: String,
    pub priority: ServicePriority,
    pub negative_balances: bool,
    pub transaction_events: bool,
    pub primary_currency: String,
    pub currency_count: usize,
}

impl EconomySummary {
    pub fn of(service: &EconomyService) -> Self {
        Self {
            registrar: service.registrar_name().to_string(),
            priority: service.priority(),
            negative_balances: service.supports(OptionalEconomyApiFeature::NegativeBalances),
            transaction_events: service.supports(OptionalEconomyApiFeature::TransactionEvents),
            primary_currency: service.primary_currency().identifier().to_string(),
            currency_count: service.currencies().len(),
        }
    }
}

impl fmt::Display for EconomySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        write!(
            f,
            "economy provided by {} ({} priority); negative balances: {}; transaction events: {}; {} currencies (primary {})",
            self.registrar,
            self.priority,
            yes_no(self.negative_balances),
            yes_no(self.transaction_events),
            self.currency_count,
            self.primary_currency,
        )
    }
}
