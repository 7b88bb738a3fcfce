//! Location-gated execution rules.

use crate::{
    error::ContractError,
    params::FunctionParameter,
    registry::{ContractRegistry, check_arity},
};
use geolink_proximity::{Coordinate, GeoTarget, LocationRecord, ProximityResult, evaluate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Allows calling one contract function only from within a geofence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRule {
    /// Rule identifier.
    pub id: String,
    /// Contract the rule applies to.
    pub contract_id: String,
    /// Function the rule applies to.
    pub function_name: String,
    /// Where the function may be called from.
    pub location: LocationRecord,
    /// Parameters the caller fills in, in any stored spelling.
    #[serde(default)]
    pub parameters: Vec<FunctionParameter>,
}

impl ContractRule {
    /// The rule's geofence.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Proximity`] if the stored location is invalid.
    pub fn target(&self) -> Result<GeoTarget, ContractError> {
        Ok(GeoTarget::try_from(&self.location)?)
    }

    /// Check caller-supplied `args` against the rule's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidParameter`] on an arity mismatch.
    pub fn check_arguments(&self, args: &[Value]) -> Result<(), ContractError> {
        check_arity(&self.function_name, &self.parameters, args)
    }
}

/// Decide whether `position` may execute `rule` with `args`.
///
/// The rule's contract and function must be registered, `args` must fit
/// the rule's parameters and `position` must lie within the rule's geofence
/// (boundary included).
///
/// # Errors
///
/// - [`ContractError::UnknownContract`] / [`ContractError::UnknownFunction`]
/// - [`ContractError::InvalidParameter`] when `args` do not fit
/// - [`ContractError::Proximity`] for an invalid position or stored location
/// - [`ContractError::OutOfRange`] when the position is too far away
pub fn authorize_execution(
    rule: &ContractRule,
    registry: &ContractRegistry,
    position: &Coordinate,
    args: &[Value],
) -> Result<ProximityResult, ContractError> {
    registry.function(&rule.contract_id, &rule.function_name)?;
    rule.check_arguments(args)?;

    let target = rule.target()?;
    let result = evaluate(position, &target)?;
    if !result.is_within_range {
        tracing::warn!(
            rule = %rule.id,
            distance_meters = result.distance_meters,
            radius_meters = target.radius_meters(),
            "execution denied outside geofence"
        );
        return Err(ContractError::OutOfRange {
            distance_meters: result.distance_meters,
            radius_meters: target.radius_meters(),
        });
    }
    Ok(result)
}
