//! Deployed contracts the application knows how to call.

use crate::{error::ContractError, params::FunctionParameter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One callable function of a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFunction {
    /// Function name.
    pub name: String,
    /// Parameters in call order.
    #[serde(default)]
    pub parameters: Vec<FunctionParameter>,
}

impl ContractFunction {
    /// A function with `parameters`.
    pub fn new(name: impl Into<String>, parameters: Vec<FunctionParameter>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Check that `args` supplies every required parameter and nothing
    /// beyond the declared ones. Optional parameters may only be left off
    /// the end.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidParameter`] on an arity mismatch.
    pub fn check_arguments(&self, args: &[Value]) -> Result<(), ContractError> {
        check_arity(&self.name, &self.parameters, args)
    }
}

pub(crate) fn check_arity(
    function: &str,
    parameters: &[FunctionParameter],
    args: &[Value],
) -> Result<(), ContractError> {
    if args.len() > parameters.len() {
        return Err(ContractError::InvalidParameter(format!(
            "{function} takes {} arguments, got {}",
            parameters.len(),
            args.len()
        )));
    }
    if let Some(missing) = parameters[args.len()..]
        .iter()
        .find(|parameter| !parameter.optional)
    {
        return Err(ContractError::InvalidParameter(format!(
            "{function} is missing required argument {}",
            missing.name
        )));
    }
    Ok(())
}

/// A contract deployed on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    /// Contract address.
    pub contract_id: String,
    /// Display name.
    pub name: String,
    /// Callable functions.
    #[serde(default)]
    pub functions: Vec<ContractFunction>,
}

impl DeployedContract {
    /// The function called `name`.
    pub fn function(&self, name: &str) -> Option<&ContractFunction> {
        self.functions.iter().find(|function| function.name == name)
    }
}

/// Known deployed contracts, keyed by contract address.
///
/// Built once at startup and passed to whatever needs to look contracts up.
#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    contracts: HashMap<String, DeployedContract>,
}

impl ContractRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a contract, returning the one it replaced.
    pub fn register(&mut self, contract: DeployedContract) -> Option<DeployedContract> {
        tracing::debug!(contract_id = %contract.contract_id, "registering contract");
        self.contracts.insert(contract.contract_id.clone(), contract)
    }

    /// Remove a contract.
    pub fn remove(&mut self, contract_id: &str) -> Option<DeployedContract> {
        self.contracts.remove(contract_id)
    }

    /// Look a contract up.
    pub fn get(&self, contract_id: &str) -> Option<&DeployedContract> {
        self.contracts.get(contract_id)
    }

    /// Look a function up.
    ///
    /// # Errors
    ///
    /// [`ContractError::UnknownContract`] or [`ContractError::UnknownFunction`].
    pub fn function(
        &self,
        contract_id: &str,
        function: &str,
    ) -> Result<&ContractFunction, ContractError> {
        self.get(contract_id)
            .ok_or_else(|| ContractError::UnknownContract(contract_id.to_string()))?
            .function(function)
            .ok_or_else(|| ContractError::UnknownFunction {
                contract_id: contract_id.to_string(),
                function: function.to_string(),
            })
    }

    /// All contracts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &DeployedContract> {
        self.contracts.values()
    }

    /// Number of contracts.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl FromIterator<DeployedContract> for ContractRegistry {
    fn from_iter<I: IntoIterator<Item = DeployedContract>>(contracts: I) -> Self {
        let mut registry = Self::new();
        for contract in contracts {
            registry.register(contract);
        }
        registry
    }
}
