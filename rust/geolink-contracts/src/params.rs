//! Function parameter descriptions.
//!
//! Parameter metadata arrives from hand-entered rules, discovered contract
//! interfaces and older stored rules, each spelling the fields differently.
//! [`RawParameter`] accepts all of the spellings and [`RawParameter::normalize`]
//! turns it into a [`FunctionParameter`] once, at ingestion.

use crate::error::ContractError;
use serde::{Deserialize, Serialize};

/// A parameter description in any of the known shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParameter {
    /// `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `parameter_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
    /// `type`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `parameter_type`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
    /// `optional`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    /// `is_optional`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_optional: Option<bool>,
    /// `required`, the inverse of `optional`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// First present, non-blank value.
fn first_present(candidates: [&Option<String>; 2]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

impl RawParameter {
    /// The canonical parameter.
    ///
    /// `name` wins over `parameter_name` and `type` over `parameter_type`;
    /// blank strings count as absent. Optionality comes from `optional`,
    /// then `is_optional`, then the negation of `required`, and defaults to
    /// required.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidParameter`] if no name or no type is
    /// given.
    pub fn normalize(&self) -> Result<FunctionParameter, ContractError> {
        let name = first_present([&self.name, &self.parameter_name]).ok_or_else(|| {
            ContractError::InvalidParameter("parameter has no name".into())
        })?;
        let kind = first_present([&self.kind, &self.parameter_type]).ok_or_else(|| {
            ContractError::InvalidParameter(format!("parameter {name} has no type"))
        })?;
        let optional = self
            .optional
            .or(self.is_optional)
            .or(self.required.map(|required| !required))
            .unwrap_or(false);
        Ok(FunctionParameter {
            name,
            kind,
            optional,
        })
    }
}

/// A parameter in canonical form.
///
/// Deserializing accepts every [`RawParameter`] spelling; serializing
/// always writes `{name, type, optional}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParameter")]
pub struct FunctionParameter {
    /// Parameter name.
    pub name: String,
    /// Soroban type name, such as `Address` or `u32`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether callers may leave it out.
    pub optional: bool,
}

impl FunctionParameter {
    /// A required parameter.
    pub fn required(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            optional: false,
        }
    }

    /// An optional parameter.
    pub fn optional(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(name, kind)
        }
    }
}

impl TryFrom<RawParameter> for FunctionParameter {
    type Error = ContractError;

    fn try_from(raw: RawParameter) -> Result<Self, Self::Error> {
        raw.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_maps_every_spelling_to_one_shape() {
        let expected = FunctionParameter::optional("to", "Address");
        for json in [
            r#"{"name":"to","type":"Address","optional":true}"#,
            r#"{"parameter_name":"to","parameter_type":"Address","is_optional":true}"#,
            r#"{"name":"to","parameter_type":"Address","required":false}"#,
            r#"{"name":"","parameter_name":"to","type":"Address","optional":true}"#,
        ] {
            let parameter: FunctionParameter = serde_json::from_str(json).unwrap();
            assert_eq!(parameter, expected, "{json}");
        }
    }

    #[test]
    fn it_defaults_to_required() {
        let parameter: FunctionParameter =
            serde_json::from_str(r#"{"name":"amount","type":"i128"}"#).unwrap();
        assert!(!parameter.optional);
    }

    #[test]
    fn it_rejects_parameters_without_a_name_or_type() {
        let no_name = RawParameter {
            kind: Some("u32".into()),
            ..Default::default()
        };
        assert!(matches!(
            no_name.normalize(),
            Err(ContractError::InvalidParameter(_))
        ));

        let no_type: Result<FunctionParameter, _> = serde_json::from_str(r#"{"name":"x"}"#);
        assert!(no_type.is_err());
    }

    #[test]
    fn it_writes_the_canonical_shape() {
        let json = serde_json::to_string(&FunctionParameter::required("to", "Address")).unwrap();
        assert_eq!(json, r#"{"name":"to","type":"Address","optional":false}"#);
    }
}
