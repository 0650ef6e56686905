//! Postal address used for shipping and billing.

use serde::{Deserialize, Serialize};

/// Errors from [`Address::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is empty or whitespace.
    #[error("address {0} is required")]
    MissingField(&'static str),
}

/// A shipping or billing address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Check that every field is filled in.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` naming the first blank field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let fields = [
            ("street", &self.street),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }

        Ok(())
    }

    /// Copy of the address with surrounding whitespace removed from each field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            street: self.street.trim().to_owned(),
            city: self.city.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn paris() -> Address {
        Address {
            street: "12 rue de Rivoli".to_owned(),
            city: "Paris".to_owned(),
            postal_code: "75004".to_owned(),
            country: "France".to_owned(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(paris().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_blank_field() {
        let mut address = paris();
        address.postal_code = "  ".to_owned();
        assert_eq!(
            address.validate(),
            Err(AddressError::MissingField("postalCode"))
        );
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(paris()).unwrap();
        assert_eq!(json["postalCode"], "75004");
    }
}
