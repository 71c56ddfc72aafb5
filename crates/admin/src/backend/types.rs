//! Wire DTOs for the backend's JSON API.
//!
//! The backend uses Norwegian field names (`navn`, `epost`, `tjenester`, ...).
//! Response types are lenient: every field the UI can live without is
//! optional so a partial record still renders.

use serde::{Deserialize, Serialize};

use tmc_core::{OrderId, PersonId, Price, RoleId};

// =============================================================================
// Auth & account
// =============================================================================

#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PasswordChangeRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

// =============================================================================
// Persons
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PersonDto {
    pub id: PersonId,
    #[serde(default)]
    pub navn: Option<String>,
    #[serde(default)]
    pub epost: Option<String>,
    #[serde(default)]
    pub telefonnummer: Option<String>,
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PersonRequest<'a> {
    pub navn: &'a str,
    pub epost: &'a str,
    pub telefonnummer: &'a str,
    pub role_id: RoleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

// =============================================================================
// Orders
// =============================================================================

/// `tjenester` inside a service line: one name or a list of names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum ServiceNames {
    One(String),
    Many(Vec<String>),
}

impl ServiceNames {
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(name) => Some(name.as_str()),
            Self::Many(names) => names.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ServiceDto {
    #[serde(default)]
    pub tjeneste_dato: Option<String>,
    #[serde(default)]
    pub address_from: Option<String>,
    #[serde(default)]
    pub address_to: Option<String>,
    #[serde(default)]
    pub kommentar: Option<String>,
    #[serde(default)]
    pub tjenester: Option<ServiceNames>,
    #[serde(default)]
    pub tjeneste_type_id: Option<i64>,
    #[serde(default)]
    pub pris: Option<Price>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderDto {
    #[serde(default, alias = "id")]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub kunde_id: Option<PersonId>,
    #[serde(default)]
    pub kunde_navn: Option<String>,
    #[serde(default)]
    pub kunde_epost: Option<String>,
    #[serde(default)]
    pub kunde_telefonnummer: Option<String>,
    #[serde(default)]
    pub konsulent_id: Option<PersonId>,
    #[serde(default)]
    pub konsulent_navn: Option<String>,
    #[serde(default)]
    pub tjenester: Option<Vec<ServiceDto>>,
    #[serde(default)]
    pub total_pris: Option<Price>,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CustomerInfoRequest<'a> {
    pub navn: &'a str,
    pub telefonnummer: &'a str,
    pub epost: &'a str,
    pub role_id: RoleId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ServiceRequest<'a> {
    pub tjeneste_dato: String,
    pub address_from: &'a str,
    pub address_to: &'a str,
    pub kommentar: &'a str,
    pub pris: Price,
    pub tjeneste_type_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderRequest<'a> {
    #[serde(rename = "konsulentid")]
    pub konsulent_id: Option<PersonId>,
    pub kunde_id: Option<PersonId>,
    pub kunde_info: CustomerInfoRequest<'a>,
    pub tjenester: Vec<ServiceRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PaymentRequest {
    pub bestille_id: OrderId,
    pub amount_paid: Price,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderStatusRequest<'a> {
    pub order_id: OrderId,
    pub order_status: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_order_dto_tolerates_missing_fields() {
        let dto: OrderDto = serde_json::from_str(r#"{"orderId": 3, "kundeNavn": null}"#).unwrap();
        assert_eq!(dto.order_id, Some(OrderId::new(3)));
        assert!(dto.kunde_navn.is_none());
        assert!(dto.tjenester.is_none());
    }

    #[test]
    fn test_service_names_one_or_many() {
        let one: ServiceDto = serde_json::from_str(r#"{"tjenester": "Pakking"}"#).unwrap();
        assert_eq!(one.tjenester.unwrap().first(), Some("Pakking"));

        let many: ServiceDto =
            serde_json::from_str(r#"{"tjenester": ["Flytting", "Pakking"], "pris": 1200.5}"#)
                .unwrap();
        assert_eq!(many.tjenester.unwrap().first(), Some("Flytting"));
        assert_eq!(many.pris.unwrap().to_string(), "1200.5 kr");
    }

    #[test]
    fn test_order_request_field_names() {
        let request = OrderRequest {
            konsulent_id: Some(PersonId::new(2)),
            kunde_id: None,
            kunde_info: CustomerInfoRequest {
                navn: "Kari",
                telefonnummer: "1234567890",
                epost: "kari@example.no",
                role_id: RoleId::Customer,
            },
            tjenester: vec![ServiceRequest {
                tjeneste_dato: "2030-06-01".to_string(),
                address_from: "Storgata 1",
                address_to: "Lillegata 2",
                kommentar: "Piano",
                pris: "1500,50".parse().unwrap(),
                tjeneste_type_id: 1,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["konsulentid"], 2);
        assert!(json["kundeId"].is_null());
        assert_eq!(json["kundeInfo"]["roleId"], 3);
        assert_eq!(json["tjenester"][0]["tjenesteDato"], "2030-06-01");
        assert_eq!(json["tjenester"][0]["tjenesteTypeId"], 1);
        assert!(json["tjenester"][0]["pris"].is_number());
        assert_eq!(json["tjenester"][0]["pris"], 1500.5);
    }

    #[test]
    fn test_payment_request_field_names() {
        let json = serde_json::to_value(PaymentRequest {
            bestille_id: OrderId::new(9),
            amount_paid: "2500".parse().unwrap(),
        })
        .unwrap();
        assert_eq!(json["bestilleId"], 9);
        assert!(json["amountPaid"].is_number());
        assert_eq!(json["amountPaid"], 2500.0);
    }
}
