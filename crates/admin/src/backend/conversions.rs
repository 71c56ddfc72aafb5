//! DTO → domain conversions.
//!
//! Missing strings become empty, a missing total becomes zero and missing
//! statuses become pending/unpaid, matching how the lists display them.

use tmc_core::validation::parse_service_date;
use tmc_core::{
    CustomerSnapshot, Order, OrderId, OrderStatus, PaymentStatus, Person, Price, RoleId,
    ServiceLine, ServiceType,
};

use super::types::{OrderDto, PersonDto, ServiceDto};

pub(super) fn convert_person(dto: PersonDto) -> Person {
    Person {
        id: dto.id,
        name: dto.navn.unwrap_or_default(),
        email: dto.epost.unwrap_or_default(),
        phone: dto.telefonnummer.unwrap_or_default(),
        role_id: dto.role_id.unwrap_or(RoleId::Customer),
    }
}

pub(super) fn convert_service(dto: ServiceDto) -> ServiceLine {
    let label = dto
        .tjenester
        .as_ref()
        .and_then(|names| names.first())
        .map(str::to_owned)
        .unwrap_or_default();
    let service_type = dto
        .tjeneste_type_id
        .and_then(ServiceType::from_type_id)
        .or_else(|| ServiceType::from_label(&label));
    let service_label = if label.is_empty() {
        service_type.map(|t| t.label().to_owned()).unwrap_or_default()
    } else {
        label
    };

    ServiceLine {
        service_type,
        service_label,
        service_date: dto.tjeneste_dato.as_deref().and_then(parse_service_date),
        address_from: dto.address_from.unwrap_or_default(),
        address_to: dto.address_to.filter(|to| !to.trim().is_empty()),
        comment: dto.kommentar.unwrap_or_default(),
        price: dto.pris.unwrap_or(Price::ZERO),
    }
}

pub(super) fn convert_order(dto: OrderDto) -> Order {
    Order {
        id: dto.order_id.unwrap_or(OrderId::new(0)),
        customer_id: dto.kunde_id,
        customer: CustomerSnapshot {
            name: dto.kunde_navn.unwrap_or_default(),
            email: dto.kunde_epost.unwrap_or_default(),
            phone: dto.kunde_telefonnummer.unwrap_or_default(),
        },
        consultant_id: dto.konsulent_id,
        consultant_name: dto.konsulent_navn.unwrap_or_default(),
        services: dto
            .tjenester
            .unwrap_or_default()
            .into_iter()
            .map(convert_service)
            .collect(),
        total_price: dto.total_pris.unwrap_or(Price::ZERO),
        order_date: dto.order_date,
        order_status: dto
            .order_status
            .map_or(OrderStatus::Pending, OrderStatus::from),
        payment_status: dto
            .payment_status
            .map_or(PaymentStatus::Unpaid, PaymentStatus::from),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_convert_full_order() {
        let dto: OrderDto = serde_json::from_value(serde_json::json!({
            "orderId": 14,
            "kundeId": 5,
            "kundeNavn": "Kari Nordmann",
            "kundeEpost": "kari@example.no",
            "kundeTelefonnummer": "1234567890",
            "konsulentNavn": "Ola",
            "tjenester": [{
                "tjenesteDato": "2026-06-01T09:00:00",
                "addressFrom": "Storgata 1",
                "addressTo": "",
                "kommentar": "Two floors",
                "tjenester": ["Rengjøring"],
                "pris": 1500
            }],
            "totalPris": 1500,
            "orderStatus": "Completed",
            "paymentStatus": "PAID"
        }))
        .unwrap();

        let order = convert_order(dto);
        assert_eq!(order.id, OrderId::new(14));
        assert_eq!(order.customer.name, "Kari Nordmann");
        assert_eq!(order.order_status, OrderStatus::Completed);
        assert_eq!(order.payment_status, PaymentStatus::Paid);

        let line = order.services.first().unwrap();
        assert_eq!(line.service_type, Some(ServiceType::Cleaning));
        assert_eq!(line.service_date, NaiveDate::from_ymd_opt(2026, 6, 1));
        assert_eq!(line.address_to, None);
    }

    #[test]
    fn test_convert_sparse_order_uses_defaults() {
        let dto: OrderDto = serde_json::from_str("{}").unwrap();
        let order = convert_order(dto);
        assert_eq!(order.id, OrderId::new(0));
        assert_eq!(order.total_price, Price::ZERO);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert!(order.services.is_empty());
    }

    #[test]
    fn test_service_type_from_id_when_name_missing() {
        let dto: ServiceDto = serde_json::from_str(r#"{"tjenesteTypeId": 1}"#).unwrap();
        let line = convert_service(dto);
        assert_eq!(line.service_type, Some(ServiceType::Moving));
        assert_eq!(line.service_label, "Flytting");
    }
}
