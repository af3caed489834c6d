//! Decoder for the waybill order form contract.
//!
//! Order headers arrive as flat form fields (`orderNo`, `senderName`, ...);
//! line items arrive as indexed fields (`items[0][productName]`,
//! `items[0][quantity]`, ...). The decoder materializes a contiguous item
//! list up front: gaps or duplicate indices are rejected instead of silently
//! truncating the submission, and numeric subfields are parsed strictly so a
//! bad value fails the whole request before anything touches the database.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::errors::ServiceError;

/// Form names of the header fields that must be present and non-empty,
/// paired with the record field name used in error messages.
const REQUIRED_HEADER_FIELDS: &[(&str, &str)] = &[
    ("orderNo", "order_number"),
    ("senderName", "sender"),
    ("senderPhone", "sender_phone"),
    ("senderAddress", "sender_address"),
    ("receiverName", "receiver"),
    ("receiverPhone", "receiver_phone"),
    ("receiverAddress", "receiver_address"),
];

/// A fully parsed and defaulted order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderForm {
    pub order_number: String,
    pub sender: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub product_code: String,
    pub receiver: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub total_freight: Decimal,
    pub payment_method: String,
    pub return_requirement: String,
    pub other_expenses: Decimal,
    pub expense_details: String,
    pub carrier: String,
    pub carrier_address: String,
    pub arrival_address: String,
    pub departure_station_phone: Option<String>,
    pub arrival_station_phone: String,
    pub customer_order_no: String,
    pub date: Option<String>,
    pub departure_station: String,
    pub arrival_station: String,
    pub transport_method: String,
    pub delivery_method: String,
    pub sender_sign: String,
    pub receiver_sign: String,
    pub id_card: String,
    pub order_maker: String,
    pub items: Vec<ItemForm>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    pub item_name: String,
    pub package_type: String,
    pub quantity: i32,
    pub weight: Decimal,
    pub volume: Decimal,
    pub delivery_charge: Decimal,
    pub insurance_fee: Decimal,
    pub packaging_fee: Decimal,
    pub goods_value: Decimal,
    pub remarks: String,
    pub freight: Decimal,
}

/// Parses the raw form pairs of an order submission into an [`OrderForm`].
///
/// Both the intake and the edit path go through here, so the validation
/// policy is identical on create and edit.
pub fn parse_order_form(pairs: &[(String, String)]) -> Result<OrderForm, ServiceError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();
    let mut item_fields: BTreeMap<usize, HashMap<String, String>> = BTreeMap::new();

    for (key, value) in pairs {
        if key.starts_with("items[") {
            let (index, field) = parse_item_key(key).ok_or_else(|| {
                ServiceError::ValidationError(format!("Malformed item field: {key}"))
            })?;
            let slot = item_fields.entry(index).or_default();
            if slot.insert(field.to_string(), value.clone()).is_some() {
                return Err(ServiceError::ValidationError(format!(
                    "Duplicate item field: {key}"
                )));
            }
        } else {
            fields.insert(key.as_str(), value.as_str());
        }
    }

    for (form_name, field_name) in REQUIRED_HEADER_FIELDS {
        let present = fields
            .get(form_name)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(ServiceError::ValidationError(format!(
                "Missing required field: {field_name}"
            )));
        }
    }

    // Item indices must form a contiguous run from 0.
    for (expected, actual) in item_fields.keys().enumerate() {
        if expected != *actual {
            return Err(ServiceError::ValidationError(format!(
                "Item indices must be contiguous starting at 0; missing items[{expected}]"
            )));
        }
    }

    let items = item_fields
        .iter()
        .map(|(index, subfields)| parse_item(*index, subfields))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OrderForm {
        order_number: text(&fields, "orderNo"),
        sender: text(&fields, "senderName"),
        sender_phone: text(&fields, "senderPhone"),
        sender_address: text(&fields, "senderAddress"),
        product_code: text(&fields, "productCode"),
        receiver: text(&fields, "receiverName"),
        receiver_phone: text(&fields, "receiverPhone"),
        receiver_address: text(&fields, "receiverAddress"),
        total_freight: decimal_or_zero(&fields, "totalFee", "total_freight")?,
        payment_method: text(&fields, "paymentMethod"),
        return_requirement: text(&fields, "returnRequirement"),
        other_expenses: decimal_or_zero(&fields, "otherExpenses", "other_expenses")?,
        expense_details: text(&fields, "feeDescription"),
        carrier: text(&fields, "carrier"),
        carrier_address: text(&fields, "carrierAddress"),
        arrival_address: text(&fields, "arrivalAddress"),
        departure_station_phone: opt_text(&fields, "departureStationPhone"),
        arrival_station_phone: text(&fields, "arrivalStationPhone"),
        customer_order_no: text(&fields, "customerOrderNo"),
        date: opt_text(&fields, "date"),
        departure_station: text(&fields, "departureStation"),
        arrival_station: text(&fields, "arrivalStation"),
        transport_method: text(&fields, "transportMethod"),
        delivery_method: text(&fields, "deliveryMethod"),
        sender_sign: text(&fields, "senderSign"),
        receiver_sign: text(&fields, "receiverSign"),
        id_card: text(&fields, "idCard"),
        order_maker: text(&fields, "orderMaker"),
        items,
    })
}

/// Splits `items[3][weight]` into `(3, "weight")`.
fn parse_item_key(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("items[")?;
    let (index, rest) = rest.split_once(']')?;
    let field = rest.strip_prefix('[')?.strip_suffix(']')?;
    if field.is_empty() {
        return None;
    }
    let index: usize = index.parse().ok()?;
    Some((index, field))
}

fn parse_item(index: usize, subfields: &HashMap<String, String>) -> Result<ItemForm, ServiceError> {
    let required_text = |field: &str| -> Result<String, ServiceError> {
        match subfields.get(field).map(|v| v.trim()) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(ServiceError::ValidationError(format!(
                "Missing required field: items[{index}][{field}]"
            ))),
        }
    };
    let required_decimal = |field: &str| -> Result<Decimal, ServiceError> {
        required_text(field)?.parse::<Decimal>().map_err(|_| {
            ServiceError::ValidationError(format!(
                "Invalid numeric value for items[{index}][{field}]"
            ))
        })
    };
    let decimal_or_zero = |field: &str| -> Result<Decimal, ServiceError> {
        match subfields.get(field).map(|v| v.trim()) {
            Some(v) if !v.is_empty() => v.parse::<Decimal>().map_err(|_| {
                ServiceError::ValidationError(format!(
                    "Invalid numeric value for items[{index}][{field}]"
                ))
            }),
            _ => Ok(Decimal::ZERO),
        }
    };

    let quantity = required_text("quantity")?.parse::<i32>().map_err(|_| {
        ServiceError::ValidationError(format!("Invalid numeric value for items[{index}][quantity]"))
    })?;

    Ok(ItemForm {
        item_name: required_text("productName")?,
        package_type: required_text("packageType")?,
        quantity,
        weight: required_decimal("weight")?,
        volume: required_decimal("volume")?,
        delivery_charge: decimal_or_zero("deliveryCharge")?,
        insurance_fee: decimal_or_zero("insuranceFee")?,
        packaging_fee: decimal_or_zero("packagingFee")?,
        goods_value: decimal_or_zero("goodsValue")?,
        remarks: subfields
            .get("remarks")
            .map(|v| v.trim().to_string())
            .unwrap_or_default(),
        freight: required_decimal("freight")?,
    })
}

fn text(fields: &HashMap<&str, &str>, key: &str) -> String {
    fields.get(key).map(|v| v.to_string()).unwrap_or_default()
}

fn opt_text(fields: &HashMap<&str, &str>, key: &str) -> Option<String> {
    fields.get(key).map(|v| v.to_string())
}

fn decimal_or_zero(
    fields: &HashMap<&str, &str>,
    key: &str,
    field_name: &str,
) -> Result<Decimal, ServiceError> {
    match fields.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => v.parse::<Decimal>().map_err(|_| {
            ServiceError::ValidationError(format!("Invalid numeric value for {field_name}"))
        }),
        _ => Ok(Decimal::ZERO),
    }
}
