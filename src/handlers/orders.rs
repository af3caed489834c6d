//! HTTP handlers for the order endpoints.
//!
//! Submissions arrive form-encoded with indexed item fields, so the handlers
//! accept the raw key/value pairs and run them through the form decoder
//! before anything reaches the service layer.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    entities::{order, order_item},
    errors::ServiceError,
    forms,
    AppState,
};

/// POST /orders/create
pub async fn create_order(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<Value>, ServiceError> {
    let form = forms::parse_order_form(&pairs)?;
    let order_id = state.services.orders.create_order(form).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Order created successfully",
        "orderId": order_id,
    })))
}

/// GET /orders/:id
pub async fn get_order_detail(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Value>, ServiceError> {
    let (order, items) = state.services.orders.get_order_with_items(order_id).await?;
    Ok(Json(order_detail_json(&order, &items)))
}

/// GET /orders/:id/edit
///
/// Same payload as the detail fetch; the client uses it to prefill the edit
/// form.
pub async fn edit_order_form(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Value>, ServiceError> {
    let (order, items) = state.services.orders.get_order_with_items(order_id).await?;
    Ok(Json(order_detail_json(&order, &items)))
}

/// POST /orders/:id/edit
pub async fn edit_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, ServiceError> {
    let form = forms::parse_order_form(&pairs)?;
    state.services.orders.update_order(order_id, form).await?;
    Ok(Redirect::to("/orders/history"))
}

/// POST /orders/:id/delete
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Value>, ServiceError> {
    state.services.orders.delete_order(order_id).await?;
    Ok(Json(json!({ "status": "success" })))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<String>,
}

/// GET /orders/history?page=N
///
/// The page parameter never errors: missing, non-numeric, or out-of-range
/// values clamp into the valid page range.
pub async fn order_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Value>, ServiceError> {
    let requested_page = params
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let page = state.services.orders.list_orders(requested_page).await?;

    Ok(Json(json!({
        "orders": page.orders.iter().map(order_json).collect::<Vec<_>>(),
        "total": page.total,
        "page": page.page,
        "total_pages": page.total_pages,
    })))
}

fn order_detail_json(order: &order::Model, items: &[order_item::Model]) -> Value {
    let mut payload = order_json(order);
    payload["items"] = Value::Array(items.iter().map(item_json).collect());
    payload
}

// Decimal columns are serialized as strings so clients never see binary
// floating point artifacts.
fn order_json(order: &order::Model) -> Value {
    json!({
        "id": order.id,
        "order_number": order.order_number,
        "sender": order.sender,
        "sender_phone": order.sender_phone,
        "sender_address": order.sender_address,
        "product_code": order.product_code,
        "receiver": order.receiver,
        "receiver_phone": order.receiver_phone,
        "receiver_address": order.receiver_address,
        "total_freight": order.total_freight.to_string(),
        "payment_method": order.payment_method,
        "return_requirement": order.return_requirement,
        "other_expenses": order.other_expenses.to_string(),
        "expense_details": order.expense_details,
        "carrier": order.carrier,
        "carrier_address": order.carrier_address,
        "arrival_address": order.arrival_address,
        "departure_station_phone": order.departure_station_phone,
        "arrival_station_phone": order.arrival_station_phone,
        "customer_order_no": order.customer_order_no,
        "date": order.date,
        "departure_station": order.departure_station,
        "arrival_station": order.arrival_station,
        "transport_method": order.transport_method,
        "delivery_method": order.delivery_method,
        "sender_sign": order.sender_sign,
        "receiver_sign": order.receiver_sign,
        "id_card": order.id_card,
        "order_maker": order.order_maker,
        "created_at": order.created_at,
        "updated_at": order.updated_at,
    })
}

fn item_json(item: &order_item::Model) -> Value {
    json!({
        "id": item.id,
        "position": item.position,
        "item_name": item.item_name,
        "package_type": item.package_type,
        "quantity": item.quantity,
        "weight": item.weight.to_string(),
        "volume": item.volume.to_string(),
        "delivery_charge": item.delivery_charge.to_string(),
        "insurance_fee": item.insurance_fee.to_string(),
        "packaging_fee": item.packaging_fee.to_string(),
        "goods_value": item.goods_value.to_string(),
        "remarks": item.remarks,
        "freight": item.freight.to_string(),
    })
}
