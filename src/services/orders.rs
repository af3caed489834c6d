use crate::{
    db::DbPool,
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_item::{self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity},
    errors::ServiceError,
    forms::{ItemForm, OrderForm},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Fixed page size of the order history listing.
pub const HISTORY_PAGE_SIZE: u64 = 10;

/// One page of the order history listing.
#[derive(Debug)]
pub struct OrderHistoryPage {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

/// Service for managing waybill orders and their line items.
///
/// Every multi-row write runs inside a single transaction, so a failure
/// part-way through persists nothing.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates a new order together with all its line items.
    #[instrument(skip(self, form), fields(order_number = %form.order_number))]
    pub async fn create_order(&self, form: OrderForm) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await?;

        let duplicate = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(form.order_number.as_str()))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Order number {} already exists",
                form.order_number
            )));
        }

        let item_count = form.items.len();
        let order_active_model = order_active_model_from_form(order_id, &form, now);
        order_active_model.insert(&txn).await?;
        insert_items(&txn, order_id, &form.items, now).await?;

        txn.commit().await?;

        info!(order_id = %order_id, item_count, "Order created successfully");
        Ok(order_id)
    }

    /// Retrieves an order and its items in submitted order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_with_items(
        &self,
        order_id: Uuid,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Position)
            .all(db)
            .await?;

        Ok((order, items))
    }

    /// Lists orders in creation order, ten per page. The requested page is
    /// clamped into the valid range rather than rejected.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, requested_page: u64) -> Result<OrderHistoryPage, ServiceError> {
        let db = &*self.db_pool;

        let paginator = OrderEntity::find()
            .order_by_asc(order::Column::CreatedAt)
            .order_by_asc(order::Column::Id)
            .paginate(db, HISTORY_PAGE_SIZE);

        let total = paginator.num_items().await?;
        let total_pages = total.div_ceil(HISTORY_PAGE_SIZE).max(1);
        let page = clamp_page(requested_page, total_pages);

        let orders = paginator.fetch_page(page - 1).await?;

        info!(
            total = total,
            page = page,
            returned_count = orders.len(),
            "Orders listed"
        );

        Ok(OrderHistoryPage {
            orders,
            total,
            page,
            total_pages,
        })
    }

    /// Applies a full header update and replaces the item set wholesale from
    /// the submitted form, in one transaction.
    #[instrument(skip(self, form), fields(order_id = %order_id))]
    pub async fn update_order(&self, order_id: Uuid, form: OrderForm) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for update");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        let duplicate = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(form.order_number.as_str()))
            .filter(order::Column::Id.ne(order_id))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Order number {} already exists",
                form.order_number
            )));
        }

        let item_count = form.items.len();
        let mut order_active_model =
            order_active_model_from_form(order_id, &form, existing.created_at);
        order_active_model.updated_at = Set(Some(now));
        order_active_model.update(&txn).await?;

        // Replace the item set wholesale.
        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        insert_items(&txn, order_id, &form.items, now).await?;

        txn.commit().await?;

        info!(order_id = %order_id, item_count, "Order updated successfully");
        Ok(())
    }

    /// Deletes an order and, via ownership cascade, all its items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for deletion");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        OrderEntity::delete_by_id(order.id).exec(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, "Order deleted successfully");
        Ok(())
    }
}

fn clamp_page(requested: u64, total_pages: u64) -> u64 {
    requested.clamp(1, total_pages)
}

fn order_active_model_from_form(
    order_id: Uuid,
    form: &OrderForm,
    created_at: chrono::DateTime<Utc>,
) -> OrderActiveModel {
    OrderActiveModel {
        id: Set(order_id),
        order_number: Set(form.order_number.clone()),
        sender: Set(form.sender.clone()),
        sender_phone: Set(form.sender_phone.clone()),
        sender_address: Set(form.sender_address.clone()),
        product_code: Set(form.product_code.clone()),
        receiver: Set(form.receiver.clone()),
        receiver_phone: Set(form.receiver_phone.clone()),
        receiver_address: Set(form.receiver_address.clone()),
        total_freight: Set(form.total_freight),
        payment_method: Set(form.payment_method.clone()),
        return_requirement: Set(form.return_requirement.clone()),
        other_expenses: Set(form.other_expenses),
        expense_details: Set(form.expense_details.clone()),
        carrier: Set(form.carrier.clone()),
        carrier_address: Set(form.carrier_address.clone()),
        arrival_address: Set(form.arrival_address.clone()),
        departure_station_phone: Set(form.departure_station_phone.clone()),
        arrival_station_phone: Set(form.arrival_station_phone.clone()),
        customer_order_no: Set(form.customer_order_no.clone()),
        date: Set(form.date.clone()),
        departure_station: Set(form.departure_station.clone()),
        arrival_station: Set(form.arrival_station.clone()),
        transport_method: Set(form.transport_method.clone()),
        delivery_method: Set(form.delivery_method.clone()),
        sender_sign: Set(form.sender_sign.clone()),
        receiver_sign: Set(form.receiver_sign.clone()),
        id_card: Set(form.id_card.clone()),
        order_maker: Set(form.order_maker.clone()),
        created_at: Set(created_at),
        updated_at: Set(None),
    }
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    items: &[ItemForm],
    now: chrono::DateTime<Utc>,
) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Ok(());
    }

    let models: Vec<OrderItemActiveModel> = items
        .iter()
        .enumerate()
        .map(|(position, item)| OrderItemActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            position: Set(position as i32),
            item_name: Set(item.item_name.clone()),
            package_type: Set(item.package_type.clone()),
            quantity: Set(item.quantity),
            weight: Set(item.weight),
            volume: Set(item.volume),
            delivery_charge: Set(item.delivery_charge),
            insurance_fee: Set(item.insurance_fee),
            packaging_fee: Set(item.packaging_fee),
            goods_value: Set(item.goods_value),
            remarks: Set(item.remarks.clone()),
            freight: Set(item.freight),
            created_at: Set(now),
        })
        .collect();

    OrderItemEntity::insert_many(models).exec(conn).await?;
    Ok(())
}
