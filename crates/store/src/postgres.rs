use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, TrackingId, UserId};
use domain::{
    Cart, CartRepository, CartStatus, Money, Order, OrderLine, OrderRepository, OrderStatus,
    Product, ProductCatalog, ProductId, StockDecrement, StoreError, StoreResult, Tracking,
    TrackingRepository, TrackingStatus,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{PostgresError, Result};

const ORDER_COLUMNS: &str = "id, order_number, user_id, subtotal_cents, shipping_cost_cents, \
     total_cents, shipping_address, payment_method, shipping_method, notes, status, \
     cancellation_reason, tracking_number, carrier_name, created_at, updated_at";

const TRACKING_COLUMNS: &str = "id, order_id, tracking_number, status, current_location, \
     carrier_name, carrier_phone, estimated_delivery_date, actual_delivery_date, notes, \
     is_active, created_at, updated_at";

/// PostgreSQL-backed store implementing every domain port.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Inserts a product or overwrites its name, price and stock.
    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, price_cents = EXCLUDED.price_cents, stock = EXCLUDED.stock
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.stock)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: row.try_get("stock")?,
        })
    }

    fn row_to_cart(row: &PgRow) -> Result<Cart> {
        let data: serde_json::Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLine> {
        Ok(OrderLine {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity: row.try_get("quantity")?,
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        })
    }

    fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            lines,
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
            shipping_cost: Money::from_cents(row.try_get("shipping_cost_cents")?),
            total_amount: Money::from_cents(row.try_get("total_cents")?),
            shipping_address: row.try_get("shipping_address")?,
            payment_method: row.try_get("payment_method")?,
            shipping_method: row.try_get("shipping_method")?,
            notes: row.try_get("notes")?,
            status: status
                .parse::<OrderStatus>()
                .map_err(PostgresError::CorruptRow)?,
            cancellation_reason: row.try_get("cancellation_reason")?,
            tracking_number: row.try_get("tracking_number")?,
            carrier_name: row.try_get("carrier_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_tracking(row: &PgRow) -> Result<Tracking> {
        let status: String = row.try_get("status")?;
        Ok(Tracking {
            id: TrackingId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            tracking_number: row.try_get("tracking_number")?,
            status: status
                .parse::<TrackingStatus>()
                .map_err(PostgresError::CorruptRow)?,
            current_location: row.try_get("current_location")?,
            carrier_name: row.try_get("carrier_name")?,
            carrier_phone: row.try_get("carrier_phone")?,
            estimated_delivery_date: row.try_get("estimated_delivery_date")?,
            actual_delivery_date: row.try_get("actual_delivery_date")?,
            notes: row.try_get("notes")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, name, price_cents, stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn try_decrease_stock(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<StockDecrement> {
        let remaining: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
        )
        .bind(product_id.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(StockDecrement::Applied { remaining });
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(match available {
            Some(available) => StockDecrement::Insufficient { available },
            None => StockDecrement::NotFound,
        })
    }

    async fn add_stock(&self, product_id: &ProductId, quantity: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(product_id.as_str())
            .bind(quantity)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_active_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT data FROM carts WHERE user_id = $1 AND status = $2")
            .bind(user_id.as_uuid())
            .bind(CartStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_cart).transpose()
    }

    async fn upsert_cart(&self, cart: &Cart) -> Result<()> {
        let data = serde_json::to_value(cart)?;
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, status, total_cents, data, expires_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status,
                total_cents = EXCLUDED.total_cents,
                data = EXCLUDED.data,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.id().as_uuid())
        .bind(cart.user_id().as_uuid())
        .bind(cart.status().as_str())
        .bind(cart.total_amount().cents())
        .bind(data)
        .bind(cart.expires_at())
        .bind(cart.updated_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        ))
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.user_id.as_uuid())
        .bind(order.subtotal.cents())
        .bind(order.shipping_cost.cents())
        .bind(order.total_amount.cents())
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(&order.shipping_method)
        .bind(&order.notes)
        .bind(order.status.as_str())
        .bind(&order.cancellation_reason)
        .bind(&order.tracking_number)
        .bind(&order.carrier_name)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines
                    (order_id, position, product_id, name, price_cents, quantity, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(line.product_id.as_str())
            .bind(&line.name)
            .bind(line.price.cents())
            .bind(line.quantity)
            .bind(line.subtotal.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_lines(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, name, price_cents, quantity, subtotal_cents
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id")?;
            lines
                .entry(order_id)
                .or_default()
                .push(Self::row_to_line(row)?);
        }
        Ok(lines)
    }

    async fn fetch_orders(&self, filter: &str, id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {filter} = $1 ORDER BY created_at DESC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let mut lines = self.fetch_lines(&ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_order(row, lines.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn write_order_changes(&self, order: &Order) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, cancellation_reason = $3, tracking_number = $4,
                carrier_name = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.cancellation_reason)
        .bind(&order.tracking_number)
        .bind(&order.carrier_name)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_tracking(&self, tracking: &Tracking) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO trackings ({TRACKING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(tracking.id.as_uuid())
        .bind(tracking.order_id.as_uuid())
        .bind(&tracking.tracking_number)
        .bind(tracking.status.as_str())
        .bind(&tracking.current_location)
        .bind(&tracking.carrier_name)
        .bind(&tracking.carrier_phone)
        .bind(tracking.estimated_delivery_date)
        .bind(tracking.actual_delivery_date)
        .bind(&tracking.notes)
        .bind(tracking.is_active)
        .bind(tracking.created_at)
        .bind(tracking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_tracking_changes(&self, tracking: &Tracking) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE trackings
            SET tracking_number = $2, status = $3, current_location = $4, carrier_name = $5,
                carrier_phone = $6, estimated_delivery_date = $7, actual_delivery_date = $8,
                notes = $9, is_active = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(tracking.id.as_uuid())
        .bind(&tracking.tracking_number)
        .bind(tracking.status.as_str())
        .bind(&tracking.current_location)
        .bind(&tracking.carrier_name)
        .bind(&tracking.carrier_phone)
        .bind(tracking.estimated_delivery_date)
        .bind(tracking.actual_delivery_date)
        .bind(&tracking.notes)
        .bind(tracking.is_active)
        .bind(tracking.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_tracking(&self, column: &str, id: Uuid) -> Result<Option<Tracking>> {
        let row = sqlx::query(&format!(
            "SELECT {TRACKING_COLUMNS} FROM trackings WHERE {column} = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_tracking).transpose()
    }

    async fn fetch_tracking_by_number(&self, tracking_number: &str) -> Result<Option<Tracking>> {
        let row = sqlx::query(&format!(
            "SELECT {TRACKING_COLUMNS} FROM trackings WHERE tracking_number = $1"
        ))
        .bind(tracking_number)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_tracking).transpose()
    }

    async fn fetch_trackings(&self, filter: &str, status: Option<&str>) -> Result<Vec<Tracking>> {
        let sql = format!(
            "SELECT {TRACKING_COLUMNS} FROM trackings WHERE {filter} ORDER BY updated_at DESC"
        );
        let mut query = sqlx::query(&sql);
        if let Some(status) = status {
            query = query.bind(status);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_tracking).collect()
    }

    async fn remove_tracking(&self, tracking_id: TrackingId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM trackings WHERE id = $1")
            .bind(tracking_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProductCatalog for PostgresStore {
    async fn find_product(&self, product_id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(self.fetch_product(product_id).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn decrease_stock(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> StoreResult<StockDecrement> {
        Ok(self.try_decrease_stock(product_id, quantity).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn increase_stock(&self, product_id: &ProductId, quantity: i64) -> StoreResult<()> {
        if self.add_stock(product_id, quantity).await? == 0 {
            return Err(StoreError::NotFound {
                entity: "Product",
                id: product_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CartRepository for PostgresStore {
    async fn find_active_cart(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        Ok(self.fetch_active_cart(user_id).await?)
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        Ok(self.upsert_cart(cart).await?)
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create_order(&self, order: &Order) -> StoreResult<Order> {
        self.insert_order(order).await?;
        Ok(order.clone())
    }

    async fn find_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self
            .fetch_orders("id", order_id.as_uuid())
            .await?
            .into_iter()
            .next())
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        if self.write_order_changes(order).await? == 0 {
            return Err(StoreError::NotFound {
                entity: "Order",
                id: order.id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        Ok(self.fetch_orders("user_id", user_id.as_uuid()).await?)
    }
}

#[async_trait]
impl TrackingRepository for PostgresStore {
    async fn create_tracking(&self, tracking: &Tracking) -> StoreResult<()> {
        Ok(self.insert_tracking(tracking).await?)
    }

    async fn find_tracking(&self, tracking_id: TrackingId) -> StoreResult<Option<Tracking>> {
        Ok(self.fetch_tracking("id", tracking_id.as_uuid()).await?)
    }

    async fn find_tracking_by_order(&self, order_id: OrderId) -> StoreResult<Option<Tracking>> {
        Ok(self.fetch_tracking("order_id", order_id.as_uuid()).await?)
    }

    async fn find_tracking_by_number(
        &self,
        tracking_number: &str,
    ) -> StoreResult<Option<Tracking>> {
        Ok(self.fetch_tracking_by_number(tracking_number).await?)
    }

    async fn update_tracking(&self, tracking: &Tracking) -> StoreResult<()> {
        if self.write_tracking_changes(tracking).await? == 0 {
            return Err(StoreError::NotFound {
                entity: "Tracking",
                id: tracking.id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_tracking(&self, tracking_id: TrackingId) -> StoreResult<bool> {
        Ok(self.remove_tracking(tracking_id).await? > 0)
    }

    async fn list_active_trackings(&self) -> StoreResult<Vec<Tracking>> {
        Ok(self.fetch_trackings("is_active", None).await?)
    }

    async fn list_trackings_by_status(
        &self,
        status: TrackingStatus,
    ) -> StoreResult<Vec<Tracking>> {
        Ok(self
            .fetch_trackings("status = $1", Some(status.as_str()))
            .await?)
    }
}
