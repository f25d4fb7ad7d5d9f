// src/db/sales_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::pagination,
    models::sales::{Order, OrderItem, OrderItemRow, OrderRow, OrderStatus},
};

// Todas as queries recebem a conexão RLS de quem chama
#[derive(Clone)]
pub struct OrderRepository;

impl OrderRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("pedido".into()))
    }

    pub async fn find_row_by_id(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<OrderRow, AppError> {
        sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT o.id, o.display_id, o.customer_id, c.name AS customer_name,
                   o.total_amount, o.status, o.created_at
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("pedido".into()))
    }

    pub async fn items_of(
        &self,
        conn: &mut sqlx::PgConnection,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemRow>, AppError> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT i.product_id, p.name AS product_name, p.sku, i.quantity, i.unit_price
            FROM order_items i
            JOIN products p ON p.id = i.product_id
            WHERE i.order_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(order_id)
        .fetch_all(conn)
        .await?;
        Ok(items)
    }

    pub async fn raw_items_of(
        &self,
        conn: &mut sqlx::PgConnection,
        order_id: Uuid,
    ) -> Result<Vec<OrderItem>, AppError> {
        let items =
            sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
                .bind(order_id)
                .fetch_all(conn)
                .await?;
        Ok(items)
    }

    pub async fn list(
        &self,
        conn: &mut sqlx::PgConnection,
        search: &str,
        status: Option<OrderStatus>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<OrderRow>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE ($1 = '' OR c.name ILIKE '%' || $1 || '%' OR o.display_id::text = $1)
              AND ($2::order_status IS NULL OR o.status = $2)
              AND ($3::date IS NULL OR o.created_at >= $3)
              AND ($4::date IS NULL OR o.created_at < $4 + 1)
            "#,
        )
        .bind(search)
        .bind(status)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *conn)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT o.id, o.display_id, o.customer_id, c.name AS customer_name,
                   o.total_amount, o.status, o.created_at
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE ($1 = '' OR c.name ILIKE '%' || $1 || '%' OR o.display_id::text = $1)
              AND ($2::order_status IS NULL OR o.status = $2)
              AND ($3::date IS NULL OR o.created_at >= $3)
              AND ($4::date IS NULL OR o.created_at < $4 + 1)
            ORDER BY o.created_at DESC, o.id
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(search)
        .bind(status)
        .bind(from)
        .bind(to)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&mut *conn)
        .await?;

        Ok((orders, total, page))
    }

    pub async fn list_for_export(
        &self,
        conn: &mut sqlx::PgConnection,
        status: Option<OrderStatus>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<OrderRow>, AppError> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT o.id, o.display_id, o.customer_id, c.name AS customer_name,
                   o.total_amount, o.status, o.created_at
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE ($1::order_status IS NULL OR o.status = $1)
              AND ($2::date IS NULL OR o.created_at >= $2)
              AND ($3::date IS NULL OR o.created_at < $3 + 1)
            ORDER BY o.created_at DESC, o.id
            "#,
        )
        .bind(status)
        .bind(from)
        .bind(to)
        .fetch_all(conn)
        .await?;
        Ok(orders)
    }

    /// Cabeçalho do pedido com o próximo número visível da loja. O display_id
    /// é sequencial por loja, então precisa rodar dentro da transação que
    /// também grava os itens.
    pub async fn create_order(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        customer_id: Uuid,
        total_amount: Decimal,
    ) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (tenant_id, display_id, customer_id, total_amount, status)
            VALUES (
                $1,
                (SELECT COALESCE(MAX(display_id), 0) + 1 FROM orders WHERE tenant_id = $1),
                $2, $3, 'Pending'
            )
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(total_amount)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn insert_item(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO order_items (tenant_id, order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn set_status(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("pedido".into()))
    }
}
