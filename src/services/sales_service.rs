// src/services/sales_service.rs

use chrono::NaiveDate;
use genpdf::{Element, elements, style};
use rust_decimal::Decimal;
use sqlx::Acquire;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, OrderRepository, ProductRepository},
    models::sales::{
        CreateOrderPayload, OrderCsvRecord, OrderDetail, OrderRow, OrderStatus,
    },
};

#[derive(Clone)]
pub struct SalesService {
    order_repo: OrderRepository,
    product_repo: ProductRepository,
    customer_repo: CustomerRepository,
}

/// CSV de vendas para o relatório exportável
pub fn encode_orders_csv(orders: &[OrderRow]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for order in orders {
        writer
            .serialize(OrderCsvRecord {
                display_id: order.display_id,
                customer: order.customer_name.clone(),
                status: order.status.as_str().to_string(),
                total_amount: order.total_amount,
                created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
            .map_err(|e| anyhow::anyhow!("Falha ao escrever CSV: {e}"))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {e}").into())
}

impl SalesService {
    pub fn new(
        order_repo: OrderRepository,
        product_repo: ProductRepository,
        customer_repo: CustomerRepository,
    ) -> Self {
        Self {
            order_repo,
            product_repo,
            customer_repo,
        }
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
        self.order_repo
            .list(conn, search, status, from, to, page, per_page)
            .await
    }

    pub async fn detail(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<OrderDetail, AppError> {
        let order = self.order_repo.find_row_by_id(conn, id).await?;
        let items = self.order_repo.items_of(conn, id).await?;
        Ok(OrderDetail { order, items })
    }

    /// Cria o pedido numa transação: debita o estoque de cada item (falha
    /// tudo se algum não tiver saldo), congela o preço unitário vigente e
    /// soma o total no servidor.
    pub async fn create_order(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &CreateOrderPayload,
    ) -> Result<OrderDetail, AppError> {
        let mut tx = conn.begin().await?;

        // Cliente precisa existir na loja
        self.customer_repo
            .find_by_id(&mut tx, payload.customer_id)
            .await?;

        let mut total = Decimal::ZERO;
        let mut priced_items = Vec::with_capacity(payload.items.len());

        for item in &payload.items {
            let product = self.product_repo.find_by_id(&mut tx, item.product_id).await?;
            self.product_repo
                .decrement_stock(&mut tx, product.id, item.quantity)
                .await?;

            total += product.price * Decimal::from(item.quantity);
            priced_items.push((product.id, item.quantity, product.price));
        }

        let order = self
            .order_repo
            .create_order(&mut tx, tenant_id, payload.customer_id, total)
            .await?;

        for (product_id, quantity, unit_price) in priced_items {
            self.order_repo
                .insert_item(&mut tx, tenant_id, order.id, product_id, quantity, unit_price)
                .await?;
        }

        tx.commit().await?;

        self.detail(conn, order.id).await
    }

    /// Aplica uma transição da máquina de estados. Cancelar um pedido
    /// pendente devolve o estoque dos itens na mesma transação.
    pub async fn transition(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderRow, AppError> {
        let mut tx = conn.begin().await?;

        let order = self.order_repo.find_by_id(&mut tx, id).await?;
        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition(
                order.status.as_str().to_string(),
                next.as_str().to_string(),
            ));
        }

        if next == OrderStatus::Cancelled {
            let items = self.order_repo.raw_items_of(&mut tx, id).await?;
            for item in items {
                self.product_repo
                    .restore_stock(&mut *tx, item.product_id, item.quantity)
                    .await?;
            }
        }

        self.order_repo.set_status(&mut tx, id, next).await?;
        tx.commit().await?;

        self.order_repo.find_row_by_id(conn, id).await
    }

    pub async fn export_csv(
        &self,
        conn: &mut sqlx::PgConnection,
        status: Option<OrderStatus>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<u8>, AppError> {
        let orders = self
            .order_repo
            .list_for_export(conn, status, from, to)
            .await?;
        encode_orders_csv(&orders)
    }

    /// Nota do pedido em PDF, renderizada em memória.
    pub async fn invoice_pdf(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_name: &str,
        id: Uuid,
    ) -> Result<Vec<u8>, AppError> {
        let detail = self.detail(conn, id).await?;

        // Carrega a fonte da pasta 'fonts/'
        let font_family = genpdf::fonts::from_files("./fonts", "Roboto", None)
            .map_err(|_| AppError::FontNotFound("./fonts".to_string()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Pedido #{}", detail.order.display_id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new(tenant_name)
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(elements::Break::new(1.5));

        doc.push(
            elements::Paragraph::new(format!("PEDIDO #{}", detail.order.display_id))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Data: {}",
            detail.order.created_at.format("%d/%m/%Y")
        )));
        doc.push(elements::Paragraph::new(format!(
            "Cliente: {}",
            detail.order.customer_name
        )));
        doc.push(elements::Paragraph::new(format!(
            "Status: {}",
            detail.order.status.as_str()
        )));
        doc.push(elements::Break::new(2));

        // Pesos das colunas: Produto (4), Qtd (1), Unitário (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Produto").styled(style_bold))
            .element(elements::Paragraph::new("Qtd").styled(style_bold))
            .element(elements::Paragraph::new("Unitário").styled(style_bold))
            .element(elements::Paragraph::new("Total").styled(style_bold))
            .push()
            .map_err(|e| anyhow::anyhow!("Tabela do PDF: {e}"))?;

        for item in &detail.items {
            let line_total = item.unit_price * Decimal::from(item.quantity);
            table
                .row()
                .element(elements::Paragraph::new(item.product_name.clone()))
                .element(elements::Paragraph::new(format!("{}", item.quantity)))
                .element(elements::Paragraph::new(format!("R$ {:.2}", item.unit_price)))
                .element(elements::Paragraph::new(format!("R$ {line_total:.2}")))
                .push()
                .map_err(|e| anyhow::anyhow!("Tabela do PDF: {e}"))?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        let mut total_paragraph = elements::Paragraph::new(format!(
            "TOTAL GERAL: R$ {:.2}",
            detail.order.total_amount
        ));
        total_paragraph.set_alignment(genpdf::Alignment::Right);
        doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Falha ao renderizar PDF: {e}"))?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn csv_de_vendas_carrega_cabecalho_e_linhas() {
        let orders = vec![OrderRow {
            id: Uuid::new_v4(),
            display_id: 42,
            customer_id: Uuid::new_v4(),
            customer_name: "Maria".into(),
            total_amount: Decimal::new(24950, 2),
            status: OrderStatus::Paid,
            created_at: Utc::now(),
        }];

        let bytes = encode_orders_csv(&orders).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("display_id,customer,status,total_amount,created_at"));
        assert!(text.contains("42,Maria,Paid,249.50"));
    }

    #[sqlx::test]
    async fn criar_pedido_grava_itens_com_a_loja(pool: sqlx::PgPool) {
        use crate::models::sales::OrderItemPayload;

        let service = SalesService::new(
            OrderRepository::new(),
            ProductRepository::new(),
            CustomerRepository::new(),
        );

        let loja: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (name, subdomain) VALUES ('Acme', 'acme') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let mut tx = pool.begin().await.unwrap();
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(loja.to_string())
            .execute(&mut *tx)
            .await
            .unwrap();

        let cliente: Uuid = sqlx::query_scalar(
            "INSERT INTO customers (tenant_id, name) VALUES ($1, 'Maria') RETURNING id",
        )
        .bind(loja)
        .fetch_one(&mut *tx)
        .await
        .unwrap();
        let produto: Uuid = sqlx::query_scalar(
            "INSERT INTO products (tenant_id, sku, name, category, stock, price) \
             VALUES ($1, 'CAD-01', 'Cadeira', 'Móveis', 10, 50.00) RETURNING id",
        )
        .bind(loja)
        .fetch_one(&mut *tx)
        .await
        .unwrap();

        let payload = CreateOrderPayload {
            customer_id: cliente,
            items: vec![OrderItemPayload {
                product_id: produto,
                quantity: 2,
            }],
        };
        let detail = service.create_order(&mut tx, loja, &payload).await.unwrap();

        assert_eq!(detail.order.total_amount, Decimal::new(10000, 2));
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 2);

        // O item fica carimbado com a loja e o estoque sai na mesma transação
        let item_loja: Uuid = sqlx::query_scalar(
            "SELECT tenant_id FROM order_items WHERE order_id = $1",
        )
        .bind(detail.order.id)
        .fetch_one(&mut *tx)
        .await
        .unwrap();
        assert_eq!(item_loja, loja);

        let estoque: i32 = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(produto)
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(estoque, 8);
    }
}
