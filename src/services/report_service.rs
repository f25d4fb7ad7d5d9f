// src/services/report_service.rs

use chrono::NaiveDate;
use genpdf::{Element, elements, style};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{OrderRepository, ProductRepository},
    models::report::ReportSummary,
};

#[derive(Clone)]
pub struct ReportService {
    product_repo: ProductRepository,
    order_repo: OrderRepository,
}

impl ReportService {
    pub fn new(product_repo: ProductRepository, order_repo: OrderRepository) -> Self {
        Self {
            product_repo,
            order_repo,
        }
    }

    /// Números do painel inicial. Roda inteiro na conexão RLS da loja.
    pub async fn summary(&self, conn: &mut sqlx::PgConnection) -> Result<ReportSummary, AppError> {
        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *conn)
            .await?;
        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&mut *conn)
            .await?;
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&mut *conn)
            .await?;
        let revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status IN ('Paid', 'Shipped')",
        )
        .fetch_one(&mut *conn)
        .await?;

        let low_stock = self.product_repo.list_low_stock(conn).await?;

        Ok(ReportSummary {
            products,
            customers,
            orders,
            revenue,
            low_stock,
        })
    }

    /// Relatório de vendas do período em PDF.
    pub async fn sales_pdf(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_name: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<u8>, AppError> {
        let orders = self.order_repo.list_for_export(conn, None, from, to).await?;

        let font_family = genpdf::fonts::from_files("./fonts", "Roboto", None)
            .map_err(|_| AppError::FontNotFound("./fonts".to_string()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title("Relatório de Vendas");
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new(tenant_name)
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(
            elements::Paragraph::new("RELATÓRIO DE VENDAS")
                .styled(style::Style::new().bold().with_font_size(14)),
        );

        let period = match (from, to) {
            (Some(from), Some(to)) => format!("Período: {from} a {to}"),
            (Some(from), None) => format!("Período: a partir de {from}"),
            (None, Some(to)) => format!("Período: até {to}"),
            (None, None) => "Período: completo".to_string(),
        };
        doc.push(elements::Paragraph::new(period));
        doc.push(elements::Break::new(2));

        let mut table = elements::TableLayout::new(vec![1, 3, 2, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Nº").styled(style_bold))
            .element(elements::Paragraph::new("Cliente").styled(style_bold))
            .element(elements::Paragraph::new("Status").styled(style_bold))
            .element(elements::Paragraph::new("Data").styled(style_bold))
            .element(elements::Paragraph::new("Total").styled(style_bold))
            .push()
            .map_err(|e| anyhow::anyhow!("Tabela do PDF: {e}"))?;

        let mut grand_total = Decimal::ZERO;
        for order in &orders {
            grand_total += order.total_amount;
            table
                .row()
                .element(elements::Paragraph::new(format!("#{}", order.display_id)))
                .element(elements::Paragraph::new(order.customer_name.clone()))
                .element(elements::Paragraph::new(order.status.as_str()))
                .element(elements::Paragraph::new(
                    order.created_at.format("%d/%m/%Y").to_string(),
                ))
                .element(elements::Paragraph::new(format!(
                    "R$ {:.2}",
                    order.total_amount
                )))
                .push()
                .map_err(|e| anyhow::anyhow!("Tabela do PDF: {e}"))?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        let mut total_paragraph =
            elements::Paragraph::new(format!("TOTAL DO PERÍODO: R$ {grand_total:.2}"));
        total_paragraph.set_alignment(genpdf::Alignment::Right);
        doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Falha ao renderizar PDF: {e}"))?;

        Ok(buffer)
    }
}
