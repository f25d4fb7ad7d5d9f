// src/db/hr_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::pagination,
    models::hr::{
        AttendanceRecord, AttendanceStatus, Department, DepartmentPayload, Payslip,
    },
};

// Todas as queries recebem a conexão RLS de quem chama
#[derive(Clone)]
pub struct HrRepository;

impl HrRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Departamentos
    // ---

    pub async fn list_departments(
        &self,
        conn: &mut sqlx::PgConnection,
    ) -> Result<Vec<Department>, AppError> {
        let departments =
            sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name")
                .fetch_all(conn)
                .await?;
        Ok(departments)
    }

    pub async fn create_department(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &DepartmentPayload,
    ) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (tenant_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation("nome do departamento".into());
                }
            }
            e.into()
        })
    }

    pub async fn update_department(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        payload: &DepartmentPayload,
    ) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments SET name = $2, description = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.description)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("departamento".into()))
    }

    pub async fn delete_department(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("departamento".into()));
        }
        Ok(())
    }

    // ---
    // Presença
    // ---

    /// Marca presença do dia. Remarcar o mesmo dia sobrescreve o status.
    pub async fn mark_attendance(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendance_records (tenant_id, user_id, date, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, date) DO UPDATE SET status = EXCLUDED.status
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(date)
        .bind(status)
        .fetch_one(conn)
        .await?;
        Ok(record)
    }

    pub async fn list_attendance(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Option<Uuid>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<AttendanceRecord>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM attendance_records
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *conn)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT * FROM attendance_records
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date DESC, user_id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&mut *conn)
        .await?;

        Ok((records, total, page))
    }

    pub async fn list_attendance_for_export(
        &self,
        conn: &mut sqlx::PgConnection,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<(String, NaiveDate, AttendanceStatus)>, AppError> {
        let rows = sqlx::query_as::<_, (String, NaiveDate, AttendanceStatus)>(
            r#"
            SELECT u.email, a.date, a.status
            FROM attendance_records a
            JOIN users u ON u.id = a.user_id
            WHERE ($1::date IS NULL OR a.date >= $1)
              AND ($2::date IS NULL OR a.date <= $2)
            ORDER BY a.date, u.email
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(conn)
        .await?;
        Ok(rows)
    }

    /// Dias com presença marcada (qualquer status) no mês. É a base de
    /// cálculo do valor do dia na folha.
    pub async fn marked_days_in_month(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Uuid,
        month: i32,
        year: i32,
    ) -> Result<i64, AppError> {
        let marked: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM attendance_records
            WHERE user_id = $1
              AND EXTRACT(MONTH FROM date) = $2
              AND EXTRACT(YEAR FROM date) = $3
            "#,
        )
        .bind(user_id)
        .bind(month)
        .bind(year)
        .fetch_one(conn)
        .await?;
        Ok(marked)
    }

    /// Faltas do funcionário dentro do mês (insumo do cálculo da folha)
    pub async fn absent_days_in_month(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Uuid,
        month: i32,
        year: i32,
    ) -> Result<i64, AppError> {
        let absences: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM attendance_records
            WHERE user_id = $1
              AND status = 'Absent'
              AND EXTRACT(MONTH FROM date) = $2
              AND EXTRACT(YEAR FROM date) = $3
            "#,
        )
        .bind(user_id)
        .bind(month)
        .bind(year)
        .fetch_one(conn)
        .await?;
        Ok(absences)
    }

    // ---
    // Folha de pagamento
    // ---

    pub async fn insert_payslip(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        month: i32,
        year: i32,
        basic_salary: Decimal,
        total_deductions: Decimal,
        bonus: Decimal,
        net_salary: Decimal,
    ) -> Result<Payslip, AppError> {
        sqlx::query_as::<_, Payslip>(
            r#"
            INSERT INTO payslips
                (tenant_id, user_id, month, year, basic_salary, total_deductions, bonus, net_salary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(month)
        .bind(year)
        .bind(basic_salary)
        .bind(total_deductions)
        .bind(bonus)
        .bind(net_salary)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::PayslipAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn list_payslips(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Option<Uuid>,
        month: Option<i32>,
        year: Option<i32>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Payslip>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM payslips
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::int IS NULL OR month = $2)
              AND ($3::int IS NULL OR year = $3)
            "#,
        )
        .bind(user_id)
        .bind(month)
        .bind(year)
        .fetch_one(&mut *conn)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let payslips = sqlx::query_as::<_, Payslip>(
            r#"
            SELECT * FROM payslips
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::int IS NULL OR month = $2)
              AND ($3::int IS NULL OR year = $3)
            ORDER BY year DESC, month DESC, created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(month)
        .bind(year)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&mut *conn)
        .await?;

        Ok((payslips, total, page))
    }
}
