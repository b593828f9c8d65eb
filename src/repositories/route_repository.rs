//! Repositorio de Rutas
//!
//! Acceso a datos del agregado Route: CRUD con soft-delete, filtros
//! paginados y las transiciones guardadas del ciclo de vida. Cada
//! transición es un único UPDATE con los estados origen válidos en el
//! WHERE, así una transición inválida afecta cero filas y no deja
//! efectos parciales.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::route_dto::{CreateRouteRequest, RouteFilters, UpdateRouteRequest};
use crate::models::route::Route;
use crate::utils::errors::AppError;

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateRouteRequest,
    ) -> Result<Route, AppError> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            INSERT INTO routes (
                id, tenant_id, salesperson_id, salesperson_name, zone_id, name,
                route_date, estimated_start, estimated_end, status,
                estimated_distance_km, notes, initial_cash, load_comments,
                active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'planned',
                    $10, $11, $12, $13, true, now(), now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(request.salesperson_id)
        .bind(request.salesperson_name)
        .bind(request.zone_id)
        .bind(request.name)
        .bind(request.route_date)
        .bind(request.estimated_start)
        .bind(request.estimated_end)
        .bind(request.estimated_distance_km)
        .bind(request.notes)
        .bind(request.initial_cash.unwrap_or(Decimal::ZERO))
        .bind(request.load_comments)
        .fetch_one(&self.pool)
        .await?;

        Ok(route)
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Route>, AppError> {
        let route = sqlx::query_as::<_, Route>(
            "SELECT * FROM routes WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(route)
    }

    /// Listado con filtros y paginación; regresa también el total
    pub async fn list(
        &self,
        tenant_id: Uuid,
        filters: &RouteFilters,
    ) -> Result<(Vec<Route>, i64), AppError> {
        let limit = filters.limit.unwrap_or(50).clamp(1, 200);
        let offset = filters.offset.unwrap_or(0).max(0);

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM routes WHERE tenant_id = ");
        query.push_bind(tenant_id);
        Self::push_filters(&mut query, filters);
        query.push(" ORDER BY route_date DESC, created_at DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let routes = query.build_query_as::<Route>().fetch_all(&self.pool).await?;

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM routes WHERE tenant_id = ");
        count_query.push_bind(tenant_id);
        Self::push_filters(&mut count_query, filters);

        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((routes, total))
    }

    fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &RouteFilters) {
        if !filters.include_inactive.unwrap_or(false) {
            query.push(" AND active = true");
        }
        if let Some(salesperson_id) = filters.salesperson_id {
            query.push(" AND salesperson_id = ");
            query.push_bind(salesperson_id);
        }
        if let Some(zone_id) = filters.zone_id {
            query.push(" AND zone_id = ");
            query.push_bind(zone_id);
        }
        if let Some(status) = filters.status {
            query.push(" AND status = ");
            query.push_bind(status);
        }
        if let Some(date_from) = filters.date_from {
            query.push(" AND route_date >= ");
            query.push_bind(date_from);
        }
        if let Some(date_to) = filters.date_to {
            query.push(" AND route_date <= ");
            query.push_bind(date_to);
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search.trim());
            query.push(" AND (name ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR salesperson_name ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
    }

    /// Actualizar datos de planeación; campos ausentes conservan su valor
    pub async fn update(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        request: UpdateRouteRequest,
    ) -> Result<Option<Route>, AppError> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            UPDATE routes
            SET name = COALESCE($3, name),
                route_date = COALESCE($4, route_date),
                zone_id = COALESCE($5, zone_id),
                estimated_start = COALESCE($6, estimated_start),
                estimated_end = COALESCE($7, estimated_end),
                estimated_distance_km = COALESCE($8, estimated_distance_km),
                notes = COALESCE($9, notes),
                initial_cash = COALESCE($10, initial_cash),
                load_comments = COALESCE($11, load_comments),
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND status <> 'closed'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(request.name)
        .bind(request.route_date)
        .bind(request.zone_id)
        .bind(request.estimated_start)
        .bind(request.estimated_end)
        .bind(request.estimated_distance_km)
        .bind(request.notes)
        .bind(request.initial_cash)
        .bind(request.load_comments)
        .fetch_optional(&self.pool)
        .await?;

        Ok(route)
    }

    /// Soft-delete: las rutas nunca se borran físicamente
    pub async fn soft_delete(&self, id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE routes SET active = false, updated_at = now()
             WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_active_batch(
        &self,
        tenant_id: Uuid,
        route_ids: &[Uuid],
        active: bool,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE routes SET active = $3, updated_at = now()
             WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(route_ids)
        .bind(active)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Rutas pendientes del vendedor: planeadas o en progreso, de hoy en adelante
    pub async fn find_pending_for_salesperson(
        &self,
        tenant_id: Uuid,
        salesperson_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<Route>, AppError> {
        let routes = sqlx::query_as::<_, Route>(
            r#"
            SELECT * FROM routes
            WHERE tenant_id = $1 AND salesperson_id = $2 AND active = true
              AND status IN ('planned', 'in_progress')
              AND route_date >= $3
            ORDER BY route_date, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(salesperson_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }

    /// La ruta del día del vendedor
    pub async fn find_today_for_salesperson(
        &self,
        tenant_id: Uuid,
        salesperson_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Route>, AppError> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            SELECT * FROM routes
            WHERE tenant_id = $1 AND salesperson_id = $2 AND active = true
              AND route_date = $3
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(salesperson_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;

        Ok(route)
    }

    // --- Transiciones del ciclo de vida ---
    // Cada una es un UPDATE guardado; cero filas afectadas significa que la
    // ruta no existe o su estado actual no es un origen válido.

    /// despachar carga: Planned -> AwaitingAcceptance.
    ///
    /// El EXISTS va dentro del mismo UPDATE: un remove de carga concurrente
    /// no puede colarse entre la verificación y la transición.
    pub async fn dispatch(&self, id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE routes SET status = 'awaiting_acceptance', updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND status = 'planned'
              AND EXISTS (
                  SELECT 1 FROM route_cargas c
                  WHERE c.route_id = routes.id AND c.tenant_id = routes.tenant_id
                    AND c.active = true
              )
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// aceptar carga: AwaitingAcceptance -> LoadAccepted
    pub async fn accept_load(&self, id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE routes SET status = 'load_accepted', updated_at = now()
             WHERE id = $1 AND tenant_id = $2 AND status = 'awaiting_acceptance'",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// iniciar: {Planned, LoadAccepted} -> InProgress
    pub async fn start(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE routes SET status = 'in_progress', actual_start = $3, updated_at = now()
             WHERE id = $1 AND tenant_id = $2 AND status IN ('planned', 'load_accepted')",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(started_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// completar: InProgress -> Completed
    pub async fn complete(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        ended_at: DateTime<Utc>,
        actual_distance_km: Option<Decimal>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE routes
            SET status = 'completed', actual_end = $3,
                actual_distance_km = COALESCE($4, actual_distance_km),
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND status = 'in_progress'
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(ended_at)
        .bind(actual_distance_km)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// cerrar: Completed -> Closed (terminal)
    pub async fn close(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        cash_received: Decimal,
        closed_by: &str,
        closed_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE routes
            SET status = 'closed', cash_received = $3, closed_by = $4,
                closed_at = $5, updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND status = 'completed'
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(cash_received)
        .bind(closed_by)
        .bind(closed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// cancelar: {Planned, InProgress} -> Cancelled (terminal)
    ///
    /// El motivo se concatena a las notas; el historial previo no se pisa.
    pub async fn cancel(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        reason: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE routes
            SET status = 'cancelled',
                notes = CASE
                    WHEN notes IS NULL OR btrim(notes) = '' THEN $3
                    ELSE notes || E'\n' || $3
                END,
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND status IN ('planned', 'in_progress')
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
