//! Repositorio de Paradas
//!
//! Acceso a datos del itinerario: altas, bajas y reordenamiento mientras
//! la ruta está en Planned, y las transiciones de visita una vez en
//! progreso. El reordenamiento y la renumeración tras una baja corren en
//! una sola transacción con renumerado en dos fases, para que el índice
//! UNIQUE (route_id, visit_order) nunca vea un ranking duplicado.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::stop_dto::CreateStopRequest;
use crate::models::stop::Stop;
use crate::utils::errors::AppError;

/// Desplazamiento temporal de rankings durante la renumeración
const REORDER_SHIFT: i32 = 1000;

pub struct StopRepository {
    pool: PgPool,
}

impl StopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Agregar una parada al final del itinerario
    pub async fn create(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        request: CreateStopRequest,
    ) -> Result<Stop, AppError> {
        let mut tx = self.pool.begin().await?;

        let next_order: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(visit_order), 0) + 1 FROM route_stops
             WHERE route_id = $1 AND active = true",
        )
        .bind(route_id)
        .fetch_one(&mut *tx)
        .await?;

        let stop = sqlx::query_as::<_, Stop>(
            r#"
            INSERT INTO route_stops (
                id, route_id, tenant_id, client_id, visit_order,
                estimated_arrival, estimated_duration_min, status, notes,
                distance_from_prev_km, active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, true, now(), now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(route_id)
        .bind(tenant_id)
        .bind(request.client_id)
        .bind(next_order)
        .bind(request.estimated_arrival)
        .bind(request.estimated_duration_min)
        .bind(request.notes)
        .bind(request.distance_from_prev_km)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stop)
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Stop>, AppError> {
        let stop = sqlx::query_as::<_, Stop>(
            "SELECT * FROM route_stops WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stop)
    }

    /// Paradas activas de una ruta, en orden de visita
    pub async fn find_by_route(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Stop>, AppError> {
        let stops = sqlx::query_as::<_, Stop>(
            r#"
            SELECT * FROM route_stops
            WHERE route_id = $1 AND tenant_id = $2 AND active = true
            ORDER BY visit_order
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stops)
    }

    /// Quitar una parada y renumerar a las sobrevivientes (denso 1..N)
    pub async fn remove(
        &self,
        id: Uuid,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE route_stops SET active = false, updated_at = now()
             WHERE id = $1 AND route_id = $2 AND tenant_id = $3 AND active = true",
        )
        .bind(id)
        .bind(route_id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        // Fase 1: desplazar para liberar los rankings finales
        sqlx::query(
            "UPDATE route_stops SET visit_order = visit_order + $2
             WHERE route_id = $1 AND active = true",
        )
        .bind(route_id)
        .bind(REORDER_SHIFT)
        .execute(&mut *tx)
        .await?;

        // Fase 2: renumerar denso conservando el orden relativo
        sqlx::query(
            r#"
            UPDATE route_stops rs
            SET visit_order = ranked.rn, updated_at = now()
            FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY visit_order) AS rn
                FROM route_stops
                WHERE route_id = $1 AND active = true
            ) ranked
            WHERE rs.id = ranked.id
            "#,
        )
        .bind(route_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Reescribir los visit_order de toda la ruta, todo-o-nada
    pub async fn reorder(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
        ranks: &[(Uuid, i32)],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Fase 1: desplazar para liberar los rankings finales
        sqlx::query(
            "UPDATE route_stops SET visit_order = visit_order + $2
             WHERE route_id = $1 AND tenant_id = $3 AND active = true",
        )
        .bind(route_id)
        .bind(REORDER_SHIFT)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        // Fase 2: escribir los rankings finales de la permutación completa
        for (stop_id, rank) in ranks {
            let result = sqlx::query(
                "UPDATE route_stops SET visit_order = $3, updated_at = now()
                 WHERE id = $1 AND route_id = $2 AND active = true",
            )
            .bind(stop_id)
            .bind(route_id)
            .bind(rank)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(AppError::Conflict(
                    "El itinerario cambió durante el reordenamiento".to_string(),
                ));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// llegada: {Pending, EnRoute} -> Visited, con coordenadas.
    ///
    /// El WHERE incluye route_id: una parada de otra ruta nunca transiciona
    /// por más que el id exista para el tenant.
    pub async fn arrive(
        &self,
        id: Uuid,
        route_id: Uuid,
        tenant_id: Uuid,
        arrived_at: DateTime<Utc>,
        lat: f64,
        lng: f64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE route_stops
            SET status = 'visited', actual_arrival = $4,
                arrival_lat = $5, arrival_lng = $6, updated_at = now()
            WHERE id = $1 AND route_id = $2 AND tenant_id = $3 AND active = true
              AND status IN ('pending', 'en_route')
            "#,
        )
        .bind(id)
        .bind(route_id)
        .bind(tenant_id)
        .bind(arrived_at)
        .bind(lat)
        .bind(lng)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// salida: Visited sin salida previa; registra vínculos y concatena notas
    pub async fn depart(
        &self,
        id: Uuid,
        route_id: Uuid,
        tenant_id: Uuid,
        departed_at: DateTime<Utc>,
        visit_id: Option<Uuid>,
        order_id: Option<Uuid>,
        notes: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE route_stops
            SET actual_departure = $4,
                visit_id = COALESCE($5, visit_id),
                order_id = COALESCE($6, order_id),
                notes = CASE
                    WHEN $7::text IS NULL THEN notes
                    WHEN notes IS NULL OR btrim(notes) = '' THEN $7
                    ELSE notes || E'\n' || $7
                END,
                updated_at = now()
            WHERE id = $1 AND route_id = $2 AND tenant_id = $3 AND active = true
              AND status = 'visited' AND actual_departure IS NULL
            "#,
        )
        .bind(id)
        .bind(route_id)
        .bind(tenant_id)
        .bind(departed_at)
        .bind(visit_id)
        .bind(order_id)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// saltar: {Pending, EnRoute} -> Skipped, con motivo obligatorio
    pub async fn skip(
        &self,
        id: Uuid,
        route_id: Uuid,
        tenant_id: Uuid,
        reason: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE route_stops
            SET status = 'skipped', skip_reason = $4, updated_at = now()
            WHERE id = $1 AND route_id = $2 AND tenant_id = $3 AND active = true
              AND status IN ('pending', 'en_route')
            "#,
        )
        .bind(id)
        .bind(route_id)
        .bind(tenant_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Parada actual: la única Visited sin salida registrada
    pub async fn find_current(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Stop>, AppError> {
        let stop = sqlx::query_as::<_, Stop>(
            r#"
            SELECT * FROM route_stops
            WHERE route_id = $1 AND tenant_id = $2 AND active = true
              AND status = 'visited' AND actual_departure IS NULL
            LIMIT 1
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stop)
    }

    /// Siguiente parada: la de menor visit_order aún en {Pending, EnRoute}
    pub async fn find_next(
        &self,
        route_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Stop>, AppError> {
        let stop = sqlx::query_as::<_, Stop>(
            r#"
            SELECT * FROM route_stops
            WHERE route_id = $1 AND tenant_id = $2 AND active = true
              AND status IN ('pending', 'en_route')
            ORDER BY visit_order
            LIMIT 1
            "#,
        )
        .bind(route_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stop)
    }
}
