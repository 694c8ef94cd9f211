use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use petriflow_net::{Arc, Guard, Instance, Place, Transition, Trigger, Workflow, WorkflowId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::types::{ArcRow, GuardRow, InstanceRow, PlaceRow, TransitionRow, TriggerRow, WorkflowRow};
use crate::{Error, Store, Transaction, WorkflowRecord};

/// SQLite-based store implementation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if missing) the database at `url`, e.g.
  /// `sqlite:///home/me/.petriflow/petriflow.db`.
  pub async fn connect(url: &str) -> Result<Self, Error> {
    let options = SqliteConnectOptions::from_str(url)?
      .create_if_missing(true)
      .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(Self::new(pool))
  }

  /// Open a private in-memory database.
  ///
  /// Every connection to `sqlite::memory:` gets its own database, so the pool
  /// is pinned to a single connection that is never recycled.
  pub async fn in_memory() -> Result<Self, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .min_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect_with(options)
      .await?;
    Ok(Self::new(pool))
  }

  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), Error> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl Store for SqliteStore {
  type Transaction = SqliteTransaction;

  async fn begin(&self) -> Result<Self::Transaction, Error> {
    Ok(SqliteTransaction {
      tx: self.pool.begin().await?,
    })
  }

  async fn load_workflow(&self, workflow_id: WorkflowId) -> Result<Workflow, Error> {
    let id = workflow_id.to_string();
    let mut conn = self.pool.acquire().await?;

    let row: WorkflowRow = sqlx::query_as(
      r#"
            SELECT workflow_id, name, pipeline_id, verified, verified_at, created_at
            FROM workflows
            WHERE workflow_id = ?
            "#,
    )
    .bind(&id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("workflow {id}")))?;
    let mut workflow = row.into_workflow()?;

    let places: Vec<PlaceRow> = sqlx::query_as(
      r#"
            SELECT place_id, workflow_id, name, role
            FROM places
            WHERE workflow_id = ?
            ORDER BY rowid ASC
            "#,
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?;

    let transitions: Vec<TransitionRow> = sqlx::query_as(
      r#"
            SELECT transition_id, workflow_id, name
            FROM transitions
            WHERE workflow_id = ?
            ORDER BY rowid ASC
            "#,
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?;

    let triggers: Vec<TriggerRow> = sqlx::query_as(
      r#"
            SELECT trigger_id, workflow_id, transition_id, kind, config
            FROM triggers
            WHERE workflow_id = ?
            ORDER BY rowid ASC
            "#,
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?;

    let arcs: Vec<ArcRow> = sqlx::query_as(
      r#"
            SELECT arc_id, workflow_id, place_id, transition_id, direction
            FROM arcs
            WHERE workflow_id = ?
            ORDER BY rowid ASC
            "#,
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?;

    let guards: Vec<GuardRow> = sqlx::query_as(
      r#"
            SELECT guard_id, workflow_id, arc_id, kind, config
            FROM guards
            WHERE workflow_id = ?
            ORDER BY rowid ASC
            "#,
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?;

    // Rows are re-inserted through the arena so its invariants are checked
    // against what the database actually holds.
    let corrupt = |e: petriflow_net::NetError| Error::Corrupt(e.to_string());
    for row in places {
      workflow.insert_place(Place::try_from(row)?).map_err(corrupt)?;
    }
    for row in transitions {
      workflow
        .insert_transition(Transition::try_from(row)?)
        .map_err(corrupt)?;
    }
    for row in triggers {
      workflow
        .insert_trigger(Trigger::try_from(row)?)
        .map_err(corrupt)?;
    }
    for row in arcs {
      workflow.insert_arc(Arc::try_from(row)?).map_err(corrupt)?;
    }
    for row in guards {
      workflow.insert_guard(Guard::try_from(row)?).map_err(corrupt)?;
    }

    debug!(
      workflow_id = %workflow_id,
      places = workflow.places().len(),
      transitions = workflow.transitions().len(),
      arcs = workflow.arcs().len(),
      "loaded workflow"
    );
    Ok(workflow)
  }

  async fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, Error> {
    let rows: Vec<WorkflowRow> = sqlx::query_as(
      r#"
            SELECT workflow_id, name, pipeline_id, verified, verified_at, created_at
            FROM workflows
            ORDER BY created_at ASC, rowid ASC
            "#,
    )
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(WorkflowRow::into_record).collect()
  }

  async fn update_verification(
    &self,
    workflow_id: WorkflowId,
    verified: bool,
    verified_at: Option<DateTime<Utc>>,
  ) -> Result<(), Error> {
    let mut conn = self.pool.acquire().await?;
    update_verification(&mut *conn, workflow_id, verified, verified_at).await
  }

  async fn delete_workflow(&self, workflow_id: WorkflowId) -> Result<(), Error> {
    let id = workflow_id.to_string();
    let mut tx = self.pool.begin().await?;

    // Owned elements go first, leaves before the things they hang off.
    for table in [
      "guards",
      "arcs",
      "triggers",
      "places",
      "transitions",
      "instances",
    ] {
      sqlx::query(&format!("DELETE FROM {table} WHERE workflow_id = ?"))
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    }

    let result = sqlx::query("DELETE FROM workflows WHERE workflow_id = ?")
      .bind(&id)
      .execute(&mut *tx)
      .await?;
    if result.rows_affected() == 0 {
      return Err(Error::NotFound(format!("workflow {id}")));
    }

    tx.commit().await?;
    debug!(workflow_id = %workflow_id, "deleted workflow");
    Ok(())
  }

  async fn insert_instance(&self, instance: &Instance) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO instances (instance_id, workflow_id, attributes, created_at)
            VALUES (?, ?, ?, ?)
            "#,
    )
    .bind(instance.id.to_string())
    .bind(instance.workflow_id.to_string())
    .bind(Json(&instance.attributes))
    .bind(instance.created_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn list_instances(&self, workflow_id: WorkflowId) -> Result<Vec<Instance>, Error> {
    let rows: Vec<InstanceRow> = sqlx::query_as(
      r#"
            SELECT instance_id, workflow_id, attributes, created_at
            FROM instances
            WHERE workflow_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
    )
    .bind(workflow_id.to_string())
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(Instance::try_from).collect()
  }
}

/// A SQLite transaction. Dropping it without calling `commit` rolls back.
pub struct SqliteTransaction {
  tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl Transaction for SqliteTransaction {
  async fn insert_workflow(&mut self, workflow: &Workflow) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO workflows (workflow_id, name, pipeline_id, verified, verified_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
    )
    .bind(workflow.id.to_string())
    .bind(&workflow.name)
    .bind(&workflow.pipeline_id)
    .bind(workflow.verified)
    .bind(workflow.verified_at)
    .bind(workflow.created_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn insert_transition(&mut self, transition: &Transition) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO transitions (transition_id, workflow_id, name)
            VALUES (?, ?, ?)
            "#,
    )
    .bind(transition.id.to_string())
    .bind(transition.workflow_id.to_string())
    .bind(&transition.name)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn insert_trigger(&mut self, trigger: &Trigger) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO triggers (trigger_id, workflow_id, transition_id, kind, config)
            VALUES (?, ?, ?, ?, ?)
            "#,
    )
    .bind(trigger.id.to_string())
    .bind(trigger.workflow_id.to_string())
    .bind(trigger.transition_id.to_string())
    .bind(trigger.kind.as_str())
    .bind(Json(&trigger.config))
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn insert_place(&mut self, place: &Place) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO places (place_id, workflow_id, name, role)
            VALUES (?, ?, ?, ?)
            "#,
    )
    .bind(place.id.to_string())
    .bind(place.workflow_id.to_string())
    .bind(&place.name)
    .bind(place.role.as_str())
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn insert_arc(&mut self, arc: &Arc) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO arcs (arc_id, workflow_id, place_id, transition_id, direction)
            VALUES (?, ?, ?, ?, ?)
            "#,
    )
    .bind(arc.id.to_string())
    .bind(arc.workflow_id.to_string())
    .bind(arc.place_id.to_string())
    .bind(arc.transition_id.to_string())
    .bind(arc.direction.as_str())
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn insert_guard(&mut self, guard: &Guard) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO guards (guard_id, workflow_id, arc_id, kind, config)
            VALUES (?, ?, ?, ?, ?)
            "#,
    )
    .bind(guard.id.to_string())
    .bind(guard.workflow_id.to_string())
    .bind(guard.arc_id.to_string())
    .bind(guard.kind.as_str())
    .bind(Json(&guard.config))
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn update_verification(
    &mut self,
    workflow_id: WorkflowId,
    verified: bool,
    verified_at: Option<DateTime<Utc>>,
  ) -> Result<(), Error> {
    update_verification(&mut *self.tx, workflow_id, verified, verified_at).await
  }

  async fn commit(self) -> Result<(), Error> {
    self.tx.commit().await?;
    Ok(())
  }
}

async fn update_verification(
  conn: &mut sqlx::SqliteConnection,
  workflow_id: WorkflowId,
  verified: bool,
  verified_at: Option<DateTime<Utc>>,
) -> Result<(), Error> {
  let result = sqlx::query(
    r#"
            UPDATE workflows
            SET verified = ?, verified_at = ?
            WHERE workflow_id = ?
            "#,
  )
  .bind(verified)
  .bind(verified_at)
  .bind(workflow_id.to_string())
  .execute(conn)
  .await?;

  if result.rows_affected() == 0 {
    return Err(Error::NotFound(format!("workflow {workflow_id}")));
  }
  Ok(())
}
