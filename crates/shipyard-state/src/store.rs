//! StateStore — redb-backed entity store for Shipyard.
//!
//! Provides typed operations over deployments and services. All values are
//! JSON-serialized into redb's `&[u8]` value columns. Mutations that touch a
//! record's current contents (`modify_deployment`) or more than one table
//! (`create_service`, `delete_deployment`) run inside one write transaction.

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe entity store backed by an in-memory redb database.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Create an empty store. State lives as long as the last clone.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        txn.open_table(SERVICES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Deployments ────────────────────────────────────────────────

    /// Insert a new deployment.
    ///
    /// Fails with `Conflict` if another deployment in the same namespace
    /// already uses the name.
    pub fn insert_deployment(&self, deployment: &Deployment) -> StateResult<()> {
        let value = serde_json::to_vec(deployment).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            for entry in table.iter().map_err(map_err!(Read))? {
                let (_, existing) = entry.map_err(map_err!(Read))?;
                let existing: Deployment =
                    serde_json::from_slice(existing.value()).map_err(map_err!(Deserialize))?;
                if existing.id != deployment.id
                    && existing.namespace == deployment.namespace
                    && existing.name == deployment.name
                {
                    return Err(StateError::Conflict(format!(
                        "{}/{}",
                        deployment.namespace, deployment.name
                    )));
                }
            }
            table
                .insert(deployment.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %deployment.id, name = %deployment.name, "deployment stored");
        Ok(())
    }

    /// Get a deployment by id.
    pub fn get_deployment(&self, id: &str) -> StateResult<Option<Deployment>> {
        self.get_record(DEPLOYMENTS, id)
    }

    /// List deployments, optionally restricted to one namespace.
    ///
    /// Ordered by id, so the order is stable between writes.
    pub fn list_deployments(&self, namespace: Option<&str>) -> StateResult<Vec<Deployment>> {
        let mut deployments: Vec<Deployment> = self.list_records(DEPLOYMENTS)?;
        if let Some(namespace) = namespace {
            deployments.retain(|d| d.namespace == namespace);
        }
        Ok(deployments)
    }

    /// Apply `f` to a deployment and write it back, atomically.
    ///
    /// Returns the updated record together with `f`'s result, or `None` if
    /// the deployment does not exist (in which case nothing is written).
    pub fn modify_deployment<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Deployment) -> R,
    ) -> StateResult<Option<(Deployment, R)>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let outcome = {
            let mut table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            let current: Option<Deployment> = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    Some(serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?)
                }
                None => None,
            };
            match current {
                Some(mut deployment) => {
                    let result = f(&mut deployment);
                    let value = serde_json::to_vec(&deployment).map_err(map_err!(Serialize))?;
                    table
                        .insert(id, value.as_slice())
                        .map_err(map_err!(Write))?;
                    Some((deployment, result))
                }
                None => None,
            }
        };
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(outcome)
    }

    /// Delete a deployment and every service that references it.
    ///
    /// Returns the ids of the removed services, or `None` if the deployment
    /// did not exist.
    pub fn delete_deployment(&self, id: &str) -> StateResult<Option<Vec<ServiceId>>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let removed = {
            let mut deployments = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            let existed = deployments.remove(id).map_err(map_err!(Write))?.is_some();
            if existed {
                let mut services = txn.open_table(SERVICES).map_err(map_err!(Table))?;
                let mut dependents = Vec::new();
                for entry in services.iter().map_err(map_err!(Read))? {
                    let (key, value) = entry.map_err(map_err!(Read))?;
                    let svc: Service =
                        serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                    if svc.deployment_id == id {
                        dependents.push(key.value().to_string());
                    }
                }
                for service_id in &dependents {
                    services
                        .remove(service_id.as_str())
                        .map_err(map_err!(Write))?;
                }
                Some(dependents)
            } else {
                None
            }
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, cascaded = ?removed, "deployment deleted");
        Ok(removed)
    }

    // ── Services ───────────────────────────────────────────────────

    /// Insert a service built from its owning deployment.
    ///
    /// The deployment lookup and the insert share one transaction, so the
    /// service can never be stored against a deployment that is being
    /// deleted concurrently. Returns `None` if the deployment is missing.
    pub fn create_service(
        &self,
        deployment_id: &str,
        build: impl FnOnce(&Deployment) -> Service,
    ) -> StateResult<Option<Service>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let created = {
            let deployments = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            let owner: Option<Deployment> =
                match deployments.get(deployment_id).map_err(map_err!(Read))? {
                    Some(guard) => Some(
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?,
                    ),
                    None => None,
                };
            match owner {
                Some(owner) => {
                    let svc = build(&owner);
                    let value = serde_json::to_vec(&svc).map_err(map_err!(Serialize))?;
                    let mut services = txn.open_table(SERVICES).map_err(map_err!(Table))?;
                    services
                        .insert(svc.id.as_str(), value.as_slice())
                        .map_err(map_err!(Write))?;
                    Some(svc)
                }
                None => None,
            }
        };
        txn.commit().map_err(map_err!(Transaction))?;
        if let Some(svc) = &created {
            debug!(id = %svc.id, %deployment_id, "service stored");
        }
        Ok(created)
    }

    /// List all services, ordered by id.
    pub fn list_services(&self) -> StateResult<Vec<Service>> {
        self.list_records(SERVICES)
    }

    /// Delete a service by id. Returns true if it existed.
    pub fn delete_service(&self, id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, existed, "service deleted");
        Ok(existed)
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn get_record<T: DeserializeOwned>(&self, def: JsonTable, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(def).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn list_records<T: DeserializeOwned>(&self, def: JsonTable) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(def).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: T = serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }
}
