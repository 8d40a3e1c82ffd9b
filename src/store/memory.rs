use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::models::{
    Connector, ConnectorPatch, ConnectorStatus, DataspaceSettings, NewConnector, SettingsInput, Stats,
};
use super::StoreError;

/// In-process keyed store for connectors and the dataspace settings singleton.
///
/// Not a system of record: contents live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    connectors: RwLock<ConnectorTable>,
    settings: RwLock<Option<DataspaceSettings>>,
}

#[derive(Debug, Default)]
struct ConnectorTable {
    rows: HashMap<Uuid, Connector>,
    // insertion order, so listings are stable
    order: Vec<Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the demo connectors shown on a fresh console
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        for (name, bpn, endpoint) in [
            ("Provider EDC", "BPNL00000003AYRE", "http://localhost:8080/management"),
            ("Consumer EDC", "BPNL00000003BXYZ", "http://localhost:8082/management"),
            ("DTR Service", "BPNL00000003DTR1", "http://localhost:8089"),
        ] {
            store.create_connector(NewConnector {
                name: name.to_string(),
                version: "0.6.0".to_string(),
                bpn: bpn.to_string(),
                endpoint: endpoint.to_string(),
            });
        }
        store
    }

    // ---------- Connectors ----------

    pub fn list_connectors(&self) -> Vec<Connector> {
        let table = self.read_connectors();
        table
            .order
            .iter()
            .filter_map(|id| table.rows.get(id).cloned())
            .collect()
    }

    pub fn get_connector(&self, id: Uuid) -> Result<Connector, StoreError> {
        self.read_connectors()
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| connector_not_found(id))
    }

    pub fn create_connector(&self, input: NewConnector) -> Connector {
        let connector = Connector {
            id: Uuid::new_v4(),
            name: input.name,
            version: input.version,
            bpn: input.bpn,
            endpoint: input.endpoint,
            status: ConnectorStatus::default(),
        };

        let mut table = self.write_connectors();
        table.order.push(connector.id);
        table.rows.insert(connector.id, connector.clone());
        connector
    }

    pub fn update_connector(&self, id: Uuid, patch: ConnectorPatch) -> Result<Connector, StoreError> {
        let mut table = self.write_connectors();
        let existing = table.rows.get_mut(&id).ok_or_else(|| connector_not_found(id))?;
        patch.apply_to(existing);
        Ok(existing.clone())
    }

    pub fn set_connector_status(&self, id: Uuid, status: ConnectorStatus) -> Result<Connector, StoreError> {
        let mut table = self.write_connectors();
        let existing = table.rows.get_mut(&id).ok_or_else(|| connector_not_found(id))?;
        existing.status = status;
        Ok(existing.clone())
    }

    pub fn delete_connector(&self, id: Uuid) -> Result<Connector, StoreError> {
        let mut table = self.write_connectors();
        let removed = table.rows.remove(&id).ok_or_else(|| connector_not_found(id))?;
        table.order.retain(|existing| *existing != id);
        Ok(removed)
    }

    // ---------- Dataspace settings ----------

    pub fn dataspace_settings(&self) -> DataspaceSettings {
        if let Some(settings) = self.settings.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return settings.clone();
        }

        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| DataspaceSettings::empty(Uuid::new_v4()))
            .clone()
    }

    pub fn upsert_dataspace_settings(&self, input: SettingsInput) -> DataspaceSettings {
        let mut slot = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        let id = slot.as_ref().map(|s| s.id).unwrap_or_else(Uuid::new_v4);
        let settings = DataspaceSettings::from_input(id, input);
        *slot = Some(settings.clone());
        settings
    }

    // ---------- Stats ----------

    pub fn stats(&self) -> Stats {
        Stats::from_connector_count(self.read_connectors().rows.len() as u64)
    }

    fn read_connectors(&self) -> RwLockReadGuard<'_, ConnectorTable> {
        self.connectors.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_connectors(&self) -> RwLockWriteGuard<'_, ConnectorTable> {
        self.connectors.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn connector_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound(format!("Connector {}", id))
}
