//! In-memory device directory
//!
//! Reference implementation of [`DeviceDirectory`] keyed by device name.
//! Registrations do not survive a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Device, DeviceDirectory, DirectoryError, NewDevice};

/// Volatile name-keyed directory
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    devices: RwLock<HashMap<String, Device>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceDirectory for MemoryDirectory {
    async fn create(&self, new: NewDevice) -> Result<Device, DirectoryError> {
        let mut devices = self.devices.write().await;

        if devices.contains_key(&new.name) {
            return Err(DirectoryError::NameTaken(new.name));
        }

        let device = Device {
            name: new.name,
            url: new.url,
            report_interval_secs: new.report_interval_secs,
            description: new.description,
            registered_at: Utc::now(),
        };
        devices.insert(device.name.clone(), device.clone());

        tracing::info!(device = %device.name, "Device registered");

        Ok(device)
    }

    async fn get(&self, name: &str) -> Result<Option<Device>, DirectoryError> {
        Ok(self.devices.read().await.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<Device>, DirectoryError> {
        let devices = self.devices.read().await;

        let mut all: Vec<Device> = devices.values().cloned().collect();
        all.sort_by(|a, b| {
            b.registered_at
                .cmp(&a.registered_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(all)
    }

    async fn update(&self, name: &str, new: NewDevice) -> Result<Device, DirectoryError> {
        let mut devices = self.devices.write().await;

        let Some(existing) = devices.get(name) else {
            return Err(DirectoryError::NotFound(name.to_string()));
        };

        if new.name != name && devices.contains_key(&new.name) {
            return Err(DirectoryError::NameTaken(new.name));
        }

        let device = Device {
            name: new.name,
            url: new.url,
            report_interval_secs: new.report_interval_secs,
            description: new.description,
            registered_at: existing.registered_at,
        };
        devices.remove(name);
        devices.insert(device.name.clone(), device.clone());

        tracing::info!(device = %device.name, "Device updated");

        Ok(device)
    }

    async fn remove(&self, name: &str) -> Result<(), DirectoryError> {
        let removed = self.devices.write().await.remove(name);

        match removed {
            Some(_) => {
                tracing::info!(device = name, "Device removed");
                Ok(())
            }
            None => Err(DirectoryError::NotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn new_device(name: &str) -> NewDevice {
        NewDevice {
            name: name.to_string(),
            url: Some(format!("http://{name}.local")),
            report_interval_secs: 60,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let directory = MemoryDirectory::new();

        let created = directory.create(new_device("esp32-01")).await.unwrap();
        assert_eq!(created.name, "esp32-01");
        assert_eq!(created.report_interval_secs, 60);

        let fetched = directory.get("esp32-01").await.unwrap().unwrap();
        assert_eq!(fetched, created);

        assert!(directory.get("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let directory = MemoryDirectory::new();
        directory.create(new_device("esp32-01")).await.unwrap();

        let result = directory.create(new_device("esp32-01")).await;
        assert!(matches!(result, Err(DirectoryError::NameTaken(_))));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let directory = MemoryDirectory::new();
        directory.create(new_device("older")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        directory.create(new_device("newer")).await.unwrap();

        let all = directory.list().await.unwrap();
        let names: Vec<&str> = all.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_update_replaces_fields_keeps_registration_time() {
        let directory = MemoryDirectory::new();
        let created = directory.create(new_device("esp32-01")).await.unwrap();

        let mut changes = new_device("esp32-01");
        changes.report_interval_secs = 5;
        changes.description = Some("garden camera".to_string());

        let updated = directory.update("esp32-01", changes).await.unwrap();
        assert_eq!(updated.report_interval_secs, 5);
        assert_eq!(updated.description.as_deref(), Some("garden camera"));
        assert_eq!(updated.registered_at, created.registered_at);
    }

    #[tokio::test]
    async fn test_update_can_rename() {
        let directory = MemoryDirectory::new();
        directory.create(new_device("old-name")).await.unwrap();

        let updated = directory
            .update("old-name", new_device("new-name"))
            .await
            .unwrap();
        assert_eq!(updated.name, "new-name");

        assert!(directory.get("old-name").await.unwrap().is_none());
        assert!(directory.get("new-name").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_rejects_rename_onto_existing() {
        let directory = MemoryDirectory::new();
        directory.create(new_device("esp32-01")).await.unwrap();
        directory.create(new_device("esp32-02")).await.unwrap();

        let result = directory.update("esp32-02", new_device("esp32-01")).await;
        assert!(matches!(result, Err(DirectoryError::NameTaken(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let directory = MemoryDirectory::new();
        let result = directory.update("ghost", new_device("ghost")).await;
        assert!(matches!(result, Err(DirectoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove() {
        let directory = MemoryDirectory::new();
        directory.create(new_device("esp32-01")).await.unwrap();

        directory.remove("esp32-01").await.unwrap();
        assert!(directory.get("esp32-01").await.unwrap().is_none());

        let result = directory.remove("esp32-01").await;
        assert!(matches!(result, Err(DirectoryError::NotFound(_))));
    }
}
