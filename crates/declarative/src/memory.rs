//! In-memory remote store
//!
//! A [`RemoteStore`] backed by maps, with injectable per-key failures and a
//! call log. Used to exercise the engine without a network.

use crate::context::RemoteStore;
use crate::types::ResourceClass;
use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// A recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListVariables,
    ListSecretNames,
    UpsertVariable(String, String),
    /// Secret values are not recorded
    UpsertSecret(String),
    DeleteVariable(String),
    DeleteSecret(String),
}

impl Call {
    /// Whether the call mutates remote state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::ListVariables | Self::ListSecretNames)
    }
}

#[derive(Debug, Default)]
struct Inner {
    variables: BTreeMap<String, String>,
    secrets: BTreeMap<String, String>,
    calls: Vec<Call>,
}

/// In-memory organization store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_upsert: BTreeSet<String>,
    fail_delete: BTreeSet<String>,
    fail_list: BTreeSet<ResourceClass>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a remote variable
    pub fn with_variable(self, name: &str, value: &str) -> Self {
        self.lock().variables.insert(name.to_string(), value.to_string());
        self
    }

    /// Seed a remote secret
    pub fn with_secret(self, name: &str) -> Self {
        self.lock().secrets.insert(name.to_string(), String::new());
        self
    }

    /// Make upserts of `name` fail (either class)
    pub fn fail_upsert(mut self, name: &str) -> Self {
        self.fail_upsert.insert(name.to_string());
        self
    }

    /// Make deletes of `name` fail (either class)
    pub fn fail_delete(mut self, name: &str) -> Self {
        self.fail_delete.insert(name.to_string());
        self
    }

    /// Make listing a class fail
    pub fn fail_list(mut self, class: ResourceClass) -> Self {
        self.fail_list.insert(class);
        self
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of upsert/delete calls so far (including failed ones)
    pub fn mutation_count(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_mutation()).count()
    }

    /// Current value of a variable
    pub fn variable(&self, name: &str) -> Option<String> {
        self.lock().variables.get(name).cloned()
    }

    /// Current variable names
    pub fn variable_names(&self) -> BTreeSet<String> {
        self.lock().variables.keys().cloned().collect()
    }

    /// Current secret names
    pub fn secret_names(&self) -> BTreeSet<String> {
        self.lock().secrets.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_list(&self, class: ResourceClass) -> Result<()> {
        if self.fail_list.contains(&class) {
            bail!("listing {class} failed");
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn list_variables(&self) -> Result<BTreeMap<String, String>> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListVariables);
        self.check_list(ResourceClass::Variables)?;
        Ok(inner.variables.clone())
    }

    fn list_secret_names(&self) -> Result<BTreeSet<String>> {
        let mut inner = self.lock();
        inner.calls.push(Call::ListSecretNames);
        self.check_list(ResourceClass::Secrets)?;
        Ok(inner.secrets.keys().cloned().collect())
    }

    fn upsert_variable(&self, name: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        inner
            .calls
            .push(Call::UpsertVariable(name.to_string(), value.to_string()));
        if self.fail_upsert.contains(name) {
            bail!("upsert of variable {name} rejected");
        }
        inner.variables.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn upsert_secret(&self, name: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::UpsertSecret(name.to_string()));
        if self.fail_upsert.contains(name) {
            bail!("upsert of secret {name} rejected");
        }
        inner.secrets.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete_variable(&self, name: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::DeleteVariable(name.to_string()));
        if self.fail_delete.contains(name) {
            bail!("delete of variable {name} rejected");
        }
        if inner.variables.remove(name).is_none() {
            bail!("variable {name} not found");
        }
        Ok(())
    }

    fn delete_secret(&self, name: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::DeleteSecret(name.to_string()));
        if self.fail_delete.contains(name) {
            bail!("delete of secret {name} rejected");
        }
        if inner.secrets.remove(name).is_none() {
            bail!("secret {name} not found");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_snapshot() {
        let store = MemoryStore::new().with_variable("A", "1").with_secret("S");

        let vars = store.snapshot(ResourceClass::Variables).unwrap();
        let secrets = store.snapshot(ResourceClass::Secrets).unwrap();

        assert_eq!(vars.get("A"), Some(&Some("1".to_string())));
        assert_eq!(secrets.get("S"), Some(&None));
        assert_eq!(store.mutation_count(), 0);
    }

    #[test]
    fn test_injected_failures() {
        let store = MemoryStore::new()
            .with_variable("A", "1")
            .fail_delete("A")
            .fail_list(ResourceClass::Secrets);

        assert!(store.delete_variable("A").is_err());
        assert!(store.list_secret_names().is_err());
        assert_eq!(store.variable("A").as_deref(), Some("1"));
        assert_eq!(store.mutation_count(), 1);
    }

    #[test]
    fn test_secret_values_not_logged() {
        let store = MemoryStore::new();
        store.upsert_secret("TOKEN", "hunter2").unwrap();
        assert_eq!(store.calls(), vec![Call::UpsertSecret("TOKEN".into())]);
    }
}
