//! Shared fixtures: a Fish resource kept in an in-memory, call-counting pond
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use crudgate::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Identities
// ============================================================================

#[derive(Debug, Clone)]
pub struct User {
    pub id: u64,
    pub is_admin: bool,
}

impl_identity!(User, id, is_admin);

pub fn user(id: u64) -> Option<SharedIdentity> {
    Some(Arc::new(User {
        id,
        is_admin: false,
    }))
}

pub fn admin() -> Option<SharedIdentity> {
    Some(Arc::new(User {
        id: 99,
        is_admin: true,
    }))
}

/// Accepts "MaxwellPayne:banana" (user 1) and "admin:admin" (admin 99)
pub fn authenticate(credentials: &Credentials) -> Option<SharedIdentity> {
    match credentials {
        Credentials::Basic { username, password } => {
            match (username.as_str(), password.as_str()) {
                ("MaxwellPayne", "banana") => user(1),
                ("admin", "admin") => admin(),
                _ => None,
            }
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// In-memory fish store counting every call made against it
#[derive(Debug, Default)]
pub struct Pond {
    fish: Mutex<HashMap<u64, Fish>>,
    next_id: AtomicU64,
    pub lookups: AtomicUsize,
    pub saves: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_lookups: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl Pond {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        })
    }

    /// Insert a fish directly, bypassing the dispatcher
    pub fn stock(self: &Arc<Self>, mut fish: Fish) -> Fish {
        if fish.id == 0 {
            fish.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        }
        self.fish
            .lock()
            .expect("pond lock")
            .insert(fish.id, Fish { pond: None, ..fish.clone() });
        fish.pond = Some(self.clone());
        fish
    }

    pub fn peek(&self, id: u64) -> Option<Fish> {
        self.fish.lock().expect("pond lock").get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.fish.lock().expect("pond lock").len()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn find(self: &Arc<Self>, id: u64) -> anyhow::Result<Option<Fish>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            anyhow::bail!("pond is frozen over");
        }
        Ok(self.peek(id).map(|mut fish| {
            fish.pond = Some(self.clone());
            fish
        }))
    }

    fn put(&self, fish: &mut Fish) {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if fish.id == 0 {
            fish.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            fish.create_date = Utc::now();
        }
        self.fish
            .lock()
            .expect("pond lock")
            .insert(fish.id, Fish { pond: None, ..fish.clone() });
    }

    fn remove(&self, id: u64) -> anyhow::Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            anyhow::bail!("the fish slipped away");
        }
        self.fish.lock().expect("pond lock").remove(&id);
        Ok(())
    }
}

// ============================================================================
// Resource
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    pub installed_by: u64,
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fish {
    pub id: u64,
    pub color: String,
    pub fin_count: u32,
    pub is_immortal: bool,
    pub owner_id: u64,
    pub create_date: DateTime<Utc>,
    pub tank: Tank,
    #[serde(skip)]
    pub pond: Option<Arc<Pond>>,
}

impl Fish {
    pub fn new(owner_id: u64, color: &str, fin_count: u32) -> Self {
        Self {
            color: color.to_string(),
            fin_count,
            owner_id,
            ..Self::default()
        }
    }

    fn may_change(&self, user: Option<&dyn Identity>) -> bool {
        user.is_some_and(|u| u.has_admin_privileges() || u.identity_id() == self.owner_id)
    }
}

#[async_trait]
impl Resource for Fish {
    fn resource_name() -> &'static str {
        "Fish"
    }

    fn unique_id(&self) -> u64 {
        self.id
    }

    fn can_be_viewed_by(&self, user: Option<&dyn Identity>) -> bool {
        // dark fish are private to their owner
        self.color != "Black" || self.may_change(user)
    }

    fn can_be_created_by(&self, user: Option<&dyn Identity>) -> bool {
        user.is_some()
    }

    fn can_be_modified_by(&self, user: Option<&dyn Identity>) -> bool {
        self.may_change(user)
    }

    fn can_be_deleted_by(&self, user: Option<&dyn Identity>) -> bool {
        self.may_change(user)
    }

    fn validate(&self) -> Vec<FieldValidationError> {
        let mut errors = Vec::new();
        if self.fin_count < 2 {
            errors.push(FieldValidationError::new(
                "fin_count",
                "Fish must have at least 2 fins",
            ));
        }
        if self.color.trim().is_empty() {
            errors.push(FieldValidationError::new("color", "Color cannot be blank"));
        }
        errors
    }

    async fn save(&mut self) -> Result<()> {
        first_validation_error(&self.validate())?;
        let pond = self
            .pond
            .clone()
            .ok_or_else(|| anyhow::anyhow!("fish is not attached to a pond"))?;
        pond.put(self);
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        match &self.pond {
            Some(pond) => pond.remove(self.id),
            None => anyhow::bail!("fish is not attached to a pond"),
        }
    }
}

// ============================================================================
// Provider
// ============================================================================

pub fn tank_schema() -> ResourceSchema<Tank> {
    immutable_fields!(Tank => [installed_by]).mutable("label").build()
}

pub fn fish_schema() -> ResourceSchema<Fish> {
    immutable_fields!(Fish => [id, owner_id, create_date])
        .mutable("color")
        .mutable("fin_count")
        .mutable("is_immortal")
        .embedded("tank", |f| &f.tank, |f| &mut f.tank, tank_schema())
        .build()
}

pub struct FishProvider {
    pub pond: Arc<Pond>,
    pub get: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub hooks: HookSet<Fish>,
    pub schema: fn() -> ResourceSchema<Fish>,
}

impl FishProvider {
    pub fn new(pond: Arc<Pond>) -> Self {
        Self {
            pond,
            get: true,
            create: true,
            update: true,
            delete: true,
            hooks: HookSet::none(),
            schema: fish_schema,
        }
    }

    pub fn with_hooks(mut self, hooks: HookSet<Fish>) -> Self {
        self.hooks = hooks;
        self
    }
}

#[async_trait]
impl ResourceProvider for FishProvider {
    type Model = Fish;

    fn model_factory(&self) -> Fish {
        Fish {
            pond: Some(self.pond.clone()),
            ..Fish::default()
        }
    }

    async fn get_model_by_id(&self, id: u64) -> Result<Option<Fish>> {
        self.pond.find(id)
    }

    fn enable_get(&self) -> bool {
        self.get
    }

    fn enable_create(&self) -> bool {
        self.create
    }

    fn enable_update(&self) -> bool {
        self.update
    }

    fn enable_delete(&self) -> bool {
        self.delete
    }

    fn schema(&self) -> ResourceSchema<Fish> {
        (self.schema)()
    }

    fn hooks(&self) -> HookSet<Fish> {
        self.hooks.clone()
    }

    fn decode(&self, body: serde_json::Value) -> std::result::Result<Fish, serde_json::Error> {
        let mut fish = decode_onto(self.model_factory(), body)?;
        fish.pond = Some(self.pond.clone());
        Ok(fish)
    }
}

/// Register `provider` under "fish" with the default configuration
pub fn register(provider: FishProvider) -> RegisteredProvider<FishProvider> {
    register_with(provider, &ApiConfig::default())
}

pub fn register_with(
    provider: FishProvider,
    config: &ApiConfig,
) -> RegisteredProvider<FishProvider> {
    RegisteredProvider::new("fish", provider, config).expect("fish provider registers")
}
