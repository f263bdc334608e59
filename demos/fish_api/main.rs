//! Fish API served over HTTP
//!
//! Run with:
//!
//! ```text
//! cargo run --example fish_api
//! ```
//!
//! Then try:
//!
//! ```text
//! curl localhost:3000/fish/1
//! curl -u MaxwellPayne:banana -X POST localhost:3000/fish \
//!      -d '{"color":"Blue","fin_count":4,"owner_id":1}'
//! curl -u MaxwellPayne:banana -X DELETE localhost:3000/fish/2
//! ```

use crudgate::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Keeper {
    id: u64,
    head_keeper: bool,
}

impl_identity!(Keeper, id, head_keeper);

fn authenticate(credentials: &Credentials) -> Option<SharedIdentity> {
    let Credentials::Basic { username, password } = credentials;
    let (id, head_keeper) = match (username.as_str(), password.as_str()) {
        ("MaxwellPayne", "banana") => (1, false),
        ("admin", "admin") => (2, true),
        _ => return None,
    };
    Some(Arc::new(Keeper { id, head_keeper }))
}

/// In-memory fish store
#[derive(Debug)]
struct Aquarium {
    fish: RwLock<HashMap<u64, Fish>>,
    next_id: AtomicU64,
}

impl Aquarium {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fish: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    fn find(&self, id: u64) -> Result<Option<Fish>> {
        let fish = self
            .fish
            .read()
            .map_err(|_| anyhow::anyhow!("aquarium lock poisoned"))?;
        Ok(fish.get(&id).cloned())
    }

    fn put(&self, fish: &mut Fish) -> Result<()> {
        if fish.id == 0 {
            fish.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        }
        self.fish
            .write()
            .map_err(|_| anyhow::anyhow!("aquarium lock poisoned"))?
            .insert(fish.id, Fish { aquarium: None, ..fish.clone() });
        Ok(())
    }

    fn remove(&self, id: u64) -> Result<()> {
        self.fish
            .write()
            .map_err(|_| anyhow::anyhow!("aquarium lock poisoned"))?
            .remove(&id);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Fish {
    id: u64,
    color: String,
    fin_count: u32,
    owner_id: u64,
    #[serde(skip)]
    aquarium: Option<Arc<Aquarium>>,
}

impl Fish {
    fn keeper_may_change(&self, user: Option<&dyn Identity>) -> bool {
        user.is_some_and(|u| u.has_admin_privileges() || u.identity_id() == self.owner_id)
    }

    fn aquarium(&self) -> Result<&Arc<Aquarium>> {
        self.aquarium
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("fish {} is not in an aquarium", self.id))
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

    fn can_be_viewed_by(&self, _user: Option<&dyn Identity>) -> bool {
        true
    }

    fn can_be_created_by(&self, user: Option<&dyn Identity>) -> bool {
        user.is_some()
    }

    fn can_be_modified_by(&self, user: Option<&dyn Identity>) -> bool {
        self.keeper_may_change(user)
    }

    fn can_be_deleted_by(&self, user: Option<&dyn Identity>) -> bool {
        self.keeper_may_change(user)
    }

    fn validate(&self) -> Vec<FieldValidationError> {
        if self.fin_count < 2 {
            vec![FieldValidationError::new("fin_count", "Fish must have at least 2 fins")]
        } else {
            Vec::new()
        }
    }

    async fn save(&mut self) -> Result<()> {
        first_validation_error(&self.validate())?;
        let aquarium = self.aquarium()?.clone();
        aquarium.put(self)
    }

    async fn delete(&self) -> Result<()> {
        self.aquarium()?.remove(self.id)
    }
}

struct FishProvider {
    aquarium: Arc<Aquarium>,
}

#[async_trait]
impl ResourceProvider for FishProvider {
    type Model = Fish;

    fn model_factory(&self) -> Fish {
        Fish {
            aquarium: Some(self.aquarium.clone()),
            ..Fish::default()
        }
    }

    async fn get_model_by_id(&self, id: u64) -> Result<Option<Fish>> {
        Ok(self.aquarium.find(id)?.map(|fish| Fish {
            aquarium: Some(self.aquarium.clone()),
            ..fish
        }))
    }

    fn enable_get(&self) -> bool {
        true
    }

    fn enable_create(&self) -> bool {
        true
    }

    fn enable_update(&self) -> bool {
        true
    }

    fn enable_delete(&self) -> bool {
        true
    }

    fn schema(&self) -> ResourceSchema<Fish> {
        immutable_fields!(Fish => [id, owner_id])
            .mutable("color")
            .mutable("fin_count")
            .build()
    }

    fn hooks(&self) -> HookSet<Fish> {
        HookSet::none().on_delete(Farewell)
    }
}

/// Logs every fish that leaves the aquarium
struct Farewell;

#[async_trait]
impl DeleteHooks<Fish> for Farewell {
    async fn post_delete(
        &self,
        fish: &Fish,
        _user: Option<&dyn Identity>,
        err: Option<&anyhow::Error>,
    ) -> Option<Outcome<Fish>> {
        match err {
            None => tracing::info!(fish_id = fish.id, color = %fish.color, "fish released"),
            Some(e) => tracing::warn!(fish_id = fish.id, error = %e, "fish could not be released"),
        }
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let aquarium = Aquarium::new();
    for (color, fin_count) in [("Red", 4), ("Gold", 6)] {
        let mut fish = Fish {
            color: color.to_string(),
            fin_count,
            owner_id: 1,
            ..Fish::default()
        };
        aquarium.put(&mut fish)?;
    }

    let config = match std::env::args().nth(1) {
        Some(path) => ApiConfig::from_yaml_file(&path)?,
        None => ApiConfig::default(),
    };

    ServerBuilder::from_config(config)
        .with_authenticator(authenticate)
        .register("fish", FishProvider { aquarium })?
        .serve("127.0.0.1:3000")
        .await
}
