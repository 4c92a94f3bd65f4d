use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use paverly_core::domain::lead::{Lead, LeadId, LeadStatus, NewLead};
use paverly_core::domain::pricing::{DeliveryZone, PricingConfig, ZoneId};
use paverly_core::domain::product::{Product, ProductId};

use super::{
    DeliveryZoneRepository, LeadFilter, LeadRepository, PricingConfigRepository,
    ProductRepository, RepositoryError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// In-memory fakes mirroring the SQL repositories, for tests and offline
/// drivers that do not want a database.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<Mutex<Vec<Product>>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: Arc::new(Mutex::new(products)) }
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = lock(&self.products).clone();
        products.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(products)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(lock(&self.products).iter().find(|product| &product.id == id).cloned())
    }

    async fn upsert(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = lock(&self.products);
        match products.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        lock(&self.products).retain(|product| &product.id != id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPricingConfigRepository {
    config: Arc<Mutex<Option<PricingConfig>>>,
}

#[async_trait::async_trait]
impl PricingConfigRepository for InMemoryPricingConfigRepository {
    async fn load(&self) -> Result<PricingConfig, RepositoryError> {
        Ok(lock(&self.config).clone().unwrap_or_default())
    }

    async fn save(&self, config: PricingConfig) -> Result<PricingConfig, RepositoryError> {
        *lock(&self.config) = Some(config.clone());
        Ok(config)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeliveryZoneRepository {
    zones: Arc<Mutex<Vec<DeliveryZone>>>,
}

impl InMemoryDeliveryZoneRepository {
    pub fn with_zones(zones: Vec<DeliveryZone>) -> Self {
        Self { zones: Arc::new(Mutex::new(zones)) }
    }
}

#[async_trait::async_trait]
impl DeliveryZoneRepository for InMemoryDeliveryZoneRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<DeliveryZone>, RepositoryError> {
        let mut zones = lock(&self.zones).clone();
        if active_only {
            zones.retain(|zone| zone.active);
        }
        zones.sort_by_key(|zone| zone.sort_order);
        Ok(zones)
    }

    async fn upsert(&self, zone: DeliveryZone) -> Result<(), RepositoryError> {
        let mut zones = lock(&self.zones);
        match zones.iter_mut().find(|existing| existing.id == zone.id) {
            Some(existing) => *existing = zone,
            None => zones.push(zone),
        }
        Ok(())
    }

    async fn delete(&self, id: &ZoneId) -> Result<(), RepositoryError> {
        lock(&self.zones).retain(|zone| &zone.id != id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryLeadRepository {
    leads: Arc<Mutex<Vec<Lead>>>,
}

impl InMemoryLeadRepository {
    pub fn leads(&self) -> Vec<Lead> {
        lock(&self.leads).clone()
    }
}

#[async_trait::async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn insert(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
        let created = Lead {
            id: LeadId(Uuid::new_v4().to_string()),
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            session_id: lead.session_id,
            source: lead.source,
            status: LeadStatus::New,
            created_at: Utc::now(),
        };
        lock(&self.leads).push(created.clone());
        Ok(created)
    }

    async fn list(&self, filter: LeadFilter) -> Result<Vec<Lead>, RepositoryError> {
        let mut leads = lock(&self.leads).clone();
        if let Some(source) = &filter.source {
            leads.retain(|lead| &lead.source == source);
        }
        if let Some(status) = filter.status {
            leads.retain(|lead| lead.status == status);
        }
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        leads.truncate(filter.limit.unwrap_or(100).max(0) as usize);
        Ok(leads)
    }

    async fn update_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<(), RepositoryError> {
        if let Some(lead) = lock(&self.leads).iter_mut().find(|lead| &lead.id == id) {
            lead.status = status;
        }
        Ok(())
    }
}
