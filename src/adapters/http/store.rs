//! Remote record store over HTTP. Implements SlotStorePort.
//!
//! Records are normalized as they are deserialized: day-of-week values become a known
//! weekday or an explicit unknown before anything else sees them.

use super::client::{Listing, RestClient};
use crate::domain::{
    DateRange, DomainError, InventoryDraft, InventoryUpdate, SlotInventory, StatusChange,
    WeeklySlot, WeeklySlotDraft, WeeklyStatus,
};
use crate::ports::SlotStorePort;
use reqwest::Method;
use tracing::info;

const WEEKLY_PATH: &str = "weekly-slots";
const INVENTORY_PATH: &str = "slot-inventory";

pub struct HttpSlotStore {
    rest: RestClient,
}

impl HttpSlotStore {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait::async_trait]
impl SlotStorePort for HttpSlotStore {
    async fn list_weekly(&self) -> Result<Vec<WeeklySlot>, DomainError> {
        let rb = self.rest.request(Method::GET, WEEKLY_PATH);
        let listing: Listing<WeeklySlot> = self.rest.send_json(rb, "list weekly slots").await?;
        let slots = listing.into_vec();
        info!(count = slots.len(), "weekly slots fetched");
        Ok(slots)
    }

    async fn create_weekly(&self, draft: &WeeklySlotDraft) -> Result<WeeklySlot, DomainError> {
        let rb = self.rest.request(Method::POST, WEEKLY_PATH).json(draft);
        self.rest.send_json(rb, "create weekly slot").await
    }

    async fn update_weekly(
        &self,
        id: &str,
        draft: &WeeklySlotDraft,
    ) -> Result<WeeklySlot, DomainError> {
        let rb = self
            .rest
            .request(Method::PATCH, &format!("{}/{}", WEEKLY_PATH, id))
            .json(draft);
        self.rest
            .send_json(rb, &format!("weekly slot {}", id))
            .await
    }

    async fn set_weekly_status(
        &self,
        id: &str,
        status: WeeklyStatus,
    ) -> Result<WeeklySlot, DomainError> {
        let rb = self
            .rest
            .request(Method::PATCH, &format!("{}/{}", WEEKLY_PATH, id))
            .json(&serde_json::json!({ "status": status }));
        self.rest
            .send_json(rb, &format!("weekly slot {}", id))
            .await
    }

    async fn delete_weekly(&self, id: &str) -> Result<(), DomainError> {
        let rb = self
            .rest
            .request(Method::DELETE, &format!("{}/{}", WEEKLY_PATH, id));
        self.rest
            .send_empty(rb, &format!("weekly slot {}", id))
            .await
    }

    async fn list_inventory(&self, range: &DateRange) -> Result<Vec<SlotInventory>, DomainError> {
        let from = range.from.format("%Y-%m-%d").to_string();
        let to = range.to.format("%Y-%m-%d").to_string();
        let rb = self
            .rest
            .request(Method::GET, INVENTORY_PATH)
            .query(&[("from", from.as_str()), ("to", to.as_str())]);
        let listing: Listing<SlotInventory> = self.rest.send_json(rb, "list slot inventory").await?;
        let records = listing.into_vec();
        info!(count = records.len(), %from, %to, "slot inventory fetched");
        Ok(records)
    }

    async fn create_inventory(
        &self,
        draft: &InventoryDraft,
    ) -> Result<SlotInventory, DomainError> {
        let rb = self.rest.request(Method::POST, INVENTORY_PATH).json(draft);
        self.rest.send_json(rb, "create slot").await
    }

    async fn update_inventory(
        &self,
        id: &str,
        update: &InventoryUpdate,
    ) -> Result<SlotInventory, DomainError> {
        let rb = self
            .rest
            .request(Method::PATCH, &format!("{}/{}", INVENTORY_PATH, id))
            .json(update);
        self.rest.send_json(rb, &format!("slot {}", id)).await
    }

    async fn transition_inventory(
        &self,
        id: &str,
        change: &StatusChange,
    ) -> Result<SlotInventory, DomainError> {
        let rb = self
            .rest
            .request(Method::POST, &format!("{}/{}/status", INVENTORY_PATH, id))
            .json(change);
        self.rest.send_json(rb, &format!("slot {}", id)).await
    }

    async fn delete_inventory(&self, id: &str) -> Result<(), DomainError> {
        let rb = self
            .rest
            .request(Method::DELETE, &format!("{}/{}", INVENTORY_PATH, id));
        self.rest.send_empty(rb, &format!("slot {}", id)).await
    }
}
