//! Player inventory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ContextError, Result};
use crate::value::Value;

/// A stack of one item kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub item_type: String,
    /// Value of a single unit.
    pub value: i32,
    pub quantity: u32,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Item {
    /// Create a new item stack.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        item_type: impl Into<String>,
        value: i32,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            item_type: item_type.into(),
            value,
            quantity,
            properties: BTreeMap::new(),
        }
    }

    /// Attach a property to this item.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Ordered collection of item stacks; stacks are merged by item id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, merging into an existing stack with the same id. Stack
    /// sizes saturate at `u32::MAX`.
    pub fn add_item(&mut self, item: Item) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    /// Remove `quantity` units; an emptied stack is dropped.
    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> Result<()> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| ContextError::UnknownItem(item_id.to_string()))?;

        let available = self.items[index].quantity;
        if available < quantity {
            return Err(ContextError::InsufficientQuantity {
                item: item_id.to_string(),
                requested: quantity,
                available,
            });
        }

        if available == quantity {
            self.items.remove(index);
        } else {
            self.items[index].quantity -= quantity;
        }
        Ok(())
    }

    pub fn has_item(&self, item_id: &str, quantity: u32) -> bool {
        self.quantity_of(item_id) >= quantity
    }

    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.items
            .iter()
            .find(|i| i.id == item_id)
            .map_or(0, |i| i.quantity)
    }

    pub fn get(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }
}
