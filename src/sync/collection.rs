use crate::models::{Property, PropertyPatch};

/// Working copy of the listing collection, in server response order.
///
/// Every operation is keyed by id, never by position.
#[derive(Debug, Default, Clone)]
pub struct CollectionStore {
    entities: Vec<Property>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a whole list/search result
    pub fn replace(&mut self, entities: Vec<Property>) -> &[Property] {
        self.entities = entities;
        &self.entities
    }

    /// Insert a newly created listing at the front. A stale copy with the
    /// same id is dropped so ids stay unique.
    pub fn prepend(&mut self, entity: Property) {
        self.entities.retain(|p| p.id != entity.id);
        self.entities.insert(0, entity);
    }

    /// Shallow-merge `patch` into the listing with `id`.
    ///
    /// `Ok(None)` when the listing is no longer present; the store is left
    /// as is when the merged record does not decode.
    pub fn merge_update(
        &mut self,
        id: i64,
        patch: &PropertyPatch,
    ) -> Result<Option<&Property>, serde_json::Error> {
        let Some(slot) = self.entities.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        *slot = slot.merged(patch)?;
        Ok(Some(&*slot))
    }

    pub fn remove(&mut self, id: i64) -> Option<Property> {
        let pos = self.entities.iter().position(|p| p.id == id)?;
        Some(self.entities.remove(pos))
    }

    pub fn get(&self, id: i64) -> Option<&Property> {
        self.entities.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entities.iter()
    }

    pub fn as_slice(&self) -> &[Property] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(id: i64, price: f64) -> Property {
        serde_json::from_value(json!({ "id": id, "title": format!("Flat {id}"), "price": price }))
            .unwrap()
    }

    fn ids(store: &CollectionStore) -> Vec<i64> {
        store.iter().map(|p| p.id).collect()
    }

    #[test]
    fn replace_keeps_response_order() {
        let mut store = CollectionStore::new();
        store.replace(vec![listing(3, 1.0), listing(1, 2.0), listing(2, 3.0)]);
        assert_eq!(ids(&store), vec![3, 1, 2]);

        store.replace(vec![listing(7, 1.0)]);
        assert_eq!(ids(&store), vec![7]);
    }

    #[test]
    fn prepend_puts_new_listing_first() {
        let mut store = CollectionStore::new();
        store.replace(vec![listing(1, 1.0), listing(2, 2.0)]);
        store.prepend(listing(9, 9.0));
        assert_eq!(ids(&store), vec![9, 1, 2]);

        store.prepend(listing(2, 5.0));
        assert_eq!(ids(&store), vec![2, 9, 1]);
        assert_eq!(store.get(2).unwrap().price, Some(5.0));
    }

    #[test]
    fn merge_update_targets_id() {
        let mut store = CollectionStore::new();
        store.replace(vec![listing(1, 1.0), listing(5, 100000.0)]);

        let patch = json!({ "price": 120000.0 });
        let merged = store.merge_update(5, patch.as_object().unwrap()).unwrap();
        assert_eq!(merged.map(|p| p.price), Some(Some(120000.0)));
        assert_eq!(store.get(5).unwrap().title, "Flat 5");
        assert_eq!(store.get(1).unwrap().price, Some(1.0));
    }

    #[test]
    fn merge_update_on_missing_id_is_a_noop() {
        let mut store = CollectionStore::new();
        store.replace(vec![listing(1, 1.0)]);

        let patch = json!({ "price": 2.0 });
        assert!(store.merge_update(5, patch.as_object().unwrap()).unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn undecodable_merge_leaves_record() {
        let mut store = CollectionStore::new();
        store.replace(vec![listing(1, 1.0)]);

        let patch = json!({ "price": "free" });
        assert!(store.merge_update(1, patch.as_object().unwrap()).is_err());
        assert_eq!(store.get(1).unwrap().price, Some(1.0));
    }

    #[test]
    fn remove_by_id() {
        let mut store = CollectionStore::new();
        store.replace(vec![listing(1, 1.0), listing(2, 2.0)]);

        assert_eq!(store.remove(1).map(|p| p.id), Some(1));
        assert!(store.remove(1).is_none());
        assert_eq!(ids(&store), vec![2]);
    }
}
