//! In-process authoring catalog
//!
//! [`Catalog`] implements [`Authoring`] over concurrent maps. It backs
//! tests and single-process deployments where content is loaded up front.

use async_trait::async_trait;
use dashmap::DashMap;
use itertools::Itertools;

use super::{Authoring, AuthoringError, ContentId, ContentStatus, Item, ItemId, ItemKind, ItemRef};

#[derive(Debug, Clone)]
struct Entry {
    status: ContentStatus,
    order: Vec<ItemRef>,
}

/// Content and items held in memory
#[derive(Debug, Default)]
pub struct Catalog {
    contents: DashMap<ContentId, Entry>,
    items: DashMap<ItemId, Item>,
}

impl Catalog {
    /// Stores a content with the given status, in the given item order
    ///
    /// Any existing content or items with the same ids are replaced.
    pub fn publish(&self, content: impl Into<ContentId>, status: ContentStatus, items: Vec<Item>) {
        let order = items
            .iter()
            .map(|item| ItemRef {
                id: item.id().clone(),
                kind: item.kind(),
            })
            .collect_vec();
        for item in items {
            self.items.insert(item.id().clone(), item);
        }
        self.contents
            .insert(content.into(), Entry { status, order });
    }

    /// Changes the publication status of a content
    pub fn set_status(&self, content: &ContentId, status: ContentStatus) {
        if let Some(mut entry) = self.contents.get_mut(content) {
            entry.status = status;
        }
    }

    /// Replaces a single item body without touching any order
    pub fn replace_item(&self, item: Item) {
        self.items.insert(item.id().clone(), item);
    }
}

#[async_trait]
impl Authoring for Catalog {
    async fn content_status(&self, content: &ContentId) -> Result<ContentStatus, AuthoringError> {
        self.contents
            .get(content)
            .map(|entry| entry.status)
            .ok_or(AuthoringError::NotFound)
    }

    async fn items_in_order(&self, content: &ContentId) -> Result<Vec<ItemRef>, AuthoringError> {
        self.contents
            .get(content)
            .map(|entry| entry.order.clone())
            .ok_or(AuthoringError::NotFound)
    }

    async fn item(&self, id: &ItemId, kind: ItemKind) -> Result<Item, AuthoringError> {
        self.items
            .get(id)
            .filter(|item| item.kind() == kind)
            .map(|item| item.clone())
            .ok_or(AuthoringError::NotFound)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::content::item::tests::{single_choice, slide};

    #[tokio::test]
    async fn test_catalog_publish_and_lookup() {
        let catalog = Catalog::default();
        catalog.publish(
            "quiz",
            ContentStatus::Active,
            vec![
                slide("s1").into(),
                single_choice("q1", &["A", "B"], "A").into(),
            ],
        );

        let content = ContentId::from("quiz");
        assert_eq!(
            catalog.content_status(&content).await,
            Ok(ContentStatus::Active)
        );
        assert_eq!(
            catalog.items_in_order(&content).await.unwrap(),
            vec![ItemRef::slide("s1"), ItemRef::question("q1")]
        );
        assert!(
            catalog
                .item(&ItemId::from("q1"), ItemKind::Question)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_catalog_kind_mismatch_is_not_found() {
        let catalog = Catalog::default();
        catalog.publish("quiz", ContentStatus::Active, vec![slide("s1").into()]);

        assert_eq!(
            catalog.item(&ItemId::from("s1"), ItemKind::Question).await,
            Err(AuthoringError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_catalog_unknown_content() {
        let catalog = Catalog::default();
        let content = ContentId::from("missing");

        assert_eq!(
            catalog.content_status(&content).await,
            Err(AuthoringError::NotFound)
        );
        assert_eq!(
            catalog.items_in_order(&content).await,
            Err(AuthoringError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_catalog_set_status() {
        let catalog = Catalog::default();
        catalog.publish("quiz", ContentStatus::Draft, vec![slide("s1").into()]);
        let content = ContentId::from("quiz");

        catalog.set_status(&content, ContentStatus::Active);
        assert_eq!(
            catalog.content_status(&content).await,
            Ok(ContentStatus::Active)
        );
    }
}
