use std::collections::BTreeMap;

use tokio::sync::RwLock;

pub type Rows<T> = BTreeMap<i64, T>;

struct Inner<T> {
    next_id: i64,
    rows: Rows<T>,
}

/// An id-keyed collection with sequence-style id assignment. Rows iterate in
/// insertion (id) order. Ids are never reused.
pub struct Table<T> {
    inner: RwLock<Inner<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Table<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl<T: Clone> Table<T> {
    pub async fn insert<F>(&self, build: F) -> T
    where
        F: FnOnce(i64) -> T,
    {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        let row = build(id);
        inner.rows.insert(id, row.clone());
        inner.next_id += 1;
        row
    }

    /// Builds and inserts a row while holding the write lock, so `build` can
    /// check the existing rows (uniqueness, references) atomically. The id is
    /// only consumed when `build` succeeds.
    pub async fn try_insert<F, E>(&self, build: F) -> Result<T, E>
    where
        F: FnOnce(i64, &Rows<T>) -> Result<T, E>,
    {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        let row = build(id, &inner.rows)?;
        inner.rows.insert(id, row.clone());
        inner.next_id += 1;
        Ok(row)
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.inner.read().await.rows.get(&id).cloned()
    }

    pub async fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.inner
            .read()
            .await
            .rows
            .values()
            .find(|row| predicate(row))
            .cloned()
    }

    pub async fn filter<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.inner
            .read()
            .await
            .rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    pub async fn all(&self) -> Vec<T> {
        self.filter(|_| true).await
    }

    pub async fn exists<P>(&self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool,
    {
        self.inner.read().await.rows.values().any(predicate)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Applies `change` to a copy of the row and commits it only if `change`
    /// succeeds. `Ok(None)` means no row has this id.
    pub async fn update<F, E>(&self, id: i64, change: F) -> Result<Option<T>, E>
    where
        F: FnOnce(&mut T, &Rows<T>) -> Result<(), E>,
    {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.rows.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        change(&mut updated, &inner.rows)?;
        inner.rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    pub async fn remove(&self, id: i64) -> Option<T> {
        self.inner.write().await.rows.remove(&id)
    }

    /// Returns the number of rows removed.
    pub async fn remove_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|_, row| !predicate(row));
        before - inner.rows.len()
    }
}
