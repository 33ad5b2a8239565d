/// Random access to a fixed collection of items.
pub trait Dataset<I>: Send + Sync {
    fn get(&self, index: usize) -> Option<I>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A dataset held entirely in a `Vec`.
#[derive(Debug, Clone)]
pub struct InMemDataset<I> {
    items: Vec<I>,
}

impl<I> InMemDataset<I> {
    pub fn new(items: Vec<I>) -> Self {
        InMemDataset { items }
    }
}

impl<I> Dataset<I> for InMemDataset<I>
where
    I: Clone + Send + Sync,
{
    fn get(&self, index: usize) -> Option<I> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<I> FromIterator<I> for InMemDataset<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        InMemDataset::new(iter.into_iter().collect())
    }
}

#[test]
fn test_in_mem_dataset() {
    let dataset: InMemDataset<u8> = (0..5).collect();
    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.get(3), Some(3));
    assert_eq!(dataset.get(5), None);
    assert!(!dataset.is_empty());
}
