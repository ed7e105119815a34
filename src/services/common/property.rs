use std::fmt::Debug;

use futures::stream::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A published value with a single writer and any number of readers.
///
/// Readers always observe a whole value: `get` clones the last published
/// value under the channel's lock, so a concurrent `set` can never be seen
/// half applied.
#[derive(Clone)]
pub struct Property<T: Clone + Send + Sync + 'static> {
    tx: watch::Sender<T>,
    rx: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Create a property with an initial value.
    pub fn new(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self { tx, rx }
    }

    /// Publish a new value, returning whether it differed from the last one.
    ///
    /// Watchers are only woken when the value actually changed.
    pub(crate) fn set(&self, new_value: T) -> bool
    where
        T: PartialEq,
    {
        self.tx.send_if_modified(|current| {
            if *current != new_value {
                *current = new_value;
                true
            } else {
                false
            }
        })
    }

    /// Clone of the last published value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Stream of published values, starting with the current one.
    pub fn watch(&self) -> impl Stream<Item = T> + Send {
        WatchStream::new(self.rx.clone())
    }
}

impl<T: Clone + Send + Sync + Debug + 'static> Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn set_reports_whether_value_changed() {
        let property = Property::new(1);

        assert!(property.set(2));
        assert!(!property.set(2));
        assert_eq!(property.get(), 2);
    }

    #[tokio::test]
    async fn watch_yields_current_then_updates() {
        let property = Property::new("a".to_string());
        let mut values = Box::pin(property.watch());

        assert_eq!(values.next().await.as_deref(), Some("a"));

        property.set("b".to_string());
        assert_eq!(values.next().await.as_deref(), Some("b"));
    }
}
