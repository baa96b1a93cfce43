use super::{Channel, Subscriber, SubscriberId};
use std::fmt;
use std::sync::Arc;

/// Subscription handle. Binds exactly one subscriber for as long as it
/// lives; dropping it unbinds.
///
/// A delivery already queued when the receiver is dropped still runs.
pub struct Receiver<T> {
    channel: Arc<Channel<T>>,
    id: SubscriberId,
}

impl<T> Receiver<T> {
    pub fn bind<S>(channel: &Arc<Channel<T>>, subscriber: S) -> Self
    where
        S: Subscriber<T>,
    {
        let id = channel.register(Arc::new(subscriber));
        Self {
            channel: Arc::clone(channel),
            id,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn channel(&self) -> &Arc<Channel<T>> {
        &self.channel
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.channel.unregister(self.id);
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("channel", &self.channel.name())
            .field("id", &self.id)
            .finish()
    }
}
