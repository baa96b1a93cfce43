use super::Channel;
use crate::executor::Priority;
use std::fmt;
use std::sync::Arc;

/// Publishing handle. Holds nothing but a shared reference to its channel,
/// so it is cheap to clone and hand around.
pub struct Sender<T> {
    channel: Arc<Channel<T>>,
}

impl<T> Sender<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(channel: &Arc<Channel<T>>) -> Self {
        Self {
            channel: Arc::clone(channel),
        }
    }

    /// Publishes `value` to every current subscriber at
    /// [`Priority::Normal`]. Returns the number of deliveries queued.
    pub fn send(&self, value: T) -> usize {
        self.channel.publish(value, Priority::Normal)
    }

    pub fn send_with_priority(&self, value: T, priority: Priority) -> usize {
        self.channel.publish(value, priority)
    }

    pub fn channel(&self) -> &Arc<Channel<T>> {
        &self.channel
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
        }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("channel", &self.channel.name())
            .finish()
    }
}
