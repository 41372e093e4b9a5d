//! Repartition channels.
//!
//! A `through` node writes its input to a channel and reads it back before
//! forwarding. Only the key, the new value and the event time cross the
//! channel; old values are recomputed on the read-back side.

use crate::dataflow::NodeId;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};
use tabulon_core::{Error, Key, Result, Value};

/// A record in flight through a repartition channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepartitionRecord {
    pub key: Key,
    pub value: Option<Value>,
    pub timestamp: i64,
}

/// One repartition channel, owned by its `through` node.
pub struct RepartitionChannel {
    name: String,
    node: NodeId,
    sender: Sender<RepartitionRecord>,
    receiver: Receiver<RepartitionRecord>,
}

impl RepartitionChannel {
    /// Opens a channel. `capacity` bounds the number of records in flight;
    /// `None` leaves it unbounded. `TopologyConfig::validate` keeps a zero
    /// capacity from reaching here.
    pub fn open(name: impl Into<String>, node: NodeId, capacity: Option<usize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(cap) => bounded(cap),
            None => unbounded(),
        };
        Self {
            name: name.into(),
            node,
            sender,
            receiver,
        }
    }

    /// Returns the channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `through` node reading this channel.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Enqueues a record without blocking.
    pub fn send(&self, record: RepartitionRecord) -> Result<()> {
        match self.sender.try_send(record) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(Error::RepartitionFull {
                channel: self.name.clone(),
            }),
            Err(TrySendError::Disconnected(_)) => Err(Error::ChannelClosed {
                channel: self.name.clone(),
            }),
        }
    }

    /// Dequeues the oldest record, if any.
    pub fn try_recv(&self) -> Result<Option<RepartitionRecord>> {
        match self.receiver.try_recv() {
            Ok(record) => Ok(Some(record)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::ChannelClosed {
                channel: self.name.clone(),
            }),
        }
    }

    /// Returns the number of records in flight.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true if no record is in flight.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl core::fmt::Debug for RepartitionChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RepartitionChannel")
            .field("name", &self.name)
            .field("node", &self.node)
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, value: i32) -> RepartitionRecord {
        RepartitionRecord {
            key: Value::from(key),
            value: Some(Value::Int32(value)),
            timestamp: 0,
        }
    }

    #[test]
    fn test_fifo_order() {
        let channel = RepartitionChannel::open("topic2", NodeId(1), None);
        channel.send(record("A", 1)).unwrap();
        channel.send(record("B", 2)).unwrap();
        assert_eq!(channel.len(), 2);

        assert_eq!(channel.try_recv().unwrap(), Some(record("A", 1)));
        assert_eq!(channel.try_recv().unwrap(), Some(record("B", 2)));
        assert_eq!(channel.try_recv().unwrap(), None);
        assert!(channel.is_empty());
    }

    #[test]
    fn test_bounded_channel_full() {
        let channel = RepartitionChannel::open("topic2", NodeId(1), Some(1));
        channel.send(record("A", 1)).unwrap();

        let result = channel.send(record("B", 2));

        assert!(matches!(result, Err(Error::RepartitionFull { channel }) if channel == "topic2"));
        assert_eq!(channel.len(), 1);
    }

    #[test]
    fn test_tombstone_record() {
        let channel = RepartitionChannel::open("topic2", NodeId(0), None);
        channel
            .send(RepartitionRecord {
                key: Value::from("A"),
                value: None,
                timestamp: 7,
            })
            .unwrap();
        let received = channel.try_recv().unwrap().unwrap();
        assert_eq!(received.value, None);
        assert_eq!(received.timestamp, 7);
    }
}
