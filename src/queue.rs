use log::warn;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::sink::{NoteError, NoteEvent, NoteSink};

#[derive(Clone, Debug)]
pub struct QueuedSink {
    tx: UnboundedSender<NoteEvent>,
}

impl QueuedSink {
    pub fn channel() -> (Self, UnboundedReceiver<NoteEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NoteSink for QueuedSink {
    fn send(&mut self, event: NoteEvent) -> Result<(), NoteError> {
        event.validate()?;
        self.tx.send(event).map_err(|_| NoteError::Disconnected)
    }
}

/// The worker runs until every `QueuedSink` clone is dropped, then hands the
/// backend back through the join handle.
pub fn spawn_note_worker<B>(runtime: &Runtime, mut backend: B) -> (QueuedSink, JoinHandle<B>)
where
    B: NoteSink + Send + 'static,
{
    let (sink, mut rx) = QueuedSink::channel();
    let worker = runtime.spawn_blocking(move || {
        while let Some(event) = rx.blocking_recv() {
            if let Err(err) = backend.send(event) {
                warn!("note backend dropped {event:?}: {err}");
            }
        }
        backend
    });
    (sink, worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    struct Picky {
        accepted: Vec<i32>,
    }

    impl NoteSink for Picky {
        fn send(&mut self, event: NoteEvent) -> Result<(), NoteError> {
            if event.pitch == 61 {
                return Err(NoteError::Backend("port busy".into()));
            }
            self.accepted.push(event.pitch);
            Ok(())
        }
    }

    #[test]
    fn worker_forwards_events_in_order() {
        let runtime = Runtime::new().unwrap();
        let (mut sink, worker) = spawn_note_worker(&runtime, RecordingSink::new());
        sink.send(NoteEvent::new(60, true, 93)).unwrap();
        sink.send(NoteEvent::new(60, false, 93)).unwrap();
        sink.send(NoteEvent::new(62, true, 93)).unwrap();
        drop(sink);

        let recorded = runtime.block_on(worker).unwrap();
        let pitches: Vec<(i32, bool)> = recorded.events().iter().map(|e| (e.pitch, e.on)).collect();
        assert_eq!(pitches, vec![(60, true), (60, false), (62, true)]);
    }

    #[test]
    fn malformed_events_are_rejected_before_queueing() {
        let (mut sink, mut rx) = QueuedSink::channel();
        assert!(matches!(
            sink.send(NoteEvent::new(128, true, 93)),
            Err(NoteError::InvalidData(_))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_reports_disconnect() {
        let (mut sink, rx) = QueuedSink::channel();
        drop(rx);
        assert!(matches!(
            sink.send(NoteEvent::new(60, true, 93)),
            Err(NoteError::Disconnected)
        ));
    }

    #[test]
    fn backend_failures_do_not_stop_the_worker() {
        let runtime = Runtime::new().unwrap();
        let (mut sink, worker) = spawn_note_worker(&runtime, Picky { accepted: Vec::new() });
        for pitch in [60, 61, 62] {
            sink.send(NoteEvent::new(pitch, true, 93)).unwrap();
        }
        drop(sink);
        let picky = runtime.block_on(worker).unwrap();
        assert_eq!(picky.accepted, vec![60, 62]);
    }
}
